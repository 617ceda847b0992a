pub mod api;
pub mod dispatch;
pub mod router;
pub mod rules;
pub mod site;
pub mod views;

pub use router::{PorticoState, portico_router};
