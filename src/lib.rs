pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod redirect;
pub mod server;
pub mod session;

mod utils;

pub use error::{CrudError, PorticoError};
pub use session::Session;
