mod crud;
mod portico;

pub use crud::CrudError;
pub use portico::PorticoError;
