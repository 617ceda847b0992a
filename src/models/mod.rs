//! Thin model layer over the CRUD accessor.

pub mod user;

pub use user::{USERS_TABLE, create_user, get_user, hash_password, list_users};
