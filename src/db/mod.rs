//! Database module: the CRUD accessor and the actor that owns it.
//!
//! Layout:
//! - `crud.rs`: parameterized statement building and execution
//! - `actor.rs`: serializes statements through one accessor
//! - `models.rs`: Rust structs mirroring DB rows
//! - `schema.rs`: SQL DDL for initializing the database (SQLite-first)

pub mod actor;
pub mod crud;
pub mod models;
pub mod schema;

pub use actor::{DbActorHandle, spawn};
pub use crud::{Crud, Fields, Mutation, Record, SelectQuery, Statement};
pub use models::DbUser;
pub use schema::SQLITE_INIT;
