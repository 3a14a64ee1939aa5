//! Repositories for database operations

pub mod user;

pub use user::{MongoUserRepository, UserStore, hash_password, verify_password};
