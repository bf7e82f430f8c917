//! Password hashing and random credentials.

pub mod generator;
pub mod hasher;

pub use generator::{generate_password, generate_token};
pub use hasher::PasswordHasher;
