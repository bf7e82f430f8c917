//! # rpidrive-auth
//!
//! Authentication and authorization for RPi Drive.
//!
//! ## Modules
//!
//! - `password` — Argon2id hashing and random credential generation
//! - `jwt` — session token claims, signing and validation
//! - `session` — session lifecycle backed by the key-value store
//! - `permission` — per-volume permission resolution
//! - `bruteforce` — per-address login throttling

pub mod bruteforce;
pub mod jwt;
pub mod password;
pub mod permission;
pub mod session;

pub use bruteforce::BruteForceGuard;
pub use jwt::{Claims, JwtCodec};
pub use password::{PasswordHasher, generate_password, generate_token};
pub use permission::PermissionResolver;
pub use session::{SessionManager, SessionToken};
