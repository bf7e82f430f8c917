//! Key builders for every entry the application writes.

use std::fmt::Display;

/// Namespace of entity cache keys.
const ENTITY_PREFIX: &str = "rpidrive";

/// Failed-login counter of a client address.
pub fn bruteforce(ip: &str) -> String {
    format!("bruteforce.{ip}")
}

/// Pattern matching every failed-login counter.
pub const BRUTEFORCE_PATTERN: &str = "bruteforce.*";

/// Live session marker.
pub fn session(session_id: impl Display) -> String {
    format!("session.{session_id}")
}

/// Cached entity row, `rpidrive.<entity>@<pk>`.
pub fn entity(entity: &str, pk: impl Display) -> String {
    format!("{ENTITY_PREFIX}.{entity}@{pk}")
}
