//! Response DTOs.

use serde::Serialize;

/// `{values: [...]}` envelope for listings.
#[derive(Debug, Clone, Serialize)]
pub struct ValuesResponse<T> {
    pub values: Vec<T>,
}

impl<T> ValuesResponse<T> {
    pub fn new(values: Vec<T>) -> Self {
        Self { values }
    }
}

/// `{id}` of a created entity.
#[derive(Debug, Clone, Serialize)]
pub struct IdResponse<T> {
    pub id: T,
}

/// `{flag}` of the session check.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FlagResponse {
    pub flag: bool,
}

/// `{}`.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct EmptyResponse {}

/// A created playlist.
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistCreated {
    pub id: i32,
    pub name: String,
}
