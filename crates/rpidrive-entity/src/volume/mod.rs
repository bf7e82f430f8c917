//! Volume domain entities and the permission scale.

pub mod kind;
pub mod model;
pub mod permission;

pub use kind::VolumeKind;
pub use model::{CreateVolume, Volume, VolumeUser};
pub use permission::VolumePermission;
