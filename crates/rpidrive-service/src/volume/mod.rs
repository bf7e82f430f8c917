//! Volume management.

pub mod service;

pub use service::{
    CreateVolumeRequest, MemberRequest, NamedValue, UpdateVolumeRequest, VolumeDetails,
    VolumeService, VolumeSummary,
};
