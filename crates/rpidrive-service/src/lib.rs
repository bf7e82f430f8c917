//! # rpidrive-service
//!
//! Business logic for RPi Drive. Each service receives the acting caller as
//! an explicit [`RequestContext`] and checks volume permissions through the
//! shared [`PermissionResolver`](rpidrive_auth::PermissionResolver) before
//! touching anything.
//!
//! Services follow constructor injection; all dependencies are handed over
//! as `Arc`s when the application state is built.

pub mod activity;
pub mod context;
pub mod file;
pub mod job;
pub mod lookup;
pub mod playlist;
pub mod system;
pub mod user;
pub mod volume;

pub use activity::ActivityLogger;
pub use context::RequestContext;
pub use file::FileService;
pub use job::JobService;
pub use lookup::EntityLookup;
pub use playlist::PlaylistService;
pub use system::SystemService;
pub use user::UserService;
pub use volume::VolumeService;
