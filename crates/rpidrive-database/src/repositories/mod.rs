//! Repository implementations for all RPi Drive entities.

pub mod activity;
pub mod file;
pub mod job;
pub mod playlist;
pub mod share;
pub mod user;
pub mod volume;

pub use activity::ActivityRepository;
pub use file::FileRepository;
pub use job::JobRepository;
pub use playlist::PlaylistRepository;
pub use share::ShareRepository;
pub use user::UserRepository;
pub use volume::VolumeRepository;
