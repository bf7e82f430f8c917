//! Background job entities and the job state machine.

pub mod model;
pub mod payload;
pub mod status;

pub use model::{CreateJob, Job};
pub use payload::{IndexPayload, ZipPayload};
pub use status::{JobKind, JobStatus};
