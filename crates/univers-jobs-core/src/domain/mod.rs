//! Domain model (handles, status records, poll events, errors).

pub mod errors;
pub mod events;
pub mod ids;
pub mod status;

pub use self::errors::JobError;
pub use self::events::PollEvent;
pub use self::ids::{JobHandle, PollId};
pub use self::status::{JobList, JobListQuery, JobStatus, JobStatusRecord};
