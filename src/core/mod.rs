pub mod async_wait;
pub mod policy;
pub(crate) mod schedule;
pub mod truthy;
pub mod wait;

pub use async_wait::AsyncWait;
pub use policy::{PolicyError, WaitPolicy, DEFAULT_INTERVAL};
pub use truthy::Truthy;
pub use wait::{Wait, WaitError};
