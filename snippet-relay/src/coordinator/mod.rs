//! Background coordinator.
//!
//! A single actor per process that holds the pending captured text, answers
//! the capture hook and every UI surface, and delegates saves to the remote
//! client.
//!
//! # Architecture
//!
//! - [`Coordinator`]: the actor loop and its single-slot state
//! - [`CoordinatorHandle`]: cloneable sender used by hooks, bridge and tests
//! - [`Request`] / [`Response`]: the message contract
//! - [`CaptureEvent`]: capture notifications for open UI surfaces

mod actor;
mod handle;
mod messages;

pub use actor::{Coordinator, CoordinatorConfig, DEFAULT_EVENT_CAPACITY};
pub use handle::{CoordinatorHandle, DEFAULT_MAILBOX_CAPACITY, DEFAULT_SEND_TIMEOUT, SendError};
pub use messages::{Ack, CAPTURE_ACK_MESSAGE, CaptureEvent, CapturedText, Request, Response};
