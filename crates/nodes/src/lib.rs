//! `nodes` crate — the `Step` contract and the built-in steps.
//!
//! Every step, built-in or custom, implements [`Step`] and is
//! described to the engine by a [`StepDefinition`].  The engine crate wraps
//! each step in the lifecycle controller; nothing here knows about hosts or
//! completion.  A step can at most suggest a status through its output.

pub mod builtin;
pub mod config;
pub mod error;
pub mod message;
pub mod mock;
pub mod status;
pub mod traits;

pub use config::StepConfig;
pub use error::StepError;
pub use message::{FlowRunId, Message};
pub use status::{NodeStatus, Severity};
pub use traits::{RequestContext, Step, StepDefinition, StepFactory, StepOptions, StepOutput};
