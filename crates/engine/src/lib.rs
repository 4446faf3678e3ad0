//! `engine` crate — the step lifecycle middleware.
//!
//! Wraps every [`nodes::Step`] in the same lifecycle: check that the message
//! belongs to a flow run, build the request context, run the step once,
//! normalize and tag whatever it returns, and report the outcome to the host.

pub mod completion;
pub mod context;
pub mod controller;
pub mod error;
pub mod host;
pub mod mock;
pub mod normalize;
pub mod registry;

pub use completion::Completion;
pub use context::build_request_context;
pub use controller::{InvocationReport, InvocationState, StepInstance};
pub use error::{EngineError, InvocationError};
pub use host::{HostNode, NodeStatus, Responder, Severity};
pub use normalize::{normalize, Dispatch};
pub use registry::{RegistryConfig, StepRegistry, StepType};
