//! Command-line front end for the Sora video service.
//!
//! The binary is thin; everything it drives lives here:
//! - `request`: flag validation into a [`GenerationRequest`]
//! - `lifecycle`: submit, poll, download and record one job
//! - `output`: file and stream download targets
//! - `reporter`: human status text on stderr
//! - `list`: history listing

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod list;
pub mod logging;
pub mod output;
pub mod reporter;
pub mod request;

pub use config::{client_config, GenerateConfig};
pub use error::{GenerateError, GenerateResult, EXIT_FAILURE, EXIT_VALIDATION};
pub use lifecycle::{GenerationOutcome, JobLifecycle, LifecycleState};
pub use list::write_history;
pub use logging::{init_tracing, JobLogger};
pub use output::{write_download, OutputTarget, STREAM_MARKER};
pub use reporter::StatusReporter;
pub use request::{GenerationFlags, GenerationRequest, JobPlan};
