//! Scenario state for behavioral HTTP API tests.
//!
//! [`State`] keeps per-scenario data in a cache, sends requests through an
//! [`HttpContext`] and asserts on the last recorded response. With the `bdd`
//! feature the [`bdd`] module binds every operation to a cucumber step.

pub mod config;
pub mod debugger;
pub mod error;
pub mod generators;
pub mod http;
pub mod logging;
pub mod schema;
pub mod state;

#[cfg(feature = "bdd")]
pub mod bdd;

pub use config::StateConfig;
pub use debugger::{ConsoleDebugger, Debugger, RecordingDebugger};
pub use error::{StepError, StepResult};
pub use generators::RandomGenerator;
pub use http::{HttpContext, ReqwestContext};
pub use logging::{init_logging, LogExt};
pub use schema::{InlineSchemaValidator, ReferenceSchemaValidator, SchemaValidator};
pub use state::{Collaborators, State};
