//! Scenario state primitives for behavioral HTTP API tests.
//!
//! This crate holds the scenario cache, the `{{.KEY}}` template resolver and
//! the assertion engine that classifies JSON nodes as one of
//! `nil`, `string`, `int`, `float`, `bool`, `map` or `slice`.

pub mod assertions;
pub mod cache;
pub mod duration;
pub mod error;
pub mod exchange;
pub mod resolver;
pub mod template;
pub mod value;

pub use assertions::{split_expressions, AssertionEngine};
pub use cache::{
    Cache, CacheValue, ConcurrentCache, LAST_HTTP_REQUEST_TIMESTAMP, LAST_HTTP_RESPONSE,
    LAST_HTTP_RESPONSE_TIMESTAMP,
};
pub use duration::parse_duration;
pub use error::{CoreError, CoreResult};
pub use exchange::{PreparedRequest, RecordedResponse};
pub use resolver::{NodeResolver, PathResolver};
pub use template::{PlaceholderEngine, TemplateEngine};
pub use value::{classify, JsonValue, SemanticType};
