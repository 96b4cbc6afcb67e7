//! Scenario state shared by the steps of one scenario.
//!
//! A [`State`] owns the scenario cache and explicit handles to every
//! collaborator it delegates to. Steps expand templated arguments from the
//! cache, inspect the last recorded response and write derived values back.

use std::collections::BTreeMap;
use std::sync::Arc;

use apistate_core::value::to_template_string;
use apistate_core::{
    split_expressions, AssertionEngine, Cache, CacheValue, ConcurrentCache, JsonValue,
    NodeResolver, PathResolver, PlaceholderEngine, PreparedRequest, RecordedResponse,
    TemplateEngine, LAST_HTTP_REQUEST_TIMESTAMP, LAST_HTTP_RESPONSE, LAST_HTTP_RESPONSE_TIMESTAMP,
};
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::StateConfig;
use crate::debugger::{format_body, ConsoleDebugger, Debugger};
use crate::error::{StepError, StepResult};
use crate::generators::RandomGenerator;
use crate::http::{HttpContext, ReqwestContext};
use crate::logging::LogExt;
use crate::schema::{InlineSchemaValidator, ReferenceSchemaValidator, SchemaValidator};

/// Response body type names accepted by [`State::response_body_should_have_type`]
pub const BODY_TYPE_JSON: &str = "JSON";
pub const BODY_TYPE_PLAIN_TEXT: &str = "plain text";

/// Services a state delegates to
#[derive(Debug, Clone)]
pub struct Collaborators {
    pub cache: Arc<dyn Cache>,
    pub templates: Arc<dyn TemplateEngine>,
    pub resolver: Arc<dyn NodeResolver>,
    pub http: Arc<dyn HttpContext>,
    pub reference_validator: Arc<dyn SchemaValidator>,
    pub inline_validator: Arc<dyn SchemaValidator>,
    pub debugger: Arc<dyn Debugger>,
    pub generator: Arc<RandomGenerator>,
}

impl Collaborators {
    /// Default implementations configured from `config`, with a fresh cache
    pub fn from_config(config: &StateConfig) -> StepResult<Self> {
        Ok(Self {
            cache: Arc::new(ConcurrentCache::new()),
            templates: Arc::new(PlaceholderEngine::new()),
            resolver: Arc::new(PathResolver::new()),
            http: Arc::new(ReqwestContext::new(config.request_timeout)?),
            reference_validator: Arc::new(ReferenceSchemaValidator::new(config.schema_dir.clone())),
            inline_validator: Arc::new(InlineSchemaValidator),
            debugger: Arc::new(ConsoleDebugger),
            generator: Arc::new(RandomGenerator::new(config.random_seed)),
        })
    }
}

/// Body and headers document accepted by [`State::send_request_with_body_and_headers`]
#[derive(Debug, Default, Deserialize)]
struct BodyHeaders {
    #[serde(default)]
    body: Option<Value>,
    #[serde(default)]
    headers: BTreeMap<String, Value>,
}

#[derive(Debug)]
pub struct State {
    cache: Arc<dyn Cache>,
    templates: Arc<dyn TemplateEngine>,
    http: Arc<dyn HttpContext>,
    reference_validator: Arc<dyn SchemaValidator>,
    inline_validator: Arc<dyn SchemaValidator>,
    debugger: Arc<dyn Debugger>,
    generator: Arc<RandomGenerator>,
    engine: AssertionEngine,
    is_debug: bool,
}

impl State {
    pub fn new(collaborators: Collaborators, is_debug: bool) -> Self {
        let engine = AssertionEngine::new(
            collaborators.templates.clone(),
            collaborators.resolver.clone(),
        );

        Self {
            cache: collaborators.cache,
            templates: collaborators.templates,
            http: collaborators.http,
            reference_validator: collaborators.reference_validator,
            inline_validator: collaborators.inline_validator,
            debugger: collaborators.debugger,
            generator: collaborators.generator,
            engine,
            is_debug,
        }
    }

    pub fn with_config(config: &StateConfig) -> StepResult<Self> {
        Ok(Self::new(Collaborators::from_config(config)?, config.debug))
    }

    /// Clear scenario data before a new scenario starts
    pub fn reset_scenario(&mut self, is_debug: bool) {
        self.cache.reset();
        self.is_debug = is_debug;
    }

    pub fn cache(&self) -> &dyn Cache {
        self.cache.as_ref()
    }

    pub fn is_debug(&self) -> bool {
        self.is_debug
    }

    pub fn resolve_template(&self, template: &str) -> StepResult<String> {
        Ok(self.templates.resolve(template, self.cache.as_ref())?)
    }

    pub fn last_response(&self) -> StepResult<RecordedResponse> {
        Ok(self.cache.get_response(LAST_HTTP_RESPONSE)?)
    }

    /// Body of the last response; safe to call any number of times
    pub fn last_response_body(&self) -> StepResult<Vec<u8>> {
        Ok(self.last_response()?.body)
    }

    // --- requests ---

    /// Send a request whose body and headers come from one JSON or YAML document
    /// of the form `{"body": ..., "headers": {...}}`.
    pub async fn send_request_with_body_and_headers(
        &self,
        method: &str,
        url_template: &str,
        document_template: &str,
    ) -> StepResult<()> {
        let document = self.resolve_template(document_template)?;
        let url = self.resolve_template(url_template)?;
        let body_headers: BodyHeaders = parse_document(&document)?;

        let mut request = PreparedRequest::new(method, url);
        for (name, value) in &body_headers.headers {
            request.set_header(name, &to_template_string(value));
        }
        request.body = match body_headers.body {
            None | Some(Value::Null) => None,
            Some(Value::String(text)) => Some(text.into_bytes()),
            Some(other) => Some(serde_json::to_vec(&other)?),
        };

        self.send(request).await
    }

    pub fn prepare_request(&self, method: &str, url_template: &str, cache_key: &str) -> StepResult<()> {
        non_empty("cache key", cache_key)?;
        let url = self.resolve_template(url_template)?;
        self.cache.save(cache_key, PreparedRequest::new(method, url).into());
        Ok(())
    }

    /// Headers given as a JSON or YAML map
    pub fn set_headers_for_prepared_request(&self, cache_key: &str, headers_template: &str) -> StepResult<()> {
        let headers = self.resolve_template(headers_template)?;
        let headers: BTreeMap<String, Value> = parse_document(&headers).map_err(|e| {
            StepError::InvalidArgument(format!("could not parse provided headers '{}': {}", headers, e))
        })?;

        let mut request = self.cache.get_request(cache_key)?;
        for (name, value) in &headers {
            request.set_header(name, &to_template_string(value));
        }
        self.cache.save(cache_key, request.into());
        Ok(())
    }

    pub fn set_body_for_prepared_request(&self, cache_key: &str, body_template: &str) -> StepResult<()> {
        let body = self.resolve_template(body_template)?;
        let request = self.cache.get_request(cache_key)?.with_body(body);
        self.cache.save(cache_key, request.into());
        Ok(())
    }

    pub async fn send_prepared_request(&self, cache_key: &str) -> StepResult<()> {
        let request = self.cache.get_request(cache_key)?;
        self.send(request).await
    }

    async fn send(&self, request: PreparedRequest) -> StepResult<()> {
        let sent_at = Utc::now();
        let response = self
            .http
            .send(&request)
            .await
            .log_err("HTTP request failed")?;
        let received_at = Utc::now();

        debug!(method = %request.method, url = %request.url, status = response.status, "Recording last response");
        self.cache.save(LAST_HTTP_REQUEST_TIMESTAMP, sent_at.into());
        self.cache.save(LAST_HTTP_RESPONSE_TIMESTAMP, received_at.into());
        self.cache.save(LAST_HTTP_RESPONSE, response.into());
        Ok(())
    }

    // --- response assertions ---

    pub fn response_status_should_be(&self, code: u16) -> StepResult<()> {
        let status = self.last_response()?.status;
        if status != code {
            return Err(StepError::ResponseAssertion(format!(
                "expected status code {}, but got {}",
                code, status
            )));
        }
        Ok(())
    }

    /// `JSON` when the body parses as JSON, `plain text` when it does not
    pub fn response_body_should_have_type(&self, data_type: &str) -> StepResult<()> {
        let is_json = serde_json::from_slice::<Value>(&self.last_response_body()?).is_ok();

        match data_type {
            BODY_TYPE_JSON if is_json => Ok(()),
            BODY_TYPE_JSON => Err(StepError::ResponseAssertion(
                "last response body is not valid JSON".to_string(),
            )),
            BODY_TYPE_PLAIN_TEXT if !is_json => Ok(()),
            BODY_TYPE_PLAIN_TEXT => Err(StepError::ResponseAssertion(format!(
                "last response body has type {}",
                BODY_TYPE_JSON
            ))),
            other => Err(StepError::InvalidArgument(format!(
                "unknown response body type '{}', available values: {}, {}",
                other, BODY_TYPE_JSON, BODY_TYPE_PLAIN_TEXT
            ))),
        }
    }

    pub fn response_should_have_header(&self, name: &str) -> StepResult<()> {
        let response = self.last_response()?;
        match response.header(name) {
            Some(_) => Ok(()),
            None => Err(self.missing_header(name, &response)),
        }
    }

    pub fn response_should_have_header_of_value(&self, name: &str, value_template: &str) -> StepResult<()> {
        let expected = self.resolve_template(value_template)?;
        let response = self.last_response()?;

        match response.header(name) {
            Some(actual) if actual == expected => Ok(()),
            Some(actual) => Err(StepError::ResponseAssertion(format!(
                "header '{}' exists but its value '{}' is not equal to expected '{}'",
                name, actual, expected
            ))),
            None => Err(self.missing_header(name, &response)),
        }
    }

    fn missing_header(&self, name: &str, response: &RecordedResponse) -> StepError {
        if self.is_debug {
            self.debugger
                .print(&format!("last HTTP response headers: {:?}", response.headers));
        }
        StepError::ResponseAssertion(format!("could not find header '{}' in last HTTP response", name))
    }

    // --- JSON nodes ---

    /// Resolve `expression` against the last response body
    pub fn node(&self, expression: &str) -> StepResult<JsonValue> {
        let body = self.last_response_body()?;
        self.report(self.engine.resolve_node(expression, &body).map_err(StepError::from))
    }

    pub fn save_node_as(&self, expression: &str, cache_key: &str) -> StepResult<()> {
        non_empty("cache key", cache_key)?;
        let value = self.node(expression)?;
        self.cache.save(cache_key, value.into());
        Ok(())
    }

    pub fn response_should_have_node(&self, expression: &str) -> StepResult<()> {
        self.node(expression).map(|_| ())
    }

    /// `expressions` is a comma separated list; every missing node is reported
    pub fn response_should_have_nodes(&self, expressions: &str) -> StepResult<()> {
        let body = self.last_response_body()?;
        let expressions = split_expressions(expressions);
        self.report(
            self.engine
                .nodes_exist(&body, expressions.as_slice())
                .map_err(StepError::from),
        )
    }

    pub fn node_should_be(&self, expression: &str, type_name: &str) -> StepResult<()> {
        let value = self.node(expression)?;
        self.report(self.engine.should_be(expression, &value, type_name).map_err(StepError::from))
    }

    pub fn node_should_not_be(&self, expression: &str, type_name: &str) -> StepResult<()> {
        let value = self.node(expression)?;
        self.report(
            self.engine
                .should_not_be(expression, &value, type_name)
                .map_err(StepError::from),
        )
    }

    pub fn node_should_be_slice_of_length(&self, expression: &str, length: usize) -> StepResult<()> {
        let value = self.node(expression)?;
        self.report(
            self.engine
                .slice_length(expression, &value, length)
                .map_err(StepError::from),
        )
    }

    /// `value_template` is expanded against the cache before comparison
    pub fn node_should_be_of_value(&self, expression: &str, type_name: &str, value_template: &str) -> StepResult<()> {
        let value = self.node(expression)?;
        self.report(
            self.engine
                .value_equals(self.cache.as_ref(), expression, &value, type_name, value_template)
                .map_err(StepError::from),
        )
    }

    // --- schema ---

    pub fn validate_last_response_body_with_schema_reference(&self, reference: &str) -> StepResult<()> {
        let reference = self.resolve_template(reference)?;
        let body = self.last_response_body()?;
        self.report(self.reference_validator.validate(&body, &reference))
    }

    pub fn validate_last_response_body_with_schema_string(&self, schema: &str) -> StepResult<()> {
        let schema = self.resolve_template(schema)?;
        let body = self.last_response_body()?;
        self.report(self.inline_validator.validate(&body, &schema))
    }

    // --- values ---

    pub fn save_as(&self, value_template: &str, cache_key: &str) -> StepResult<()> {
        non_empty("value", value_template)?;
        non_empty("cache key", cache_key)?;
        let value = self.resolve_template(value_template)?;
        self.cache.save(cache_key, value.into());
        Ok(())
    }

    pub fn generate_random_int(&self, from: i64, to: i64, cache_key: &str) -> StepResult<()> {
        non_empty("cache key", cache_key)?;
        let value = self.generator.int_in_range(from, to)?;
        self.cache.save(cache_key, value.into());
        Ok(())
    }

    pub fn generate_random_float(&self, from: i64, to: i64, cache_key: &str) -> StepResult<()> {
        non_empty("cache key", cache_key)?;
        let value = self.generator.float_in_range(from, to)?;
        self.cache.save(cache_key, value.into());
        Ok(())
    }

    pub fn generate_random_string(&self, charset: &str, from: usize, to: usize, cache_key: &str) -> StepResult<()> {
        non_empty("cache key", cache_key)?;
        let value = self.generator.string_in_range(charset, from, to)?;
        self.cache.save(cache_key, value.into());
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn generate_random_sentence(
        &self,
        charset: &str,
        word_min: usize,
        word_max: usize,
        from: usize,
        to: usize,
        cache_key: &str,
    ) -> StepResult<()> {
        non_empty("cache key", cache_key)?;
        let value = self
            .generator
            .sentence_in_range(charset, word_min, word_max, from, to)?;
        self.cache.save(cache_key, value.into());
        Ok(())
    }

    // --- timing ---

    pub fn time_between_request_and_response_should_be_at_most(&self, interval: &str) -> StepResult<()> {
        let sent_at = self.cache.get_timestamp(LAST_HTTP_REQUEST_TIMESTAMP)?;
        let received_at = self.cache.get_timestamp(LAST_HTTP_RESPONSE_TIMESTAMP)?;
        Ok(self.engine.elapsed_within(sent_at, received_at, interval)?)
    }

    pub async fn wait(&self, interval: &str) -> StepResult<()> {
        let duration = apistate_core::parse_duration(interval)?;
        tokio::time::sleep(duration).await;
        Ok(())
    }

    // --- debugging ---

    pub fn print_last_response_body(&self) -> StepResult<()> {
        let body = self.last_response_body()?;
        self.debugger.print(&format_body(&body));
        Ok(())
    }

    pub fn start_debug_mode(&mut self) {
        self.is_debug = true;
    }

    pub fn stop_debug_mode(&mut self) {
        self.is_debug = false;
    }

    /// In debug mode a failing step prints the last response body
    fn report<T>(&self, result: StepResult<T>) -> StepResult<T> {
        if let Err(err) = &result {
            if self.is_debug {
                warn!(error = %err, "Step failed, printing last response body");
                if let Ok(body) = self.last_response_body() {
                    self.debugger.print(&format_body(&body));
                }
            }
        }
        result
    }
}

impl State {
    /// Save a value under `key` unless the key is empty
    pub fn save(&self, key: &str, value: impl Into<CacheValue>) -> StepResult<()> {
        non_empty("cache key", key)?;
        self.cache.save(key, value.into());
        Ok(())
    }
}

fn non_empty(what: &str, value: &str) -> StepResult<()> {
    if value.is_empty() {
        return Err(StepError::InvalidArgument(format!("{} should not be empty", what)));
    }
    Ok(())
}

/// Parse `text` as JSON, falling back to YAML
fn parse_document<T: DeserializeOwned>(text: &str) -> StepResult<T> {
    match serde_json::from_str(text) {
        Ok(parsed) => Ok(parsed),
        Err(_) => Ok(serde_yaml::from_str(text)?),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debugger::RecordingDebugger;
    use apistate_core::CoreError;
    use async_trait::async_trait;
    use chrono::Duration as ChronoDuration;
    use parking_lot::Mutex;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// Replies with a canned response and remembers sent requests
    #[derive(Debug, Default)]
    struct CannedHttp {
        response: Mutex<Option<RecordedResponse>>,
        sent: Mutex<Vec<PreparedRequest>>,
    }

    #[async_trait]
    impl HttpContext for CannedHttp {
        async fn send(&self, request: &PreparedRequest) -> StepResult<RecordedResponse> {
            self.sent.lock().push(request.clone());
            self.response
                .lock()
                .clone()
                .ok_or_else(|| StepError::InvalidArgument("no canned response".to_string()))
        }
    }

    fn state_with(http: Arc<CannedHttp>, debugger: Arc<RecordingDebugger>) -> State {
        let mut collaborators = Collaborators::from_config(&StateConfig::default()).unwrap();
        collaborators.http = http;
        collaborators.debugger = debugger;
        collaborators.generator = Arc::new(RandomGenerator::new(Some(7)));
        State::new(collaborators, false)
    }

    fn state() -> State {
        state_with(Arc::new(CannedHttp::default()), Arc::new(RecordingDebugger::new()))
    }

    fn with_response(state: &State, status: u16, headers: &[(&str, &str)], body: &str) {
        let headers = headers
            .iter()
            .map(|(n, v)| (n.to_string(), v.to_string()))
            .collect();
        state
            .cache()
            .save(LAST_HTTP_RESPONSE, RecordedResponse::new(status, headers, body).into());
    }

    #[test]
    fn test_save_as_requires_value_and_key() {
        let state = state();
        assert!(matches!(state.save_as("", ""), Err(StepError::InvalidArgument(_))));
        assert!(matches!(state.save_as("", "a"), Err(StepError::InvalidArgument(_))));
        assert!(matches!(state.save_as("a", ""), Err(StepError::InvalidArgument(_))));

        state.save_as("a", "a").unwrap();
        assert_eq!(state.cache().get_saved("a").unwrap().as_str(), Some("a"));
    }

    #[test]
    fn test_save_as_expands_templates() {
        let state = state();
        state.save("NAME", "john").unwrap();
        state.save_as("hello {{.NAME}}", "GREETING").unwrap();
        assert_eq!(
            state.cache().get_saved("GREETING").unwrap().as_str(),
            Some("hello john")
        );
    }

    #[test]
    fn test_reset_scenario_clears_cache() {
        let mut state = state();
        state.save("KEY", "value").unwrap();
        state.reset_scenario(true);

        assert!(state.is_debug());
        assert!(matches!(
            state.cache().get_saved("KEY"),
            Err(CoreError::NotFound(_))
        ));
    }

    #[test]
    fn test_status_code() {
        let state = state();
        assert!(matches!(
            state.response_status_should_be(200),
            Err(StepError::Core(CoreError::NotFound(_)))
        ));

        with_response(&state, 201, &[], "");
        assert!(state.response_status_should_be(201).is_ok());
        let err = state.response_status_should_be(200).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Response assertion failed: expected status code 200, but got 201"
        );
    }

    #[test]
    fn test_body_type() {
        let state = state();
        with_response(&state, 200, &[], r#"{"a": 1}"#);
        assert!(state.response_body_should_have_type("JSON").is_ok());
        assert!(state.response_body_should_have_type("plain text").is_err());
        assert!(matches!(
            state.response_body_should_have_type("XML"),
            Err(StepError::InvalidArgument(_))
        ));

        with_response(&state, 200, &[], "hello");
        assert!(state.response_body_should_have_type("plain text").is_ok());
        assert!(state.response_body_should_have_type("JSON").is_err());
    }

    #[test]
    fn test_headers() {
        let state = state();
        with_response(
            &state,
            200,
            &[("Content-Length", "30"), ("Content-Type", "application/json")],
            "{}",
        );
        state.save("CONTENT_TYPE_JSON", "application/json").unwrap();

        assert!(state.response_should_have_header("content-type").is_ok());
        assert!(state.response_should_have_header("X-Missing").is_err());
        assert!(state.response_should_have_header("").is_err());
        assert!(state
            .response_should_have_header_of_value("content-type", "application/json")
            .is_ok());
        assert!(state
            .response_should_have_header_of_value("Content-Type", "{{.CONTENT_TYPE_JSON}}")
            .is_ok());
        assert!(state
            .response_should_have_header_of_value("content-type", "application/xml")
            .is_err());
        assert!(state.response_should_have_header_of_value("", "").is_err());
    }

    #[test]
    fn test_node_steps() {
        let state = state();
        with_response(
            &state,
            200,
            &[],
            r#"{"user": {"first": "a", "age": 30, "score": 2.5}, "names": ["a", "b"]}"#,
        );

        assert!(state.response_should_have_node("user.first").is_ok());
        assert!(state.response_should_have_node("user.last").is_err());
        assert!(state.node_should_be("user.age", "int").is_ok());
        assert!(state.node_should_be("user.score", "float").is_ok());
        assert!(state.node_should_not_be("user.score", "int").is_ok());
        assert!(state.node_should_be_slice_of_length("names", 2).is_ok());
        assert!(state.node_should_be_slice_of_length("names", 0).is_err());
        assert!(matches!(
            state.node_should_be_slice_of_length("name", 2),
            Err(StepError::Core(CoreError::Resolution { .. }))
        ));

        state.save_node_as("user.first", "FIRST").unwrap();
        assert!(state.node_should_be_of_value("user.first", "string", "{{.FIRST}}").is_ok());
        assert!(state.node_should_be_of_value("user.age", "int", "30").is_ok());
    }

    #[test]
    fn test_nodes_exist_reports_each_missing_node() {
        let state = state();
        with_response(&state, 200, &[], r#"{"user": {"first": "a"}}"#);

        assert!(state.response_should_have_nodes("user, user.first").is_ok());
        match state.response_should_have_nodes("user.first, user.last") {
            Err(StepError::Core(err @ CoreError::MultiNode(_))) => {
                let failures = err.failures();
                assert_eq!(failures.len(), 1);
                assert!(failures[0].to_string().contains("user.last"));
            }
            other => panic!("expected multi node error, got {:?}", other),
        }
    }

    #[test]
    fn test_debug_mode_prints_body_on_failure() {
        let debugger = Arc::new(RecordingDebugger::new());
        let mut state = state_with(Arc::new(CannedHttp::default()), debugger.clone());
        with_response(&state, 200, &[], r#"{"a":1}"#);

        assert!(state.response_should_have_node("b").is_err());
        assert!(debugger.messages().is_empty());

        state.start_debug_mode();
        assert!(state.response_should_have_node("b").is_err());
        assert_eq!(debugger.messages(), vec!["{\n  \"a\": 1\n}".to_string()]);

        state.stop_debug_mode();
        assert!(state.response_should_have_node("b").is_err());
        assert_eq!(debugger.messages().len(), 1);
    }

    #[test]
    fn test_print_last_response_body() {
        let debugger = Arc::new(RecordingDebugger::new());
        let state = state_with(Arc::new(CannedHttp::default()), debugger.clone());
        with_response(&state, 200, &[], "plain");

        state.print_last_response_body().unwrap();
        state.print_last_response_body().unwrap();
        assert_eq!(debugger.messages(), vec!["plain", "plain"]);
    }

    #[test]
    fn test_prepared_request_lifecycle() {
        let state = state();
        state.save("HOST", "http://localhost").unwrap();
        state.prepare_request("GET", "{{.HOST}}/users", "REQ").unwrap();

        assert!(state
            .set_headers_for_prepared_request("REQ", "abc")
            .is_err());
        assert!(matches!(
            state.set_headers_for_prepared_request("OTHER", r#"{"Accept": "application/json"}"#),
            Err(StepError::Core(CoreError::NotFound(_)))
        ));
        state
            .set_headers_for_prepared_request("REQ", r#"{"Accept": "application/json"}"#)
            .unwrap();
        state
            .set_headers_for_prepared_request("REQ", "---\nContent-Type: application/json\nX-Retry: 3")
            .unwrap();
        state.set_body_for_prepared_request("REQ", r#"{"a": "b"}"#).unwrap();

        let request = state.cache().get_request("REQ").unwrap();
        assert_eq!(request.method, "GET");
        assert_eq!(request.url, "http://localhost/users");
        assert_eq!(
            request.headers,
            vec![
                ("Accept".to_string(), "application/json".to_string()),
                ("Content-Type".to_string(), "application/json".to_string()),
                ("X-Retry".to_string(), "3".to_string()),
            ]
        );
        assert_eq!(request.body, Some(br#"{"a": "b"}"#.to_vec()));
    }

    #[tokio::test]
    async fn test_send_records_response_and_timestamps() {
        let http = Arc::new(CannedHttp::default());
        *http.response.lock() = Some(RecordedResponse::new(200, vec![], r#"{"id": 7}"#));
        let state = state_with(http.clone(), Arc::new(RecordingDebugger::new()));
        state.save("ID", 7i64).unwrap();

        state
            .send_request_with_body_and_headers(
                "POST",
                "http://localhost/users/{{.ID}}",
                r#"{"body": {"name": "john"}, "headers": {"Content-Type": "application/json"}}"#,
            )
            .await
            .unwrap();

        let sent = http.sent.lock().clone();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].url, "http://localhost/users/7");
        assert_eq!(sent[0].body, Some(br#"{"name":"john"}"#.to_vec()));
        assert_eq!(
            sent[0].headers,
            vec![("Content-Type".to_string(), "application/json".to_string())]
        );

        assert!(state.response_status_should_be(200).is_ok());
        assert!(state.node_should_be_of_value("id", "int", "{{.ID}}").is_ok());
        assert!(state
            .time_between_request_and_response_should_be_at_most("10s")
            .is_ok());
    }

    #[test]
    fn test_elapsed_time_bounds() {
        let state = state();
        let sent_at = Utc::now();
        state.save(LAST_HTTP_REQUEST_TIMESTAMP, sent_at).unwrap();
        state
            .save(LAST_HTTP_RESPONSE_TIMESTAMP, sent_at + ChronoDuration::seconds(1))
            .unwrap();

        assert!(state.time_between_request_and_response_should_be_at_most("1s").is_ok());
        assert!(matches!(
            state.time_between_request_and_response_should_be_at_most("500ms"),
            Err(StepError::Core(CoreError::DurationExceeded { .. }))
        ));
        assert!(matches!(
            state.time_between_request_and_response_should_be_at_most("notaduration"),
            Err(StepError::Core(CoreError::InvalidDuration { .. }))
        ));
    }

    #[test]
    fn test_generators_save_values() {
        let state = state();
        state.generate_random_int(1, 10, "INT").unwrap();
        state.generate_random_float(1, 10, "FLOAT").unwrap();
        state.generate_random_string("abc", 3, 5, "STR").unwrap();
        state.generate_random_sentence("abc", 1, 3, 2, 4, "SENTENCE").unwrap();

        let int = state.cache().get_json("INT").unwrap();
        assert!((1..=10).contains(&int.as_i64().unwrap()));
        assert!(state.cache().get_json("FLOAT").unwrap().is_number());
        let text = state.cache().get_saved("STR").unwrap();
        assert!((3..=5).contains(&text.as_str().unwrap().chars().count()));
        assert!(state.cache().get_saved("SENTENCE").unwrap().as_str().is_some());
        assert!(state.generate_random_int(10, 1, "BAD").is_err());
    }

    #[test]
    fn test_schema_validation_steps() {
        let state = state();
        with_response(&state, 200, &[], r#"{"id": 1}"#);

        assert!(state
            .validate_last_response_body_with_schema_string(r#"{"type": "object", "required": ["id"]}"#)
            .is_ok());
        assert!(matches!(
            state.validate_last_response_body_with_schema_string(r#"{"type": "array"}"#),
            Err(StepError::Schema(_))
        ));
        assert!(state
            .validate_last_response_body_with_schema_reference("/missing/schema.json")
            .is_err());
    }

    #[tokio::test]
    async fn test_wait() {
        let state = state();
        assert!(state.wait("1ms").await.is_ok());
        assert!(state.wait("soon").await.is_err());
    }

    #[test]
    fn test_parse_document_accepts_json_and_yaml() {
        let json: BTreeMap<String, Value> = parse_document(r#"{"a": 1}"#).unwrap();
        let yaml: BTreeMap<String, Value> = parse_document("a: 1").unwrap();
        assert_eq!(json, yaml);
        assert_eq!(json.get("a"), Some(&json!(1)));
    }
}
