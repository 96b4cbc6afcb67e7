//! Step definitions forwarding to [`State`](crate::State)

use cucumber::gherkin::Step;
use cucumber::{given, then, when};

use super::world::ApiWorld;
use crate::error::{StepError, StepResult};
use crate::generators::charset_by_name;

fn charset(name: &str) -> StepResult<&'static str> {
    charset_by_name(name).ok_or_else(|| {
        StepError::InvalidArgument(format!(
            "unknown charset '{}', available values: ASCII, unicode, polish, english, russian",
            name
        ))
    })
}

// --- requests ---

#[given(regex = r#"^I send "([^"]*)" request to "([^"]*)" with body and headers:$"#)]
#[when(regex = r#"^I send "([^"]*)" request to "([^"]*)" with body and headers:$"#)]
pub async fn send_request_with_body_and_headers(
    world: &mut ApiWorld,
    step: &Step,
    method: String,
    url: String,
) -> StepResult<()> {
    let document = ApiWorld::docstring(step)?;
    world
        .state
        .send_request_with_body_and_headers(&method, &url, document)
        .await
}

#[given(regex = r#"^I prepare new "([^"]*)" request to "([^"]*)" and save it as "([^"]*)"$"#)]
#[when(regex = r#"^I prepare new "([^"]*)" request to "([^"]*)" and save it as "([^"]*)"$"#)]
pub fn prepare_request(world: &mut ApiWorld, method: String, url: String, cache_key: String) -> StepResult<()> {
    world.state.prepare_request(&method, &url, &cache_key)
}

#[given(regex = r#"^I set following headers for prepared request "([^"]*)":$"#)]
#[when(regex = r#"^I set following headers for prepared request "([^"]*)":$"#)]
pub fn set_headers_for_prepared_request(world: &mut ApiWorld, step: &Step, cache_key: String) -> StepResult<()> {
    let headers = ApiWorld::docstring(step)?;
    world.state.set_headers_for_prepared_request(&cache_key, headers)
}

#[given(regex = r#"^I set following body for prepared request "([^"]*)":$"#)]
#[when(regex = r#"^I set following body for prepared request "([^"]*)":$"#)]
pub fn set_body_for_prepared_request(world: &mut ApiWorld, step: &Step, cache_key: String) -> StepResult<()> {
    let body = ApiWorld::docstring(step)?;
    world.state.set_body_for_prepared_request(&cache_key, body)
}

#[given(regex = r#"^I send request "([^"]*)"$"#)]
#[when(regex = r#"^I send request "([^"]*)"$"#)]
pub async fn send_prepared_request(world: &mut ApiWorld, cache_key: String) -> StepResult<()> {
    world.state.send_prepared_request(&cache_key).await
}

// --- data ---

#[given(regex = r#"^I save "([^"]*)" as "([^"]*)"$"#)]
#[when(regex = r#"^I save "([^"]*)" as "([^"]*)"$"#)]
pub fn save_as(world: &mut ApiWorld, value: String, cache_key: String) -> StepResult<()> {
    world.state.save_as(&value, &cache_key)
}

#[given(regex = r#"^I save from the last response JSON node "([^"]*)" as "([^"]*)"$"#)]
#[when(regex = r#"^I save from the last response JSON node "([^"]*)" as "([^"]*)"$"#)]
pub fn save_node_as(world: &mut ApiWorld, expression: String, cache_key: String) -> StepResult<()> {
    world.state.save_node_as(&expression, &cache_key)
}

#[given(regex = r#"^I generate a random int in the range from "(-?\d+)" to "(-?\d+)" and save it as "([^"]*)"$"#)]
pub fn generate_random_int(world: &mut ApiWorld, from: i64, to: i64, cache_key: String) -> StepResult<()> {
    world.state.generate_random_int(from, to, &cache_key)
}

#[given(regex = r#"^I generate a random float in the range from "(-?\d+)" to "(-?\d+)" and save it as "([^"]*)"$"#)]
pub fn generate_random_float(world: &mut ApiWorld, from: i64, to: i64, cache_key: String) -> StepResult<()> {
    world.state.generate_random_float(from, to, &cache_key)
}

#[given(regex = r#"^I generate a random "([^"]*)" string in the range from "(\d+)" to "(\d+)" and save it as "([^"]*)"$"#)]
pub fn generate_random_string(
    world: &mut ApiWorld,
    charset_name: String,
    from: usize,
    to: usize,
    cache_key: String,
) -> StepResult<()> {
    let charset = charset(&charset_name)?;
    world.state.generate_random_string(charset, from, to, &cache_key)
}

#[given(
    regex = r#"^I generate a random "([^"]*)" sentence in the range from "(\d+)" to "(\d+)" words with words from "(\d+)" to "(\d+)" characters and save it as "([^"]*)"$"#
)]
pub fn generate_random_sentence(
    world: &mut ApiWorld,
    charset_name: String,
    from: usize,
    to: usize,
    word_min: usize,
    word_max: usize,
    cache_key: String,
) -> StepResult<()> {
    let charset = charset(&charset_name)?;
    world
        .state
        .generate_random_sentence(charset, word_min, word_max, from, to, &cache_key)
}

// --- response assertions ---

#[then(regex = r#"^the response status code should be (\d+)$"#)]
pub fn response_status_should_be(world: &mut ApiWorld, code: u16) -> StepResult<()> {
    world.state.response_status_should_be(code)
}

#[then(regex = r#"^the response body should have type "([^"]*)"$"#)]
pub fn response_body_should_have_type(world: &mut ApiWorld, data_type: String) -> StepResult<()> {
    world.state.response_body_should_have_type(&data_type)
}

#[then(regex = r#"^the response should have header "([^"]*)"$"#)]
pub fn response_should_have_header(world: &mut ApiWorld, name: String) -> StepResult<()> {
    world.state.response_should_have_header(&name)
}

#[then(regex = r#"^the response should have header "([^"]*)" of value "([^"]*)"$"#)]
pub fn response_should_have_header_of_value(world: &mut ApiWorld, name: String, value: String) -> StepResult<()> {
    world.state.response_should_have_header_of_value(&name, &value)
}

#[then(regex = r#"^the JSON response should have node "([^"]*)"$"#)]
pub fn response_should_have_node(world: &mut ApiWorld, expression: String) -> StepResult<()> {
    world.state.response_should_have_node(&expression)
}

#[then(regex = r#"^the JSON response should have nodes "([^"]*)"$"#)]
pub fn response_should_have_nodes(world: &mut ApiWorld, expressions: String) -> StepResult<()> {
    world.state.response_should_have_nodes(&expressions)
}

#[then(regex = r#"^the JSON node "([^"]*)" should be "([^"]*)"$"#)]
pub fn node_should_be(world: &mut ApiWorld, expression: String, type_name: String) -> StepResult<()> {
    world.state.node_should_be(&expression, &type_name)
}

#[then(regex = r#"^the JSON node "([^"]*)" should not be "([^"]*)"$"#)]
pub fn node_should_not_be(world: &mut ApiWorld, expression: String, type_name: String) -> StepResult<()> {
    world.state.node_should_not_be(&expression, &type_name)
}

#[then(regex = r#"^the JSON node "([^"]*)" should be slice of length "(\d+)"$"#)]
pub fn node_should_be_slice_of_length(world: &mut ApiWorld, expression: String, length: usize) -> StepResult<()> {
    world.state.node_should_be_slice_of_length(&expression, length)
}

#[then(regex = r#"^the JSON node "([^"]*)" should be "([^"]*)" of value "([^"]*)"$"#)]
pub fn node_should_be_of_value(
    world: &mut ApiWorld,
    expression: String,
    type_name: String,
    value: String,
) -> StepResult<()> {
    world.state.node_should_be_of_value(&expression, &type_name, &value)
}

#[then(regex = r#"^I validate last response body with schema "([^"]*)"$"#)]
pub fn validate_with_schema_reference(world: &mut ApiWorld, reference: String) -> StepResult<()> {
    world
        .state
        .validate_last_response_body_with_schema_reference(&reference)
}

#[then(regex = r#"^I validate last response body with schema:$"#)]
pub fn validate_with_schema_string(world: &mut ApiWorld, step: &Step) -> StepResult<()> {
    let schema = ApiWorld::docstring(step)?;
    world.state.validate_last_response_body_with_schema_string(schema)
}

#[then(regex = r#"^the time between the last request and response should be less than or equal to "([^"]*)"$"#)]
pub fn elapsed_at_most(world: &mut ApiWorld, interval: String) -> StepResult<()> {
    world
        .state
        .time_between_request_and_response_should_be_at_most(&interval)
}

// --- flow control and debugging ---

#[given(regex = r#"^I wait "([^"]*)"$"#)]
#[when(regex = r#"^I wait "([^"]*)"$"#)]
pub async fn wait(world: &mut ApiWorld, interval: String) -> StepResult<()> {
    world.state.wait(&interval).await
}

#[then(regex = r#"^I print last response body$"#)]
pub fn print_last_response_body(world: &mut ApiWorld) -> StepResult<()> {
    world.state.print_last_response_body()
}

#[given(regex = r#"^I start debug mode$"#)]
#[when(regex = r#"^I start debug mode$"#)]
pub fn start_debug_mode(world: &mut ApiWorld) {
    world.state.start_debug_mode();
}

#[given(regex = r#"^I stop debug mode$"#)]
#[when(regex = r#"^I stop debug mode$"#)]
pub fn stop_debug_mode(world: &mut ApiWorld) {
    world.state.stop_debug_mode();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_charset_lookup() {
        assert!(charset("english").is_ok());
        assert!(matches!(charset("klingon"), Err(StepError::InvalidArgument(_))));
    }
}
