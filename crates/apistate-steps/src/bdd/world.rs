//! World definition for API scenarios

use cucumber::World;

use crate::config::StateConfig;
use crate::error::StepResult;
use crate::state::State;

/// Holds the scenario state; cucumber builds a fresh world per scenario
#[derive(Debug, World)]
#[world(init = Self::new)]
pub struct ApiWorld {
    pub state: State,
}

impl ApiWorld {
    /// World configured from `APISTATE_*` environment variables
    pub fn new() -> StepResult<Self> {
        Self::with_config(&StateConfig::load())
    }

    pub fn with_config(config: &StateConfig) -> StepResult<Self> {
        Ok(Self {
            state: State::with_config(config)?,
        })
    }

    /// Docstring attached to the current step
    pub(crate) fn docstring(step: &cucumber::gherkin::Step) -> StepResult<&str> {
        step.docstring.as_deref().ok_or_else(|| {
            crate::error::StepError::InvalidArgument(format!(
                "step '{}' requires a docstring",
                step.value
            ))
        })
    }
}
