use std::env;

use typed_builder::TypedBuilder;

use crate::error::BlocError;

/// History size used when nothing else is configured.
pub const DEFAULT_CAPACITY: usize = 100;

/// History capacities for the two streams of a [`Bloc`](crate::Bloc).
#[derive(Debug, Clone, Copy, PartialEq, Eq, TypedBuilder)]
pub struct BlocConfig {
    #[builder(default = DEFAULT_CAPACITY)]
    pub event_capacity: usize,
    #[builder(default = DEFAULT_CAPACITY)]
    pub state_capacity: usize,
}

impl Default for BlocConfig {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl BlocConfig {
    /// Load capacities from `BLOC_EVENT_CAPACITY` / `BLOC_STATE_CAPACITY`.
    /// Unset variables fall back to [`DEFAULT_CAPACITY`].
    pub fn from_env() -> Result<Self, BlocError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an explicit variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, BlocError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            event_capacity: capacity_var(&lookup, "BLOC_EVENT_CAPACITY")?,
            state_capacity: capacity_var(&lookup, "BLOC_STATE_CAPACITY")?,
        })
    }
}

fn capacity_var<F>(lookup: &F, key: &str) -> Result<usize, BlocError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(raw) = lookup(key) else {
        return Ok(DEFAULT_CAPACITY);
    };
    match raw.trim().parse::<usize>() {
        Ok(0) | Err(_) => Err(BlocError::Config(format!(
            "{key} must be a positive integer, got '{raw}'"
        ))),
        Ok(capacity) => Ok(capacity),
    }
}
