use serde::{Deserialize, Serialize};

/// Outcome of a single mapper invocation.
///
/// A `None` value with no errors is a legitimate "no data" result. A `None`
/// value carrying errors is a configuration problem that must reach the
/// submission's log stream.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapperResult {
    pub value: Option<String>,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

impl MapperResult {
    pub fn value(value: impl Into<String>) -> Self {
        Self {
            value: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_option(value: Option<String>) -> Self {
        Self {
            value,
            ..Self::default()
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            value: None,
            errors: vec![message.into()],
            warnings: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_error(mut self, message: impl Into<String>) -> Self {
        self.errors.push(message.into());
        self
    }

    #[must_use]
    pub fn with_warning(mut self, message: impl Into<String>) -> Self {
        self.warnings.push(message.into());
        self
    }

    pub fn is_config_error(&self) -> bool {
        !self.errors.is_empty()
    }
}
