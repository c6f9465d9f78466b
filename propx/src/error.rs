//! Error types and result handling for property execution.

use std::fmt;

/// Error kinds produced while running a property.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyError {
    /// The user's property reported failure for some input.
    PropertyFailed {
        message: String,
        example_index: Option<u32>,
    },

    /// The property panicked; the payload is recorded for the report.
    PropertyPanicked {
        payload: String,
        example_index: Option<u32>,
    },

    /// `filter`'s `max_tries` elapsed without a value satisfying the
    /// predicate. The test is mis-specified; no shrinking is attempted.
    GeneratorExhausted { tries: u32 },

    /// A generator panicked while producing a value.
    GenerationFailed { message: String },

    /// `max_shrink` was reached during shrinking; the reported witness may
    /// not be a local minimum.
    BudgetExhausted { steps: u32 },

    /// A shrinker violated its own contract (e.g. produced candidates after
    /// signaling exhaustion). A framework bug; the run is aborted.
    InternalInvariant { message: String },

    /// A runtime flag or config field could not be parsed or validated.
    ConfigError { message: String, field: Option<String> },
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PropertyError::PropertyFailed {
                message,
                example_index,
            } => {
                write!(f, "property failed: {}", message)?;
                if let Some(i) = example_index {
                    write!(f, " (example {})", i)?;
                }
                Ok(())
            }
            PropertyError::PropertyPanicked {
                payload,
                example_index,
            } => {
                write!(f, "property panicked: {}", payload)?;
                if let Some(i) = example_index {
                    write!(f, " (example {})", i)?;
                }
                Ok(())
            }
            PropertyError::GeneratorExhausted { tries } => {
                write!(
                    f,
                    "generator exhausted: no value satisfied the predicate after {} tries",
                    tries
                )
            }
            PropertyError::GenerationFailed { message } => {
                write!(f, "generation failed: {}", message)
            }
            PropertyError::BudgetExhausted { steps } => {
                write!(
                    f,
                    "shrink budget exhausted after {} steps; the reported minimum may not be local",
                    steps
                )
            }
            PropertyError::InternalInvariant { message } => {
                write!(f, "internal invariant violated: {}", message)
            }
            PropertyError::ConfigError { message, field } => {
                write!(f, "configuration error: {}", message)?;
                if let Some(name) = field {
                    write!(f, " (field: {})", name)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for PropertyError {}

impl PropertyError {
    /// Create a simple property-failed error.
    pub fn property_failed(message: impl Into<String>) -> Self {
        Self::PropertyFailed {
            message: message.into(),
            example_index: None,
        }
    }

    /// Create a property-panicked error from a panic payload.
    pub fn property_panicked(payload: impl Into<String>) -> Self {
        Self::PropertyPanicked {
            payload: payload.into(),
            example_index: None,
        }
    }

    /// Create a generator-exhausted error.
    pub fn generator_exhausted(tries: u32) -> Self {
        Self::GeneratorExhausted { tries }
    }

    /// Create a generation-failed error.
    pub fn generation_failed(message: impl Into<String>) -> Self {
        Self::GenerationFailed {
            message: message.into(),
        }
    }

    /// Create an internal-invariant error.
    pub fn internal_invariant(message: impl Into<String>) -> Self {
        Self::InternalInvariant {
            message: message.into(),
        }
    }

    /// Create a configuration error tied to a specific field.
    pub fn config_error(message: impl Into<String>, field: Option<&str>) -> Self {
        Self::ConfigError {
            message: message.into(),
            field: field.map(str::to_owned),
        }
    }

    /// Attach the example index where the failure occurred, if the variant
    /// carries one and it is not already set.
    pub fn at_example(self, index: u32) -> Self {
        match self {
            PropertyError::PropertyFailed {
                message,
                example_index: None,
            } => PropertyError::PropertyFailed {
                message,
                example_index: Some(index),
            },
            PropertyError::PropertyPanicked {
                payload,
                example_index: None,
            } => PropertyError::PropertyPanicked {
                payload,
                example_index: Some(index),
            },
            other => other,
        }
    }
}

/// Render a `catch_unwind` payload into something printable.
pub(crate) fn panic_payload_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&'static str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
