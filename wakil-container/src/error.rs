//! Error types for Wakil operations.
//!
//! Every failure says which key or service it is about, and where that
//! helps, what the configuration actually contained.

use std::fmt;

use wakil_support::rendering::{render_chain, suggest_similar, underline_segment};

/// Main error type for all Wakil operations.
#[derive(Debug, thiserror::Error)]
pub enum WakilError {
    /// A dotted key could not be traversed, or was empty.
    #[error("{}", .0)]
    PathNotFound(#[from] PathNotFoundError),

    /// Traversal failed while resolving a requested service.
    #[error("Unable to traverse config for {requested:?}")]
    ResolutionFailed {
        requested: String,
        #[source]
        source: PathNotFoundError,
    },

    /// A buildable descriptor has no `service` entry.
    #[error("{requested} should have the key \"service\" defined in the mapping")]
    MissingServiceKey { requested: String },

    /// A buildable descriptor has no `options` entry.
    #[error("{requested} should have the key \"options\" defined in the mapping")]
    MissingOptionsKey { requested: String },

    /// The resolved value cannot describe a service at all.
    #[error("{}", .0)]
    InvalidDescriptorShape(InvalidDescriptorError),

    /// The delegate factory could not produce the requested service.
    #[error("Service {requested:?} was not created: {source}")]
    ServiceNotCreated {
        requested: String,
        #[source]
        source: Box<WakilError>,
    },

    /// No factory is registered under the requested name.
    #[error("{}", .0)]
    NotFound(NotFoundError),

    /// A factory returned an error while building a service.
    #[error("Failed to build {name:?}: {source}")]
    BuildFailed {
        name: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// A factory was already registered under this name.
    #[error("{}", .0)]
    AlreadyRegistered(AlreadyRegisteredError),

    /// A service exists but is not of the requested Rust type.
    #[error("Service {name:?} is not a {expected}")]
    TypeMismatch { name: String, expected: &'static str },

    /// A delegator setting has the wrong shape.
    #[error("Invalid setting {key:?}: expected {expected}, got {found}")]
    InvalidSetting {
        key: String,
        expected: &'static str,
        found: &'static str,
    },

    /// Delegated aliases point at each other.
    #[error("{}", .0)]
    CircularDelegation(CircularDelegationError),
}

impl WakilError {
    /// Wraps a factory error as [`WakilError::BuildFailed`].
    pub fn build_failed(
        name: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        WakilError::BuildFailed {
            name: name.into(),
            source: source.into(),
        }
    }
}

/// Error when a dotted key does not resolve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNotFoundError {
    /// The full key that was requested.
    pub key: String,
    /// The segment that did not resolve. Empty when the key itself was empty.
    pub segment: String,
    /// Zero-based position of `segment` within `key`.
    pub position: usize,
    /// Keys that exist at the depth where traversal stopped.
    pub available: Vec<String>,
}

impl PathNotFoundError {
    pub(crate) fn empty_key(key: &str) -> Self {
        Self {
            key: key.to_string(),
            segment: String::new(),
            position: 0,
            available: Vec::new(),
        }
    }

    /// Returns `true` if the failure is an empty or blank key.
    pub fn is_empty_key(&self) -> bool {
        self.key.trim().is_empty()
    }
}

impl fmt::Display for PathNotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty_key() {
            return write!(f, "Passed key is empty");
        }

        write!(
            f,
            "Sub key {:?}, part of {:?} does not exist in config",
            self.segment, self.key
        )?;

        for line in underline_segment(&self.key, self.position).lines() {
            write!(f, "\n  {line}")?;
        }

        let candidates: Vec<&str> = self.available.iter().map(String::as_str).collect();
        let suggestions = suggest_similar(&self.segment, &candidates, 3);
        if !suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        Ok(())
    }
}

impl std::error::Error for PathNotFoundError {}

/// Error when a resolved value has a shape no descriptor can take.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDescriptorError {
    /// The requested service name.
    pub requested: String,
    /// Which part of the descriptor is wrong.
    pub field: Option<&'static str>,
    /// What was expected there.
    pub expected: &'static str,
    /// The shape that was found instead.
    pub found: &'static str,
}

impl fmt::Display for InvalidDescriptorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.field {
            Some(field) => write!(
                f,
                "{}: {field:?} must be a {}, got {}",
                self.requested, self.expected, self.found
            )?,
            None => write!(
                f,
                "{} must be a {}, got {}",
                self.requested, self.expected, self.found
            )?,
        }
        write!(
            f,
            "\n  Hint: use a service name, or a mapping with \"service\" and \"options\""
        )
    }
}

/// Error when a service name is unknown to the container.
#[derive(Debug)]
pub struct NotFoundError {
    /// The name that was requested.
    pub name: String,
    /// Registered names that look similar.
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotFoundError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Service not found: {:?}", self.name)?;

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        Ok(())
    }
}

/// Error when trying to register a name that already exists.
#[derive(Debug)]
pub struct AlreadyRegisteredError {
    pub name: String,
}

impl fmt::Display for AlreadyRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Service already registered: {:?}", self.name)?;
        write!(
            f,
            "\n  Hint: enable allow_override on the builder to replace it"
        )
    }
}

/// Error when delegated aliases form a cycle.
#[derive(Debug)]
pub struct CircularDelegationError {
    /// The bindings that form the cycle, first one repeated at the end.
    pub chain: Vec<String>,
}

impl fmt::Display for CircularDelegationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Circular delegation detected:\n  ")?;
        write!(f, "{}", render_chain(&self.chain))?;
        write!(
            f,
            "\n  Hint: one of these entries must name a real service instead of another delegated key"
        )
    }
}

/// Convenient Result type for Wakil operations.
pub type Result<T> = std::result::Result<T, WakilError>;
