//! Error types for Binaa container operations.
//!
//! Every failure carries enough provenance to act on: which result path
//! collided with which constructor, which constructors form a cycle,
//! and where the failing constructor was registered.

use std::fmt;

use binaa_support::rendering::{render_chain, shorten_type_name};

use crate::key::DependencyKey;
use crate::location::Location;

/// Boxed error returned by user constructors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all Binaa operations.
#[derive(Debug, thiserror::Error)]
pub enum BinaaError {
    /// Malformed options, misused result objects, or a constructor
    /// that produces nothing.
    #[error("{}", .0)]
    InvalidInput(InvalidInputError),

    /// Two producers claim the same singleton key.
    #[error("{}", .0)]
    KeyConflict(KeyConflictError),

    /// The dependency graph would contain a cycle.
    #[error("{}", .0)]
    CycleDetected(CycleError),

    /// A registration failed; wraps the reason with the constructor's
    /// location.
    #[error(transparent)]
    Provide(ProvideError),

    /// A dependency has no provider.
    #[error("{}", .0)]
    NotRegistered(NotRegisteredError),

    /// A constructor returned an error or an unexpected set of values.
    #[error("Failed to construct values of {location}: {source}")]
    ConstructionFailed {
        location: Location,
        #[source]
        source: BoxError,
    },

    /// A constructor read its arguments with the wrong shape or type.
    #[error("Argument mismatch: {0}")]
    Argument(String),
}

impl BinaaError {
    /// The underlying reason, with any [`ProvideError`] wrappers removed.
    pub fn reason(&self) -> &BinaaError {
        match self {
            BinaaError::Provide(err) => err.reason.reason(),
            other => other,
        }
    }

    pub fn is_cycle(&self) -> bool {
        matches!(self.reason(), BinaaError::CycleDetected(_))
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self.reason(), BinaaError::KeyConflict(_))
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self.reason(), BinaaError::InvalidInput(_))
    }
}

/// Error for invalid registrations.
#[derive(Debug)]
pub struct InvalidInputError {
    pub message: String,
}

impl InvalidInputError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for InvalidInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Who already owns a conflicting key.
#[derive(Debug)]
pub enum ConflictSource {
    /// Another result path of the same constructor.
    SameConstructor { path: String },
    /// Previously registered constructors.
    Registered { locations: Vec<Location> },
}

/// Error when a singleton key would get a second producer.
#[derive(Debug)]
pub struct KeyConflictError {
    pub key: DependencyKey,
    /// Result path of the new producer, e.g. `[1].Foo`.
    pub path: String,
    pub conflict: ConflictSource,
}

impl fmt::Display for KeyConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "cannot provide {} from {}", self.key, self.path)?;
        match &self.conflict {
            ConflictSource::SameConstructor { path } => {
                write!(f, ": already provided by {path}")
            }
            ConflictSource::Registered { locations } => {
                let rendered: Vec<String> = locations.iter().map(ToString::to_string).collect();
                write!(f, ": already provided by {}", rendered.join("; "))?;
                write!(
                    f,
                    "\n  Hint: Use a name to register another {} alongside it",
                    shorten_type_name(self.key.type_name())
                )
            }
        }
    }
}

/// One constructor on a dependency cycle.
#[derive(Debug, Clone)]
pub struct CycleEntry {
    /// Position of the constructor in the graph.
    pub order: usize,
    pub location: Location,
}

impl fmt::Display for CycleEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} {}", self.order, self.location)
    }
}

/// Error when a registration would close a dependency cycle.
///
/// Each entry depends on the next; the first and last entries are the
/// same constructor.
#[derive(Debug)]
pub struct CycleError {
    pub path: Vec<CycleEntry>,
}

impl fmt::Display for CycleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let chain: Vec<String> = self.path.iter().map(ToString::to_string).collect();
        write!(f, "cycle detected in dependency graph:\n  {}", render_chain(&chain))?;
        write!(
            f,
            "\n  Hint: Break the cycle with an optional dependency or by restructuring constructors"
        )
    }
}

/// A failed registration, located at the constructor.
#[derive(Debug, thiserror::Error)]
#[error("cannot provide function {location}: {reason}")]
pub struct ProvideError {
    pub location: Location,
    #[source]
    pub reason: Box<BinaaError>,
}

/// Error when a dependency has no provider at resolution time.
#[derive(Debug)]
pub struct NotRegisteredError {
    /// The dependency that was requested
    pub requested: DependencyKey,
    /// The constructor that needed it (if known)
    pub required_by: Option<Location>,
    /// Similar types that ARE registered
    pub suggestions: Vec<String>,
}

impl fmt::Display for NotRegisteredError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Dependency not registered: {}", self.requested)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: Did you forget to provide a constructor for {}?",
            shorten_type_name(self.requested.type_name())
        )
    }
}

/// Convenient Result type for Binaa operations.
pub type Result<T> = std::result::Result<T, BinaaError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn loc(function: &str) -> Location {
        Location::new(function, "src/app.rs", 10, 1)
    }

    #[test]
    fn not_registered_error_display() {
        let err = BinaaError::NotRegistered(NotRegisteredError {
            requested: DependencyKey::of::<String>(),
            required_by: Some(loc("new_service")),
            suggestions: vec!["alloc::string::String[name=\"a\"]".into()],
        });

        let msg = format!("{err}");
        assert!(msg.contains("not registered"));
        assert!(msg.contains("String"));
        assert!(msg.contains("new_service"));
        assert!(msg.contains("Did you mean"));
    }

    #[test]
    fn cycle_error_display() {
        let err = BinaaError::CycleDetected(CycleError {
            path: vec![
                CycleEntry { order: 0, location: loc("new_a") },
                CycleEntry { order: 1, location: loc("new_b") },
                CycleEntry { order: 0, location: loc("new_a") },
            ],
        });

        let msg = format!("{err}");
        assert!(msg.contains("cycle detected"));
        assert!(msg.contains("#0 new_a"));
        assert!(msg.contains("→ #1 new_b"));
    }

    #[test]
    fn conflict_with_registered_lists_locations() {
        let err = KeyConflictError {
            key: DependencyKey::of::<u32>(),
            path: "[0]".into(),
            conflict: ConflictSource::Registered {
                locations: vec![loc("f1"), loc("f2")],
            },
        };
        let msg = err.to_string();
        assert!(msg.starts_with("cannot provide u32 from [0]"));
        assert!(msg.contains("f1 (src/app.rs:10); f2 (src/app.rs:10)"));
    }

    #[test]
    fn conflict_within_constructor_names_both_paths() {
        let err = KeyConflictError {
            key: DependencyKey::of::<u32>(),
            path: "[1].B".into(),
            conflict: ConflictSource::SameConstructor { path: "[1].A".into() },
        };
        assert_eq!(
            err.to_string(),
            "cannot provide u32 from [1].B: already provided by [1].A"
        );
    }

    #[test]
    fn reason_peels_provide_wrappers() {
        let err = BinaaError::Provide(ProvideError {
            location: loc("f3"),
            reason: Box::new(BinaaError::InvalidInput(InvalidInputError::new("bad"))),
        });
        assert!(err.is_invalid_input());
        assert!(!err.is_cycle());
        assert!(err.to_string().starts_with("cannot provide function f3"));
        assert!(std::error::Error::source(&err).is_some());
    }
}
