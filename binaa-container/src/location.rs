//! Source locations of registered constructors.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Where a constructor was registered, used in every diagnostic.
///
/// Captured from the `provide` call site with `#[track_caller]`, or
/// supplied explicitly through [`location`](crate::options::location)
/// for generated constructors whose call site says nothing useful.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub function: String,
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl Location {
    pub fn new(
        function: impl Into<String>,
        file: impl Into<String>,
        line: u32,
        column: u32,
    ) -> Self {
        Self {
            function: function.into(),
            file: file.into(),
            line,
            column,
        }
    }

    /// Location of the caller, labelled with `function`.
    #[track_caller]
    pub fn caller(function: impl Into<String>) -> Self {
        let at = std::panic::Location::caller();
        Self::new(function, at.file(), at.line(), at.column())
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}:{})", self.function, self.file, self.line)
    }
}
