use serde::{Deserialize, Serialize};

/// Classification shared by every error in the workspace.
///
/// Each crate keeps its own error enum; `kind()` on those enums maps onto
/// this set so callers can react without matching on crate internals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Malformed or missing input. The caller's fault; never retried.
    Validation,
    /// A referenced vehicle, component or service does not exist.
    NotFound,
    /// Uniqueness violation or ambiguous resolution.
    Conflict,
    /// Operation not permitted in the current lifecycle state.
    State,
    /// The catalog or the persistence layer failed or timed out.
    Dependency,
}

impl ErrorKind {
    /// Returns the snake_case name used on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::State => "state",
            ErrorKind::Dependency => "dependency",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
