//! Error type shared by configuration and interpretation.

/// Failures reported by the [`Turtle`](crate::Turtle).
///
/// The first three variants describe malformed instruction streams (unbalanced
/// branch brackets). They are only produced under
/// [`UnderflowPolicy::Strict`](crate::UnderflowPolicy::Strict).
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum TurtleError {
    #[error("malformed instruction at index {index}: branch close with an empty stack")]
    UnbalancedClose { index: usize },

    #[error("malformed instruction string: {depth} branch(es) left open at end of run")]
    UnclosedBranch { depth: usize },

    #[error("malformed instruction at index {index}: branch stack exceeded {max} entries")]
    StackOverflow { index: usize, max: usize },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid line color {0:?}, expected #rrggbb")]
    InvalidColor(String),
}

impl TurtleError {
    /// Returns true for the unbalanced-bracket conditions.
    pub fn is_malformed(&self) -> bool {
        matches!(
            self,
            Self::UnbalancedClose { .. } | Self::UnclosedBranch { .. } | Self::StackOverflow { .. }
        )
    }
}
