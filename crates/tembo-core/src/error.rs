use std::fmt;

/// Machine-readable error codes for callers that branch on failure kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    NotFound,
    InvalidRelation,
    InvalidParameter,
    InvalidRange,
    CycleDetected,
}

impl ErrorCode {
    /// Stable code identifier (`E####`) for machine parsing.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::NotFound => "E2001",
            Self::InvalidRelation => "E2002",
            Self::CycleDetected => "E2003",
            Self::InvalidParameter => "E4001",
            Self::InvalidRange => "E4002",
        }
    }

    /// Short human-facing summary for logs and terminal output.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::NotFound => "Entity not found",
            Self::InvalidRelation => "Relation would break a graph invariant",
            Self::CycleDetected => "Ancestry walk looped",
            Self::InvalidParameter => "Parameter out of bounds",
            Self::InvalidRange => "Invalid year range",
        }
    }

    /// Optional remediation hint that can be surfaced to operators.
    #[must_use]
    pub const fn hint(self) -> Option<&'static str> {
        match self {
            Self::NotFound => None,
            Self::InvalidRelation => {
                Some("Check parent gender, existing parent slots and ancestry before linking.")
            }
            Self::CycleDetected => {
                Some("The archive graph is malformed. Run the invariant check and report a bug.")
            }
            Self::InvalidParameter => Some("Use counts and spans within the documented bounds."),
            Self::InvalidRange => Some("Pass the earlier year first: year_from <= year_to."),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Error returned by every fallible archive, search and generator operation.
///
/// All variants are recoverable. A failed operation never leaves a partial
/// mutation behind.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArchiveError {
    /// The referenced entity does not exist (or has been collected), or a
    /// query found nothing matching `id`.
    #[error("{kind} not found: {id}")]
    NotFound { kind: &'static str, id: String },

    /// The requested link would violate a bidirectional or ancestry invariant.
    #[error("invalid relation: {0}")]
    InvalidRelation(String),

    /// A generator or query parameter is outside its documented bounds.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// `year_from` is later than `year_to`.
    #[error("invalid range: {from} > {to}")]
    InvalidRange { from: i32, to: i32 },

    /// A traversal revisited an entity on its own path.
    #[error("cycle detected while walking ancestry of elephant {start} (revisited {revisited})")]
    CycleDetected { start: u64, revisited: u64 },
}

impl ArchiveError {
    /// The stable code for this error.
    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { .. } => ErrorCode::NotFound,
            Self::InvalidRelation(_) => ErrorCode::InvalidRelation,
            Self::InvalidParameter(_) => ErrorCode::InvalidParameter,
            Self::InvalidRange { .. } => ErrorCode::InvalidRange,
            Self::CycleDetected { .. } => ErrorCode::CycleDetected,
        }
    }

    /// Build an [`ArchiveError::NotFound`] for a query key.
    pub fn not_found(kind: &'static str, id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub(crate) fn relation(msg: impl Into<String>) -> Self {
        Self::InvalidRelation(msg.into())
    }

    /// Build an [`ArchiveError::InvalidParameter`].
    pub fn parameter(msg: impl Into<String>) -> Self {
        Self::InvalidParameter(msg.into())
    }

    /// Validate an inclusive year range.
    ///
    /// # Errors
    ///
    /// Returns [`ArchiveError::InvalidRange`] when `from > to`.
    pub const fn check_range(from: i32, to: i32) -> Result<(), Self> {
        if from > to {
            Err(Self::InvalidRange { from, to })
        } else {
            Ok(())
        }
    }
}

pub type Result<T, E = ArchiveError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::{ArchiveError, ErrorCode};
    use std::collections::HashSet;

    #[test]
    fn all_codes_are_unique() {
        let all = [
            ErrorCode::NotFound,
            ErrorCode::InvalidRelation,
            ErrorCode::InvalidParameter,
            ErrorCode::InvalidRange,
            ErrorCode::CycleDetected,
        ];

        let mut seen = HashSet::new();
        for code in all {
            assert!(seen.insert(code.code()), "duplicate code {}", code.code());
        }
    }

    #[test]
    fn code_format_is_machine_friendly() {
        let code = ErrorCode::InvalidRelation.code();
        assert_eq!(code.len(), 5);
        assert!(code.starts_with('E'));
        assert!(code.chars().skip(1).all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn range_check_rejects_reversed_years() {
        assert!(ArchiveError::check_range(2000, 2000).is_ok());
        assert_eq!(
            ArchiveError::check_range(2001, 2000),
            Err(ArchiveError::InvalidRange {
                from: 2001,
                to: 2000
            })
        );
    }

    #[test]
    fn errors_map_to_codes() {
        let err = ArchiveError::NotFound {
            kind: "elephant",
            id: "7".to_string(),
        };
        assert_eq!(err.code(), ErrorCode::NotFound);
        assert_eq!(err.to_string(), "elephant not found: 7");
    }
}
