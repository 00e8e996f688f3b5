//! Strongly-typed identifiers for persisted entities.
//!
//! Workflows and runs are identified by ULIDs. The display form carries a
//! short prefix (`wf_01H...`) so ids pasted into logs or the command line
//! are self-describing; parsing accepts both the prefixed and the bare form.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Error returned when parsing an id from a string fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseIdError {
    /// The kind of id that failed to parse.
    pub id_type: &'static str,
    /// Why parsing failed.
    pub reason: String,
}

impl fmt::Display for ParseIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {}: {}", self.id_type, self.reason)
    }
}

impl std::error::Error for ParseIdError {}

fn parse_prefixed(input: &str, prefix: &str, id_type: &'static str) -> Result<Ulid, ParseIdError> {
    let raw = input
        .strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('_'))
        .unwrap_or(input);

    Ulid::from_str(raw).map_err(|e| ParseIdError {
        id_type,
        reason: e.to_string(),
    })
}

/// Generates a ULID-backed id newtype with a display prefix.
macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(Ulid);

        impl $name {
            /// Display prefix for this id type.
            pub const PREFIX: &'static str = $prefix;

            /// Creates a fresh id.
            #[must_use]
            pub fn new() -> Self {
                Self(Ulid::new())
            }

            /// Wraps an existing ULID.
            #[must_use]
            pub const fn from_ulid(ulid: Ulid) -> Self {
                Self(ulid)
            }

            /// Returns the underlying ULID.
            #[must_use]
            pub const fn as_ulid(&self) -> Ulid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}_{}", Self::PREFIX, self.0)
            }
        }

        impl FromStr for $name {
            type Err = ParseIdError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                parse_prefixed(s, Self::PREFIX, stringify!($name)).map(Self)
            }
        }

        impl From<Ulid> for $name {
            fn from(ulid: Ulid) -> Self {
                Self(ulid)
            }
        }
    };
}

define_id!(
    /// Identifies a persisted workflow (one canvas: nodes plus edges).
    WorkflowId,
    "wf"
);

define_id!(
    /// Identifies one execution of a workflow.
    WorkflowRunId,
    "run"
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_uses_prefix() {
        assert!(WorkflowId::new().to_string().starts_with("wf_"));
        assert!(WorkflowRunId::new().to_string().starts_with("run_"));
    }

    #[test]
    fn parses_prefixed_and_bare_forms() {
        let id = WorkflowId::new();
        let prefixed: WorkflowId = id.to_string().parse().expect("prefixed form");
        let bare: WorkflowId = id.as_ulid().to_string().parse().expect("bare form");
        assert_eq!(prefixed, id);
        assert_eq!(bare, id);
    }

    #[test]
    fn rejects_garbage() {
        let err = "wf_not-a-ulid".parse::<WorkflowId>().unwrap_err();
        assert_eq!(err.id_type, "WorkflowId");
        assert!(err.to_string().starts_with("invalid WorkflowId"));
    }

    #[test]
    fn serializes_as_bare_ulid() {
        let id = WorkflowRunId::new();
        let json = serde_json::to_string(&id).expect("serialize");
        assert_eq!(json, format!("\"{}\"", id.as_ulid()));
        let parsed: WorkflowRunId = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, id);
    }
}
