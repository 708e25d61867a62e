//! Error types for type inference.

use thiserror::Error;

/// A failure while building the inferred type tree.
///
/// Either error aborts the whole inference call; no partial type text is ever
/// produced.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    /// Two concrete type declarations for the same path disagree.
    #[error("conflicting types at `{path}`: cannot merge {existing} with {incoming}")]
    Conflict {
        path: String,
        existing: String,
        incoming: String,
    },

    /// An attempt to descend into a non-object node as if it were one.
    #[error("cannot descend into `{segment}` at `{path}`: it is {kind}, not an object")]
    InvalidPath {
        path: String,
        segment: String,
        kind: String,
    },
}
