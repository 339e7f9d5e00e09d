//! Read-only discovery of packaging inputs inside the submodule.
//!
//! Nothing in this module writes to disk. A miss is always `None`, never an
//! error; the pipeline turns misses into [`DiscoveryMiss`] records.

mod candidate;
mod headers;
pub mod probe;

pub use candidate::{Candidate, CandidateKind, discover, is_linkable_binary};
pub use headers::{HeaderDirectory, HeaderResolver};
pub use probe::{NamePattern, SearchLog, SearchRecord};

/// An expected artifact was not found where the pipeline looked.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("no {what} found under {}", root.display())]
pub struct DiscoveryMiss {
    /// What was missing.
    pub what: String,
    /// Where it was looked for.
    pub root: std::path::PathBuf,
}

impl DiscoveryMiss {
    /// Creates a miss for `what` under `root`.
    pub fn new(what: impl Into<String>, root: &std::path::Path) -> Self {
        Self {
            what: what.into(),
            root: root.to_path_buf(),
        }
    }
}
