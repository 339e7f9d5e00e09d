//! Locating the SDK's public header.

use super::probe::{NamePattern, SearchLog, SearchRecord};
use crate::bundler::error::Result;
use std::path::{Path, PathBuf};

/// Directory known to contain the SDK's public header.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct HeaderDirectory {
    dir: PathBuf,
    header: PathBuf,
}

impl HeaderDirectory {
    /// The directory passed to `-headers`.
    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// The header file inside [`path`](Self::path).
    pub fn header(&self) -> &Path {
        &self.header
    }
}

/// Resolves the header directory for a submodule.
///
/// Priority:
/// 1. the first directory (bounded search) containing a file named `header_name`;
/// 2. the first conventional directory that exists, is non-empty and
///    directly contains the header.
#[derive(Clone, Debug)]
pub struct HeaderResolver<'a> {
    header_name: &'a str,
    conventional_dirs: &'a [PathBuf],
    max_depth: usize,
}

impl<'a> HeaderResolver<'a> {
    /// Creates a resolver for `header_name`.
    pub fn new(header_name: &'a str, conventional_dirs: &'a [PathBuf], max_depth: usize) -> Self {
        Self {
            header_name,
            conventional_dirs,
            max_depth,
        }
    }

    /// Returns the directory containing the header, never the header itself.
    ///
    /// A miss is `Ok(None)`; errors only come from an unusable header name.
    pub fn resolve(
        &self,
        submodule_root: &Path,
        log: &mut SearchLog,
    ) -> Result<Option<HeaderDirectory>> {
        let pattern = [NamePattern::exact(self.header_name)?];

        let direct = log.find_matching(
            "public header",
            submodule_root,
            &pattern,
            self.max_depth,
            |path| path.is_file(),
        );
        if let Some(header) = direct {
            if let Some(dir) = header.parent() {
                return Ok(Some(HeaderDirectory {
                    dir: dir.to_path_buf(),
                    header: header.clone(),
                }));
            }
        }

        for rel in self.conventional_dirs {
            let dir = submodule_root.join(rel);
            let header = dir.join(self.header_name);
            let accepted = is_non_empty_dir(&dir) && header.is_file();

            log.record(SearchRecord {
                target: "public header (conventional directory)".to_string(),
                root: dir.clone(),
                patterns: vec![self.header_name.to_string()],
                max_depth: 1,
                found: accepted.then(|| header.clone()),
            });

            if accepted {
                log::debug!("Using conventional header directory {}", dir.display());
                return Ok(Some(HeaderDirectory { dir, header }));
            }
        }

        Ok(None)
    }
}

fn is_non_empty_dir(dir: &Path) -> bool {
    std::fs::read_dir(dir)
        .map(|mut entries| entries.next().is_some())
        .unwrap_or(false)
}
