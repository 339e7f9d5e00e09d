//! Depth-bounded filesystem probing.
//!
//! [`find`] is a pure read-only traversal: it walks level by level, visits
//! siblings in byte-wise name order, and returns the first entry whose name
//! matches any pattern. The same tree always yields the same answer.

use crate::bundler::error::{Error, Result};
use std::ffi::OsString;
use std::fs;
use std::path::{Path, PathBuf};

/// A file-name pattern (`*.xcodeproj`, `lib*.a`, `Sdk.h`).
#[derive(Clone, Debug)]
pub struct NamePattern {
    raw: String,
    pattern: glob::Pattern,
}

impl NamePattern {
    /// Parses a glob pattern matched against a single path component.
    pub fn new(raw: &str) -> Result<Self> {
        let pattern = glob::Pattern::new(raw).map_err(|source| Error::InvalidPattern {
            pattern: raw.to_string(),
            source,
        })?;
        Ok(Self {
            raw: raw.to_string(),
            pattern,
        })
    }

    /// Pattern matching exactly `name`, with glob metacharacters escaped.
    pub fn exact(name: &str) -> Result<Self> {
        let mut pattern = Self::new(&glob::Pattern::escape(name))?;
        pattern.raw = name.to_string();
        Ok(pattern)
    }

    /// Returns true if `name` matches.
    pub fn matches(&self, name: &str) -> bool {
        self.pattern.matches(name)
    }

    /// The pattern as written.
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

/// Returns the first entry under `root` whose name matches any of `patterns`.
///
/// Entries are considered level by level up to `max_depth` (the root's
/// children are depth 1), with siblings in lexicographic order. Unreadable
/// directories are skipped. Symlinks are matched by name but never followed.
/// `root` itself is never a match.
pub fn find(root: &Path, patterns: &[NamePattern], max_depth: usize) -> Option<PathBuf> {
    find_matching(root, patterns, max_depth, |_| true)
}

/// Like [`find`], but a name match only counts if `accept` returns true for
/// its path. Rejected directories are still descended into.
pub fn find_matching<F>(
    root: &Path,
    patterns: &[NamePattern],
    max_depth: usize,
    accept: F,
) -> Option<PathBuf>
where
    F: Fn(&Path) -> bool,
{
    let mut frontier = vec![root.to_path_buf()];

    for _depth in 1..=max_depth {
        let mut next = Vec::new();

        for dir in &frontier {
            for (name, path, is_dir) in sorted_children(dir) {
                let name = name.to_string_lossy();
                if patterns.iter().any(|p| p.matches(&name)) && accept(&path) {
                    return Some(path);
                }
                if is_dir {
                    next.push(path);
                }
            }
        }

        if next.is_empty() {
            break;
        }
        frontier = next;
    }

    None
}

/// Children of `dir` as `(name, path, is_real_dir)`, sorted by name.
fn sorted_children(dir: &Path) -> Vec<(OsString, PathBuf, bool)> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            log::debug!("Skipping unreadable directory {}: {}", dir.display(), e);
            return Vec::new();
        }
    };

    let mut children: Vec<_> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| {
            let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
            (entry.file_name(), entry.path(), is_dir)
        })
        .collect();
    children.sort_by(|a, b| a.0.cmp(&b.0));
    children
}

/// One probe made during a run, kept for diagnostics.
#[derive(Clone, Debug, Eq, PartialEq, serde::Serialize)]
pub struct SearchRecord {
    /// What was being looked for.
    pub target: String,
    /// Directory searched.
    pub root: PathBuf,
    /// Name patterns.
    pub patterns: Vec<String>,
    /// Maximum depth searched.
    pub max_depth: usize,
    /// What was found, if anything.
    pub found: Option<PathBuf>,
}

/// Ordered record of every probe made during a run.
#[derive(Clone, Debug, Default)]
pub struct SearchLog {
    records: Vec<SearchRecord>,
}

impl SearchLog {
    /// Creates an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs [`find`] and records the probe.
    pub fn find(
        &mut self,
        target: &str,
        root: &Path,
        patterns: &[NamePattern],
        max_depth: usize,
    ) -> Option<PathBuf> {
        self.find_matching(target, root, patterns, max_depth, |_| true)
    }

    /// Runs [`find_matching`] and records the probe.
    pub fn find_matching<F>(
        &mut self,
        target: &str,
        root: &Path,
        patterns: &[NamePattern],
        max_depth: usize,
        accept: F,
    ) -> Option<PathBuf>
    where
        F: Fn(&Path) -> bool,
    {
        let found = find_matching(root, patterns, max_depth, accept);
        match &found {
            Some(path) => log::debug!("Found {} at {}", target, path.display()),
            None => log::debug!(
                "No {} under {} (depth {})",
                target,
                root.display(),
                max_depth
            ),
        }
        self.record(SearchRecord {
            target: target.to_string(),
            root: root.to_path_buf(),
            patterns: patterns.iter().map(|p| p.as_str().to_string()).collect(),
            max_depth,
            found: found.clone(),
        });
        found
    }

    /// Records a probe made by other means.
    pub fn record(&mut self, record: SearchRecord) {
        self.records.push(record);
    }

    /// Recorded probes, in order.
    pub fn records(&self) -> &[SearchRecord] {
        &self.records
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"").unwrap();
    }

    fn patterns(raw: &[&str]) -> Vec<NamePattern> {
        raw.iter().map(|p| NamePattern::new(p).unwrap()).collect()
    }

    #[test]
    fn shallower_match_wins_over_earlier_name() {
        let temp = tempfile::tempdir().unwrap();
        touch(temp.path(), "a/b/First.framework/Info.plist");
        touch(temp.path(), "z/Second.framework/Info.plist");

        let found = find(temp.path(), &patterns(&["*.framework"]), 4).unwrap();
        assert_eq!(found, temp.path().join("z/Second.framework"));
    }

    #[test]
    fn siblings_are_visited_in_name_order() {
        let temp = tempfile::tempdir().unwrap();
        touch(temp.path(), "lib/libZeta.a");
        touch(temp.path(), "lib/libAlpha.a");
        touch(temp.path(), "lib/libMid.dylib");

        let pats = patterns(&["*.a", "*.dylib"]);
        for _ in 0..3 {
            assert_eq!(
                find(temp.path(), &pats, 3).unwrap(),
                temp.path().join("lib/libAlpha.a")
            );
        }
    }

    #[test]
    fn rejected_matches_do_not_stop_the_search() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("Sdk.h")).unwrap();
        touch(temp.path(), "Sources/Public/Sdk.h");

        let pats = vec![NamePattern::exact("Sdk.h").unwrap()];
        assert_eq!(find(temp.path(), &pats, 5).unwrap(), temp.path().join("Sdk.h"));
        assert_eq!(
            find_matching(temp.path(), &pats, 5, |p| p.is_file()).unwrap(),
            temp.path().join("Sources/Public/Sdk.h")
        );
    }

    #[test]
    fn depth_bound_is_respected() {
        let temp = tempfile::tempdir().unwrap();
        touch(temp.path(), "one/two/three/Sdk.h");

        let pats = vec![NamePattern::exact("Sdk.h").unwrap()];
        assert!(find(temp.path(), &pats, 3).is_none());
        assert!(find(temp.path(), &pats, 4).is_some());
        assert!(find(temp.path(), &pats, 0).is_none());
    }

    #[test]
    fn missing_root_is_a_miss_not_an_error() {
        let temp = tempfile::tempdir().unwrap();
        let pats = patterns(&["*.xcodeproj"]);
        assert!(find(&temp.path().join("absent"), &pats, 3).is_none());
    }

    #[cfg(unix)]
    #[test]
    fn unreadable_directories_are_skipped() {
        use std::os::unix::fs::PermissionsExt;

        let temp = tempfile::tempdir().unwrap();
        touch(temp.path(), "a_locked/Hidden.framework/Info.plist");
        touch(temp.path(), "b_open/nested/Visible.framework/Info.plist");
        let locked = temp.path().join("a_locked");
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o000)).unwrap();

        let result = find(temp.path(), &patterns(&["*.framework"]), 4);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755)).unwrap();

        // Running as root ignores permissions; either way the probe must not fail.
        let found = result.unwrap();
        assert!(found.ends_with("Hidden.framework") || found.ends_with("Visible.framework"));
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directories_are_not_followed() {
        let temp = tempfile::tempdir().unwrap();
        touch(temp.path(), "real/Sdk.h");
        fs::create_dir_all(temp.path().join("tree")).unwrap();
        std::os::unix::fs::symlink(temp.path().join("real"), temp.path().join("tree/link")).unwrap();

        let pats = vec![NamePattern::exact("Sdk.h").unwrap()];
        assert!(find(&temp.path().join("tree"), &pats, 4).is_none());
    }

    #[test]
    fn exact_pattern_escapes_metacharacters() {
        let pattern = NamePattern::exact("Sdk[1].h").unwrap();
        assert!(pattern.matches("Sdk[1].h"));
        assert!(!pattern.matches("Sdk1.h"));
        assert_eq!(pattern.as_str(), "Sdk[1].h");
    }

    #[test]
    fn search_log_records_misses_and_hits() {
        let temp = tempfile::tempdir().unwrap();
        touch(temp.path(), "Sdk.xcodeproj/project.pbxproj");

        let mut log = SearchLog::new();
        assert!(log.find("prebuilt framework", temp.path(), &patterns(&["*.framework"]), 4).is_none());
        assert!(log.find("Xcode project", temp.path(), &patterns(&["*.xcodeproj"]), 3).is_some());

        let records = log.records();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].found, None);
        assert_eq!(records[1].patterns, vec!["*.xcodeproj".to_string()]);
    }
}
