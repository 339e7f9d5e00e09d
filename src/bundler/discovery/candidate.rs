//! Artifacts a strategy can start from.

use super::probe::{NamePattern, SearchLog};
use crate::bundler::error::Result;
use crate::bundler::settings::SearchDepths;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};

/// Kind of artifact discovered in the submodule.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CandidateKind {
    /// An `.xcodeproj` that `xcodebuild` can archive.
    BuildableProject,
    /// A single-platform `.framework`.
    PrebuiltBundle,
    /// A static archive or dynamic library without a project.
    RawLibrary,
}

impl CandidateKind {
    /// File-name patterns identifying this kind.
    pub fn patterns(self) -> &'static [&'static str] {
        match self {
            Self::BuildableProject => &["*.xcodeproj"],
            Self::PrebuiltBundle => &["*.framework"],
            Self::RawLibrary => &["*.a", "*.dylib"],
        }
    }

    /// Probe depth for this kind.
    pub fn max_depth(self, depths: SearchDepths) -> usize {
        match self {
            Self::BuildableProject => depths.project,
            Self::PrebuiltBundle => depths.prebuilt_bundle,
            Self::RawLibrary => depths.library,
        }
    }

    /// Content check applied to a name match. Raw libraries must start
    /// like a Mach-O image or an `ar` archive; other kinds are accepted by
    /// name alone.
    pub fn accepts(self, path: &Path) -> bool {
        match self {
            Self::RawLibrary => is_linkable_binary(path),
            Self::BuildableProject | Self::PrebuiltBundle => true,
        }
    }

    fn compiled_patterns(self) -> Result<Vec<NamePattern>> {
        self.patterns().iter().map(|p| NamePattern::new(p)).collect()
    }
}

impl fmt::Display for CandidateKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BuildableProject => "buildable project",
            Self::PrebuiltBundle => "prebuilt framework",
            Self::RawLibrary => "raw library",
        })
    }
}

/// A discovered artifact. Produced fresh on each run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Candidate {
    /// Discriminator.
    pub kind: CandidateKind,
    /// Absolute path of the artifact.
    pub path: PathBuf,
}

/// Probes `root` for the first artifact of `kind`, recording the probe in `log`.
pub fn discover(
    kind: CandidateKind,
    root: &Path,
    depths: SearchDepths,
    log: &mut SearchLog,
) -> Result<Option<Candidate>> {
    let patterns = kind.compiled_patterns()?;
    let found = log.find_matching(
        &kind.to_string(),
        root,
        &patterns,
        kind.max_depth(depths),
        |path| kind.accepts(path),
    );
    Ok(found.map(|path| Candidate { kind, path }))
}

/// Returns true if `path` starts like a Mach-O image (thin or fat) or a
/// static `ar` archive, the two forms the merge tool accepts as a library.
pub fn is_linkable_binary(path: &Path) -> bool {
    let mut header = [0u8; 16];
    let read = std::fs::File::open(path).and_then(|mut file| file.read_exact(&mut header));
    if let Err(e) = read {
        log::debug!("Cannot read header of {}: {}", path.display(), e);
        return false;
    }

    matches!(
        goblin::peek_bytes(&header),
        Ok(goblin::Hint::Mach(_) | goblin::Hint::MachFat(_) | goblin::Hint::Archive)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn discovers_first_library_and_records_probe() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("lib")).unwrap();
        fs::write(temp.path().join("lib/libSdk.a"), b"!<arch>\nlibSdk.o/       ").unwrap();

        let mut log = SearchLog::new();
        let candidate = discover(
            CandidateKind::RawLibrary,
            temp.path(),
            SearchDepths::default(),
            &mut log,
        )
        .unwrap()
        .unwrap();

        assert_eq!(candidate.kind, CandidateKind::RawLibrary);
        assert_eq!(candidate.path, temp.path().join("lib/libSdk.a"));
        assert_eq!(log.records()[0].target, "raw library");
        assert_eq!(log.records()[0].patterns, vec!["*.a", "*.dylib"]);
    }

    #[test]
    fn non_binary_library_names_are_passed_over() {
        let temp = tempfile::tempdir().unwrap();
        fs::create_dir_all(temp.path().join("lib")).unwrap();
        fs::write(
            temp.path().join("lib/libAlpha.a"),
            b"version https://git-lfs.github.com/spec/v1\n",
        )
        .unwrap();
        fs::write(temp.path().join("lib/libSdk.a"), b"!<arch>\nlibSdk.o/       ").unwrap();

        let mut log = SearchLog::new();
        let candidate = discover(
            CandidateKind::RawLibrary,
            temp.path(),
            SearchDepths::default(),
            &mut log,
        )
        .unwrap()
        .unwrap();

        assert_eq!(candidate.path, temp.path().join("lib/libSdk.a"));
        assert_eq!(log.records()[0].found.as_deref(), Some(candidate.path.as_path()));
    }

    #[test]
    fn placeholder_alone_is_a_miss() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("libSdk.dylib"), b"placeholder text file").unwrap();

        let found = discover(
            CandidateKind::RawLibrary,
            temp.path(),
            SearchDepths::default(),
            &mut SearchLog::new(),
        )
        .unwrap();
        assert!(found.is_none());
    }

    #[test]
    fn archive_magic_is_linkable() {
        let temp = tempfile::tempdir().unwrap();
        let lib = temp.path().join("libSdk.a");
        let mut bytes = b"!<arch>\n".to_vec();
        bytes.extend_from_slice(&[b' '; 64]);
        fs::write(&lib, bytes).unwrap();
        assert!(is_linkable_binary(&lib));
    }

    #[test]
    fn text_and_short_files_are_not_linkable() {
        let temp = tempfile::tempdir().unwrap();
        let text = temp.path().join("libFake.a");
        fs::write(&text, b"this is a text file, not an archive").unwrap();
        assert!(!is_linkable_binary(&text));

        let short = temp.path().join("libShort.dylib");
        fs::write(&short, b"\xcf\xfa").unwrap();
        assert!(!is_linkable_binary(&short));
    }

    #[test]
    fn thin_mach_o_magic_is_linkable() {
        let temp = tempfile::tempdir().unwrap();
        let lib = temp.path().join("libSdk.dylib");
        // MH_MAGIC_64, CPU_TYPE_ARM64, subtype, MH_DYLIB
        let mut bytes = vec![0xcf, 0xfa, 0xed, 0xfe, 0x0c, 0x00, 0x00, 0x01];
        bytes.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00]);
        bytes.extend_from_slice(&[0u8; 32]);
        fs::write(&lib, bytes).unwrap();
        assert!(is_linkable_binary(&lib));
    }
}
