//! Bundle checksum calculation.
//!
//! The unified bundle is a directory tree, so its digest covers every file's
//! relative path and contents in sorted order.

use crate::bundler::{Result, error::ErrorExt};
use sha2::{Digest, Sha256};
use std::path::Path;
use tokio::io::AsyncReadExt;

/// Calculates the SHA-256 checksum of a directory tree.
///
/// # Algorithm
///
/// 1. Recursively collect all files using walkdir (symlinks not followed)
/// 2. Sort paths lexicographically for deterministic order
/// 3. For each file: hash(relative_path + file_content)
/// 4. Return the hex-encoded combined hash
///
/// Two bundles with identical layout and contents have identical checksums
/// regardless of where they live.
pub async fn calculate_sha256(dir_path: &Path) -> Result<String> {
    let mut entries = Vec::new();
    for entry in walkdir::WalkDir::new(dir_path).follow_links(false) {
        let entry = entry?;
        if entry.file_type().is_file() {
            entries.push(entry.into_path());
        }
    }
    entries.sort();

    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; 8192];

    for path in entries {
        let rel_path = path.strip_prefix(dir_path)?;
        hasher.update(rel_path.to_string_lossy().as_bytes());

        let mut file = tokio::fs::File::open(&path)
            .await
            .fs_context("opening file for hashing", &path)?;
        loop {
            let n = file
                .read(&mut buffer)
                .await
                .fs_context("reading file for hash calculation", &path)?;
            if n == 0 {
                break;
            }
            hasher.update(&buffer[..n]);
        }
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_tree(root: &Path, plist: &[u8]) {
        std::fs::create_dir_all(root.join("macos-arm64/Sdk.framework")).unwrap();
        std::fs::write(root.join("Info.plist"), plist).unwrap();
        std::fs::write(root.join("macos-arm64/Sdk.framework/Sdk"), b"binary").unwrap();
    }

    #[tokio::test]
    async fn checksum_is_location_independent() {
        let temp = tempfile::tempdir().unwrap();
        let a = temp.path().join("a/Sdk.xcframework");
        let b = temp.path().join("b/Sdk.xcframework");
        write_tree(&a, b"<plist/>");
        write_tree(&b, b"<plist/>");

        let first = calculate_sha256(&a).await.unwrap();
        assert_eq!(first.len(), 64);
        assert_eq!(first, calculate_sha256(&b).await.unwrap());
    }

    #[tokio::test]
    async fn checksum_changes_with_contents() {
        let temp = tempfile::tempdir().unwrap();
        let a = temp.path().join("a/Sdk.xcframework");
        let b = temp.path().join("b/Sdk.xcframework");
        write_tree(&a, b"<plist/>");
        write_tree(&b, b"<plist version=\"1.0\"/>");

        assert_ne!(
            calculate_sha256(&a).await.unwrap(),
            calculate_sha256(&b).await.unwrap()
        );
    }
}
