//! Platform variants the unified bundle is built for.

use std::fmt;

/// Target configuration built from source for one slice of the `.xcframework`.
///
/// The set is fixed: building from source always attempts every variant in
/// [`PlatformVariant::ALL`] order.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_xcframework::bundler::PlatformVariant;
///
/// for variant in PlatformVariant::ALL {
///     println!("{} -> {}", variant, variant.destination());
/// }
/// ```
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformVariant {
    /// Native macOS build ("native-desktop").
    MacOs,
    /// Mac Catalyst build ("compatibility-desktop").
    MacCatalyst,
}

impl PlatformVariant {
    /// Every variant, in build order.
    pub const ALL: [PlatformVariant; 2] = [PlatformVariant::MacOs, PlatformVariant::MacCatalyst];

    /// Short identifier used for archive names and logs.
    pub fn slug(self) -> &'static str {
        match self {
            Self::MacOs => "macos",
            Self::MacCatalyst => "maccatalyst",
        }
    }

    /// Descriptive role of the variant.
    pub fn role(self) -> &'static str {
        match self {
            Self::MacOs => "native-desktop",
            Self::MacCatalyst => "compatibility-desktop",
        }
    }

    /// `xcodebuild -destination` selector for this variant.
    pub fn destination(self) -> &'static str {
        match self {
            Self::MacOs => "generic/platform=macOS",
            Self::MacCatalyst => "generic/platform=macOS,variant=Mac Catalyst",
        }
    }
}

impl fmt::Display for PlatformVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}
