//! Main packaging orchestration.
//!
//! This module provides the [`Bundler`] pipeline that turns a submodule of
//! unknown layout into a unified `.xcframework`, or into a
//! [`DiagnosticReport`] explaining why it could not.

use super::{
    checksum::calculate_sha256,
    diagnostics::{self, DiagnosticReport, ReportContext},
    lock::OutputLock,
    tool_detection::resolve_program,
};
use crate::bundler::{
    Result,
    discovery::{CandidateKind, DiscoveryMiss, HeaderResolver, SearchLog, discover},
    platform::macos::{
        xcframework::{UnifiedBundle, WrapFailure, XcframeworkWrapper},
        xcodebuild::{BuildFailure, XcodeBuilder},
    },
    settings::{PlatformVariant, Settings},
    utils::{fs, process::CommandRunner},
};
use std::fmt;
use std::path::PathBuf;

/// A way of producing the unified bundle, in priority order.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Strategy {
    /// Archive every variant from an `.xcodeproj` and merge the results.
    BuildFromSource,
    /// Wrap a prebuilt single-platform `.framework`.
    WrapPrebuiltBundle,
    /// Wrap a raw library together with its header directory.
    WrapRawLibrary,
}

impl Strategy {
    /// All strategies, most authoritative first.
    pub const ORDER: [Strategy; 3] = [
        Strategy::BuildFromSource,
        Strategy::WrapPrebuiltBundle,
        Strategy::WrapRawLibrary,
    ];
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::BuildFromSource => "build from source",
            Self::WrapPrebuiltBundle => "wrap prebuilt framework",
            Self::WrapRawLibrary => "wrap raw library",
        })
    }
}

/// States of the packaging pipeline.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PipelineState {
    /// Idempotency gate.
    CheckExisting,
    /// Build every variant from source.
    TryBuildFromSource,
    /// Wrap a prebuilt framework.
    TryWrapPrebuiltBundle,
    /// Wrap a raw library and headers.
    TryWrapRawLibrary,
    /// Nothing worked.
    Exhausted,
    /// A bundle is at the output path.
    Done,
}

impl PipelineState {
    fn for_strategy(strategy: Strategy) -> Self {
        match strategy {
            Strategy::BuildFromSource => Self::TryBuildFromSource,
            Strategy::WrapPrebuiltBundle => Self::TryWrapPrebuiltBundle,
            Strategy::WrapRawLibrary => Self::TryWrapRawLibrary,
        }
    }

    /// State entered when the strategy tried in `self` did not succeed.
    fn next_on_failure(self) -> Self {
        match self {
            Self::TryBuildFromSource => Self::TryWrapPrebuiltBundle,
            Self::TryWrapPrebuiltBundle => Self::TryWrapRawLibrary,
            _ => Self::Exhausted,
        }
    }
}

/// How a strategy ended.
#[derive(Clone, Debug)]
pub enum AttemptOutcome {
    /// A precondition was not met; nothing was run.
    Skipped(Vec<DiscoveryMiss>),
    /// A project was found but every variant build failed.
    NoVariantBuilt,
    /// The merge tool rejected the inputs.
    WrapFailed(WrapFailure),
    /// The bundle was produced.
    Succeeded(UnifiedBundle),
}

impl fmt::Display for AttemptOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Skipped(misses) => {
                let misses: Vec<String> = misses.iter().map(ToString::to_string).collect();
                write!(f, "skipped: {}", misses.join("; "))
            }
            Self::NoVariantBuilt => f.write_str("failed: no platform variant built"),
            Self::WrapFailed(failure) => write!(f, "failed: {failure}"),
            Self::Succeeded(bundle) => write!(f, "succeeded: {}", bundle.path.display()),
        }
    }
}

/// Record of one strategy run.
#[derive(Clone, Debug)]
pub struct StrategyAttempt {
    /// Strategy tried.
    pub strategy: Strategy,
    /// How it ended.
    pub outcome: AttemptOutcome,
    /// Per-variant failures tolerated along the way.
    pub build_failures: Vec<BuildFailure>,
}

impl StrategyAttempt {
    /// An attempt whose preconditions were not met.
    pub fn skipped(strategy: Strategy, misses: Vec<DiscoveryMiss>) -> Self {
        Self {
            strategy,
            outcome: AttemptOutcome::Skipped(misses),
            build_failures: Vec::new(),
        }
    }

    fn finished(strategy: Strategy, outcome: AttemptOutcome) -> Self {
        Self {
            strategy,
            outcome,
            build_failures: Vec::new(),
        }
    }
}

/// Successful result of a run.
#[derive(Clone, Debug, serde::Serialize)]
pub struct PackagedBundle {
    /// The bundle at the output path.
    pub bundle: UnifiedBundle,
    /// Strategy that produced it; `None` if it was already present.
    pub produced_by: Option<Strategy>,
    /// SHA-256 of the bundle tree.
    pub checksum: String,
    /// Variants that failed but were tolerated.
    pub skipped_variants: Vec<PlatformVariant>,
}

/// Terminal state of a run.
#[derive(Clone, Debug)]
pub enum PipelineOutcome {
    /// A bundle is at the output path.
    Done(PackagedBundle),
    /// No strategy produced a bundle.
    Exhausted(DiagnosticReport),
}

impl PipelineOutcome {
    /// Process exit status for this outcome.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Done(_) => 0,
            Self::Exhausted(_) => 1,
        }
    }
}

/// Mutable bookkeeping for one run.
#[derive(Default)]
struct RunState {
    searches: SearchLog,
    attempts: Vec<StrategyAttempt>,
    header: Option<PathBuf>,
    lock: Option<OutputLock>,
}

/// Main packaging pipeline.
///
/// Runs strictly sequentially: the idempotency gate, then each
/// [`Strategy`] in [`Strategy::ORDER`] until one produces a well-formed
/// bundle. Component failures are recorded and never abort the run; only
/// infrastructure errors (the lock, clearing stale output) are returned as
/// `Err`.
///
/// # Examples
///
/// ```no_run
/// use kodegen_bundler_xcframework::bundler::{
///     Bundler, PipelineOutcome, SettingsBuilder, SystemRunner,
/// };
///
/// # async fn example() -> kodegen_bundler_xcframework::bundler::Result<()> {
/// let settings = SettingsBuilder::new("Sdk")
///     .submodule_root("vendor/Sdk")
///     .output_path("Frameworks/Sdk.xcframework")
///     .build_root("build/Sdk")
///     .build()?;
/// let runner = SystemRunner::new(settings.command_timeout());
///
/// match Bundler::new(settings, runner).bundle().await? {
///     PipelineOutcome::Done(packaged) => println!("{}", packaged.bundle.path.display()),
///     PipelineOutcome::Exhausted(report) => eprintln!("{report}"),
/// }
/// # Ok(())
/// # }
/// ```
pub struct Bundler<R> {
    settings: Settings,
    runner: R,
}

impl<R> fmt::Debug for Bundler<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bundler")
            .field("settings", &self.settings)
            .finish_non_exhaustive()
    }
}

impl<R: CommandRunner> Bundler<R> {
    /// Creates a pipeline that runs external tools through `runner`.
    pub fn new(settings: Settings, runner: R) -> Self {
        Self { settings, runner }
    }

    /// Returns a reference to the settings.
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Runs the pipeline to a terminal state.
    pub async fn bundle(&self) -> Result<PipelineOutcome> {
        let mut run = RunState::default();
        let mut state = PipelineState::CheckExisting;

        loop {
            log::debug!("Pipeline state: {:?}", state);
            state = match state {
                PipelineState::CheckExisting => self.check_existing(&mut run).await?,
                PipelineState::TryBuildFromSource => {
                    self.run_strategy(Strategy::BuildFromSource, state, &mut run)
                        .await?
                }
                PipelineState::TryWrapPrebuiltBundle => {
                    self.run_strategy(Strategy::WrapPrebuiltBundle, state, &mut run)
                        .await?
                }
                PipelineState::TryWrapRawLibrary => {
                    self.run_strategy(Strategy::WrapRawLibrary, state, &mut run)
                        .await?
                }
                PipelineState::Exhausted => {
                    let toolchain = resolve_program(self.settings.xcodebuild());
                    let report = diagnostics::report(
                        self.settings.submodule_root(),
                        &run.attempts,
                        run.header.as_deref(),
                        ReportContext {
                            searches: run.searches.records(),
                            header_name: self.settings.header_name(),
                            toolchain: toolchain.as_deref(),
                            listing_depth: self.settings.depths().listing,
                        },
                    );
                    return Ok(PipelineOutcome::Exhausted(report));
                }
                PipelineState::Done => return self.finish(run).await.map(PipelineOutcome::Done),
            };
        }
    }

    /// Runs one strategy, records it, and picks the next state.
    async fn run_strategy(
        &self,
        strategy: Strategy,
        state: PipelineState,
        run: &mut RunState,
    ) -> Result<PipelineState> {
        log::info!("Trying strategy: {}", strategy);
        let attempt = match strategy {
            Strategy::BuildFromSource => self.try_build_from_source(run).await?,
            Strategy::WrapPrebuiltBundle => self.try_wrap_prebuilt(run).await?,
            Strategy::WrapRawLibrary => self.try_wrap_raw_library(run).await?,
        };

        let succeeded = matches!(attempt.outcome, AttemptOutcome::Succeeded(_));
        if !succeeded {
            log::warn!("Strategy '{}' {}", strategy, attempt.outcome);
        }
        run.attempts.push(attempt);

        Ok(if succeeded {
            PipelineState::Done
        } else {
            state.next_on_failure()
        })
    }

    /// Idempotency gate. Takes the output lock on the first miss and checks
    /// again, so a run that finished while this one waited is honoured.
    async fn check_existing(&self, run: &mut RunState) -> Result<PipelineState> {
        let output = self.settings.output_path();

        if let Some(bundle) = UnifiedBundle::inspect(output) {
            log::info!(
                "✓ {} already present ({} slices), nothing to do",
                bundle.path.display(),
                bundle.slices.len()
            );
            return Ok(PipelineState::Done);
        }

        if run.lock.is_none() {
            run.lock = Some(OutputLock::acquire(output).await?);
            return Ok(PipelineState::CheckExisting);
        }

        if output.exists() {
            log::warn!(
                "Ignoring malformed output at {}; it will be replaced",
                output.display()
            );
        }
        Ok(PipelineState::for_strategy(Strategy::ORDER[0]))
    }

    async fn try_build_from_source(&self, run: &mut RunState) -> Result<StrategyAttempt> {
        let strategy = Strategy::BuildFromSource;
        let root = self.settings.submodule_root();

        let Some(project) = discover(
            CandidateKind::BuildableProject,
            root,
            self.settings.depths(),
            &mut run.searches,
        )?
        else {
            return Ok(StrategyAttempt::skipped(
                strategy,
                vec![DiscoveryMiss::new(CandidateKind::BuildableProject.to_string(), root)],
            ));
        };

        let builder = XcodeBuilder::new(&self.runner, &self.settings);
        let mut built = Vec::new();
        let mut build_failures = Vec::new();
        for variant in PlatformVariant::ALL {
            match builder
                .build(&project.path, variant, self.settings.build_root())
                .await
            {
                Ok(framework) => built.push(framework),
                Err(failure) => {
                    log::warn!("{}", failure);
                    build_failures.push(failure);
                }
            }
        }

        let outcome = if built.is_empty() {
            AttemptOutcome::NoVariantBuilt
        } else {
            self.clear_output().await?;
            let wrapper = XcframeworkWrapper::new(&self.runner, &self.settings);
            match wrapper.from_built_variants(&built).await {
                Ok(bundle) => AttemptOutcome::Succeeded(bundle),
                Err(failure) => AttemptOutcome::WrapFailed(failure),
            }
        };

        Ok(StrategyAttempt {
            strategy,
            outcome,
            build_failures,
        })
    }

    async fn try_wrap_prebuilt(&self, run: &mut RunState) -> Result<StrategyAttempt> {
        let strategy = Strategy::WrapPrebuiltBundle;
        let root = self.settings.submodule_root();

        let Some(framework) = discover(
            CandidateKind::PrebuiltBundle,
            root,
            self.settings.depths(),
            &mut run.searches,
        )?
        else {
            return Ok(StrategyAttempt::skipped(
                strategy,
                vec![DiscoveryMiss::new(CandidateKind::PrebuiltBundle.to_string(), root)],
            ));
        };

        self.clear_output().await?;
        let wrapper = XcframeworkWrapper::new(&self.runner, &self.settings);
        let outcome = match wrapper.from_single_bundle(&framework.path).await {
            Ok(bundle) => AttemptOutcome::Succeeded(bundle),
            Err(failure) => AttemptOutcome::WrapFailed(failure),
        };
        Ok(StrategyAttempt::finished(strategy, outcome))
    }

    async fn try_wrap_raw_library(&self, run: &mut RunState) -> Result<StrategyAttempt> {
        let strategy = Strategy::WrapRawLibrary;
        let root = self.settings.submodule_root();

        // Both preconditions are probed so the report can say whether the
        // header was ever found.
        let library = discover(
            CandidateKind::RawLibrary,
            root,
            self.settings.depths(),
            &mut run.searches,
        )?;
        let headers = HeaderResolver::new(
            self.settings.header_name(),
            self.settings.header_dirs(),
            self.settings.depths().header,
        )
        .resolve(root, &mut run.searches)?;
        run.header = headers.as_ref().map(|h| h.header().to_path_buf());

        let (library, headers) = match (library, headers) {
            (Some(library), Some(headers)) => (library, headers),
            (library, headers) => {
                let mut misses = Vec::new();
                if library.is_none() {
                    misses.push(DiscoveryMiss::new(CandidateKind::RawLibrary.to_string(), root));
                }
                if headers.is_none() {
                    misses.push(DiscoveryMiss::new(
                        format!("public header {}", self.settings.header_name()),
                        root,
                    ));
                }
                return Ok(StrategyAttempt::skipped(strategy, misses));
            }
        };

        self.clear_output().await?;
        let wrapper = XcframeworkWrapper::new(&self.runner, &self.settings);
        let outcome = match wrapper
            .from_library_and_headers(&library.path, &headers)
            .await
        {
            Ok(bundle) => AttemptOutcome::Succeeded(bundle),
            Err(failure) => AttemptOutcome::WrapFailed(failure),
        };
        Ok(StrategyAttempt::finished(strategy, outcome))
    }

    /// Removes stale output before a strategy writes to the output path.
    async fn clear_output(&self) -> Result<()> {
        let output = self.settings.output_path();
        if output.exists() || output.is_symlink() {
            log::info!("Removing stale output at {}", output.display());
        }
        fs::remove_path(output).await
    }

    async fn finish(&self, run: RunState) -> Result<PackagedBundle> {
        let produced = run.attempts.iter().find_map(|attempt| match &attempt.outcome {
            AttemptOutcome::Succeeded(bundle) => Some((attempt, bundle.clone())),
            _ => None,
        });

        let (bundle, produced_by, skipped_variants) = match produced {
            Some((attempt, bundle)) => (
                bundle,
                Some(attempt.strategy),
                attempt.build_failures.iter().map(|f| f.variant).collect(),
            ),
            None => {
                let output = self.settings.output_path();
                let bundle = UnifiedBundle::inspect(output).ok_or_else(|| {
                    crate::bundler::Error::GenericError(format!(
                        "{} disappeared after the idempotency check",
                        output.display()
                    ))
                })?;
                (bundle, None, Vec::new())
            }
        };

        let checksum = calculate_sha256(&bundle.path).await?;
        match produced_by {
            Some(strategy) => log::info!(
                "✓ Created {} via {} ({} slices)",
                bundle.path.display(),
                strategy,
                bundle.slices.len()
            ),
            None => log::debug!("Existing bundle checksum: {}", checksum),
        }

        Ok(PackagedBundle {
            bundle,
            produced_by,
            checksum,
            skipped_variants,
        })
    }
}
