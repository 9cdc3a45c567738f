use super::artifact::BundleArtifact;
use crate::diagnostics::DiagnosticHandler;
use crate::errors::BundleError;
use crate::fs::FileSystem;
use crate::module_id::ModuleId;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{debug, info};

/// Writes `<id>-bundle.js` next to each module's `<id>.html`
pub struct BundleGenerator {
    modules_dir: PathBuf,
    file_system: Arc<dyn FileSystem>,
    diagnostics: Arc<dyn DiagnosticHandler>,
    timestamp: Option<u64>,
}

impl BundleGenerator {
    pub fn new(
        modules_dir: impl Into<PathBuf>,
        file_system: Arc<dyn FileSystem>,
        diagnostics: Arc<dyn DiagnosticHandler>,
    ) -> Self {
        Self {
            modules_dir: modules_dir.into(),
            file_system,
            diagnostics,
            timestamp: None,
        }
    }

    /// Stamp every bundle with a fixed generation time instead of the clock
    pub fn with_timestamp(mut self, timestamp: u64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    pub fn modules_dir(&self) -> &Path {
        &self.modules_dir
    }

    pub fn html_path(&self, module: &ModuleId) -> PathBuf {
        module
            .module_dir(&self.modules_dir)
            .join(module.html_file_name())
    }

    pub fn bundle_path(&self, module: &ModuleId) -> PathBuf {
        module
            .module_dir(&self.modules_dir)
            .join(module.bundle_file_name())
    }

    /// Generate one bundle, returning the path written
    pub fn try_build_module(&self, module: &ModuleId) -> Result<PathBuf, BundleError> {
        let html_path = self.html_path(module);
        if !self.file_system.exists(&html_path) {
            return Err(BundleError::SourceNotFound { path: html_path });
        }

        debug!("Reading {}", html_path.display());
        let html = self
            .file_system
            .read_file(&html_path)
            .map_err(|source| BundleError::Read {
                path: html_path.clone(),
                source,
            })?;

        let script = BundleArtifact::new(module.clone(), html).render(self.generated_at());

        let bundle_path = self.bundle_path(module);
        self.file_system
            .write_file(&bundle_path, &script)
            .map_err(|source| BundleError::Write {
                path: bundle_path.clone(),
                source,
            })?;

        info!("Bundle created: {}", bundle_path.display());
        Ok(bundle_path)
    }

    /// Generate one bundle; failures are reported as diagnostics, never raised
    pub fn build_module(&self, module: &ModuleId) -> bool {
        self.build_outcome(module).result.is_ok()
    }

    /// Attempt every module in order, regardless of earlier failures
    pub fn build_all(&self, modules: &[ModuleId]) -> BuildReport {
        info!("Building {} module bundle(s)...", modules.len());
        let outcomes = modules.iter().map(|m| self.build_outcome(m)).collect();
        BuildReport { outcomes }
    }

    fn build_outcome(&self, module: &ModuleId) -> BuildOutcome {
        let result = self.try_build_module(module);
        if let Err(ref err) = result {
            self.diagnostics.error(Some(module), &err.to_string());
        }
        BuildOutcome {
            module: module.clone(),
            result,
        }
    }

    /// Compare an existing bundle with the current HTML source
    pub fn check_module(&self, module: &ModuleId) -> Freshness {
        let html_path = self.html_path(module);
        let bundle_path = self.bundle_path(module);

        if !self.file_system.exists(&html_path) {
            return Freshness::MissingSource;
        }
        if !self.file_system.exists(&bundle_path) {
            return Freshness::MissingBundle;
        }

        let html = match self.file_system.read_file(&html_path) {
            Ok(html) => html,
            Err(e) => return Freshness::Unverifiable(e.to_string()),
        };
        let artifact = match self
            .file_system
            .read_file(&bundle_path)
            .map_err(|e| e.to_string())
            .and_then(|script| BundleArtifact::parse(&script).map_err(|e| e.to_string()))
        {
            Ok(artifact) => artifact,
            Err(reason) => return Freshness::Unverifiable(reason),
        };

        match artifact.matches_source(&html) {
            Some(true) => Freshness::Fresh,
            Some(false) => Freshness::Stale,
            None => Freshness::Unverifiable("bundle carries no source hash".to_string()),
        }
    }

    pub fn check_all(&self, modules: &[ModuleId]) -> Vec<(ModuleId, Freshness)> {
        modules
            .iter()
            .map(|m| {
                let freshness = self.check_module(m);
                if !freshness.is_fresh() {
                    self.diagnostics
                        .warning(Some(m), &format!("bundle is {}", freshness));
                }
                (m.clone(), freshness)
            })
            .collect()
    }

    fn generated_at(&self) -> u64 {
        self.timestamp.unwrap_or_else(|| {
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or(0)
        })
    }
}

/// Result of attempting one module
#[derive(Debug)]
pub struct BuildOutcome {
    pub module: ModuleId,
    pub result: Result<PathBuf, BundleError>,
}

impl fmt::Display for BuildOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.result {
            Ok(path) => write!(f, "✅ {}: bundle created at {}", self.module, path.display()),
            Err(err) => write!(f, "❌ {}: {}", self.module, err),
        }
    }
}

/// Aggregate of a batch build
#[derive(Debug, Default)]
pub struct BuildReport {
    pub outcomes: Vec<BuildOutcome>,
}

impl BuildReport {
    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.result.is_ok()).count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes.len() - self.succeeded()
    }

    /// Process exit status: 0 when every module built, 1 otherwise
    pub fn exit_code(&self) -> i32 {
        if self.failed() > 0 {
            1
        } else {
            0
        }
    }

    pub fn summary(&self) -> String {
        format!(
            "Build complete: {} succeeded, {} failed",
            self.succeeded(),
            self.failed()
        )
    }
}

/// State of a bundle relative to its HTML source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Freshness {
    Fresh,
    Stale,
    MissingSource,
    MissingBundle,
    Unverifiable(String),
}

impl Freshness {
    pub fn is_fresh(&self) -> bool {
        matches!(self, Freshness::Fresh)
    }
}

impl fmt::Display for Freshness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Freshness::Fresh => f.write_str("up to date"),
            Freshness::Stale => f.write_str("stale"),
            Freshness::MissingSource => f.write_str("missing its HTML source"),
            Freshness::MissingBundle => f.write_str("not generated"),
            Freshness::Unverifiable(reason) => write!(f, "unverifiable ({})", reason),
        }
    }
}
