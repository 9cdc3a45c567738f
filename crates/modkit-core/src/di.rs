use crate::bundle::BundleGenerator;
use crate::config::ModkitConfig;
use crate::diagnostics::{ConsoleDiagnosticHandler, DiagnosticHandler};
use crate::fs::{FileSystem, RealFileSystem};
use crate::module_id::ModuleId;
use crate::registry::ModuleRegistry;
use crate::resolver::{Environment, ResolverBuilder, TransportError};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use url::Url;

/// Shared configuration, diagnostics and file system, plus factories for the
/// generator, registry and resolver built on them
pub struct Container {
    config: Arc<ModkitConfig>,
    diagnostic_handler: Arc<dyn DiagnosticHandler>,
    file_system: Arc<dyn FileSystem>,
}

impl Container {
    /// Console diagnostics and the real file system
    pub fn new(config: ModkitConfig) -> Self {
        let config = Arc::new(config);

        let diagnostic_handler = Arc::new(ConsoleDiagnosticHandler::new(config.bundler.pretty));

        let file_system = Arc::new(RealFileSystem::new());

        Container {
            config,
            diagnostic_handler,
            file_system,
        }
    }

    pub fn with_dependencies(
        config: ModkitConfig,
        diagnostic_handler: Arc<dyn DiagnosticHandler>,
        file_system: Arc<dyn FileSystem>,
    ) -> Self {
        Container {
            config: Arc::new(config),
            diagnostic_handler,
            file_system,
        }
    }

    pub fn config(&self) -> &Arc<ModkitConfig> {
        &self.config
    }

    pub fn diagnostic_handler(&self) -> &Arc<dyn DiagnosticHandler> {
        &self.diagnostic_handler
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.file_system
    }

    pub fn modules_dir(&self) -> PathBuf {
        PathBuf::from(&self.config.bundler.modules_dir)
    }

    /// Configured module list
    pub fn modules(&self) -> Vec<ModuleId> {
        self.config.bundler.module_ids()
    }

    pub fn bundle_generator(&self) -> BundleGenerator {
        BundleGenerator::new(
            self.modules_dir(),
            self.file_system.clone(),
            self.diagnostic_handler.clone(),
        )
    }

    /// Registry holding every configured module that has a bundle on disk
    pub fn load_registry(&self) -> Arc<ModuleRegistry> {
        let registry = Arc::new(ModuleRegistry::new());
        let loaded = registry.load_bundles(
            self.file_system.as_ref(),
            &self.modules_dir(),
            &self.modules(),
        );
        info!("Loaded {} module bundle(s)", loaded);
        registry
    }

    /// Resolver builder for `origin`, with bundles preloaded when the origin
    /// resolves locally
    pub fn resolver_builder(&self, origin: Url) -> Result<ResolverBuilder, TransportError> {
        let builder = ResolverBuilder::from_options(origin.clone(), &self.config.resolver)?;
        let environment =
            crate::resolver::resolve_environment(&origin, self.config.resolver.development);

        Ok(match environment {
            Environment::Local => builder.registry(self.load_registry()),
            Environment::Networked => builder,
        })
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostic_handler.has_errors()
    }

    pub fn error_count(&self) -> usize {
        self.diagnostic_handler.error_count()
    }

    pub fn warning_count(&self) -> usize {
        self.diagnostic_handler.warning_count()
    }
}
