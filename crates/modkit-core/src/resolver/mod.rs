//! Runtime resolution of module markup
//!
//! A [`ModuleResolver`] returns a module's HTML using one of two strategies,
//! picked once from the page origin: pages opened from `file://` read the
//! registry populated by generated bundles, pages served over HTTP fetch
//! `modules/<id>/<id>.html`. Results are cached per module for the lifetime
//! of the resolver.
//!
//! # Example
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use modkit_core::registry::{ModuleRegistry, RegistryEntry};
//! use modkit_core::resolver::ModuleResolver;
//! use modkit_core::Url;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = Arc::new(ModuleRegistry::new());
//! registry.register("pricing".into(), RegistryEntry::new("<div>prices</div>"))?;
//!
//! let resolver = ModuleResolver::builder(Url::parse("file:///app/index.html")?)
//!     .registry(registry)
//!     .build();
//! let html = resolver.get_module_markup("pricing").await?;
//! assert_eq!(html, "<div>prices</div>");
//! # Ok(())
//! # }
//! ```

mod cache;
mod controller;
mod environment;
mod fetch;

pub use cache::{CacheKey, ContentKind, ResolverCache};
pub use controller::{
    ControllerRegistry, InitFuture, InitOutcome, InitializationHandle, ModuleController,
};
pub use environment::{resolve_environment, Environment, NETWORK_SCHEMES};
pub use fetch::{FetchResponse, HttpFetcher, MarkupFetcher, TransportError};

use crate::config::{ResolverOptions, DEFAULT_SETTLE_DELAY_MS};
use crate::errors::{ModuleFetchError, ModuleNotFoundError, ResolveError};
use crate::module_id::ModuleId;
use crate::registry::{ModuleRegistry, ModuleSource};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};
use url::Url;

/// Markup returned by [`ModuleResolver::load_module`]
#[derive(Debug)]
pub struct LoadedModule {
    pub module: ModuleId,
    pub markup: String,
    /// Present when a controller was registered for the module
    pub initialization: Option<InitializationHandle>,
}

impl LoadedModule {
    pub fn into_markup(self) -> String {
        self.markup
    }
}

pub struct ModuleResolver<F = HttpFetcher> {
    origin: Url,
    environment: Environment,
    registry: Arc<dyn ModuleSource>,
    fetcher: F,
    cache: ResolverCache,
    controllers: ControllerRegistry,
    settle_delay: Duration,
}

impl ModuleResolver<HttpFetcher> {
    pub fn builder(origin: Url) -> ResolverBuilder<HttpFetcher> {
        ResolverBuilder::new(origin)
    }
}

impl<F: MarkupFetcher> ModuleResolver<F> {
    pub fn environment(&self) -> Environment {
        self.environment
    }

    pub fn origin(&self) -> &Url {
        &self.origin
    }

    pub fn cache(&self) -> &ResolverCache {
        &self.cache
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn settle_delay(&self) -> Duration {
        self.settle_delay
    }

    pub fn register_controller(
        &self,
        module: impl Into<ModuleId>,
        controller: Arc<dyn ModuleController>,
    ) {
        let module = module.into();
        if self.controllers.register(module.clone(), controller).is_some() {
            debug!("Replaced controller for module {}", module);
        }
    }

    /// URL fetched for `module` in networked mode
    pub fn resource_url(&self, module: &ModuleId) -> Result<Url, ModuleFetchError> {
        self.origin
            .join(&module.resource_path())
            .map_err(|e| ModuleFetchError::Transport {
                module: module.clone(),
                url: module.resource_path(),
                message: format!("invalid resource path: {}", e),
            })
    }

    /// Return the module's HTML, from cache when already resolved
    pub async fn get_module_markup(
        &self,
        module: impl Into<ModuleId>,
    ) -> Result<String, ResolveError> {
        let module = module.into();
        let key = CacheKey::html(&module);

        if let Some(cached) = self.cache.get(&key) {
            debug!("Cache hit for module {}", module);
            return Ok(cached);
        }

        let html = match self.environment {
            Environment::Local => self.lookup_local(&module)?,
            Environment::Networked => self.fetch_remote(&module).await?,
        };

        self.cache.insert(key, html.clone());
        Ok(html)
    }

    fn lookup_local(&self, module: &ModuleId) -> Result<String, ModuleNotFoundError> {
        self.registry
            .lookup(module)
            .map(|entry| entry.html)
            .ok_or_else(|| ModuleNotFoundError {
                module: module.clone(),
            })
    }

    async fn fetch_remote(&self, module: &ModuleId) -> Result<String, ModuleFetchError> {
        let url = self.resource_url(module)?;
        debug!("Fetching {}", url);

        let response = self
            .fetcher
            .fetch(&url)
            .await
            .map_err(|e| ModuleFetchError::Transport {
                module: module.clone(),
                url: url.to_string(),
                message: e.to_string(),
            })?;

        if !response.is_success() {
            return Err(ModuleFetchError::Status {
                module: module.clone(),
                url: url.to_string(),
                status: response.status,
            });
        }

        Ok(response.body)
    }

    /// Resolve the markup, then schedule the module's controller.
    ///
    /// Resolution errors are returned; initialization runs decoupled after
    /// the settling delay and its failures never reach the caller.
    pub async fn load_module(
        &self,
        module: impl Into<ModuleId>,
    ) -> Result<LoadedModule, ResolveError> {
        let module = module.into();

        let markup = match self.get_module_markup(module.clone()).await {
            Ok(markup) => markup,
            Err(err) => {
                error!("Module loading error: {}", err);
                return Err(err);
            }
        };

        let initialization = self.schedule_initialization(&module);
        Ok(LoadedModule {
            module,
            markup,
            initialization,
        })
    }

    /// Spawn the deferred `init()` of the module's controller, if it has one.
    /// Must be called from within a Tokio runtime.
    pub fn schedule_initialization(&self, module: &ModuleId) -> Option<InitializationHandle> {
        let Some(controller) = self.controllers.get(module) else {
            debug!("No controller registered for module {}", module);
            return None;
        };

        let task = tokio::spawn(controller::run_initialization(
            module.clone(),
            controller,
            self.settle_delay,
        ));
        Some(InitializationHandle::new(module.clone(), task))
    }
}

/// Builder for [`ModuleResolver`]
pub struct ResolverBuilder<F = HttpFetcher> {
    origin: Url,
    development: bool,
    registry: Option<Arc<dyn ModuleSource>>,
    fetcher: F,
    settle_delay: Duration,
}

impl ResolverBuilder<HttpFetcher> {
    pub fn new(origin: Url) -> Self {
        Self {
            origin,
            development: false,
            registry: None,
            fetcher: HttpFetcher::new(),
            settle_delay: Duration::from_millis(DEFAULT_SETTLE_DELAY_MS),
        }
    }

    pub fn from_options(origin: Url, options: &ResolverOptions) -> Result<Self, TransportError> {
        Ok(Self {
            origin,
            development: options.development,
            registry: None,
            fetcher: HttpFetcher::with_timeout(options.request_timeout())?,
            settle_delay: options.settle_delay(),
        })
    }
}

impl<F: MarkupFetcher> ResolverBuilder<F> {
    /// Treat the page as a development context (forces local resolution)
    pub fn development(mut self, development: bool) -> Self {
        self.development = development;
        self
    }

    pub fn registry(mut self, registry: Arc<dyn ModuleSource>) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn settle_delay(mut self, settle_delay: Duration) -> Self {
        self.settle_delay = settle_delay;
        self
    }

    pub fn fetcher<G: MarkupFetcher>(self, fetcher: G) -> ResolverBuilder<G> {
        ResolverBuilder {
            origin: self.origin,
            development: self.development,
            registry: self.registry,
            fetcher,
            settle_delay: self.settle_delay,
        }
    }

    pub fn build(self) -> ModuleResolver<F> {
        let environment = resolve_environment(&self.origin, self.development);
        debug!("Resolving modules for {} in {:?} mode", self.origin, environment);

        ModuleResolver {
            origin: self.origin,
            environment,
            registry: self
                .registry
                .unwrap_or_else(|| Arc::new(ModuleRegistry::new())),
            fetcher: self.fetcher,
            cache: ResolverCache::new(),
            controllers: ControllerRegistry::new(),
            settle_delay: self.settle_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_url_is_relative_to_page_base() {
        let resolver =
            ModuleResolver::builder(Url::parse("https://example.com/app/index.html").unwrap())
                .build();

        assert_eq!(resolver.environment(), Environment::Networked);
        assert_eq!(
            resolver
                .resource_url(&ModuleId::new("pricing"))
                .unwrap()
                .as_str(),
            "https://example.com/app/modules/pricing/pricing.html"
        );
    }

    #[test]
    fn test_builder_defaults() {
        let resolver = ModuleResolver::builder(Url::parse("file:///app/index.html").unwrap())
            .settle_delay(Duration::from_millis(5))
            .build();

        assert_eq!(resolver.environment(), Environment::Local);
        assert_eq!(resolver.settle_delay(), Duration::from_millis(5));
        assert!(resolver.cache().is_empty());
    }

    #[test]
    fn test_from_options() {
        let options = ResolverOptions {
            development: true,
            settle_delay_ms: 20,
            request_timeout_ms: Some(1_000),
        };
        let resolver =
            ResolverBuilder::from_options(Url::parse("https://example.com/").unwrap(), &options)
                .unwrap()
                .build();

        assert_eq!(resolver.environment(), Environment::Local);
        assert_eq!(resolver.settle_delay(), Duration::from_millis(20));
    }
}
