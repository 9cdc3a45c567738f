pub mod bundle;
pub mod config;
pub mod di;
pub mod diagnostics;
pub mod errors;
pub mod fs;
pub mod module_id;
pub mod registry;
pub mod resolver;

pub use url::Url;

pub use bundle::{BuildReport, BundleArtifact, BundleGenerator, Freshness};
pub use config::{CliOverrides, ModkitConfig};
pub use di::Container;
pub use diagnostics::{
    CollectingDiagnosticHandler, Diagnostic, DiagnosticHandler, DiagnosticLevel,
};
pub use errors::{
    BundleError, ConfigError, ModuleFetchError, ModuleInitializationError, ModuleNotFoundError,
    RegistryError, ResolveError,
};
pub use module_id::ModuleId;
pub use registry::{ModuleRegistry, ModuleSource, RegistryEntry};
pub use resolver::{Environment, LoadedModule, ModuleController, ModuleResolver};
