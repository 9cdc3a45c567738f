use crate::errors::ConfigError;
use crate::module_id::ModuleId;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Modules bundled when nothing else is configured
pub const DEFAULT_MODULES: &[&str] = &["pricing"];

/// Delay between inserting module markup and running its controller
pub const DEFAULT_SETTLE_DELAY_MS: u64 = 100;

/// Options for the offline bundle generator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundlerOptions {
    /// Directory containing one sub-directory per module (default: modules)
    #[serde(default = "default_modules_dir")]
    pub modules_dir: String,

    /// Module identifiers to bundle
    #[serde(default = "default_modules")]
    pub modules: Vec<String>,

    /// Colorize diagnostics (default: true)
    #[serde(default = "default_true")]
    pub pretty: bool,
}

fn default_modules_dir() -> String {
    "modules".to_string()
}

fn default_modules() -> Vec<String> {
    DEFAULT_MODULES.iter().map(|m| m.to_string()).collect()
}

fn default_true() -> bool {
    true
}

impl Default for BundlerOptions {
    fn default() -> Self {
        Self {
            modules_dir: default_modules_dir(),
            modules: default_modules(),
            pretty: true,
        }
    }
}

impl BundlerOptions {
    pub fn module_ids(&self) -> Vec<ModuleId> {
        self.modules.iter().map(|m| ModuleId::new(m.as_str())).collect()
    }
}

/// Options for the runtime module resolver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolverOptions {
    /// Force local (registry) resolution regardless of origin scheme
    #[serde(default)]
    pub development: bool,

    /// Delay before module controllers are initialized (default: 100)
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,

    /// Optional timeout applied by the HTTP client
    #[serde(default)]
    pub request_timeout_ms: Option<u64>,
}

fn default_settle_delay_ms() -> u64 {
    DEFAULT_SETTLE_DELAY_MS
}

impl Default for ResolverOptions {
    fn default() -> Self {
        Self {
            development: false,
            settle_delay_ms: DEFAULT_SETTLE_DELAY_MS,
            request_timeout_ms: None,
        }
    }
}

impl ResolverOptions {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }
}

/// Main configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModkitConfig {
    #[serde(default)]
    pub bundler: BundlerOptions,

    #[serde(default)]
    pub resolver: ResolverOptions,
}

/// Values supplied on the command line that take precedence over the file
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub modules_dir: Option<String>,
    pub modules: Option<Vec<String>>,
    pub pretty: Option<bool>,
    pub development: Option<bool>,
    pub settle_delay_ms: Option<u64>,
}

impl ModkitConfig {
    /// Load configuration from a JSON or YAML file, chosen by extension
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );

        let config = if is_yaml {
            serde_yaml::from_str(&content)?
        } else {
            serde_json::from_str(&content)?
        };
        Ok(config)
    }

    /// Create a default configuration and write it to a file
    pub fn init_file(path: &Path) -> Result<(), ConfigError> {
        let json = serde_json::to_string_pretty(&ModkitConfig::default())?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Merge CLI overrides into this configuration
    pub fn merge(&mut self, overrides: &CliOverrides) {
        if let Some(ref dir) = overrides.modules_dir {
            self.bundler.modules_dir = dir.clone();
        }
        if let Some(ref modules) = overrides.modules {
            self.bundler.modules = modules.clone();
        }
        if let Some(pretty) = overrides.pretty {
            self.bundler.pretty = pretty;
        }
        if let Some(development) = overrides.development {
            self.resolver.development = development;
        }
        if let Some(delay) = overrides.settle_delay_ms {
            self.resolver.settle_delay_ms = delay;
        }
    }
}
