use crate::module_id::ModuleId;
use std::path::PathBuf;
use thiserror::Error;

/// Local-mode lookup miss: no bundle registered the module
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Module {module} not found. Make sure the module bundle is generated and loaded.")]
pub struct ModuleNotFoundError {
    pub module: ModuleId,
}

/// Networked-mode retrieval failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ModuleFetchError {
    #[error("Failed to load module {module}: HTTP error! status: {status}")]
    Status {
        module: ModuleId,
        url: String,
        status: u16,
    },

    #[error("Failed to load module {module} from {url}: {message}")]
    Transport {
        module: ModuleId,
        url: String,
        message: String,
    },
}

impl ModuleFetchError {
    pub fn module(&self) -> &ModuleId {
        match self {
            ModuleFetchError::Status { module, .. } | ModuleFetchError::Transport { module, .. } => {
                module
            }
        }
    }

    /// HTTP status, if the server answered
    pub fn status(&self) -> Option<u16> {
        match self {
            ModuleFetchError::Status { status, .. } => Some(*status),
            ModuleFetchError::Transport { .. } => None,
        }
    }
}

/// Errors surfaced by markup resolution
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolveError {
    #[error(transparent)]
    NotFound(#[from] ModuleNotFoundError),

    #[error(transparent)]
    Fetch(#[from] ModuleFetchError),
}

impl ResolveError {
    pub fn module(&self) -> &ModuleId {
        match self {
            ResolveError::NotFound(err) => &err.module,
            ResolveError::Fetch(err) => err.module(),
        }
    }
}

/// Raised by a module controller's `init()`; never fails a module load
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Error initializing module {module}: {message}")]
pub struct ModuleInitializationError {
    pub module: ModuleId,
    pub message: String,
}

impl ModuleInitializationError {
    pub fn new(module: impl Into<ModuleId>, message: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum BundleError {
    #[error("HTML file not found: {}", .path.display())]
    SourceNotFound { path: PathBuf },

    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed bundle: {0}")]
    Malformed(String),
}

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("Module {module} is already registered with different markup")]
    Conflict { module: ModuleId },

    #[error(transparent)]
    Bundle(#[from] BundleError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid JSON configuration: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid YAML configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}
