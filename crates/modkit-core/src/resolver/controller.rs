//! Module controllers and their deferred initialization

use crate::errors::ModuleInitializationError;
use crate::module_id::ModuleId;
use rustc_hash::FxHashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

pub type InitFuture<'a> =
    Pin<Box<dyn Future<Output = Result<(), ModuleInitializationError>> + Send + 'a>>;

/// Behaviour attached to a module once its markup is on the page
pub trait ModuleController: Send + Sync {
    fn init(&self) -> InitFuture<'_>;
}

/// Controllers registered by module id at startup
#[derive(Default)]
pub struct ControllerRegistry {
    controllers: RwLock<FxHashMap<ModuleId, Arc<dyn ModuleController>>>,
}

impl ControllerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a controller, returning the one it replaces
    pub fn register(
        &self,
        module: ModuleId,
        controller: Arc<dyn ModuleController>,
    ) -> Option<Arc<dyn ModuleController>> {
        self.controllers
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(module, controller)
    }

    pub fn get(&self, module: &ModuleId) -> Option<Arc<dyn ModuleController>> {
        self.controllers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(module)
            .cloned()
    }

    pub fn contains(&self, module: &ModuleId) -> bool {
        self.controllers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(module)
    }
}

/// How a scheduled initialization ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InitOutcome {
    Initialized,
    Failed(ModuleInitializationError),
}

impl InitOutcome {
    pub fn is_initialized(&self) -> bool {
        matches!(self, InitOutcome::Initialized)
    }
}

/// Handle to a scheduled initialization.
/// Dropping it does not cancel the initialization.
#[derive(Debug)]
pub struct InitializationHandle {
    module: ModuleId,
    task: JoinHandle<InitOutcome>,
}

impl InitializationHandle {
    pub(crate) fn new(module: ModuleId, task: JoinHandle<InitOutcome>) -> Self {
        Self { module, task }
    }

    pub fn module(&self) -> &ModuleId {
        &self.module
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    pub async fn wait(self) -> InitOutcome {
        match self.task.await {
            Ok(outcome) => outcome,
            Err(e) => InitOutcome::Failed(ModuleInitializationError::new(
                self.module,
                format!("initialization task aborted: {}", e),
            )),
        }
    }
}

/// Wait `settle_delay`, then run the controller's `init()`.
///
/// Errors and panics from the controller are logged and returned as
/// [`InitOutcome::Failed`]; they never propagate further.
pub(crate) async fn run_initialization(
    module: ModuleId,
    controller: Arc<dyn ModuleController>,
    settle_delay: Duration,
) -> InitOutcome {
    tokio::time::sleep(settle_delay).await;
    debug!("Initializing module {}", module);

    let init = tokio::spawn(async move { controller.init().await });
    match init.await {
        Ok(Ok(())) => {
            info!("Module {} initialized successfully", module);
            InitOutcome::Initialized
        }
        Ok(Err(err)) => {
            error!("Error initializing module {}: {}", module, err.message);
            InitOutcome::Failed(err)
        }
        Err(join_err) => {
            let message = if join_err.is_panic() {
                "controller panicked during init".to_string()
            } else {
                join_err.to_string()
            };
            error!("Error initializing module {}: {}", module, message);
            InitOutcome::Failed(ModuleInitializationError::new(module, message))
        }
    }
}
