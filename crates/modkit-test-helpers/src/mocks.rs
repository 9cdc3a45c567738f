//! Mock implementations for testing

use modkit_core::registry::{ModuleRegistry, ModuleSource, RegistryEntry};
use modkit_core::resolver::{
    FetchResponse, InitFuture, MarkupFetcher, ModuleController, TransportError,
};
use modkit_core::{ModuleId, ModuleInitializationError, Url};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// A fetcher answering from a fixed table of URLs.
/// Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct StubFetcher {
    responses: Mutex<HashMap<String, Result<FetchResponse, TransportError>>>,
    requests: Mutex<Vec<String>>,
}

impl StubFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_response(self, url: &str, response: FetchResponse) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Ok(response));
        self
    }

    pub fn with_transport_error(self, url: &str, message: &str) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert(url.to_string(), Err(TransportError(message.to_string())));
        self
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requested_urls(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

impl MarkupFetcher for StubFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchResponse, TransportError> {
        self.requests.lock().unwrap().push(url.to_string());
        self.responses
            .lock()
            .unwrap()
            .get(url.as_str())
            .cloned()
            .unwrap_or_else(|| Ok(FetchResponse::status(404)))
    }
}

/// Registry wrapper counting lookups, to observe cache hits
#[derive(Debug, Default)]
pub struct CountingRegistry {
    inner: ModuleRegistry,
    reads: AtomicUsize,
}

impl CountingRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_module(module: &str, html: &str) -> Arc<Self> {
        let registry = Self::default();
        registry
            .inner
            .register(ModuleId::new(module), RegistryEntry::new(html))
            .unwrap();
        Arc::new(registry)
    }

    pub fn inner(&self) -> &ModuleRegistry {
        &self.inner
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

impl ModuleSource for CountingRegistry {
    fn lookup(&self, module: &ModuleId) -> Option<RegistryEntry> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.lookup(module)
    }
}

/// Controller counting successful `init()` calls
#[derive(Debug, Default)]
pub struct RecordingController {
    calls: AtomicUsize,
}

impl RecordingController {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ModuleController for RecordingController {
    fn init(&self) -> InitFuture<'_> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        })
    }
}

/// Controller whose `init()` fails immediately
#[derive(Debug)]
pub struct FailingController {
    module: ModuleId,
    message: String,
}

impl FailingController {
    pub fn new(module: &str, message: &str) -> Arc<Self> {
        Arc::new(Self {
            module: ModuleId::new(module),
            message: message.to_string(),
        })
    }
}

impl ModuleController for FailingController {
    fn init(&self) -> InitFuture<'_> {
        Box::pin(std::future::ready(Err(ModuleInitializationError::new(
            self.module.clone(),
            self.message.clone(),
        ))))
    }
}

/// Controller that panics before returning a future
#[derive(Debug, Default)]
pub struct PanickingController;

impl ModuleController for PanickingController {
    fn init(&self) -> InitFuture<'_> {
        panic!("controller blew up")
    }
}
