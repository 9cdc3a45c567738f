//! In-memory store of module markup populated from bundles
//!
//! Under a `file://` origin the resolver reads markup from here instead of
//! fetching it. Entries are write-once: loading the same bundle twice is a
//! no-op, but a different markup under an existing key is refused.

use crate::bundle::BundleArtifact;
use crate::errors::{BundleError, RegistryError};
use crate::fs::FileSystem;
use crate::module_id::ModuleId;
use indexmap::IndexMap;
use std::path::Path;
use std::sync::{PoisonError, RwLock};
use tracing::{debug, warn};

/// Markup registered for one module
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryEntry {
    pub html: String,
}

impl RegistryEntry {
    pub fn new(html: impl Into<String>) -> Self {
        Self { html: html.into() }
    }
}

/// Read side of a registry, as consumed by the resolver
pub trait ModuleSource: Send + Sync {
    fn lookup(&self, module: &ModuleId) -> Option<RegistryEntry>;
}

#[derive(Debug, Default)]
pub struct ModuleRegistry {
    entries: RwLock<IndexMap<ModuleId, RegistryEntry>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, module: ModuleId, entry: RegistryEntry) -> Result<(), RegistryError> {
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        match entries.get(&module) {
            Some(existing) if *existing == entry => Ok(()),
            Some(_) => Err(RegistryError::Conflict { module }),
            None => {
                debug!("Registered module {}", module);
                entries.insert(module, entry);
                Ok(())
            }
        }
    }

    /// Register the entry a bundle script would register when executed
    pub fn load_bundle(&self, script: &str) -> Result<ModuleId, RegistryError> {
        let artifact = BundleArtifact::parse(script)?;
        let module = artifact.module.clone();
        self.register(artifact.module, RegistryEntry::new(artifact.html))?;
        Ok(module)
    }

    pub fn load_bundle_file(
        &self,
        file_system: &dyn FileSystem,
        path: &Path,
    ) -> Result<ModuleId, RegistryError> {
        let script = file_system
            .read_file(path)
            .map_err(|source| BundleError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        self.load_bundle(&script)
    }

    /// Load `<modules_dir>/<id>/<id>-bundle.js` for each module.
    ///
    /// Modules without a bundle are skipped so that resolution reports them
    /// as not found; malformed or conflicting bundles are logged and skipped.
    pub fn load_bundles(
        &self,
        file_system: &dyn FileSystem,
        modules_dir: &Path,
        modules: &[ModuleId],
    ) -> usize {
        let mut loaded = 0;
        for module in modules {
            let path = module
                .module_dir(modules_dir)
                .join(module.bundle_file_name());
            if !file_system.exists(&path) {
                debug!("No bundle for module {} at {}", module, path.display());
                continue;
            }
            match self.load_bundle_file(file_system, &path) {
                Ok(_) => loaded += 1,
                Err(e) => warn!("Skipping bundle {}: {}", path.display(), e),
            }
        }
        loaded
    }

    pub fn get(&self, module: &ModuleId) -> Option<RegistryEntry> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(module)
            .cloned()
    }

    pub fn contains(&self, module: &ModuleId) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(module)
    }

    /// Registered ids in registration order
    pub fn module_ids(&self) -> Vec<ModuleId> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ModuleSource for ModuleRegistry {
    fn lookup(&self, module: &ModuleId) -> Option<RegistryEntry> {
        self.get(module)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::MockFileSystem;

    #[test]
    fn test_register_and_lookup() {
        let registry = ModuleRegistry::new();
        registry
            .register(ModuleId::new("pricing"), RegistryEntry::new("<div></div>"))
            .unwrap();

        assert!(registry.contains(&ModuleId::new("pricing")));
        assert_eq!(
            registry.lookup(&ModuleId::new("pricing")).unwrap().html,
            "<div></div>"
        );
        assert!(registry.lookup(&ModuleId::new("bom")).is_none());
    }

    #[test]
    fn test_identical_registration_is_idempotent() {
        let registry = ModuleRegistry::new();
        let entry = RegistryEntry::new("<div></div>");
        registry
            .register(ModuleId::new("pricing"), entry.clone())
            .unwrap();
        registry.register(ModuleId::new("pricing"), entry).unwrap();
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_conflicting_registration_is_refused() {
        let registry = ModuleRegistry::new();
        registry
            .register(ModuleId::new("pricing"), RegistryEntry::new("<div>a</div>"))
            .unwrap();

        let err = registry
            .register(ModuleId::new("pricing"), RegistryEntry::new("<div>b</div>"))
            .unwrap_err();
        assert!(matches!(err, RegistryError::Conflict { .. }));
        assert_eq!(registry.get(&ModuleId::new("pricing")).unwrap().html, "<div>a</div>");
    }

    #[test]
    fn test_load_bundle_twice() {
        let script = BundleArtifact::new(ModuleId::new("stock"), "<ul></ul>").render(7);
        let registry = ModuleRegistry::new();

        assert_eq!(registry.load_bundle(&script).unwrap().as_str(), "stock");
        assert_eq!(registry.load_bundle(&script).unwrap().as_str(), "stock");
        assert_eq!(registry.module_ids(), vec![ModuleId::new("stock")]);
    }

    #[test]
    fn test_load_bundles_skips_missing_and_malformed() {
        let fs = MockFileSystem::new();
        fs.add_file(
            "modules/pricing/pricing-bundle.js",
            BundleArtifact::new(ModuleId::new("pricing"), "<p>ok</p>").render(0),
        );
        fs.add_file("modules/bom/bom-bundle.js", "not a bundle");

        let registry = ModuleRegistry::new();
        let loaded = registry.load_bundles(
            &fs,
            Path::new("modules"),
            &[
                ModuleId::new("pricing"),
                ModuleId::new("bom"),
                ModuleId::new("stock"),
            ],
        );

        assert_eq!(loaded, 1);
        assert_eq!(registry.module_ids(), vec![ModuleId::new("pricing")]);
    }
}
