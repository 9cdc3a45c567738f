use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Key identifying a deployable UI module, e.g. `pricing`.
///
/// The identifier doubles as a path segment and as a registry key. It is
/// taken as given: casing and path construction are the caller's concern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModuleId(String);

impl ModuleId {
    pub fn new(id: impl Into<String>) -> Self {
        ModuleId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// File name of the module's HTML source (`<id>.html`)
    pub fn html_file_name(&self) -> String {
        format!("{}.html", self.0)
    }

    /// File name of the generated bundle (`<id>-bundle.js`)
    pub fn bundle_file_name(&self) -> String {
        format!("{}-bundle.js", self.0)
    }

    /// Resource path fetched in networked mode, relative to the page base
    pub fn resource_path(&self) -> String {
        format!("modules/{}/{}", self.0, self.html_file_name())
    }

    /// Directory holding the module's sources under `modules_dir`
    pub fn module_dir(&self, modules_dir: &Path) -> PathBuf {
        modules_dir.join(&self.0)
    }
}

impl fmt::Display for ModuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ModuleId {
    fn from(id: &str) -> Self {
        ModuleId::new(id)
    }
}

impl From<String> for ModuleId {
    fn from(id: String) -> Self {
        ModuleId(id)
    }
}

impl AsRef<str> for ModuleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
