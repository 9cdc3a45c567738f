//! Offline generation of self-registering module bundles
//!
//! A bundle is a standalone script that stores one module's HTML in the
//! browser-side registry, so pages opened from `file://` can load modules
//! without `fetch`. This module renders bundles, parses them back, and
//! drives batch generation over a module list.

mod artifact;
mod escape;
mod generator;

pub use artifact::{hash_source, BundleArtifact, REGISTRY_GLOBAL};
pub use escape::{escape_template, unescape_template};
pub use generator::{BuildOutcome, BuildReport, BundleGenerator, Freshness};
