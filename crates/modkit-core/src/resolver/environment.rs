use url::Url;

/// Schemes under which module markup is fetched over the network
pub const NETWORK_SCHEMES: &[&str] = &["http", "https"];

/// Resolution strategy selected from the page origin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    /// Markup comes from the registry populated by bundles
    Local,
    /// Markup is fetched from `modules/<id>/<id>.html`
    Networked,
}

/// `Local` for non-network origins (e.g. `file://`) or when the page is
/// flagged as a development context, `Networked` otherwise.
pub fn resolve_environment(origin: &Url, development: bool) -> Environment {
    if development || !NETWORK_SCHEMES.contains(&origin.scheme()) {
        Environment::Local
    } else {
        Environment::Networked
    }
}
