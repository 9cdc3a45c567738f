//! Test fixtures - module markup and on-disk module trees

use indoc::indoc;
use std::fs;
use std::path::{Path, PathBuf};

/// Markup of a typical pricing module
pub fn pricing_html() -> &'static str {
    indoc! {r#"
        <!-- Pricing Module -->
        <div class="pricing-module">
            <h2>Price Levels</h2>
            <table id="price-table"></table>
        </div>
    "#}
}

/// Markup containing every sequence that must be escaped inside a template literal
pub fn template_hostile_html() -> &'static str {
    indoc! {r#"
        <div class="calc">
            <code>`backticks`</code>
            <span data-expr="${price * qty}">${total}</span>
            <pre>C:\modules\pricing \` \${ $ {</pre>
        </div>
    "#}
}

/// Write `<root>/<id>/<id>.html` and return its path
pub fn write_module(root: &Path, module: &str, html: &str) -> PathBuf {
    let dir = root.join(module);
    fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}.html", module));
    fs::write(&path, html).unwrap();
    path
}

/// Path of the bundle the generator writes for `module` under `root`
pub fn bundle_path(root: &Path, module: &str) -> PathBuf {
    root.join(module).join(format!("{}-bundle.js", module))
}
