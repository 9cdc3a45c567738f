use super::escape::{escape_template, split_template_literal, unescape_template};
use crate::errors::BundleError;
use crate::module_id::ModuleId;

/// Global object the generated scripts register markup into
pub const REGISTRY_GLOBAL: &str = "window.ModuleContent";

const SOURCE_HASH_PREFIX: &str = "// Source hash: ";

/// BLAKE3 hex digest of a module's HTML source
pub fn hash_source(html: &str) -> String {
    blake3::hash(html.as_bytes()).to_hex().to_string()
}

/// One module's markup, in the form carried by a generated bundle script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleArtifact {
    pub module: ModuleId,
    pub html: String,
    /// Hash of the source the bundle was generated from; absent in
    /// hand-written bundles
    pub source_hash: Option<String>,
}

impl BundleArtifact {
    pub fn new(module: ModuleId, html: impl Into<String>) -> Self {
        let html = html.into();
        let source_hash = Some(hash_source(&html));
        Self {
            module,
            html,
            source_hash,
        }
    }

    /// Render the self-registering script.
    ///
    /// Executing it any number of times leaves the registry holding exactly
    /// `{ html }` under the module's key. `generated_at` only appears in a
    /// comment.
    pub fn render(&self, generated_at: u64) -> String {
        let key = js_string(self.module.as_str());
        let log_line = js_string(&format!("{} module bundle loaded", self.module));

        let mut out = String::with_capacity(self.html.len() + 512);
        out.push_str(&format!(
            "// Auto-generated bundle for the {} module\n",
            self.module
        ));
        out.push_str("// Development builds only: lets file:// pages load the module without fetch\n");
        out.push_str(&format!("// Generated on: {} (unix seconds)\n", generated_at));
        if let Some(ref hash) = self.source_hash {
            out.push_str(SOURCE_HASH_PREFIX);
            out.push_str(hash);
            out.push('\n');
        }
        out.push('\n');
        out.push_str("(function() {\n");
        out.push_str(&format!(
            "    {global} = {global} || {{}};\n\n",
            global = REGISTRY_GLOBAL
        ));
        out.push_str(&format!("    {}[{}] = {{\n", REGISTRY_GLOBAL, key));
        out.push_str("        html: `");
        out.push_str(&escape_template(&self.html));
        out.push_str("`\n");
        out.push_str("    };\n\n");
        out.push_str(&format!("    console.log({});\n", log_line));
        out.push_str("})();\n");
        out
    }

    /// Recover the registered module and markup from a bundle script.
    ///
    /// Accepts generated bundles as well as hand-written ones that use
    /// `window.ModuleContent.<id>` or `window.ModuleContent['<id>']`.
    pub fn parse(script: &str) -> Result<Self, BundleError> {
        let source_hash = script.lines().find_map(|line| {
            line.strip_prefix(SOURCE_HASH_PREFIX)
                .map(|hash| hash.trim().to_string())
        });

        let (module, rest) = find_registration(script)?;

        let html_pos = rest
            .find("html:")
            .ok_or_else(|| BundleError::Malformed(format!("no html field for module {}", module)))?;
        let after_field = rest[html_pos + "html:".len()..].trim_start();
        let literal = after_field.strip_prefix('`').ok_or_else(|| {
            BundleError::Malformed(format!(
                "html field of module {} is not a template literal",
                module
            ))
        })?;

        let (body, _) = split_template_literal(literal)?;
        let html = unescape_template(body)?;

        Ok(Self {
            module,
            html,
            source_hash,
        })
    }

    /// Whether the bundle was generated from `html`.
    /// `None` when the bundle carries no source hash.
    pub fn matches_source(&self, html: &str) -> Option<bool> {
        self.source_hash
            .as_ref()
            .map(|hash| *hash == hash_source(html))
    }
}

fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_owned()).to_string()
}

/// Locate `window.ModuleContent[<key>]` / `.key` and return the key and the
/// text after it.
fn find_registration(script: &str) -> Result<(ModuleId, &str), BundleError> {
    for (pos, _) in script.match_indices(REGISTRY_GLOBAL) {
        let rest = &script[pos + REGISTRY_GLOBAL.len()..];

        if let Some(bracketed) = rest.strip_prefix('[') {
            let (key, after_key) = parse_key_literal(bracketed)?;
            let after_key = after_key.trim_start().strip_prefix(']').ok_or_else(|| {
                BundleError::Malformed(format!("expected ] after registry key {:?}", key))
            })?;
            return Ok((ModuleId::new(key), after_key));
        }

        if let Some(dotted) = rest.strip_prefix('.') {
            let end = dotted
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '_' || c == '$'))
                .unwrap_or(dotted.len());
            if end > 0 {
                return Ok((ModuleId::new(&dotted[..end]), &dotted[end..]));
            }
        }
    }

    Err(BundleError::Malformed(format!(
        "no {}[...] registration found",
        REGISTRY_GLOBAL
    )))
}

fn parse_key_literal(input: &str) -> Result<(String, &str), BundleError> {
    let input = input.trim_start();

    if input.starts_with('"') {
        let mut stream = serde_json::Deserializer::from_str(input).into_iter::<String>();
        let key = match stream.next() {
            Some(Ok(key)) => key,
            _ => return Err(BundleError::Malformed("invalid registry key".into())),
        };
        let consumed = stream.byte_offset();
        return Ok((key, &input[consumed..]));
    }

    if let Some(quoted) = input.strip_prefix('\'') {
        let end = quoted
            .find('\'')
            .ok_or_else(|| BundleError::Malformed("unterminated registry key".into()))?;
        return Ok((quoted[..end].to_string(), &quoted[end + 1..]));
    }

    Err(BundleError::Malformed(
        "registry key must be a string literal".into(),
    ))
}
