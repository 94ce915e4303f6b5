//! Application service: export collection and template staging.
//!
//! Imports only from `crate::domain` and `crate::application::ports`.

use std::path::Path;

use anyhow::{Context, Result};

use crate::application::ports::{ExportsApi, TemplateFs};
use crate::domain::TemplateError;
use crate::domain::template::{self, Bindings};

/// Fetch every export in the region, following page tokens to the end.
///
/// # Errors
///
/// Returns an error if any page request fails.
pub async fn collect_exports(exports: &impl ExportsApi) -> Result<Bindings> {
    let mut all = Bindings::new();
    let mut token: Option<String> = None;
    let mut pages = 0_u32;
    loop {
        let page = exports
            .list_exports_page(token.as_deref())
            .await
            .context("listing exports")?;
        pages += 1;
        tracing::debug!(page = pages, count = page.exports.len(), "fetched export page");
        all.extend(page.exports.into_iter().map(|e| (e.name, e.value)));
        match page.next_token {
            Some(next) if !next.is_empty() => token = Some(next),
            _ => break,
        }
    }
    Ok(all)
}

/// Look up a single export by name.
#[must_use]
pub fn lookup_export<'a>(exports: &'a Bindings, name: &str) -> Option<&'a str> {
    exports.get(name).map(String::as_str)
}

/// Bind each `key` to the export `<stack_name>-<key>`.
///
/// # Errors
///
/// Returns [`TemplateError::MissingExport`] for the first export not found.
pub fn require_exports(exports: &Bindings, stack_name: &str, keys: &[&str]) -> Result<Bindings> {
    let mut bound = Bindings::new();
    for key in keys {
        let name = template::export_name(stack_name, key);
        let value = lookup_export(exports, &name).ok_or(TemplateError::MissingExport { name })?;
        bound.insert((*key).to_string(), value.to_string());
    }
    Ok(bound)
}

/// Read `source`, resolve its placeholders and write the result to `staged`.
///
/// Returns the resolved text. Nothing is written when resolution fails.
///
/// # Errors
///
/// Returns an error if the template cannot be read, a placeholder is
/// unresolved, or the staged file cannot be written.
pub fn render_and_stage(
    fs: &impl TemplateFs,
    source: &Path,
    bindings: &Bindings,
    staged: &Path,
) -> Result<String> {
    let text = fs
        .read_template(source)
        .with_context(|| format!("reading template {}", source.display()))?;
    let resolved = template::resolve(&text, bindings)
        .with_context(|| format!("resolving template {}", source.display()))?;
    fs.write_staged(staged, &resolved)
        .with_context(|| format!("staging {}", staged.display()))?;
    tracing::debug!(source = %source.display(), staged = %staged.display(), "template staged");
    Ok(resolved)
}
