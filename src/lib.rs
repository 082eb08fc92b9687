mod bindings;
mod block;
mod config;
mod parser;
mod pdf;
mod placeholder;
mod render;
mod substitute;
mod table;
mod typst;
mod walk;

pub use bindings::{Bindings, BindingsError};
pub use block::{Alignment, Block, Column, List, ListItem, Row, Span};
pub use config::{Config, FontConfig, LinksConfig, PageConfig, TableConfig};
pub use parser::Diagnostic;
pub use pdf::PdfRenderer;
pub use placeholder::{Placeholder, Resolved, Source, lookup, lookup_with_suffix, scan};
pub use render::{HtmlRenderer, Renderer};
pub use substitute::{
    Substitution, substitute, substitute_url, substitute_url_with_suffix, substitute_with_suffix,
};
pub use typst::TypstRenderer;

use std::collections::BTreeSet;

/// Why a template could not be rendered. Nothing is rendered on error.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{}", join_diagnostics(.0))]
    Parse(Vec<Diagnostic>),
    #[error("{0}")]
    Render(String),
}

fn join_diagnostics(diagnostics: &[Diagnostic]) -> String {
    diagnostics
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Parse markdown text into a vector of blocks.
pub fn parse(markdown: &str) -> Result<Vec<Block>, Error> {
    parser::parse(markdown).map_err(Error::Parse)
}

/// Parse a template and substitute `bindings` throughout, without rendering.
pub fn fill(template: &str, bindings: &Bindings, tables: &TableConfig) -> Result<Vec<Block>, Error> {
    let blocks = parse(template)?;
    Ok(walk::fill_blocks(&blocks, bindings, tables))
}

/// Fill a template and render it to HTML with default table handling.
pub fn render(template: &str, bindings: &Bindings) -> Result<String, Error> {
    render_with(template, bindings, &TableConfig::default(), &HtmlRenderer)
}

/// Fill a template and hand the result to `renderer`.
pub fn render_with<R: Renderer>(
    template: &str,
    bindings: &Bindings,
    tables: &TableConfig,
    renderer: &R,
) -> Result<R::Output, Error> {
    let blocks = fill(template, bindings, tables)?;
    renderer.render(&blocks).map_err(Error::Render)
}

/// Placeholder names in `template` that resolve neither directly nor as the
/// first row of a numbered family (`name1`), sorted and deduplicated.
///
/// Link targets written as `%7Bname%7D` are included.
pub fn missing_variables(template: &str, bindings: &Bindings) -> Vec<String> {
    let decoded = substitute::decode_braces(template);
    let missing: BTreeSet<&str> = scan(&decoded)
        .map(|p| p.name)
        .filter(|name| !bindings.contains(name) && !bindings.contains(&format!("{name}1")))
        .collect();
    missing.into_iter().map(str::to_string).collect()
}
