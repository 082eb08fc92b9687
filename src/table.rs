//! Table substitution and template row expansion.

use crate::bindings::Bindings;
use crate::block::{Block, Column, Row};
use crate::config::TableConfig;
use crate::substitute::Substitution;
use crate::walk::fill_spans;

pub fn fill_table(
    headers: &[Column],
    rows: &[Row],
    bindings: &Bindings,
    config: &TableConfig,
) -> Block {
    let headers = headers
        .iter()
        .map(|column| Column {
            label: fill_spans(&column.label, &mut Substitution::new(bindings)),
            alignment: column.alignment,
        })
        .collect();

    let rows = match rows {
        [template] => expand_template_row(template, bindings, config),
        // Several literal rows are already expanded
        _ => rows
            .iter()
            .map(|row| fill_row(row, &mut Substitution::new(bindings)))
            .collect(),
    };

    Block::Table { headers, rows }
}

fn fill_row(row: &Row, subst: &mut Substitution<'_>) -> Row {
    row.iter().map(|cell| fill_spans(cell, subst)).collect()
}

/// Emit one row per numeric suffix family present in `bindings`.
///
/// Suffixes are probed as 1, 2, 3, ... and the first suffix that no cell
/// resolves through `name + suffix` ends the expansion. If not even suffix 1
/// hits, the row is kept once or dropped per `config.keep_unexpanded_row`.
pub fn expand_template_row(template: &Row, bindings: &Bindings, config: &TableConfig) -> Vec<Row> {
    let bound = bindings.suffix_bound();
    let mut rows = Vec::new();

    for n in 1..=bound {
        let mut subst = Substitution::with_suffix(bindings, n);
        let row = fill_row(template, &mut subst);
        if !subst.suffixed_hit() {
            tracing::trace!(suffix = n, "no bindings for suffix, stopping");
            break;
        }
        rows.push(row);
    }

    if rows.is_empty() {
        if !config.keep_unexpanded_row {
            tracing::debug!("template row has no suffixed bindings, dropping it");
            return rows;
        }
        rows.push(fill_row(template, &mut Substitution::new(bindings)));
    }

    tracing::debug!(rows = rows.len(), "expanded template row");
    rows
}
