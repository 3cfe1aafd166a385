// src/pipeline/selection.rs
use std::collections::HashSet;
use tracing::warn;

use crate::table::WideTable;

/// Regions of `table` that belong to `wanted`, in table order. `None` means the
/// whole table.
pub fn catalog(table: &WideTable, wanted: Option<&[String]>) -> Vec<String> {
    match wanted {
        None => table.region_names(),
        Some(list) => {
            let wanted: HashSet<&str> = list.iter().map(String::as_str).collect();
            table
                .rows
                .iter()
                .filter(|r| wanted.contains(r.name.as_str()))
                .map(|r| r.name.clone())
                .collect()
        }
    }
}

/// The `top_n` catalog regions with the most confirmed cases on the latest
/// date, followed by any `extras` that are in the catalog and not yet chosen.
pub fn default_selection(
    confirmed: &WideTable,
    catalog: &[String],
    top_n: usize,
    extras: &[String],
) -> Vec<String> {
    let in_catalog: HashSet<&str> = catalog.iter().map(String::as_str).collect();
    let mut ranked: Vec<(&str, f64)> = confirmed
        .rows
        .iter()
        .filter(|r| in_catalog.contains(r.name.as_str()))
        .map(|r| (r.name.as_str(), r.values.last().copied().unwrap_or(0.0)))
        .collect();
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut out: Vec<String> = ranked
        .into_iter()
        .take(top_n)
        .map(|(name, _)| name.to_string())
        .collect();
    for extra in extras {
        if in_catalog.contains(extra.as_str()) && !out.contains(extra) {
            out.push(extra.clone());
        }
    }
    out
}

/// Resolve the caller's choice into the region set to chart.
///
/// `select_all` is honoured only for catalogs smaller than `select_all_limit`;
/// otherwise the default selection is used. An explicit list is intersected
/// with the catalog and may come out empty.
pub fn resolve_selection(
    catalog: &[String],
    defaults: &[String],
    requested: Option<&[String]>,
    select_all: bool,
    select_all_limit: usize,
) -> HashSet<String> {
    if select_all {
        if catalog.len() < select_all_limit {
            return catalog.iter().cloned().collect();
        }
        warn!(
            regions = catalog.len(),
            limit = select_all_limit,
            "select-all not offered for a catalog this large, using defaults"
        );
        return defaults.iter().cloned().collect();
    }
    match requested {
        None => defaults.iter().cloned().collect(),
        Some(list) => {
            let in_catalog: HashSet<&str> = catalog.iter().map(String::as_str).collect();
            list.iter()
                .filter(|r| {
                    let known = in_catalog.contains(r.as_str());
                    if !known {
                        warn!(region = %r, "ignoring region outside this view");
                    }
                    known
                })
                .cloned()
                .collect()
        }
    }
}
