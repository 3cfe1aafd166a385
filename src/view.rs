// src/view.rs
//! One parameterized region-group page: an overview over many regions and a
//! detail view of a single one.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use tracing::{debug, info, instrument};

use crate::config::{Config, RegionView};
use crate::pipeline::{
    add_epsilon, after_cutoff, catalog, daily_new_active, default_selection, fatality_rate,
    join_cases, log_axis_domain, melt, melt_region, per_100k, prune_zero_dates, resolve_selection,
};
use crate::population::PopulationTable;
use crate::table::{CaseRow, DeltaRow, FatalityRow, LongRow, Per100kRow, SeriesBundle};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisplayMode {
    #[default]
    Cumulative,
    NewCases,
}

/// Caller-supplied view state for one render.
#[derive(Debug, Clone, PartialEq)]
pub struct ViewParams {
    /// `None` uses the view's default selection.
    pub region_set: Option<Vec<String>>,
    pub select_all: bool,
    pub log_scale: bool,
    pub display_mode: DisplayMode,
    /// Region of the detail view; the first catalog entry when `None`.
    pub selected_single_region: Option<String>,
}

impl Default for ViewParams {
    fn default() -> Self {
        Self {
            region_set: None,
            select_all: false,
            log_scale: true,
            display_mode: DisplayMode::Cumulative,
            selected_single_region: None,
        }
    }
}

/// Log-axis settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LogFraming {
    pub cutoff: NaiveDate,
    pub epsilon: f64,
}

impl From<&Config> for LogFraming {
    fn from(cfg: &Config) -> Self {
        Self {
            cutoff: cfg.log_cutoff,
            epsilon: cfg.log_epsilon,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Overview {
    pub title: String,
    pub unit_name: String,
    /// Selected regions in source order.
    pub regions: Vec<String>,
    pub log_scale: bool,
    /// Suggested `[min, max]` of the case axis when log scaled.
    pub axis_domain: Option<(f64, f64)>,
    pub cases: Vec<LongRow>,
    pub fatality: Vec<FatalityRow>,
    pub per100k: Vec<Per100kRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "rows", rename_all = "snake_case")]
pub enum DetailSeries {
    Cumulative(Vec<CaseRow>),
    NewCases(Vec<DeltaRow>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Detail {
    pub title: String,
    pub region: String,
    pub series: DetailSeries,
}

/// A view bound to the (pruned) tables of its granularity for one render.
pub struct ViewContext<'a> {
    view: &'a RegionView,
    bundle: SeriesBundle,
    catalog: Vec<String>,
    defaults: Vec<String>,
}

impl<'a> ViewContext<'a> {
    pub fn new(view: &'a RegionView, cached: &SeriesBundle) -> Self {
        let bundle = prune_zero_dates(cached);
        let catalog = catalog(&bundle.confirmed, view.regions.as_deref());
        let defaults = default_selection(
            &bundle.confirmed,
            &catalog,
            view.default_selected,
            &view.extra_defaults,
        );
        debug!(
            view = %view.key,
            catalog = catalog.len(),
            defaults = defaults.len(),
            "bound view"
        );
        Self {
            view,
            bundle,
            catalog,
            defaults,
        }
    }

    /// Regions offered by this view, in source order.
    pub fn catalog(&self) -> &[String] {
        &self.catalog
    }

    pub fn defaults(&self) -> &[String] {
        &self.defaults
    }

    pub fn select_all_available(&self) -> bool {
        self.catalog.len() < self.view.select_all_limit
    }

    fn selection(&self, params: &ViewParams) -> HashSet<String> {
        resolve_selection(
            &self.catalog,
            &self.defaults,
            params.region_set.as_deref(),
            params.select_all,
            self.view.select_all_limit,
        )
    }

    /// Case counts, fatality rate and per-100k ranking of the selected regions.
    /// `None` when nothing is selected.
    #[instrument(level = "info", skip_all, fields(view = %self.view.key))]
    pub fn overview(
        &self,
        params: &ViewParams,
        population: &PopulationTable,
        framing: LogFraming,
    ) -> Option<Overview> {
        let selected = self.selection(params);
        if selected.is_empty() {
            info!("empty selection, nothing to chart");
            return None;
        }
        info!(regions = selected.len(), log_scale = params.log_scale, "overview");

        let mut cases = melt(&self.bundle.confirmed, &selected);
        let deaths = melt(&self.bundle.deaths, &selected);
        let mut fatality = fatality_rate(&cases, &deaths);

        let mut axis_domain = None;
        if params.log_scale {
            add_epsilon(&mut cases, framing.epsilon);
            cases = after_cutoff(cases, framing.cutoff);
            fatality = after_cutoff(fatality, framing.cutoff);
            axis_domain = Some(log_axis_domain(&cases));
        }

        let per100k = per_100k(&cases, population, self.bundle.granularity());
        let regions = self
            .catalog
            .iter()
            .filter(|r| selected.contains(*r))
            .cloned()
            .collect();

        Some(Overview {
            title: self.view.title.clone(),
            unit_name: self.view.unit_name.clone(),
            regions,
            log_scale: params.log_scale,
            axis_domain,
            cases,
            fatality,
            per100k,
        })
    }

    /// Active/deaths/recovered of one region, cumulative or as daily new active
    /// cases. `None` when no region is selected or the region is not in the view.
    #[instrument(level = "info", skip_all, fields(view = %self.view.key))]
    pub fn detail(&self, params: &ViewParams) -> Option<Detail> {
        let region = match &params.selected_single_region {
            Some(r) => r.clone(),
            None => self.catalog.first()?.clone(),
        };
        if !self.catalog.contains(&region) {
            info!(%region, "region not in this view, nothing to chart");
            return None;
        }
        info!(%region, mode = ?params.display_mode, "detail");

        let cases = join_cases(
            &melt_region(&self.bundle.confirmed, &region),
            &melt_region(&self.bundle.deaths, &region),
            &melt_region(&self.bundle.recovered, &region),
        );
        let series = match params.display_mode {
            DisplayMode::Cumulative => DetailSeries::Cumulative(cases),
            DisplayMode::NewCases => DetailSeries::NewCases(daily_new_active(&cases)),
        };

        Some(Detail {
            title: format!("{} statistics", self.view.unit_name),
            region,
            series,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_views;
    use crate::pipeline::test_support::{bundle_from, day};
    use anyhow::Result;

    fn view(regions: &[&str], select_all_limit: usize) -> RegionView {
        RegionView {
            key: "test".into(),
            title: "Test".into(),
            unit_name: "Country".into(),
            unit_plural: "Countries".into(),
            granularity: crate::table::Granularity::World,
            regions: Some(regions.iter().map(|s| s.to_string()).collect()),
            default_selected: 2,
            extra_defaults: Vec::new(),
            select_all_limit,
        }
    }

    fn bundle() -> SeriesBundle {
        bundle_from(
            &[("A", [0.0, 10.0, 20.0, 45.0]), ("B", [0.0, 0.0, 1.0, 2.0]), ("Z", [0.0, 0.0, 0.0, 7.0])],
            &[("A", [0.0, 0.0, 1.0, 2.0]), ("B", [0.0, 0.0, 0.0, 0.0]), ("Z", [0.0, 0.0, 0.0, 0.0])],
            &[("A", [0.0, 0.0, 0.0, 5.0]), ("B", [0.0, 0.0, 0.0, 1.0]), ("Z", [0.0, 0.0, 0.0, 0.0])],
        )
    }

    fn linear() -> ViewParams {
        ViewParams {
            log_scale: false,
            ..ViewParams::default()
        }
    }

    fn framing() -> LogFraming {
        LogFraming {
            cutoff: day(1),
            epsilon: 1e-5,
        }
    }

    #[test]
    fn empty_selection_yields_nothing() -> Result<()> {
        let v = view(&["A", "B", "Z"], 30);
        let ctx = ViewContext::new(&v, &bundle());
        let params = ViewParams {
            region_set: Some(Vec::new()),
            ..linear()
        };
        let pop = PopulationTable::bundled()?;
        assert!(ctx.overview(&params, &pop, framing()).is_none());
        Ok(())
    }

    #[test]
    fn overview_prunes_and_ranks() -> Result<()> {
        let v = view(&["A", "B", "Z"], 30);
        let ctx = ViewContext::new(&v, &bundle());
        let params = ViewParams {
            region_set: Some(vec!["Z".into(), "A".into()]),
            ..linear()
        };
        let out = ctx
            .overview(&params, &PopulationTable::default(), framing())
            .expect("non-empty selection");

        assert_eq!(out.regions, vec!["A", "Z"]);
        // first date has no cases anywhere and is pruned: 2 regions x 3 dates
        assert_eq!(out.cases.len(), 6);
        assert_eq!(out.fatality.len(), 6);
        assert!(out.axis_domain.is_none());
        let ranking: Vec<_> = out.per100k.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(ranking, vec!["A", "Z"]);
        assert_eq!(out.per100k[0].per100k, 4.5);
        Ok(())
    }

    #[test]
    fn log_scale_trims_and_offsets() -> Result<()> {
        let v = view(&["A", "B", "Z"], 30);
        let ctx = ViewContext::new(&v, &bundle());
        let out = ctx
            .overview(&ViewParams::default(), &PopulationTable::default(), framing())
            .expect("defaults are non-empty");

        // defaults: top two by latest confirmed
        assert_eq!(out.regions, vec!["A", "Z"]);
        assert!(out.cases.iter().all(|r| r.date > day(1)));
        assert!(out.fatality.iter().all(|r| r.date > day(1)));
        let a_last = out
            .cases
            .iter()
            .find(|r| r.region == "A" && r.date == day(3))
            .unwrap();
        assert_eq!(a_last.value, 45.0 + 1e-5);
        assert_eq!(out.axis_domain, Some((10.0, 45.0)));
        Ok(())
    }

    #[test]
    fn select_all_policy() {
        let b = bundle();
        let small = view(&["A", "B", "Z"], 30);
        let ctx = ViewContext::new(&small, &b);
        assert!(ctx.select_all_available());
        let all = ViewParams {
            select_all: true,
            ..linear()
        };
        let out = ctx
            .overview(&all, &PopulationTable::default(), framing())
            .unwrap();
        assert_eq!(out.regions.len(), 3);

        let tiny_limit = view(&["A", "B", "Z"], 2);
        let ctx = ViewContext::new(&tiny_limit, &b);
        assert!(!ctx.select_all_available());
        let out = ctx
            .overview(&all, &PopulationTable::default(), framing())
            .unwrap();
        assert_eq!(out.regions, ctx.defaults().to_vec());
    }

    #[test]
    fn detail_cumulative_and_new_cases() {
        let v = view(&["A", "B", "Z"], 30);
        let ctx = ViewContext::new(&v, &bundle());

        let cumulative = ctx
            .detail(&ViewParams {
                selected_single_region: Some("A".into()),
                ..linear()
            })
            .unwrap();
        match cumulative.series {
            DetailSeries::Cumulative(rows) => {
                let active: Vec<f64> = rows.iter().map(|r| r.active).collect();
                assert_eq!(active, vec![10.0, 19.0, 38.0]);
            }
            other => panic!("unexpected {:?}", other),
        }

        let new_cases = ctx
            .detail(&ViewParams {
                selected_single_region: Some("A".into()),
                display_mode: DisplayMode::NewCases,
                ..linear()
            })
            .unwrap();
        match new_cases.series {
            DetailSeries::NewCases(rows) => {
                let active: Vec<f64> = rows.iter().map(|r| r.active).collect();
                assert_eq!(active, vec![9.0, 19.0]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn detail_outside_view_is_empty() {
        let v = view(&["A"], 30);
        let ctx = ViewContext::new(&v, &bundle());
        let params = ViewParams {
            selected_single_region: Some("B".into()),
            ..linear()
        };
        assert!(ctx.detail(&params).is_none());
        assert_eq!(ctx.detail(&linear()).unwrap().region, "A");
    }

    #[test]
    fn default_views_bind_to_their_catalogs() {
        let b = bundle();
        for v in default_views() {
            let ctx = ViewContext::new(&v, &b);
            if v.regions.is_none() {
                assert_eq!(ctx.catalog().len(), 3);
            }
        }
    }
}
