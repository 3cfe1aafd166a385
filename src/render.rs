// src/render.rs
//! Ties config, cache and population table together and runs whole renders
//! under a bounded retry policy.

use std::future::Future;
use std::time::Duration;
use tracing::{error, info, instrument, warn};

use crate::config::{Config, RegionView};
use crate::error::{Error, Result};
use crate::fetch::{FeedLocation, Fetcher, SourceCache};
use crate::population::PopulationTable;
use crate::view::{Detail, LogFraming, Overview, ViewContext, ViewParams};

pub const DATA_UNAVAILABLE: &str = "Data source unavailable, please try again later.";
pub const SERVER_ERROR: &str = "Server error, please visit the site later.";

/// Every attempt of a render failed.
#[derive(Debug, thiserror::Error)]
#[error("render failed after {attempts} attempts: {last}")]
pub struct RenderFailure {
    pub attempts: usize,
    #[source]
    pub last: Error,
}

impl RenderFailure {
    pub fn user_message(&self) -> &'static str {
        SERVER_ERROR
    }
}

/// Run `op` up to `attempts` times, returning the first success.
/// `op` receives the 1-based attempt number. Only feed failures are retried;
/// local setup errors (unknown view, unreadable files) end the loop at once.
pub async fn with_retries<T, F, Fut>(
    attempts: usize,
    mut op: F,
) -> std::result::Result<T, RenderFailure>
where
    F: FnMut(usize) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match op(attempt).await {
            Ok(out) => return Ok(out),
            Err(e) if !e.is_data_fetch() => {
                error!(attempt, error = %e, "render failed, not retrying");
                return Err(RenderFailure {
                    attempts: attempt,
                    last: e,
                });
            }
            Err(e) => {
                warn!(attempt, error = %e, "{}", DATA_UNAVAILABLE);
                if attempt >= attempts {
                    error!(attempts, "giving up");
                    return Err(RenderFailure { attempts, last: e });
                }
            }
        }
    }
}

/// Long-lived state shared by every render of the process.
pub struct Dashboard {
    config: Config,
    cache: SourceCache,
    population: PopulationTable,
}

impl Dashboard {
    pub fn from_config(config: Config) -> Result<Self> {
        let location = FeedLocation::parse(&config.source)?;
        let fetcher = Fetcher::new(location).with_retries(
            config.fetch_attempts,
            Duration::from_millis(config.fetch_retry_delay_ms),
        );
        let population = match &config.population_file {
            Some(path) => PopulationTable::from_path(path)?,
            None => PopulationTable::bundled()?,
        };
        info!(source = %fetcher.location(), views = config.views.len(), "dashboard ready");
        Ok(Self {
            config,
            cache: SourceCache::new(fetcher),
            population,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn cache(&self) -> &SourceCache {
        &self.cache
    }

    fn view(&self, key: &str) -> Result<&RegionView> {
        self.config
            .view(key)
            .ok_or_else(|| Error::UnknownView(key.to_string()))
    }

    /// Regions a view offers and whether select-all is available for it.
    pub async fn catalog(&self, view_key: &str) -> Result<(Vec<String>, bool)> {
        let view = self.view(view_key)?;
        let bundle = self.cache.load_bundle(view.granularity).await?;
        let ctx = ViewContext::new(view, &bundle);
        Ok((ctx.catalog().to_vec(), ctx.select_all_available()))
    }

    #[instrument(level = "debug", skip(self, params))]
    pub async fn overview(&self, view_key: &str, params: &ViewParams) -> Result<Option<Overview>> {
        let view = self.view(view_key)?;
        let bundle = self.cache.load_bundle(view.granularity).await?;
        let ctx = ViewContext::new(view, &bundle);
        Ok(ctx.overview(params, &self.population, LogFraming::from(&self.config)))
    }

    #[instrument(level = "debug", skip(self, params))]
    pub async fn detail(&self, view_key: &str, params: &ViewParams) -> Result<Option<Detail>> {
        let view = self.view(view_key)?;
        let bundle = self.cache.load_bundle(view.granularity).await?;
        Ok(ViewContext::new(view, &bundle).detail(params))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::file_name;
    use crate::table::Series;
    use crate::view::DetailSeries;
    use std::fs;
    use std::path::Path;
    use tempfile::tempdir;

    fn boom() -> Error {
        Error::SourceFetch {
            source_name: "test".into(),
            message: "connection refused".into(),
        }
    }

    #[tokio::test]
    async fn retries_until_success() {
        let out = with_retries(3, |attempt| async move {
            if attempt < 3 {
                Err(boom())
            } else {
                Ok(attempt)
            }
        })
        .await;
        assert_eq!(out.unwrap(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_last_attempt() {
        let mut seen = 0;
        let err = with_retries(3, |_| {
            seen += 1;
            async { Err::<(), _>(boom()) }
        })
        .await
        .unwrap_err();
        assert_eq!(seen, 3);
        assert_eq!(err.attempts, 3);
        assert!(err.last.is_data_fetch());
        assert_eq!(err.user_message(), SERVER_ERROR);
    }

    #[tokio::test]
    async fn setup_errors_are_not_retried() {
        let mut seen = 0;
        let err = with_retries(3, |_| {
            seen += 1;
            async { Err::<(), _>(Error::UnknownView("atlantis".into())) }
        })
        .await
        .unwrap_err();
        assert_eq!(seen, 1);
        assert_eq!(err.attempts, 1);
        assert!(matches!(err.last, Error::UnknownView(_)));
    }

    fn write_mirror(dir: &Path) -> anyhow::Result<()> {
        let header = "Province/State,Country/Region,Lat,Long,3/1/20,3/2/20,3/3/20\n";
        let confirmed = ",France,46.0,2.0,0,4,12\n,Chad,15.0,19.0,0,1,3\nWashington,US,47.4,-121.4,0,2,5\n";
        let deaths = ",France,46.0,2.0,0,0,1\n,Chad,15.0,19.0,0,0,0\nWashington,US,47.4,-121.4,0,0,1\n";
        let recovered = ",France,46.0,2.0,0,0,2\n,Chad,15.0,19.0,0,0,1\nWashington,US,47.4,-121.4,0,0,0\n";
        for (series, body) in [
            (Series::Confirmed, confirmed),
            (Series::Deaths, deaths),
            (Series::Recovered, recovered),
        ] {
            fs::write(dir.join(file_name(series)), format!("{}{}", header, body))?;
        }
        Ok(())
    }

    fn local_config(dir: &Path) -> Config {
        Config {
            source: dir.display().to_string(),
            ..Config::default()
        }
    }

    #[tokio::test]
    async fn renders_from_a_local_mirror() -> anyhow::Result<()> {
        let dir = tempdir()?;
        write_mirror(dir.path())?;
        let dash = Dashboard::from_config(local_config(dir.path()))?;

        let params = ViewParams {
            log_scale: false,
            ..ViewParams::default()
        };
        let overview = dash.overview("world", &params).await?.expect("defaults");
        assert_eq!(overview.regions, vec!["France", "Chad", "US"]);
        // 3/1/20 carries no cases and is pruned
        assert_eq!(overview.cases.len(), 6);
        assert_eq!(overview.per100k[0].region, "France");

        let detail = dash
            .detail(
                "us-states",
                &ViewParams {
                    selected_single_region: Some("Washington".into()),
                    ..params
                },
            )
            .await?
            .expect("state is in the catalog");
        match detail.series {
            DetailSeries::Cumulative(rows) => {
                let active: Vec<f64> = rows.iter().map(|r| r.active).collect();
                assert_eq!(active, vec![2.0, 4.0]);
            }
            other => panic!("unexpected {:?}", other),
        }

        let (catalog, select_all) = dash.catalog("mena").await?;
        assert_eq!(catalog, vec!["Chad"]);
        assert!(select_all);
        assert_eq!(dash.cache().len(), 6);
        Ok(())
    }

    #[tokio::test]
    async fn unknown_view_is_not_a_fetch_error() -> anyhow::Result<()> {
        let dir = tempdir()?;
        write_mirror(dir.path())?;
        let dash = Dashboard::from_config(local_config(dir.path()))?;
        let err = dash
            .overview("atlantis", &ViewParams::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnknownView(_)));
        assert!(!err.is_data_fetch());
        Ok(())
    }
}
