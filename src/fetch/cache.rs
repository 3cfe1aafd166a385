// src/fetch/cache.rs
use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
    time::Instant,
};
use tracing::{debug, info, instrument};

use super::{sources::SourceId, Fetcher};
use crate::error::Result;
use crate::load::{align_bundle, load_wide_table};
use crate::table::{Granularity, SeriesBundle, WideTable};

/// Process-lifetime cache of normalized wide tables, keyed by source identity.
///
/// A hit returns the stored `Arc` without touching the network; `invalidate`
/// forgets everything so the next request fetches again.
pub struct SourceCache {
    fetcher: Fetcher,
    tables: RwLock<HashMap<SourceId, Arc<WideTable>>>,
}

impl SourceCache {
    pub fn new(fetcher: Fetcher) -> Self {
        Self {
            fetcher,
            tables: RwLock::new(HashMap::new()),
        }
    }

    pub fn fetcher(&self) -> &Fetcher {
        &self.fetcher
    }

    fn cached(&self, source: SourceId) -> Option<Arc<WideTable>> {
        let map = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        map.get(&source).cloned()
    }

    /// Return the wide table for `source`, fetching and normalizing it on a miss.
    #[instrument(level = "debug", skip(self), fields(source = %source))]
    pub async fn get(&self, source: SourceId) -> Result<Arc<WideTable>> {
        if let Some(table) = self.cached(source) {
            debug!("cache hit");
            return Ok(table);
        }

        let start = Instant::now();
        let text = self.fetcher.fetch_text(source.series).await?;
        let table = Arc::new(load_wide_table(source, &text)?);
        info!(
            regions = table.rows.len(),
            dates = table.dates.len(),
            elapsed = ?start.elapsed(),
            "loaded"
        );

        // a concurrent request may have won the race; keep the first copy
        let mut map = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(map.entry(source).or_insert(table)))
    }

    /// Load confirmed, deaths and recovered for one granularity concurrently.
    pub async fn load_bundle(&self, granularity: Granularity) -> Result<SeriesBundle> {
        let [c, d, r] = SourceId::bundle(granularity);
        let (confirmed, deaths, recovered) =
            futures::try_join!(self.get(c), self.get(d), self.get(r))?;
        align_bundle(confirmed, deaths, recovered)
    }

    pub fn len(&self) -> usize {
        self.tables
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every cached table.
    pub fn invalidate(&self) {
        let mut map = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        info!(dropped = map.len(), "invalidating source cache");
        map.clear();
    }
}
