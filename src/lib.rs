//! Epidemic time-series dashboard core: load the published confirmed, deaths
//! and recovered feeds, normalize them per country or US state, and derive
//! chart-ready tables for a region-group view.

pub mod config;
pub mod error;
pub mod export;
pub mod fetch;
pub mod load;
pub mod pipeline;
pub mod population;
pub mod render;
pub mod table;
pub mod view;

pub use config::{Config, RegionView};
pub use error::{Error, Result};
pub use fetch::{FeedLocation, Fetcher, SourceCache, SourceId};
pub use population::PopulationTable;
pub use table::{Granularity, Series, SeriesBundle, WideRow, WideTable};
pub use view::{Detail, DetailSeries, DisplayMode, LogFraming, Overview, ViewContext, ViewParams};
