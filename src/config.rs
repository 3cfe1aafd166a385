// src/config.rs
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, path::PathBuf};
use tracing::info;

use crate::error::{Error, Result};
use crate::fetch::DEFAULT_BASE_URL;
use crate::pipeline::{default_log_cutoff, LOG_EPSILON};
use crate::table::Granularity;

/// One region-group page: which catalog it draws from and how it is labelled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionView {
    /// Short name used on the command line.
    pub key: String,
    pub title: String,
    #[serde(default = "default_unit_name")]
    pub unit_name: String,
    #[serde(default = "default_unit_plural")]
    pub unit_plural: String,
    #[serde(default = "default_granularity")]
    pub granularity: Granularity,
    /// `None` charts every region of the catalog.
    #[serde(default)]
    pub regions: Option<Vec<String>>,
    #[serde(default = "default_selected")]
    pub default_selected: usize,
    /// Appended to the default selection when present in the catalog.
    #[serde(default)]
    pub extra_defaults: Vec<String>,
    #[serde(default = "default_select_all_limit")]
    pub select_all_limit: usize,
}

fn default_unit_name() -> String {
    "Country".into()
}
fn default_unit_plural() -> String {
    "Countries".into()
}
fn default_granularity() -> Granularity {
    Granularity::World
}
fn default_selected() -> usize {
    10
}
fn default_select_all_limit() -> usize {
    30
}

impl RegionView {
    fn countries(key: &str, title: &str, regions: Option<&[&str]>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            unit_name: default_unit_name(),
            unit_plural: default_unit_plural(),
            granularity: Granularity::World,
            regions: regions.map(|r| r.iter().map(|s| s.to_string()).collect()),
            default_selected: default_selected(),
            extra_defaults: Vec::new(),
            select_all_limit: default_select_all_limit(),
        }
    }
}

const MENA: &[&str] = &[
    "Algeria", "Bahrain", "Egypt", "Iraq", "Jordan", "Kuwait", "Lebanon", "Morocco",
    "Mauritania", "Oman", "Qatar", "Saudi Arabia", "Somalia", "Sudan", "Tunisia",
    "United Arab Emirates", "Djibouti", "Comoros", "Libya", "Palestine", "Syria", "Yemen",
    "Iran", "Turkey", "Greece", "Cyprus", "Ethiopia", "Eritrea", "South Sudan", "Chad",
    "Niger", "Mali", "Senegal", "Malta", "Cote d'Ivoire",
];

const SOUTH_ASIA: &[&str] = &[
    "India", "Pakistan", "Bangladesh", "Afghanistan", "Tajikistan", "Nepal", "Bhutan",
    "Myanmar", "Laos",
];

const EUROPE: &[&str] = &[
    "Germany", "Austria", "Belgium", "Denmark", "France", "Greece", "Italy", "Netherlands",
    "Norway", "Poland", "Romania", "Spain", "Sweden", "Switzerland", "United Kingdom",
];

/// The five pages of the dashboard.
pub fn default_views() -> Vec<RegionView> {
    vec![
        RegionView::countries("mena", "MENA Region", Some(MENA)),
        RegionView::countries("south-asia", "South Asia & Neighbors", Some(SOUTH_ASIA)),
        RegionView {
            key: "us-states".into(),
            title: "US States".into(),
            unit_name: "State".into(),
            unit_plural: "States".into(),
            granularity: Granularity::UsState,
            regions: None,
            default_selected: 10,
            extra_defaults: vec![
                "Guam".into(),
                "District of Columbia".into(),
                "Colorado".into(),
            ],
            select_all_limit: 60,
        },
        RegionView {
            default_selected: EUROPE.len(),
            ..RegionView::countries("europe", "Europe", Some(EUROPE))
        },
        RegionView::countries("world", "World", None),
    ]
}

/// Runtime settings. Every field is optional in the YAML file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Folder URL or local directory holding the three CSV files.
    pub source: String,
    /// `country,population,parent` CSV; the bundled table when unset.
    pub population_file: Option<PathBuf>,
    pub fetch_attempts: usize,
    pub fetch_retry_delay_ms: u64,
    /// Whole-pipeline attempts per render before giving up.
    pub render_attempts: usize,
    pub log_cutoff: NaiveDate,
    pub log_epsilon: f64,
    pub views: Vec<RegionView>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            source: DEFAULT_BASE_URL.to_string(),
            population_file: None,
            fetch_attempts: 3,
            fetch_retry_delay_ms: 1_000,
            render_attempts: 3,
            log_cutoff: default_log_cutoff(),
            log_epsilon: LOG_EPSILON,
            views: default_views(),
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> std::result::Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|err| Error::Io {
            path: path.display().to_string(),
            err,
        })?;
        let cfg = Self::from_yaml(&text).map_err(|err| Error::Config {
            path: path.display().to_string(),
            err,
        })?;
        info!(path = %path.display(), views = cfg.views.len(), "loaded config");
        Ok(cfg)
    }

    pub fn view(&self, key: &str) -> Option<&RegionView> {
        self.views.iter().find(|v| v.key == key)
    }
}
