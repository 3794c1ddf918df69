//! JSON configuration. Every field has a default pointing at the live site.
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::Url;
use scraper::Selector;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::field::parse_selector;
use crate::gate::GateConfig;
use crate::schedule::Schedule;
use crate::status::LotId;

/// Lots feeding the city's GIS night-lots layer.
const NIGHT_LAYER_LOTS: &[&str] = &[
    "19", "20", "25", "26", "41", "46", "47", "53", "54", "55", "56", "57", "58", "59", "60", "62",
    "63", "64", "65", "67", "68", "69", "70", "72", "73", "74", "75", "76", "77", "78", "79", "80",
    "81", "84", "85", "86", "87", "88", "89", "90", "91", "96", "108", "110", "114", "124", "126",
    "132", "133", "134", "135",
];

#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub site: SiteConfig,
    pub priority: PriorityConfig,
    pub gate: GateConfig,
    pub store: StoreConfig,
    pub schedule: ScheduleConfig,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct SiteConfig {
    pub listing_url: String,
    /// Detail page; the lot id is appended as the `ID` query parameter.
    pub detail_url: String,
    pub listing_selector: String,
    pub details_selector: String,
    pub indicator_selector: String,
    pub user_agent: String,
    pub timeout_secs: u64,
}

impl Default for SiteConfig {
    fn default() -> Self {
        SiteConfig {
            listing_url: String::from("https://www.ahuzot.co.il/Parking/All/"),
            detail_url: String::from("https://www.ahuzot.co.il/Parking/ParkingDetails/"),
            listing_selector: String::from("table#ctl10_data1"),
            details_selector: String::from("td.ParkingDetailsTable"),
            indicator_selector: String::from("img"),
            user_agent: format!("parkwatch/{}", env!("CARGO_PKG_VERSION")),
            timeout_secs: 30,
        }
    }
}

/// Compiled form of [`SiteConfig`]: parsed URLs and selectors.
#[derive(Debug, Clone)]
pub struct Site {
    pub listing_url: Url,
    pub detail_url: Url,
    pub listing: Selector,
    pub details: Selector,
    pub indicator: Selector,
    pub config: SiteConfig,
}

impl SiteConfig {
    pub fn compile(&self) -> Result<Site, ConfigError> {
        if self.timeout_secs == 0 {
            return Err(ConfigError::Timeout);
        }
        Ok(Site {
            listing_url: parse_url(&self.listing_url)?,
            detail_url: parse_url(&self.detail_url)?,
            listing: parse_selector(&self.listing_selector)?,
            details: parse_selector(&self.details_selector)?,
            indicator: parse_selector(&self.indicator_selector)?,
            config: self.clone(),
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct PriorityConfig {
    pub high: BTreeSet<LotId>,
}

impl Default for PriorityConfig {
    fn default() -> Self {
        PriorityConfig {
            high: NIGHT_LAYER_LOTS.iter().map(|id| LotId::from(*id)).collect(),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub names_path: PathBuf,
    pub records_path: PathBuf,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            names_path: PathBuf::from("lotNames.json"),
            records_path: PathBuf::from("lotRecords.json"),
        }
    }
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(default)]
pub struct ScheduleConfig {
    /// Minutes past each hour at which a run starts.
    pub minutes: Vec<u32>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        ScheduleConfig {
            minutes: vec![0, 30],
        }
    }
}

fn parse_url(url: &str) -> Result<Url, ConfigError> {
    Url::parse(url).map_err(|error| ConfigError::Url {
        url: String::from(url),
        message: error.to_string(),
    })
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Rejects values that would only fail once a run is under way.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.site.compile()?;
        Schedule::new(&self.schedule.minutes)?;
        self.gate.validate()
    }
}
