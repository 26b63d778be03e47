//! S&P 500 constituents, scraped from the public list page and cached on disk.
//!
//! The cache is a plain CSV plus a small JSON sidecar recording when and from
//! where it was fetched. It is considered stale after
//! `universe.cache_max_age_hours`.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration, Utc};
use reqwest::Client;
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::{ProviderConfig, UniverseConfig};

const CACHE_FILENAME: &str = "sp500.csv";
const META_FILENAME: &str = "sp500.meta.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Constituent {
    #[serde(rename = "Symbol")]
    pub symbol: String,
    #[serde(rename = "Security")]
    pub security: String,
    #[serde(rename = "Sector")]
    pub sector: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UniverseMeta {
    pub fetched_at: DateTime<Utc>,
    pub source_url: String,
    pub count: usize,
}

/// Where the constituent cache lives: config override or `<cache_home>/breakeven/universe`
pub fn cache_dir(config: &UniverseConfig) -> Result<PathBuf> {
    if let Some(dir) = &config.cache_dir {
        return Ok(dir.clone());
    }
    let cache_dir = dir_spec::cache_home()
        .ok_or_else(|| anyhow!("Could not determine cache directory"))?;
    Ok(cache_dir.join("breakeven").join("universe"))
}

/// Extract constituents from the list page's `table#constituents`
pub fn parse_constituents(html: &str) -> Result<Vec<Constituent>> {
    let document = Html::parse_document(html);
    let table_sel = Selector::parse("table#constituents").map_err(|e| anyhow!("{e}"))?;
    let row_sel = Selector::parse("tr").map_err(|e| anyhow!("{e}"))?;
    let cell_sel = Selector::parse("td").map_err(|e| anyhow!("{e}"))?;

    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| anyhow!("constituents table not found"))?;

    let mut constituents = Vec::new();
    for row in table.select(&row_sel) {
        let cells: Vec<String> = row
            .select(&cell_sel)
            .map(|cell| cell.text().collect::<String>().trim().to_string())
            .collect();
        // Header row has only <th> cells
        if cells.len() < 3 || cells[0].is_empty() {
            continue;
        }
        constituents.push(Constituent {
            symbol: cells[0].to_uppercase(),
            security: cells[1].clone(),
            sector: cells[2].clone(),
        });
    }

    if constituents.is_empty() {
        return Err(anyhow!("constituents table has no rows"));
    }
    Ok(constituents)
}

pub fn read_meta(dir: &Path) -> Result<Option<UniverseMeta>> {
    let meta_path = dir.join(META_FILENAME);
    if !meta_path.exists() {
        return Ok(None);
    }
    let bytes = fs::read(&meta_path).context("Failed to read universe metadata")?;
    let meta = serde_json::from_slice(&bytes).context("Failed to parse universe metadata")?;
    Ok(Some(meta))
}

/// True when there is no cache or it is older than `max_age_hours`
pub fn cache_is_stale(dir: &Path, max_age_hours: i64) -> Result<bool> {
    if !dir.join(CACHE_FILENAME).exists() {
        return Ok(true);
    }
    match read_meta(dir)? {
        Some(meta) => Ok(Utc::now() - meta.fetched_at > Duration::hours(max_age_hours)),
        None => Ok(true),
    }
}

pub fn load_cached(dir: &Path) -> Result<Vec<Constituent>> {
    let csv_path = dir.join(CACHE_FILENAME);
    let mut reader = csv::Reader::from_path(&csv_path)
        .with_context(|| format!("Failed to read cached constituents {}", csv_path.display()))?;
    let constituents = reader
        .deserialize()
        .collect::<std::result::Result<Vec<Constituent>, _>>()
        .context("Failed to parse cached constituents")?;
    debug!("Loaded {} constituents from cache", constituents.len());
    Ok(constituents)
}

/// Write the list and its metadata; the CSV is replaced atomically
pub fn store(dir: &Path, constituents: &[Constituent], source_url: &str) -> Result<()> {
    fs::create_dir_all(dir).context("Failed to create universe cache directory")?;

    let csv_path = dir.join(CACHE_FILENAME);
    let tmp_path = dir.join(format!("{}.tmp", CACHE_FILENAME));
    {
        let mut writer = csv::Writer::from_path(&tmp_path).context("Failed to write constituents")?;
        for constituent in constituents {
            writer.serialize(constituent)?;
        }
        writer.flush()?;
    }
    fs::rename(&tmp_path, &csv_path).context("Failed to finalize constituents cache file")?;

    let meta = UniverseMeta {
        fetched_at: Utc::now(),
        source_url: source_url.to_string(),
        count: constituents.len(),
    };
    fs::write(dir.join(META_FILENAME), serde_json::to_vec_pretty(&meta)?)
        .context("Failed to write universe metadata")?;
    Ok(())
}

/// Download and parse the list page
pub async fn download(config: &UniverseConfig, provider: &ProviderConfig) -> Result<Vec<Constituent>> {
    info!("Downloading S&P 500 constituents from {}", config.source_url);
    let client = Client::builder()
        .user_agent(provider.user_agent.as_str())
        .timeout(std::time::Duration::from_secs(provider.timeout_secs))
        .build()?;
    let html = client
        .get(&config.source_url)
        .send()
        .await
        .context("Failed to request constituents page")?
        .error_for_status()
        .context("Constituents page returned an error status")?
        .text()
        .await
        .context("Failed to read constituents page")?;
    parse_constituents(&html)
}

/// Download, cache and return the current list
pub async fn refresh(config: &UniverseConfig, provider: &ProviderConfig) -> Result<Vec<Constituent>> {
    let dir = cache_dir(config)?;
    let constituents = download(config, provider).await?;
    store(&dir, &constituents, &config.source_url)?;
    info!("Cached {} constituents in {}", constituents.len(), dir.display());
    Ok(constituents)
}

/// Cached list if fresh, otherwise a fresh download. A failed download falls
/// back to a stale cache when one exists.
pub async fn load(
    config: &UniverseConfig,
    provider: &ProviderConfig,
    allow_network: bool,
) -> Result<Vec<Constituent>> {
    let dir = cache_dir(config)?;
    let has_cache = dir.join(CACHE_FILENAME).exists();

    if !allow_network || !cache_is_stale(&dir, config.cache_max_age_hours)? {
        if !has_cache {
            return Err(anyhow!(
                "No cached S&P 500 list in {} and network access is disabled",
                dir.display()
            ));
        }
        return load_cached(&dir);
    }

    match refresh(config, provider).await {
        Ok(list) => Ok(list),
        Err(e) if has_cache => {
            warn!("Refreshing S&P 500 list failed ({:#}); using stale cache", e);
            load_cached(&dir)
        }
        Err(e) => Err(e),
    }
}
