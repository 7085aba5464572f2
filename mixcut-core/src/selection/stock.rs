//! Secondary stock-footage pool.
//!
//! When the primary clip source cannot cover the narration target, the
//! selector asks a remote stock provider for the shortfall. The provider
//! kind is a string in user configuration; it is resolved exactly once at
//! job construction into a trait object injected into the selector.

use crate::error::{CoreError, CoreResult};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Remote pool of candidate footage, queried for a duration shortfall.
pub trait StockFootageProvider: Send + Sync {
    /// Downloads candidates for `query` into `dest_dir` until their summed
    /// duration reaches `need_secs` or results run out. Returns the local
    /// paths in download order.
    fn fetch(&self, query: &str, need_secs: f64, dest_dir: &Path) -> CoreResult<Vec<PathBuf>>;
}

/// Resolves a provider name from configuration into a concrete provider.
pub fn resolve_provider(
    name: &str,
    api_key: String,
) -> CoreResult<Box<dyn StockFootageProvider>> {
    match name.to_ascii_lowercase().as_str() {
        "pexels" => Ok(Box::new(PexelsProvider::new(api_key)?)),
        other => Err(CoreError::InvalidConfig(format!(
            "unknown stock footage provider '{other}'"
        ))),
    }
}

// ---- Pexels ----

const PEXELS_SEARCH_URL: &str = "https://api.pexels.com/videos/search";
const SEARCH_PAGE_LIMIT: u32 = 5;
const PAGE_SIZE: u32 = 10;

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    videos: Vec<StockVideo>,
}

#[derive(Debug, Deserialize)]
struct StockVideo {
    id: u64,
    duration: f64,
    #[serde(default)]
    video_files: Vec<StockFile>,
}

#[derive(Debug, Deserialize)]
struct StockFile {
    link: String,
    #[serde(default)]
    width: Option<u32>,
}

/// Pexels video search API client.
pub struct PexelsProvider {
    api_key: String,
    client: reqwest::blocking::Client,
}

impl PexelsProvider {
    pub fn new(api_key: String) -> CoreResult<Self> {
        if api_key.is_empty() {
            return Err(CoreError::InvalidConfig(
                "pexels provider requires an API key".to_string(),
            ));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| CoreError::Http(e.to_string()))?;
        Ok(PexelsProvider { api_key, client })
    }

    fn search(&self, query: &str, page: u32) -> CoreResult<SearchResponse> {
        let response = self
            .client
            .get(PEXELS_SEARCH_URL)
            .header("Authorization", &self.api_key)
            .query(&[
                ("query", query.to_string()),
                ("per_page", PAGE_SIZE.to_string()),
                ("page", page.to_string()),
            ])
            .send()
            .map_err(|e| CoreError::Http(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CoreError::Http(format!(
                "pexels search returned {}",
                response.status()
            )));
        }
        response
            .json::<SearchResponse>()
            .map_err(|e| CoreError::JsonParse(e.to_string()))
    }

    fn download(&self, video: &StockVideo, dest_dir: &Path) -> CoreResult<PathBuf> {
        // Widest rendition wins; the normalizer scales it down to target.
        let file = video
            .video_files
            .iter()
            .max_by_key(|f| f.width.unwrap_or(0))
            .ok_or_else(|| CoreError::Http(format!("pexels video {} has no files", video.id)))?;

        let response = self
            .client
            .get(&file.link)
            .send()
            .map_err(|e| CoreError::Http(e.to_string()))?;
        if !response.status().is_success() {
            return Err(CoreError::Http(format!(
                "pexels download returned {}",
                response.status()
            )));
        }
        let bytes = response.bytes().map_err(|e| CoreError::Http(e.to_string()))?;

        let dest = dest_dir.join(format!("stock_{}.mp4", video.id));
        fs::write(&dest, &bytes)?;
        Ok(dest)
    }
}

impl StockFootageProvider for PexelsProvider {
    fn fetch(&self, query: &str, need_secs: f64, dest_dir: &Path) -> CoreResult<Vec<PathBuf>> {
        let mut downloaded = Vec::new();
        let mut covered = 0.0;

        'pages: for page in 1..=SEARCH_PAGE_LIMIT {
            let results = self.search(query, page)?;
            if results.videos.is_empty() {
                break;
            }
            for video in &results.videos {
                match self.download(video, dest_dir) {
                    Ok(path) => {
                        covered += video.duration;
                        downloaded.push(path);
                    }
                    Err(err) => {
                        log::warn!("skipping stock video {}: {err}", video.id);
                        continue;
                    }
                }
                if covered >= need_secs {
                    break 'pages;
                }
            }
        }

        log::info!(
            "stock provider returned {} clips covering {covered:.1}s of a {need_secs:.1}s shortfall",
            downloaded.len()
        );
        Ok(downloaded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_provider_is_rejected() {
        assert!(resolve_provider("istock", "key".to_string()).is_err());
    }

    #[test]
    fn pexels_requires_api_key() {
        assert!(PexelsProvider::new(String::new()).is_err());
    }

    #[test]
    fn search_response_tolerates_missing_fields() {
        let parsed: SearchResponse = serde_json::from_str(
            r#"{"videos": [{"id": 7, "duration": 12.0,
                 "video_files": [{"link": "https://x/y.mp4", "width": 1920}]}]}"#,
        )
        .unwrap();
        assert_eq!(parsed.videos.len(), 1);
        assert_eq!(parsed.videos[0].id, 7);

        let empty: SearchResponse = serde_json::from_str("{}").unwrap();
        assert!(empty.videos.is_empty());
    }
}
