use crate::error::Result;
use serde::Deserialize;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Crawl tuning. All values have working defaults; binaries override them
/// from flags, the server from its JSON config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Stop after this many pages have been taken off the frontier.
    pub max_pages: usize,
    /// Worker pool size; 0 means one worker per available core.
    pub workers: usize,
    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
    pub user_agent: String,
    /// Only follow links that stay on the linking page's host.
    pub same_host_only: bool,
    /// Cap on pages admitted to the frontier per host; 0 means unlimited.
    pub max_per_host: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_pages: 1000,
            workers: 0,
            timeout_secs: 12,
            user_agent: "scour-bot/0.1 (+https://example.com/bot)".to_string(),
            same_host_only: false,
            max_per_host: 0,
        }
    }
}

impl CrawlConfig {
    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 {
            num_cpus::get()
        } else {
            self.workers
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub index_dir: PathBuf,
    /// Bound on the update queue; producers wait once it is full.
    pub queue_capacity: usize,
    pub crawl: CrawlConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("./index"),
            queue_capacity: 1024,
            crawl: CrawlConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let cfg = serde_json::from_reader(BufReader::new(File::open(path)?))?;
        Ok(cfg)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn partial_config_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scour.json");
        let mut f = File::create(&path).unwrap();
        f.write_all(br#"{"queue_capacity": 8, "crawl": {"max_pages": 3}}"#)
            .unwrap();

        let cfg = EngineConfig::from_file(&path).unwrap();
        assert_eq!(cfg.queue_capacity, 8);
        assert_eq!(cfg.crawl.max_pages, 3);
        assert_eq!(cfg.crawl.timeout_secs, CrawlConfig::default().timeout_secs);
    }
}
