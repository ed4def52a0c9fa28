use crate::config::CrawlConfig;
use crate::error::{EngineError, Result};
use crate::fetch::{self, Fetcher};
use crate::index::Document;
use crate::tokenizer::tokenize;
use crate::updater::{UpdateSender, UpdateTask};
use parking_lot::Mutex;
use serde::Serialize;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use url::Url;

#[derive(Debug, Clone, Serialize)]
pub struct CrawlStats {
    /// Pages taken off the frontier for fetching (successful or not).
    pub fetched: usize,
    /// Documents handed to the update queue.
    pub indexed: usize,
    /// URLs ever admitted to the frontier.
    pub discovered: usize,
    /// URLs still queued when the page cap cut the crawl short.
    pub frontier_remaining: usize,
}

#[derive(Default)]
struct CrawlState {
    frontier: VecDeque<Url>,
    discovered: HashSet<String>,
    per_host: HashMap<String, usize>,
    crawled: usize,
    indexed: usize,
}

/// Concurrent page discovery over a shared frontier.
///
/// A fixed pool of workers drains the frontier; each worker pops under the
/// state lock, fetches with no lock held, and feeds newly discovered links
/// back. A URL enters the discovered set in the same critical section that
/// pushes it, so no URL is ever queued twice. Indexing goes through the
/// update queue; the crawler never touches the index.
pub struct Crawler {
    fetcher: Arc<dyn Fetcher>,
    updates: UpdateSender,
    config: CrawlConfig,
    state: Mutex<CrawlState>,
}

impl Crawler {
    pub fn new(fetcher: Arc<dyn Fetcher>, updates: UpdateSender, config: CrawlConfig) -> Self {
        Self {
            fetcher,
            updates,
            config,
            state: Mutex::new(CrawlState::default()),
        }
    }

    /// Seed the frontier and run the worker pool until every worker has
    /// observed an empty frontier or the page cap.
    ///
    /// Individual malformed seeds are skipped with a warning; an entirely
    /// invalid non-empty seed list is an error. No seeds at all is a no-op.
    pub async fn run(self: Arc<Self>, seeds: Vec<String>) -> Result<CrawlStats> {
        let mut admitted = 0;
        {
            let mut state = self.state.lock();
            for seed in &seeds {
                match parse_seed(seed) {
                    Some(url) => {
                        if Self::admit_locked(&mut state, &self.config, url) {
                            admitted += 1;
                        }
                    }
                    None => tracing::warn!(%seed, "skipping malformed seed url"),
                }
            }
        }
        if admitted == 0 {
            if seeds.is_empty() {
                return Ok(self.stats());
            }
            return Err(EngineError::InvalidInput(
                "no valid seed urls".to_string(),
            ));
        }

        let workers = self.config.effective_workers();
        tracing::info!(
            seeds = admitted,
            workers,
            max_pages = self.config.max_pages,
            "starting crawl"
        );

        let mut handles = Vec::with_capacity(workers);
        for worker in 0..workers {
            let crawler = Arc::clone(&self);
            handles.push(tokio::spawn(async move {
                crawler.worker_loop(worker).await;
            }));
        }
        for handle in handles {
            if let Err(err) = handle.await {
                tracing::warn!(%err, "crawl worker panicked");
            }
        }

        let stats = self.stats();
        tracing::info!(
            fetched = stats.fetched,
            indexed = stats.indexed,
            discovered = stats.discovered,
            "crawl finished"
        );
        Ok(stats)
    }

    /// Workers terminate individually: an empty frontier or the page cap ends
    /// this worker only, and the pool drains naturally.
    async fn worker_loop(&self, worker: usize) {
        loop {
            let url = {
                let mut state = self.state.lock();
                if state.crawled >= self.config.max_pages {
                    break;
                }
                match state.frontier.pop_front() {
                    Some(url) => {
                        state.crawled += 1;
                        url
                    }
                    None => break,
                }
            };

            // Fetch with no lock held; a failure is local to this URL.
            match self.fetcher.fetch(&url).await {
                Ok(resp) if resp.status == 200 => {
                    if resp.is_html() {
                        self.process_page(&url, &resp.body).await;
                    } else {
                        tracing::debug!(%url, "skipping non-html page");
                    }
                }
                Ok(resp) => tracing::debug!(%url, status = resp.status, "dropping page"),
                Err(err) => tracing::debug!(%url, %err, "fetch failed"),
            }
        }
        tracing::debug!(worker, "crawl worker exiting");
    }

    async fn process_page(&self, url: &Url, body: &str) {
        let page = fetch::parse_page(url, body);
        let tokens = tokenize(&page.text);

        {
            let mut state = self.state.lock();
            for link in page.links {
                if self.config.same_host_only && link.host_str() != url.host_str() {
                    continue;
                }
                Self::admit_locked(&mut state, &self.config, link);
            }
        }

        let doc = Document {
            id: 0, // assigned by the manager
            url: url.to_string(),
            title: page.title,
            tokens,
        };
        if self.updates.enqueue(UpdateTask::Add(doc)).await.is_ok() {
            self.state.lock().indexed += 1;
        } else {
            tracing::warn!(%url, "update queue closed, page not indexed");
        }
    }

    /// Atomic check-and-insert into the discovered set plus the frontier
    /// push. Must be called with the state lock held.
    fn admit_locked(state: &mut CrawlState, config: &CrawlConfig, url: Url) -> bool {
        let key = url.to_string();
        if state.discovered.contains(&key) {
            return false;
        }
        if config.max_per_host > 0 {
            if let Some(host) = url.host_str() {
                let admitted = state.per_host.entry(host.to_string()).or_insert(0);
                if *admitted >= config.max_per_host {
                    return false;
                }
                *admitted += 1;
            }
        }
        state.discovered.insert(key);
        state.frontier.push_back(url);
        true
    }

    fn stats(&self) -> CrawlStats {
        let state = self.state.lock();
        CrawlStats {
            fetched: state.crawled,
            indexed: state.indexed,
            discovered: state.discovered.len(),
            frontier_remaining: state.frontier.len(),
        }
    }
}

fn parse_seed(seed: &str) -> Option<Url> {
    let s = seed.trim();
    if s.is_empty() {
        return None;
    }
    Url::parse(s)
        .or_else(|_| Url::parse(&format!("https://{s}")))
        .ok()
        .filter(|u| u.scheme() == "http" || u.scheme() == "https")
        .map(|u| fetch::normalize_url(&u))
}
