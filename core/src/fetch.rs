use crate::config::CrawlConfig;
use crate::error::{EngineError, Result};
use lazy_static::lazy_static;
use reqwest::Client;
use scraper::{Html, Selector};
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::time::Duration;
use url::Url;

/// Maximum body size a fetch will hand to the parser.
const MAX_BODY_BYTES: usize = 2 * 1024 * 1024;

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
    pub headers: HashMap<String, String>,
}

impl FetchResponse {
    pub fn content_type(&self) -> Option<&str> {
        self.headers.get("content-type").map(String::as_str)
    }

    /// Missing content-type is treated as HTML; plenty of small sites never
    /// set the header.
    pub fn is_html(&self) -> bool {
        self.content_type()
            .map(|ct| ct.starts_with("text/html"))
            .unwrap_or(true)
    }
}

pub type FetchFuture<'a> = Pin<Box<dyn Future<Output = Result<FetchResponse>> + Send + 'a>>;

/// Transport capability the crawler fetches through. The engine never opens
/// sockets itself; tests substitute an in-memory implementation.
pub trait Fetcher: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a Url) -> FetchFuture<'a>;
}

/// reqwest-backed fetcher used by the binaries.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(config: &CrawlConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(5))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { client })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a Url) -> FetchFuture<'a> {
        Box::pin(async move {
            let fetch_err = |reason: String| EngineError::Fetch {
                url: url.to_string(),
                reason,
            };

            let resp = self
                .client
                .get(url.clone())
                .send()
                .await
                .map_err(|e| fetch_err(e.to_string()))?;

            let status = resp.status().as_u16();
            let mut headers = HashMap::new();
            for (name, value) in resp.headers() {
                if let Ok(v) = value.to_str() {
                    headers.insert(name.as_str().to_string(), v.to_string());
                }
            }

            let bytes = resp.bytes().await.map_err(|e| fetch_err(e.to_string()))?;
            if bytes.len() > MAX_BODY_BYTES {
                return Err(fetch_err(format!("body too large: {} bytes", bytes.len())));
            }

            Ok(FetchResponse {
                status,
                body: String::from_utf8_lossy(&bytes).into_owned(),
                headers,
            })
        })
    }
}

/// Strip the fragment; the fragment never changes the fetched page, and
/// keeping it would defeat frontier deduplication.
pub fn normalize_url(url: &Url) -> Url {
    let mut u = url.clone();
    u.set_fragment(None);
    u
}

lazy_static! {
    static ref SEL_TITLE: Selector = Selector::parse("title").expect("valid selector");
    static ref SEL_BODY: Selector = Selector::parse("body").expect("valid selector");
    static ref SEL_A: Selector = Selector::parse("a").expect("valid selector");
}

#[derive(Debug)]
pub struct Page {
    pub title: String,
    pub text: String,
    pub links: Vec<Url>,
}

/// Extract the title, the body text, and the outbound http(s) links from an
/// HTML document. Relative hrefs resolve against `base`; fragments are
/// stripped.
pub fn parse_page(base: &Url, html: &str) -> Page {
    let doc = Html::parse_document(html);

    let title = doc
        .select(&SEL_TITLE)
        .next()
        .map(|n| n.text().collect::<String>())
        .unwrap_or_default()
        .trim()
        .to_string();

    let text = doc
        .select(&SEL_BODY)
        .next()
        .map(|n| n.text().collect::<String>())
        .unwrap_or_default()
        .trim()
        .to_string();

    let mut links = Vec::new();
    for a in doc.select(&SEL_A) {
        if let Some(href) = a.value().attr("href") {
            if let Ok(u) = Url::parse(href).or_else(|_| base.join(href)) {
                if u.scheme() == "http" || u.scheme() == "https" {
                    links.push(normalize_url(&u));
                }
            }
        }
    }

    Page { title, text, links }
}
