use crate::error::{Result, ScanError};
use crate::path::{is_blacklisted, is_valid_wiki_path};
use reqwest::Client;
use scraper::{Html, Selector};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, trace};
use url::Url;

pub const WIKIPEDIA_BASE_URL: &str = "https://en.wikipedia.org";
pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Turns an article path into the ordered list of article paths it links to.
///
/// Implementations own their latency budget: the crawl orchestrator never
/// cancels a fetch, so a fetch that never resolves holds a worker slot forever.
pub trait Fetcher: Send + Sync + 'static {
    fn fetch(&self, path: &str) -> impl Future<Output = Result<Vec<String>>> + Send;
}

pub struct WikiFetcher {
    client: Client,
    base_url: Url,
}

impl WikiFetcher {
    pub fn new() -> Result<Self> {
        Self::with_timeout(DEFAULT_TIMEOUT_SECS)
    }

    pub fn with_timeout(timeout_secs: u64) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(
                "wikirank/",
                env!("CARGO_PKG_VERSION"),
                " (PageRank research crawler)"
            ))
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(timeout_secs.div_ceil(2)))
            .pool_max_idle_per_host(50)
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .redirect(reqwest::redirect::Policy::limited(5))
            .build()?;

        Ok(Self {
            client,
            base_url: Url::parse(WIKIPEDIA_BASE_URL)?,
        })
    }

    /// Points the fetcher at a different host, e.g. a mirror or a local mock server.
    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = Url::parse(base_url)?;
        Ok(self)
    }

    pub fn article_url(&self, path: &str) -> Result<Url> {
        Ok(self.base_url.join(path)?)
    }
}

impl Fetcher for WikiFetcher {
    async fn fetch(&self, path: &str) -> Result<Vec<String>> {
        let url = self.article_url(path)?;
        debug!("Fetching {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::StatusError {
                path: path.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let links = extract_article_links(&body);
        debug!("Scraped {} ({} article links)", path, links.len());
        Ok(links)
    }
}

/// Collects every article link in document order.
///
/// Anchors without an `href`, links leaving the article namespace and
/// blacklisted pages are skipped one by one; a bad anchor never fails the page.
pub fn extract_article_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let anchor_selector = Selector::parse("a").unwrap();

    let mut links = Vec::new();
    for element in document.select(&anchor_selector) {
        let Some(href) = element.value().attr("href") else {
            trace!("Skipping anchor without href");
            continue;
        };

        if !is_valid_wiki_path(href) {
            trace!("Skipping {}: not an article path", href);
            continue;
        }
        if is_blacklisted(href) {
            trace!("Skipping {}: blacklisted", href);
            continue;
        }

        links.push(href.to_string());
    }

    links
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    #[test]
    fn test_extract_keeps_document_order() {
        let html = r#"<html><body>
            <a href="/wiki/Zebra">Z</a>
            <div><a href="/wiki/Apple">A</a></div>
            <p><a href="/wiki/Zebra">Z again</a></p>
        </body></html>"#;

        let links = extract_article_links(html);
        assert_eq!(links, vec!["/wiki/Zebra", "/wiki/Apple", "/wiki/Zebra"]);
    }

    #[test]
    fn test_extract_skips_non_articles() {
        let html = r##"<html><body>
            <a>no href</a>
            <a href="#cite_note-1">footnote</a>
            <a href="/wiki/Help:Contents">help</a>
            <a href="https://example.com/wiki/Rust">external</a>
            <a href="/wiki/Main_Page">main page</a>
            <a href="/wiki/ISBN_(identifier)">isbn</a>
            <a href="/wiki/Rust_(programming_language)">rust</a>
        </body></html>"##;

        let links = extract_article_links(html);
        assert_eq!(links, vec!["/wiki/Rust_(programming_language)"]);
    }

    #[test]
    fn test_extract_empty_document() {
        assert!(extract_article_links("").is_empty());
        assert!(extract_article_links("<html><body><p>text</p></body></html>").is_empty());
    }

    #[test]
    fn test_article_url_joins_base() {
        let fetcher = WikiFetcher::new()
            .unwrap()
            .with_base_url("http://localhost:8080")
            .unwrap();
        let url = fetcher.article_url("/wiki/Rust").unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/wiki/Rust");
    }

    #[tokio::test]
    async fn test_fetch_returns_article_links() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wiki/Root"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(
                        r#"<html><body>
                            <a href="/wiki/Page_one">1</a>
                            <a href="/wiki/Page_two">2</a>
                            <a href="/wiki/Special:Random">random</a>
                        </body></html>"#,
                    ),
            )
            .mount(&mock_server)
            .await;

        let fetcher = WikiFetcher::new()
            .unwrap()
            .with_base_url(&mock_server.uri())
            .unwrap();

        let links = fetcher.fetch("/wiki/Root").await.unwrap();
        assert_eq!(links, vec!["/wiki/Page_one", "/wiki/Page_two"]);
    }

    #[tokio::test]
    async fn test_fetch_reports_http_status() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/wiki/Missing"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let fetcher = WikiFetcher::new()
            .unwrap()
            .with_base_url(&mock_server.uri())
            .unwrap();

        let err = fetcher.fetch("/wiki/Missing").await.unwrap_err();
        assert!(err.is_transport());
        assert!(matches!(err, ScanError::StatusError { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        // Nothing listens on the discard port.
        let fetcher = WikiFetcher::with_timeout(1)
            .unwrap()
            .with_base_url("http://127.0.0.1:9")
            .unwrap();

        let err = fetcher.fetch("/wiki/Anything").await.unwrap_err();
        assert!(matches!(err, ScanError::HttpError(_)));
    }
}
