use crate::corpus::Corpus;
use crate::error::CrawlError;
use crate::frontier::Frontier;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{debug, info, trace, warn};
use wikirank_scanner::Fetcher;

/// Called after every page written to the corpus with the new corpus size and the page path.
pub type ProgressCallback = Arc<dyn Fn(usize, String) + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlSettings {
    /// Page budget. Also the frontier capacity.
    pub pages: usize,
    /// Maximum number of workers fetching at once.
    pub concurrency: usize,
}

/// Expands a root article into a corpus of at most `pages` articles.
///
/// The crawl runs in three passes:
///
/// 1. **Seed**: one worker fetches the root so the frontier has something in it.
/// 2. **Bulk**: up to `pages - 1` workers are launched one at a time, each
///    holding one of `concurrency` slots. Whenever the frontier looks empty
///    after a launch, every in-flight worker is awaited; if it is still empty
///    the reachable graph is exhausted and the crawl ends early.
/// 3. **Backfill**: waves of `min(concurrency, pages - size, queued)` workers
///    pick up paths queued after their producers had finished, until the
///    budget is met or nothing is queued.
///
/// A failed fetch only loses that page. It is never retried and the page is
/// never written to the corpus.
pub struct Crawler<F: Fetcher> {
    fetcher: Arc<F>,
    settings: CrawlSettings,
    progress_callback: Option<ProgressCallback>,
}

impl<F: Fetcher> Crawler<F> {
    pub fn new(fetcher: Arc<F>, settings: CrawlSettings) -> Self {
        Self {
            fetcher,
            settings,
            progress_callback: None,
        }
    }

    pub fn with_progress_callback(mut self, callback: ProgressCallback) -> Self {
        self.progress_callback = Some(callback);
        self
    }

    pub fn settings(&self) -> CrawlSettings {
        self.settings
    }

    pub async fn crawl(&self, root: &str) -> Result<Arc<Corpus>, CrawlError> {
        let CrawlSettings { pages, concurrency } = self.settings;
        info!(
            "Starting crawl of {} with a budget of {} pages and {} workers",
            root, pages, concurrency
        );

        if concurrency == 0 {
            return Err(CrawlError::NoWorkers);
        }

        let frontier = Arc::new(Frontier::new(pages));
        if !frontier.enqueue(root) {
            return Err(CrawlError::RootRejected(root.to_string()));
        }

        let mut pool = WorkerPool {
            slots: Arc::new(Semaphore::new(concurrency)),
            in_flight: JoinSet::new(),
            corpus: Arc::new(Corpus::new()),
            frontier,
        };

        debug!("Starting seed pass");
        self.launch(&mut pool).await?;
        pool.wait().await;

        debug!("Starting bulk pass");
        for _ in 1..pages {
            self.launch(&mut pool).await?;

            if pool.frontier.is_empty() {
                debug!(
                    "Frontier is empty, waiting for {} in-flight workers",
                    pool.in_flight.len()
                );
                pool.wait().await;

                if pool.frontier.is_empty() {
                    info!(
                        "Frontier exhausted, returning corpus of {} pages",
                        pool.corpus.size()
                    );
                    return Ok(pool.corpus);
                }
            }
        }
        pool.wait().await;

        debug!("Starting backfill pass");
        let mut wave = 0;
        loop {
            let workers = concurrency
                .min(pages.saturating_sub(pool.corpus.size()))
                .min(pool.frontier.len());
            if workers == 0 {
                break;
            }

            wave += 1;
            debug!("Backfill wave {} with {} workers", wave, workers);
            for _ in 0..workers {
                self.launch(&mut pool).await?;
            }
            pool.wait().await;
        }

        info!(
            "Crawl complete: {} pages, {} links",
            pool.corpus.size(),
            pool.corpus.total_links()
        );
        Ok(pool.corpus)
    }

    /// Waits for a free slot, then spawns one worker that owns it until it finishes.
    async fn launch(&self, pool: &mut WorkerPool) -> Result<(), CrawlError> {
        let permit = pool.slots.clone().acquire_owned().await?;

        let worker = Worker {
            fetcher: self.fetcher.clone(),
            frontier: pool.frontier.clone(),
            corpus: pool.corpus.clone(),
            progress_callback: self.progress_callback.clone(),
        };

        pool.in_flight.spawn(async move {
            worker.run().await;
            drop(permit);
        });
        Ok(())
    }
}

struct WorkerPool {
    slots: Arc<Semaphore>,
    in_flight: JoinSet<()>,
    corpus: Arc<Corpus>,
    frontier: Arc<Frontier>,
}

impl WorkerPool {
    /// Barrier: returns once every launched worker has finished.
    async fn wait(&mut self) {
        while let Some(joined) = self.in_flight.join_next().await {
            if let Err(e) = joined {
                warn!("Crawl worker failed: {}", e);
            }
        }
    }
}

struct Worker<F: Fetcher> {
    fetcher: Arc<F>,
    frontier: Arc<Frontier>,
    corpus: Arc<Corpus>,
    progress_callback: Option<ProgressCallback>,
}

impl<F: Fetcher> Worker<F> {
    async fn run(self) {
        let Some(path) = self.frontier.dequeue() else {
            debug!("Frontier is empty, worker has nothing to do");
            return;
        };

        let links = match self.fetcher.fetch(&path).await {
            Ok(links) => links,
            Err(e) if e.is_transport() => {
                warn!("Failed to fetch {}: {}", path, e);
                return;
            }
            Err(e) => {
                debug!("Skipping {}: {}", path, e);
                return;
            }
        };

        debug!("Setting {} links for {} in corpus", links.len(), path);
        self.corpus.set(path.clone(), links.clone());

        if let Some(ref callback) = self.progress_callback {
            callback(self.corpus.size(), path.clone());
        }

        for link in &links {
            if self.frontier.is_full() {
                debug!("Frontier is full, not queueing the rest of {}", path);
                break;
            }
            if self.frontier.enqueue(link) {
                trace!("Queued {}", link);
            } else {
                trace!("Skipping {}: already seen", link);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use wikirank_scanner::{Result, ScanError};

    struct MapFetcher(HashMap<String, Vec<String>>);

    impl Fetcher for MapFetcher {
        async fn fetch(&self, path: &str) -> Result<Vec<String>> {
            self.0
                .get(path)
                .cloned()
                .ok_or_else(|| ScanError::StatusError {
                    path: path.to_string(),
                    status: 404,
                })
        }
    }

    fn fetcher(edges: &[(&str, &[&str])]) -> Arc<MapFetcher> {
        Arc::new(MapFetcher(
            edges
                .iter()
                .map(|(page, links)| {
                    (
                        page.to_string(),
                        links.iter().map(|l| l.to_string()).collect(),
                    )
                })
                .collect(),
        ))
    }

    #[tokio::test]
    async fn test_single_page_crawl() {
        let crawler = Crawler::new(
            fetcher(&[("/wiki/Root", &[])]),
            CrawlSettings {
                pages: 5,
                concurrency: 2,
            },
        );

        let corpus = crawler.crawl("/wiki/Root").await.unwrap();
        assert_eq!(corpus.size(), 1);
        assert_eq!(corpus.get("/wiki/Root"), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_root_fetch_failure_yields_empty_corpus() {
        let crawler = Crawler::new(
            fetcher(&[]),
            CrawlSettings {
                pages: 5,
                concurrency: 2,
            },
        );

        let corpus = crawler.crawl("/wiki/Root").await.unwrap();
        assert!(corpus.is_empty());
    }

    #[tokio::test]
    async fn test_zero_budget_rejects_root() {
        let crawler = Crawler::new(
            fetcher(&[("/wiki/Root", &[])]),
            CrawlSettings {
                pages: 0,
                concurrency: 2,
            },
        );

        let err = crawler.crawl("/wiki/Root").await.unwrap_err();
        assert!(matches!(err, CrawlError::RootRejected(_)));
    }

    #[tokio::test]
    async fn test_zero_concurrency_is_an_error() {
        let crawler = Crawler::new(
            fetcher(&[("/wiki/Root", &[])]),
            CrawlSettings {
                pages: 5,
                concurrency: 0,
            },
        );

        let err = crawler.crawl("/wiki/Root").await.unwrap_err();
        assert!(matches!(err, CrawlError::NoWorkers));
    }

    #[tokio::test]
    async fn test_progress_callback_sees_every_page() {
        let seen = Arc::new(std::sync::Mutex::new(Vec::new()));
        let seen_clone = seen.clone();

        let crawler = Crawler::new(
            fetcher(&[
                ("/wiki/Root", &["/wiki/A", "/wiki/B"]),
                ("/wiki/A", &["/wiki/Root"]),
                ("/wiki/B", &[]),
            ]),
            CrawlSettings {
                pages: 10,
                concurrency: 2,
            },
        )
        .with_progress_callback(Arc::new(move |_size, path| {
            seen_clone.lock().unwrap().push(path);
        }));

        let corpus = crawler.crawl("/wiki/Root").await.unwrap();
        assert_eq!(corpus.size(), 3);

        let mut seen = seen.lock().unwrap().clone();
        seen.sort();
        assert_eq!(seen, vec!["/wiki/A", "/wiki/B", "/wiki/Root"]);
    }
}
