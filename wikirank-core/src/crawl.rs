use crate::corpus::Corpus;
use crate::crawler::{CrawlSettings, Crawler, ProgressCallback};
use crate::error::CrawlError;
use crate::pagerank::{self, RankDistribution, RankSettings};
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;
use wikirank_scanner::Fetcher;

/// Options for configuring a crawl operation
pub struct CrawlOptions {
    pub root: String,
    pub settings: CrawlSettings,
    pub show_progress_bars: bool,
}

/// A ticking spinner labelled with the phase currently running.
pub fn work_in_progress(label: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    spinner.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg} [{elapsed}]")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    spinner.set_message(label.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Execute a crawl with the given options
/// Returns the crawled corpus, which may be smaller than the page budget.
pub async fn execute_crawl<F: Fetcher>(
    options: CrawlOptions,
    fetcher: F,
) -> Result<Arc<Corpus>, CrawlError> {
    let CrawlOptions {
        root,
        settings,
        show_progress_bars,
    } = options;

    let progress_bar = show_progress_bars.then(|| work_in_progress("Building corpus"));

    let progress_callback: ProgressCallback = match progress_bar.clone() {
        Some(pb) => Arc::new(move |size: usize, path: String| {
            pb.set_message(format!(
                "Building corpus... {}/{} pages ({})",
                size, settings.pages, path
            ));
        }),
        // No-op callback when progress bars are disabled
        None => Arc::new(|_size: usize, _path: String| {}),
    };

    let crawler =
        Crawler::new(Arc::new(fetcher), settings).with_progress_callback(progress_callback);
    let result = crawler.crawl(&root).await;

    if let Some(pb) = progress_bar {
        match &result {
            Ok(corpus) => pb.finish_with_message(format!(
                "Corpus built: {} pages, {} cross-references",
                corpus.size(),
                corpus.total_links()
            )),
            Err(e) => pb.abandon_with_message(format!("Crawl failed: {}", e)),
        }
    }

    result
}

/// Repairs the corpus and ranks it.
pub fn execute_ranking(
    corpus: &Corpus,
    settings: RankSettings,
    show_progress_bars: bool,
) -> RankDistribution {
    let progress_bar = show_progress_bars.then(|| work_in_progress("Calculating PageRank"));

    let dropped = corpus.enforce_consistency();
    info!(
        "Removed {} links to pages outside the corpus ({} remain)",
        dropped,
        corpus.total_links()
    );

    let ranks = pagerank::compute(corpus, settings);

    if let Some(pb) = progress_bar {
        pb.finish_with_message(format!(
            "PageRank calculated in {} sweeps",
            ranks.iterations()
        ));
    }

    ranks
}
