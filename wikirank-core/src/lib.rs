pub mod config;
pub mod corpus;
pub mod crawl;
pub mod crawler;
pub mod error;
pub mod frontier;
pub mod pagerank;
pub mod report;

pub use config::Config;
pub use corpus::Corpus;
pub use crawl::{CrawlOptions, execute_crawl, execute_ranking, work_in_progress};
pub use crawler::{CrawlSettings, Crawler, ProgressCallback};
pub use error::{ConfigError, CrawlError, ReportError};
pub use frontier::Frontier;
pub use pagerank::{RankDistribution, RankSettings};
pub use report::{ReportData, ReportFormat};
