pub mod error;
pub mod fetcher;
pub mod path;

pub use error::{Result, ScanError};
pub use fetcher::{Fetcher, WikiFetcher, extract_article_links};
pub use path::{is_blacklisted, is_valid_wiki_path, validate_wiki_path};
