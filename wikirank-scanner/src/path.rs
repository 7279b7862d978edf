//! Article path validation.
//!
//! Only same-site article paths of the form `/wiki/<Title>` are ever followed.
//! Titles are restricted to the characters Wikipedia uses in canonical,
//! percent-encoded article links, which rules out namespaces such as
//! `/wiki/File:...` or `/wiki/Special:...` (they contain a colon).

use crate::error::{Result, ScanError};
use regex::Regex;
use std::sync::LazyLock;

pub const ARTICLE_PATH_PATTERN: &str = r"^/wiki/[A-Za-z0-9_()%-]+$";

static ARTICLE_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(ARTICLE_PATH_PATTERN).expect("article path pattern compiles"));

/// Pages that are linked from nearly every article and would dominate any ranking.
const BLACKLIST: [&str; 2] = ["/wiki/Main_Page", "/wiki/Wayback_Machine"];

pub fn is_valid_wiki_path(path: &str) -> bool {
    ARTICLE_PATH.is_match(path)
}

pub fn is_blacklisted(path: &str) -> bool {
    BLACKLIST.contains(&path) || path.contains("_(identifier)")
}

/// Checks a user supplied root path, returning it unchanged when it is a valid article path.
pub fn validate_wiki_path(path: &str) -> Result<&str> {
    if is_valid_wiki_path(path) {
        Ok(path)
    } else {
        Err(ScanError::InvalidPath(path.to_string()))
    }
}
