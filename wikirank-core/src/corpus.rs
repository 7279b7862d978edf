//! The crawled link graph.
//!
//! A [`Corpus`] maps an article path to the ordered list of article paths it
//! links to. It is shared by every crawl worker, so all operations take `&self`:
//! the map sits behind a read/write lock that is only ever held for a single
//! key operation, and the page and link counters are atomics that can be read
//! without touching the lock.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::debug;

#[derive(Debug, Default)]
pub struct Corpus {
    pages: RwLock<HashMap<String, Vec<String>>>,
    size: AtomicUsize,
    total_links: AtomicUsize,
}

impl Corpus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the outbound links of `page`, keeping both counters in step.
    pub fn set(&self, page: impl Into<String>, links: Vec<String>) {
        let added = links.len();
        let mut pages = self.write();

        match pages.insert(page.into(), links) {
            None => {
                self.size.fetch_add(1, Ordering::AcqRel);
                self.total_links.fetch_add(added, Ordering::AcqRel);
            }
            Some(previous) => {
                let removed = previous.len();
                if added >= removed {
                    self.total_links.fetch_add(added - removed, Ordering::AcqRel);
                } else {
                    self.total_links.fetch_sub(removed - added, Ordering::AcqRel);
                }
            }
        }
    }

    pub fn get(&self, page: &str) -> Option<Vec<String>> {
        self.read().get(page).cloned()
    }

    pub fn contains(&self, page: &str) -> bool {
        self.read().contains_key(page)
    }

    pub fn out_degree(&self, page: &str) -> Option<usize> {
        self.read().get(page).map(Vec::len)
    }

    /// Snapshot of the current keys, in no particular order.
    pub fn pages(&self) -> Vec<String> {
        self.read().keys().cloned().collect()
    }

    /// Visits every page present when the call started.
    ///
    /// Links are looked up per key at visit time and no lock is held while
    /// `visit` runs, so the visitor may itself call [`Corpus::set`]. A page
    /// written by another task mid-iteration may show either its old or new
    /// links.
    pub fn for_each<F>(&self, mut visit: F)
    where
        F: FnMut(&str, &[String]),
    {
        for page in self.pages() {
            if let Some(links) = self.get(&page) {
                visit(&page, &links);
            }
        }
    }

    pub fn size(&self) -> usize {
        self.size.load(Ordering::Acquire)
    }

    pub fn total_links(&self) -> usize {
        self.total_links.load(Ordering::Acquire)
    }

    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// Drops every link that points at a page missing from the corpus.
    ///
    /// Known links keep their relative order. Rewrites go through
    /// [`Corpus::set`] so the counters follow. Running it again on a repaired
    /// corpus changes nothing. Returns the number of links removed.
    pub fn enforce_consistency(&self) -> usize {
        let mut dropped = 0;

        for page in self.pages() {
            let Some(links) = self.get(&page) else {
                continue;
            };

            let (known, unknown): (Vec<String>, Vec<String>) =
                links.into_iter().partition(|link| self.contains(link));
            if unknown.is_empty() {
                continue;
            }

            debug!(
                "Dropping {} unknown links from {} ({} kept)",
                unknown.len(),
                page,
                known.len()
            );
            dropped += unknown.len();
            self.set(page, known);
        }

        dropped
    }

    /// Pages with the most outbound links, ties broken by path.
    pub fn top_by_links(&self, n: usize) -> Vec<(String, usize)> {
        let mut counts: Vec<(String, usize)> = self
            .read()
            .iter()
            .map(|(page, links)| (page.clone(), links.len()))
            .collect();

        counts.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        counts.truncate(n);
        counts
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Vec<String>>> {
        self.pages.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Vec<String>>> {
        self.pages.write().unwrap_or_else(PoisonError::into_inner)
    }
}
