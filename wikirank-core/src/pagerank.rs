//! Power-iteration PageRank over a repaired [`Corpus`].
//!
//! Every page starts at `1/N`. A sweep recomputes every page from the
//! previous sweep's ranks only:
//!
//! ```text
//! rank'(p) = (1 - d)/N + d * ( Σ rank(q) * links(q→p) / out(q)  +  Σ rank(z)/N )
//!                              q links to p                       z dangling
//! ```
//!
//! A dangling page (no outbound links) behaves as if it linked to every page,
//! itself included. Sweeps stop after the first complete sweep in which no
//! page moved by `threshold` or more, then ranks are divided by their sum so
//! the distribution adds up to exactly 1.
//!
//! The corpus must have been through [`Corpus::enforce_consistency`]: links
//! to unknown pages still count towards `out(q)` but feed no page, so their
//! share would only come back through the final normalization.

use crate::corpus::Corpus;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RankSettings {
    pub damping: f64,
    pub threshold: f64,
    pub max_iterations: usize,
}

impl Default for RankSettings {
    fn default() -> Self {
        Self {
            damping: 0.85,
            threshold: 0.0001,
            max_iterations: 1000,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct RankDistribution {
    ranks: HashMap<String, f64>,
    iterations: usize,
    converged: bool,
}

impl RankDistribution {
    pub fn get(&self, page: &str) -> Option<f64> {
        self.ranks.get(page).copied()
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }

    pub fn sum(&self) -> f64 {
        self.ranks.values().sum()
    }

    /// Number of sweeps performed.
    pub fn iterations(&self) -> usize {
        self.iterations
    }

    /// False when the sweep limit was hit before the threshold was met.
    pub fn converged(&self) -> bool {
        self.converged
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.ranks.iter().map(|(page, rank)| (page.as_str(), *rank))
    }

    /// All pages, highest rank first, ties broken by path.
    pub fn sorted(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        ranked
    }

    pub fn top(&self, n: usize) -> Vec<(&str, f64)> {
        let mut ranked = self.sorted();
        ranked.truncate(n);
        ranked
    }
}

/// Index-based view of the corpus with the reverse links precomputed.
///
/// Built in one pass over every `(page, link)` pair. A page that links to the
/// same target several times appears once in the target's inbound list, with
/// that multiplicity, so the weights agree with `out_degree = links.len()`.
#[derive(Debug)]
pub struct LinkGraph {
    pages: Vec<String>,
    out_degree: Vec<usize>,
    inbound: Vec<Vec<(usize, usize)>>,
}

impl LinkGraph {
    pub fn from_corpus(corpus: &Corpus) -> Self {
        let mut pages = corpus.pages();
        pages.sort();

        let index: HashMap<&str, usize> = pages
            .iter()
            .enumerate()
            .map(|(i, page)| (page.as_str(), i))
            .collect();

        let mut out_degree = vec![0; pages.len()];
        let mut inbound: Vec<Vec<(usize, usize)>> = vec![Vec::new(); pages.len()];

        for (source, page) in pages.iter().enumerate() {
            let links = corpus.get(page).unwrap_or_default();
            out_degree[source] = links.len();

            let mut multiplicity: HashMap<usize, usize> = HashMap::new();
            for link in &links {
                if let Some(&target) = index.get(link.as_str()) {
                    *multiplicity.entry(target).or_default() += 1;
                }
            }
            for (target, count) in multiplicity {
                inbound[target].push((source, count));
            }
        }

        Self {
            pages,
            out_degree,
            inbound,
        }
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    /// Pages linking to `page`, sorted by path.
    pub fn inbound_pages(&self, page: &str) -> Vec<&str> {
        let Ok(target) = self.pages.binary_search_by(|p| p.as_str().cmp(page)) else {
            return Vec::new();
        };

        let mut sources: Vec<&str> = self.inbound[target]
            .iter()
            .map(|&(source, _)| self.pages[source].as_str())
            .collect();
        sources.sort_unstable();
        sources
    }

    fn sweep(&self, ranks: &[f64], damping: f64, next: &mut [f64]) -> f64 {
        let n = self.pages.len() as f64;
        let teleport = (1.0 - damping) / n;

        let dangling_mass: f64 = ranks
            .iter()
            .zip(&self.out_degree)
            .filter(|&(_, &degree)| degree == 0)
            .map(|(rank, _)| rank)
            .sum::<f64>()
            / n;

        let mut max_delta: f64 = 0.0;
        for (page, slot) in next.iter_mut().enumerate() {
            let followed: f64 = self.inbound[page]
                .iter()
                .map(|&(source, count)| {
                    ranks[source] * count as f64 / self.out_degree[source] as f64
                })
                .sum();

            *slot = teleport + damping * (followed + dangling_mass);
            max_delta = max_delta.max((*slot - ranks[page]).abs());
        }
        max_delta
    }
}

pub fn compute(corpus: &Corpus, settings: RankSettings) -> RankDistribution {
    let graph = LinkGraph::from_corpus(corpus);
    if graph.is_empty() {
        return RankDistribution::default();
    }

    let RankSettings {
        damping,
        threshold,
        max_iterations,
    } = settings;

    info!(
        "Calculating PageRank over {} pages (d = {}, threshold = {})",
        graph.len(),
        damping,
        threshold
    );

    let mut ranks = vec![1.0 / graph.len() as f64; graph.len()];
    let mut next = vec![0.0; graph.len()];
    let mut iterations = 0;
    let mut converged = false;

    while iterations < max_iterations {
        iterations += 1;
        let max_delta = graph.sweep(&ranks, damping, &mut next);
        std::mem::swap(&mut ranks, &mut next);

        debug!("Sweep {}: max delta {:e}", iterations, max_delta);
        if max_delta < threshold {
            converged = true;
            break;
        }
    }

    if converged {
        info!("PageRank converged after {} sweeps", iterations);
    } else {
        warn!(
            "PageRank stopped after {} sweeps without converging",
            iterations
        );
    }

    let total: f64 = ranks.iter().sum();
    if total > 0.0 {
        for rank in ranks.iter_mut() {
            *rank /= total;
        }
    }

    RankDistribution {
        ranks: graph.pages.into_iter().zip(ranks).collect(),
        iterations,
        converged,
    }
}

/// Probability of moving from `page` to each page of the corpus in one step
/// of the random surfer.
///
/// With probability `damping` the surfer follows one of `page`'s links,
/// otherwise it jumps to a page chosen uniformly. A page without links jumps
/// uniformly every time.
pub fn transition_model(corpus: &Corpus, page: &str, damping: f64) -> HashMap<String, f64> {
    let pages = corpus.pages();
    if pages.is_empty() {
        return HashMap::new();
    }
    let n = pages.len() as f64;

    let links = corpus.get(page).unwrap_or_default();
    if links.is_empty() {
        return pages.into_iter().map(|p| (p, 1.0 / n)).collect();
    }

    let mut distribution: HashMap<String, f64> =
        pages.into_iter().map(|p| (p, (1.0 - damping) / n)).collect();

    let per_link = damping / links.len() as f64;
    for link in links {
        *distribution.entry(link).or_default() += per_link;
    }
    distribution
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corpus(edges: &[(&str, &[&str])]) -> Corpus {
        let corpus = Corpus::new();
        for (page, links) in edges {
            corpus.set(*page, links.iter().map(|l| l.to_string()).collect());
        }
        corpus
    }

    #[test]
    fn test_empty_corpus() {
        let ranks = compute(&Corpus::new(), RankSettings::default());
        assert!(ranks.is_empty());
        assert_eq!(ranks.iterations(), 0);
    }

    #[test]
    fn test_single_page() {
        let ranks = compute(&corpus(&[("A", &[])]), RankSettings::default());
        assert_eq!(ranks.len(), 1);
        assert!((ranks.get("A").unwrap() - 1.0).abs() < 1e-12);
        assert!(ranks.converged());
    }

    #[test]
    fn test_inbound_pages() {
        let graph = LinkGraph::from_corpus(&corpus(&[
            ("A", &["B", "C", "C"]),
            ("B", &["C"]),
            ("C", &["A"]),
        ]));

        assert_eq!(graph.len(), 3);
        assert_eq!(graph.inbound_pages("C"), vec!["A", "B"]);
        assert_eq!(graph.inbound_pages("A"), vec!["C"]);
        assert_eq!(graph.inbound_pages("B"), vec!["A"]);
        assert!(graph.inbound_pages("Z").is_empty());
    }

    #[test]
    fn test_duplicate_links_carry_weight() {
        // A sends two thirds of its followed mass to C and one third to B.
        let ranks = compute(
            &corpus(&[("A", &["B", "C", "C"]), ("B", &["A"]), ("C", &["A"])]),
            RankSettings::default(),
        );
        assert!(ranks.get("C").unwrap() > ranks.get("B").unwrap());
    }

    #[test]
    fn test_self_link() {
        let ranks = compute(
            &corpus(&[("A", &["A", "B"]), ("B", &["A"])]),
            RankSettings::default(),
        );
        assert!((ranks.sum() - 1.0).abs() < 1e-9);
        assert!(ranks.get("A").unwrap() > ranks.get("B").unwrap());
    }

    #[test]
    fn test_iteration_cap() {
        let ranks = compute(
            &corpus(&[("A", &["B"]), ("B", &["C"]), ("C", &["A", "B"])]),
            RankSettings {
                threshold: 1e-300,
                max_iterations: 3,
                ..RankSettings::default()
            },
        );
        assert_eq!(ranks.iterations(), 3);
        assert!(!ranks.converged());
        assert!((ranks.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_top_orders_by_rank_then_path() {
        let ranks = compute(
            &corpus(&[("A", &["B"]), ("B", &["A"]), ("C", &["A", "B"])]),
            RankSettings::default(),
        );

        let top = ranks.top(2);
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].0, "A");
        assert_eq!(top[1].0, "B");
        assert!((top[0].1 - top[1].1).abs() < 1e-9);
        assert_eq!(ranks.sorted().last().unwrap().0, "C");
    }

    #[test]
    fn test_transition_model_with_links() {
        let corpus = corpus(&[("A", &["B", "C"]), ("B", &["C"]), ("C", &["A"])]);
        let model = transition_model(&corpus, "A", 0.85);

        let teleport = 0.15 / 3.0;
        assert!((model["A"] - teleport).abs() < 1e-12);
        assert!((model["B"] - (teleport + 0.425)).abs() < 1e-12);
        assert!((model["C"] - (teleport + 0.425)).abs() < 1e-12);
        assert!((model.values().sum::<f64>() - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_transition_model_dangling_is_uniform() {
        let corpus = corpus(&[("A", &["B"]), ("B", &[])]);
        let model = transition_model(&corpus, "B", 0.85);

        assert_eq!(model.len(), 2);
        assert!((model["A"] - 0.5).abs() < 1e-12);
        assert!((model["B"] - 0.5).abs() < 1e-12);
    }
}
