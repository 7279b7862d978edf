// Report generation from a ranked corpus

use crate::config::Config;
use crate::corpus::Corpus;
use crate::error::ReportError;
use crate::pagerank::RankDistribution;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const RANKS_FILE: &str = "pagerank.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "text" | "txt" => Some(ReportFormat::Text),
            "json" => Some(ReportFormat::Json),
            _ => None,
        }
    }

    pub fn file_name(&self) -> &'static str {
        match self {
            ReportFormat::Text => "report.txt",
            ReportFormat::Json => "report.json",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinkedPage {
    pub path: String,
    pub title: String,
    pub links: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankedPage {
    pub path: String,
    pub title: String,
    pub rank: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportData {
    pub generated_at: DateTime<Utc>,
    pub root: String,
    pub corpus_size: usize,
    pub total_links: usize,
    pub top_by_links: Vec<LinkedPage>,
    pub top_by_rank: Vec<RankedPage>,
    pub rank_sum: f64,
    pub iterations: usize,
    pub converged: bool,
    pub config: Config,
}

/// `/wiki/Go_(programming_language)` -> `Go (programming language)`
pub fn article_title(path: &str) -> String {
    path.strip_prefix("/wiki/")
        .unwrap_or(path)
        .replace('_', " ")
}

pub fn gather_report_data(
    root: &str,
    corpus: &Corpus,
    ranks: &RankDistribution,
    config: &Config,
) -> ReportData {
    let top_by_links = corpus
        .top_by_links(config.top)
        .into_iter()
        .map(|(path, links)| LinkedPage {
            title: article_title(&path),
            path,
            links,
        })
        .collect();

    let top_by_rank = ranks
        .top(config.top)
        .into_iter()
        .map(|(path, rank)| RankedPage {
            path: path.to_string(),
            title: article_title(path),
            rank,
        })
        .collect();

    ReportData {
        generated_at: Utc::now(),
        root: root.to_string(),
        corpus_size: corpus.size(),
        total_links: corpus.total_links(),
        top_by_links,
        top_by_rank,
        rank_sum: ranks.sum(),
        iterations: ranks.iterations(),
        converged: ranks.converged(),
        config: config.clone(),
    }
}

pub fn render_text(data: &ReportData) -> String {
    let mut report = String::new();
    report.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");
    report.push_str("# Summary:\n");
    report.push_str(&format!("  Root article: {}\n", data.root));
    report.push_str(&format!("  Pages in the corpus: {}\n", data.corpus_size));
    report.push_str(&format!(
        "  Cross-references in the corpus: {}\n",
        data.total_links
    ));
    report.push_str(&format!(
        "  Generated: {}\n",
        data.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    report.push_str("\n━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n\n");

    report.push_str(&format!(
        "## Top {} articles by most cross-references:\n",
        data.top_by_links.len()
    ));
    for (i, page) in data.top_by_links.iter().enumerate() {
        report.push_str(&format!(
            "  {}. {} with {} links\n",
            i + 1,
            page.path,
            page.links
        ));
    }

    report.push_str(&format!(
        "\n## Top {} articles by PageRank:\n",
        data.top_by_rank.len()
    ));
    for (i, page) in data.top_by_rank.iter().enumerate() {
        report.push_str(&format!("  {}. {} at {:.6}\n", i + 1, page.path, page.rank));
    }

    report.push('\n');
    report.push_str(&format!("PageRank sums to: {:.6}", data.rank_sum));
    if data.converged {
        report.push_str(&format!(" (converged after {} sweeps)\n", data.iterations));
    } else {
        report.push_str(&format!(
            " (stopped after {} sweeps without converging)\n",
            data.iterations
        ));
    }

    report
}

pub fn render_json(data: &ReportData) -> Result<String, ReportError> {
    Ok(serde_json::to_string_pretty(data)?)
}

/// Writes the report into `dir`, creating the directory if needed.
pub fn write_report(
    data: &ReportData,
    dir: &Path,
    format: ReportFormat,
) -> Result<PathBuf, ReportError> {
    let content = match format {
        ReportFormat::Text => render_text(data),
        ReportFormat::Json => render_json(data)?,
    };
    write_file(dir, format.file_name(), &content)
}

/// Writes every page's rank, highest first, as `pagerank.json` in `dir`.
pub fn write_ranks(ranks: &RankDistribution, dir: &Path) -> Result<PathBuf, ReportError> {
    let pages: Vec<RankedPage> = ranks
        .sorted()
        .into_iter()
        .map(|(path, rank)| RankedPage {
            path: path.to_string(),
            title: article_title(path),
            rank,
        })
        .collect();

    let content = serde_json::to_string_pretty(&pages)?;
    write_file(dir, RANKS_FILE, &content)
}

fn write_file(dir: &Path, name: &str, content: &str) -> Result<PathBuf, ReportError> {
    fs::create_dir_all(dir).map_err(|source| ReportError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let path = dir.join(name);
    fs::write(&path, content).map_err(|source| ReportError::Io {
        path: path.clone(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_article_title() {
        assert_eq!(
            article_title("/wiki/Go_(programming_language)"),
            "Go (programming language)"
        );
        assert_eq!(article_title("Plain"), "Plain");
    }

    #[test]
    fn test_report_format_file_names() {
        assert_eq!(ReportFormat::Text.file_name(), "report.txt");
        assert_eq!(ReportFormat::Json.file_name(), "report.json");
    }
}
