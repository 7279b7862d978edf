use anyhow::{Context, bail};
use clap::ArgMatches;
use colored::Colorize;
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::info;
use tracing_subscriber::EnvFilter;
use wikirank_core::Config;
use wikirank_core::crawl::{CrawlOptions, execute_crawl, execute_ranking};
use wikirank_core::report::{
    ReportFormat, gather_report_data, render_text, write_ranks, write_report,
};
use wikirank_scanner::WikiFetcher;

pub const LOG_FILE: &str = "wikirank.log";

pub fn print_banner() {
    println!(
        "{} {}",
        "wikirank".bright_cyan().bold(),
        env!("CARGO_PKG_VERSION").bright_white()
    );
    println!("{}", "Wikipedia crawler and PageRank calculator".dimmed());
    println!();
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

/// Expands a leading `~` to the user's home directory.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

/// Builds the run configuration: defaults, then `--config`, then command line options.
pub fn resolve_config(matches: &ArgMatches) -> anyhow::Result<Config> {
    let mut config = match matches.get_one::<PathBuf>("config") {
        Some(path) => Config::from_file(&expand_path(path))?,
        None => Config::default(),
    };

    if let Some(&concurrency) = matches.get_one::<usize>("concurrency") {
        config.concurrency = concurrency;
    }
    if let Some(&pages) = matches.get_one::<usize>("pages") {
        config.pages = pages;
    }
    if let Some(&threshold) = matches.get_one::<f64>("threshold") {
        config.threshold = threshold;
    }
    if let Some(&damping) = matches.get_one::<f64>("damping") {
        config.damping = damping;
    }
    if let Some(dir) = matches.get_one::<String>("output-dir") {
        config.output_dir = PathBuf::from(dir);
    }
    if let Some(&max_iterations) = matches.get_one::<usize>("max-iterations") {
        config.max_iterations = max_iterations;
    }
    if let Some(&top) = matches.get_one::<usize>("top") {
        config.top = top;
    }
    if let Some(&timeout) = matches.get_one::<u64>("timeout") {
        config.request_timeout_secs = timeout;
    }
    if let Some(level) = matches.get_one::<String>("log-level") {
        config.log_level = level.clone();
    }

    config.output_dir = expand_path(&config.output_dir);
    config.validate()?;
    Ok(config)
}

pub fn resolve_format(matches: &ArgMatches) -> ReportFormat {
    matches
        .get_one::<String>("format")
        .and_then(|format| ReportFormat::from_str(format))
        .unwrap_or(ReportFormat::Text)
}

/// Sends all tracing output to `<output_dir>/wikirank.log` so the terminal only shows progress.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_logging(config: &Config) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(&config.output_dir).with_context(|| {
        format!(
            "Failed to create output directory {}",
            config.output_dir.display()
        )
    })?;

    let log_path = config.output_dir.join(LOG_FILE);
    let log_file = File::create(&log_path)
        .with_context(|| format!("Failed to create log file {}", log_path.display()))?;

    let level = config.log_level.to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,wikirank={level},wikirank_core={level},wikirank_scanner={level}"
        ))
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(log_file))
        .with_ansi(false)
        .with_target(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install log subscriber: {}", e))?;

    Ok(log_path)
}

pub async fn handle_run(
    root: &str,
    config: &Config,
    format: ReportFormat,
    quiet: bool,
) -> anyhow::Result<()> {
    info!("Run configuration: {:?}", config);

    if !quiet {
        print_divider();
        println!(
            "{} Root: {}",
            "→".blue(),
            root.to_string().bright_white().bold()
        );
        println!(
            "{} Pages: {}  Workers: {}  Damping: {}  Threshold: {}",
            "→".blue(),
            config.pages,
            config.concurrency,
            config.damping,
            config.threshold
        );
        print_divider();
        println!();
    }

    let fetcher = WikiFetcher::with_timeout(config.request_timeout_secs)
        .context("Failed to build HTTP client")?;

    let options = CrawlOptions {
        root: root.to_string(),
        settings: config.crawl_settings(),
        show_progress_bars: !quiet,
    };
    let corpus = execute_crawl(options, fetcher)
        .await
        .context("Crawl failed")?;

    if corpus.is_empty() {
        bail!(
            "No pages could be fetched starting from {}, see {} for details",
            root,
            config.output_dir.join(LOG_FILE).display()
        );
    }
    if corpus.size() < config.pages {
        info!(
            "Reachable graph ran out after {} of {} pages",
            corpus.size(),
            config.pages
        );
    }

    let ranks = execute_ranking(&corpus, config.rank_settings(), !quiet);
    let data = gather_report_data(root, &corpus, &ranks, config);

    println!();
    print!("{}", render_text(&data));
    println!();

    let report_path = write_report(&data, &config.output_dir, format)
        .context("Failed to write report")?;
    let ranks_path =
        write_ranks(&ranks, &config.output_dir).context("Failed to write PageRank values")?;

    println!(
        "{} Report written to {}",
        "✓".green().bold(),
        report_path.display().to_string().bright_white()
    );
    println!(
        "{} PageRank values written to {}",
        "✓".green().bold(),
        ranks_path.display().to_string().bright_white()
    );
    Ok(())
}
