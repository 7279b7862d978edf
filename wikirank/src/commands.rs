use crate::CLAP_STYLING;
use clap::arg;
use std::path::PathBuf;

// No default values here: unset options fall through to the config file and
// then to `Config::default()`.
pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("wikirank")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("wikirank")
        .about("Crawl a slice of Wikipedia from one article and rank it with PageRank")
        .styles(CLAP_STYLING)
        .arg(
            arg!([ROOT_PATH])
                .required(false)
                .help("Article path to start from, e.g. /wiki/Go_(programming_language)"),
        )
        .arg(
            arg!(-c --"concurrency" <WORKERS>)
                .required(false)
                .help("Maximum number of pages fetched at once [default: 50]")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(-n --"pages" <PAGES>)
                .required(false)
                .help("Number of articles to crawl [default: 1000]")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(--"threshold" <DELTA>)
                .required(false)
                .help("PageRank stops once no article moves by this much [default: 0.0001]")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            arg!(--"damping" <FACTOR>)
                .required(false)
                .help("Probability of following a link instead of jumping [default: 0.85]")
                .value_parser(clap::value_parser!(f64)),
        )
        .arg(
            arg!(-o --"output-dir" <PATH>)
                .required(false)
                .help("Directory for the report, ranks and log file [default: output]"),
        )
        .arg(
            arg!(--"max-iterations" <SWEEPS>)
                .required(false)
                .help("Upper bound on PageRank sweeps [default: 1000]")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(--"top" <COUNT>)
                .required(false)
                .help("Number of articles listed in each ranking [default: 3]")
                .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .help("Request timeout in seconds [default: 10]")
                .value_parser(clap::value_parser!(u64)),
        )
        .arg(
            arg!(--"config" <PATH>)
                .required(false)
                .help("JSON config file; command line options take precedence")
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            arg!(-f --"format" <FORMAT>)
                .required(false)
                .help("Report file format: text, json")
                .value_parser(["text", "json"])
                .default_value("text"),
        )
        .arg(
            arg!(--"log-level" <LEVEL>)
                .required(false)
                .help("Log file verbosity, overridden by RUST_LOG [default: info]")
                .value_parser(["trace", "debug", "info", "warn", "error"]),
        )
        .arg(arg!(-q --"quiet" "Suppress banner and progress spinners").required(false))
}
