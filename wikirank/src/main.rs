use wikirank::{
    command_argument_builder, handle_run, init_logging, print_banner, resolve_config,
    resolve_format,
};
use wikirank_scanner::validate_wiki_path;

#[tokio::main]
async fn main() {
    let mut cmd = command_argument_builder();
    let matches = cmd.clone().get_matches();
    let quiet = matches.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    let Some(root) = matches.get_one::<String>("ROOT_PATH") else {
        println!("{}", cmd.render_usage());
        println!();
        println!("Example: wikirank /wiki/Go_(programming_language)");
        std::process::exit(1);
    };

    if let Err(e) = validate_wiki_path(root) {
        eprintln!("✗ {}", e);
        eprintln!("  Root paths look like /wiki/Article_Title");
        std::process::exit(1);
    }

    let config = match resolve_config(&matches) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ {:#}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = init_logging(&config) {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }

    if let Err(e) = handle_run(root, &config, resolve_format(&matches), quiet).await {
        eprintln!("✗ {:#}", e);
        std::process::exit(1);
    }
}
