use clap::{Parser, Subcommand};
use recipe_site::index::SyncRoots;
use recipe_site::remote::NeocitiesBackend;
use recipe_site::{config, output, package, publish};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Leaked once at startup, called exactly once
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "recipe-site")]
#[command(about = "Static recipe website builder and Neocities publisher")]
#[command(long_about = "\
Static recipe website builder and Neocities publisher

Recipes are plain text. The first block is the title; every following
block, separated by blank lines, is one step:

  Pancakes

  - flour                 # ingredient
  - milk
  + griddle               # other input (tools, equipment)
  Mix and cook.           # instructions

Project structure:

  recipes/                # One recipe per file; id = filename stem
  client/                 # Static assets, copied to the output root
  config.toml             # Optional, see 'recipe-site gen-config'
  dist/                   # Output: recipes/<id>.json, recipe_list.json, assets

'publish' uploads files that are new or newer than their remote copy.
Remote files with no local counterpart are listed but not deleted.")]
#[command(version = version_string())]
struct Cli {
    /// Recipe source directory
    #[arg(long, default_value = "recipes", global = true)]
    recipes: PathBuf,

    /// Client asset directory
    #[arg(long, default_value = "client", global = true)]
    client: PathBuf,

    /// Output directory
    #[arg(long, default_value = "dist", global = true)]
    output: PathBuf,

    /// Config file
    #[arg(long, default_value = "config.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Parse all recipes and write the site into the output directory
    Package,
    /// Parse all recipes without writing anything
    Check,
    /// Sync the output directory to Neocities
    Publish {
        /// File whose first line is the Neocities API key
        #[arg(long)]
        api_key_file: PathBuf,
        /// Show what would be uploaded without uploading
        #[arg(long)]
        dry_run: bool,
    },
    /// Print a stock config.toml with all options documented
    GenConfig,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Command::Package => {
            let site_config = config::load_config(&cli.config)?;
            init_thread_pool(&site_config.processing);
            println!("==> Packaging {} → {}", cli.recipes.display(), cli.output.display());
            let result = package::package(&cli.recipes, &cli.client, &cli.output)?;
            output::print_package_output(&result);
        }
        Command::Check => {
            let site_config = config::load_config(&cli.config)?;
            init_thread_pool(&site_config.processing);
            println!("==> Checking {}", cli.recipes.display());
            let recipes = package::parse_all(&cli.recipes)?;
            output::print_check_output(&recipes);
            println!("==> Recipes are valid");
        }
        Command::Publish {
            api_key_file,
            dry_run,
        } => {
            let site_config = config::load_config(&cli.config)?;
            let api_key = config::read_api_key(&api_key_file)?;
            let publish_config = &site_config.publish;
            let store = NeocitiesBackend::new(
                &publish_config.api_url,
                &api_key,
                publish_config.upload_timeout(),
            )?;
            let roots = SyncRoots::new(cli.output.clone(), &publish_config.remote_root);

            println!("==> Indexing {} and remote site", cli.output.display());
            let plan = publish::plan(&store, &roots)?;
            output::print_plan(&plan, &roots);
            if dry_run {
                return Ok(());
            }

            println!("==> Uploading");
            let (tx, rx) = std::sync::mpsc::channel();
            let printer = std::thread::spawn(move || {
                for event in rx {
                    println!("{}", output::format_upload_event(&event));
                }
            });
            let outcome = publish::execute(&store, &roots, plan, Some(tx));
            // The sender is dropped when execute returns, so the printer exits.
            printer.join().ok();

            output::print_publish_summary(&outcome);
            outcome.into_result()?;
            println!("==> Publish complete");
        }
        Command::GenConfig => {
            print!("{}", config::stock_config_toml());
        }
    }

    Ok(())
}

/// Diagnostics go to stderr; `RUST_LOG` overrides the default level.
fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| "recipe_site=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();
}

/// Initialize the rayon thread pool based on processing config.
///
/// Caps at the number of available CPU cores: user can constrain down, not up.
fn init_thread_pool(processing: &config::ProcessingConfig) {
    let threads = config::effective_threads(processing);
    rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
        .ok();
}
