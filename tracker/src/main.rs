//! Combat tracker operator console.
//!
//! A line-oriented interface over the tracker engine: type commands on stdin,
//! read new combat log lines on stdout. Diagnostics go to stderr.
//!
//! ```bash
//! cargo run -p tracker -- --load party.json --seed 42
//! ```

mod headless;

use std::path::PathBuf;
use tracing_subscriber::EnvFilter;
use tracker_core::TrackerConfig;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tracker=info,tracker_core=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return Ok(());
    }

    let options = parse_args(&args)?;
    headless::run(options).await?;
    Ok(())
}

/// Where to load from, where to save to, and the session config.
pub struct Options {
    pub config: TrackerConfig,
    pub load_path: PathBuf,
    pub save_path: PathBuf,
}

fn parse_args(args: &[String]) -> Result<Options, String> {
    let mut config = TrackerConfig::from_env();
    let mut load_path = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--load" => {
                let path = args.get(i + 1).ok_or("--load needs a path")?;
                load_path = Some(PathBuf::from(path));
                i += 1;
            }
            "--save" => {
                let path = args.get(i + 1).ok_or("--save needs a path")?;
                config = config.with_save_path(path);
                i += 1;
            }
            "--seed" => {
                let seed = args.get(i + 1).ok_or("--seed needs a number")?;
                let seed = seed
                    .parse()
                    .map_err(|_| format!("--seed: not a number: {seed}"))?;
                config = config.with_dice_seed(seed);
                i += 1;
            }
            other => return Err(format!("Unknown argument: {other} (try --help)")),
        }
        i += 1;
    }

    let save_path = config.save_path_or_default();
    Ok(Options {
        load_path: load_path.unwrap_or_else(|| save_path.clone()),
        save_path,
        config,
    })
}

fn print_help() {
    println!("Combat tracker console");
    println!();
    println!("USAGE:");
    println!("    tracker [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    --load <path>   Setup to load at start (default: the save path)");
    println!("    --save <path>   Where #save writes (default: tracker_setup.json)");
    println!("    --seed <n>      Seed the dice for a reproducible session");
    println!("    -h, --help      Show this help");
    println!();
    println!("ENVIRONMENT:");
    println!("    TRACKER_SAVE_PATH, TRACKER_DICE_SEED, TRACKER_HISTORY_LIMIT, RUST_LOG");
    println!();
    println!("Type #help inside the console for the command list.");
}
