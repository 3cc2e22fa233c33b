use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::Value;

use retail_triage::{
    builtin_handlers, config, logging, AppConfig, Dispatcher, KeywordClassifier, ProfileAggregator,
    QueryEngine, Store,
};

#[derive(Parser)]
#[command(name = "retail-triage")]
#[command(about = "Route retail analytics requests and query customer profiles")]
#[command(version)]
struct Args {
    /// YAML config; dataset paths resolve relative to its directory
    #[arg(long, short, global = true)]
    config: Option<PathBuf>,

    /// Directory holding `<dataset>.csv` files when no config is given
    #[arg(long, global = true, default_value = ".")]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Route a JSON request to its handler and print the response envelope
    Dispatch {
        /// Request file, or `-` for stdin
        #[arg(default_value = "-")]
        request: String,

        /// Force a route instead of classifying
        #[arg(long)]
        agent_type: Option<String>,
    },
    /// Print one customer's enriched transactions
    Digest { customer_id: String },
    /// Sales of known customers with their contact fields
    History {
        #[arg(long)]
        customer_id: Option<String>,
    },
    /// Profile customers with ids in an inclusive range
    Group { start: i64, end: i64 },
    /// Rank message templates by success rate
    Leaderboard {
        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Peak shopping day and top category for one customer
    Habits { customer_id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::register_logger();
    let args = Args::parse();

    let (config, base_dir) = match &args.config {
        Some(path) => {
            let config = config::parse_file(path)
                .with_context(|| format!("loading config {}", path.display()))?;
            let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
            (config, base)
        }
        None => (AppConfig::default(), args.data_dir.clone()),
    };

    let store = Store::load(&config.locators(&base_dir)?).context("loading datasets")?;
    tracing::info!(datasets = ?store.names(), "datasets loaded");
    let profiles = Arc::new(ProfileAggregator::new(QueryEngine::new(Arc::new(store))));

    match args.command {
        Commands::Dispatch { request, agent_type } => {
            let mut raw = read_request(&request)?;
            if let (Some(route), Value::Object(fields)) = (agent_type, &mut raw) {
                fields.insert(config.dispatcher.explicit_route_key.clone(), Value::String(route));
            }
            let dispatcher = build_dispatcher(&config, profiles);
            let response = dispatcher.dispatch(raw).await;
            print_json(&response)?;
            if !response.is_success() {
                std::process::exit(1);
            }
        }
        Commands::Digest { customer_id } => {
            print_json(&profiles.transaction_digest(&customer_id)?.to_records())?;
        }
        Commands::History { customer_id } => {
            print_json(&profiles.sales_history(customer_id.as_deref())?.to_records())?;
        }
        Commands::Group { start, end } => {
            print_json(&profiles.group_profile(start, end)?)?;
        }
        Commands::Leaderboard { top_n } => {
            let top_n = top_n.unwrap_or(config.leaderboard.top_n);
            print_json(&profiles.campaign_leaderboard(top_n)?.to_records())?;
        }
        Commands::Habits { customer_id } => {
            print_json(&profiles.peak_day_and_top_category(&customer_id)?)?;
        }
    }
    Ok(())
}

fn build_dispatcher(config: &AppConfig, profiles: Arc<ProfileAggregator>) -> Dispatcher {
    let settings = &config.dispatcher;
    let classifier = KeywordClassifier::new(
        settings.query_key.clone(),
        settings.context_key.clone(),
        settings.default_route,
    );
    Dispatcher::new(Arc::new(classifier), settings.clone())
        .with_handlers(builtin_handlers(profiles, None, config.leaderboard.top_n))
}

fn read_request(source: &str) -> anyhow::Result<Value> {
    let text = if source == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf).context("reading request from stdin")?;
        buf
    } else {
        std::fs::read_to_string(source).with_context(|| format!("reading request {}", source))?
    };
    if text.trim().is_empty() {
        bail!("request is empty");
    }
    serde_json::from_str(&text).context("parsing request JSON")
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
