use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use gdse_core::config::AppConfig;
use gdse_core::context::{AppContext, Session};
use gdse_core::flowgraph::{transform, FlowGraphInput, TransformOptions};
use gdse_core::{resolve_url, RecordId, ResourceDescriptor};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "gdse", version, about = "GDSE REST client utilities")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Fetch a keyflow and print its Sankey graph as JSON
    Sankey {
        #[arg(long)]
        casestudy: String,
        #[arg(long)]
        keyflow: String,
        #[arg(long, value_enum, default_value_t = Level::Activities)]
        level: Level,
        #[arg(long)]
        hide_unconnected: bool,
        /// Only flows/stocks containing this material
        #[arg(long)]
        material: Option<String>,
        #[arg(long)]
        units: Option<String>,
    },
    /// Print the URL an api tag resolves to
    Resolve { tag: String, ids: Vec<String> },
}

#[derive(Clone, Copy, ValueEnum)]
enum Level {
    Groups,
    Activities,
    Actors,
}

impl Level {
    /// (nodes, flows, stocks) api tags
    fn tags(self) -> (&'static str, &'static str, &'static str) {
        match self {
            Level::Groups => ("activitygroups", "groupToGroup", "groupStock"),
            Level::Activities => ("activities", "activityToActivity", "activityStock"),
            Level::Actors => ("actors", "actorToActor", "actorStock"),
        }
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = AppConfig::from_env().context("failed to load configuration")?;

    match cli.command {
        Command::Resolve { tag, ids } => {
            let url = resolve_url(&ResourceDescriptor::new(&tag, ids), &config.url_table)?;
            println!("{}", url);
        }
        Command::Sankey {
            casestudy,
            keyflow,
            level,
            hide_unconnected,
            material,
            units,
        } => {
            info!(api_host = %config.api_host, %casestudy, %keyflow, "building flow graph");
            let ctx = AppContext::init(config, Session::new(&casestudy, &keyflow))?;

            let (node_tag, flow_tag, stock_tag) = level.tags();
            let mut nodes = ctx.keyflow_collection(node_tag);
            let mut flows = ctx.keyflow_collection(flow_tag);
            let mut stocks = ctx.keyflow_collection(stock_tag);
            let mut materials = ctx.keyflow_collection("materials");

            let report = ctx
                .fetch_all(&mut [&mut nodes, &mut flows, &mut stocks, &mut materials])
                .await
                .context("failed to fetch keyflow data")?;
            if !report.is_complete() {
                info!(failed = report.failures.len(), "rendering with partial data");
            }

            let input = FlowGraphInput::from_collections(&nodes, &flows, &stocks, Some(&materials));
            let options = TransformOptions {
                hide_unconnected,
                material_filter: material.map(|m| match m.parse::<i64>() {
                    Ok(id) => RecordId::Int(id),
                    Err(_) => RecordId::Str(m),
                }),
                units,
            };
            let graph = transform(&input, &options);
            info!(nodes = graph.nodes.len(), links = graph.links.len(), "flow graph ready");
            println!("{}", serde_json::to_string_pretty(&graph)?);
        }
    }

    Ok(())
}
