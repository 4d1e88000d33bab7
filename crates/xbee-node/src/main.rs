//! `xbee-node`: run a ZigBee sensor node against a UART bridge.

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::{ArgAction, Parser};
use tracing_subscriber::EnvFilter;
use xbee_node::{LogIndicator, NodeConfig, NodeResult, SensorNode, SimulatedSensors, UartLink};

#[derive(Parser, Debug)]
#[command(name = "xbee-node", version, about = "ZigBee sensor node over an XBee UART bridge")]
struct Args {
    /// YAML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address of the UART bridge (host:port).
    #[arg(long)]
    connect: Option<String>,

    /// Seconds between sensor reports.
    #[arg(long)]
    report_interval: Option<u64>,

    /// Node name for logs and metrics.
    #[arg(long)]
    name: Option<String>,

    /// Increase log verbosity (-v debug, -vv trace).
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

fn load_config(args: &Args) -> NodeResult<NodeConfig> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::load(path)?,
        None => NodeConfig::default(),
    };
    if let Some(address) = &args.connect {
        config = config.with_connect(address.as_str());
    }
    if let Some(secs) = args.report_interval {
        config = config.with_report_interval_secs(secs);
    }
    if let Some(name) = &args.name {
        config = config.with_name(name.as_str());
    }
    Ok(config)
}

fn run(args: Args) -> NodeResult<()> {
    let config = load_config(&args)?;
    xbee_metrics::describe_metrics();

    let shutdown = Arc::new(AtomicBool::new(false));
    let handler_flag = Arc::clone(&shutdown);
    if let Err(e) = ctrlc::set_handler(move || handler_flag.store(true, Ordering::Relaxed)) {
        tracing::warn!(error = %e, "Could not install Ctrl-C handler");
    }

    let link = UartLink::connect(&config.uart)?;
    let mut node = SensorNode::new(
        &config,
        link.rx,
        link.tx,
        SimulatedSensors::new(&config.sensors),
        LogIndicator::new(config.name.as_str()),
    )?;
    let result = node.run(&shutdown);
    // Release the rx queue so a reader blocked on it sees the disconnect.
    drop(node);
    link.reader.stop();
    result
}

fn main() -> ExitCode {
    let args = Args::parse();
    init_logging(args.verbose);

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "xbee-node failed");
            ExitCode::FAILURE
        }
    }
}
