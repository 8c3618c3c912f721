use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use log::{debug, warn};
use serde::Serialize;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use mclighting_control_lib::component::{ErrorPayload, InPacket, McLightingComponent, OutPacket};
use mclighting_control_lib::config::ConnectionConfig;
use mclighting_control_lib::control_interface::command::LightCommand;
use mclighting_control_lib::session::LightSession;
use mclighting_control_lib::util::fan_out::{collect_all, FanOutMode};

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    let cli = Cli::parse();

    handle_cli(cli).await
}

/// This struct defines the command line interface of the application
#[derive(Parser)]
#[clap(
    name = "mclighting_control",
    about = "Controls McLighting LED strips",
    version
)]
pub struct Cli {
    #[clap(flatten)]
    pub connection: ConnectionArgs,

    #[clap(subcommand)]
    pub command: Commands,
}

/// Connection settings, layered over the optional config file
#[derive(Args)]
pub struct ConnectionArgs {
    /// Path to a YAML or JSON connection config file
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Time between reconnect attempts in milliseconds
    #[clap(long, global = true, value_parser = parse_duration)]
    pub retry_interval: Option<Duration>,

    /// Give up on a light after this many failed connection attempts
    #[clap(long, global = true)]
    pub max_attempts: Option<u32>,

    /// Port of the HTTP status endpoint
    #[clap(long, global = true, conflicts_with = "status_on_websocket_port")]
    pub http_port: Option<u16>,

    /// Fetch the status from the same port as the WebSocket
    #[clap(long, global = true)]
    pub status_on_websocket_port: bool,

    /// Maximum time to wait for a reply in milliseconds
    #[clap(long, global = true, value_parser = parse_duration)]
    pub reply_timeout: Option<Duration>,
}

/// Supported output formats for the `status` command.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum)]
pub enum OutputFormat {
    /// Plain text format.
    Plaintext,
    /// JSON format.
    Json,
    /// YAML format.
    Yaml,
}

/// Subcommands available for the CLI
#[derive(Subcommand)]
pub enum Commands {
    /// Sends a command to every light and prints the replies
    #[clap(name = "command")]
    Command {
        /// WebSocket address of a light, e.g. ws://192.168.1.40:81
        #[clap(short, long = "address", required = true)]
        addresses: Vec<String>,

        /// How long to wait for the lights to connect, in milliseconds
        #[clap(long, value_parser = parse_duration, default_value = "5000")]
        connect_timeout: Duration,

        /// Whether to stop at the first failing light
        #[clap(long, value_enum, default_value_t = FanOutMode::FirstError)]
        mode: FanOutMode,

        /// The command, e.g. "#FF0000", "/12", "?200", "%128"
        command: String,
    },
    /// Prints the status document of every light
    #[clap(name = "status")]
    Status {
        /// WebSocket address of a light
        #[clap(short, long = "address", required = true)]
        addresses: Vec<String>,

        /// Output format (plaintext, json, yaml)
        #[clap(short, long, value_enum, default_value_t = OutputFormat::Plaintext)]
        output: OutputFormat,
    },
    /// Runs the light component on JSON-line packets read from stdin
    #[clap(name = "component")]
    Component,
}

fn parse_duration(s: &str) -> Result<Duration, &'static str> {
    let millis = s
        .parse::<u64>()
        .map_err(|_| "could not parse duration in milliseconds")?;
    Ok(Duration::from_millis(millis))
}

fn load_config(path: &Path) -> Result<ConnectionConfig> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: ConnectionConfig = match path.extension().and_then(|ext| ext.to_str()) {
        Some("yaml") | Some("yml") => serde_yaml::from_str(&content)?,
        _ => serde_json::from_str(&content)?,
    };
    Ok(config)
}

fn connection_config(args: &ConnectionArgs) -> Result<ConnectionConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => ConnectionConfig::default(),
    };
    if let Some(interval) = args.retry_interval {
        config.reconnect.interval = interval;
    }
    if let Some(max_attempts) = args.max_attempts {
        config.reconnect.max_attempts = Some(max_attempts);
    }
    if args.status_on_websocket_port {
        config.http_port = None;
    } else if let Some(port) = args.http_port {
        config.http_port = Some(port);
    }
    if let Some(reply_timeout) = args.reply_timeout {
        config.reply_timeout = Some(reply_timeout);
    }
    debug!("Connection config: {:?}", config);
    Ok(config)
}

/// Commands go out exactly as typed; the parsed form is only logged.
fn log_command(command: &str) {
    match command.parse::<LightCommand>() {
        Ok(parsed) => debug!("Sending {} ({:?})", command, parsed),
        Err(e) => debug!("Sending {} ({})", command, e),
    }
}

#[derive(Serialize)]
struct LightStatus<'a> {
    address: &'a str,
    status: &'a Value,
}

async fn handle_cli(cli: Cli) -> Result<()> {
    let config = connection_config(&cli.connection)?;

    match cli.command {
        Commands::Command {
            addresses,
            connect_timeout,
            mode,
            command,
        } => {
            log_command(&command);

            let mut session = LightSession::new(config);
            session.register(addresses.as_slice())?;

            match mode {
                FanOutMode::FirstError => {
                    session.wait_connected(connect_timeout).await?;
                    let replies = session.broadcast(&command).await?;
                    for (address, reply) in addresses.iter().zip(replies) {
                        println!("{}: {}", address, reply);
                    }
                }
                FanOutMode::CollectAll => {
                    let waits = session
                        .lights()
                        .iter()
                        .map(|light| light.wait_connected(connect_timeout));
                    for result in collect_all(waits).await {
                        if let Err(e) = result {
                            warn!("{}", e);
                        }
                    }
                    let results = session.broadcast_settled(&command).await;
                    let mut failures = 0;
                    for (address, result) in addresses.iter().zip(results) {
                        match result {
                            Ok(reply) => println!("{}: {}", address, reply),
                            Err(e) => {
                                failures += 1;
                                eprintln!("{}: {}", address, e);
                            }
                        }
                    }
                    if failures > 0 {
                        return Err(anyhow!("{} of {} lights failed", failures, addresses.len()));
                    }
                }
            }
        }
        Commands::Status { addresses, output } => {
            let mut session = LightSession::new(config);
            session.register(addresses.as_slice())?;
            session.store().await?;

            let statuses: Vec<LightStatus> = addresses
                .iter()
                .zip(session.stored_states())
                .filter_map(|(address, state)| {
                    state.as_ref().map(|status| LightStatus { address, status })
                })
                .collect();
            match output {
                OutputFormat::Plaintext => {
                    for light in &statuses {
                        println!("{}: {}", light.address, light.status);
                    }
                }
                OutputFormat::Json => {
                    let json = serde_json::to_string(&statuses)?;
                    println!("{}", json);
                }
                OutputFormat::Yaml => {
                    let yaml = serde_yaml::to_string(&statuses)?;
                    println!("{}", yaml);
                }
            }
        }
        Commands::Component => run_component(McLightingComponent::new(config)).await?,
    }

    Ok(())
}

/// Feeds stdin packets, one JSON object per line, into the component and
/// writes every output packet to stdout the same way.
async fn run_component(mut component: McLightingComponent) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let output = match serde_json::from_str::<InPacket>(&line) {
            Ok(packet) => component.process(packet).await,
            Err(e) => Some(OutPacket::Error(ErrorPayload {
                message: format!("Invalid packet: {}", e),
            })),
        };
        if let Some(output) = output {
            let mut json = serde_json::to_string(&output)?;
            json.push('\n');
            stdout.write_all(json.as_bytes()).await?;
            stdout.flush().await?;
        }
    }

    component.tear_down();
    Ok(())
}
