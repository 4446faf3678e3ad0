//! `vestra-nodes` CLI entry-point.
//!
//! Available sub-commands:
//! - `list`   — show the registered step types.
//! - `invoke` — run messages through one step instance against the
//!   simulated connector.

mod console;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use connector::{SimulatedConnector, SimulatorConfig};
use engine::{RegistryConfig, StepInstance, StepRegistry};
use nodes::{builtin, Message, StepConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

use console::{ConsoleNode, ConsoleResponder};

#[derive(Parser)]
#[command(
    name = "vestra-nodes",
    about = "Run flow steps against the node-connector service",
    version
)]
struct Cli {
    /// Namespace prefixed to every step type name.
    #[arg(long, env = "VESTRA_NAMESPACE", default_value = "vestra", global = true)]
    namespace: String,

    /// Make every simulated device call fail as unreachable.
    #[arg(long, env = "VESTRA_OFFLINE", global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List registered step types.
    List,
    /// Run one step instance over one message, or over JSON lines from stdin.
    Invoke {
        /// Step type, with or without its namespace.
        step_type: String,

        /// Instance id; a random one is generated when omitted.
        #[arg(long)]
        id: Option<String>,

        /// Configuration value, repeatable.
        #[arg(long = "config", value_name = "KEY=VALUE", value_parser = parse_pair)]
        config: Vec<(String, String)>,

        /// Message as JSON, e.g. '{"payload":"abc","flow_run_id":42}'.
        #[arg(long)]
        message: Option<String>,
    },
}

fn parse_pair(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.trim().to_owned(), v.to_owned()))
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let connector = Arc::new(SimulatedConnector::new(SimulatorConfig {
        offline: cli.offline,
        ..SimulatorConfig::default()
    }));
    let mut registry = StepRegistry::new(RegistryConfig {
        namespace: cli.namespace,
    });
    registry.register_all(builtin::catalog(connector))?;

    match cli.command {
        Command::List => {
            for step_type in registry.types() {
                println!(
                    "{:<36} outputs={} require_flow_run={}",
                    step_type.name, step_type.outputs, step_type.options.require_flow_run
                );
            }
        }
        Command::Invoke {
            step_type,
            id,
            config,
            message,
        } => {
            let id = id.unwrap_or_else(|| uuid::Uuid::new_v4().simple().to_string());
            let config: StepConfig = config.into_iter().collect();
            let node = Arc::new(ConsoleNode::new(id, config));
            let step = registry.instantiate(&step_type, node)?;
            info!("Invoking {} as {}", step.step_type().name, step.id());

            let failed = match message {
                Some(raw) => {
                    let msg: Message =
                        serde_json::from_str(&raw).context("--message is not a valid message")?;
                    usize::from(!run(&step, msg).await)
                }
                None => run_stdin(&step).await?,
            };

            if failed > 0 {
                eprintln!("{failed} invocation(s) failed");
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

/// Returns whether the invocation succeeded.
async fn run(step: &StepInstance, msg: Message) -> bool {
    let mut responder = ConsoleResponder;
    step.handle(msg, &mut responder).await.is_success()
}

/// Run every non-blank stdin line as a message; returns the failure count.
async fn run_stdin(step: &StepInstance) -> anyhow::Result<usize> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut failed = 0;
    let mut line_no = 0;

    while let Some(line) = lines.next_line().await? {
        line_no += 1;
        if line.trim().is_empty() {
            continue;
        }
        let msg: Message = serde_json::from_str(&line)
            .with_context(|| format!("line {line_no} is not a valid message"))?;
        if !run(step, msg).await {
            failed += 1;
        }
    }
    Ok(failed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_pairs_split_on_the_first_equals() {
        assert_eq!(
            parse_pair("flow_name=a=b").unwrap(),
            ("flow_name".to_owned(), "a=b".to_owned())
        );
        assert!(parse_pair("flow_name").is_err());
    }

    #[test]
    fn cli_parses_invoke_with_config() {
        let cli = Cli::try_parse_from([
            "vestra-nodes",
            "invoke",
            "ur3-movetojointwaypoint",
            "--config",
            "waypoint_number=3",
            "--message",
            r#"{"flow_run_id":1}"#,
        ])
        .unwrap();

        let Command::Invoke { step_type, config, .. } = cli.command else {
            panic!("expected invoke");
        };
        assert_eq!(step_type, "ur3-movetojointwaypoint");
        assert_eq!(config, vec![("waypoint_number".to_owned(), "3".to_owned())]);
    }
}
