use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info};
use std::io::Write;
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Builder;

use custom_sdn::command::{self, Command, Reply};
use custom_sdn::config::ControllerConfig;
use custom_sdn::control_server::ControlServer;
use custom_sdn::{SharedTopology, share};

#[derive(Parser)]
#[command(name = "custom_sdn", about = "Software-defined network controller simulator")]
struct Cli {
    /// JSON topology to start from (defaults to the built-in demo network)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Start with no routers instead of the demo network
    #[arg(long, conflicts_with = "config")]
    empty: bool,

    /// Serve JSON control commands on 127.0.0.1:<port>
    #[arg(long)]
    control_port: Option<u16>,

    /// Do not read commands from stdin (requires --control-port)
    #[arg(long, requires = "control_port")]
    no_prompt: bool,

    /// Log filter used when RUST_LOG is not set
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(cli.log_level.as_str()))
        .init();

    let config = match (&cli.config, cli.empty) {
        (Some(path), _) => ControllerConfig::load(path)
            .with_context(|| format!("failed to load topology from {}", path.display()))?,
        (None, true) => ControllerConfig::default(),
        (None, false) => ControllerConfig::demo(),
    };
    let state = share(config.build()?);

    let rt = Builder::new_multi_thread()
        .enable_all()
        .build()?;

    rt.block_on(async {
        if let Some(port) = cli.control_port {
            let server = ControlServer::new(port, state.clone());
            if cli.no_prompt {
                return server.start().await;
            }
            tokio::spawn(async move {
                if let Err(e) = server.start().await {
                    error!("Control server stopped: {:#}", e);
                }
            });
        }

        run_prompt(&state).await
    })
}

async fn run_prompt(state: &SharedTopology) -> Result<()> {
    info!("Type 'help' for the list of commands");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                println!("Error: {}\n", e);
                continue;
            }
        };

        match command::execute(command, state).await {
            Ok(Reply::Quit) => break,
            Ok(reply) => println!("{}", reply),
            Err(e) => println!("Error: {}\n", e),
        }
    }

    Ok(())
}
