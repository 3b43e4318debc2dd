//! panecast: drive every pane of the current tmux window at once.

use clap::Parser;

mod cli;
mod cmd_init;
mod cmd_panes;
mod cmd_pythonpath;
mod cmd_restart;
mod cmd_ssh;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();

    let filter = std::env::var("PANECAST_LOG")
        .or_else(|_| std::env::var("RUST_LOG"))
        .unwrap_or_else(|_| "info".to_string());
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .with_writer(std::io::stderr)
        .init();

    let controller = args.tmux.controller();

    let message = match args.command {
        cli::Command::Init(opts) => cmd_init::cmd_init(&controller, &opts).await?,
        cli::Command::Ssh(opts) => cmd_ssh::cmd_ssh(&controller, &opts).await?,
        cli::Command::Restart => cmd_restart::cmd_restart(&controller).await?,
        cli::Command::Pythonpath(opts) => {
            cmd_pythonpath::cmd_pythonpath(&controller, &opts).await?
        }
        cli::Command::Panes(opts) => cmd_panes::cmd_panes(&controller, &opts).await?,
    };
    println!("{message}");

    Ok(())
}
