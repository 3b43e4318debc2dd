//! CLI definition using clap derive.

use std::time::Duration;

use clap::{Parser, Subcommand};
use panecast_core::{FallbackPolicy, Pacing, ProbeWait};
use panecast_tmux::{TmuxController, TmuxExecutor};

#[derive(Parser)]
#[command(
    name = "panecast",
    version,
    about = "Drive every pane of the current tmux window at once"
)]
pub struct Cli {
    #[command(flatten)]
    pub tmux: TmuxOpts,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(clap::Args)]
pub struct TmuxOpts {
    /// tmux binary
    #[arg(long, global = true, env = "PANECAST_TMUX_BIN", default_value = "tmux")]
    pub tmux_bin: String,

    /// tmux server socket path (tmux -S)
    #[arg(long, global = true, env = "PANECAST_TMUX_SOCKET")]
    pub tmux_socket: Option<String>,

    /// tmux server socket name (tmux -L)
    #[arg(long, global = true, env = "PANECAST_TMUX_SOCKET_NAME")]
    pub tmux_socket_name: Option<String>,
}

impl TmuxOpts {
    pub fn controller(&self) -> TmuxController<TmuxExecutor> {
        let mut exec = TmuxExecutor::new(&self.tmux_bin);
        if let Some(ref path) = self.tmux_socket {
            exec = exec.with_socket_path(path);
        }
        if let Some(ref name) = self.tmux_socket_name {
            exec = exec.with_socket_name(name);
        }
        TmuxController::new(exec)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Set RANK and MAIN_NODE_IP in every pane of the current window
    Init(InitOpts),
    /// Type an ssh login into every pane, spreading panes across hosts
    Ssh(SshOpts),
    /// Restart the shell in every pane of the current window
    Restart,
    /// Prepend paths to PYTHONPATH in every pane of the current window
    Pythonpath(PythonPathOpts),
    /// Show the panes of the current window in rank order
    Panes(PanesOpts),
}

#[derive(clap::Args)]
pub struct InitOpts {
    /// Wait after each scrollback clear, in milliseconds
    #[arg(long, env = "PANECAST_CLEAR_SETTLE_MS", default_value = "500")]
    pub clear_settle_ms: u64,

    /// Time allowed for the address probe to print, in milliseconds
    #[arg(long, env = "PANECAST_PROBE_WAIT_MS", default_value = "4000")]
    pub probe_wait_ms: u64,

    /// Poll the probe output at this interval instead of waiting the full time
    #[arg(long, env = "PANECAST_PROBE_POLL_MS", value_parser = clap::value_parser!(u64).range(1..))]
    pub probe_poll_ms: Option<u64>,

    /// Pause between panes while exporting variables, in milliseconds
    #[arg(long, env = "PANECAST_BROADCAST_GAP_MS", default_value = "100")]
    pub broadcast_gap_ms: u64,

    /// Fail instead of using this machine's address when the probe fails
    #[arg(long, env = "PANECAST_NO_FALLBACK")]
    pub no_fallback: bool,
}

impl InitOpts {
    pub fn pacing(&self) -> Pacing {
        let probe_window = Duration::from_millis(self.probe_wait_ms);
        let probe_wait = match self.probe_poll_ms {
            Some(ms) => ProbeWait::Poll {
                timeout: probe_window,
                interval: Duration::from_millis(ms),
            },
            None => ProbeWait::Fixed(probe_window),
        };
        Pacing {
            clear_settle: Duration::from_millis(self.clear_settle_ms),
            probe_wait,
            broadcast_gap: Duration::from_millis(self.broadcast_gap_ms),
        }
    }

    pub fn fallback_policy(&self) -> FallbackPolicy {
        if self.no_fallback {
            FallbackPolicy::Deny
        } else {
            FallbackPolicy::Allow
        }
    }
}

#[derive(clap::Args)]
pub struct SshOpts {
    /// Hosts to spread across the panes
    #[arg(required = true, num_args = 1..)]
    pub hosts: Vec<String>,

    /// Login name on the remote hosts
    #[arg(long, short = 'u', env = "PANECAST_SSH_USER")]
    pub user: String,

    /// Press Enter after typing the ssh command
    #[arg(long)]
    pub execute: bool,
}

#[derive(clap::Args)]
pub struct PythonPathOpts {
    /// Paths to prepend, in order
    #[arg(required = true, num_args = 1..)]
    pub paths: Vec<String>,
}

#[derive(clap::Args, Default)]
pub struct PanesOpts {
    /// Print JSON instead of a table
    #[arg(long)]
    pub json: bool,
}
