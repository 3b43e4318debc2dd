//! `panecast init`: rank and main-node address for every pane.

use panecast_core::{AddressSource, MultiNodeInit, Outcome, TerminalController};

use crate::cli::InitOpts;

/// Run multi-node init and return the line to print.
pub async fn cmd_init<C>(controller: &C, opts: &InitOpts) -> anyhow::Result<String>
where
    C: TerminalController + ?Sized,
{
    let init = MultiNodeInit::new(opts.pacing()).with_fallback_policy(opts.fallback_policy());
    let report = match init.run(controller).await? {
        Outcome::Completed(report) => report,
        Outcome::Aborted(absence) => return Ok(absence.to_string()),
    };

    let note = match report.address.source {
        AddressSource::Probe | AddressSource::Loopback => "",
        AddressSource::LocalRoute => " (address of this machine, not read from session 0)",
        AddressSource::LoopbackFallback => " (loopback fallback, remote panes cannot reach it)",
    };
    Ok(format!(
        "Set RANK=0..{} and MAIN_NODE_IP={} in {} sessions.{note}",
        report.panes - 1,
        report.address,
        report.panes,
    ))
}

// ─── Tests ────────────────────────────────────────────────────────
