//! `panecast panes`: the resolved topology, in rank order.

use panecast_core::{
    PaneRef, Resolved, TabRef, TerminalController, Topology, WindowRef, resolve_topology,
};
use serde::Serialize;

use crate::cli::PanesOpts;

#[derive(Debug, Serialize)]
struct PaneRow<'a> {
    rank: usize,
    #[serde(flatten)]
    pane: &'a PaneRef,
}

#[derive(Debug, Serialize)]
struct Listing<'a> {
    window: &'a WindowRef,
    tab: &'a TabRef,
    panes: Vec<PaneRow<'a>>,
}

fn pane_rows(topology: &Topology) -> Vec<PaneRow<'_>> {
    topology
        .ranked()
        .map(|(rank, pane)| PaneRow { rank, pane })
        .collect()
}

pub async fn cmd_panes<C>(controller: &C, opts: &PanesOpts) -> anyhow::Result<String>
where
    C: TerminalController + ?Sized,
{
    let topology = match resolve_topology(controller).await? {
        Resolved::Topology(t) => t,
        Resolved::Absent(absence) => return Ok(absence.to_string()),
    };
    let rows = pane_rows(&topology);
    if opts.json {
        let listing = Listing {
            window: &topology.window,
            tab: &topology.tab,
            panes: rows,
        };
        return Ok(serde_json::to_string_pretty(&listing)?);
    }
    let mut out = format!("window {} tab {}", topology.window, topology.tab);
    for row in &rows {
        out.push_str(&format!("\n{}\t{}", row.rank, row.pane));
    }
    Ok(out)
}
