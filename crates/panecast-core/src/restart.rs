//! Restart every pane in the current tab.

use crate::Outcome;
use crate::controller::TerminalController;
use crate::error::{FlowError, InitStage};
use crate::topology::Absence;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RestartReport {
    pub tab: String,
    pub restarted: usize,
}

/// Restart each pane of the current tab in order.
///
/// Unlike the other flows, an empty tab is not an absence: there is simply
/// nothing to restart.
pub async fn restart_all_panes<C>(controller: &C) -> Result<Outcome<RestartReport>, FlowError>
where
    C: TerminalController + ?Sized,
{
    let Some(window) = controller
        .current_window()
        .await
        .map_err(FlowError::at(InitStage::Start))?
    else {
        return Ok(Outcome::Aborted(Absence::NoWindow));
    };
    let Some(tab) = controller
        .current_tab(&window)
        .await
        .map_err(FlowError::at(InitStage::Start))?
    else {
        return Ok(Outcome::Aborted(Absence::NoTab));
    };

    tracing::info!("attempting to restart sessions in tab: {tab}");
    let panes = controller
        .panes(&tab)
        .await
        .map_err(FlowError::at(InitStage::Start))?;

    for (i, pane) in panes.iter().enumerate() {
        tracing::info!("restarting session {} in tab {tab}...", i + 1);
        controller
            .restart(pane)
            .await
            .map_err(FlowError::at(InitStage::TopologyResolved))?;
    }

    Ok(Outcome::Completed(RestartReport {
        tab: tab.0,
        restarted: panes.len(),
    }))
}
