//! `panecast restart`: fresh shell in every pane.

use panecast_core::{Outcome, TerminalController, restart_all_panes};

pub async fn cmd_restart<C>(controller: &C) -> anyhow::Result<String>
where
    C: TerminalController + ?Sized,
{
    Ok(match restart_all_panes(controller).await? {
        Outcome::Completed(_) => {
            "All sessions in the current tab have been prompted to restart.".to_string()
        }
        Outcome::Aborted(absence) => absence.to_string(),
    })
}
