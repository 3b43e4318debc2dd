//! Window → tab → pane resolution shared by every flow.

use std::fmt;

use crate::controller::{PaneRef, TabRef, TerminalController, WindowRef};
use crate::error::ControllerError;

/// Resolved window, tab and the tab's panes in controller order.
/// `panes` is never empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topology {
    pub window: WindowRef,
    pub tab: TabRef,
    pub panes: Vec<PaneRef>,
}

impl Topology {
    pub fn len(&self) -> usize {
        self.panes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.panes.is_empty()
    }

    /// Panes paired with their 0-based rank.
    pub fn ranked(&self) -> impl Iterator<Item = (usize, &PaneRef)> {
        self.panes.iter().enumerate()
    }
}

/// A missing level of the topology. Reported to the user, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Absence {
    NoWindow,
    NoTab,
    NoPanes,
}

impl fmt::Display for Absence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Absence::NoWindow => {
                f.write_str("No active window found. Please open a terminal window.")
            }
            Absence::NoTab => f.write_str("No active tab found in the current window."),
            Absence::NoPanes => f.write_str(
                "No sessions (panels) found in the current tab. Please open some panels.",
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Topology(Topology),
    Absent(Absence),
}

/// Walk window → tab → panes, stopping at the first missing level.
pub async fn resolve_topology<C>(controller: &C) -> Result<Resolved, ControllerError>
where
    C: TerminalController + ?Sized,
{
    let Some(window) = controller.current_window().await? else {
        return Ok(Resolved::Absent(Absence::NoWindow));
    };
    let Some(tab) = controller.current_tab(&window).await? else {
        return Ok(Resolved::Absent(Absence::NoTab));
    };
    let panes = controller.panes(&tab).await?;
    if panes.is_empty() {
        return Ok(Resolved::Absent(Absence::NoPanes));
    }
    tracing::debug!(window = %window, tab = %tab, "resolved {} panes", panes.len());
    Ok(Resolved::Topology(Topology { window, tab, panes }))
}
