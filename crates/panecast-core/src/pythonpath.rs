//! Append entries to `PYTHONPATH` in every pane of the current tab.

use crate::Outcome;
use crate::controller::{SendOptions, TerminalController};
use crate::error::{FlowError, InitStage};
use crate::topology::{Resolved, resolve_topology};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PythonPathReport {
    pub paths: usize,
    pub panes: usize,
}

/// Quote a path for a line typed into an interactive shell.
///
/// Paths made only of `[A-Za-z0-9_./:@%+=,-]` pass through unchanged. Anything
/// else is wrapped in single quotes, with inner single quotes written as `'\''`.
pub fn shell_quote(path: &str) -> String {
    if !path.is_empty() && path.chars().all(is_shell_safe) {
        path.to_string()
    } else {
        format!("'{}'", path.replace('\'', "'\\''"))
    }
}

fn is_shell_safe(c: char) -> bool {
    c.is_ascii_alphanumeric()
        || matches!(c, '_' | '.' | '/' | ':' | '@' | '%' | '+' | '=' | ',' | '-')
}

pub fn export_command(path: &str) -> String {
    format!("export PYTHONPATH={}:$PYTHONPATH\n", shell_quote(path))
}

/// Prepend each path to `PYTHONPATH`, one newline-terminated export per path.
pub async fn append_python_paths<C>(
    controller: &C,
    paths: &[String],
) -> Result<Outcome<PythonPathReport>, FlowError>
where
    C: TerminalController + ?Sized,
{
    let topology = match resolve_topology(controller)
        .await
        .map_err(FlowError::at(InitStage::Start))?
    {
        Resolved::Topology(t) => t,
        Resolved::Absent(absence) => return Ok(Outcome::Aborted(absence)),
    };

    let commands: Vec<String> = paths.iter().map(|p| export_command(p)).collect();
    for pane in &topology.panes {
        for command in &commands {
            controller
                .send_text(pane, command, SendOptions::isolated())
                .await
                .map_err(FlowError::at(InitStage::TopologyResolved))?;
        }
    }

    Ok(Outcome::Completed(PythonPathReport {
        paths: paths.len(),
        panes: topology.len(),
    }))
}
