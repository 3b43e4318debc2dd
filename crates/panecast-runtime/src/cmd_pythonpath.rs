//! `panecast pythonpath`: prepend paths to PYTHONPATH in every pane.

use panecast_core::{Outcome, TerminalController, append_python_paths};

use crate::cli::PythonPathOpts;

pub async fn cmd_pythonpath<C>(controller: &C, opts: &PythonPathOpts) -> anyhow::Result<String>
where
    C: TerminalController + ?Sized,
{
    Ok(match append_python_paths(controller, &opts.paths).await? {
        Outcome::Completed(report) => format!(
            "Successfully appended {} Python paths to {} sessions.",
            report.paths, report.panes
        ),
        Outcome::Aborted(absence) => absence.to_string(),
    })
}
