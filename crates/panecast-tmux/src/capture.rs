//! Pane capture from the oldest retained line.

use crate::error::TmuxError;
use crate::executor::TmuxCommandRunner;

/// Capture up to `max_lines` lines starting at the top of the pane's history.
///
/// A single `capture-pane` is atomic on the tmux server, so the result is a
/// point-in-time view. Wrapped lines are joined (`-J`) so a long line is
/// never split across two entries.
pub fn capture_from_top(
    runner: &impl TmuxCommandRunner,
    pane_id: &str,
    max_lines: usize,
) -> Result<Vec<String>, TmuxError> {
    let output = runner.run(&["capture-pane", "-p", "-J", "-t", pane_id, "-S", "-", "-E", "-"])?;
    Ok(parse_capture_output(&output, max_lines))
}

/// First `max_lines` lines of `capture-pane -p` output.
pub fn parse_capture_output(output: &str, max_lines: usize) -> Vec<String> {
    output.lines().take(max_lines).map(String::from).collect()
}
