//! `TerminalController` over tmux.
//!
//! | capability | tmux                                         |
//! |------------|----------------------------------------------|
//! | window     | session (`#{session_id}`)                    |
//! | tab        | the session's active window (`#{window_id}`) |
//! | pane       | pane (`#{pane_id}`), ordered by pane index   |

use std::fs::OpenOptions;
use std::io::{self, Write};
use std::sync::Arc;

use panecast_core::{
    BufferSnapshot, CLEAR_SCROLLBACK, ControllerError, ControllerFuture, PaneRef, SendOptions,
    TabRef, TerminalController, WindowRef,
};

use crate::capture::capture_from_top;
use crate::error::TmuxError;
use crate::executor::{CommandSequence, TmuxCommandRunner, TmuxExecutor};
use crate::pane_info::list_window_panes;

/// Every tmux call is a blocking subprocess, so each one runs on tokio's
/// blocking pool against a shared runner.
pub struct TmuxController<R = TmuxExecutor> {
    runner: Arc<R>,
}

impl<R: TmuxCommandRunner + 'static> TmuxController<R> {
    pub fn new(runner: R) -> Self {
        Self {
            runner: Arc::new(runner),
        }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    fn blocking<T, F>(&self, call: F) -> ControllerFuture<'static, T>
    where
        T: Send + 'static,
        F: FnOnce(&R) -> Result<T, ControllerError> + Send + 'static,
    {
        let runner = Arc::clone(&self.runner);
        Box::pin(async move {
            tokio::task::spawn_blocking(move || call(&*runner))
                .await
                .map_err(|e| ControllerError::Io(io::Error::other(e)))?
        })
    }
}

impl Default for TmuxController<TmuxExecutor> {
    fn default() -> Self {
        Self::new(TmuxExecutor::default())
    }
}

/// `display-message -p`, with a missing server or target read as `None`.
fn display(
    runner: &impl TmuxCommandRunner,
    target: Option<&str>,
    format: &str,
) -> Result<Option<String>, TmuxError> {
    let mut args = vec!["display-message", "-p"];
    if let Some(target) = target {
        args.extend(["-t", target]);
    }
    args.push(format);
    match runner.run(&args) {
        Ok(out) => {
            let value = out.trim();
            Ok((!value.is_empty()).then(|| value.to_string()))
        }
        Err(e) if e.is_absent_target() => {
            tracing::debug!("tmux target {target:?} not found: {e}");
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

fn list_panes(runner: &impl TmuxCommandRunner, tab: &str) -> Result<Vec<PaneRef>, ControllerError> {
    match list_window_panes(runner, tab) {
        Ok(panes) => Ok(panes.into_iter().map(|p| PaneRef::new(p.pane_id)).collect()),
        Err(e) if e.is_absent_target() => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// tmux keeps its own scrollback, so the clear sequence becomes
/// `clear-history`. Any other bytes go straight to the pane's tty.
fn inject_bytes(
    runner: &impl TmuxCommandRunner,
    pane_id: &str,
    bytes: &[u8],
) -> Result<(), ControllerError> {
    if bytes == CLEAR_SCROLLBACK {
        runner.run(&["clear-history", "-t", pane_id])?;
        return Ok(());
    }
    let tty = display(runner, Some(pane_id), "#{pane_tty}")?
        .ok_or_else(|| ControllerError::PaneGone(pane_id.to_string()))?;
    let mut dev = OpenOptions::new().write(true).open(&tty)?;
    dev.write_all(bytes)?;
    Ok(())
}

/// tmux reads an argument ending in `;` as a command separator and `\;` as
/// a literal semicolon.
fn escape_trailing_semicolon(segment: &str) -> String {
    match segment.strip_suffix(';') {
        Some(head) => format!("{head}\\;"),
        None => segment.to_string(),
    }
}

/// Literal `send-keys` for each line segment and an `Enter` for each newline,
/// all in one invocation.
pub fn send_keys_sequence(pane_id: &str, text: &str) -> CommandSequence {
    let mut seq = CommandSequence::new();
    let mut segments = text.split('\n').peekable();
    while let Some(segment) = segments.next() {
        if !segment.is_empty() {
            let literal = escape_trailing_semicolon(segment);
            seq = seq.then(["send-keys", "-t", pane_id, "-l", "--", literal.as_str()]);
        }
        if segments.peek().is_some() {
            seq = seq.then(["send-keys", "-t", pane_id, "Enter"]);
        }
    }
    seq
}

impl<R: TmuxCommandRunner + 'static> TerminalController for TmuxController<R> {
    fn current_window(&self) -> ControllerFuture<'_, Option<WindowRef>> {
        self.blocking(|runner| Ok(display(runner, None, "#{session_id}")?.map(WindowRef)))
    }

    fn current_tab<'a>(&'a self, window: &'a WindowRef) -> ControllerFuture<'a, Option<TabRef>> {
        let session = window.0.clone();
        self.blocking(move |runner| {
            Ok(display(runner, Some(session.as_str()), "#{window_id}")?.map(TabRef))
        })
    }

    fn panes<'a>(&'a self, tab: &'a TabRef) -> ControllerFuture<'a, Vec<PaneRef>> {
        let window = tab.0.clone();
        self.blocking(move |runner| list_panes(runner, &window))
    }

    fn inject<'a>(&'a self, pane: &'a PaneRef, bytes: &'a [u8]) -> ControllerFuture<'a, ()> {
        let pane_id = pane.id.clone();
        let bytes = bytes.to_vec();
        self.blocking(move |runner| inject_bytes(runner, &pane_id, &bytes))
    }

    fn send_text<'a>(
        &'a self,
        pane: &'a PaneRef,
        text: &'a str,
        opts: SendOptions,
    ) -> ControllerFuture<'a, ()> {
        if !opts.suppress_broadcast {
            tracing::debug!("send-keys targets {pane} only; broadcast request ignored");
        }
        let seq = send_keys_sequence(&pane.id, text);
        self.blocking(move |runner| {
            seq.run(runner)?;
            Ok(())
        })
    }

    fn buffer_snapshot<'a>(
        &'a self,
        pane: &'a PaneRef,
        max_lines: usize,
    ) -> ControllerFuture<'a, BufferSnapshot> {
        let pane_id = pane.id.clone();
        self.blocking(move |runner| {
            let lines = capture_from_top(runner, &pane_id, max_lines)?;
            // tmux addresses history from the oldest retained line and never
            // reports how many lines it dropped.
            Ok(BufferSnapshot { overflow: 0, lines })
        })
    }

    fn restart<'a>(&'a self, pane: &'a PaneRef) -> ControllerFuture<'a, ()> {
        let pane_id = pane.id.clone();
        self.blocking(move |runner| {
            runner.run(&["respawn-pane", "-k", "-t", &pane_id])?;
            Ok(())
        })
    }
}
