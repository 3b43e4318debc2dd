//! Deterministic in-memory controller.
//!
//! Applies every call synchronously and journals it, so flows can run with
//! [`crate::Pacing::immediate`] and assertions can look at the exact call order.

use std::collections::{HashMap, HashSet};
use std::future::ready;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::controller::{
    BufferSnapshot, ControllerFuture, PaneRef, SendOptions, TabRef, TerminalController, WindowRef,
};
use crate::error::ControllerError;

/// One journaled controller call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FakeCall {
    CurrentWindow,
    CurrentTab(String),
    Panes(String),
    Inject {
        pane: String,
        bytes: Vec<u8>,
    },
    SendText {
        pane: String,
        text: String,
        suppress_broadcast: bool,
    },
    Snapshot {
        pane: String,
        max_lines: usize,
    },
    Restart(String),
}

/// Call kinds that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FakeOp {
    CurrentWindow,
    CurrentTab,
    Panes,
    Inject,
    SendText,
    Snapshot,
    Restart,
}

#[derive(Debug, Default)]
struct ScriptedBuffer {
    lines: Vec<String>,
    /// Number of snapshot reads that still see an empty buffer.
    hidden_reads: usize,
}

#[derive(Debug, Default)]
struct State {
    calls: Vec<FakeCall>,
    buffers: HashMap<String, ScriptedBuffer>,
    reads: HashMap<String, usize>,
    /// `None` pane means every pane.
    failures: HashSet<(FakeOp, Option<String>)>,
}

#[derive(Debug)]
pub struct FakeController {
    window: Option<WindowRef>,
    tab: Option<TabRef>,
    panes: Vec<PaneRef>,
    state: Mutex<State>,
}

impl FakeController {
    /// One window, one tab, the given panes in order.
    pub fn with_panes(ids: &[&str]) -> Self {
        Self {
            window: Some(WindowRef("window-0".to_string())),
            tab: Some(TabRef("tab-0".to_string())),
            panes: ids.iter().map(|id| PaneRef::new(*id)).collect(),
            state: Mutex::new(State::default()),
        }
    }

    pub fn without_window() -> Self {
        Self {
            window: None,
            tab: None,
            ..Self::with_panes(&[])
        }
    }

    pub fn without_tab() -> Self {
        Self {
            tab: None,
            ..Self::with_panes(&[])
        }
    }

    /// Lines every snapshot of `pane` returns.
    #[must_use]
    pub fn with_output(self, pane: &str, lines: &[&str]) -> Self {
        self.with_delayed_output(pane, lines, 0)
    }

    /// Lines `pane` returns once `hidden_reads` snapshots have come back empty.
    #[must_use]
    pub fn with_delayed_output(self, pane: &str, lines: &[&str], hidden_reads: usize) -> Self {
        self.lock().buffers.insert(
            pane.to_string(),
            ScriptedBuffer {
                lines: lines.iter().map(|l| (*l).to_string()).collect(),
                hidden_reads,
            },
        );
        self
    }

    /// Make every call of kind `op` fail.
    #[must_use]
    pub fn failing(self, op: FakeOp) -> Self {
        self.lock().failures.insert((op, None));
        self
    }

    /// Make calls of kind `op` against `pane` fail.
    #[must_use]
    pub fn failing_on(self, op: FakeOp, pane: &str) -> Self {
        self.lock().failures.insert((op, Some(pane.to_string())));
        self
    }

    /// Journal of every call so far.
    pub fn calls(&self) -> Vec<FakeCall> {
        self.lock().calls.clone()
    }

    /// Text sent to `pane`, in order.
    pub fn sent_text(&self, pane: &str) -> Vec<String> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                FakeCall::SendText { pane: p, text, .. } if p == pane => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    /// Raw byte injections into `pane`, in order.
    pub fn injected(&self, pane: &str) -> Vec<Vec<u8>> {
        self.lock()
            .calls
            .iter()
            .filter_map(|c| match c {
                FakeCall::Inject { pane: p, bytes } if p == pane => Some(bytes.clone()),
                _ => None,
            })
            .collect()
    }

    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Journal `call`, then fail it if a matching failure is armed.
    fn record(&self, call: FakeCall, op: Option<(FakeOp, &str)>) -> Result<(), ControllerError> {
        let mut state = self.lock();
        state.calls.push(call);
        if let Some((op, pane)) = op {
            if state.failures.contains(&(op, None))
                || state.failures.contains(&(op, Some(pane.to_string())))
            {
                return Err(ControllerError::Rejected(format!("{op:?} on {pane}")));
            }
        }
        Ok(())
    }
}

impl TerminalController for FakeController {
    fn current_window(&self) -> ControllerFuture<'_, Option<WindowRef>> {
        let result = self
            .record(FakeCall::CurrentWindow, Some((FakeOp::CurrentWindow, "")))
            .map(|()| self.window.clone());
        Box::pin(ready(result))
    }

    fn current_tab<'a>(&'a self, window: &'a WindowRef) -> ControllerFuture<'a, Option<TabRef>> {
        let result = self
            .record(
                FakeCall::CurrentTab(window.0.clone()),
                Some((FakeOp::CurrentTab, window.0.as_str())),
            )
            .map(|()| self.tab.clone());
        Box::pin(ready(result))
    }

    fn panes<'a>(&'a self, tab: &'a TabRef) -> ControllerFuture<'a, Vec<PaneRef>> {
        let result = self
            .record(FakeCall::Panes(tab.0.clone()), Some((FakeOp::Panes, tab.0.as_str())))
            .map(|()| self.panes.clone());
        Box::pin(ready(result))
    }

    fn inject<'a>(&'a self, pane: &'a PaneRef, bytes: &'a [u8]) -> ControllerFuture<'a, ()> {
        let call = FakeCall::Inject {
            pane: pane.id.clone(),
            bytes: bytes.to_vec(),
        };
        Box::pin(ready(self.record(call, Some((FakeOp::Inject, &pane.id)))))
    }

    fn send_text<'a>(
        &'a self,
        pane: &'a PaneRef,
        text: &'a str,
        opts: SendOptions,
    ) -> ControllerFuture<'a, ()> {
        let call = FakeCall::SendText {
            pane: pane.id.clone(),
            text: text.to_string(),
            suppress_broadcast: opts.suppress_broadcast,
        };
        Box::pin(ready(self.record(call, Some((FakeOp::SendText, &pane.id)))))
    }

    fn buffer_snapshot<'a>(
        &'a self,
        pane: &'a PaneRef,
        max_lines: usize,
    ) -> ControllerFuture<'a, BufferSnapshot> {
        let call = FakeCall::Snapshot {
            pane: pane.id.clone(),
            max_lines,
        };
        let result = self
            .record(call, Some((FakeOp::Snapshot, &pane.id)))
            .map(|()| {
                let mut state = self.lock();
                let seen = {
                    let reads = state.reads.entry(pane.id.clone()).or_insert(0);
                    *reads += 1;
                    *reads - 1
                };
                let lines = match state.buffers.get(&pane.id) {
                    Some(buf) if seen >= buf.hidden_reads => {
                        buf.lines.iter().take(max_lines).cloned().collect()
                    }
                    _ => Vec::new(),
                };
                BufferSnapshot { overflow: 0, lines }
            });
        Box::pin(ready(result))
    }

    fn restart<'a>(&'a self, pane: &'a PaneRef) -> ControllerFuture<'a, ()> {
        let call = FakeCall::Restart(pane.id.clone());
        Box::pin(ready(self.record(call, Some((FakeOp::Restart, &pane.id)))))
    }
}
