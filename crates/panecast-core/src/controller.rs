//! Terminal controller capability: the only way flows touch the terminal.

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use serde::Serialize;

use crate::error::ControllerError;

/// Escape sequence that asks the terminal to drop its scrollback history.
pub const CLEAR_SCROLLBACK: &[u8] = b"\x1b]1337;ClearScrollback\x07";

/// Boxed future returned by every controller call.
pub type ControllerFuture<'a, T> =
    Pin<Box<dyn Future<Output = Result<T, ControllerError>> + Send + 'a>>;

/// Opaque handle to the active window.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct WindowRef(pub String);

/// Opaque handle to a tab (a group of panes shown together).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct TabRef(pub String);

/// Opaque handle to one pane. Borrowed from the controller for one invocation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PaneRef {
    pub id: String,
}

impl PaneRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

impl fmt::Display for WindowRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for TabRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for PaneRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.id)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SendOptions {
    /// Keep the text out of sibling panes even when input broadcast is on.
    pub suppress_broadcast: bool,
}

impl SendOptions {
    pub const fn isolated() -> Self {
        Self {
            suppress_broadcast: true,
        }
    }
}

impl Default for SendOptions {
    fn default() -> Self {
        Self::isolated()
    }
}

/// Lines read back from a pane in one point-in-time read.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BufferSnapshot {
    /// Lines dropped off the top of the buffer before the first returned line.
    pub overflow: u64,
    pub lines: Vec<String>,
}

/// Capability interface over the terminal multiplexer.
///
/// Implementations: `TmuxController` (production) and [`crate::FakeController`].
pub trait TerminalController: Send + Sync {
    /// Active window, or `None` when no window is open.
    fn current_window(&self) -> ControllerFuture<'_, Option<WindowRef>>;

    /// Active tab of `window`.
    fn current_tab<'a>(&'a self, window: &'a WindowRef) -> ControllerFuture<'a, Option<TabRef>>;

    /// Panes of `tab` in the controller's order.
    fn panes<'a>(&'a self, tab: &'a TabRef) -> ControllerFuture<'a, Vec<PaneRef>>;

    /// Write raw control bytes to the pane's display.
    fn inject<'a>(&'a self, pane: &'a PaneRef, bytes: &'a [u8]) -> ControllerFuture<'a, ()>;

    /// Type `text` into the pane as if entered on the keyboard.
    fn send_text<'a>(
        &'a self,
        pane: &'a PaneRef,
        text: &'a str,
        opts: SendOptions,
    ) -> ControllerFuture<'a, ()>;

    /// Read up to `max_lines` lines starting at the overflow offset.
    /// The line info lookup and the read happen inside one transaction.
    fn buffer_snapshot<'a>(
        &'a self,
        pane: &'a PaneRef,
        max_lines: usize,
    ) -> ControllerFuture<'a, BufferSnapshot>;

    /// Restart the pane's shell.
    fn restart<'a>(&'a self, pane: &'a PaneRef) -> ControllerFuture<'a, ()>;
}

impl<T: TerminalController + ?Sized> TerminalController for &T {
    fn current_window(&self) -> ControllerFuture<'_, Option<WindowRef>> {
        (**self).current_window()
    }

    fn current_tab<'a>(&'a self, window: &'a WindowRef) -> ControllerFuture<'a, Option<TabRef>> {
        (**self).current_tab(window)
    }

    fn panes<'a>(&'a self, tab: &'a TabRef) -> ControllerFuture<'a, Vec<PaneRef>> {
        (**self).panes(tab)
    }

    fn inject<'a>(&'a self, pane: &'a PaneRef, bytes: &'a [u8]) -> ControllerFuture<'a, ()> {
        (**self).inject(pane, bytes)
    }

    fn send_text<'a>(
        &'a self,
        pane: &'a PaneRef,
        text: &'a str,
        opts: SendOptions,
    ) -> ControllerFuture<'a, ()> {
        (**self).send_text(pane, text, opts)
    }

    fn buffer_snapshot<'a>(
        &'a self,
        pane: &'a PaneRef,
        max_lines: usize,
    ) -> ControllerFuture<'a, BufferSnapshot> {
        (**self).buffer_snapshot(pane, max_lines)
    }

    fn restart<'a>(&'a self, pane: &'a PaneRef) -> ControllerFuture<'a, ()> {
        (**self).restart(pane)
    }
}
