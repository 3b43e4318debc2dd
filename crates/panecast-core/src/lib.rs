//! panecast-core: pane orchestration flows.
//! Everything here talks to the terminal through the [`TerminalController`]
//! capability; the tmux adapter lives in `panecast-tmux`.

pub mod address;
pub mod controller;
pub mod error;
pub mod fake;
pub mod multi_node;
pub mod pacing;
pub mod pythonpath;
pub mod restart;
pub mod ssh;
pub mod topology;

pub use address::{
    AddressSource, FallbackPolicy, LocalAddrSource, PrimaryAddress, UdpRouteProbe,
    detect_primary_address, parse_sentinel,
};
pub use controller::{
    BufferSnapshot, CLEAR_SCROLLBACK, ControllerFuture, PaneRef, SendOptions, TabRef,
    TerminalController, WindowRef,
};
pub use error::{ControllerError, FlowError, InitStage};
pub use fake::{FakeCall, FakeController, FakeOp};
pub use multi_node::{InitReport, MultiNodeInit, broadcast_env, clear_all_buffers};
pub use pacing::{Pacing, ProbeWait};
pub use pythonpath::{PythonPathReport, append_python_paths};
pub use restart::{RestartReport, restart_all_panes};
pub use ssh::{SshReport, connect_remote_hosts};
pub use topology::{Absence, Resolved, Topology, resolve_topology};

/// Outcome of a flow that can stop early on a missing window, tab or pane.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    Aborted(Absence),
}

impl<T> Outcome<T> {
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(v) => Some(v),
            Outcome::Aborted(_) => None,
        }
    }
}
