//! Error types for controller calls and orchestration flows.

use std::fmt;

use thiserror::Error;

/// Failure reported by a [`crate::TerminalController`] implementation.
#[derive(Debug, Error)]
pub enum ControllerError {
    #[error("pane {0} is not available")]
    PaneGone(String),

    #[error("terminal controller rejected request: {0}")]
    Rejected(String),

    #[error("terminal controller io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Position in the multi-node init flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitStage {
    Start,
    TopologyResolved,
    BuffersCleared,
    AddressDetected,
    EnvBroadcast,
    Done,
    Aborted,
}

impl fmt::Display for InitStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InitStage::Start => "start",
            InitStage::TopologyResolved => "topology-resolved",
            InitStage::BuffersCleared => "buffers-cleared",
            InitStage::AddressDetected => "address-detected",
            InitStage::EnvBroadcast => "env-broadcast",
            InitStage::Done => "done",
            InitStage::Aborted => "aborted",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Error)]
pub enum FlowError {
    /// A controller call failed; `stage` is the last stage reached.
    #[error("controller call failed after stage {stage}: {source}")]
    Controller {
        stage: InitStage,
        #[source]
        source: ControllerError,
    },

    #[error("main node address could not be probed and fallback is disabled")]
    FallbackDenied,

    #[error("no remote hosts given")]
    NoHosts,
}

impl FlowError {
    pub(crate) fn at(stage: InitStage) -> impl FnOnce(ControllerError) -> FlowError {
        move |source| FlowError::Controller { stage, source }
    }
}
