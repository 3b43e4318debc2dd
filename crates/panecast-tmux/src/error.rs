//! Error types for the tmux backend.

use panecast_core::ControllerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TmuxError {
    #[error("tmux command failed: {0}")]
    CommandFailed(String),

    #[error("failed to parse list-panes line {line_num}: {detail}")]
    ParseError { line_num: usize, detail: String },

    #[error("tmux io error: {0}")]
    Io(#[from] std::io::Error),
}

impl TmuxError {
    /// tmux reports a missing server, client or target rather than an empty
    /// result. Those mean "nothing there", not a failure.
    pub fn is_absent_target(&self) -> bool {
        match self {
            TmuxError::CommandFailed(msg) => {
                let msg = msg.to_ascii_lowercase();
                ["no server running", "error connecting to", "no current", "can't find"]
                    .iter()
                    .any(|needle| msg.contains(needle))
            }
            _ => false,
        }
    }
}

impl From<TmuxError> for ControllerError {
    fn from(err: TmuxError) -> Self {
        match err {
            TmuxError::Io(io) => ControllerError::Io(io),
            other => ControllerError::Rejected(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn absent_target_messages() {
        for msg in [
            "exit code 1: no server running on /tmp/tmux-501/default",
            "exit code 1: error connecting to /tmp/tmux-501/default (No such file or directory)",
            "exit code 1: can't find session: $9",
            "exit code 1: no current client",
        ] {
            assert!(TmuxError::CommandFailed(msg.into()).is_absent_target(), "{msg}");
        }
    }

    #[test]
    fn other_failures_are_not_absence() {
        let failed = TmuxError::CommandFailed("exit code 1: unknown command".into());
        assert!(!failed.is_absent_target());
        let io = TmuxError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "tmux"));
        assert!(!io.is_absent_target());
    }

    #[test]
    fn converts_into_controller_error() {
        let err: ControllerError = TmuxError::CommandFailed("boom".into()).into();
        assert!(matches!(err, ControllerError::Rejected(ref m) if m.contains("boom")));
        let err: ControllerError =
            TmuxError::Io(std::io::Error::new(std::io::ErrorKind::NotFound, "x")).into();
        assert!(matches!(err, ControllerError::Io(_)));
    }
}
