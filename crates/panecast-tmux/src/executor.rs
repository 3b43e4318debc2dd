//! TmuxCommandRunner trait and TmuxExecutor (sync subprocess wrapper).

use crate::error::TmuxError;

/// Runs one tmux invocation. Mock it in tests.
pub trait TmuxCommandRunner: Send + Sync {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError>;
}

impl<T: TmuxCommandRunner + ?Sized> TmuxCommandRunner for &T {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        (**self).run(args)
    }
}

/// Several tmux commands sent in one invocation, separated by `;`.
///
/// The server runs them back to back without serving other clients in
/// between, so a sequence behaves like a small transaction.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CommandSequence {
    args: Vec<String>,
}

impl CommandSequence {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn then<I, S>(mut self, command: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        if !self.args.is_empty() {
            self.args.push(";".to_string());
        }
        self.args.extend(command.into_iter().map(Into::into));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn run(&self, runner: &impl TmuxCommandRunner) -> Result<String, TmuxError> {
        if self.is_empty() {
            return Ok(String::new());
        }
        let args: Vec<&str> = self.args.iter().map(String::as_str).collect();
        runner.run(&args)
    }
}

/// Real tmux executor using `std::process::Command`.
pub struct TmuxExecutor {
    tmux_bin: String,
    socket_path: Option<String>,
    socket_name: Option<String>,
}

impl TmuxExecutor {
    pub fn new(tmux_bin: impl Into<String>) -> Self {
        Self {
            tmux_bin: tmux_bin.into(),
            socket_path: None,
            socket_name: None,
        }
    }

    #[must_use]
    pub fn with_socket_path(mut self, path: impl Into<String>) -> Self {
        self.socket_path = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_socket_name(mut self, name: impl Into<String>) -> Self {
        self.socket_name = Some(name.into());
        self
    }

    fn socket_args(&self) -> Option<[&str; 2]> {
        // Socket path takes precedence over socket name
        if let Some(path) = self.socket_path.as_deref() {
            Some(["-S", path])
        } else {
            self.socket_name.as_deref().map(|name| ["-L", name])
        }
    }
}

impl Default for TmuxExecutor {
    fn default() -> Self {
        Self::new("tmux")
    }
}

impl TmuxCommandRunner for TmuxExecutor {
    fn run(&self, args: &[&str]) -> Result<String, TmuxError> {
        let mut cmd = std::process::Command::new(&self.tmux_bin);
        if let Some(socket) = self.socket_args() {
            cmd.args(socket);
        }
        cmd.args(args);
        tracing::trace!("tmux {}", args.join(" "));
        let output = cmd.output().map_err(TmuxError::Io)?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(TmuxError::CommandFailed(format!(
                "exit code {}: {}",
                output.status.code().unwrap_or(-1),
                stderr.trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
