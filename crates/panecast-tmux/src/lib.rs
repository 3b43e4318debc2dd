//! panecast-tmux: tmux backend for the terminal controller capability.
//! Maps windows, tabs and panes onto tmux sessions, windows and panes, and
//! runs every request through an injectable [`TmuxCommandRunner`].

pub mod capture;
pub mod controller;
pub mod error;
pub mod executor;
pub mod pane_info;

pub use capture::{capture_from_top, parse_capture_output};
pub use controller::TmuxController;
pub use error::TmuxError;
pub use executor::{CommandSequence, TmuxCommandRunner, TmuxExecutor};
pub use pane_info::{LIST_PANES_FORMAT, TmuxPaneEntry, list_window_panes, parse_list_panes_output};
