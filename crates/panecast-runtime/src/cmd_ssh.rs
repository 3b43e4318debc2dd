//! `panecast ssh`: spread ssh logins across the panes.

use panecast_core::{Outcome, TerminalController, connect_remote_hosts};

use crate::cli::SshOpts;

pub async fn cmd_ssh<C>(controller: &C, opts: &SshOpts) -> anyhow::Result<String>
where
    C: TerminalController + ?Sized,
{
    match connect_remote_hosts(controller, &opts.hosts, &opts.user, opts.execute).await? {
        Outcome::Completed(report) => {
            for (pane, host) in &report.assignments {
                tracing::info!("{pane} -> {}@{host}", opts.user);
            }
            Ok(format!("Sent ssh commands to {} panes.", report.assignments.len()))
        }
        Outcome::Aborted(absence) => Ok(absence.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use panecast_core::FakeController;

    use super::*;

    fn opts(hosts: &[&str]) -> SshOpts {
        SshOpts {
            hosts: hosts.iter().map(|h| (*h).to_string()).collect(),
            user: "admin".to_string(),
            execute: false,
        }
    }

    #[tokio::test]
    async fn reports_pane_count() {
        let fake = FakeController::with_panes(&["%0", "%1", "%2"]);
        let msg = cmd_ssh(&fake, &opts(&["a", "b"])).await.expect("ssh");
        assert_eq!(msg, "Sent ssh commands to 3 panes.");
        assert_eq!(fake.sent_text("%2"), vec!["ssh admin@b"]);
    }

    #[tokio::test]
    async fn no_tab_message() {
        let fake = FakeController::without_tab();
        let msg = cmd_ssh(&fake, &opts(&["a"])).await.expect("ssh");
        assert_eq!(msg, "No active tab found in the current window.");
    }
}
