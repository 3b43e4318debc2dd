//! Distribute SSH logins across the panes of the current tab.

use crate::Outcome;
use crate::controller::{SendOptions, TerminalController};
use crate::error::{FlowError, InitStage};
use crate::topology::{Resolved, resolve_topology};

/// Pane `i` starts at host `(i + HOST_OFFSET) % hosts.len()`.
pub const HOST_OFFSET: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SshReport {
    /// `(pane id, host)` in pane order.
    pub assignments: Vec<(String, String)>,
}

/// Host assigned to the pane at `index`. `hosts` must not be empty.
pub fn host_for_pane(hosts: &[String], index: usize) -> &str {
    &hosts[(index + HOST_OFFSET) % hosts.len()]
}

/// Type `ssh <user>@<host>` into every pane. The command is only executed
/// when `execute` is set; otherwise it waits on the prompt for review.
pub async fn connect_remote_hosts<C>(
    controller: &C,
    hosts: &[String],
    username: &str,
    execute: bool,
) -> Result<Outcome<SshReport>, FlowError>
where
    C: TerminalController + ?Sized,
{
    if hosts.is_empty() {
        return Err(FlowError::NoHosts);
    }

    let topology = match resolve_topology(controller)
        .await
        .map_err(FlowError::at(InitStage::Start))?
    {
        Resolved::Topology(t) => t,
        Resolved::Absent(absence) => return Ok(Outcome::Aborted(absence)),
    };

    let mut assignments = Vec::with_capacity(topology.len());
    for (index, pane) in topology.ranked() {
        let host = host_for_pane(hosts, index);
        let mut command = format!("ssh {username}@{host}");
        if execute {
            command.push('\n');
        }
        tracing::debug!("pane {pane}: {}", command.trim_end());
        controller
            .send_text(pane, &command, SendOptions::isolated())
            .await
            .map_err(FlowError::at(InitStage::TopologyResolved))?;
        assignments.push((pane.id.clone(), host.to_string()));
    }
    Ok(Outcome::Completed(SshReport { assignments }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake::{FakeController, FakeOp};
    use crate::topology::Absence;

    fn hosts(names: &[&str]) -> Vec<String> {
        names.iter().map(|h| (*h).to_string()).collect()
    }

    #[test]
    fn round_robin_with_offset() {
        let h = hosts(&["a", "b", "c"]);
        let picked: Vec<&str> = (0..4).map(|i| host_for_pane(&h, i)).collect();
        // (0+5)%3=2, (1+5)%3=0, (2+5)%3=1, (3+5)%3=2
        assert_eq!(picked, vec!["c", "a", "b", "c"]);
    }

    #[test]
    fn single_host_everywhere() {
        let h = hosts(&["only"]);
        assert!((0..6).all(|i| host_for_pane(&h, i) == "only"));
    }

    #[tokio::test]
    async fn sends_without_newline_by_default() {
        let fake = FakeController::with_panes(&["%0", "%1"]);
        let report = connect_remote_hosts(&fake, &hosts(&["10.0.0.1", "10.0.0.2"]), "admin", false)
            .await
            .expect("connect")
            .completed()
            .expect("completed");
        // (0+5)%2=1, (1+5)%2=0
        assert_eq!(fake.sent_text("%0"), vec!["ssh admin@10.0.0.2"]);
        assert_eq!(fake.sent_text("%1"), vec!["ssh admin@10.0.0.1"]);
        assert_eq!(
            report.assignments,
            vec![
                ("%0".to_string(), "10.0.0.2".to_string()),
                ("%1".to_string(), "10.0.0.1".to_string()),
            ]
        );
    }

    #[tokio::test]
    async fn execute_appends_newline() {
        let fake = FakeController::with_panes(&["%0"]);
        connect_remote_hosts(&fake, &hosts(&["h"]), "root", true)
            .await
            .expect("connect");
        assert_eq!(fake.sent_text("%0"), vec!["ssh root@h\n"]);
    }

    #[tokio::test]
    async fn empty_host_list_touches_nothing() {
        let fake = FakeController::with_panes(&["%0"]);
        let err = connect_remote_hosts(&fake, &[], "root", false)
            .await
            .expect_err("no hosts");
        assert!(matches!(err, FlowError::NoHosts));
        assert!(fake.calls().is_empty());
    }

    #[tokio::test]
    async fn absent_tab_is_reported() {
        let fake = FakeController::without_tab();
        let outcome = connect_remote_hosts(&fake, &hosts(&["h"]), "root", false)
            .await
            .expect("connect");
        assert_eq!(outcome, Outcome::Aborted(Absence::NoTab));
    }

    #[tokio::test]
    async fn send_failure_propagates() {
        let fake = FakeController::with_panes(&["%0"]).failing(FakeOp::SendText);
        let err = connect_remote_hosts(&fake, &hosts(&["h"]), "root", false)
            .await
            .expect_err("send fails");
        assert!(matches!(err, FlowError::Controller { .. }));
    }
}
