//! Primary-address detection: the address every pane coordinates against.
//!
//! One pane means loopback. Otherwise the first pane runs a shell probe that
//! echoes a sentinel line, and the buffer is parsed for it. Any failure on
//! that path falls back to the local address a UDP route lookup picks, and
//! failing that, loopback again.

use std::fmt;
use std::net::{IpAddr, Ipv4Addr, SocketAddr, UdpSocket};

use tokio::time::Instant;

use crate::controller::{CLEAR_SCROLLBACK, PaneRef, SendOptions, TerminalController};
use crate::error::{ControllerError, FlowError};
use crate::pacing::{Pacing, ProbeWait, settle};
use crate::topology::Topology;

pub const LOOPBACK: &str = "127.0.0.1";

/// Prefix the probe command prints before the address.
pub const SENTINEL: &str = "MAIN_NODE_IP=";

/// Shell command typed into the first pane.
pub const PROBE_COMMAND: &str = "echo MAIN_NODE_IP=$(hostname -I | awk '{print $1}')";

/// Lines read back after the probe.
pub const PROBE_READ_LINES: usize = 10;

/// Non-routable target used to make the kernel pick an outbound interface.
const ROUTE_PROBE_TARGET: SocketAddr =
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 255, 255, 255)), 1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressSource {
    /// Single pane, nothing to coordinate.
    Loopback,
    /// Parsed from the first pane's probe output.
    Probe,
    /// Local interface picked by a UDP route lookup.
    LocalRoute,
    /// Both probe and route lookup failed.
    LoopbackFallback,
}

impl AddressSource {
    /// True when the address did not come from the first pane's own output.
    pub fn is_fallback(self) -> bool {
        matches!(self, AddressSource::LocalRoute | AddressSource::LoopbackFallback)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrimaryAddress {
    pub value: String,
    pub source: AddressSource,
}

impl PrimaryAddress {
    fn new(value: impl Into<String>, source: AddressSource) -> Self {
        Self {
            value: value.into(),
            source,
        }
    }
}

impl fmt::Display for PrimaryAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Whether a fallback address may be used when the probe fails.
///
/// A local or loopback address is only right when every pane runs on this
/// machine. `Deny` refuses to guess for multi-pane runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    #[default]
    Allow,
    Deny,
}

/// Source of this machine's outbound address.
pub trait LocalAddrSource: Send + Sync {
    fn local_addr(&self) -> std::io::Result<IpAddr>;
}

/// Connects an unbound UDP socket to a non-routable address and reads back the
/// local end. No packet is sent.
#[derive(Debug, Clone, Copy)]
pub struct UdpRouteProbe {
    target: SocketAddr,
}

impl UdpRouteProbe {
    pub fn new(target: SocketAddr) -> Self {
        Self { target }
    }
}

impl Default for UdpRouteProbe {
    fn default() -> Self {
        Self::new(ROUTE_PROBE_TARGET)
    }
}

impl LocalAddrSource for UdpRouteProbe {
    fn local_addr(&self) -> std::io::Result<IpAddr> {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        socket.connect(self.target)?;
        Ok(socket.local_addr()?.ip())
    }
}

/// First line whose trimmed content starts with [`SENTINEL`] and carries a
/// non-empty value.
pub fn parse_sentinel<S: AsRef<str>>(lines: &[S]) -> Option<String> {
    for line in lines {
        let content = line.as_ref().trim();
        tracing::debug!("parsing line: {content}");
        if let Some(rest) = content.strip_prefix(SENTINEL) {
            let value = rest.trim();
            if !value.is_empty() {
                return Some(value.to_string());
            }
        }
    }
    None
}

/// Local route address, or loopback if the lookup fails.
pub fn local_fallback(local: &dyn LocalAddrSource) -> PrimaryAddress {
    tracing::info!("using fallback method to detect local machine IP");
    match local.local_addr() {
        Ok(ip) => {
            tracing::info!("fallback successful: detected local IP {ip}");
            PrimaryAddress::new(ip.to_string(), AddressSource::LocalRoute)
        }
        Err(e) => {
            tracing::warn!("fallback failed, using localhost: {e}");
            PrimaryAddress::new(LOOPBACK, AddressSource::LoopbackFallback)
        }
    }
}

/// Detect the address all panes coordinate against.
pub async fn detect_primary_address<C>(
    controller: &C,
    topology: &Topology,
    pacing: &Pacing,
    local: &dyn LocalAddrSource,
    policy: FallbackPolicy,
) -> Result<PrimaryAddress, FlowError>
where
    C: TerminalController + ?Sized,
{
    if topology.len() <= 1 {
        tracing::info!("single session detected, using localhost as main node IP");
        return Ok(PrimaryAddress::new(LOOPBACK, AddressSource::Loopback));
    }

    let first = &topology.panes[0];
    tracing::info!("attempting to detect IP from session 0 (ID: {first})");

    match probe_pane(controller, first, pacing).await {
        Ok(Some(ip)) => {
            tracing::info!("detected IP from session 0: {ip}");
            return Ok(PrimaryAddress::new(ip, AddressSource::Probe));
        }
        Ok(None) => tracing::info!("could not parse IP from session output"),
        Err(e) => tracing::warn!("error detecting IP from session 0: {e}"),
    }

    if policy == FallbackPolicy::Deny {
        return Err(FlowError::FallbackDenied);
    }
    let addr = local_fallback(local);
    tracing::warn!(
        "main node IP {addr} was not read from session 0; \
         remote panes may not reach it"
    );
    Ok(addr)
}

/// Clear the pane, run the probe command, and read the sentinel back.
async fn probe_pane<C>(
    controller: &C,
    pane: &PaneRef,
    pacing: &Pacing,
) -> Result<Option<String>, ControllerError>
where
    C: TerminalController + ?Sized,
{
    controller.inject(pane, CLEAR_SCROLLBACK).await?;
    settle(pacing.clear_settle).await;

    tracing::info!("executing IP detection command: '{PROBE_COMMAND}'");
    let command = format!("{PROBE_COMMAND}\n");
    controller
        .send_text(pane, &command, SendOptions::isolated())
        .await?;

    match pacing.probe_wait {
        ProbeWait::Fixed(wait) => {
            tracing::info!("waiting {:.1} seconds for command output", wait.as_secs_f64());
            settle(wait).await;
            read_sentinel(controller, pane).await
        }
        ProbeWait::Poll { timeout, interval } => {
            let deadline = Instant::now() + timeout;
            loop {
                if let Some(ip) = read_sentinel(controller, pane).await? {
                    return Ok(Some(ip));
                }
                if Instant::now() >= deadline {
                    return Ok(None);
                }
                settle(interval).await;
            }
        }
    }
}

async fn read_sentinel<C>(controller: &C, pane: &PaneRef) -> Result<Option<String>, ControllerError>
where
    C: TerminalController + ?Sized,
{
    let snapshot = controller.buffer_snapshot(pane, PROBE_READ_LINES).await?;
    tracing::debug!(
        "retrieved {} lines from session buffer (overflow {})",
        snapshot.lines.len(),
        snapshot.overflow
    );
    Ok(parse_sentinel(&snapshot.lines))
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::time::Duration;

    use super::*;
    use crate::fake::{FakeCall, FakeController, FakeOp};
    use crate::topology::{Resolved, resolve_topology};

    struct FixedAddr(Option<IpAddr>);

    impl LocalAddrSource for FixedAddr {
        fn local_addr(&self) -> io::Result<IpAddr> {
            self.0
                .ok_or_else(|| io::Error::new(io::ErrorKind::AddrNotAvailable, "no route"))
        }
    }

    const LAN: FixedAddr = FixedAddr(Some(IpAddr::V4(Ipv4Addr::new(192, 168, 1, 20))));

    async fn topology(fake: &FakeController) -> Topology {
        match resolve_topology(fake).await.expect("resolve") {
            Resolved::Topology(t) => t,
            Resolved::Absent(a) => panic!("unexpected absence: {a}"),
        }
    }

    // ─── parse_sentinel ──────────────────────────────────────────────

    #[test]
    fn parse_first_match_wins() {
        let lines = ["$ echo", "MAIN_NODE_IP=1.2.3.4", "MAIN_NODE_IP=5.6.7.8"];
        assert_eq!(parse_sentinel(&lines), Some("1.2.3.4".to_string()));
    }

    #[test]
    fn parse_trims_surrounding_whitespace() {
        let lines = ["   MAIN_NODE_IP=10.0.0.5   "];
        assert_eq!(parse_sentinel(&lines), Some("10.0.0.5".to_string()));
    }

    #[test]
    fn parse_skips_empty_value() {
        let lines = ["MAIN_NODE_IP=", "MAIN_NODE_IP=  ", "MAIN_NODE_IP=10.1.1.1"];
        assert_eq!(parse_sentinel(&lines), Some("10.1.1.1".to_string()));
    }

    #[test]
    fn parse_ignores_echoed_command_line() {
        let lines = ["user@host:~$ echo MAIN_NODE_IP=$(hostname -I | awk '{print $1}')"];
        assert_eq!(parse_sentinel(&lines), None);
    }

    #[test]
    fn parse_no_lines() {
        let lines: [&str; 0] = [];
        assert_eq!(parse_sentinel(&lines), None);
    }

    // ─── local_fallback ──────────────────────────────────────────────

    #[test]
    fn fallback_uses_route_address() {
        let addr = local_fallback(&LAN);
        assert_eq!(addr.value, "192.168.1.20");
        assert_eq!(addr.source, AddressSource::LocalRoute);
    }

    #[test]
    fn fallback_failure_is_loopback() {
        let addr = local_fallback(&FixedAddr(None));
        assert_eq!(addr.value, LOOPBACK);
        assert_eq!(addr.source, AddressSource::LoopbackFallback);
        assert!(addr.source.is_fallback());
    }

    // ─── detect_primary_address ──────────────────────────────────────

    #[tokio::test]
    async fn single_pane_is_loopback_without_probe() {
        let fake = FakeController::with_panes(&["%0"]);
        let topo = topology(&fake).await;
        let addr = detect_primary_address(
            &fake,
            &topo,
            &Pacing::immediate(),
            &LAN,
            FallbackPolicy::Allow,
        )
        .await
        .expect("detect");
        assert_eq!(addr, PrimaryAddress::new(LOOPBACK, AddressSource::Loopback));
        assert!(fake.sent_text("%0").is_empty());
        assert!(fake.injected("%0").is_empty());
    }

    #[tokio::test]
    async fn probe_output_is_parsed() {
        let fake = FakeController::with_panes(&["%0", "%1"])
            .with_output("%0", &["$ echo ...", "MAIN_NODE_IP=10.0.0.5", "$"]);
        let topo = topology(&fake).await;
        let addr = detect_primary_address(
            &fake,
            &topo,
            &Pacing::immediate(),
            &LAN,
            FallbackPolicy::Allow,
        )
        .await
        .expect("detect");
        assert_eq!(addr, PrimaryAddress::new("10.0.0.5", AddressSource::Probe));
        assert_eq!(fake.sent_text("%0"), vec![format!("{PROBE_COMMAND}\n")]);
        assert_eq!(fake.injected("%0"), vec![CLEAR_SCROLLBACK.to_vec()]);
        assert!(fake.calls().contains(&FakeCall::Snapshot {
            pane: "%0".into(),
            max_lines: PROBE_READ_LINES
        }));
    }

    #[tokio::test]
    async fn no_sentinel_falls_back() {
        let fake =
            FakeController::with_panes(&["%0", "%1"]).with_output("%0", &["command not found"]);
        let topo = topology(&fake).await;
        let addr = detect_primary_address(
            &fake,
            &topo,
            &Pacing::immediate(),
            &LAN,
            FallbackPolicy::Allow,
        )
        .await
        .expect("detect");
        assert_eq!(addr.value, "192.168.1.20");
        assert_eq!(addr.source, AddressSource::LocalRoute);
    }

    #[tokio::test]
    async fn probe_fault_falls_back() {
        let fake = FakeController::with_panes(&["%0", "%1"])
            .with_output("%0", &["MAIN_NODE_IP=10.0.0.5"])
            .failing_on(FakeOp::Snapshot, "%0");
        let topo = topology(&fake).await;
        let addr = detect_primary_address(
            &fake,
            &topo,
            &Pacing::immediate(),
            &FixedAddr(None),
            FallbackPolicy::Allow,
        )
        .await
        .expect("detect");
        assert_eq!(addr.source, AddressSource::LoopbackFallback);
    }

    #[tokio::test]
    async fn deny_policy_refuses_fallback() {
        let fake = FakeController::with_panes(&["%0", "%1"]);
        let topo = topology(&fake).await;
        let err = detect_primary_address(
            &fake,
            &topo,
            &Pacing::immediate(),
            &LAN,
            FallbackPolicy::Deny,
        )
        .await
        .expect_err("fallback denied");
        assert!(matches!(err, FlowError::FallbackDenied));
    }

    #[tokio::test(start_paused = true)]
    async fn fixed_wait_reads_once_after_delay() {
        let fake = FakeController::with_panes(&["%0", "%1"])
            .with_output("%0", &["MAIN_NODE_IP=10.0.0.9"]);
        let topo = topology(&fake).await;
        let start = Instant::now();
        let addr =
            detect_primary_address(&fake, &topo, &Pacing::default(), &LAN, FallbackPolicy::Allow)
                .await
                .expect("detect");
        assert_eq!(addr.value, "10.0.0.9");
        // 0.5s settle after the clear, 4s for the probe.
        assert!(start.elapsed() >= Duration::from_millis(4500));
        let reads = fake
            .calls()
            .iter()
            .filter(|c| matches!(c, FakeCall::Snapshot { .. }))
            .count();
        assert_eq!(reads, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_wait_stops_at_first_hit() {
        let fake = FakeController::with_panes(&["%0", "%1"]).with_delayed_output(
            "%0",
            &["MAIN_NODE_IP=10.0.0.7"],
            2,
        );
        let topo = topology(&fake).await;
        let pacing = Pacing {
            probe_wait: ProbeWait::Poll {
                timeout: Duration::from_secs(4),
                interval: Duration::from_millis(200),
            },
            ..Pacing::immediate()
        };
        let addr = detect_primary_address(&fake, &topo, &pacing, &LAN, FallbackPolicy::Allow)
            .await
            .expect("detect");
        assert_eq!(addr, PrimaryAddress::new("10.0.0.7", AddressSource::Probe));
        let reads = fake
            .calls()
            .iter()
            .filter(|c| matches!(c, FakeCall::Snapshot { .. }))
            .count();
        assert_eq!(reads, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn poll_wait_times_out_into_fallback() {
        let fake = FakeController::with_panes(&["%0", "%1"]);
        let topo = topology(&fake).await;
        let pacing = Pacing {
            probe_wait: ProbeWait::Poll {
                timeout: Duration::from_secs(1),
                interval: Duration::from_millis(300),
            },
            ..Pacing::immediate()
        };
        let addr = detect_primary_address(&fake, &topo, &pacing, &LAN, FallbackPolicy::Allow)
            .await
            .expect("detect");
        assert_eq!(addr.source, AddressSource::LocalRoute);
    }
}
