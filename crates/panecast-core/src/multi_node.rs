//! Multi-node init: give every pane a `RANK` and a shared `MAIN_NODE_IP`.
//!
//! Stages run strictly in order:
//! start → topology-resolved → buffers-cleared → address-detected →
//! env-broadcast → done. A missing window, tab or pane aborts before any
//! pane is touched. A controller fault aborts wherever it happens; panes that
//! were already written keep their values.

use crate::Outcome;
use crate::address::{
    FallbackPolicy, LocalAddrSource, PrimaryAddress, UdpRouteProbe, detect_primary_address,
};
use crate::controller::{CLEAR_SCROLLBACK, SendOptions, TerminalController};
use crate::error::{ControllerError, FlowError, InitStage};
use crate::pacing::{Pacing, settle};
use crate::topology::{Resolved, Topology, resolve_topology};

pub const RANK_VAR: &str = "RANK";
pub const MAIN_NODE_IP_VAR: &str = "MAIN_NODE_IP";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InitReport {
    pub panes: usize,
    pub address: PrimaryAddress,
}

pub struct MultiNodeInit {
    pacing: Pacing,
    fallback: FallbackPolicy,
    local: Box<dyn LocalAddrSource>,
}

impl MultiNodeInit {
    pub fn new(pacing: Pacing) -> Self {
        Self {
            pacing,
            fallback: FallbackPolicy::default(),
            local: Box::new(UdpRouteProbe::default()),
        }
    }

    #[must_use]
    pub fn with_fallback_policy(mut self, policy: FallbackPolicy) -> Self {
        self.fallback = policy;
        self
    }

    #[must_use]
    pub fn with_local_addr_source(mut self, source: impl LocalAddrSource + 'static) -> Self {
        self.local = Box::new(source);
        self
    }

    pub async fn run<C>(&self, controller: &C) -> Result<Outcome<InitReport>, FlowError>
    where
        C: TerminalController + ?Sized,
    {
        let mut stage = InitStage::Start;

        let topology = match resolve_topology(controller)
            .await
            .map_err(FlowError::at(stage))?
        {
            Resolved::Topology(t) => t,
            Resolved::Absent(absence) => {
                tracing::debug!("multi-node init {}: {absence}", InitStage::Aborted);
                return Ok(Outcome::Aborted(absence));
            }
        };
        stage = advance(stage, InitStage::TopologyResolved);
        tracing::info!("found {} sessions (panels) in the current tab", topology.len());

        clear_all_buffers(controller, &topology, &self.pacing)
            .await
            .map_err(FlowError::at(stage))?;
        stage = advance(stage, InitStage::BuffersCleared);

        let address = detect_primary_address(
            controller,
            &topology,
            &self.pacing,
            self.local.as_ref(),
            self.fallback,
        )
        .await?;
        stage = advance(stage, InitStage::AddressDetected);

        broadcast_env(controller, &topology, &address, &self.pacing)
            .await
            .map_err(FlowError::at(stage))?;
        stage = advance(stage, InitStage::EnvBroadcast);

        advance(stage, InitStage::Done);
        Ok(Outcome::Completed(InitReport {
            panes: topology.len(),
            address,
        }))
    }
}

fn advance(from: InitStage, to: InitStage) -> InitStage {
    tracing::debug!("multi-node init: {from} -> {to}");
    to
}

/// Clear every pane's scrollback, waiting `clear_settle` after each one.
pub async fn clear_all_buffers<C>(
    controller: &C,
    topology: &Topology,
    pacing: &Pacing,
) -> Result<(), ControllerError>
where
    C: TerminalController + ?Sized,
{
    tracing::info!("clearing all session buffers");
    for (index, pane) in topology.ranked() {
        tracing::info!("clearing session {index} (ID: {pane})");
        controller.inject(pane, CLEAR_SCROLLBACK).await?;
        settle(pacing.clear_settle).await;
    }
    Ok(())
}

pub fn rank_command(rank: usize) -> String {
    format!("export {RANK_VAR}={rank}\n")
}

pub fn address_command(address: &str) -> String {
    format!("export {MAIN_NODE_IP_VAR}=\"{address}\"\n")
}

/// Send the rank and address exports to each pane in topology order.
pub async fn broadcast_env<C>(
    controller: &C,
    topology: &Topology,
    address: &PrimaryAddress,
    pacing: &Pacing,
) -> Result<(), ControllerError>
where
    C: TerminalController + ?Sized,
{
    tracing::info!(
        "setting environment variables across {} sessions",
        topology.len()
    );
    let address_cmd = address_command(&address.value);
    for (rank, pane) in topology.ranked() {
        tracing::info!("setting {RANK_VAR}={rank} in session {rank} (ID: {pane})");
        controller
            .send_text(pane, &rank_command(rank), SendOptions::isolated())
            .await?;

        tracing::info!("setting {MAIN_NODE_IP_VAR}={address} in session {rank}");
        controller
            .send_text(pane, &address_cmd, SendOptions::isolated())
            .await?;

        settle(pacing.broadcast_gap).await;
    }
    tracing::info!("environment variable setup completed for all sessions");
    Ok(())
}
