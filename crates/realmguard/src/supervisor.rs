//! Reconnection supervisor.
//!
//! Wraps the whole session lifecycle:
//!
//! ```text
//! Connecting ──(ok)──→ Connected ──(error | kicked | closed)──┐
//!     ▲  │                                                    │
//!     │  └──(connect failed)──────────────────────────────────┤
//!     │                                                       ▼
//!     └─────────────────(delay elapsed)──────────────── Reconnecting
//! ```
//!
//! Every session starts from scratch: a new connection, a new roster
//! tracker, no presence state carried over.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use realmguard_moderation::Verifier;
use realmguard_protocol::ChannelMessage;
use tokio::sync::{mpsc, watch};
use tracing::{debug, error, info, warn};

use crate::handler::{BridgeContext, SessionEnd, run_session};
use crate::notify::{self, NotificationSink};
use crate::session::{GameSession, SessionConnector};

// ---------------------------------------------------------------------------
// ReconnectPolicy
// ---------------------------------------------------------------------------

/// How long to wait before re-establishing a lost session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconnectPolicy {
    /// Same delay every time, retried forever.
    Fixed(Duration),
    /// Doubles per consecutive failure, capped at `max`. Resets after a
    /// successful connect.
    Exponential { initial: Duration, max: Duration },
}

impl ReconnectPolicy {
    /// Default fixed delay.
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(5);

    /// Delay before reconnect attempt number `attempt` (1-based count of
    /// consecutive failures).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match *self {
            Self::Fixed(delay) => delay,
            Self::Exponential { initial, max } => {
                let factor = 1u32
                    .checked_shl(attempt.saturating_sub(1))
                    .unwrap_or(u32::MAX);
                initial.saturating_mul(factor).min(max)
            }
        }
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self::Fixed(Self::DEFAULT_DELAY)
    }
}

// ---------------------------------------------------------------------------
// LinkState
// ---------------------------------------------------------------------------

/// Where the supervisor is in the session lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    Connecting,
    Connected,
    /// Waiting out the delay before attempt `attempt`.
    Reconnecting { attempt: u32 },
}

impl fmt::Display for LinkState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Reconnecting { attempt } => write!(f, "Reconnecting({attempt})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Supervisor
// ---------------------------------------------------------------------------

/// Owns the connector and keeps a session running.
pub(crate) struct Supervisor<C, V, N> {
    pub(crate) connector: C,
    pub(crate) ctx: Arc<BridgeContext<V, N>>,
    pub(crate) policy: ReconnectPolicy,
    pub(crate) inbound: mpsc::Receiver<ChannelMessage>,
    pub(crate) state: watch::Sender<LinkState>,
}

impl<C, V, N> Supervisor<C, V, N>
where
    C: SessionConnector,
    V: Verifier,
    N: NotificationSink,
{
    /// Runs until the task is dropped or aborted.
    pub(crate) async fn run(mut self) {
        let mut failures: u32 = 0;

        loop {
            self.state.send_replace(LinkState::Connecting);
            match self.connector.connect().await {
                Ok(mut session) => {
                    failures = 0;
                    self.state.send_replace(LinkState::Connected);
                    info!(realm = %self.ctx.realm_name, "session established");

                    let end = run_session(&mut session, &*self.ctx, &mut self.inbound).await;
                    if let Err(e) = session.close().await {
                        debug!(error = %e, "session close failed");
                    }
                    self.report(&end).await;
                }
                Err(e) => {
                    error!(realm = %self.ctx.realm_name, error = %e, "connect failed");
                }
            }

            failures = failures.saturating_add(1);
            let delay = self.policy.delay_for(failures);
            self.state
                .send_replace(LinkState::Reconnecting { attempt: failures });
            info!(?delay, attempt = failures, "reconnecting");
            tokio::time::sleep(delay).await;
        }
    }

    async fn report(&self, end: &SessionEnd) {
        let realm = self.ctx.realm_name.as_str();
        let notification = match end {
            SessionEnd::Kicked(reason) => {
                warn!(%realm, %reason, "bridge kicked");
                notify::bridge_kicked(realm, reason)
            }
            SessionEnd::Error(message) => {
                error!(%realm, %message, "session error");
                notify::bridge_disconnected(realm, message)
            }
            SessionEnd::Closed => {
                warn!(%realm, "session closed");
                notify::bridge_disconnected(realm, "session closed")
            }
        };
        self.ctx.notify(notification).await;
    }
}
