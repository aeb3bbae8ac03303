//! Per-session dispatch loop.
//!
//! One task per game session runs [`run_session`], a single `select!`
//! loop over four sources:
//!
//!   1. session events (snapshots, chat, lifecycle)
//!   2. finished moderation evaluations (`JoinSet`)
//!   3. the next debounced removal (`RosterTracker::next_departure`)
//!   4. inbound chat-platform messages
//!
//! The roster tracker lives on this task only, so presence state needs no
//! locks. Evaluations run as separate tasks; dropping the `JoinSet` with
//! the session aborts whatever is still in flight.

use std::fmt;

use realmguard_chat::{ChatBridge, to_notification};
use realmguard_moderation::{Decision, PolicyEvaluator, SharedConfig, Verifier};
use realmguard_protocol::{ChannelMessage, GameCommand, Notification, SessionEvent};
use realmguard_roster::{
    Arrival, Completion, Departure, Resolution, RosterConfig, RosterTracker,
};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::notify::{self, NotificationSink};
use crate::session::GameSession;

/// Everything a session needs that outlives the session.
pub(crate) struct BridgeContext<V, N> {
    pub(crate) evaluator: PolicyEvaluator<V>,
    pub(crate) config: SharedConfig,
    pub(crate) chat: ChatBridge,
    pub(crate) sink: N,
    pub(crate) roster: RosterConfig,
    pub(crate) realm_name: String,
}

impl<V: Verifier, N: NotificationSink> BridgeContext<V, N> {
    /// Posts a notification; delivery failures are logged and dropped.
    pub(crate) async fn notify(&self, notification: Notification) {
        let title = notification.title.clone();
        if let Err(e) = self.sink.post(notification).await {
            warn!(%title, error = %e, "notification dropped");
        }
    }
}

/// Why a session stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEnd {
    /// The game reported a connection error, or the link failed.
    Error(String),
    /// The bridge's own player was kicked.
    Kicked(String),
    /// The event stream ended.
    Closed,
}

impl fmt::Display for SessionEnd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Error(message) => write!(f, "error: {message}"),
            Self::Kicked(reason) => write!(f, "kicked: {reason}"),
            Self::Closed => write!(f, "closed"),
        }
    }
}

/// Drives one session until it ends. Inbound chat that arrives while no
/// session is running stays queued in `inbound`.
pub(crate) async fn run_session<S, V, N>(
    session: &mut S,
    ctx: &BridgeContext<V, N>,
    inbound: &mut mpsc::Receiver<ChannelMessage>,
) -> SessionEnd
where
    S: GameSession,
    V: Verifier,
    N: NotificationSink,
{
    let mut roster = RosterTracker::new(ctx.roster.clone());
    let mut evaluations: JoinSet<(Arrival, Decision)> = JoinSet::new();
    let mut inbound_open = true;

    loop {
        tokio::select! {
            event = session.recv_event() => match event {
                Ok(Some(event)) => {
                    if let Some(end) =
                        on_event(event, ctx, &mut roster, &mut evaluations).await
                    {
                        return end;
                    }
                }
                Ok(None) => return SessionEnd::Closed,
                Err(e) => return SessionEnd::Error(e.to_string()),
            },

            Some(joined) = evaluations.join_next() => match joined {
                Ok((arrival, decision)) => {
                    on_decision(arrival, decision, session, ctx, &mut roster).await;
                }
                Err(e) => warn!(error = %e, "evaluation task failed"),
            },

            departure = roster.next_departure() => on_departure(departure, ctx).await,

            message = inbound.recv(), if inbound_open => match message {
                Some(message) => {
                    if let Some(command) = ctx.chat.render_for_game(&message) {
                        send(session, &command).await;
                    }
                }
                None => {
                    debug!("inbound chat closed");
                    inbound_open = false;
                }
            },
        }
    }
}

async fn on_event<V, N>(
    event: SessionEvent,
    ctx: &BridgeContext<V, N>,
    roster: &mut RosterTracker,
    evaluations: &mut JoinSet<(Arrival, Decision)>,
) -> Option<SessionEnd>
where
    V: Verifier,
    N: NotificationSink,
{
    match event {
        SessionEvent::Spawned => {
            info!(realm = %ctx.realm_name, "bridge spawned");
            ctx.notify(notify::bridge_connected(&ctx.realm_name)).await;
        }
        SessionEvent::RosterSnapshot { entries } => {
            for arrival in roster.apply_snapshot(&entries) {
                debug!(username = %arrival.entry.username, platform = %arrival.entry.platform, "evaluating");
                let evaluator = ctx.evaluator.clone();
                let config = ctx.config.clone();
                evaluations.spawn(async move {
                    let snapshot = config.snapshot().await;
                    let decision = evaluator.evaluate(&arrival.entry, &snapshot).await;
                    (arrival, decision)
                });
            }
        }
        SessionEvent::Chat(chat) => {
            for message in ctx.chat.filter_game(&chat) {
                ctx.notify(to_notification(&message)).await;
            }
        }
        SessionEvent::Error { message } => return Some(SessionEnd::Error(message)),
        SessionEvent::Kicked { reason } => return Some(SessionEnd::Kicked(reason)),
    }
    None
}

async fn on_decision<S, V, N>(
    arrival: Arrival,
    decision: Decision,
    session: &mut S,
    ctx: &BridgeContext<V, N>,
    roster: &mut RosterTracker,
) where
    S: GameSession,
    V: Verifier,
    N: NotificationSink,
{
    let username = arrival.entry.username.as_str();
    let resolution = if decision.is_kick() {
        Resolution::Kick
    } else {
        Resolution::Admit
    };

    match roster.complete_evaluation(username, arrival.episode, resolution) {
        Ok(Completion::Admitted(record)) => {
            info!(%username, reason = %decision.reason, "player admitted");
            ctx.notify(notify::player_joined(&record, &decision)).await;
        }
        Ok(Completion::Kicked(record)) => {
            info!(%username, reason = %decision.reason, "kicking player");
            let mut notification = notify::player_kicked(&record, &decision);
            match kick_command(username, &decision.kick_message()) {
                Some(command) => send(session, &command).await,
                None => {
                    warn!(%username, "name cannot be quoted, kick command not sent");
                    notification
                        .text
                        .push_str("\nKick command not sent: name cannot be quoted");
                }
            }
            ctx.notify(notification).await;
        }
        Ok(Completion::Stale) => debug!(%username, "verdict for a finished episode ignored"),
        Err(e) => warn!(%username, error = %e, "verdict rejected"),
    }
}

async fn on_departure<V, N>(departure: Departure, ctx: &BridgeContext<V, N>)
where
    V: Verifier,
    N: NotificationSink,
{
    match departure {
        Departure::Left(record) => {
            info!(username = %record.username, "player left");
            ctx.notify(notify::player_left(&record)).await;
        }
        Departure::Abandoned(record) => {
            debug!(username = %record.username, "left before a verdict");
        }
        Departure::StillPresent(_) | Departure::Untracked(_) => {}
    }
}

/// `/kick "<name>" <message>`, or `None` when the name carries a quote,
/// backslash or control character and would retarget the command.
fn kick_command(username: &str, message: &str) -> Option<GameCommand> {
    let unquotable = username
        .chars()
        .any(|c| matches!(c, '"' | '\\') || c.is_control());
    if username.trim().is_empty() || unquotable {
        return None;
    }
    Some(GameCommand::new(format!("/kick \"{username}\" {message}")))
}

/// Fire-and-forget: a failed command is logged, never retried.
async fn send<S: GameSession>(session: &mut S, command: &GameCommand) {
    if let Err(e) = session.send_command(command).await {
        warn!(command = %command.command, error = %e, "command dispatch failed");
    }
}
