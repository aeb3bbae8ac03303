//! `RealmBridge` builder and handle.
//!
//! This is the entry point for running a bridge. It ties the layers
//! together: session → roster → moderation → notifications, with the chat
//! relay alongside and the supervisor around all of it.

use std::sync::Arc;
use std::time::Duration;

use realmguard_chat::ChatBridge;
use realmguard_moderation::{
    AdminCommand, Caller, DisabledVerifier, PolicyEvaluator, SharedConfig, Verifier,
};
use realmguard_protocol::ChannelMessage;
use realmguard_roster::RosterConfig;
use tokio::sync::{Mutex, mpsc, watch};
use tokio::task::JoinHandle;
use tracing::info;

use crate::handler::BridgeContext;
use crate::notify::{NotificationSink, TracingSink};
use crate::session::SessionConnector;
use crate::supervisor::{LinkState, ReconnectPolicy, Supervisor};
use crate::{BridgeConfig, ConfigStore, RealmguardError};

/// How many inbound chat messages may queue while a session is down.
const INBOUND_CAPACITY: usize = 256;

/// Builder for configuring a [`RealmBridge`].
///
/// # Example
///
/// ```rust,ignore
/// use realmguard::prelude::*;
///
/// let config = ConfigStore::new("config.json").load().await?;
/// let connector = SidecarConnector::websocket(&config);
/// let bridge = RealmBridge::builder(config)
///     .sink(my_sink)
///     .verifier(my_verifier)
///     .build(connector);
/// let (handle, task) = bridge.spawn();
/// ```
pub struct RealmBridgeBuilder<V, N> {
    config: BridgeConfig,
    verifier: V,
    sink: N,
    store: Option<ConfigStore>,
    policy: Option<ReconnectPolicy>,
    debounce: Duration,
    verifier_timeout: Option<Duration>,
    chat: ChatBridge,
}

impl RealmBridgeBuilder<DisabledVerifier, TracingSink> {
    /// Starts from a configuration document, with no verifier and
    /// notifications going to the log.
    pub fn new(config: BridgeConfig) -> Self {
        Self {
            config,
            verifier: DisabledVerifier,
            sink: TracingSink,
            store: None,
            policy: None,
            debounce: RosterConfig::DEFAULT_DEBOUNCE,
            verifier_timeout: None,
            chat: ChatBridge::new(),
        }
    }
}

impl<V, N> RealmBridgeBuilder<V, N> {
    /// Sets the account verifier.
    pub fn verifier<V2: Verifier>(self, verifier: V2) -> RealmBridgeBuilder<V2, N> {
        RealmBridgeBuilder {
            config: self.config,
            verifier,
            sink: self.sink,
            store: self.store,
            policy: self.policy,
            debounce: self.debounce,
            verifier_timeout: self.verifier_timeout,
            chat: self.chat,
        }
    }

    /// Sets where notifications are delivered.
    pub fn sink<N2: NotificationSink>(self, sink: N2) -> RealmBridgeBuilder<V, N2> {
        RealmBridgeBuilder {
            config: self.config,
            verifier: self.verifier,
            sink,
            store: self.store,
            policy: self.policy,
            debounce: self.debounce,
            verifier_timeout: self.verifier_timeout,
            chat: self.chat,
        }
    }

    /// Persists admin changes to this store.
    pub fn store(mut self, store: ConfigStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Overrides the reconnect policy (default: from the document, else
    /// fixed 5 seconds).
    pub fn reconnect_policy(mut self, policy: ReconnectPolicy) -> Self {
        self.policy = Some(policy);
        self
    }

    /// Overrides the leave debounce window (default 7 seconds).
    pub fn debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Overrides the per-call verifier timeout.
    pub fn verifier_timeout(mut self, timeout: Duration) -> Self {
        self.verifier_timeout = Some(timeout);
        self
    }

    /// Overrides the chat relay rules (for example, a different marker).
    pub fn chat(mut self, chat: ChatBridge) -> Self {
        self.chat = chat;
        self
    }
}

impl<V: Verifier, N: NotificationSink> RealmBridgeBuilder<V, N> {
    /// Wires everything to `connector`. Nothing runs until
    /// [`RealmBridge::run`] or [`RealmBridge::spawn`].
    pub fn build<C: SessionConnector>(self, connector: C) -> RealmBridge<C, V, N> {
        let timeout = self
            .verifier_timeout
            .or_else(|| self.config.verifier_timeout())
            .unwrap_or(PolicyEvaluator::<V>::DEFAULT_TIMEOUT);
        let policy = self
            .policy
            .unwrap_or_else(|| self.config.reconnect_policy());

        let shared = SharedConfig::new(self.config.moderation.clone());
        let ctx = Arc::new(BridgeContext {
            evaluator: PolicyEvaluator::new(self.verifier).with_timeout(timeout),
            config: shared.clone(),
            chat: self.chat,
            sink: self.sink,
            roster: RosterConfig {
                debounce: self.debounce,
                self_username: Some(self.config.username.clone()),
            },
            realm_name: self.config.realm.name.clone(),
        });

        let (inbound_tx, inbound_rx) = mpsc::channel(INBOUND_CAPACITY);
        let (state_tx, state_rx) = watch::channel(LinkState::Connecting);

        let handle = BridgeHandle {
            inbound: inbound_tx,
            config: shared,
            document: Arc::new(Mutex::new(self.config)),
            store: self.store,
            state: state_rx,
        };
        let supervisor = Supervisor {
            connector,
            ctx,
            policy,
            inbound: inbound_rx,
            state: state_tx,
        };

        RealmBridge { supervisor, handle }
    }
}

/// A configured bridge, ready to run.
pub struct RealmBridge<C, V, N> {
    supervisor: Supervisor<C, V, N>,
    handle: BridgeHandle,
}

impl RealmBridge<(), DisabledVerifier, TracingSink> {
    /// Creates a new builder.
    pub fn builder(config: BridgeConfig) -> RealmBridgeBuilder<DisabledVerifier, TracingSink> {
        RealmBridgeBuilder::new(config)
    }
}

impl<C, V, N> RealmBridge<C, V, N>
where
    C: SessionConnector,
    V: Verifier,
    N: NotificationSink,
{
    /// A handle for relaying chat and running admin commands.
    pub fn handle(&self) -> BridgeHandle {
        self.handle.clone()
    }

    /// Runs the supervisor loop. Never returns on its own; drop or abort
    /// the future to stop the bridge.
    pub async fn run(self) {
        info!(realm = %self.supervisor.ctx.realm_name, "bridge starting");
        self.supervisor.run().await;
    }

    /// Runs the bridge on a new task.
    pub fn spawn(self) -> (BridgeHandle, JoinHandle<()>) {
        let handle = self.handle();
        (handle, tokio::spawn(self.run()))
    }
}

/// Cloneable handle to a running bridge.
#[derive(Debug, Clone)]
pub struct BridgeHandle {
    inbound: mpsc::Sender<ChannelMessage>,
    config: SharedConfig,
    /// Everything outside the moderation section, for rewriting the file.
    document: Arc<Mutex<BridgeConfig>>,
    store: Option<ConfigStore>,
    state: watch::Receiver<LinkState>,
}

impl BridgeHandle {
    /// Queues a chat-platform message for relay into the game.
    ///
    /// # Errors
    /// [`RealmguardError::Shutdown`] if the bridge task is gone.
    pub async fn relay(&self, message: ChannelMessage) -> Result<(), RealmguardError> {
        self.inbound
            .send(message)
            .await
            .map_err(|_| RealmguardError::Shutdown)
    }

    /// Applies an admin command and, if a store is configured, persists
    /// the updated document. Returns the reply text. Queries are never
    /// persisted.
    ///
    /// The document lock is held from the update through the write, so
    /// concurrent commands reach the file in the order they were applied.
    ///
    /// # Errors
    /// [`RealmguardError::Config`] if the command is rejected, or an I/O
    /// or encoding error if persisting fails (the change stays applied in
    /// memory).
    pub async fn admin(
        &self,
        caller: &Caller,
        command: AdminCommand,
    ) -> Result<String, RealmguardError> {
        let mut document = self.document.lock().await;
        let (summary, moderation) = self
            .config
            .update(|config| {
                command
                    .apply(caller, config)
                    .map(|summary| (summary, config.clone()))
            })
            .await?;

        if command.is_query() {
            return Ok(summary);
        }
        document.moderation = moderation;
        if let Some(store) = &self.store {
            store.save(&document).await?;
        }
        Ok(summary)
    }

    /// The live moderation configuration.
    pub fn config(&self) -> &SharedConfig {
        &self.config
    }

    /// Current supervisor state.
    pub fn link_state(&self) -> LinkState {
        *self.state.borrow()
    }

    /// A receiver that observes every supervisor state change.
    pub fn subscribe_state(&self) -> watch::Receiver<LinkState> {
        self.state.clone()
    }
}
