//! The game-session seam.
//!
//! The bridge never speaks the game protocol. It consumes a
//! [`GameSession`]: a stream of [`SessionEvent`]s plus a way to run text
//! commands. [`SessionConnector`] opens a fresh one for every
//! (re)connection.
//!
//! [`SidecarConnector`] is the provided implementation: it dials an
//! out-of-process game client over any [`Connector`] (WebSocket by
//! default), sends a `Join` frame, and then exchanges JSON frames through
//! a [`Codec`].

use std::future::Future;

use realmguard_protocol::{Codec, GameCommand, JsonCodec, SessionEvent, SessionRequest};
use realmguard_transport::{Connection, Connector, WebSocketConnector};
use tracing::{debug, info};

use crate::{BridgeConfig, RealmguardError};

/// A live connection to the game.
pub trait GameSession: Send + 'static {
    /// Next event from the game. `Ok(None)` means the session ended
    /// without an explicit error or kick.
    ///
    /// Must be cancel-safe: the dispatch loop races it in `select!`.
    fn recv_event(
        &mut self,
    ) -> impl Future<Output = Result<Option<SessionEvent>, RealmguardError>> + Send;

    /// Runs a text command as the bridge's player. Fire-and-forget: no
    /// reply is awaited.
    fn send_command(
        &mut self,
        command: &GameCommand,
    ) -> impl Future<Output = Result<(), RealmguardError>> + Send;

    /// Tells the other side the session is over. Called once, after the
    /// dispatch loop returns, whatever ended it.
    fn close(&mut self) -> impl Future<Output = Result<(), RealmguardError>> + Send;
}

/// Opens new game sessions.
pub trait SessionConnector: Send + Sync + 'static {
    type Session: GameSession;

    fn connect(&self) -> impl Future<Output = Result<Self::Session, RealmguardError>> + Send;
}

// ---------------------------------------------------------------------------
// Sidecar adapter
// ---------------------------------------------------------------------------

/// A [`GameSession`] over a byte [`Connection`], one frame per event.
#[derive(Debug)]
pub struct CodecSession<C, K> {
    conn: C,
    codec: K,
}

impl<C: Connection, K: Codec> CodecSession<C, K> {
    pub fn new(conn: C, codec: K) -> Self {
        Self { conn, codec }
    }

    /// Sends one request frame.
    pub async fn send_request(&self, request: &SessionRequest) -> Result<(), RealmguardError> {
        let bytes = self.codec.encode(request)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }
}

impl<C: Connection, K: Codec> GameSession for CodecSession<C, K> {
    async fn recv_event(&mut self) -> Result<Option<SessionEvent>, RealmguardError> {
        loop {
            let Some(data) = self.conn.recv().await? else {
                return Ok(None);
            };
            match self.codec.decode::<SessionEvent>(&data) {
                Ok(event) => return Ok(Some(event)),
                Err(e) => {
                    debug!(link = %self.conn.id(), error = %e, "undecodable frame skipped");
                }
            }
        }
    }

    async fn send_command(&mut self, command: &GameCommand) -> Result<(), RealmguardError> {
        debug!(request_id = %command.request_id, command = %command.command, "sending command");
        self.send_request(&SessionRequest::Command(command.clone()))
            .await
    }

    async fn close(&mut self) -> Result<(), RealmguardError> {
        debug!(link = %self.conn.id(), "closing sidecar link");
        self.conn.close().await?;
        Ok(())
    }
}

/// Dials a sidecar and joins the configured realm.
#[derive(Debug, Clone)]
pub struct SidecarConnector<T, K> {
    connector: T,
    codec: K,
    realm_code: String,
    username: String,
}

impl<T, K> SidecarConnector<T, K> {
    pub fn new(
        connector: T,
        codec: K,
        realm_code: impl Into<String>,
        username: impl Into<String>,
    ) -> Self {
        Self {
            connector,
            codec,
            realm_code: realm_code.into(),
            username: username.into(),
        }
    }
}

impl SidecarConnector<WebSocketConnector, JsonCodec> {
    /// JSON over WebSocket to `realm.endpoint`, joining `realm.code` as
    /// `username`.
    pub fn websocket(config: &BridgeConfig) -> Self {
        Self::new(
            WebSocketConnector::new(config.realm.endpoint.clone()),
            JsonCodec,
            config.realm.code.clone(),
            config.username.clone(),
        )
    }
}

impl<T, K> SessionConnector for SidecarConnector<T, K>
where
    T: Connector,
    K: Codec + Clone,
{
    type Session = CodecSession<T::Connection, K>;

    async fn connect(&self) -> Result<Self::Session, RealmguardError> {
        let conn = self.connector.connect().await?;
        let session = CodecSession::new(conn, self.codec.clone());
        session
            .send_request(&SessionRequest::Join {
                realm_code: self.realm_code.clone(),
                username: self.username.clone(),
            })
            .await?;
        info!(username = %self.username, "join requested");
        Ok(session)
    }
}
