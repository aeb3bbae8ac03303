//! The account verification hook.
//!
//! Realmguard doesn't look up account data itself. It defines the
//! [`Verifier`] trait: two async queries keyed by a player's persistent
//! identity. Implement it against whatever service holds that data; the
//! evaluator calls it for every player that isn't whitelisted.
//!
//! Both queries are allowed to fail. The evaluator bounds each call with a
//! timeout and treats every failure as "inconclusive", so a broken
//! verifier degrades to "admit everyone who isn't on a list", never to
//! "kick everyone".

use realmguard_protocol::{IdentityId, Platform};
use serde::{Deserialize, Serialize};

use crate::VerifierError;

/// Public account statistics used by the alt-account heuristic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountMetrics {
    pub gamerscore: u64,
    pub friends: u64,
    pub followers: u64,
}

/// One live session reported by the presence service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceSession {
    pub platform: Platform,
    /// Whether this session is running the game client (as opposed to,
    /// say, a companion app on the same device).
    pub game_client: bool,
}

/// What the presence service knows about an identity's devices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceReport {
    /// The profile hides presence. Not evidence of anything.
    Private,
    /// Every session currently active for the identity.
    Active(Vec<DeviceSession>),
}

/// Looks up account data for a player identity.
///
/// # Trait bounds
///
/// `Send + Sync + 'static` because one verifier is shared (behind an
/// `Arc`) by every evaluation task of every session.
///
/// # Example
///
/// ```rust
/// use realmguard_moderation::{AccountMetrics, PresenceReport, Verifier, VerifierError};
/// use realmguard_protocol::IdentityId;
///
/// /// Treats every account as established and every profile as private.
/// struct TrustingVerifier;
///
/// impl Verifier for TrustingVerifier {
///     async fn account_metrics(&self, _: &IdentityId) -> Result<AccountMetrics, VerifierError> {
///         Ok(AccountMetrics { gamerscore: 50_000, friends: 100, followers: 100 })
///     }
///
///     async fn active_platforms(&self, _: &IdentityId) -> Result<PresenceReport, VerifierError> {
///         Ok(PresenceReport::Private)
///     }
/// }
/// ```
pub trait Verifier: Send + Sync + 'static {
    /// Gamerscore, friend count and follower count.
    fn account_metrics(
        &self,
        identity: &IdentityId,
    ) -> impl std::future::Future<Output = Result<AccountMetrics, VerifierError>> + Send;

    /// Currently active client sessions.
    fn active_platforms(
        &self,
        identity: &IdentityId,
    ) -> impl std::future::Future<Output = Result<PresenceReport, VerifierError>> + Send;
}

/// A verifier with no backing service. Every call is
/// [`VerifierError::Unavailable`], so only the list-based checks apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledVerifier;

impl Verifier for DisabledVerifier {
    async fn account_metrics(&self, _: &IdentityId) -> Result<AccountMetrics, VerifierError> {
        Err(VerifierError::Unavailable("no verifier configured".into()))
    }

    async fn active_platforms(&self, _: &IdentityId) -> Result<PresenceReport, VerifierError> {
        Err(VerifierError::Unavailable("no verifier configured".into()))
    }
}
