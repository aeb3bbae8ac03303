//! The ordered moderation checks.
//!
//! ```text
//! 1. name valid?          no  → kick (invalid name)
//! 2. banned player?       yes → kick (banned)
//! 3. whitelisted?         yes → admit (whitelisted)
//! 4. alt account?         yes → kick (alt account)      [verifier]
//! 5. banned device?       yes → kick (banned device)
//! 6. device spoof?        yes → kick (no session / spoof) [verifier]
//!                               admit (passed)
//! ```
//!
//! The first kick wins. Verifier failures and timeouts at steps 4 and 6
//! count as "not flagged".

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use realmguard_protocol::{IdentityId, Platform, RosterEntry};
use tracing::{debug, warn};

use crate::{
    AccountMetrics, Decision, Evidence, ModerationConfig, PresenceReport, Reason, Verifier,
    VerifierError,
};

/// Returns `true` if `username` is non-empty and only contains ASCII
/// letters, digits, `_` and `-`.
pub fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

/// Evaluates roster entries against a [`ModerationConfig`].
///
/// Cheap to clone: the verifier sits behind an `Arc`, so every evaluation
/// task can own a copy.
#[derive(Debug)]
pub struct PolicyEvaluator<V> {
    verifier: Arc<V>,
    timeout: Duration,
}

impl<V> Clone for PolicyEvaluator<V> {
    fn clone(&self) -> Self {
        Self {
            verifier: Arc::clone(&self.verifier),
            timeout: self.timeout,
        }
    }
}

impl<V: Verifier> PolicyEvaluator<V> {
    /// Default bound on each verifier call.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    pub fn new(verifier: V) -> Self {
        Self::with_shared(Arc::new(verifier))
    }

    pub fn with_shared(verifier: Arc<V>) -> Self {
        Self {
            verifier,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Overrides the per-call verifier timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs every check in order and returns the first kick, or an admit.
    pub async fn evaluate(&self, entry: &RosterEntry, config: &ModerationConfig) -> Decision {
        let username = entry.username.as_str();

        if !is_valid_username(username) {
            return Decision::kick(Reason::InvalidName, Evidence::None);
        }
        if config.is_banned(username) {
            return Decision::kick(Reason::BannedPlayer, Evidence::None);
        }
        if config.is_whitelisted(username) {
            debug!(%username, "whitelisted, heuristics skipped");
            return Decision::admit(Reason::Whitelisted);
        }

        if let Some(decision) = self.check_alt(entry, config).await {
            return decision;
        }

        if is_banned_device(entry.platform, config) {
            return Decision::kick(Reason::BannedDevice, Evidence::Device(entry.platform));
        }

        if let Some(decision) = self.check_spoof(entry).await {
            return decision;
        }

        Decision::admit(Reason::Passed)
    }

    async fn check_alt(&self, entry: &RosterEntry, config: &ModerationConfig) -> Option<Decision> {
        let metrics = match self
            .bounded(&entry.identity_id, self.verifier.account_metrics(&entry.identity_id))
            .await
        {
            Ok(metrics) => metrics,
            Err(e) => {
                warn!(username = %entry.username, error = %e, "alt check skipped");
                return None;
            }
        };

        is_alt(&metrics, config)
            .then(|| Decision::kick(Reason::AltAccount, Evidence::Metrics(metrics)))
    }

    async fn check_spoof(&self, entry: &RosterEntry) -> Option<Decision> {
        let claimed = entry.platform;
        if claimed == Platform::Unknown {
            debug!(username = %entry.username, "unknown platform, spoof check skipped");
            return None;
        }

        let report = match self
            .bounded(&entry.identity_id, self.verifier.active_platforms(&entry.identity_id))
            .await
        {
            Ok(report) => report,
            Err(e) => {
                warn!(username = %entry.username, error = %e, "device check skipped");
                return None;
            }
        };

        let sessions = match report {
            PresenceReport::Private => {
                debug!(username = %entry.username, "private profile, device check skipped");
                return None;
            }
            PresenceReport::Active(sessions) => sessions,
        };

        let mut game_sessions = sessions.iter().filter(|s| s.game_client).peekable();
        let Some(first) = game_sessions.peek().map(|s| s.platform) else {
            return Some(Decision::kick(
                Reason::NoActiveSession,
                Evidence::Spoof {
                    claimed,
                    detected: None,
                },
            ));
        };
        if game_sessions.any(|s| s.platform == claimed) {
            return None;
        }

        Some(Decision::kick(
            Reason::DeviceSpoof,
            Evidence::Spoof {
                claimed,
                detected: Some(first),
            },
        ))
    }

    /// Applies the per-call timeout to a verifier future.
    async fn bounded<T>(
        &self,
        identity: &IdentityId,
        call: impl Future<Output = Result<T, VerifierError>>,
    ) -> Result<T, VerifierError> {
        tokio::time::timeout(self.timeout, call)
            .await
            .map_err(|_| VerifierError::Timeout(identity.clone()))?
    }
}

/// OR across metrics: any single one below its threshold flags the account.
fn is_alt(metrics: &AccountMetrics, config: &ModerationConfig) -> bool {
    let t = &config.alt_thresholds;
    metrics.gamerscore < t.max_gamer_score
        || metrics.friends < t.max_friends
        || metrics.followers < t.max_followers
}

fn is_banned_device(platform: Platform, config: &ModerationConfig) -> bool {
    config
        .banned_devices
        .iter()
        .any(|device| platform.matches_name(device))
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use realmguard_protocol::Platform;

    use super::*;
    use crate::{DeviceSession, DisabledVerifier};

    /// Scripted verifier that counts its calls.
    struct Scripted {
        metrics: Result<AccountMetrics, ()>,
        presence: Result<PresenceReport, ()>,
        calls: AtomicUsize,
    }

    impl Scripted {
        fn new(metrics: AccountMetrics, presence: PresenceReport) -> Self {
            Self {
                metrics: Ok(metrics),
                presence: Ok(presence),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl Verifier for Scripted {
        async fn account_metrics(&self, _: &IdentityId) -> Result<AccountMetrics, VerifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.metrics
                .map_err(|_| VerifierError::Unavailable("scripted".into()))
        }

        async fn active_platforms(&self, _: &IdentityId) -> Result<PresenceReport, VerifierError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.presence
                .clone()
                .map_err(|_| VerifierError::Unavailable("scripted".into()))
        }
    }

    /// Never answers.
    struct Hanging;

    impl Verifier for Hanging {
        async fn account_metrics(&self, _: &IdentityId) -> Result<AccountMetrics, VerifierError> {
            std::future::pending().await
        }

        async fn active_platforms(&self, _: &IdentityId) -> Result<PresenceReport, VerifierError> {
            std::future::pending().await
        }
    }

    fn established() -> AccountMetrics {
        AccountMetrics {
            gamerscore: 20_000,
            friends: 50,
            followers: 50,
        }
    }

    fn on(platform: Platform) -> PresenceReport {
        PresenceReport::Active(vec![DeviceSession {
            platform,
            game_client: true,
        }])
    }

    fn entry(name: &str, platform: Platform) -> RosterEntry {
        RosterEntry::new(name, "2535400000000001", platform)
    }

    #[test]
    fn test_is_valid_username_accepts_word_characters_only() {
        assert!(is_valid_username("Steve_99"));
        assert!(is_valid_username("a-b"));
        assert!(!is_valid_username(""));
        assert!(!is_valid_username("Inv@lid!"));
        assert!(!is_valid_username("Two Words"));
        assert!(!is_valid_username("Ünicode"));
    }

    #[tokio::test]
    async fn test_evaluate_invalid_name_kicks_without_verifier_calls() {
        let evaluator = PolicyEvaluator::new(Scripted::new(established(), on(Platform::Xbox)));

        let decision = evaluator
            .evaluate(&entry("Inv@lid!", Platform::Xbox), &ModerationConfig::default())
            .await;

        assert_eq!(decision.reason, Reason::InvalidName);
        assert!(decision.is_kick());
        assert_eq!(evaluator.verifier.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_evaluate_banned_player_overrides_whitelist() {
        let evaluator = PolicyEvaluator::new(DisabledVerifier);
        let mut config = ModerationConfig::default();
        config.whitelist.insert("Griefer".into());
        config.banned_players.insert("Griefer".into());

        let decision = evaluator
            .evaluate(&entry("Griefer", Platform::Windows), &config)
            .await;

        assert_eq!(decision.reason, Reason::BannedPlayer);
    }

    #[tokio::test]
    async fn test_evaluate_whitelisted_on_banned_device_is_admitted() {
        let evaluator = PolicyEvaluator::new(DisabledVerifier);
        let mut config = ModerationConfig::default();
        config.whitelist.insert("Steve".into());
        config.banned_devices.insert("Android".into());

        let decision = evaluator
            .evaluate(&entry("Steve", Platform::Android), &config)
            .await;

        assert!(!decision.is_kick());
        assert_eq!(decision.reason, Reason::Whitelisted);
    }

    #[tokio::test]
    async fn test_evaluate_one_low_metric_flags_alt() {
        let metrics = AccountMetrics {
            gamerscore: 5000,
            friends: 3,
            followers: 50,
        };
        let evaluator = PolicyEvaluator::new(Scripted::new(metrics, on(Platform::Xbox)));

        let decision = evaluator
            .evaluate(&entry("Bob", Platform::Xbox), &ModerationConfig::default())
            .await;

        assert_eq!(decision.reason, Reason::AltAccount);
        assert_eq!(decision.evidence, Evidence::Metrics(metrics));
        assert_eq!(decision.reason.to_string(), "alt account");
    }

    #[tokio::test]
    async fn test_evaluate_metrics_at_threshold_pass() {
        let metrics = AccountMetrics {
            gamerscore: 1000,
            friends: 10,
            followers: 10,
        };
        let evaluator = PolicyEvaluator::new(Scripted::new(metrics, on(Platform::Xbox)));

        let decision = evaluator
            .evaluate(&entry("Bob", Platform::Xbox), &ModerationConfig::default())
            .await;

        assert_eq!(decision, Decision::admit(Reason::Passed));
    }

    #[tokio::test]
    async fn test_evaluate_banned_device_kicks_with_platform() {
        let evaluator = PolicyEvaluator::new(Scripted::new(established(), on(Platform::Android)));
        let mut config = ModerationConfig::default();
        config.banned_devices.insert("android".into());

        let decision = evaluator
            .evaluate(&entry("Alex", Platform::Android), &config)
            .await;

        assert_eq!(decision.reason, Reason::BannedDevice);
        assert_eq!(decision.evidence, Evidence::Device(Platform::Android));
    }

    #[tokio::test]
    async fn test_evaluate_claimed_platform_not_active_is_spoof() {
        let evaluator = PolicyEvaluator::new(Scripted::new(established(), on(Platform::Windows)));

        let decision = evaluator
            .evaluate(&entry("Alex", Platform::NintendoSwitch), &ModerationConfig::default())
            .await;

        assert_eq!(decision.reason, Reason::DeviceSpoof);
        assert_eq!(
            decision.evidence,
            Evidence::Spoof {
                claimed: Platform::NintendoSwitch,
                detected: Some(Platform::Windows),
            }
        );
    }

    #[tokio::test]
    async fn test_evaluate_no_game_session_kicks() {
        let presence = PresenceReport::Active(vec![DeviceSession {
            platform: Platform::Ios,
            game_client: false,
        }]);
        let evaluator = PolicyEvaluator::new(Scripted::new(established(), presence));

        let decision = evaluator
            .evaluate(&entry("Alex", Platform::Ios), &ModerationConfig::default())
            .await;

        assert_eq!(decision.reason, Reason::NoActiveSession);
    }

    #[tokio::test]
    async fn test_evaluate_private_profile_fails_open() {
        let evaluator =
            PolicyEvaluator::new(Scripted::new(established(), PresenceReport::Private));

        let decision = evaluator
            .evaluate(&entry("Alex", Platform::Xbox), &ModerationConfig::default())
            .await;

        assert_eq!(decision, Decision::admit(Reason::Passed));
    }

    #[tokio::test]
    async fn test_evaluate_disabled_verifier_fails_open() {
        let evaluator = PolicyEvaluator::new(DisabledVerifier);

        let decision = evaluator
            .evaluate(&entry("Alex", Platform::Xbox), &ModerationConfig::default())
            .await;

        assert_eq!(decision, Decision::admit(Reason::Passed));
    }

    #[tokio::test(start_paused = true)]
    async fn test_evaluate_hanging_verifier_times_out_and_admits() {
        let evaluator = PolicyEvaluator::new(Hanging).with_timeout(Duration::from_secs(2));
        let start = tokio::time::Instant::now();

        let decision = evaluator
            .evaluate(&entry("Alex", Platform::Xbox), &ModerationConfig::default())
            .await;

        assert_eq!(decision, Decision::admit(Reason::Passed));
        // Two bounded calls, each cut off at the timeout.
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(4) && elapsed < Duration::from_secs(5));
    }
}
