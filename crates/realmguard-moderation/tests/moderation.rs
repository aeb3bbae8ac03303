//! Admin edits flowing into later evaluations through `SharedConfig`.

use realmguard_moderation::{
    AccountMetrics, AdminCommand, Caller, DisabledVerifier, ModerationConfig, PolicyEvaluator,
    PresenceReport, Reason, SharedConfig, ThresholdField, Verifier, VerifierError,
};
use realmguard_protocol::{IdentityId, Platform, RosterEntry};

// =========================================================================
// Helpers
// =========================================================================

/// An account with a few friends, otherwise established.
struct FewFriends;

impl Verifier for FewFriends {
    async fn account_metrics(&self, _: &IdentityId) -> Result<AccountMetrics, VerifierError> {
        Ok(AccountMetrics {
            gamerscore: 12_000,
            friends: 4,
            followers: 30,
        })
    }

    async fn active_platforms(&self, _: &IdentityId) -> Result<PresenceReport, VerifierError> {
        Ok(PresenceReport::Private)
    }
}

fn shared_with_admin() -> (SharedConfig, Caller) {
    let mut config = ModerationConfig::default();
    config.admins.insert("1001".into());
    (SharedConfig::new(config), Caller::new("1001", "nate"))
}

async fn run(shared: &SharedConfig, caller: &Caller, command: AdminCommand) {
    shared
        .update(|config| command.apply(caller, config))
        .await
        .expect("admin command should apply");
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_whitelisting_lets_flagged_account_in() {
    let (shared, admin) = shared_with_admin();
    let evaluator = PolicyEvaluator::new(FewFriends);
    let bob = RosterEntry::new("Bob", "2535400000000003", Platform::Xbox);

    let before = evaluator.evaluate(&bob, &shared.snapshot().await).await;
    run(&shared, &admin, AdminCommand::WhitelistAdd("Bob".into())).await;
    let after = evaluator.evaluate(&bob, &shared.snapshot().await).await;

    assert_eq!(before.reason, Reason::AltAccount);
    assert_eq!(after.reason, Reason::Whitelisted);
}

#[tokio::test]
async fn test_lowering_threshold_clears_alt_flag() {
    let (shared, admin) = shared_with_admin();
    let evaluator = PolicyEvaluator::new(FewFriends);
    let bob = RosterEntry::new("Bob", "2535400000000003", Platform::Xbox);

    run(
        &shared,
        &admin,
        AdminCommand::SetThreshold {
            field: ThresholdField::Friends,
            value: 2,
        },
    )
    .await;
    let decision = evaluator.evaluate(&bob, &shared.snapshot().await).await;

    assert!(!decision.is_kick());
}

#[tokio::test]
async fn test_banning_device_kicks_next_player_on_it() {
    let (shared, admin) = shared_with_admin();
    let evaluator = PolicyEvaluator::new(DisabledVerifier);
    let alex = RosterEntry::new("Alex", "2535400000000002", Platform::PlayStation);

    run(&shared, &admin, AdminCommand::BanDevice("PS4".into())).await;
    let decision = evaluator.evaluate(&alex, &shared.snapshot().await).await;

    assert_eq!(decision.reason, Reason::BannedDevice);
    assert_eq!(decision.kick_message(), "Device not allowed: PlayStation");
}
