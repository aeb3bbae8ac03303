//! The evaluator's output.

use std::fmt;

use realmguard_protocol::Platform;

use crate::AccountMetrics;

/// Admit or kick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Admit,
    Kick,
}

/// Why the verdict was reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reason {
    /// Listed in the whitelist; heuristics skipped.
    Whitelisted,
    /// Every applicable check passed (or failed open).
    Passed,
    InvalidName,
    BannedPlayer,
    AltAccount,
    BannedDevice,
    /// The presence service shows no session running the game.
    NoActiveSession,
    /// The claimed platform isn't among the active ones.
    DeviceSpoof,
}

impl Reason {
    /// Short reason text, used in the kick command and notifications.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Whitelisted => "whitelisted",
            Self::Passed => "passed",
            Self::InvalidName => "invalid name",
            Self::BannedPlayer => "banned",
            Self::AltAccount => "alt account",
            Self::BannedDevice => "banned device",
            Self::NoActiveSession => "no active session",
            Self::DeviceSpoof => "device spoof",
        }
    }
}

impl fmt::Display for Reason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw data backing a verdict, for the notification text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evidence {
    None,
    /// The metrics that tripped the alt heuristic.
    Metrics(AccountMetrics),
    /// The claimed platform that is banned.
    Device(Platform),
    /// Claimed platform versus the best guess at the real one.
    Spoof {
        claimed: Platform,
        detected: Option<Platform>,
    },
}

/// A moderation decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Decision {
    pub verdict: Verdict,
    pub reason: Reason,
    pub evidence: Evidence,
}

impl Decision {
    pub fn admit(reason: Reason) -> Self {
        Self {
            verdict: Verdict::Admit,
            reason,
            evidence: Evidence::None,
        }
    }

    pub fn kick(reason: Reason, evidence: Evidence) -> Self {
        Self {
            verdict: Verdict::Kick,
            reason,
            evidence,
        }
    }

    pub fn is_kick(&self) -> bool {
        self.verdict == Verdict::Kick
    }

    /// The reason as the game's `/kick` command shows it to the player.
    pub fn kick_message(&self) -> String {
        match &self.evidence {
            Evidence::Device(platform) => format!("Device not allowed: {platform}"),
            _ => self.reason.as_str().to_string(),
        }
    }

    /// One line of detail for the kick notification, if there is any.
    pub fn evidence_text(&self) -> Option<String> {
        match &self.evidence {
            Evidence::None => None,
            Evidence::Metrics(m) => Some(format!(
                "Gamerscore: {}, Friends: {}, Followers: {}",
                m.gamerscore, m.friends, m.followers
            )),
            Evidence::Device(platform) => Some(format!("Device: {platform}")),
            Evidence::Spoof { claimed, detected } => Some(match detected {
                Some(actual) => format!("Claimed {claimed}, actually on {actual}"),
                None => format!("Claimed {claimed}, no matching session"),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kick_message_for_banned_device_names_platform() {
        let decision = Decision::kick(Reason::BannedDevice, Evidence::Device(Platform::Android));
        assert_eq!(decision.kick_message(), "Device not allowed: Android");
    }

    #[test]
    fn test_evidence_text_lists_all_metrics() {
        let decision = Decision::kick(
            Reason::AltAccount,
            Evidence::Metrics(AccountMetrics {
                gamerscore: 5000,
                friends: 3,
                followers: 50,
            }),
        );
        assert_eq!(
            decision.evidence_text().as_deref(),
            Some("Gamerscore: 5000, Friends: 3, Followers: 50")
        );
        assert_eq!(decision.kick_message(), "alt account");
    }

    #[test]
    fn test_admit_has_no_evidence() {
        let decision = Decision::admit(Reason::Whitelisted);
        assert!(!decision.is_kick());
        assert!(decision.evidence_text().is_none());
    }
}
