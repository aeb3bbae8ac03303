//! Admin operations on the moderation configuration.
//!
//! Chat-platform command registration lives outside this crate; whatever
//! front end parses the command builds an [`AdminCommand`] and applies it
//! here, where permissions and value ranges are enforced in one place.

use std::collections::BTreeSet;
use std::fmt;
use std::ops::RangeInclusive;

use realmguard_protocol::Platform;
use tracing::info;

use crate::{ConfigError, ModerationConfig};

/// Who is issuing an admin command. `admins` may list either field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller {
    pub id: String,
    pub name: String,
}

impl Caller {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    fn is_admin(&self, config: &ModerationConfig) -> bool {
        config.is_admin(&self.id) || config.is_admin(&self.name)
    }

    fn is(&self, who: &str) -> bool {
        self.id == who || self.name == who
    }
}

/// One alt-detection threshold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThresholdField {
    GamerScore,
    Friends,
    Followers,
}

impl ThresholdField {
    /// Accepted values, inclusive.
    pub fn range(self) -> RangeInclusive<u64> {
        match self {
            Self::GamerScore => 0..=50_000,
            Self::Friends | Self::Followers => 0..=1_000,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::GamerScore => "max gamerscore",
            Self::Friends => "max friends",
            Self::Followers => "max followers",
        }
    }
}

impl fmt::Display for ThresholdField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reason recorded when a ban doesn't give one.
pub const DEFAULT_BAN_REASON: &str = "No reason provided";

/// A requested configuration change, or a read of one of the lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCommand {
    WhitelistAdd(String),
    WhitelistRemove(String),
    ListWhitelist,
    /// Also drops the player from the whitelist.
    Ban {
        name: String,
        reason: Option<String>,
    },
    Unban(String),
    /// Device names must parse through [`Platform::from_name`].
    BanDevice(String),
    UnbanDevice(String),
    ListBannedDevices,
    SetThreshold { field: ThresholdField, value: u64 },
    AltStatus,
    AddAdmin(String),
    /// An admin can't remove themselves.
    RemoveAdmin(String),
    ListAdmins,
}

impl AdminCommand {
    /// `true` for the read-only views, which never touch the config.
    pub fn is_query(&self) -> bool {
        matches!(
            self,
            Self::ListWhitelist | Self::ListBannedDevices | Self::AltStatus | Self::ListAdmins
        )
    }

    /// Checks permissions, validates, and mutates `config` (queries only
    /// read it).
    ///
    /// Returns the reply text: a one-line confirmation, or the listing.
    ///
    /// # Errors
    /// [`ConfigError::PermissionDenied`] if `caller` isn't an admin; the
    /// other variants when the change is invalid. `config` is left
    /// untouched on error.
    pub fn apply(
        &self,
        caller: &Caller,
        config: &mut ModerationConfig,
    ) -> Result<String, ConfigError> {
        if !caller.is_admin(config) {
            return Err(ConfigError::PermissionDenied(caller.name.clone()));
        }

        let summary = match self {
            Self::WhitelistAdd(name) => {
                insert(&mut config.whitelist, "whitelist", name)?;
                format!("{name} has been added to the whitelist")
            }
            Self::WhitelistRemove(name) => {
                remove(&mut config.whitelist, "whitelist", name)?;
                format!("{name} has been removed from the whitelist")
            }
            Self::Ban { name, reason } => {
                let reason = reason
                    .as_deref()
                    .map(str::trim)
                    .filter(|r| !r.is_empty())
                    .unwrap_or(DEFAULT_BAN_REASON);
                insert(&mut config.banned_players, "bannedPlayers", name)?;
                config.whitelist.remove(name);
                info!(caller = %caller.name, player = %name, %reason, "player banned");
                format!("{name} has been banned\nReason: {reason}")
            }
            Self::Unban(name) => {
                remove(&mut config.banned_players, "bannedPlayers", name)?;
                format!("{name} has been unbanned")
            }
            Self::BanDevice(device) => {
                let platform = parse_device(device)?;
                if config.banned_devices.iter().any(|d| platform.matches_name(d)) {
                    return Err(ConfigError::AlreadyPresent {
                        list: "bannedDevices",
                        entry: platform.name().to_string(),
                    });
                }
                config.banned_devices.insert(platform.name().to_string());
                format!("{platform} devices have been banned")
            }
            Self::UnbanDevice(device) => {
                let platform = parse_device(device)?;
                let before = config.banned_devices.len();
                config.banned_devices.retain(|d| !platform.matches_name(d));
                if config.banned_devices.len() == before {
                    return Err(ConfigError::NotPresent {
                        list: "bannedDevices",
                        entry: platform.name().to_string(),
                    });
                }
                format!("{platform} devices have been unbanned")
            }
            Self::SetThreshold { field, value } => {
                let range = field.range();
                if !range.contains(value) {
                    return Err(ConfigError::OutOfRange {
                        field: field.as_str(),
                        min: *range.start(),
                        max: *range.end(),
                        value: *value,
                    });
                }
                let thresholds = &mut config.alt_thresholds;
                match field {
                    ThresholdField::GamerScore => thresholds.max_gamer_score = *value,
                    ThresholdField::Friends => thresholds.max_friends = *value,
                    ThresholdField::Followers => thresholds.max_followers = *value,
                }
                format!("alt detection {field} set to {value}")
            }
            Self::AddAdmin(who) => {
                insert(&mut config.admins, "admins", who)?;
                format!("{who} has been added as an administrator")
            }
            Self::RemoveAdmin(who) => {
                if caller.is(who) {
                    return Err(ConfigError::SelfRemoval);
                }
                remove(&mut config.admins, "admins", who)?;
                format!("{who} has been removed as an administrator")
            }
            Self::ListWhitelist => listing("Whitelist", &config.whitelist, "No players whitelisted"),
            Self::ListBannedDevices => {
                listing("Banned Devices", &config.banned_devices, "No devices banned")
            }
            Self::ListAdmins => listing("Administrators", &config.admins, "No administrators configured"),
            Self::AltStatus => {
                let t = &config.alt_thresholds;
                format!(
                    "Alt Detection Settings\nMax Gamerscore: {}\nMax Friends: {}\nMax Followers: {}",
                    t.max_gamer_score, t.max_friends, t.max_followers
                )
            }
        };

        if !self.is_query() {
            info!(caller = %caller.name, command = ?self, "configuration changed");
        }
        Ok(summary)
    }
}

fn insert(
    set: &mut BTreeSet<String>,
    list: &'static str,
    entry: &str,
) -> Result<(), ConfigError> {
    if !set.insert(entry.to_string()) {
        return Err(ConfigError::AlreadyPresent {
            list,
            entry: entry.to_string(),
        });
    }
    Ok(())
}

fn remove(
    set: &mut BTreeSet<String>,
    list: &'static str,
    entry: &str,
) -> Result<(), ConfigError> {
    if !set.remove(entry) {
        return Err(ConfigError::NotPresent {
            list,
            entry: entry.to_string(),
        });
    }
    Ok(())
}

/// `title` followed by one bulleted line per entry, or `empty`.
fn listing(title: &str, entries: &BTreeSet<String>, empty: &str) -> String {
    if entries.is_empty() {
        return format!("{title}\n{empty}");
    }
    let mut out = title.to_string();
    for entry in entries {
        out.push_str("\n• ");
        out.push_str(entry);
    }
    out
}

fn parse_device(device: &str) -> Result<Platform, ConfigError> {
    Platform::from_name(device).ok_or_else(|| ConfigError::UnknownDevice(device.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Caller {
        Caller::new("1001", "nate")
    }

    fn config() -> ModerationConfig {
        let mut config = ModerationConfig::default();
        config.admins.insert("1001".into());
        config
    }

    #[test]
    fn test_apply_non_admin_is_rejected() {
        let mut config = config();
        let stranger = Caller::new("2002", "someone");

        let result = AdminCommand::WhitelistAdd("Steve".into()).apply(&stranger, &mut config);

        assert!(matches!(result, Err(ConfigError::PermissionDenied(_))));
        assert!(config.whitelist.is_empty());
    }

    #[test]
    fn test_apply_admin_listed_by_name_is_accepted() {
        let mut config = ModerationConfig::default();
        config.admins.insert("nate".into());

        let result = AdminCommand::WhitelistAdd("Steve".into()).apply(&admin(), &mut config);

        assert!(result.is_ok());
        assert!(config.is_whitelisted("Steve"));
    }

    #[test]
    fn test_apply_ban_removes_whitelist_entry() {
        let mut config = config();
        config.whitelist.insert("Steve".into());

        let reply = AdminCommand::Ban {
            name: "Steve".into(),
            reason: None,
        }
        .apply(&admin(), &mut config)
        .unwrap();

        assert!(config.is_banned("Steve"));
        assert!(!config.is_whitelisted("Steve"));
        assert_eq!(reply, "Steve has been banned\nReason: No reason provided");
    }

    #[test]
    fn test_apply_ban_echoes_given_reason() {
        let mut config = config();

        let reply = AdminCommand::Ban {
            name: "Griefer".into(),
            reason: Some("tnt at spawn".into()),
        }
        .apply(&admin(), &mut config)
        .unwrap();

        assert_eq!(reply, "Griefer has been banned\nReason: tnt at spawn");
    }

    #[test]
    fn test_apply_list_whitelist_shows_entries_without_mutating() {
        let mut config = config();
        config.whitelist.insert("Steve".into());
        config.whitelist.insert("Alex".into());
        let before = config.clone();

        let reply = AdminCommand::ListWhitelist.apply(&admin(), &mut config).unwrap();

        assert_eq!(reply, "Whitelist\n• Alex\n• Steve");
        assert_eq!(config, before);
        assert!(AdminCommand::ListWhitelist.is_query());
    }

    #[test]
    fn test_apply_empty_lists_say_so() {
        let mut config = config();

        let devices = AdminCommand::ListBannedDevices.apply(&admin(), &mut config).unwrap();
        let admins = AdminCommand::ListAdmins.apply(&admin(), &mut config).unwrap();

        assert_eq!(devices, "Banned Devices\nNo devices banned");
        assert_eq!(admins, "Administrators\n• 1001");
    }

    #[test]
    fn test_apply_alt_status_reports_thresholds() {
        let mut config = config();

        let reply = AdminCommand::AltStatus.apply(&admin(), &mut config).unwrap();

        assert_eq!(
            reply,
            "Alt Detection Settings\nMax Gamerscore: 1000\nMax Friends: 10\nMax Followers: 10"
        );
    }

    #[test]
    fn test_apply_query_requires_admin() {
        let mut config = config();

        let result = AdminCommand::AltStatus.apply(&Caller::new("2002", "someone"), &mut config);

        assert!(matches!(result, Err(ConfigError::PermissionDenied(_))));
    }

    #[test]
    fn test_apply_duplicate_whitelist_add_reports_already_present() {
        let mut config = config();
        let cmd = AdminCommand::WhitelistAdd("Steve".into());
        cmd.apply(&admin(), &mut config).unwrap();

        let again = cmd.apply(&admin(), &mut config);

        assert!(matches!(again, Err(ConfigError::AlreadyPresent { .. })));
    }

    #[test]
    fn test_apply_threshold_out_of_range_is_rejected() {
        let mut config = config();

        let result = AdminCommand::SetThreshold {
            field: ThresholdField::Friends,
            value: 1001,
        }
        .apply(&admin(), &mut config);

        assert!(matches!(
            result,
            Err(ConfigError::OutOfRange { max: 1000, value: 1001, .. })
        ));
        assert_eq!(config.alt_thresholds.max_friends, 10);
    }

    #[test]
    fn test_apply_threshold_in_range_updates_config() {
        let mut config = config();

        AdminCommand::SetThreshold {
            field: ThresholdField::GamerScore,
            value: 50_000,
        }
        .apply(&admin(), &mut config)
        .unwrap();

        assert_eq!(config.alt_thresholds.max_gamer_score, 50_000);
    }

    #[test]
    fn test_apply_device_ban_canonicalizes_name() {
        let mut config = config();

        AdminCommand::BanDevice("switch".into())
            .apply(&admin(), &mut config)
            .unwrap();

        assert!(config.banned_devices.contains("NintendoSwitch"));
        let again = AdminCommand::BanDevice("NintendoSwitch".into()).apply(&admin(), &mut config);
        assert!(matches!(again, Err(ConfigError::AlreadyPresent { .. })));
    }

    #[test]
    fn test_apply_unknown_device_is_rejected() {
        let mut config = config();

        let result = AdminCommand::BanDevice("Toaster".into()).apply(&admin(), &mut config);

        assert!(matches!(result, Err(ConfigError::UnknownDevice(_))));
    }

    #[test]
    fn test_apply_unban_device_matches_hand_written_entry() {
        let mut config = config();
        config.banned_devices.insert("android".into());

        AdminCommand::UnbanDevice("Android".into())
            .apply(&admin(), &mut config)
            .unwrap();

        assert!(config.banned_devices.is_empty());
    }

    #[test]
    fn test_apply_admin_cannot_remove_self() {
        let mut config = config();

        let result = AdminCommand::RemoveAdmin("1001".into()).apply(&admin(), &mut config);

        assert!(matches!(result, Err(ConfigError::SelfRemoval)));
        assert!(config.is_admin("1001"));
    }
}
