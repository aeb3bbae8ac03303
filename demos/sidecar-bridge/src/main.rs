//! Runs a bridge against a WebSocket sidecar, with the terminal standing
//! in for the chat platform.
//!
//! ```text
//! cargo run -p sidecar-bridge -- config.json
//! ```
//!
//! Notifications are logged. Each stdin line is relayed into the game as
//! chat from `console`, except lines starting with `!`, which are admin
//! commands (`console` must be listed in `admins`):
//!
//! ```text
//! !ban <name> [reason]   !unban <name>
//! !allow <name>          !disallow <name>        !whitelist
//! !bandevice <device>    !unbandevice <device>   !devices
//! !addadmin <id>         !removeadmin <id>       !admins
//! !alt <gamerscore|friends|followers> <value>    !alt
//! ```

use realmguard::prelude::*;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

const OPERATOR: &str = "console";

#[tokio::main]
async fn main() {
    realmguard::init_tracing();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let store = ConfigStore::new(&path);
    let config = match store.load().await {
        Ok(config) => config,
        Err(e) => {
            error!(%path, error = %e, "cannot load configuration");
            std::process::exit(1);
        }
    };

    let connector = SidecarConnector::websocket(&config);
    info!(endpoint = %config.realm.endpoint, realm = %config.realm.name, "starting bridge");
    let (handle, task) = RealmBridge::builder(config)
        .store(store)
        .build(connector)
        .spawn();

    let operator = Caller::new(OPERATOR, OPERATOR);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => handle_line(&handle, &operator, line.trim()).await,
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "stdin read failed");
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    info!("shutting down");
    task.abort();
}

async fn handle_line(handle: &BridgeHandle, operator: &Caller, line: &str) {
    if line.is_empty() {
        return;
    }

    let Some(command) = line.strip_prefix('!') else {
        let message = ChannelMessage {
            author: OPERATOR.to_string(),
            display_name: None,
            content: line.to_string(),
            from_bot: false,
        };
        if let Err(e) = handle.relay(message).await {
            warn!(error = %e, "relay failed");
        }
        return;
    };

    match parse_admin(command) {
        Some(command) => match handle.admin(operator, command).await {
            Ok(summary) => info!("{summary}"),
            Err(e) => warn!(error = %e, "admin command rejected"),
        },
        None => warn!(%line, "unknown command"),
    }
}

fn parse_admin(line: &str) -> Option<AdminCommand> {
    let mut words = line.split_whitespace();
    let verb = words.next()?.to_ascii_lowercase();

    let command = match verb.as_str() {
        "whitelist" => AdminCommand::ListWhitelist,
        "devices" => AdminCommand::ListBannedDevices,
        "admins" => AdminCommand::ListAdmins,
        "alt" if line.split_whitespace().count() == 1 => AdminCommand::AltStatus,
        _ => {
            let arg = words.next()?.to_string();
            match verb.as_str() {
                "ban" => {
                    let reason = words.collect::<Vec<_>>().join(" ");
                    AdminCommand::Ban {
                        name: arg,
                        reason: (!reason.is_empty()).then_some(reason),
                    }
                }
                "unban" => AdminCommand::Unban(arg),
                "allow" => AdminCommand::WhitelistAdd(arg),
                "disallow" => AdminCommand::WhitelistRemove(arg),
                "bandevice" => AdminCommand::BanDevice(arg),
                "unbandevice" => AdminCommand::UnbanDevice(arg),
                "addadmin" => AdminCommand::AddAdmin(arg),
                "removeadmin" => AdminCommand::RemoveAdmin(arg),
                "alt" => {
                    let field = match arg.to_ascii_lowercase().as_str() {
                        "gamerscore" => ThresholdField::GamerScore,
                        "friends" => ThresholdField::Friends,
                        "followers" => ThresholdField::Followers,
                        _ => return None,
                    };
                    let value = words.next()?.parse().ok()?;
                    AdminCommand::SetThreshold { field, value }
                }
                _ => return None,
            }
        }
    };
    Some(command)
}
