//! Moderation policy for Realmguard.
//!
//! Decides whether a player who just appeared in the roster may stay.
//! The decision itself is a pure function of three inputs:
//!
//! - the [`RosterEntry`](realmguard_protocol::RosterEntry) (who, on what)
//! - a [`ModerationConfig`] snapshot (lists and thresholds)
//! - whatever the [`Verifier`] reports about the identity
//!
//! # Key types
//!
//! - [`PolicyEvaluator`]: runs the ordered checks, fails open on
//!   verifier trouble
//! - [`Decision`]: verdict, reason, and evidence for the notification
//! - [`SharedConfig`]: the live, admin-mutable configuration
//! - [`AdminCommand`]: validated mutations of that configuration

#![allow(async_fn_in_trait)]

mod admin;
mod config;
mod decision;
mod error;
mod policy;
mod verifier;

pub use admin::{AdminCommand, Caller, DEFAULT_BAN_REASON, ThresholdField};
pub use config::{AltThresholds, ModerationConfig, SharedConfig};
pub use decision::{Decision, Evidence, Reason, Verdict};
pub use error::{ConfigError, VerifierError};
pub use policy::{PolicyEvaluator, is_valid_username};
pub use verifier::{AccountMetrics, DeviceSession, DisabledVerifier, PresenceReport, Verifier};
