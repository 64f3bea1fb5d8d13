//! Notification configuration models.
//!
//! `NotificationSettings` is the raw configuration surface (what a user types
//! into a config file or on the command line). It is resolved against the
//! global defaults into a validated `NotificationConfig`.

use serde::Deserialize;
use std::collections::BTreeSet;

use crate::error::{AppError, AppResult};

// =============================================================================
// Trigger Enum
// =============================================================================

/// Build transition that fires a notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Trigger {
    Aborted,
    Failure,
    NotBuilt,
    Success,
    Unstable,
    BackToNormal,
}

impl std::fmt::Display for Trigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Trigger::Aborted => write!(f, "aborted"),
            Trigger::Failure => write!(f, "failure"),
            Trigger::NotBuilt => write!(f, "not_built"),
            Trigger::Success => write!(f, "success"),
            Trigger::Unstable => write!(f, "unstable"),
            Trigger::BackToNormal => write!(f, "back_to_normal"),
        }
    }
}

// =============================================================================
// Trigger Policy
// =============================================================================

/// Which builds get a notification
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum TriggerPolicy {
    /// No trigger configured: every build notifies
    #[default]
    AlwaysSend,
    /// Only builds matching one of these triggers notify. Never empty.
    OnTriggers(BTreeSet<Trigger>),
}

impl TriggerPolicy {
    /// Builds a policy from a set of triggers; an empty set means `AlwaysSend`.
    pub fn from_triggers(triggers: impl IntoIterator<Item = Trigger>) -> Self {
        let triggers: BTreeSet<Trigger> = triggers.into_iter().collect();
        if triggers.is_empty() {
            TriggerPolicy::AlwaysSend
        } else {
            TriggerPolicy::OnTriggers(triggers)
        }
    }

    /// Builds a policy from the six independent trigger flags
    pub fn from_flags(settings: &NotificationSettings) -> Self {
        let flags = [
            (settings.notify_aborted, Trigger::Aborted),
            (settings.notify_failure, Trigger::Failure),
            (settings.notify_not_built, Trigger::NotBuilt),
            (settings.notify_success, Trigger::Success),
            (settings.notify_unstable, Trigger::Unstable),
            (settings.notify_back_to_normal, Trigger::BackToNormal),
        ];

        Self::from_triggers(
            flags
                .into_iter()
                .filter(|(enabled, _)| *enabled)
                .map(|(_, trigger)| trigger),
        )
    }

    /// Active triggers; empty for `AlwaysSend`
    pub fn triggers(&self) -> BTreeSet<Trigger> {
        match self {
            TriggerPolicy::AlwaysSend => BTreeSet::new(),
            TriggerPolicy::OnTriggers(triggers) => triggers.clone(),
        }
    }

    pub fn is_active(&self, trigger: Trigger) -> bool {
        match self {
            TriggerPolicy::AlwaysSend => false,
            TriggerPolicy::OnTriggers(triggers) => triggers.contains(&trigger),
        }
    }
}

// =============================================================================
// Notification Settings (raw configuration surface)
// =============================================================================

/// Unvalidated notification settings, as found in config files and CLI flags
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct NotificationSettings {
    #[serde(default)]
    pub stream_id: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub access_token: Option<String>,
    #[serde(default)]
    pub notify_aborted: bool,
    #[serde(default)]
    pub notify_failure: bool,
    #[serde(default)]
    pub notify_not_built: bool,
    #[serde(default)]
    pub notify_success: bool,
    #[serde(default)]
    pub notify_unstable: bool,
    #[serde(default)]
    pub notify_back_to_normal: bool,
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}

/// Rejects an empty stream id
pub fn validate_stream_id(value: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::Configuration(
            "Please add at least one Howtank Stream ID".to_string(),
        ));
    }
    Ok(())
}

/// Rejects an empty message template
pub fn validate_message(value: &str) -> AppResult<()> {
    if value.is_empty() {
        return Err(AppError::Configuration("Please add message".to_string()));
    }
    Ok(())
}

impl NotificationSettings {
    /// Resolves these settings against the global defaults.
    ///
    /// Empty or missing `stream_id`, `message` and `access_token` fall back to
    /// the defaults. Trigger flags are never inherited.
    pub fn resolve(&self, defaults: &NotificationSettings) -> AppResult<NotificationConfig> {
        let stream_id = non_empty(&self.stream_id)
            .or_else(|| non_empty(&defaults.stream_id))
            .unwrap_or_default();
        validate_stream_id(stream_id)?;

        let message_template = non_empty(&self.message)
            .or_else(|| non_empty(&defaults.message))
            .unwrap_or_default();
        validate_message(message_template)?;

        let access_token = non_empty(&self.access_token)
            .or_else(|| non_empty(&defaults.access_token))
            .ok_or_else(|| AppError::Configuration("Please add an access token".to_string()))?;

        Ok(NotificationConfig {
            stream_id: stream_id.to_string(),
            message_template: message_template.to_string(),
            access_token: access_token.to_string(),
            triggers: TriggerPolicy::from_flags(self),
        })
    }

    /// Layers `other` on top of `self`: set fields and enabled flags in
    /// `other` win.
    pub fn merge(mut self, other: NotificationSettings) -> Self {
        if non_empty(&other.stream_id).is_some() {
            self.stream_id = other.stream_id;
        }
        if non_empty(&other.message).is_some() {
            self.message = other.message;
        }
        if non_empty(&other.access_token).is_some() {
            self.access_token = other.access_token;
        }
        self.notify_aborted |= other.notify_aborted;
        self.notify_failure |= other.notify_failure;
        self.notify_not_built |= other.notify_not_built;
        self.notify_success |= other.notify_success;
        self.notify_unstable |= other.notify_unstable;
        self.notify_back_to_normal |= other.notify_back_to_normal;
        self
    }
}

// =============================================================================
// Notification Config (validated)
// =============================================================================

/// Validated notification configuration for one job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NotificationConfig {
    pub stream_id: String,
    pub message_template: String,
    /// Literal secret or an `id:<credential-id>` reference
    pub access_token: String,
    pub triggers: TriggerPolicy,
}

impl NotificationConfig {
    pub fn new(
        stream_id: &str,
        message_template: &str,
        access_token: &str,
        triggers: TriggerPolicy,
    ) -> AppResult<Self> {
        validate_stream_id(stream_id)?;
        validate_message(message_template)?;

        Ok(Self {
            stream_id: stream_id.to_string(),
            message_template: message_template.to_string(),
            access_token: access_token.to_string(),
            triggers,
        })
    }
}
