//! Notification policy.
//!
//! Pure decision logic over a build outcome and the configured triggers.

use crate::models::{BuildOutcome, BuildResult, Trigger, TriggerPolicy};

/// Returns the first trigger that matches the outcome.
///
/// Triggers are checked in a fixed order: aborted, back to normal, failure,
/// not built, success, unstable. A build without a result never matches.
pub fn matching_trigger(policy: &TriggerPolicy, outcome: &BuildOutcome) -> Option<Trigger> {
    let current = outcome.current?;

    if policy.is_active(Trigger::Aborted) && current == BuildResult::Aborted {
        return Some(Trigger::Aborted);
    }

    if policy.is_active(Trigger::BackToNormal)
        && current == BuildResult::Success
        && outcome.previous.is_some_and(BuildResult::is_broken)
    {
        return Some(Trigger::BackToNormal);
    }

    let direct = match current {
        BuildResult::Failure => Trigger::Failure,
        BuildResult::NotBuilt => Trigger::NotBuilt,
        BuildResult::Success => Trigger::Success,
        BuildResult::Unstable => Trigger::Unstable,
        BuildResult::Aborted => return None,
    };

    policy.is_active(direct).then_some(direct)
}

/// True if any configured trigger matches the outcome.
///
/// `AlwaysSend` has no triggers to match and yields false here; use
/// [`should_notify_or_default`] to honour it.
pub fn should_notify(policy: &TriggerPolicy, outcome: &BuildOutcome) -> bool {
    matching_trigger(policy, outcome).is_some()
}

/// Like [`should_notify`], but `AlwaysSend` notifies unconditionally, even
/// for a build that has no result yet.
pub fn should_notify_or_default(policy: &TriggerPolicy, outcome: &BuildOutcome) -> bool {
    match policy {
        TriggerPolicy::AlwaysSend => true,
        TriggerPolicy::OnTriggers(_) => should_notify(policy, outcome),
    }
}
