//! Build notifier.
//!
//! Handles one finished build end to end: resolve the access token, apply
//! the trigger policy, render the message and dispatch it. Every failure is
//! logged and folded into the returned [`NotificationResult`]; nothing here
//! aborts the calling pipeline.

use crate::models::{BuildContext, BuildOutcome, NotificationConfig};
use crate::services::credentials::{resolve_access_token, CredentialResolver};
use crate::services::notification::{MessageDispatcher, NotificationResult};
use crate::services::policy::{matching_trigger, should_notify_or_default};
use crate::services::template::{prepare_message, TokenExpander};

pub struct BuildNotifier<D, E> {
    dispatcher: D,
    expander: E,
}

impl<D: MessageDispatcher, E: TokenExpander> BuildNotifier<D, E> {
    pub fn new(dispatcher: D, expander: E) -> Self {
        Self {
            dispatcher,
            expander,
        }
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    /// Whether `outcome` should produce a notification under `config`
    pub fn should_send(&self, config: &NotificationConfig, outcome: &BuildOutcome) -> bool {
        should_notify_or_default(&config.triggers, outcome)
    }

    /// Renders the escaped message for `context`
    pub fn render(&self, config: &NotificationConfig, context: &BuildContext) -> String {
        let expansion = prepare_message(&self.expander, &config.message_template, context);
        if let Some(ref diagnostic) = expansion.diagnostic {
            log::warn!("{}", diagnostic);
        }
        expansion.text
    }

    /// Notifies the stream about a finished build
    pub async fn notify(
        &self,
        config: &NotificationConfig,
        context: &BuildContext,
        credentials: &dyn CredentialResolver,
    ) -> NotificationResult {
        let access_token = match resolve_access_token(&config.access_token, credentials) {
            Ok(token) => token,
            Err(e) => {
                log::error!("Invalid or missing access token provided. {}", e);
                return NotificationResult::skipped(e.to_string());
            }
        };

        if !self.should_send(config, &context.outcome) {
            log::info!("Notification will not be sent to Howtank for this build");
            return NotificationResult::skipped("No trigger matched the build outcome".to_string());
        }

        if let Some(trigger) = matching_trigger(&config.triggers, &context.outcome) {
            log::debug!("Notification triggered by '{}'", trigger);
        }

        let message = self.render(config, context);

        match self
            .dispatcher
            .dispatch(&config.stream_id, &message, &access_token)
            .await
        {
            Ok(response) => {
                log::info!("Howtank Notification Response: {}", response.body);
                NotificationResult::success(Some(response.status))
            }
            Err(e) => {
                log::error!("Howtank Notification failed: {}", e);
                NotificationResult::failure(e.to_string(), e.http_status())
            }
        }
    }
}
