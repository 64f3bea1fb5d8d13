pub mod credentials;
pub mod notification;
pub mod notifier;
pub mod policy;
pub mod template;

pub use credentials::{
    resolve_access_token, ChainedResolver, CredentialResolver, CredentialStore,
    EnvCredentialStore,
};
pub use notification::{
    DeliveryStatus, DispatchError, HowtankNotifier, HttpOutcome, MessageDispatcher,
    NotificationResult, QueryMode,
};
pub use notifier::BuildNotifier;
pub use policy::{matching_trigger, should_notify, should_notify_or_default};
pub use template::{
    escape_special_characters, expand_or_fallback, prepare_message, BuildTokenExpander,
    Expansion, TemplateError, TokenExpander,
};
