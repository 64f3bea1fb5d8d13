//! Howtank stream dispatcher.
//!
//! Posts `add_stream_message` commands to the Howtank v4 API. The command is
//! carried in the query string; the body repeats the message as raw text even
//! though the request is labelled `application/json`, which is what the API
//! accepts.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use url::form_urlencoded;
use url::Url;

use super::{DispatchError, HttpOutcome, MessageDispatcher};

pub const HOWTANK_BASE_API_URL: &str = "https://www.howtank.com/api/v4";

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 5;

/// Shape of the command query string
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryMode {
    #[default]
    Standard,
    /// Adds `mode=expert` after `local_id`
    Expert,
}

/// Builds the form-encoded `add_stream_message` query.
///
/// Parameter order is fixed. Spaces encode as `+`.
pub fn build_query(stream_id: &str, message: &str, mode: QueryMode) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query
        .append_pair("command", "add_stream_message")
        .append_pair("stream_id", stream_id)
        .append_pair("local_id", "0");
    if mode == QueryMode::Expert {
        query.append_pair("mode", "expert");
    }
    query
        .append_pair("type", "group_chat")
        .append_pair("content", message);
    query.finish()
}

/// Howtank API dispatcher
pub struct HowtankNotifier {
    client: reqwest::Client,
    base_url: String,
    mode: QueryMode,
}

impl HowtankNotifier {
    /// Creates a dispatcher for the public Howtank API
    pub fn new() -> Result<Self, DispatchError> {
        Self::with_base_url(HOWTANK_BASE_API_URL, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    /// Creates a dispatcher for another API root (staging, tests)
    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, DispatchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DispatchError::Client(e.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
            mode: QueryMode::Standard,
        })
    }

    pub fn with_mode(mut self, mode: QueryMode) -> Self {
        self.mode = mode;
        self
    }

    /// Full request URL for a message
    pub fn request_url(&self, stream_id: &str, message: &str) -> Result<Url, DispatchError> {
        let mut url = Url::parse(&self.base_url)
            .map_err(|e| DispatchError::InvalidUrl(format!("{}: {}", self.base_url, e)))?;

        if url.cannot_be_a_base() {
            return Err(DispatchError::InvalidUrl(self.base_url.clone()));
        }

        url.set_query(Some(&build_query(stream_id, message, self.mode)));
        Ok(url)
    }
}

#[async_trait]
impl MessageDispatcher for HowtankNotifier {
    async fn dispatch(
        &self,
        stream_id: &str,
        message: &str,
        access_token: &str,
    ) -> Result<HttpOutcome, DispatchError> {
        let url = self.request_url(stream_id, message)?;

        log::debug!("Pushing stream message to: {}", url);

        let response = self
            .client
            .post(url)
            .header(AUTHORIZATION, format!("Bearer {}", access_token))
            .header(CONTENT_TYPE, "application/json")
            .body(message.to_string())
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await.unwrap_or_else(|e| {
            log::debug!("Failed to read Howtank response body: {}", e);
            String::new()
        });

        if status == StatusCode::OK {
            Ok(HttpOutcome {
                status: status.as_u16(),
                body,
            })
        } else {
            Err(DispatchError::UnexpectedStatus {
                status: status.as_u16(),
                body,
            })
        }
    }
}
