//! One-shot messages carried across a redirect.
//!
//! A handler that redirects after a form post queues a message with
//! [`push_flash`]; the next page rendered for that session drains the queue
//! through the [`Flash`] extractor.

use axum::{extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::models::session_keys;

/// Severity of a flash message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashLevel {
    Success,
    Error,
}

/// A message shown once on the next rendered page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlashMessage {
    pub level: FlashLevel,
    pub text: String,
}

impl FlashMessage {
    #[must_use]
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Success,
            text: text.into(),
        }
    }

    #[must_use]
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            level: FlashLevel::Error,
            text: text.into(),
        }
    }

    /// CSS class used by the templates.
    #[must_use]
    pub const fn css_class(&self) -> &'static str {
        match self.level {
            FlashLevel::Success => "flash flash-success",
            FlashLevel::Error => "flash flash-error",
        }
    }
}

/// Queue a message for the next page.
///
/// Failures are logged and swallowed: losing a notice must not fail the
/// request that produced it.
pub async fn push_flash(session: &Session, message: FlashMessage) {
    let mut queued: Vec<FlashMessage> = session
        .get(session_keys::FLASH)
        .await
        .ok()
        .flatten()
        .unwrap_or_default();
    queued.push(message);

    if let Err(e) = session.insert(session_keys::FLASH, queued).await {
        tracing::warn!(error = %e, "failed to store flash message");
    }
}

/// Extractor that drains queued flash messages.
pub struct Flash(pub Vec<FlashMessage>);

impl<S> FromRequestParts<S> for Flash
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let messages = match parts.extensions.get::<Session>() {
            Some(session) => session
                .remove::<Vec<FlashMessage>>(session_keys::FLASH)
                .await
                .ok()
                .flatten()
                .unwrap_or_default(),
            None => Vec::new(),
        };

        Ok(Self(messages))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    #[tokio::test]
    async fn test_push_then_drain() {
        let session = Session::new(None, Arc::new(MemoryStore::default()), None);

        push_flash(&session, FlashMessage::success("Saved")).await;
        push_flash(&session, FlashMessage::error("Photo refused")).await;

        let queued: Vec<FlashMessage> = session.remove(session_keys::FLASH).await.unwrap().unwrap();
        assert_eq!(
            queued,
            vec![
                FlashMessage::success("Saved"),
                FlashMessage::error("Photo refused")
            ]
        );
        assert!(
            session
                .get::<Vec<FlashMessage>>(session_keys::FLASH)
                .await
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn test_css_class() {
        assert_eq!(FlashMessage::error("x").css_class(), "flash flash-error");
        assert_eq!(FlashMessage::success("x").css_class(), "flash flash-success");
    }
}
