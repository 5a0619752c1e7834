use serde::{Deserialize, Serialize};

/// Body posted to the webhook when a job finishes.
///
/// Field names are the webhook's wire names: `texto` carries the
/// user-facing text and `chat_id` the owner identifier the job ran for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationMessage {
    pub texto: String,
    pub chat_id: String,
}

impl NotificationMessage {
    pub fn new(chat_id: impl Into<String>, texto: impl Into<String>) -> Self {
        Self {
            texto: texto.into(),
            chat_id: chat_id.into(),
        }
    }
}
