//! Tipos da Send API (Messenger Platform / Instagram Messaging)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize)]
pub struct Recipient {
    pub id: String,
}

/// Tipo de anexo aceito pela Send API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttachmentType {
    Image,
    Audio,
    Video,
    File,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttachmentPayload {
    pub url: String,
    pub is_reusable: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Attachment {
    #[serde(rename = "type")]
    pub kind: AttachmentType,
    pub payload: AttachmentPayload,
}

/// Conteúdo da mensagem: texto ou um anexo (a Send API não aceita os dois juntos)
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OutgoingMessage {
    Text { text: String },
    Attachment { attachment: Attachment },
}

impl OutgoingMessage {
    pub fn text(text: impl Into<String>) -> Self {
        OutgoingMessage::Text { text: text.into() }
    }

    pub fn attachment(kind: AttachmentType, url: impl Into<String>) -> Self {
        OutgoingMessage::Attachment {
            attachment: Attachment {
                kind,
                payload: AttachmentPayload {
                    url: url.into(),
                    is_reusable: true,
                },
            },
        }
    }
}

/// Body de `POST /me/messages`
#[derive(Debug, Clone, Serialize)]
pub struct SendRequest {
    pub recipient: Recipient,
    pub messaging_type: String,
    pub message: OutgoingMessage,
}

impl SendRequest {
    /// Resposta dentro da janela de 24h
    pub fn response(recipient_id: impl Into<String>, message: OutgoingMessage) -> Self {
        Self {
            recipient: Recipient { id: recipient_id.into() },
            messaging_type: "RESPONSE".to_string(),
            message,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SendResponse {
    #[serde(default)]
    pub recipient_id: Option<String>,
    pub message_id: String,
}
