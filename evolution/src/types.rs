//! Tipos de request/response da Evolution API (v2)

use serde::{Deserialize, Serialize};

/// Body de `/message/sendText/{instance}`
#[derive(Debug, Clone, Serialize)]
pub struct SendTextRequest {
    pub number: String,
    pub text: String,
}

/// Tipo de mídia aceito por `/message/sendMedia/{instance}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
    Document,
}

/// Body de `/message/sendMedia/{instance}`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMediaRequest {
    pub number: String,
    pub mediatype: MediaType,
    /// URL pública (ou base64) da mídia
    pub media: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub caption: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
}

/// Body de `/message/sendWhatsAppAudio/{instance}`
#[derive(Debug, Clone, Serialize)]
pub struct SendAudioRequest {
    pub number: String,
    pub audio: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    #[serde(default)]
    pub remote_jid: Option<String>,
    #[serde(default)]
    pub from_me: Option<bool>,
    #[serde(default)]
    pub id: Option<String>,
}

/// Resposta dos endpoints de envio
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    #[serde(default)]
    pub key: Option<MessageKey>,
    #[serde(default)]
    pub status: Option<String>,
}

impl SendMessageResponse {
    /// Id da mensagem no WhatsApp (`key.id`)
    pub fn message_id(&self) -> Option<&str> {
        self.key.as_ref().and_then(|k| k.id.as_deref())
    }
}
