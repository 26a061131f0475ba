//! Webhooks da Meta (Messenger / Instagram)
//!
//! - Handshake de assinatura (`hub.mode`, `hub.verify_token`, `hub.challenge`)
//! - Validação do header `X-Hub-Signature-256`
//! - Tipos do payload de entrada (`object`, `entry[].messaging[]`)

use hmac::{Hmac, Mac};
use serde::Deserialize;
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Valida o handshake `GET` de inscrição do webhook
pub fn verify_subscription(mode: Option<&str>, token: Option<&str>, expected_token: &str) -> bool {
    !expected_token.is_empty() && mode == Some("subscribe") && token == Some(expected_token)
}

/// Valida `X-Hub-Signature-256: sha256=<hex>` contra o body bruto
///
/// A comparação é feita em tempo constante (`verify_slice`).
pub fn verify_signature(app_secret: &str, signature_header: Option<&str>, body: &[u8]) -> bool {
    let signature = signature_header.unwrap_or("").trim();
    let signature = signature.strip_prefix("sha256=").unwrap_or(signature).trim();
    if signature.is_empty() {
        return false;
    }

    let Ok(signature_bytes) = hex::decode(signature) else {
        return false;
    };
    let Ok(mut mac) = HmacSha256::new_from_slice(app_secret.as_bytes()) else {
        return false;
    };

    mac.update(body);
    mac.verify_slice(&signature_bytes).is_ok()
}

/// Payload raiz do webhook
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookPayload {
    /// `page` (Messenger) ou `instagram`
    pub object: String,
    #[serde(default)]
    pub entry: Vec<Entry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Entry {
    /// Id da página ou da conta profissional do Instagram
    pub id: String,
    #[serde(default)]
    pub time: Option<i64>,
    #[serde(default)]
    pub messaging: Vec<MessagingEvent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Participant {
    pub id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessagingEvent {
    pub sender: Participant,
    pub recipient: Participant,
    /// Epoch em milissegundos
    #[serde(default)]
    pub timestamp: Option<i64>,
    #[serde(default)]
    pub message: Option<InboundMessage>,
    #[serde(default)]
    pub delivery: Option<Delivery>,
    #[serde(default)]
    pub read: Option<Read>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundMessage {
    pub mid: String,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub attachments: Vec<InboundAttachment>,
    /// Mensagem enviada pela própria página (eco)
    #[serde(default)]
    pub is_echo: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundAttachment {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub payload: Option<InboundAttachmentPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct InboundAttachmentPayload {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Delivery {
    #[serde(default)]
    pub mids: Vec<String>,
    #[serde(default)]
    pub watermark: Option<i64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Read {
    /// Presente no Instagram; o Messenger só manda `watermark`
    #[serde(default)]
    pub mid: Option<String>,
    #[serde(default)]
    pub watermark: Option<i64>,
}
