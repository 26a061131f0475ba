//! Contrato HTTP de `POST /send-message`

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{ChannelType, MessageType};

fn default_message_type() -> MessageType {
    MessageType::Text
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub conversation_id: Uuid,
    #[serde(default)]
    pub content: String,
    #[serde(default = "default_message_type")]
    pub message_type: MessageType,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageResponse {
    pub success: bool,
    pub message_id: Uuid,
    pub external_id: String,
    pub channel: ChannelType,
}

/// Mensagem pronta para um provedor: destinatário já resolvido a partir do contato
#[derive(Debug, Clone, PartialEq)]
pub struct OutboundMessage {
    /// Telefone (WhatsApp) ou PSID/IGSID (Meta)
    pub recipient: String,
    pub message_type: MessageType,
    pub content: String,
    pub media_url: Option<String>,
    pub file_name: Option<String>,
}

impl OutboundMessage {
    /// Texto que acompanha uma mídia, quando houver
    pub fn caption(&self) -> Option<&str> {
        Some(self.content.trim()).filter(|c| !c.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SentMessage {
    pub external_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_request_defaults_to_text() {
        let request: SendMessageRequest = serde_json::from_value(json!({
            "conversationId": "6f1c2a9e-51b4-4c47-9a7a-2d4f9a0a1b11",
            "content": "Olá"
        }))
        .unwrap();
        assert_eq!(request.message_type, MessageType::Text);
        assert!(request.media_url.is_none());
    }

    #[test]
    fn test_response_is_camel_case() {
        let response = SendMessageResponse {
            success: true,
            message_id: Uuid::nil(),
            external_id: "ABC".into(),
            channel: ChannelType::Whatsapp,
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["externalId"], "ABC");
        assert_eq!(json["channel"], "whatsapp");
        assert!(json.get("messageId").is_some());
    }
}
