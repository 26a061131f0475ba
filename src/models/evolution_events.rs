use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Envelope enviado pela Evolution API em todos os eventos
///
/// `data` varia por evento, por isso fica como `Value` e é tipado na normalização.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvolutionEnvelope {
    pub event: String,
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub data: Value,
    /// Chave global (ou da instância) quando o servidor está configurado para enviá-la
    #[serde(default)]
    pub apikey: Option<String>,
    #[serde(default)]
    pub date_time: Option<String>,
    #[serde(default)]
    pub server_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageKey {
    #[serde(default)]
    pub remote_jid: Option<String>,
    /// Telefone real quando `remoteJid` é um `@lid`
    #[serde(default)]
    pub remote_jid_alt: Option<String>,
    #[serde(default)]
    pub from_me: bool,
    #[serde(default)]
    pub id: Option<String>,
}

/// `data` de `messages.upsert`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpsertData {
    #[serde(default)]
    pub key: MessageKey,
    #[serde(default)]
    pub push_name: Option<String>,
    #[serde(default)]
    pub message: Option<MessageContent>,
    #[serde(default)]
    pub message_type: Option<String>,
    /// Segundos desde epoch; chega como número ou string dependendo da versão
    #[serde(default)]
    pub message_timestamp: Option<Value>,
    #[serde(default)]
    pub sender_pn: Option<String>,
}

/// Conteúdo da mensagem no formato do Baileys (`message.*`)
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageContent {
    #[serde(default)]
    pub conversation: Option<String>,
    #[serde(default)]
    pub extended_text_message: Option<TextMessage>,
    #[serde(default)]
    pub image_message: Option<MediaMessage>,
    #[serde(default)]
    pub video_message: Option<MediaMessage>,
    #[serde(default)]
    pub audio_message: Option<MediaMessage>,
    #[serde(default)]
    pub document_message: Option<MediaMessage>,
    #[serde(default)]
    pub document_with_caption_message: Option<Box<WrappedMessage>>,
    #[serde(default)]
    pub sticker_message: Option<MediaMessage>,
    #[serde(default)]
    pub location_message: Option<LocationMessage>,
    #[serde(default)]
    pub contact_message: Option<ContactMessage>,
    /// URL pública gerada quando a Evolution está com armazenamento S3/MinIO
    #[serde(default)]
    pub media_url: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TextMessage {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaMessage {
    #[serde(default)]
    pub caption: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub mimetype: Option<String>,
    #[serde(default)]
    pub file_name: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WrappedMessage {
    #[serde(default)]
    pub message: Option<MessageContent>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationMessage {
    #[serde(default)]
    pub degrees_latitude: Option<f64>,
    #[serde(default)]
    pub degrees_longitude: Option<f64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactMessage {
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub vcard: Option<String>,
}
