//! Normalização dos webhooks dos provedores para `InboundEvent`
//!
//! Funções puras: nenhuma consulta ao banco acontece aqui. Os efeitos
//! colaterais ficam em [`crate::services::ingestion`].

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::models::evolution_events::{MessageContent, UpsertData};
use crate::models::{
    ChannelType, ConnectionState, EvolutionEnvelope, InboundEvent, InboundMessage, MessageStatus, MessageType,
};
use crate::utils::phone::{classify_jid, JidKind};
use crate::utils::text::placeholder_for;

pub const EVENT_MESSAGES_UPSERT: &str = "messages.upsert";
pub const EVENT_MESSAGES_UPDATE: &str = "messages.update";
pub const EVENT_CONNECTION_UPDATE: &str = "connection.update";
pub const EVENT_QRCODE_UPDATED: &str = "qrcode.updated";

/// Tipos do Baileys que não representam conteúdo para o inbox
const IGNORED_MESSAGE_TYPES: &[&str] = &["protocolMessage", "reactionMessage", "senderKeyDistributionMessage"];

/// `MESSAGES_UPSERT` e `messages-upsert` viram `messages.upsert`
pub fn normalize_event_name(event: &str) -> String {
    event.trim().to_ascii_lowercase().replace(['_', '-'], ".")
}

/// Converte um envelope da Evolution em eventos canônicos (um por item de `data`)
pub fn normalize_evolution(envelope: &EvolutionEnvelope) -> Vec<InboundEvent> {
    let event = normalize_event_name(&envelope.event);

    match event.as_str() {
        EVENT_MESSAGES_UPSERT => data_items(&envelope.data).into_iter().map(normalize_upsert).collect(),
        EVENT_MESSAGES_UPDATE => data_items(&envelope.data).into_iter().map(normalize_status_update).collect(),
        EVENT_CONNECTION_UPDATE => vec![normalize_connection(&envelope.data)],
        EVENT_QRCODE_UPDATED => vec![normalize_qrcode(&envelope.data)],
        other => vec![InboundEvent::Ignored(format!("event '{}' not handled", other))],
    }
}

/// `data` pode ser um objeto, um array ou `{ messages: [...] }`
fn data_items(data: &Value) -> Vec<&Value> {
    match data {
        Value::Array(items) => items.iter().collect(),
        Value::Object(map) => match map.get("messages") {
            Some(Value::Array(items)) => items.iter().collect(),
            _ => vec![data],
        },
        _ => Vec::new(),
    }
}

fn normalize_upsert(item: &Value) -> InboundEvent {
    let data: UpsertData = match serde_json::from_value(item.clone()) {
        Ok(data) => data,
        Err(e) => return InboundEvent::Ignored(format!("invalid messages.upsert item: {}", e)),
    };

    let Some(external_id) = data.key.id.clone().filter(|id| !id.is_empty()) else {
        return InboundEvent::Ignored("message without key.id".to_string());
    };
    let Some(remote_jid) = data.key.remote_jid.as_deref() else {
        return InboundEvent::Ignored("message without remoteJid".to_string());
    };

    if data
        .message_type
        .as_deref()
        .is_some_and(|t| IGNORED_MESSAGE_TYPES.contains(&t))
    {
        return InboundEvent::Ignored(format!("message type '{}' ignored", data.message_type.unwrap_or_default()));
    }

    let (identifier, phone) = match classify_jid(remote_jid) {
        JidKind::User(phone) => (phone.clone(), Some(phone)),
        // @lid: usa o telefone real quando a Evolution o informa, senão o JID completo
        JidKind::Lid(lid) => match resolve_lid_phone(&data) {
            Some(phone) => (phone.clone(), Some(phone)),
            None => (format!("{}@lid", lid), None),
        },
        JidKind::Group => return InboundEvent::Ignored("group chat".to_string()),
        JidKind::Broadcast => return InboundEvent::Ignored("broadcast chat".to_string()),
        JidKind::Newsletter => return InboundEvent::Ignored("newsletter chat".to_string()),
        JidKind::Unknown => return InboundEvent::Ignored(format!("unrecognized jid '{}'", remote_jid)),
    };

    let Some(message) = data.message.as_ref() else {
        return InboundEvent::Ignored("message without content".to_string());
    };
    let extracted = extract_content(message);

    let from_me = data.key.from_me;
    let contact_name = if from_me {
        None
    } else {
        data.push_name.clone().filter(|n| !n.trim().is_empty())
    };

    InboundEvent::Message(InboundMessage {
        channel_type: ChannelType::Whatsapp,
        contact_identifier: identifier,
        contact_name,
        contact_phone: phone,
        external_id,
        from_me,
        message_type: extracted.message_type,
        content: extracted.content,
        media_url: extracted.media_url,
        timestamp: data.message_timestamp.as_ref().and_then(parse_epoch_seconds),
    })
}

fn resolve_lid_phone(data: &UpsertData) -> Option<String> {
    [data.key.remote_jid_alt.as_deref(), data.sender_pn.as_deref()]
        .into_iter()
        .flatten()
        .find_map(|jid| match classify_jid(jid) {
            JidKind::User(phone) => Some(phone),
            _ => None,
        })
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedContent {
    pub message_type: MessageType,
    pub content: String,
    pub media_url: Option<String>,
}

impl ExtractedContent {
    fn new(message_type: MessageType, content: impl Into<String>, media_url: Option<String>) -> Self {
        Self {
            message_type,
            content: content.into(),
            media_url,
        }
    }
}

/// Extrai tipo, texto e URL de mídia do conteúdo no formato do Baileys
pub fn extract_content(message: &MessageContent) -> ExtractedContent {
    // URL pública (S3/MinIO) tem precedência sobre a URL criptografada do WhatsApp
    let media_url = |url: &Option<String>| message.media_url.clone().or_else(|| url.clone());

    if let Some(text) = message.conversation.as_deref().filter(|t| !t.is_empty()) {
        return ExtractedContent::new(MessageType::Text, text, None);
    }
    if let Some(text) = message
        .extended_text_message
        .as_ref()
        .and_then(|m| m.text.as_deref())
        .filter(|t| !t.is_empty())
    {
        return ExtractedContent::new(MessageType::Text, text, None);
    }
    if let Some(image) = &message.image_message {
        return ExtractedContent::new(MessageType::Image, image.caption.clone().unwrap_or_default(), media_url(&image.url));
    }
    if let Some(video) = &message.video_message {
        return ExtractedContent::new(MessageType::Video, video.caption.clone().unwrap_or_default(), media_url(&video.url));
    }
    if let Some(document) = &message.document_message {
        let content = document
            .caption
            .clone()
            .or_else(|| document.file_name.clone())
            .unwrap_or_default();
        return ExtractedContent::new(MessageType::Document, content, media_url(&document.url));
    }
    if let Some(inner) = message
        .document_with_caption_message
        .as_ref()
        .and_then(|wrapped| wrapped.message.as_ref())
    {
        let mut extracted = extract_content(inner);
        if extracted.media_url.is_none() {
            extracted.media_url = message.media_url.clone();
        }
        return extracted;
    }
    if let Some(audio) = &message.audio_message {
        return ExtractedContent::new(MessageType::Audio, "", media_url(&audio.url));
    }
    if let Some(sticker) = &message.sticker_message {
        return ExtractedContent::new(MessageType::Sticker, "", media_url(&sticker.url));
    }
    if let Some(location) = &message.location_message {
        let coordinates = match (location.degrees_latitude, location.degrees_longitude) {
            (Some(lat), Some(lng)) => format!("{},{}", lat, lng),
            _ => String::new(),
        };
        let content = match location.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) if coordinates.is_empty() => name.to_string(),
            Some(name) => format!("{} ({})", name, coordinates),
            None => coordinates,
        };
        return ExtractedContent::new(MessageType::Location, content, None);
    }
    if let Some(contact) = &message.contact_message {
        return ExtractedContent::new(MessageType::Contact, contact.display_name.clone().unwrap_or_default(), None);
    }

    ExtractedContent::new(MessageType::Unknown, placeholder_for(MessageType::Unknown), None)
}

/// `messageTimestamp` chega como número, string numérica ou `{ low, high }` (Long)
fn parse_epoch_seconds(value: &Value) -> Option<DateTime<Utc>> {
    let seconds = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Object(map) => map.get("low").and_then(Value::as_i64),
        _ => None,
    }?;

    if seconds <= 0 {
        return None;
    }
    Utc.timestamp_opt(seconds, 0).single()
}

fn normalize_status_update(item: &Value) -> InboundEvent {
    let external_id = item
        .get("keyId")
        .or_else(|| item.pointer("/key/id"))
        .or_else(|| item.get("messageId"))
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty());

    let Some(external_id) = external_id else {
        return InboundEvent::Ignored("status update without message id".to_string());
    };

    let raw_status = item.get("status").or_else(|| item.pointer("/update/status"));
    match raw_status.and_then(parse_provider_status) {
        Some(status) => InboundEvent::StatusUpdate {
            external_id: external_id.to_string(),
            status,
        },
        None => InboundEvent::Ignored(format!("unmapped status {:?}", raw_status)),
    }
}

/// Status do WhatsApp (nome ou código numérico) para `MessageStatus`
pub fn parse_provider_status(value: &Value) -> Option<MessageStatus> {
    let code = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => match s.trim().to_ascii_uppercase().as_str() {
            "ERROR" => 0,
            "PENDING" => 1,
            "SERVER_ACK" => 2,
            "DELIVERY_ACK" => 3,
            "READ" => 4,
            "PLAYED" => 5,
            other => other.parse::<i64>().ok()?,
        },
        _ => return None,
    };

    match code {
        0 => Some(MessageStatus::Failed),
        1 => Some(MessageStatus::Pending),
        2 => Some(MessageStatus::Sent),
        3 => Some(MessageStatus::Delivered),
        4 | 5 => Some(MessageStatus::Read),
        _ => None,
    }
}

fn normalize_connection(data: &Value) -> InboundEvent {
    let state = data.get("state").and_then(Value::as_str).unwrap_or_default();
    match state.to_ascii_lowercase().as_str() {
        "open" => InboundEvent::Connection(ConnectionState::Connected),
        "connecting" => InboundEvent::Connection(ConnectionState::Connecting),
        "close" | "refused" => InboundEvent::Connection(ConnectionState::Disconnected),
        other => InboundEvent::Ignored(format!("connection state '{}' not handled", other)),
    }
}

fn normalize_qrcode(data: &Value) -> InboundEvent {
    let qrcode = data.get("qrcode").unwrap_or(data);
    let code = ["base64", "code"]
        .into_iter()
        .filter_map(|field| qrcode.get(field).and_then(Value::as_str))
        .find(|value| !value.is_empty());

    match code {
        Some(code) => InboundEvent::QrCode(code.to_string()),
        None => InboundEvent::Ignored("qrcode.updated without qrcode".to_string()),
    }
}

/// Converte um webhook da Meta em `(id da conta, evento)`
pub fn normalize_meta(payload: &meta_graph::webhooks::WebhookPayload) -> Vec<(String, InboundEvent)> {
    let channel_type = match payload.object.as_str() {
        "page" => ChannelType::Messenger,
        "instagram" => ChannelType::Instagram,
        other => {
            return payload
                .entry
                .iter()
                .map(|entry| (entry.id.clone(), InboundEvent::Ignored(format!("object '{}' not handled", other))))
                .collect();
        }
    };

    let mut events = Vec::new();
    for entry in &payload.entry {
        for messaging in &entry.messaging {
            for event in normalize_messaging(channel_type, messaging) {
                events.push((entry.id.clone(), event));
            }
        }
    }
    events
}

fn normalize_messaging(channel_type: ChannelType, event: &meta_graph::webhooks::MessagingEvent) -> Vec<InboundEvent> {
    if let Some(message) = &event.message {
        // Eco: enviada pela página, o contato é o destinatário
        let contact_id = if message.is_echo {
            &event.recipient.id
        } else {
            &event.sender.id
        };

        let (message_type, content, media_url) = match (&message.text, message.attachments.first()) {
            (Some(text), _) if !text.is_empty() => (MessageType::Text, text.clone(), None),
            (_, Some(attachment)) => {
                let message_type = match attachment.kind.as_str() {
                    "image" => MessageType::Image,
                    "audio" => MessageType::Audio,
                    "video" => MessageType::Video,
                    "file" => MessageType::Document,
                    _ => MessageType::Unknown,
                };
                let content = if message_type == MessageType::Unknown {
                    placeholder_for(MessageType::Unknown).to_string()
                } else {
                    String::new()
                };
                let url = attachment.payload.as_ref().and_then(|p| p.url.clone());
                (message_type, content, url)
            }
            _ => (MessageType::Unknown, placeholder_for(MessageType::Unknown).to_string(), None),
        };

        return vec![InboundEvent::Message(InboundMessage {
            channel_type,
            contact_identifier: contact_id.clone(),
            contact_name: None,
            contact_phone: None,
            external_id: message.mid.clone(),
            from_me: message.is_echo,
            message_type,
            content,
            media_url,
            timestamp: event.timestamp.and_then(|ms| Utc.timestamp_millis_opt(ms).single()),
        })];
    }

    if let Some(delivery) = &event.delivery {
        return delivery
            .mids
            .iter()
            .map(|mid| InboundEvent::StatusUpdate {
                external_id: mid.clone(),
                status: MessageStatus::Delivered,
            })
            .collect();
    }

    if let Some(read) = &event.read {
        return match &read.mid {
            Some(mid) => vec![InboundEvent::StatusUpdate {
                external_id: mid.clone(),
                status: MessageStatus::Read,
            }],
            None => vec![InboundEvent::Ignored("read watermark without mid".to_string())],
        };
    }

    vec![InboundEvent::Ignored("messaging event not handled".to_string())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn envelope(event: &str, data: Value) -> EvolutionEnvelope {
        serde_json::from_value(json!({ "event": event, "instance": "acme", "data": data })).unwrap()
    }

    fn single(events: Vec<InboundEvent>) -> InboundEvent {
        assert_eq!(events.len(), 1, "expected one event, got {:?}", events);
        events.into_iter().next().unwrap()
    }

    #[test]
    fn test_event_names_are_normalized() {
        assert_eq!(normalize_event_name("MESSAGES_UPSERT"), "messages.upsert");
        assert_eq!(normalize_event_name("messages.update"), "messages.update");
        assert_eq!(normalize_event_name("QRCODE_UPDATED"), "qrcode.updated");
        assert_eq!(normalize_event_name("connection-update"), "connection.update");
    }

    #[test]
    fn test_text_upsert() {
        let event = single(normalize_evolution(&envelope(
            "MESSAGES_UPSERT",
            json!({
                "key": { "remoteJid": "5511999990000@s.whatsapp.net", "fromMe": false, "id": "ABC123" },
                "pushName": "Maria",
                "message": { "conversation": "Olá, tudo bem?" },
                "messageType": "conversation",
                "messageTimestamp": 1700000000
            }),
        )));

        let InboundEvent::Message(message) = event else {
            panic!("expected message, got {:?}", event);
        };
        assert_eq!(message.channel_type, ChannelType::Whatsapp);
        assert_eq!(message.contact_identifier, "5511999990000");
        assert_eq!(message.contact_phone.as_deref(), Some("5511999990000"));
        assert_eq!(message.contact_name.as_deref(), Some("Maria"));
        assert_eq!(message.external_id, "ABC123");
        assert_eq!(message.message_type, MessageType::Text);
        assert_eq!(message.content, "Olá, tudo bem?");
        assert_eq!(message.timestamp.unwrap().timestamp(), 1700000000);
        assert!(!message.from_me);
    }

    #[test]
    fn test_from_me_does_not_carry_push_name() {
        let event = single(normalize_evolution(&envelope(
            "messages.upsert",
            json!({
                "key": { "remoteJid": "5511999990000@s.whatsapp.net", "fromMe": true, "id": "OUT1" },
                "pushName": "Atendente",
                "message": { "extendedTextMessage": { "text": "Já verifico" } },
                "messageTimestamp": "1700000100"
            }),
        )));

        let InboundEvent::Message(message) = event else { panic!() };
        assert!(message.from_me);
        assert!(message.contact_name.is_none());
        assert_eq!(message.content, "Já verifico");
        assert_eq!(message.timestamp.unwrap().timestamp(), 1700000100);
    }

    #[test]
    fn test_group_broadcast_and_newsletter_are_skipped() {
        for jid in ["1203630@g.us", "status@broadcast", "1203630@newsletter"] {
            let event = single(normalize_evolution(&envelope(
                "messages.upsert",
                json!({
                    "key": { "remoteJid": jid, "fromMe": false, "id": "X" },
                    "message": { "conversation": "oi" }
                }),
            )));
            assert!(matches!(event, InboundEvent::Ignored(_)), "{} not skipped", jid);
        }
    }

    #[test]
    fn test_lid_uses_alternate_phone() {
        let event = single(normalize_evolution(&envelope(
            "messages.upsert",
            json!({
                "key": {
                    "remoteJid": "123456789@lid",
                    "remoteJidAlt": "5521988887777@s.whatsapp.net",
                    "fromMe": false,
                    "id": "LID1"
                },
                "message": { "conversation": "oi" }
            }),
        )));

        let InboundEvent::Message(message) = event else { panic!() };
        assert_eq!(message.contact_identifier, "5521988887777");
    }

    #[test]
    fn test_lid_without_phone_keeps_full_jid() {
        let event = single(normalize_evolution(&envelope(
            "messages.upsert",
            json!({
                "key": { "remoteJid": "204050607080@lid", "fromMe": false, "id": "LID2" },
                "message": { "conversation": "oi" }
            }),
        )));

        let InboundEvent::Message(message) = event else { panic!() };
        assert_eq!(message.contact_identifier, "204050607080@lid");
        assert!(message.contact_phone.is_none());
    }

    #[test]
    fn test_media_and_special_content() {
        let image: MessageContent = serde_json::from_value(json!({
            "imageMessage": { "caption": "nota fiscal", "url": "https://mmg.whatsapp.net/x.enc" },
            "mediaUrl": "https://s3.example.com/x.jpg"
        }))
        .unwrap();
        let extracted = extract_content(&image);
        assert_eq!(extracted.message_type, MessageType::Image);
        assert_eq!(extracted.content, "nota fiscal");
        assert_eq!(extracted.media_url.as_deref(), Some("https://s3.example.com/x.jpg"));

        let document: MessageContent = serde_json::from_value(json!({
            "documentWithCaptionMessage": {
                "message": { "documentMessage": { "fileName": "boleto.pdf", "url": "https://mmg/doc" } }
            }
        }))
        .unwrap();
        let extracted = extract_content(&document);
        assert_eq!(extracted.message_type, MessageType::Document);
        assert_eq!(extracted.content, "boleto.pdf");

        let location: MessageContent = serde_json::from_value(json!({
            "locationMessage": { "degreesLatitude": -23.5, "degreesLongitude": -46.6, "name": "Escritório" }
        }))
        .unwrap();
        assert_eq!(extract_content(&location).content, "Escritório (-23.5,-46.6)");

        let contact: MessageContent =
            serde_json::from_value(json!({ "contactMessage": { "displayName": "João" } })).unwrap();
        let extracted = extract_content(&contact);
        assert_eq!(extracted.message_type, MessageType::Contact);
        assert_eq!(extracted.content, "João");

        let poll: MessageContent = serde_json::from_value(json!({ "pollCreationMessage": { "name": "?" } })).unwrap();
        let extracted = extract_content(&poll);
        assert_eq!(extracted.message_type, MessageType::Unknown);
        assert_eq!(extracted.content, "[unsupported message]");
    }

    #[test]
    fn test_protocol_messages_are_ignored() {
        let event = single(normalize_evolution(&envelope(
            "messages.upsert",
            json!({
                "key": { "remoteJid": "5511999990000@s.whatsapp.net", "fromMe": false, "id": "P1" },
                "message": { "protocolMessage": { "type": 0 } },
                "messageType": "protocolMessage"
            }),
        )));
        assert!(matches!(event, InboundEvent::Ignored(_)));
    }

    #[test]
    fn test_data_array_and_messages_wrapper() {
        let item = |id: &str| {
            json!({
                "key": { "remoteJid": "5511999990000@s.whatsapp.net", "fromMe": false, "id": id },
                "message": { "conversation": "oi" }
            })
        };

        let events = normalize_evolution(&envelope("messages.upsert", json!([item("A"), item("B")])));
        assert_eq!(events.len(), 2);

        let events = normalize_evolution(&envelope("messages.upsert", json!({ "messages": [item("C")] })));
        assert!(matches!(&events[0], InboundEvent::Message(m) if m.external_id == "C"));
    }

    #[test]
    fn test_status_mapping() {
        let cases = [
            (json!("ERROR"), MessageStatus::Failed),
            (json!("PENDING"), MessageStatus::Pending),
            (json!("SERVER_ACK"), MessageStatus::Sent),
            (json!("DELIVERY_ACK"), MessageStatus::Delivered),
            (json!("READ"), MessageStatus::Read),
            (json!("PLAYED"), MessageStatus::Read),
            (json!(3), MessageStatus::Delivered),
            (json!("4"), MessageStatus::Read),
        ];
        for (raw, expected) in cases {
            assert_eq!(parse_provider_status(&raw), Some(expected), "{:?}", raw);
        }
        assert_eq!(parse_provider_status(&json!("DELETED")), None);
    }

    #[test]
    fn test_status_update_event() {
        let event = single(normalize_evolution(&envelope(
            "MESSAGES_UPDATE",
            json!({ "keyId": "ABC123", "remoteJid": "5511999990000@s.whatsapp.net", "status": "READ" }),
        )));
        assert_eq!(
            event,
            InboundEvent::StatusUpdate {
                external_id: "ABC123".into(),
                status: MessageStatus::Read
            }
        );

        let legacy = single(normalize_evolution(&envelope(
            "messages.update",
            json!({ "key": { "id": "OLD1" }, "update": { "status": 2 } }),
        )));
        assert!(matches!(legacy, InboundEvent::StatusUpdate { status: MessageStatus::Sent, .. }));
    }

    #[test]
    fn test_connection_and_qrcode() {
        let cases = [
            ("open", ConnectionState::Connected),
            ("connecting", ConnectionState::Connecting),
            ("close", ConnectionState::Disconnected),
            ("refused", ConnectionState::Disconnected),
        ];
        for (state, expected) in cases {
            let event = single(normalize_evolution(&envelope("CONNECTION_UPDATE", json!({ "state": state }))));
            assert_eq!(event, InboundEvent::Connection(expected));
        }

        let event = single(normalize_evolution(&envelope(
            "QRCODE_UPDATED",
            json!({ "qrcode": { "base64": "data:image/png;base64,AAA", "code": "2@xyz" } }),
        )));
        assert_eq!(event, InboundEvent::QrCode("data:image/png;base64,AAA".into()));

        let event = single(normalize_evolution(&envelope("qrcode.updated", json!({ "qrcode": { "code": "2@xyz" } }))));
        assert_eq!(event, InboundEvent::QrCode("2@xyz".into()));
    }

    #[test]
    fn test_unknown_event_is_ignored() {
        let event = single(normalize_evolution(&envelope("CONTACTS_UPSERT", json!({}))));
        assert!(matches!(event, InboundEvent::Ignored(reason) if reason.contains("contacts.upsert")));
    }

    #[test]
    fn test_meta_messages_and_receipts() {
        let payload: meta_graph::webhooks::WebhookPayload = serde_json::from_value(json!({
            "object": "instagram",
            "entry": [{
                "id": "IG_ACCOUNT",
                "time": 1700000000000i64,
                "messaging": [
                    {
                        "sender": { "id": "IGSID_1" },
                        "recipient": { "id": "IG_ACCOUNT" },
                        "timestamp": 1700000000000i64,
                        "message": { "mid": "m_1", "text": "oi" }
                    },
                    {
                        "sender": { "id": "IG_ACCOUNT" },
                        "recipient": { "id": "IGSID_1" },
                        "message": { "mid": "m_2", "is_echo": true,
                                     "attachments": [{ "type": "image", "payload": { "url": "https://cdn/x.jpg" } }] }
                    },
                    {
                        "sender": { "id": "IGSID_1" },
                        "recipient": { "id": "IG_ACCOUNT" },
                        "read": { "mid": "m_2" }
                    }
                ]
            }]
        }))
        .unwrap();

        let events = normalize_meta(&payload);
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|(account, _)| account == "IG_ACCOUNT"));

        let InboundEvent::Message(inbound) = &events[0].1 else { panic!() };
        assert_eq!(inbound.channel_type, ChannelType::Instagram);
        assert_eq!(inbound.contact_identifier, "IGSID_1");
        assert_eq!(inbound.timestamp.unwrap().timestamp(), 1700000000);

        let InboundEvent::Message(echo) = &events[1].1 else { panic!() };
        assert!(echo.from_me);
        assert_eq!(echo.contact_identifier, "IGSID_1");
        assert_eq!(echo.message_type, MessageType::Image);
        assert_eq!(echo.media_url.as_deref(), Some("https://cdn/x.jpg"));

        assert_eq!(
            events[2].1,
            InboundEvent::StatusUpdate {
                external_id: "m_2".into(),
                status: MessageStatus::Read
            }
        );
    }

    #[test]
    fn test_meta_delivery_fans_out_per_mid() {
        let payload: meta_graph::webhooks::WebhookPayload = serde_json::from_value(json!({
            "object": "page",
            "entry": [{
                "id": "PAGE_1",
                "messaging": [{
                    "sender": { "id": "PSID" },
                    "recipient": { "id": "PAGE_1" },
                    "delivery": { "mids": ["m_a", "m_b"], "watermark": 1700000000000i64 }
                }]
            }]
        }))
        .unwrap();

        let events = normalize_meta(&payload);
        assert_eq!(events.len(), 2);
        assert!(events
            .iter()
            .all(|(_, e)| matches!(e, InboundEvent::StatusUpdate { status: MessageStatus::Delivered, .. })));
    }
}
