//! Entidades do inbox: empresa (tenant), contato, conversa e mensagem
//!
//! Todos os registros são escopados por `company_id`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Implementa `as_str`, `Display` e `FromStr` para enums persistidos como texto
macro_rules! text_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok($name::$variant),)+
                    other => Err(format!("invalid {} '{}'", stringify!($name), other)),
                }
            }
        }
    };
}

/// Superfície de mensagens conectada por uma empresa
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelType {
    Whatsapp,
    Instagram,
    Messenger,
    Telegram,
    Email,
    Widget,
}

text_enum!(ChannelType {
    Whatsapp => "whatsapp",
    Instagram => "instagram",
    Messenger => "messenger",
    Telegram => "telegram",
    Email => "email",
    Widget => "widget",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageDirection {
    Inbound,
    Outbound,
}

text_enum!(MessageDirection {
    Inbound => "inbound",
    Outbound => "outbound",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageType {
    Text,
    Image,
    Audio,
    Video,
    Document,
    Sticker,
    Location,
    Contact,
    Unknown,
}

text_enum!(MessageType {
    Text => "text",
    Image => "image",
    Audio => "audio",
    Video => "video",
    Document => "document",
    Sticker => "sticker",
    Location => "location",
    Contact => "contact",
    Unknown => "unknown",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageStatus {
    Received,
    Pending,
    Sent,
    Delivered,
    Read,
    Failed,
}

text_enum!(MessageStatus {
    Received => "received",
    Pending => "pending",
    Sent => "sent",
    Delivered => "delivered",
    Read => "read",
    Failed => "failed",
});

impl MessageStatus {
    /// Ordem de progresso; um status só substitui outro de rank menor.
    /// O `CASE` em `store::postgres` segue a mesma tabela.
    pub fn rank(&self) -> i16 {
        match self {
            MessageStatus::Received | MessageStatus::Pending => 0,
            MessageStatus::Sent => 1,
            MessageStatus::Failed | MessageStatus::Delivered => 2,
            MessageStatus::Read => 3,
        }
    }

    pub fn can_advance_to(&self, next: MessageStatus) -> bool {
        next.rank() > self.rank()
    }
}

/// Estado da conexão da instância WhatsApp
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionState {
    Connected,
    Connecting,
    Disconnected,
}

text_enum!(ConnectionState {
    Connected => "connected",
    Connecting => "connecting",
    Disconnected => "disconnected",
});

/// Tenant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Company {
    pub id: Uuid,
    pub name: String,
    /// Nome da instância na Evolution; webhooks chegam com `instance` igual a este valor
    pub evolution_instance: Option<String>,
    pub whatsapp_status: ConnectionState,
    pub whatsapp_qrcode: Option<String>,
    pub meta_page_id: Option<String>,
    pub instagram_account_id: Option<String>,
    #[serde(skip_serializing, default)]
    pub meta_page_token: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            evolution_instance: None,
            whatsapp_status: ConnectionState::Disconnected,
            whatsapp_qrcode: None,
            meta_page_id: None,
            instagram_account_id: None,
            meta_page_token: None,
            updated_at: Utc::now(),
        }
    }

    /// A conta Meta (página ou Instagram) pertence a esta empresa?
    pub fn owns_meta_account(&self, account_id: &str) -> bool {
        self.meta_page_id.as_deref() == Some(account_id)
            || self.instagram_account_id.as_deref() == Some(account_id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Contact {
    pub id: Uuid,
    pub company_id: Uuid,
    pub channel_type: ChannelType,
    /// Telefone (só dígitos) no WhatsApp, PSID/IGSID na Meta
    pub identifier: String,
    pub name: Option<String>,
    pub phone: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewContact {
    pub company_id: Uuid,
    pub channel_type: ChannelType,
    pub identifier: String,
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Uma por (contato, empresa); guarda o cache da última mensagem
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub company_id: Uuid,
    pub contact_id: Uuid,
    pub channel_type: ChannelType,
    pub last_message: Option<String>,
    pub last_message_time: Option<DateTime<Utc>>,
    pub unread_count: i32,
    pub created_at: DateTime<Utc>,
}

/// Atualização do cache da conversa após uma mensagem
#[derive(Debug, Clone)]
pub struct ConversationActivity {
    pub preview: String,
    pub at: DateTime<Utc>,
    pub increment_unread: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub company_id: Uuid,
    pub conversation_id: Uuid,
    pub external_id: Option<String>,
    pub direction: MessageDirection,
    pub message_type: MessageType,
    pub content: String,
    pub media_url: Option<String>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub company_id: Uuid,
    pub conversation_id: Uuid,
    pub external_id: Option<String>,
    pub direction: MessageDirection,
    pub message_type: MessageType,
    pub content: String,
    pub media_url: Option<String>,
    pub status: MessageStatus,
    pub created_at: DateTime<Utc>,
}

impl NewMessage {
    pub fn into_message(self, id: Uuid) -> Message {
        Message {
            id,
            company_id: self.company_id,
            conversation_id: self.conversation_id,
            external_id: self.external_id,
            direction: self.direction,
            message_type: self.message_type,
            content: self.content,
            media_url: self.media_url,
            status: self.status,
            created_at: self.created_at,
        }
    }
}

/// Resultado de uma atualização de status
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    Updated,
    /// Mensagem existe mas já está num status igual ou mais avançado
    Unchanged,
    NotFound,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_enums_round_trip_through_str() {
        assert_eq!("instagram".parse::<ChannelType>().unwrap(), ChannelType::Instagram);
        assert_eq!(MessageStatus::Delivered.to_string(), "delivered");
        assert!("sms".parse::<ChannelType>().is_err());
    }

    #[test]
    fn test_status_only_moves_forward() {
        assert!(MessageStatus::Pending.can_advance_to(MessageStatus::Sent));
        assert!(MessageStatus::Sent.can_advance_to(MessageStatus::Read));
        assert!(MessageStatus::Sent.can_advance_to(MessageStatus::Failed));
        assert!(!MessageStatus::Read.can_advance_to(MessageStatus::Delivered));
        assert!(!MessageStatus::Delivered.can_advance_to(MessageStatus::Failed));
        assert!(!MessageStatus::Sent.can_advance_to(MessageStatus::Sent));
    }

    #[test]
    fn test_company_token_is_not_serialized() {
        let mut company = Company::new("Acme");
        company.meta_page_token = Some("secret".into());
        let json = serde_json::to_value(&company).unwrap();
        assert!(json.get("meta_page_token").is_none());
        assert_eq!(json["whatsapp_status"], "disconnected");
    }
}
