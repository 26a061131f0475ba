//! Representação canônica de um evento de entrada, independente do provedor

use chrono::{DateTime, Utc};

use super::{ChannelType, ConnectionState, MessageStatus, MessageType};

/// Conta do provedor que recebeu o evento; localiza a empresa
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountRef {
    /// Nome da instância na Evolution
    EvolutionInstance(String),
    /// Id da página (Messenger) ou da conta do Instagram
    MetaAccount(String),
}

impl std::fmt::Display for AccountRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AccountRef::EvolutionInstance(name) => write!(f, "evolution:{}", name),
            AccountRef::MetaAccount(id) => write!(f, "meta:{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct InboundMessage {
    pub channel_type: ChannelType,
    pub contact_identifier: String,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub external_id: String,
    /// Enviada pela própria empresa (celular, outro app ou eco da API)
    pub from_me: bool,
    pub message_type: MessageType,
    pub content: String,
    pub media_url: Option<String>,
    pub timestamp: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum InboundEvent {
    Message(InboundMessage),
    StatusUpdate {
        external_id: String,
        status: MessageStatus,
    },
    Connection(ConnectionState),
    QrCode(String),
    Ignored(String),
}
