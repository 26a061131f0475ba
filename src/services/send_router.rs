//! Roteamento de mensagens de saída por canal
//!
//! `whatsapp` vai para a Evolution API, `instagram`/`messenger` para a Graph API.
//! Chamadas aos provedores usam [`retry_with_backoff`]; erros permanentes
//! voltam como `AppError::ProviderApi` (502) sem persistir nada.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use evolution::{EvolutionClient, MediaType, SendAudioRequest, SendMediaRequest, SendTextRequest};
use meta_graph::{AttachmentType, GraphClient, OutgoingMessage, SendRequest};

use crate::config::Settings;
use crate::models::{
    ChannelType, Company, ConversationActivity, MessageDirection, MessageStatus, MessageType, NewMessage,
    OutboundMessage, SendMessageRequest, SendMessageResponse, SentMessage,
};
use crate::services::retry::{retry_with_backoff, RetryPolicy};
use crate::store::InboxStore;
use crate::utils::logging::*;
use crate::utils::phone::normalize_phone;
use crate::utils::{message_preview, AppError, AppResult};

/// Um provedor capaz de entregar mensagens de um canal
#[async_trait]
pub trait ChannelSender: Send + Sync {
    fn provider(&self) -> &'static str;

    async fn send(&self, company: &Company, message: &OutboundMessage) -> AppResult<SentMessage>;
}

pub struct EvolutionSender {
    client: EvolutionClient,
    retry: RetryPolicy,
}

impl EvolutionSender {
    pub fn new(client: EvolutionClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }
}

#[async_trait]
impl ChannelSender for EvolutionSender {
    fn provider(&self) -> &'static str {
        "evolution"
    }

    async fn send(&self, company: &Company, message: &OutboundMessage) -> AppResult<SentMessage> {
        let instance = company
            .evolution_instance
            .as_deref()
            .filter(|i| !i.is_empty())
            .ok_or_else(|| AppError::ChannelNotConfigured(format!("company {} has no Evolution instance", company.id)))?;

        // JIDs completos (ex.: @lid) seguem como vieram
        let number = if message.recipient.contains('@') {
            message.recipient.clone()
        } else {
            normalize_phone(&message.recipient)
                .ok_or_else(|| AppError::ValidationError(format!("invalid phone number '{}'", message.recipient)))?
        };

        let media_url = || message.media_url.clone().unwrap_or_default();

        let result = match message.message_type {
            MessageType::Text => {
                let request = SendTextRequest {
                    number,
                    text: message.content.clone(),
                };
                retry_with_backoff(&self.retry, self.provider(), || self.client.send_text(instance, &request)).await
            }
            MessageType::Audio => {
                let request = SendAudioRequest {
                    number,
                    audio: media_url(),
                };
                retry_with_backoff(&self.retry, self.provider(), || self.client.send_audio(instance, &request)).await
            }
            MessageType::Image | MessageType::Video | MessageType::Document => {
                let mediatype = match message.message_type {
                    MessageType::Image => MediaType::Image,
                    MessageType::Video => MediaType::Video,
                    _ => MediaType::Document,
                };
                let request = SendMediaRequest {
                    number,
                    mediatype,
                    media: media_url(),
                    caption: message.caption().map(str::to_string),
                    file_name: message.file_name.clone(),
                };
                retry_with_backoff(&self.retry, self.provider(), || self.client.send_media(instance, &request)).await
            }
            other => {
                return Err(AppError::ValidationError(format!(
                    "message type '{}' cannot be sent through WhatsApp",
                    other
                )))
            }
        };

        let response = result.map_err(|e| AppError::ProviderApi(format!("Evolution API: {}", e)))?;
        let external_id = response
            .message_id()
            .map(str::to_string)
            .ok_or_else(|| AppError::ProviderApi("Evolution API returned no message id".to_string()))?;

        Ok(SentMessage { external_id })
    }
}

pub struct MetaSender {
    client: GraphClient,
    retry: RetryPolicy,
}

impl MetaSender {
    pub fn new(client: GraphClient, retry: RetryPolicy) -> Self {
        Self { client, retry }
    }

    async fn deliver(&self, token: &str, request: SendRequest) -> AppResult<String> {
        let response = retry_with_backoff(&self.retry, self.provider(), || self.client.send_message(token, &request))
            .await
            .map_err(|e| AppError::ProviderApi(format!("Graph API: {}", e)))?;
        Ok(response.message_id)
    }
}

#[async_trait]
impl ChannelSender for MetaSender {
    fn provider(&self) -> &'static str {
        "meta"
    }

    async fn send(&self, company: &Company, message: &OutboundMessage) -> AppResult<SentMessage> {
        let token = company
            .meta_page_token
            .as_deref()
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::ChannelNotConfigured(format!("company {} has no Meta page token", company.id)))?;

        let attachment_kind = match message.message_type {
            MessageType::Text => None,
            MessageType::Image => Some(AttachmentType::Image),
            MessageType::Audio => Some(AttachmentType::Audio),
            MessageType::Video => Some(AttachmentType::Video),
            MessageType::Document => Some(AttachmentType::File),
            other => {
                return Err(AppError::ValidationError(format!(
                    "message type '{}' cannot be sent through Meta",
                    other
                )))
            }
        };

        let Some(kind) = attachment_kind else {
            let request = SendRequest::response(&message.recipient, OutgoingMessage::text(&message.content));
            let external_id = self.deliver(token, request).await?;
            return Ok(SentMessage { external_id });
        };

        let url = message.media_url.clone().unwrap_or_default();
        let request = SendRequest::response(&message.recipient, OutgoingMessage::attachment(kind, url));
        let external_id = self.deliver(token, request).await?;

        // Send API não aceita legenda junto do anexo: vai como texto em seguida
        if let Some(caption) = message.caption() {
            let follow_up = SendRequest::response(&message.recipient, OutgoingMessage::text(caption));
            if let Err(e) = self.deliver(token, follow_up).await {
                log_warning(&format!("⚠️ Legenda não enviada após o anexo {}: {}", external_id, e));
            }
        }

        Ok(SentMessage { external_id })
    }
}

#[derive(Clone)]
pub struct SendRouter {
    store: Arc<dyn InboxStore>,
    senders: HashMap<ChannelType, Arc<dyn ChannelSender>>,
}

impl SendRouter {
    pub fn new(store: Arc<dyn InboxStore>) -> Self {
        Self {
            store,
            senders: HashMap::new(),
        }
    }

    /// Monta o roteador com os provedores configurados: Evolution quando há
    /// URL e chave, Meta sempre (o token é por empresa)
    pub fn from_settings(settings: &Settings, store: Arc<dyn InboxStore>) -> AppResult<Self> {
        let retry = RetryPolicy::from_settings(&settings.delivery);
        let mut router = Self::new(store);

        if let (true, Some(url), Some(key)) = (
            settings.evolution_configured(),
            settings.evolution.api_url.as_deref(),
            settings.evolution.api_key.as_deref(),
        ) {
            let client = EvolutionClient::new(url, key).map_err(|e| AppError::ConfigError(e.to_string()))?;
            router = router.with_sender(ChannelType::Whatsapp, Arc::new(EvolutionSender::new(client, retry)));
        } else {
            log_warning("⚠️  Evolution API not configured - WhatsApp sending disabled");
        }

        let graph = GraphClient::new(&settings.meta.graph_url, &settings.meta.graph_version)
            .map_err(|e| AppError::ConfigError(e.to_string()))?;
        let meta: Arc<dyn ChannelSender> = Arc::new(MetaSender::new(graph, retry));
        router = router
            .with_sender(ChannelType::Instagram, meta.clone())
            .with_sender(ChannelType::Messenger, meta);

        Ok(router)
    }

    pub fn with_sender(mut self, channel: ChannelType, sender: Arc<dyn ChannelSender>) -> Self {
        self.senders.insert(channel, sender);
        self
    }

    /// Canais com provedor configurado
    pub fn channels(&self) -> Vec<ChannelType> {
        let mut channels: Vec<ChannelType> = self.senders.keys().copied().collect();
        channels.sort_by_key(|c| c.as_str());
        channels
    }

    fn sender_for(&self, channel: ChannelType) -> AppResult<&Arc<dyn ChannelSender>> {
        match channel {
            ChannelType::Whatsapp | ChannelType::Instagram | ChannelType::Messenger => self
                .senders
                .get(&channel)
                .ok_or_else(|| AppError::ChannelNotConfigured(format!("no provider configured for {}", channel))),
            other => Err(AppError::UnsupportedChannel(other.to_string())),
        }
    }

    pub async fn send(&self, request: SendMessageRequest) -> AppResult<SendMessageResponse> {
        validate(&request)?;

        let conversation = self
            .store
            .conversation(request.conversation_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("conversation {}", request.conversation_id)))?;
        let contact = self
            .store
            .contact(conversation.contact_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("contact {}", conversation.contact_id)))?;
        let company = self
            .store
            .company(conversation.company_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("company {}", conversation.company_id)))?;

        let sender = self.sender_for(conversation.channel_type)?;

        let recipient = match conversation.channel_type {
            ChannelType::Whatsapp => contact.phone.clone().unwrap_or_else(|| contact.identifier.clone()),
            _ => contact.identifier.clone(),
        };
        let outbound = OutboundMessage {
            recipient,
            message_type: request.message_type,
            content: request.content.trim().to_string(),
            media_url: request.media_url.clone(),
            file_name: request.file_name.clone(),
        };

        log_provider_send(sender.provider(), &conversation.id.to_string());
        let sent = sender.send(&company, &outbound).await?;

        let now = chrono::Utc::now();
        let content = if outbound.content.is_empty() {
            outbound.file_name.clone().unwrap_or_default()
        } else {
            outbound.content.clone()
        };
        let preview = message_preview(outbound.message_type, &content);

        let inserted = self
            .store
            .insert_message_if_absent(NewMessage {
                company_id: company.id,
                conversation_id: conversation.id,
                external_id: Some(sent.external_id.clone()),
                direction: MessageDirection::Outbound,
                message_type: outbound.message_type,
                content,
                media_url: outbound.media_url,
                status: MessageStatus::Sent,
                created_at: now,
            })
            .await?;

        // O eco do provedor pode ter chegado pelo webhook antes da resposta do envio
        let message = match inserted {
            Some(message) => message,
            None => self
                .store
                .message_by_external_id(company.id, &sent.external_id)
                .await?
                .ok_or_else(|| AppError::InternalError(format!("message {} vanished after insert", sent.external_id)))?,
        };

        self.store
            .record_conversation_activity(
                conversation.id,
                ConversationActivity {
                    preview,
                    at: now,
                    increment_unread: false,
                },
            )
            .await?;

        log_message_stored(&conversation.id.to_string(), Some(&sent.external_id), "outbound");

        Ok(SendMessageResponse {
            success: true,
            message_id: message.id,
            external_id: sent.external_id,
            channel: conversation.channel_type,
        })
    }
}

fn validate(request: &SendMessageRequest) -> AppResult<()> {
    match request.message_type {
        MessageType::Text if request.content.trim().is_empty() => {
            log_validation_error("content", "text message without content");
            Err(AppError::ValidationError("content is required for text messages".to_string()))
        }
        MessageType::Text => Ok(()),
        MessageType::Image | MessageType::Audio | MessageType::Video | MessageType::Document => {
            if request.media_url.as_deref().map_or(true, |u| u.trim().is_empty()) {
                log_validation_error("mediaUrl", "media message without mediaUrl");
                return Err(AppError::ValidationError(format!(
                    "mediaUrl is required for {} messages",
                    request.message_type
                )));
            }
            Ok(())
        }
        other => {
            log_validation_error("messageType", other.as_str());
            Err(AppError::ValidationError(format!("messageType '{}' cannot be sent", other)))
        }
    }
}
