//! Aplicação dos eventos canônicos no inbox
//!
//! Cada evento é independente: a empresa é localizada pela conta do provedor,
//! buscas sem resultado são logadas e encerram o processamento daquele evento.
//! Erros de banco sobem como `AppError::Store` para o provedor reentregar; a
//! deduplicação por `external_id` torna a reentrega segura.

use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{
    AccountRef, Company, ConnectionState, ConversationActivity, InboundEvent, InboundMessage, MessageDirection,
    MessageStatus, NewContact, NewMessage, StatusChange,
};
use crate::store::InboxStore;
use crate::utils::logging::*;
use crate::utils::{message_preview, AppResult};

/// Resultado da aplicação de um evento, devolvido no corpo do webhook
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum IngestOutcome {
    Stored { conversation_id: Uuid, message_id: Uuid },
    Duplicate { external_id: String },
    StatusUpdated { external_id: String, status: MessageStatus },
    StatusUnchanged { external_id: String },
    MessageNotFound { external_id: String },
    ConnectionUpdated { state: ConnectionState },
    QrCodeUpdated,
    Ignored { reason: String },
}

impl IngestOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            IngestOutcome::Stored { .. } => "stored",
            IngestOutcome::Duplicate { .. } => "duplicate",
            IngestOutcome::StatusUpdated { .. } => "status_updated",
            IngestOutcome::StatusUnchanged { .. } => "status_unchanged",
            IngestOutcome::MessageNotFound { .. } => "message_not_found",
            IngestOutcome::ConnectionUpdated { .. } => "connection_updated",
            IngestOutcome::QrCodeUpdated => "qrcode_updated",
            IngestOutcome::Ignored { .. } => "ignored",
        }
    }

    fn ignored(reason: impl Into<String>) -> Self {
        IngestOutcome::Ignored { reason: reason.into() }
    }
}

#[derive(Clone)]
pub struct IngestionService {
    store: Arc<dyn InboxStore>,
}

impl IngestionService {
    pub fn new(store: Arc<dyn InboxStore>) -> Self {
        Self { store }
    }

    async fn resolve_company(&self, account: &AccountRef) -> AppResult<Option<Company>> {
        let company = match account {
            AccountRef::EvolutionInstance(instance) => self.store.company_by_instance(instance).await?,
            AccountRef::MetaAccount(account_id) => self.store.company_by_meta_account(account_id).await?,
        };
        Ok(company)
    }

    /// Aplica um evento canônico recebido pela conta `account`
    pub async fn apply(&self, account: &AccountRef, event: InboundEvent) -> AppResult<IngestOutcome> {
        if let InboundEvent::Ignored(reason) = event {
            log_webhook_ignored(&account.to_string(), &reason);
            return Ok(IngestOutcome::Ignored { reason });
        }

        let Some(company) = self.resolve_company(account).await? else {
            log_webhook_ignored(&account.to_string(), "no company for this account");
            return Ok(IngestOutcome::ignored(format!("unknown account {}", account)));
        };

        match event {
            InboundEvent::Message(message) => self.store_message(&company, message).await,
            InboundEvent::StatusUpdate { external_id, status } => {
                self.update_status(&company, external_id, status).await
            }
            InboundEvent::Connection(state) => {
                // QR code só faz sentido enquanto a instância está conectando
                let qrcode = match state {
                    ConnectionState::Connecting => company.whatsapp_qrcode.clone(),
                    ConnectionState::Connected | ConnectionState::Disconnected => None,
                };
                self.store.set_whatsapp_connection(company.id, state, qrcode).await?;
                log_info(&format!("📶 WhatsApp da empresa {} agora {}", company.id, state));
                Ok(IngestOutcome::ConnectionUpdated { state })
            }
            InboundEvent::QrCode(code) => {
                self.store
                    .set_whatsapp_connection(company.id, ConnectionState::Connecting, Some(code))
                    .await?;
                log_info(&format!("🔳 Novo QR code para a empresa {}", company.id));
                Ok(IngestOutcome::QrCodeUpdated)
            }
            InboundEvent::Ignored(reason) => Ok(IngestOutcome::Ignored { reason }),
        }
    }

    async fn store_message(&self, company: &Company, message: InboundMessage) -> AppResult<IngestOutcome> {
        let contact = self
            .store
            .find_or_create_contact(NewContact {
                company_id: company.id,
                channel_type: message.channel_type,
                identifier: message.contact_identifier.clone(),
                name: message.contact_name.clone(),
                phone: message.contact_phone.clone(),
            })
            .await?;

        let conversation = self
            .store
            .find_or_create_conversation(company.id, contact.id, message.channel_type)
            .await?;

        let (direction, status) = if message.from_me {
            (MessageDirection::Outbound, MessageStatus::Sent)
        } else {
            (MessageDirection::Inbound, MessageStatus::Received)
        };
        let created_at = message.timestamp.unwrap_or_else(chrono::Utc::now);
        let preview = message_preview(message.message_type, &message.content);

        let inserted = self
            .store
            .insert_message_if_absent(NewMessage {
                company_id: company.id,
                conversation_id: conversation.id,
                external_id: Some(message.external_id.clone()),
                direction,
                message_type: message.message_type,
                content: message.content,
                media_url: message.media_url,
                status,
                created_at,
            })
            .await?;

        let Some(stored) = inserted else {
            log_duplicate_message(&message.external_id);
            return Ok(IngestOutcome::Duplicate {
                external_id: message.external_id,
            });
        };

        self.store
            .record_conversation_activity(
                conversation.id,
                ConversationActivity {
                    preview,
                    at: created_at,
                    increment_unread: !message.from_me,
                },
            )
            .await?;

        log_message_stored(
            &conversation.id.to_string(),
            stored.external_id.as_deref(),
            stored.direction.as_str(),
        );

        Ok(IngestOutcome::Stored {
            conversation_id: conversation.id,
            message_id: stored.id,
        })
    }

    async fn update_status(
        &self,
        company: &Company,
        external_id: String,
        status: MessageStatus,
    ) -> AppResult<IngestOutcome> {
        let outcome = match self.store.update_message_status(company.id, &external_id, status).await? {
            StatusChange::Updated => IngestOutcome::StatusUpdated { external_id, status },
            StatusChange::Unchanged => IngestOutcome::StatusUnchanged { external_id },
            StatusChange::NotFound => {
                log_webhook_ignored("status", &format!("message {} not found", external_id));
                IngestOutcome::MessageNotFound { external_id }
            }
        };
        Ok(outcome)
    }
}
