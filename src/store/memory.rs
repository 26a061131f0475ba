//! Store em memória (testes e desenvolvimento local)
//!
//! Um único `RwLock` protege todas as tabelas, então cada operação do trait é atômica.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{InboxStore, StoreError, StoreResult};
use crate::models::{
    ChannelType, Company, ConnectionState, Contact, Conversation, ConversationActivity, Message,
    MessageStatus, NewContact, NewMessage, StatusChange,
};

#[derive(Default)]
struct Tables {
    companies: HashMap<Uuid, Company>,
    contacts: HashMap<Uuid, Contact>,
    conversations: HashMap<Uuid, Conversation>,
    messages: HashMap<Uuid, Message>,
    /// (company_id, external_id) -> message id
    external_ids: HashMap<(Uuid, String), Uuid>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empresas são cadastradas pela plataforma; aqui só para seed/testes
    pub async fn insert_company(&self, company: Company) {
        let mut tables = self.tables.write().await;
        tables.companies.insert(company.id, company);
    }

    /// Mensagens de uma conversa em ordem cronológica
    pub async fn messages_for_conversation(&self, conversation_id: Uuid) -> Vec<Message> {
        let tables = self.tables.read().await;
        let mut messages: Vec<Message> = tables
            .messages
            .values()
            .filter(|m| m.conversation_id == conversation_id)
            .cloned()
            .collect();
        messages.sort_by_key(|m| m.created_at);
        messages
    }

    pub async fn conversations_for_company(&self, company_id: Uuid) -> Vec<Conversation> {
        let tables = self.tables.read().await;
        tables
            .conversations
            .values()
            .filter(|c| c.company_id == company_id)
            .cloned()
            .collect()
    }
}

#[async_trait]
impl InboxStore for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn company(&self, id: Uuid) -> StoreResult<Option<Company>> {
        Ok(self.tables.read().await.companies.get(&id).cloned())
    }

    async fn company_by_instance(&self, instance: &str) -> StoreResult<Option<Company>> {
        let tables = self.tables.read().await;
        Ok(tables
            .companies
            .values()
            .find(|c| c.evolution_instance.as_deref() == Some(instance))
            .cloned())
    }

    async fn company_by_meta_account(&self, account_id: &str) -> StoreResult<Option<Company>> {
        let tables = self.tables.read().await;
        Ok(tables
            .companies
            .values()
            .find(|c| c.owns_meta_account(account_id))
            .cloned())
    }

    async fn set_whatsapp_connection(
        &self,
        company_id: Uuid,
        state: ConnectionState,
        qrcode: Option<String>,
    ) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        let company = tables
            .companies
            .get_mut(&company_id)
            .ok_or_else(|| StoreError::NotFound(format!("company {}", company_id)))?;

        company.whatsapp_status = state;
        company.whatsapp_qrcode = qrcode;
        company.updated_at = Utc::now();
        Ok(())
    }

    async fn find_or_create_contact(&self, new: NewContact) -> StoreResult<Contact> {
        let mut tables = self.tables.write().await;

        let existing = tables.contacts.values_mut().find(|c| {
            c.company_id == new.company_id && c.channel_type == new.channel_type && c.identifier == new.identifier
        });

        if let Some(contact) = existing {
            if contact.name.is_none() {
                contact.name = new.name;
            }
            if contact.phone.is_none() {
                contact.phone = new.phone;
            }
            return Ok(contact.clone());
        }

        let contact = Contact {
            id: Uuid::new_v4(),
            company_id: new.company_id,
            channel_type: new.channel_type,
            identifier: new.identifier,
            name: new.name,
            phone: new.phone,
            created_at: Utc::now(),
        };
        tables.contacts.insert(contact.id, contact.clone());
        Ok(contact)
    }

    async fn contact(&self, id: Uuid) -> StoreResult<Option<Contact>> {
        Ok(self.tables.read().await.contacts.get(&id).cloned())
    }

    async fn find_or_create_conversation(
        &self,
        company_id: Uuid,
        contact_id: Uuid,
        channel_type: ChannelType,
    ) -> StoreResult<Conversation> {
        let mut tables = self.tables.write().await;

        if let Some(conversation) = tables
            .conversations
            .values()
            .find(|c| c.company_id == company_id && c.contact_id == contact_id)
        {
            return Ok(conversation.clone());
        }

        let conversation = Conversation {
            id: Uuid::new_v4(),
            company_id,
            contact_id,
            channel_type,
            last_message: None,
            last_message_time: None,
            unread_count: 0,
            created_at: Utc::now(),
        };
        tables.conversations.insert(conversation.id, conversation.clone());
        Ok(conversation)
    }

    async fn conversation(&self, id: Uuid) -> StoreResult<Option<Conversation>> {
        Ok(self.tables.read().await.conversations.get(&id).cloned())
    }

    async fn insert_message_if_absent(&self, new: NewMessage) -> StoreResult<Option<Message>> {
        let mut tables = self.tables.write().await;

        if let Some(external_id) = &new.external_id {
            let key = (new.company_id, external_id.clone());
            if tables.external_ids.contains_key(&key) {
                return Ok(None);
            }
        }

        let message = new.into_message(Uuid::new_v4());
        if let Some(external_id) = &message.external_id {
            tables
                .external_ids
                .insert((message.company_id, external_id.clone()), message.id);
        }
        tables.messages.insert(message.id, message.clone());
        Ok(Some(message))
    }

    async fn message_by_external_id(&self, company_id: Uuid, external_id: &str) -> StoreResult<Option<Message>> {
        let tables = self.tables.read().await;
        Ok(tables
            .external_ids
            .get(&(company_id, external_id.to_string()))
            .and_then(|id| tables.messages.get(id))
            .cloned())
    }

    async fn update_message_status(
        &self,
        company_id: Uuid,
        external_id: &str,
        status: MessageStatus,
    ) -> StoreResult<StatusChange> {
        let mut tables = self.tables.write().await;

        let Some(id) = tables.external_ids.get(&(company_id, external_id.to_string())).copied() else {
            return Ok(StatusChange::NotFound);
        };
        let Some(message) = tables.messages.get_mut(&id) else {
            return Ok(StatusChange::NotFound);
        };

        if message.status.can_advance_to(status) {
            message.status = status;
            Ok(StatusChange::Updated)
        } else {
            Ok(StatusChange::Unchanged)
        }
    }

    async fn record_conversation_activity(
        &self,
        conversation_id: Uuid,
        activity: ConversationActivity,
    ) -> StoreResult<Conversation> {
        let mut tables = self.tables.write().await;
        let conversation = tables
            .conversations
            .get_mut(&conversation_id)
            .ok_or_else(|| StoreError::NotFound(format!("conversation {}", conversation_id)))?;

        let is_newer = conversation
            .last_message_time
            .map_or(true, |current| activity.at >= current);
        if is_newer {
            conversation.last_message = Some(activity.preview);
            conversation.last_message_time = Some(activity.at);
        }
        if activity.increment_unread {
            conversation.unread_count += 1;
        }

        Ok(conversation.clone())
    }

    async fn mark_conversation_read(&self, conversation_id: Uuid) -> StoreResult<Option<Conversation>> {
        let mut tables = self.tables.write().await;
        Ok(tables.conversations.get_mut(&conversation_id).map(|conversation| {
            conversation.unread_count = 0;
            conversation.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MessageDirection, MessageType};
    use chrono::Duration;

    async fn seeded() -> (MemoryStore, Company) {
        let store = MemoryStore::new();
        let mut company = Company::new("Acme");
        company.evolution_instance = Some("acme".into());
        store.insert_company(company.clone()).await;
        (store, company)
    }

    fn new_message(company_id: Uuid, conversation_id: Uuid, external_id: &str) -> NewMessage {
        NewMessage {
            company_id,
            conversation_id,
            external_id: Some(external_id.to_string()),
            direction: MessageDirection::Inbound,
            message_type: MessageType::Text,
            content: "oi".into(),
            media_url: None,
            status: MessageStatus::Received,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_contact_name_is_filled_but_never_overwritten() {
        let (store, company) = seeded().await;
        let base = NewContact {
            company_id: company.id,
            channel_type: ChannelType::Whatsapp,
            identifier: "5511999990000".into(),
            name: None,
            phone: Some("5511999990000".into()),
        };

        let first = store.find_or_create_contact(base.clone()).await.unwrap();
        assert!(first.name.is_none());

        let named = store
            .find_or_create_contact(NewContact { name: Some("Maria".into()), ..base.clone() })
            .await
            .unwrap();
        assert_eq!(named.id, first.id);
        assert_eq!(named.name.as_deref(), Some("Maria"));

        let renamed = store
            .find_or_create_contact(NewContact { name: Some("Outro".into()), ..base })
            .await
            .unwrap();
        assert_eq!(renamed.name.as_deref(), Some("Maria"));
    }

    #[tokio::test]
    async fn test_duplicate_external_id_is_rejected_per_company() {
        let (store, company) = seeded().await;
        let other = Company::new("Other");
        store.insert_company(other.clone()).await;

        let conversation_id = Uuid::new_v4();
        assert!(store
            .insert_message_if_absent(new_message(company.id, conversation_id, "ABC"))
            .await
            .unwrap()
            .is_some());
        assert!(store
            .insert_message_if_absent(new_message(company.id, conversation_id, "ABC"))
            .await
            .unwrap()
            .is_none());
        // mesmo id externo em outro tenant é outra mensagem
        assert!(store
            .insert_message_if_absent(new_message(other.id, conversation_id, "ABC"))
            .await
            .unwrap()
            .is_some());
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_deliveries_insert_once() {
        let (store, company) = seeded().await;
        let conversation_id = Uuid::new_v4();

        let mut handles = Vec::new();
        for _ in 0..16 {
            let store = store.clone();
            let message = new_message(company.id, conversation_id, "RACE");
            handles.push(tokio::spawn(async move { store.insert_message_if_absent(message).await.unwrap() }));
        }

        let mut inserted = 0;
        for handle in handles {
            if handle.await.unwrap().is_some() {
                inserted += 1;
            }
        }
        assert_eq!(inserted, 1);
        assert_eq!(store.messages_for_conversation(conversation_id).await.len(), 1);
    }

    #[tokio::test]
    async fn test_activity_only_moves_last_message_forward() {
        let (store, company) = seeded().await;
        let conversation = store
            .find_or_create_conversation(company.id, Uuid::new_v4(), ChannelType::Whatsapp)
            .await
            .unwrap();

        let now = Utc::now();
        store
            .record_conversation_activity(
                conversation.id,
                ConversationActivity { preview: "nova".into(), at: now, increment_unread: true },
            )
            .await
            .unwrap();
        let updated = store
            .record_conversation_activity(
                conversation.id,
                ConversationActivity { preview: "antiga".into(), at: now - Duration::minutes(5), increment_unread: true },
            )
            .await
            .unwrap();

        assert_eq!(updated.last_message.as_deref(), Some("nova"));
        assert_eq!(updated.last_message_time, Some(now));
        assert_eq!(updated.unread_count, 2);

        let read = store.mark_conversation_read(conversation.id).await.unwrap().unwrap();
        assert_eq!(read.unread_count, 0);
    }

    #[tokio::test]
    async fn test_status_update_never_regresses() {
        let (store, company) = seeded().await;
        let conversation_id = Uuid::new_v4();
        store
            .insert_message_if_absent(NewMessage {
                status: MessageStatus::Sent,
                direction: MessageDirection::Outbound,
                ..new_message(company.id, conversation_id, "OUT1")
            })
            .await
            .unwrap();

        assert_eq!(
            store.update_message_status(company.id, "OUT1", MessageStatus::Read).await.unwrap(),
            StatusChange::Updated
        );
        assert_eq!(
            store.update_message_status(company.id, "OUT1", MessageStatus::Delivered).await.unwrap(),
            StatusChange::Unchanged
        );
        assert_eq!(
            store.update_message_status(company.id, "missing", MessageStatus::Read).await.unwrap(),
            StatusChange::NotFound
        );
        let message = store.message_by_external_id(company.id, "OUT1").await.unwrap().unwrap();
        assert_eq!(message.status, MessageStatus::Read);
    }

    #[tokio::test]
    async fn test_company_lookup_by_instance_and_meta_account() {
        let store = MemoryStore::new();
        let mut company = Company::new("Loja");
        company.evolution_instance = Some("loja-01".into());
        company.meta_page_id = Some("PAGE1".into());
        company.instagram_account_id = Some("IG1".into());
        store.insert_company(company.clone()).await;

        assert_eq!(store.company_by_instance("loja-01").await.unwrap().unwrap().id, company.id);
        assert!(store.company_by_instance("loja-02").await.unwrap().is_none());
        assert_eq!(store.company_by_meta_account("IG1").await.unwrap().unwrap().id, company.id);
        assert_eq!(store.company_by_meta_account("PAGE1").await.unwrap().unwrap().id, company.id);
    }
}
