//! Persistência do inbox
//!
//! `InboxStore` é a única porta de acesso ao banco usada pela ingestão e pelo
//! roteador de envio. Implementações:
//!
//! - [`postgres::PgStore`]: produção (sqlx + migrations embutidas)
//! - [`memory::MemoryStore`]: testes e desenvolvimento sem `DATABASE_URL`
//!
//! Deduplicação e contadores são atômicos no próprio store: duas entregas
//! concorrentes do mesmo webhook não duplicam mensagem nem perdem incremento.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    ChannelType, Company, ConnectionState, Contact, Conversation, ConversationActivity, Message,
    MessageStatus, NewContact, NewMessage, StatusChange,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("record not found: {0}")]
    NotFound(String),

    #[error("invalid stored data: {0}")]
    InvalidData(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait InboxStore: Send + Sync {
    /// Verifica se o backend responde (usado em `/ready`)
    async fn ping(&self) -> StoreResult<()>;

    async fn company(&self, id: Uuid) -> StoreResult<Option<Company>>;

    async fn company_by_instance(&self, instance: &str) -> StoreResult<Option<Company>>;

    /// Busca por id da página do Messenger ou da conta do Instagram
    async fn company_by_meta_account(&self, account_id: &str) -> StoreResult<Option<Company>>;

    /// Grava estado da conexão WhatsApp; `qrcode = None` limpa o QR code salvo
    async fn set_whatsapp_connection(
        &self,
        company_id: Uuid,
        state: ConnectionState,
        qrcode: Option<String>,
    ) -> StoreResult<()>;

    /// Busca por (empresa, canal, identificador) ou cria.
    /// Nome e telefone só são preenchidos quando ainda estão vazios.
    async fn find_or_create_contact(&self, contact: NewContact) -> StoreResult<Contact>;

    async fn contact(&self, id: Uuid) -> StoreResult<Option<Contact>>;

    async fn find_or_create_conversation(
        &self,
        company_id: Uuid,
        contact_id: Uuid,
        channel_type: ChannelType,
    ) -> StoreResult<Conversation>;

    async fn conversation(&self, id: Uuid) -> StoreResult<Option<Conversation>>;

    /// Insere a mensagem se não existir outra com o mesmo `external_id` na empresa.
    /// Retorna `None` para duplicatas.
    async fn insert_message_if_absent(&self, message: NewMessage) -> StoreResult<Option<Message>>;

    async fn message_by_external_id(&self, company_id: Uuid, external_id: &str) -> StoreResult<Option<Message>>;

    /// Avança o status (nunca regride, ver `MessageStatus::rank`)
    async fn update_message_status(
        &self,
        company_id: Uuid,
        external_id: &str,
        status: MessageStatus,
    ) -> StoreResult<StatusChange>;

    /// Atualiza `last_message`/`last_message_time` (só para frente no tempo)
    /// e incrementa `unread_count` quando pedido
    async fn record_conversation_activity(
        &self,
        conversation_id: Uuid,
        activity: ConversationActivity,
    ) -> StoreResult<Conversation>;

    async fn mark_conversation_read(&self, conversation_id: Uuid) -> StoreResult<Option<Conversation>>;
}
