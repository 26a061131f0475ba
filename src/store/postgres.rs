//! Store Postgres (sqlx)
//!
//! As regras de concorrência ficam no SQL:
//! - dedup: índice único parcial `(company_id, external_id)` + `ON CONFLICT DO NOTHING`
//! - `unread_count = unread_count + 1` atômico
//! - `last_message_time` só avança (`GREATEST`)

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use std::str::FromStr;
use std::time::Duration;
use uuid::Uuid;

use super::{InboxStore, StoreError, StoreResult};
use crate::models::{
    ChannelType, Company, ConnectionState, Contact, Conversation, ConversationActivity, Message,
    MessageStatus, NewContact, NewMessage, StatusChange,
};

const COMPANY_COLUMNS: &str = "id, name, evolution_instance, whatsapp_status, whatsapp_qrcode, \
     meta_page_id, instagram_account_id, meta_page_token, updated_at";

const CONTACT_COLUMNS: &str = "id, company_id, channel_type, identifier, name, phone, created_at";

const CONVERSATION_COLUMNS: &str = "id, company_id, contact_id, channel_type, last_message, \
     last_message_time, unread_count, created_at";

const MESSAGE_COLUMNS: &str = "id, company_id, conversation_id, external_id, direction, message_type, \
     content, media_url, status, created_at";

/// Mesma tabela de `MessageStatus::rank`
const STATUS_RANK_SQL: &str = "CASE status \
     WHEN 'received' THEN 0 WHEN 'pending' THEN 0 WHEN 'sent' THEN 1 \
     WHEN 'failed' THEN 2 WHEN 'delivered' THEN 2 WHEN 'read' THEN 3 ELSE 0 END";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(5))
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    /// Aplica as migrations embutidas de `migrations/`
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn parse_text<T: FromStr<Err = String>>(row: &PgRow, column: &str) -> StoreResult<T> {
    let raw: String = row.try_get(column)?;
    raw.parse::<T>().map_err(StoreError::InvalidData)
}

fn company_from_row(row: &PgRow) -> StoreResult<Company> {
    Ok(Company {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        evolution_instance: row.try_get("evolution_instance")?,
        whatsapp_status: parse_text(row, "whatsapp_status")?,
        whatsapp_qrcode: row.try_get("whatsapp_qrcode")?,
        meta_page_id: row.try_get("meta_page_id")?,
        instagram_account_id: row.try_get("instagram_account_id")?,
        meta_page_token: row.try_get("meta_page_token")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn contact_from_row(row: &PgRow) -> StoreResult<Contact> {
    Ok(Contact {
        id: row.try_get("id")?,
        company_id: row.try_get("company_id")?,
        channel_type: parse_text(row, "channel_type")?,
        identifier: row.try_get("identifier")?,
        name: row.try_get("name")?,
        phone: row.try_get("phone")?,
        created_at: row.try_get("created_at")?,
    })
}

fn conversation_from_row(row: &PgRow) -> StoreResult<Conversation> {
    Ok(Conversation {
        id: row.try_get("id")?,
        company_id: row.try_get("company_id")?,
        contact_id: row.try_get("contact_id")?,
        channel_type: parse_text(row, "channel_type")?,
        last_message: row.try_get("last_message")?,
        last_message_time: row.try_get("last_message_time")?,
        unread_count: row.try_get("unread_count")?,
        created_at: row.try_get("created_at")?,
    })
}

fn message_from_row(row: &PgRow) -> StoreResult<Message> {
    Ok(Message {
        id: row.try_get("id")?,
        company_id: row.try_get("company_id")?,
        conversation_id: row.try_get("conversation_id")?,
        external_id: row.try_get("external_id")?,
        direction: parse_text(row, "direction")?,
        message_type: parse_text(row, "message_type")?,
        content: row.try_get("content")?,
        media_url: row.try_get("media_url")?,
        status: parse_text(row, "status")?,
        created_at: row.try_get("created_at")?,
    })
}

#[async_trait]
impl InboxStore for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn company(&self, id: Uuid) -> StoreResult<Option<Company>> {
        let sql = format!("SELECT {} FROM companies WHERE id = $1", COMPANY_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(company_from_row).transpose()
    }

    async fn company_by_instance(&self, instance: &str) -> StoreResult<Option<Company>> {
        let sql = format!("SELECT {} FROM companies WHERE evolution_instance = $1", COMPANY_COLUMNS);
        let row = sqlx::query(&sql).bind(instance).fetch_optional(&self.pool).await?;
        row.as_ref().map(company_from_row).transpose()
    }

    async fn company_by_meta_account(&self, account_id: &str) -> StoreResult<Option<Company>> {
        let sql = format!(
            "SELECT {} FROM companies WHERE meta_page_id = $1 OR instagram_account_id = $1 LIMIT 1",
            COMPANY_COLUMNS
        );
        let row = sqlx::query(&sql).bind(account_id).fetch_optional(&self.pool).await?;
        row.as_ref().map(company_from_row).transpose()
    }

    async fn set_whatsapp_connection(
        &self,
        company_id: Uuid,
        state: ConnectionState,
        qrcode: Option<String>,
    ) -> StoreResult<()> {
        let result = sqlx::query(
            "UPDATE companies SET whatsapp_status = $2, whatsapp_qrcode = $3, updated_at = now() WHERE id = $1",
        )
        .bind(company_id)
        .bind(state.as_str())
        .bind(qrcode)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(format!("company {}", company_id)));
        }
        Ok(())
    }

    async fn find_or_create_contact(&self, contact: NewContact) -> StoreResult<Contact> {
        let sql = format!(
            "INSERT INTO contacts (id, company_id, channel_type, identifier, name, phone) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             ON CONFLICT (company_id, channel_type, identifier) DO UPDATE SET \
                 name = COALESCE(contacts.name, EXCLUDED.name), \
                 phone = COALESCE(contacts.phone, EXCLUDED.phone) \
             RETURNING {}",
            CONTACT_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(contact.company_id)
            .bind(contact.channel_type.as_str())
            .bind(&contact.identifier)
            .bind(&contact.name)
            .bind(&contact.phone)
            .fetch_one(&self.pool)
            .await?;
        contact_from_row(&row)
    }

    async fn contact(&self, id: Uuid) -> StoreResult<Option<Contact>> {
        let sql = format!("SELECT {} FROM contacts WHERE id = $1", CONTACT_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(contact_from_row).transpose()
    }

    async fn find_or_create_conversation(
        &self,
        company_id: Uuid,
        contact_id: Uuid,
        channel_type: ChannelType,
    ) -> StoreResult<Conversation> {
        // DO UPDATE sem efeito só para o RETURNING devolver a linha existente
        let sql = format!(
            "INSERT INTO conversations (id, company_id, contact_id, channel_type) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (company_id, contact_id) DO UPDATE SET channel_type = conversations.channel_type \
             RETURNING {}",
            CONVERSATION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(company_id)
            .bind(contact_id)
            .bind(channel_type.as_str())
            .fetch_one(&self.pool)
            .await?;
        conversation_from_row(&row)
    }

    async fn conversation(&self, id: Uuid) -> StoreResult<Option<Conversation>> {
        let sql = format!("SELECT {} FROM conversations WHERE id = $1", CONVERSATION_COLUMNS);
        let row = sqlx::query(&sql).bind(id).fetch_optional(&self.pool).await?;
        row.as_ref().map(conversation_from_row).transpose()
    }

    async fn insert_message_if_absent(&self, message: NewMessage) -> StoreResult<Option<Message>> {
        let sql = format!(
            "INSERT INTO messages (id, company_id, conversation_id, external_id, direction, message_type, \
                                   content, media_url, status, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10) \
             ON CONFLICT (company_id, external_id) WHERE external_id IS NOT NULL DO NOTHING \
             RETURNING {}",
            MESSAGE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(Uuid::new_v4())
            .bind(message.company_id)
            .bind(message.conversation_id)
            .bind(&message.external_id)
            .bind(message.direction.as_str())
            .bind(message.message_type.as_str())
            .bind(&message.content)
            .bind(&message.media_url)
            .bind(message.status.as_str())
            .bind(message.created_at)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(message_from_row).transpose()
    }

    async fn message_by_external_id(&self, company_id: Uuid, external_id: &str) -> StoreResult<Option<Message>> {
        let sql = format!(
            "SELECT {} FROM messages WHERE company_id = $1 AND external_id = $2",
            MESSAGE_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(company_id)
            .bind(external_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(message_from_row).transpose()
    }

    async fn update_message_status(
        &self,
        company_id: Uuid,
        external_id: &str,
        status: MessageStatus,
    ) -> StoreResult<StatusChange> {
        let sql = format!(
            "UPDATE messages SET status = $3 \
             WHERE company_id = $1 AND external_id = $2 AND ({}) < $4",
            STATUS_RANK_SQL
        );
        let result = sqlx::query(&sql)
            .bind(company_id)
            .bind(external_id)
            .bind(status.as_str())
            .bind(i32::from(status.rank()))
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            return Ok(StatusChange::Updated);
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM messages WHERE company_id = $1 AND external_id = $2)")
                .bind(company_id)
                .bind(external_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(if exists { StatusChange::Unchanged } else { StatusChange::NotFound })
    }

    async fn record_conversation_activity(
        &self,
        conversation_id: Uuid,
        activity: ConversationActivity,
    ) -> StoreResult<Conversation> {
        // No SET as colunas referem-se aos valores antigos da linha
        let sql = format!(
            "UPDATE conversations SET \
                 last_message = CASE WHEN last_message_time IS NULL OR last_message_time <= $3 \
                                     THEN $2 ELSE last_message END, \
                 last_message_time = GREATEST(last_message_time, $3), \
                 unread_count = unread_count + $4 \
             WHERE id = $1 \
             RETURNING {}",
            CONVERSATION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(conversation_id)
            .bind(&activity.preview)
            .bind(activity.at)
            .bind(if activity.increment_unread { 1i32 } else { 0i32 })
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("conversation {}", conversation_id)))?;
        conversation_from_row(&row)
    }

    async fn mark_conversation_read(&self, conversation_id: Uuid) -> StoreResult<Option<Conversation>> {
        let sql = format!(
            "UPDATE conversations SET unread_count = 0 WHERE id = $1 RETURNING {}",
            CONVERSATION_COLUMNS
        );
        let row = sqlx::query(&sql)
            .bind(conversation_id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(conversation_from_row).transpose()
    }
}
