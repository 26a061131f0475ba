//! Cliente da Evolution API (WhatsApp)
//!
//! Cobre apenas os endpoints de envio usados pelo roteador de saída:
//!
//! - **Texto**: `/message/sendText/{instance}`
//! - **Mídia**: `/message/sendMedia/{instance}` (imagem, vídeo, documento)
//! - **Áudio**: `/message/sendWhatsAppAudio/{instance}`
//!
//! Os webhooks de entrada (`messages.upsert`, `messages.update`, ...) são
//! tratados pelo gateway, não por este crate.
//!
//! # Exemplo
//!
//! ```rust,ignore
//! use evolution::{EvolutionClient, SendTextRequest};
//!
//! let client = EvolutionClient::new("https://evo.example.com", api_key)?;
//! let sent = client
//!     .send_text("minha-instancia", &SendTextRequest { number: "5511999990000".into(), text: "Olá".into() })
//!     .await?;
//! println!("id: {:?}", sent.message_id());
//! ```

pub mod client;
pub mod error;
pub mod types;

pub use client::EvolutionClient;
pub use error::{EvolutionError, Result};
pub use types::*;
