//! Cliente da Graph API da Meta para Messenger e Instagram
//!
//! - [`client::GraphClient`]: Send API (`POST /{version}/me/messages`)
//! - [`webhooks`]: handshake, assinatura `X-Hub-Signature-256` e tipos do payload
//!
//! O token da página é por empresa e é passado em cada envio.

pub mod client;
pub mod error;
pub mod types;
pub mod webhooks;

pub use client::{GraphClient, DEFAULT_GRAPH_BASE_URL, DEFAULT_GRAPH_VERSION};
pub use error::{GraphError, Result};
pub use types::*;
