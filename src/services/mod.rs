//! Serviços do gateway
//!
//! - `normalizer`: payloads dos provedores -> `InboundEvent` (puro)
//! - `ingestion`: aplica eventos no inbox
//! - `send_router`: envio por canal com retry
//! - `retry`: backoff exponencial compartilhado pelos senders

pub mod ingestion;
pub mod normalizer;
pub mod retry;
pub mod send_router;

pub use ingestion::{IngestOutcome, IngestionService};
pub use normalizer::{normalize_evolution, normalize_event_name, normalize_meta};
pub use retry::{retry_with_backoff, RetryPolicy, Transient};
pub use send_router::{ChannelSender, EvolutionSender, MetaSender, SendRouter};
