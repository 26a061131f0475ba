pub mod domain;
pub mod evolution_events;
pub mod inbound;
pub mod outbound;

pub use domain::*;
pub use evolution_events::EvolutionEnvelope;
pub use inbound::{AccountRef, InboundEvent, InboundMessage};
pub use outbound::{OutboundMessage, SendMessageRequest, SendMessageResponse, SentMessage};
