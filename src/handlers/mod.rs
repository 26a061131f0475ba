pub mod evolution_webhook;
pub mod health;
pub mod messages;
pub mod meta_webhook;

pub use evolution_webhook::{handle_evolution_webhook, handle_evolution_webhook_by_event};
pub use health::{health_check, ready_check, status_check};
pub use messages::{mark_conversation_read, send_message};
pub use meta_webhook::{handle_meta_webhook, verify_meta_webhook};
