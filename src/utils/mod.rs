pub mod error;
pub mod logging;
pub mod phone;
pub mod security;
pub mod text;

pub use error::*;
pub use text::{message_preview, truncate_safe};
