/// Texto de mensagens: truncamento seguro em UTF-8 e prévia para a lista de conversas

use crate::models::MessageType;

/// Tamanho máximo (em caracteres) de `conversations.last_message`
pub const PREVIEW_MAX_CHARS: usize = 120;

/// Trunca em no máximo `max_bytes` sem cortar um caractere UTF-8 no meio
pub fn truncate_safe(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }

    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }

    &s[..end]
}

/// Trunca por número de caracteres, adicionando `…` quando corta
fn truncate_chars(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}…", s[..idx].trim_end()),
        None => s.to_string(),
    }
}

/// Rótulo exibido quando a mensagem não tem texto
pub fn placeholder_for(message_type: MessageType) -> &'static str {
    match message_type {
        MessageType::Text => "",
        MessageType::Image => "📷 Imagem",
        MessageType::Audio => "🎤 Áudio",
        MessageType::Video => "🎥 Vídeo",
        MessageType::Document => "📄 Documento",
        MessageType::Sticker => "Figurinha",
        MessageType::Location => "📍 Localização",
        MessageType::Contact => "👤 Contato",
        MessageType::Unknown => "[unsupported message]",
    }
}

/// Prévia usada em `last_message`: texto (uma linha) ou rótulo da mídia
pub fn message_preview(message_type: MessageType, content: &str) -> String {
    let single_line = content.split_whitespace().collect::<Vec<_>>().join(" ");

    if single_line.is_empty() {
        return placeholder_for(message_type).to_string();
    }

    truncate_chars(&single_line, PREVIEW_MAX_CHARS)
}
