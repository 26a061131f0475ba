/// Utilitários para JIDs do WhatsApp e números de telefone

use once_cell::sync::Lazy;
use regex::Regex;

/// `5511999990000@s.whatsapp.net`, `5511999990000:12@s.whatsapp.net` (multi-device), `...@c.us` (legado)
static USER_JID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(\d+)(?::\d+)?@(?:s\.whatsapp\.net|c\.us)$").expect("valid user JID regex")
});

/// Tipo de chat identificado pelo JID
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JidKind {
    /// Conversa individual; carrega o telefone só com dígitos
    User(String),
    /// Identificador anônimo (`@lid`), sem telefone
    Lid(String),
    Group,
    Broadcast,
    Newsletter,
    Unknown,
}

pub fn classify_jid(jid: &str) -> JidKind {
    let jid = jid.trim();

    if let Some(caps) = USER_JID.captures(jid) {
        return JidKind::User(caps[1].to_string());
    }
    if jid.ends_with("@g.us") {
        return JidKind::Group;
    }
    if jid.ends_with("@broadcast") {
        return JidKind::Broadcast;
    }
    if jid.ends_with("@newsletter") {
        return JidKind::Newsletter;
    }
    if let Some(id) = jid.strip_suffix("@lid") {
        return JidKind::Lid(id.to_string());
    }

    JidKind::Unknown
}

/// Remove tudo que não for dígito
pub fn digits_only(raw: &str) -> String {
    raw.chars().filter(|c| c.is_ascii_digit()).collect()
}

/// Normaliza um telefone para o formato aceito pela Evolution (E.164 sem `+`)
///
/// Retorna `None` quando o número não tem entre 8 e 15 dígitos.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits = digits_only(raw);
    if (8..=15).contains(&digits.len()) {
        Some(digits)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_jid() {
        assert_eq!(classify_jid("5511999990000@s.whatsapp.net"), JidKind::User("5511999990000".into()));
        assert_eq!(classify_jid("5511999990000:7@s.whatsapp.net"), JidKind::User("5511999990000".into()));
        assert_eq!(classify_jid("5511999990000@c.us"), JidKind::User("5511999990000".into()));
        assert_eq!(classify_jid("120363025246125486@g.us"), JidKind::Group);
        assert_eq!(classify_jid("status@broadcast"), JidKind::Broadcast);
        assert_eq!(classify_jid("120363144038483540@newsletter"), JidKind::Newsletter);
        assert_eq!(classify_jid("204050607080@lid"), JidKind::Lid("204050607080".into()));
        assert_eq!(classify_jid("garbage"), JidKind::Unknown);
    }

    #[test]
    fn test_normalize_phone() {
        assert_eq!(normalize_phone("+55 (11) 99999-0000"), Some("5511999990000".into()));
        assert_eq!(normalize_phone("123"), None);
        assert_eq!(normalize_phone(""), None);
    }
}
