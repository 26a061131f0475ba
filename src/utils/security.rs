/// Comparação de segredos em tempo constante
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

/// `true` quando `provided` bate com `expected` (ambos presentes)
pub fn secret_matches(expected: &str, provided: Option<&str>) -> bool {
    match provided {
        Some(provided) => constant_time_eq(expected.as_bytes(), provided.trim().as_bytes()),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(b"abc", b"abc"));
        assert!(!constant_time_eq(b"abc", b"abd"));
        assert!(!constant_time_eq(b"abc", b"abcd"));
    }

    #[test]
    fn test_secret_matches() {
        assert!(secret_matches("k1", Some(" k1 ")));
        assert!(!secret_matches("k1", Some("k2")));
        assert!(!secret_matches("k1", None));
    }
}
