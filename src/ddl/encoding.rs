//! Encoding recovery for dump files of unknown provenance.
//!
//! A BOM-marked UTF-16 decode wins when it contains a DDL marker. Everything
//! else is read as UTF-8 with invalid bytes dropped, so a stray byte in a
//! mostly-UTF-8 dump costs only that byte.

const MARKERS: [&str; 2] = ["CREATE", "TABLE"];

/// Decode raw dump bytes into text.
pub fn decode(bytes: &[u8]) -> String {
    if let Some(text) = decode_utf16(bytes).filter(|text| looks_like_ddl(text)) {
        return text;
    }

    let text = decode_utf8_lossy(bytes);
    if !looks_like_ddl(&text) {
        tracing::debug!("No DDL marker found in decoded source");
    }
    text
}

fn looks_like_ddl(text: &str) -> bool {
    MARKERS.iter().any(|marker| text.contains(marker))
}

fn decode_utf16(bytes: &[u8]) -> Option<String> {
    let (body, little_endian) = match bytes {
        [0xFF, 0xFE, rest @ ..] => (rest, true),
        [0xFE, 0xFF, rest @ ..] => (rest, false),
        _ => return None,
    };

    let units = body.chunks_exact(2).map(|pair| {
        if little_endian {
            u16::from_le_bytes([pair[0], pair[1]])
        } else {
            u16::from_be_bytes([pair[0], pair[1]])
        }
    });

    char::decode_utf16(units).collect::<Result<String, _>>().ok()
}

/// UTF-8 with the BOM stripped and invalid sequences dropped.
fn decode_utf8_lossy(bytes: &[u8]) -> String {
    let body = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
    String::from_utf8_lossy(body).replace(char::REPLACEMENT_CHARACTER, "")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_utf8_with_bom() {
        let mut bytes = vec![0xEF, 0xBB, 0xBF];
        bytes.extend_from_slice("CREATE TABLE t (id INT);".as_bytes());
        assert_eq!(decode(&bytes), "CREATE TABLE t (id INT);");
    }

    #[test]
    fn test_utf16_le_with_bom() {
        let mut bytes = vec![0xFF, 0xFE];
        for unit in "CREATE TABLE é (id INT);".encode_utf16() {
            bytes.extend_from_slice(&unit.to_le_bytes());
        }
        assert_eq!(decode(&bytes), "CREATE TABLE é (id INT);");
    }

    #[test]
    fn test_invalid_byte_is_dropped() {
        // a lone 0xE9 is not valid UTF-8
        let bytes = b"CREATE TABLE caf\xE9 (id INT);";
        assert_eq!(decode(bytes), "CREATE TABLE caf (id INT);");
    }

    #[test]
    fn test_stray_byte_keeps_multibyte_text() {
        let mut bytes = "CREATE TABLE t (n INT COMMENT 'Tên người dùng');".as_bytes().to_vec();
        bytes.push(0xFF);
        assert_eq!(decode(&bytes), "CREATE TABLE t (n INT COMMENT 'Tên người dùng');");
    }

    #[test]
    fn test_permissive_fallback_without_markers() {
        let bytes = b"select 1";
        assert_eq!(decode(bytes), "select 1");
    }
}
