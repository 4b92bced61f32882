// src/parse/key.rs

use crate::error::DecodeError;

/// Derive an issuer's natural key from the `href` of its name link.
///
/// The reference is query-unescaped (`%XX` sequences, `+` as space) and the
/// key is whatever follows the last `/`, or the whole decoded string when
/// there is no separator.
pub fn normalize(raw_href: &str) -> Result<String, DecodeError> {
    let decoded = unescape(raw_href)?;
    Ok(match decoded.rfind('/') {
        Some(idx) => decoded[idx + 1..].to_string(),
        None => decoded,
    })
}

fn unescape(raw: &str) -> Result<String, DecodeError> {
    let bytes = raw.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b != b'%' {
            continue;
        }
        let escape = bytes.get(i + 1..i + 3).unwrap_or_default();
        if escape.len() != 2 || !escape.iter().all(u8::is_ascii_hexdigit) {
            let end = (i + 3).min(raw.len());
            return Err(DecodeError {
                input: raw.to_string(),
                reason: format!(
                    "invalid escape '{}'",
                    String::from_utf8_lossy(&bytes[i..end])
                ),
            });
        }
    }

    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|s| s.into_owned())
        .map_err(|e| DecodeError {
            input: raw.to_string(),
            reason: e.to_string(),
        })
}
