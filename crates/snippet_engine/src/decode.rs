use encoding_rs::Encoding;

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("failed to decode response with {encoding}")]
    Malformed { encoding: String },
    #[error("response is not valid UTF-8: {0}")]
    InvalidUtf8(String),
}

/// Decode a response body to text: BOM -> Content-Type charset -> strict UTF-8.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Result<String, DecodeError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(label) = content_type.and_then(extract_charset) {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return decode_with(bytes, encoding);
        }
    }

    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|err| DecodeError::InvalidUtf8(err.to_string()))
}

fn extract_charset(content_type: &str) -> Option<&str> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim().trim_matches(['"', '\''].as_ref()))
    })
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> Result<String, DecodeError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(DecodeError::Malformed {
            encoding: encoding.name().to_string(),
        });
    }
    Ok(text.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn charset_parameter_is_case_insensitive() {
        assert_eq!(extract_charset("text/html; Charset=\"ISO-8859-1\""), Some("ISO-8859-1"));
        assert_eq!(extract_charset("text/html"), None);
    }

    #[test]
    fn header_charset_is_honoured() {
        let text = decode_body(b"caf\xe9", Some("text/html; charset=ISO-8859-1")).unwrap();
        assert_eq!(text, "caf\u{e9}");
    }

    #[test]
    fn bom_is_stripped() {
        assert_eq!(decode_body(b"\xEF\xBB\xBFhello", None).unwrap(), "hello");
    }

    #[test]
    fn invalid_utf8_without_charset_fails() {
        let err = decode_body(b"caf\xe9", Some("text/html")).unwrap_err();
        assert!(matches!(err, DecodeError::InvalidUtf8(_)));
    }
}
