use crate::error::{Error, Result};
use crate::types::{Header, MessagePart};
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::{DecodePaddingMode, Engine};
use scraper::{Html, Selector};

// Gmail sometimes omits trailing padding on body data
const STANDARD_LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Value of the last header called `name`; later duplicates overwrite earlier ones.
pub fn last_header_value<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    let mut found = None;
    for header in headers {
        if header.name.as_deref() == Some(name) {
            found = header.value.as_deref();
        }
    }
    found
}

/// Value of the first header called `name`, stopping at the first match.
pub fn first_header_value<'a>(headers: &'a [Header], name: &str) -> Option<&'a str> {
    headers
        .iter()
        .find(|h| h.name.as_deref() == Some(name))
        .and_then(|h| h.value.as_deref())
}

/// Decodes the body of the first sub-part only. Nested parts are ignored.
pub fn decode_first_part(payload: &MessagePart) -> Result<Vec<u8>> {
    let first = payload
        .parts
        .as_ref()
        .and_then(|parts| parts.first())
        .ok_or(Error::MissingField("parts"))?;
    let data = first
        .body
        .as_ref()
        .and_then(|b| b.data.as_ref())
        .ok_or(Error::MissingField("body.data"))?;

    let standard = data.replace('-', "+").replace('_', "/");
    Ok(STANDARD_LENIENT.decode(standard)?)
}

/// Parses decoded bytes as HTML and returns the inner markup of `<body>`.
pub fn extract_body_markup(decoded: &[u8]) -> Result<String> {
    let document = Html::parse_document(&String::from_utf8_lossy(decoded));
    let selector = Selector::parse("body").map_err(|_| Error::MissingField("body"))?;
    document
        .select(&selector)
        .next()
        .map(|body| body.inner_html().trim().to_string())
        .ok_or(Error::MissingField("body"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MessagePartBody;
    use base64::engine::general_purpose::URL_SAFE;

    fn create_message_part(data: Option<&str>, parts: Option<Vec<MessagePart>>) -> MessagePart {
        MessagePart {
            mime_type: Some("text/html".to_string()),
            headers: None,
            body: data.map(|d| MessagePartBody {
                data: Some(URL_SAFE.encode(d)),
            }),
            parts,
        }
    }

    #[test]
    fn test_last_header_value_takes_last_duplicate() {
        let headers = vec![Header::new("Subject", "A"), Header::new("Subject", "B")];
        assert_eq!(last_header_value(&headers, "Subject"), Some("B"));
    }

    #[test]
    fn test_first_header_value_takes_first_duplicate() {
        let headers = vec![Header::new("Subject", "X"), Header::new("Subject", "Y")];
        assert_eq!(first_header_value(&headers, "Subject"), Some("X"));
    }

    #[test]
    fn test_header_lookup_is_case_sensitive() {
        let headers = vec![Header::new("subject", "lower")];
        assert_eq!(first_header_value(&headers, "Subject"), None);
        assert_eq!(last_header_value(&headers, "Subject"), None);
    }

    #[test]
    fn test_decode_first_part_uses_only_first_part() {
        let first = create_message_part(Some("<p>first</p>"), None);
        let second = create_message_part(Some("<p>second</p>"), None);
        let payload = create_message_part(None, Some(vec![first, second]));
        assert_eq!(decode_first_part(&payload).unwrap(), b"<p>first</p>");
    }

    #[test]
    fn test_decode_first_part_handles_url_safe_alphabet() {
        // ">>>?" encodes to "Pj4-Pw==" in the URL-safe alphabet
        let part = MessagePart {
            body: Some(MessagePartBody {
                data: Some("Pj4-Pw".to_string()),
            }),
            ..Default::default()
        };
        let payload = MessagePart {
            parts: Some(vec![part]),
            ..Default::default()
        };
        assert_eq!(decode_first_part(&payload).unwrap(), b">>>?");
    }

    #[test]
    fn test_decode_first_part_without_parts() {
        let payload = create_message_part(Some("top level only"), None);
        assert!(matches!(
            decode_first_part(&payload),
            Err(Error::MissingField("parts"))
        ));
    }

    #[test]
    fn test_decode_first_part_rejects_garbage() {
        let part = MessagePart {
            body: Some(MessagePartBody {
                data: Some("!!not base64!!".to_string()),
            }),
            ..Default::default()
        };
        let payload = MessagePart {
            parts: Some(vec![part]),
            ..Default::default()
        };
        assert!(matches!(decode_first_part(&payload), Err(Error::Decode(_))));
    }

    #[test]
    fn test_extract_body_markup() {
        let html = b"<html><head><title>t</title></head><body><p>Hello</p></body></html>";
        assert_eq!(extract_body_markup(html).unwrap(), "<p>Hello</p>");
    }

    #[test]
    fn test_extract_body_markup_from_plain_text() {
        assert_eq!(extract_body_markup(b"just text").unwrap(), "just text");
    }
}
