//! RFC822 message construction for Gmail `send`/`draft` (spec.md §4.3
//! "RFC822 construction").
//!
//! Builds a CRLF-terminated message, wraps it `multipart/mixed` +
//! `multipart/alternative` when attachments or an HTML body are present,
//! and base64url-encodes the whole thing for Gmail's `{raw: ...}` shape.

use base64::Engine;
use base64::engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD};

/// One file to attach: a filename, a MIME type, and its raw bytes.
pub struct Attachment {
    pub filename: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

/// The pieces of an outbound email, before RFC822 serialization.
pub struct MessageParts<'a> {
    pub from: Option<&'a str>,
    pub to: &'a str,
    pub cc: Option<&'a str>,
    pub bcc: Option<&'a str>,
    pub subject: &'a str,
    pub body_text: &'a str,
    pub body_html: Option<&'a str>,
    pub attachments: &'a [Attachment],
}

/// RFC 2047 encoded-word form of a header value, applied only when the
/// value contains non-ASCII bytes.
fn encode_header_value(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

/// Base64-encode `bytes` and wrap the result at a 76-character line width,
/// the MIME line-length convention for encoded body parts.
fn wrap_base64(bytes: &[u8]) -> String {
    let encoded = STANDARD.encode(bytes);
    encoded
        .as_bytes()
        .chunks(76)
        .map(|chunk| std::str::from_utf8(chunk).expect("base64 alphabet is ASCII"))
        .collect::<Vec<_>>()
        .join("\r\n")
}

/// A MIME boundary that can't collide with message content — random, not
/// derived from anything in the message.
fn boundary() -> String {
    format!("gw-boundary-{}", uuid::Uuid::new_v4())
}

fn push_header(out: &mut String, name: &str, value: &str) {
    out.push_str(name);
    out.push_str(": ");
    out.push_str(value);
    out.push_str("\r\n");
}

/// Build the full RFC822 text of the message described by `parts`.
pub fn build_message(parts: &MessageParts<'_>) -> String {
    let mut out = String::new();
    if let Some(from) = parts.from {
        push_header(&mut out, "From", from);
    }
    push_header(&mut out, "To", parts.to);
    if let Some(cc) = parts.cc {
        push_header(&mut out, "Cc", cc);
    }
    if let Some(bcc) = parts.bcc {
        push_header(&mut out, "Bcc", bcc);
    }
    push_header(&mut out, "Subject", &encode_header_value(parts.subject));
    push_header(&mut out, "MIME-Version", "1.0");

    let alt_boundary = boundary();

    let has_html = parts.body_html.is_some();
    let alternative_body = |out: &mut String| {
        if has_html {
            out.push_str(&format!("Content-Type: multipart/alternative; boundary=\"{alt_boundary}\"\r\n\r\n"));
            out.push_str(&format!("--{alt_boundary}\r\n"));
            push_header(out, "Content-Type", "text/plain; charset=\"UTF-8\"");
            out.push_str("\r\n");
            out.push_str(parts.body_text);
            out.push_str("\r\n");
            out.push_str(&format!("--{alt_boundary}\r\n"));
            push_header(out, "Content-Type", "text/html; charset=\"UTF-8\"");
            out.push_str("\r\n");
            out.push_str(parts.body_html.unwrap_or_default());
            out.push_str("\r\n");
            out.push_str(&format!("--{alt_boundary}--\r\n"));
        } else {
            push_header(out, "Content-Type", "text/plain; charset=\"UTF-8\"");
            out.push_str("\r\n");
            out.push_str(parts.body_text);
            out.push_str("\r\n");
        }
    };

    if parts.attachments.is_empty() {
        alternative_body(&mut out);
        return out;
    }

    let mixed_boundary = boundary();
    push_header(&mut out, "Content-Type", &format!("multipart/mixed; boundary=\"{mixed_boundary}\""));
    out.push_str("\r\n");
    out.push_str(&format!("--{mixed_boundary}\r\n"));
    alternative_body(&mut out);

    for attachment in parts.attachments {
        out.push_str(&format!("--{mixed_boundary}\r\n"));
        push_header(&mut out, "Content-Type", &attachment.mime_type);
        push_header(&mut out, "Content-Transfer-Encoding", "base64");
        push_header(
            &mut out,
            "Content-Disposition",
            &format!("attachment; filename=\"{}\"", attachment.filename),
        );
        out.push_str("\r\n");
        out.push_str(&wrap_base64(&attachment.bytes));
        out.push_str("\r\n");
    }
    out.push_str(&format!("--{mixed_boundary}--\r\n"));
    out
}

/// Build the message and base64url-encode it (unpadded), the shape Gmail's
/// `messages.send`/`drafts.create` expect as the `raw` field.
pub fn build_raw(parts: &MessageParts<'_>) -> String {
    URL_SAFE_NO_PAD.encode(build_message(parts).as_bytes())
}

/// Decode Gmail's base64url attachment/body bytes.
pub fn decode_base64url(data: &str) -> Result<Vec<u8>, base64::DecodeError> {
    URL_SAFE_NO_PAD.decode(data.trim_end_matches('='))
}

/// Re-encode base64url bytes as standard base64, the alphabet Anthropic's
/// API expects (spec.md §4.3 "Base-64 variants").
pub fn base64url_to_standard(data: &str) -> Result<String, base64::DecodeError> {
    Ok(STANDARD.encode(decode_base64url(data)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn plain_ascii_subject_is_not_encoded() {
        let parts = MessageParts {
            from: Some("me@example.com"),
            to: "you@example.com",
            cc: None,
            bcc: None,
            subject: "hello",
            body_text: "hi there",
            body_html: None,
            attachments: &[],
        };
        let message = build_message(&parts);
        assert!(message.contains("Subject: hello\r\n"));
        assert!(message.contains("\r\n\r\nhi there"));
    }

    #[test]
    fn non_ascii_subject_uses_rfc2047_encoded_word() {
        let parts = MessageParts {
            from: None,
            to: "you@example.com",
            cc: None,
            bcc: None,
            subject: "café",
            body_text: "hi",
            body_html: None,
            attachments: &[],
        };
        let message = build_message(&parts);
        assert!(message.contains("Subject: =?UTF-8?B?"));
    }

    #[test]
    fn attachments_produce_multipart_mixed_with_wrapped_base64() {
        let attachment = Attachment {
            filename: "a.txt".into(),
            mime_type: "text/plain".into(),
            bytes: vec![b'x'; 200],
        };
        let parts = MessageParts {
            from: Some("me@example.com"),
            to: "you@example.com",
            cc: None,
            bcc: None,
            subject: "with attachment",
            body_text: "see attached",
            body_html: None,
            attachments: std::slice::from_ref(&attachment),
        };
        let message = build_message(&parts);
        assert!(message.contains("multipart/mixed"));
        assert!(message.contains("Content-Disposition: attachment; filename=\"a.txt\""));
        let longest_line = message.lines().map(str::len).max().unwrap_or(0);
        assert!(longest_line <= 76);
    }

    #[test]
    fn two_messages_with_identical_subjects_get_different_boundaries() {
        let parts = MessageParts {
            from: Some("me@example.com"),
            to: "you@example.com",
            cc: None,
            bcc: None,
            subject: "same length",
            body_text: "hi",
            body_html: Some("<p>hi</p>"),
            attachments: &[],
        };
        let first = build_message(&parts);
        let second = build_message(&parts);
        let extract_boundary = |m: &str| {
            m.lines()
                .find(|l| l.starts_with("Content-Type: multipart/alternative"))
                .and_then(|l| l.split("boundary=\"").nth(1))
                .map(|s| s.trim_end_matches('"').to_string())
                .unwrap()
        };
        assert_ne!(extract_boundary(&first), extract_boundary(&second));
    }

    #[test]
    fn raw_is_base64url_without_padding_or_plus_slash() {
        let parts = MessageParts {
            from: Some("me@example.com"),
            to: "you@example.com",
            cc: None,
            bcc: None,
            subject: "hello",
            body_text: "hi",
            body_html: None,
            attachments: &[],
        };
        let raw = build_raw(&parts);
        assert!(!raw.contains('+'));
        assert!(!raw.contains('/'));
        assert!(!raw.ends_with('='));
    }

    #[rstest]
    #[case::needs_url_safe_chars(vec![0xFBu8, 0xFF, 0xFE])]
    #[case::single_byte(vec![0x00u8])]
    #[case::needs_two_padding_chars(vec![0x01u8, 0x02])]
    #[case::needs_one_padding_char(vec![0x01u8, 0x02, 0x03])]
    fn base64url_to_standard_round_trips_through_both_alphabets(#[case] bytes: Vec<u8>) {
        let url = URL_SAFE_NO_PAD.encode(&bytes);
        let standard = base64url_to_standard(&url).unwrap();
        assert_eq!(STANDARD.decode(standard).unwrap(), bytes);
    }
}
