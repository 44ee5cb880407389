use log::warn;
use mailparse::{parse_mail, MailHeaderMap, ParsedMail};
use serde::Serialize;

use crate::error::Result;

/// One line of a mailbox listing. The id is the message's sequence number
/// in the folder it was listed from.
#[derive(Debug, Serialize)]
pub struct MessageSummary {
    pub id: u32,
    pub from: String,
    pub subject: String,
    pub date: String,
}

/// A fully decoded message, body included.
#[derive(Debug, Serialize)]
pub struct MessageDetail {
    pub from: String,
    pub to: String,
    pub subject: String,
    pub date: String,
    pub body: String,
}

fn header_or(parsed: &ParsedMail, name: &str, fallback: &str) -> String {
    parsed
        .headers
        .get_first_value(name)
        .unwrap_or_else(|| fallback.to_string())
}

// Depth-first search for the first text/plain part
fn find_text_part<'a>(part: &'a ParsedMail<'a>) -> Option<&'a ParsedMail<'a>> {
    if part.ctype.mimetype == "text/plain" {
        return Some(part);
    }
    part.subparts.iter().find_map(find_text_part)
}

/// Decode a part's body, falling back to a lossy UTF-8 read of the raw
/// payload when the declared transfer encoding or charset is broken. The
/// fallback is logged, never surfaced as an error.
fn decode_body(part: &ParsedMail) -> String {
    match part.get_body() {
        Ok(body) => body,
        Err(err) => {
            warn!("body decode failed ({}), falling back to lossy read", err);
            match part.get_body_raw() {
                Ok(raw) => String::from_utf8_lossy(&raw).into_owned(),
                Err(err) => {
                    warn!("raw body unavailable: {}", err);
                    String::new()
                }
            }
        }
    }
}

/// Extract the plain-text body: the first text/plain part of a multi-part
/// message, or the single body otherwise. A multi-part message without a
/// text/plain part yields an empty body, not an error.
fn extract_text_body(parsed: &ParsedMail) -> String {
    if parsed.subparts.is_empty() {
        return decode_body(parsed);
    }
    match find_text_part(parsed) {
        Some(part) => decode_body(part),
        None => String::new(),
    }
}

/// Decode the headers needed for a listing line.
pub fn decode_summary(id: u32, raw: &[u8]) -> Result<MessageSummary> {
    let parsed = parse_mail(raw)?;
    Ok(MessageSummary {
        id,
        from: header_or(&parsed, "From", "Unknown"),
        subject: header_or(&parsed, "Subject", "(No Subject)"),
        date: header_or(&parsed, "Date", ""),
    })
}

/// Decode a whole message for reading.
pub fn decode_detail(raw: &[u8]) -> Result<MessageDetail> {
    let parsed = parse_mail(raw)?;
    let body = extract_text_body(&parsed);
    Ok(MessageDetail {
        from: header_or(&parsed, "From", "Unknown"),
        to: header_or(&parsed, "To", ""),
        subject: header_or(&parsed, "Subject", "(No Subject)"),
        date: header_or(&parsed, "Date", ""),
        body,
    })
}
