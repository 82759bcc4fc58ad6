//! Inbound XML responses.
//!
//! Bodies are flattened, not parsed as a tree: every `<tag>text</tag>` pair whose text
//! contains no markup becomes one field. Parent elements are skipped and their leaves
//! are collected, so nested documents yield their leaves with the last duplicate
//! winning. Attributes, namespaces and self-closing tags are not recognised.

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

use super::{PARSE_ERROR, ResponseFields};

static XML_DECLARATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<\?xml[^>]*\?>").unwrap());

// Spans lines, unlike a plain `.*?`.
static CDATA_SECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").unwrap());

/// Flattens a response body into a field mapping. Never fails.
///
/// - invalid UTF-8 yields `{rawResponse, parseError}`
/// - a body without any extractable element yields `{rawResponse}` with the cleaned text
///
/// # Examples
///
/// ```
/// use facturadirecta_bridge::xml::parse_response;
///
/// let fields = parse_response(
///     b"<?xml version=\"1.0\"?><client><id>7</id><n><![CDATA[Acme]]></n></client>",
/// );
/// assert_eq!(fields.get("id"), Some("7"));
/// assert_eq!(fields.get("n"), Some("Acme"));
///
/// let fields = parse_response(b"OK");
/// assert_eq!(fields.raw_response(), Some("OK"));
/// ```
#[must_use]
pub fn parse_response(body: &[u8]) -> ResponseFields {
    match std::str::from_utf8(body) {
        Ok(text) => {
            let cleaned = clean(text);
            let fields = extract_fields(&unwrap_cdata(&cleaned));
            if fields.is_empty() { ResponseFields::raw(cleaned) } else { fields }
        }
        Err(err) => undecodable(body, &err),
    }
}

/// Splits a listing body into one mapping per `<element>` block. Never fails.
///
/// Each block is flattened like [`parse_response`]. A body without any block (a single
/// entity, an empty listing, plain text) is parsed as one record.
#[must_use]
pub fn parse_collection(body: &[u8], element: &str) -> Vec<ResponseFields> {
    let text = match std::str::from_utf8(body) {
        Ok(text) => text,
        Err(err) => return vec![undecodable(body, &err)],
    };

    let cleaned = clean(text);
    let unwrapped = unwrap_cdata(&cleaned);
    let records: Vec<_> = entity_blocks(&unwrapped, element)
        .map(extract_fields)
        .filter(|fields| !fields.is_empty())
        .collect();

    if records.is_empty() {
        debug!(element, "no entity blocks found, parsing body as a single record");
        return vec![parse_response(body)];
    }
    records
}

fn clean(text: &str) -> String {
    XML_DECLARATION.replace(text, "").trim().to_owned()
}

fn unwrap_cdata(text: &str) -> String {
    CDATA_SECTION.replace_all(text, "$1").into_owned()
}

fn undecodable(body: &[u8], err: &std::str::Utf8Error) -> ResponseFields {
    let mut fields = ResponseFields::raw(String::from_utf8_lossy(body));
    fields.insert(PARSE_ERROR, err.to_string());
    fields
}

/// Contents of every `<element>...</element>` block, outermost first, non-overlapping.
fn entity_blocks<'a>(text: &'a str, element: &str) -> impl Iterator<Item = &'a str> + 'a {
    let open = format!("<{element}>");
    let close = format!("</{element}>");
    let mut rest = text;

    std::iter::from_fn(move || {
        let start = rest.find(&open)? + open.len();
        let len = rest[start..].find(&close)?;
        let block = &rest[start..start + len];
        rest = &rest[start + len + close.len()..];
        Some(block)
    })
}

/// One pass over `text`, collecting `<tag>content</tag>` leaves.
///
/// At each `<` the tag runs to the next `>` and may not contain `/`; the content runs
/// to the next `<`, which must open the matching `</tag>`. On a mismatch the scan
/// resumes one character later.
fn extract_fields(text: &str) -> ResponseFields {
    let mut fields = ResponseFields::new();
    let mut pos = 0;

    while let Some(offset) = text[pos..].find('<') {
        let start = pos + offset;
        match match_leaf(&text[start..]) {
            Some((tag, content, consumed)) => {
                let content = content.trim();
                if !content.is_empty() {
                    fields.insert(tag, content);
                }
                pos = start + consumed;
            }
            None => pos = start + 1,
        }
    }

    fields
}

/// Matches a leaf element at the start of `text`, returning tag, raw content and the
/// number of bytes consumed.
fn match_leaf(text: &str) -> Option<(&str, &str, usize)> {
    let after_open = text.strip_prefix('<')?;
    let tag_len = after_open.find('>')?;
    let tag = &after_open[..tag_len];
    if tag.is_empty() || tag.contains('/') {
        return None;
    }

    let body = &after_open[tag_len + 1..];
    let content_len = body.find('<')?;
    let content = &body[..content_len];

    let closing = body[content_len..].strip_prefix("</")?.strip_prefix(tag)?.strip_prefix('>')?;
    let consumed = text.len() - closing.len();
    Some((tag, content, consumed))
}
