//! Outbound XML documents.

use std::fmt;

use quick_xml::{
    Writer,
    escape::partial_escape,
    events::{BytesCData, BytesDecl, BytesEnd, BytesStart, Event},
};
use serde_json::{Map, Value};

use crate::error::{BridgeError, Result};

/// Serializes a rooted body mapping, using its first key as the root element.
///
/// # Errors
///
/// Returns [`BridgeError::Xml`] if the mapping is empty or writing fails.
///
/// # Examples
///
/// ```
/// use facturadirecta_bridge::xml::to_xml;
/// use serde_json::json;
///
/// let body = json!({"client": {"n": "Acme & Co", "email": "", "phone": null}});
/// let xml = to_xml(body.as_object().unwrap())?;
///
/// assert_eq!(
///     xml,
///     "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
///      <client><n><![CDATA[Acme &amp; Co]]></n></client>"
/// );
/// # Ok::<(), facturadirecta_bridge::BridgeError>(())
/// ```
pub fn to_xml(body: &Map<String, Value>) -> Result<String> {
    let (root, content) =
        body.iter().next().ok_or_else(|| BridgeError::Xml("body has no root element".to_owned()))?;
    write_document(root, content)
}

/// Serializes `fields` as the children of an explicit `root` element.
///
/// # Errors
///
/// Returns [`BridgeError::Xml`] if `root` is empty or writing fails.
pub fn to_xml_with_root(root: &str, fields: &Map<String, Value>) -> Result<String> {
    write_document(root, &Value::Object(fields.clone()))
}

fn write_document(root: &str, content: &Value) -> Result<String> {
    if root.is_empty() {
        return Err(BridgeError::Xml("root element name is empty".to_owned()));
    }

    let mut writer = Writer::new(Vec::new());
    writer
        .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
        .map_err(write_error)?;

    writer.write_event(Event::Start(BytesStart::new(root))).map_err(write_error)?;
    // A root that is not a mapping has no children to write.
    if let Value::Object(fields) = content {
        write_fields(&mut writer, fields)?;
    }
    writer.write_event(Event::End(BytesEnd::new(root))).map_err(write_error)?;

    String::from_utf8(writer.into_inner()).map_err(|e| BridgeError::Xml(e.to_string()))
}

fn write_fields(writer: &mut Writer<Vec<u8>>, fields: &Map<String, Value>) -> Result<()> {
    for (key, value) in fields.iter().filter(|(_, value)| has_content(value)) {
        writer.write_event(Event::Start(BytesStart::new(key.as_str()))).map_err(write_error)?;
        match value {
            Value::Object(children) => write_fields(writer, children)?,
            leaf => write_text(writer, leaf)?,
        }
        writer.write_event(Event::End(BytesEnd::new(key.as_str()))).map_err(write_error)?;
    }
    Ok(())
}

// Escaped first, then CDATA-wrapped. Escaping `>` keeps `]]>` out of the section.
fn write_text(writer: &mut Writer<Vec<u8>>, value: &Value) -> Result<()> {
    let escaped = escape_text(&render(value));
    writer.write_event(Event::CData(BytesCData::new(escaped))).map_err(write_error)
}

/// Entity-escapes `& < > " '`; the apostrophe is written as `&#39;`.
fn escape_text(text: &str) -> String {
    partial_escape(text).replace('"', "&quot;").replace('\'', "&#39;")
}

/// Returns false for values that produce no element.
///
/// `null`, `""`, arrays that render to nothing and mappings without any such child.
fn has_content(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !render_items(items).is_empty(),
        Value::Object(children) => children.values().any(has_content),
        Value::Bool(_) | Value::Number(_) => true,
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => render_items(items),
        other => other.to_string(),
    }
}

fn render_items(items: &[Value]) -> String {
    items.iter().map(render).collect::<Vec<_>>().join(",")
}

fn write_error(err: impl fmt::Display) -> BridgeError {
    BridgeError::Xml(err.to_string())
}
