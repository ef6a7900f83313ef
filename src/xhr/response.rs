//! Response interpretation.
//!
//! Turns the bytes received for an exchange into the value exposed through `response` and
//! `responseText`, according to the configured [`ResponseType`] and the effective MIME type.
//!
//! Nothing here fails loudly: malformed JSON, an unknown charset or a missing content type
//! degrade to `None` or to a sensible default.

use crate::xhr::headers::MimeType;
use encoding_rs::{Encoding, UTF_8};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// How the body of a response is exposed through `response`.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseType {
    /// `""`: same as [`ResponseType::Text`]
    #[default]
    #[serde(rename = "")]
    Empty,
    ArrayBuffer,
    Blob,
    Document,
    Json,
    Text,
}

impl ResponseType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResponseType::Empty => "",
            ResponseType::ArrayBuffer => "arraybuffer",
            ResponseType::Blob => "blob",
            ResponseType::Document => "document",
            ResponseType::Json => "json",
            ResponseType::Text => "text",
        }
    }

    /// `""` and `"text"` both expose the decoded text.
    pub fn is_textual(&self) -> bool {
        matches!(self, ResponseType::Empty | ResponseType::Text)
    }
}

impl Display for ResponseType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown response type: {0:?}")]
pub struct UnknownResponseType(pub String);

impl FromStr for ResponseType {
    type Err = UnknownResponseType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" => Ok(ResponseType::Empty),
            "arraybuffer" => Ok(ResponseType::ArrayBuffer),
            "blob" => Ok(ResponseType::Blob),
            "document" => Ok(ResponseType::Document),
            "json" => Ok(ResponseType::Json),
            "text" => Ok(ResponseType::Text),
            other => Err(UnknownResponseType(other.to_string())),
        }
    }
}

/// Immutable binary payload tagged with a MIME type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Blob {
    bytes: Vec<u8>,
    mime_type: String,
}

impl Blob {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }

    /// MIME type of the blob, `""` when unknown.
    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Documents are never produced; this type has no values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Document {}

/// Typed value of the `response` property.
#[derive(Debug, Clone, PartialEq)]
pub enum XhrResponse {
    Text(String),
    ArrayBuffer(Vec<u8>),
    Blob(Blob),
    Json(serde_json::Value),
}

impl XhrResponse {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            XhrResponse::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_json(&self) -> Option<&serde_json::Value> {
        match self {
            XhrResponse::Json(value) => Some(value),
            _ => None,
        }
    }
}

/// Memoized result of interpreting the received bytes. A failure sticks for the exchange.
#[derive(Debug, Clone, Default)]
pub(crate) enum CachedResponse {
    #[default]
    Empty,
    Ready(XhrResponse),
    Failed,
}

/// Effective MIME type: the override wins, otherwise the type announced by the response.
///
/// `None` means nothing usable was found; decoding then treats the body as XML.
pub fn effective_mime_type(override_mime: Option<&MimeType>, announced: Option<MimeType>) -> Option<MimeType> {
    match override_mime {
        Some(mime) => Some(mime.clone()),
        None => announced,
    }
}

/// Decodes `bytes` as text for the given effective MIME type.
///
/// The declared charset is used when it names a known encoding. Undeclared or unknown charsets
/// (including the XML fallback) decode as UTF-8. A byte order mark always takes precedence.
pub fn decode_text(bytes: &[u8], mime: Option<&MimeType>) -> String {
    let declared = mime.and_then(MimeType::charset);
    let encoding = match declared {
        Some(label) => Encoding::for_label(label.as_bytes()).unwrap_or_else(|| {
            log::debug!("unknown charset {label:?}, decoding as UTF-8");
            UTF_8
        }),
        None => UTF_8,
    };

    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        log::debug!("malformed {} sequence replaced while decoding response", encoding.name());
    }
    text.into_owned()
}

/// Builds the typed response for the non-textual response types.
///
/// Returns `None` when the value cannot be produced. Callers cache that as a failure.
pub fn materialize(response_type: ResponseType, bytes: &[u8], mime: Option<&MimeType>) -> Option<XhrResponse> {
    match response_type {
        ResponseType::Empty | ResponseType::Text => Some(XhrResponse::Text(decode_text(bytes, mime))),
        ResponseType::ArrayBuffer => Some(XhrResponse::ArrayBuffer(bytes.to_vec())),
        ResponseType::Blob => {
            let mime_type = mime.map(|m| m.to_string()).unwrap_or_default();
            Some(XhrResponse::Blob(Blob::new(bytes.to_vec(), mime_type)))
        }
        ResponseType::Document => {
            document_response(response_type, mime);
            None
        }
        ResponseType::Json => parse_json(bytes).map(XhrResponse::Json),
    }
}

/// Document responses are not supported. HTML under `""` is skipped without even trying.
pub(crate) fn document_response(response_type: ResponseType, mime: Option<&MimeType>) -> Option<Document> {
    if response_type == ResponseType::Empty && mime.is_some_and(MimeType::is_html) {
        return None;
    }
    log::debug!("document responses are not supported");
    None
}

fn parse_json(bytes: &[u8]) -> Option<serde_json::Value> {
    let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
    if bytes.is_empty() {
        return None;
    }

    match serde_json::from_slice(bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            log::debug!("response is not valid JSON: {e}");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn mime(s: &str) -> MimeType {
        MimeType::parse(s).unwrap()
    }

    #[test]
    fn response_type_round_trips_legacy_names() {
        for ty in ["", "arraybuffer", "blob", "document", "json", "text"] {
            assert_eq!(ResponseType::from_str(ty).unwrap().as_str(), ty);
        }
        assert!(ResponseType::from_str("stream").is_err());
        assert_eq!(serde_json::to_string(&ResponseType::ArrayBuffer).unwrap(), "\"arraybuffer\"");
        assert_eq!(serde_json::from_str::<ResponseType>("\"\"").unwrap(), ResponseType::Empty);
    }

    #[test]
    fn override_wins_over_announced_type() {
        let over = mime("text/plain;charset=latin1");
        let effective = effective_mime_type(Some(&over), Some(mime("application/json")));
        assert_eq!(effective.unwrap().essence(), "text/plain");

        let effective = effective_mime_type(None, Some(mime("application/json")));
        assert_eq!(effective.unwrap().essence(), "application/json");
        assert!(effective_mime_type(None, None).is_none());
    }

    #[test]
    fn decode_uses_declared_charset() {
        // "café" in ISO-8859-1
        let bytes = b"caf\xe9";
        assert_eq!(decode_text(bytes, Some(&mime("text/plain;charset=iso-8859-1"))), "café");
    }

    #[test]
    fn decode_defaults_to_utf8() {
        let snowman = "\u{2603}".as_bytes();
        assert_eq!(decode_text(snowman, None), "\u{2603}");
        assert_eq!(decode_text(snowman, Some(&mime("text/xml"))), "\u{2603}");
        assert_eq!(decode_text(snowman, Some(&mime("text/plain;charset=no-such-charset"))), "\u{2603}");
    }

    #[test]
    fn decode_honors_bom() {
        assert_eq!(decode_text(b"\xEF\xBB\xBFhi", Some(&mime("text/plain;charset=iso-8859-1"))), "hi");
    }

    #[test]
    fn json_parses_or_yields_none() {
        let value = materialize(ResponseType::Json, br#"{"a":1}"#, None).unwrap();
        assert_eq!(value.as_json(), Some(&json!({"a": 1})));

        assert!(materialize(ResponseType::Json, b"{not json", None).is_none());
        assert!(materialize(ResponseType::Json, b"", None).is_none());
        assert!(materialize(ResponseType::Json, b"\xEF\xBB\xBF[1]", None).is_some());
    }

    #[test]
    fn blob_is_tagged_with_effective_type() {
        let value = materialize(ResponseType::Blob, b"abc", Some(&mime("image/png"))).unwrap();
        match value {
            XhrResponse::Blob(blob) => {
                assert_eq!(blob.size(), 3);
                assert_eq!(blob.mime_type(), "image/png");
                assert_eq!(blob.text(), "abc");
            }
            other => panic!("expected blob, got {:?}", other),
        }

        let untagged = materialize(ResponseType::Blob, b"", None).unwrap();
        assert!(matches!(untagged, XhrResponse::Blob(ref b) if b.mime_type().is_empty()));
    }

    #[test]
    fn documents_are_never_produced() {
        assert!(materialize(ResponseType::Document, b"<p>hi</p>", Some(&mime("text/html"))).is_none());
        assert!(materialize(ResponseType::Document, b"<a/>", Some(&mime("text/xml"))).is_none());
    }

    #[test]
    fn array_buffer_copies_bytes() {
        let value = materialize(ResponseType::ArrayBuffer, &[1, 2, 3], None).unwrap();
        assert_eq!(value, XhrResponse::ArrayBuffer(vec![1, 2, 3]));
    }
}
