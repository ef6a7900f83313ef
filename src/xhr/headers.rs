//! Header and MIME helpers.
//!
//! Small, permissive parsers for the handful of headers the request object needs to look at:
//! `Content-Length` (for progress totals) and `Content-Type` (for decoding decisions).

use http::header::{HeaderName, CONTENT_LENGTH, CONTENT_TYPE};
use http::{HeaderMap, HeaderValue};
use std::fmt::{Display, Formatter};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HeaderError {
    /// The header was repeated with values that do not agree
    #[error("ambiguous {0} header: {1:?}")]
    Ambiguous(&'static str, String),
}

/// Lossy string view of a header value. Non UTF-8 bytes are replaced.
pub fn header_value_string(value: &HeaderValue) -> String {
    String::from_utf8_lossy(value.as_bytes()).into_owned()
}

/// All values of `name`, joined with `", "` in the order they were received.
pub fn combined_value(headers: &HeaderMap, name: &HeaderName) -> Option<String> {
    let values: Vec<String> = headers.get_all(name).iter().map(header_value_string).collect();
    if values.is_empty() {
        None
    } else {
        Some(values.join(", "))
    }
}

/// Extracts the declared content length.
///
/// Repeated values (as separate headers or comma separated) must all be identical, otherwise
/// the header is ambiguous. An absent, empty or non-numeric value yields `Ok(None)`.
pub fn content_length(headers: &HeaderMap) -> Result<Option<u64>, HeaderError> {
    let Some(raw) = combined_value(headers, &CONTENT_LENGTH) else {
        return Ok(None);
    };

    let mut candidate: Option<&str> = None;
    for value in raw.split(',').map(str::trim) {
        match candidate {
            None => candidate = Some(value),
            Some(seen) if seen == value => {}
            Some(_) => return Err(HeaderError::Ambiguous("content-length", raw.clone())),
        }
    }

    match candidate {
        Some(value) if !value.is_empty() => Ok(value.parse::<u64>().ok()),
        _ => Ok(None),
    }
}

/// A parsed MIME type: `type/subtype` plus its parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MimeType {
    essence: String,
    parameters: Vec<(String, String)>,
}

pub const OCTET_STREAM: &str = "application/octet-stream";

impl MimeType {
    /// Parses `type/subtype *(";" name "=" value)`. Type and subtype are lowercased, values may
    /// be quoted. Returns `None` when the essence is not a valid `type/subtype` pair.
    pub fn parse(input: &str) -> Option<MimeType> {
        let mut parts = input.split(';');
        let essence = parts.next()?.trim().to_ascii_lowercase();

        let (ty, subtype) = essence.split_once('/')?;
        if !is_token(ty) || !is_token(subtype) {
            return None;
        }

        let mut parameters: Vec<(String, String)> = Vec::new();
        for param in parts {
            let Some((name, value)) = param.split_once('=') else {
                continue;
            };
            let name = name.trim().to_ascii_lowercase();
            let value = value.trim().trim_matches('"').to_string();
            if !is_token(&name) || parameters.iter().any(|(n, _)| *n == name) {
                continue;
            }
            parameters.push((name, value));
        }

        Some(MimeType { essence, parameters })
    }

    /// The generic binary type used when an override cannot be parsed.
    pub fn octet_stream() -> MimeType {
        MimeType {
            essence: OCTET_STREAM.to_string(),
            parameters: Vec::new(),
        }
    }

    pub fn essence(&self) -> &str {
        &self.essence
    }

    pub fn parameter(&self, name: &str) -> Option<&str> {
        self.parameters
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn charset(&self) -> Option<&str> {
        self.parameter("charset").filter(|cs| !cs.is_empty())
    }

    pub fn is_html(&self) -> bool {
        is_html_essence(&self.essence)
    }

    pub fn is_xml(&self) -> bool {
        is_xml_essence(&self.essence)
    }
}

impl Display for MimeType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.essence)?;
        for (name, value) in &self.parameters {
            write!(f, ";{name}={value}")?;
        }
        Ok(())
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

pub fn is_html_essence(essence: &str) -> bool {
    essence == "text/html"
}

pub fn is_xml_essence(essence: &str) -> bool {
    essence.ends_with("+xml") || essence == "text/xml" || essence == "application/xml"
}

/// MIME type announced by the response headers.
///
/// `Content-Type` is split on commas and the last value whose essence is not `*/*` wins.
/// Returns `None` when the header is missing or no candidate parses.
pub fn response_mime_type(headers: &HeaderMap) -> Option<MimeType> {
    let raw = combined_value(headers, &CONTENT_TYPE)?;

    raw.split(',')
        .filter(|candidate| {
            let essence = candidate.split(';').next().unwrap_or("").trim();
            essence != "*/*"
        })
        .filter_map(MimeType::parse)
        .last()
}
