//! Request parsing: params, search and body extraction with
//! content-type-driven dispatch and scalar coercion.
//!
//! Leniency is deliberate: a syntax-level failure on a supported body kind
//! (malformed JSON, empty urlencoded payload, broken multipart) degrades to
//! an empty body rather than failing the request. Present-but-unsupported
//! content types are a 422 — the parser refuses to guess.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use bytes::Bytes;
use encoding_rs::{Encoding, UTF_8};
use futures::executor::block_on;
use futures::stream;
use http::Method;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::error::HttpError;
use crate::model::{SchemaKind, Validator};
use crate::request::RawRequest;

/// Bodies under this size are read as UTF-8 directly; larger ones go
/// through charset-aware decoding to avoid assuming the common case.
const TEXT_DIRECT_READ_LIMIT: usize = 1024 * 1024;

static NUMERIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^-?\d+(\.\d+)?$").expect("Failed to compile numeric pattern"));

/// Coerce a raw string into a typed scalar: integer-or-decimal strings
/// become numbers, case-insensitive `true`/`false` become booleans,
/// anything else stays a string. Never applied to JSON values, which carry
/// their own types.
#[must_use]
pub fn coerce_scalar(value: &str) -> Value {
    if value.trim().is_empty() {
        return Value::String(String::new());
    }

    if NUMERIC.is_match(value) {
        if let Ok(int) = value.parse::<i64>() {
            return Value::from(int);
        }
        if let Ok(float) = value.parse::<f64>() {
            return Value::from(float);
        }
    }

    if value.eq_ignore_ascii_case("true") {
        return Value::Bool(true);
    }
    if value.eq_ignore_ascii_case("false") {
        return Value::Bool(false);
    }

    Value::String(value.to_string())
}

/// Accumulate repeated keys: the first repeat turns the entry into a
/// two-element array, further repeats append.
pub(crate) fn append_entry(map: &mut Map<String, Value>, key: &str, value: Value) {
    match map.get_mut(key) {
        None => {
            map.insert(key.to_string(), value);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let first = existing.take();
            *existing = Value::Array(vec![first, value]);
        }
    }
}

fn run_validator(
    value: Value,
    validator: Option<&Validator>,
    kind: SchemaKind,
) -> Result<Value, HttpError> {
    match validator {
        None => Ok(value),
        Some(validator) => validator
            .validate(&value)
            .map_err(|issues| HttpError::validation(kind, issues)),
    }
}

/// Path params: walk template and request segments pairwise, assigning each
/// `:name` the decoded, coerced request segment. Only runs when the
/// template carries a parameter.
pub(crate) fn parse_params(
    template: &str,
    pathname: &str,
    validator: Option<&Validator>,
) -> Result<Value, HttpError> {
    if !template.contains(':') {
        return Ok(json!({}));
    }

    let request_parts: Vec<&str> = pathname.split('/').collect();
    let mut data = Map::new();

    for (i, def_part) in template.split('/').enumerate() {
        let Some(name) = def_part.strip_prefix(':') else {
            continue;
        };
        let Some(request_part) = request_parts.get(i) else {
            continue;
        };
        let decoded = urlencoding::decode(request_part)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| (*request_part).to_string());
        data.insert(name.to_string(), coerce_scalar(&decoded));
    }

    run_validator(Value::Object(data), validator, SchemaKind::Params)
}

/// Query string params, coerced, with repeated-key accumulation.
pub(crate) fn parse_search(
    query: Option<&str>,
    validator: Option<&Validator>,
) -> Result<Value, HttpError> {
    let mut data = Map::new();

    if let Some(query) = query {
        for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
            append_entry(&mut data, &key, coerce_scalar(&value));
        }
    }

    run_validator(Value::Object(data), validator, SchemaKind::Search)
}

/// Normalized body kind, dispatched on method and `Content-Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ContentKind {
    NoBody,
    NoHeader,
    Json,
    FormUrlEncoded,
    FormData,
    Text,
    Unsupported,
}

fn normalize_content_kind(req: &RawRequest) -> ContentKind {
    // These methods never carry a body; headers are irrelevant.
    if req.method == Method::GET
        || req.method == Method::HEAD
        || req.method == Method::OPTIONS
        || req.method == Method::TRACE
        || req.method == Method::CONNECT
    {
        return ContentKind::NoBody;
    }

    let content_type = match req.content_type() {
        Some(value) if !value.trim().is_empty() => value,
        _ => return ContentKind::NoHeader,
    };

    if content_type.contains("application/json") {
        ContentKind::Json
    } else if content_type.contains("application/x-www-form-urlencoded") {
        ContentKind::FormUrlEncoded
    } else if content_type.contains("multipart/form-data") {
        ContentKind::FormData
    } else if content_type.contains("text/plain") {
        ContentKind::Text
    } else {
        // xml, binary, pdf, image, audio, video and anything unrecognized:
        // the parser refuses to guess.
        ContentKind::Unsupported
    }
}

/// Extract and validate the request body, dispatching on method and
/// `Content-Type`.
pub(crate) fn parse_body(
    req: &RawRequest,
    validator: Option<&Validator>,
) -> Result<Value, HttpError> {
    match normalize_content_kind(req) {
        // No body expected (or none declared): empty object, no parsing,
        // no validation.
        ContentKind::NoBody | ContentKind::NoHeader => Ok(json!({})),
        ContentKind::Json => match serde_json::from_slice::<Value>(&req.body) {
            Ok(value) => run_validator(value, validator, SchemaKind::Body),
            Err(err) => {
                debug!(error = %err, "JSON body parse failed, treating as empty");
                Ok(json!({}))
            }
        },
        ContentKind::FormUrlEncoded => {
            let text = String::from_utf8_lossy(&req.body);
            if text.trim().is_empty() {
                // An empty urlencoded payload is a parse failure, swallowed
                // like any other syntax error.
                debug!("Empty urlencoded body, treating as empty");
                return Ok(json!({}));
            }
            let mut data = Map::new();
            for (key, value) in url::form_urlencoded::parse(text.as_bytes()) {
                append_entry(&mut data, &key, coerce_scalar(&value));
            }
            run_validator(Value::Object(data), validator, SchemaKind::Body)
        }
        ContentKind::FormData => {
            let content_type = req.content_type().unwrap_or_default();
            match parse_multipart(&req.body, content_type) {
                Ok(data) => run_validator(data, validator, SchemaKind::Body),
                Err(err) => {
                    debug!(error = %err, "Multipart body parse failed, treating as empty");
                    Ok(json!({}))
                }
            }
        }
        ContentKind::Text => {
            let text = decode_text_body(req);
            run_validator(coerce_scalar(&text), validator, SchemaKind::Body)
        }
        ContentKind::Unsupported => Err(HttpError::UnsupportedContentType),
    }
}

/// Small text bodies read directly as UTF-8; larger ones decode through the
/// charset named in `Content-Type` (default UTF-8).
fn decode_text_body(req: &RawRequest) -> String {
    if !req.body.is_empty() && req.body.len() < TEXT_DIRECT_READ_LIMIT {
        return String::from_utf8_lossy(&req.body).into_owned();
    }

    let encoding = req
        .content_type()
        .and_then(|ct| ct.parse::<mime::Mime>().ok())
        .and_then(|m| m.get_param(mime::CHARSET).map(|c| c.to_string()))
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .unwrap_or(UTF_8);

    let (decoded, _, _) = encoding.decode(&req.body);
    decoded.into_owned()
}

/// Multipart fields: non-file fields are coerced like form values, file
/// fields pass through untouched as
/// `{filename, content_type, content (base64)}` objects.
///
/// The body is already buffered, so the multer stream resolves without a
/// reactor; `block_on` never parks.
fn parse_multipart(body: &[u8], content_type: &str) -> Result<Value, multer::Error> {
    let boundary = multer::parse_boundary(content_type)?;
    let payload = Bytes::copy_from_slice(body);
    let body_stream = stream::once(async move { Ok::<Bytes, std::io::Error>(payload) });
    let mut multipart = multer::Multipart::new(body_stream, boundary);

    let mut data = Map::new();
    block_on(async {
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            let filename = field.file_name().map(str::to_string);
            let field_content_type = field.content_type().map(ToString::to_string);
            let bytes = field.bytes().await?;

            match filename {
                Some(filename) => {
                    data.insert(
                        name,
                        json!({
                            "filename": filename,
                            "content_type": field_content_type,
                            "content": BASE64.encode(&bytes),
                        }),
                    );
                }
                None => {
                    let text = String::from_utf8_lossy(&bytes);
                    append_entry(&mut data, &name, coerce_scalar(&text));
                }
            }
        }
        Ok::<(), multer::Error>(())
    })?;

    Ok(Value::Object(data))
}
