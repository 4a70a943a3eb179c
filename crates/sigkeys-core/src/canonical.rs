//! Specific serialization of statements.
//!
//! A statement has exactly one valid byte encoding: a flat JSON object with
//! keys in the fixed order `.sig`, `data`, `kid`, `nonce`, `prev`, `revoke`,
//! `seq`, `ts`, `type`, no whitespace, and optional fields omitted when they
//! hold their zero value. Byte buffers are standard base64 with padding.
//!
//! The same encoding with `.sig` set to the empty string is the signing
//! input. Because `.sig` always comes first and a 64-byte signature is always
//! 88 base64 characters, the signature sits at a fixed byte offset in the wire
//! form, which lets a parser recover the signed bytes by excising it.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use serde::Deserialize;

use crate::crypto::{Sha256Hash, Signature, SIGNATURE_LENGTH};
use crate::error::{EncodingError, StatementError, VerifyError};
use crate::id::ID;
use crate::statement::Statement;

/// Byte offset of the signature in the wire form: `{".sig":"`.
pub const SIG_OFFSET: usize = 9;

/// Base64 length of a 64-byte signature.
pub const SIG_BASE64_LENGTH: usize = 88;

/// Minimum length of a signed statement.
pub const MIN_STATEMENT_LENGTH: usize = SIG_OFFSET + SIG_BASE64_LENGTH;

const SIG_PREFIX: &[u8] = b"{\".sig\":\"";

/// Wire bytes: the specific serialization with the signature populated.
pub fn statement_bytes(st: &Statement) -> Vec<u8> {
    encode(st, st.sig.as_ref())
}

/// Signing input: the specific serialization with `.sig` empty.
pub fn bytes_to_sign(st: &Statement) -> Vec<u8> {
    encode(st, None)
}

fn encode(st: &Statement, sig: Option<&Signature>) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    buf.push(b'{');

    buf.extend_from_slice(b"\".sig\":\"");
    if let Some(sig) = sig {
        buf.extend_from_slice(STANDARD.encode(sig.as_bytes()).as_bytes());
    }
    buf.push(b'"');

    if !st.data.is_empty() {
        push_base64(&mut buf, "data", &st.data);
    }
    push_string(&mut buf, "kid", st.kid.as_str());
    if !st.nonce.is_empty() {
        push_base64(&mut buf, "nonce", &st.nonce);
    }
    if let Some(prev) = &st.prev {
        push_base64(&mut buf, "prev", prev.as_bytes());
    }
    if st.revoke != 0 {
        push_int(&mut buf, "revoke", st.revoke);
    }
    if st.seq != 0 {
        push_int(&mut buf, "seq", st.seq);
    }
    if st.timestamp != 0 {
        push_int(&mut buf, "ts", st.timestamp);
    }
    if !st.kind.is_empty() {
        push_string(&mut buf, "type", &st.kind);
    }

    buf.push(b'}');
    buf
}

fn push_key(buf: &mut Vec<u8>, key: &str) {
    buf.extend_from_slice(b",\"");
    buf.extend_from_slice(key.as_bytes());
    buf.extend_from_slice(b"\":");
}

fn push_base64(buf: &mut Vec<u8>, key: &str, value: &[u8]) {
    push_key(buf, key);
    buf.push(b'"');
    buf.extend_from_slice(STANDARD.encode(value).as_bytes());
    buf.push(b'"');
}

fn push_string(buf: &mut Vec<u8>, key: &str, value: &str) {
    push_key(buf, key);
    // Display for a JSON string value quotes and escapes it.
    let quoted = serde_json::Value::String(value.to_owned()).to_string();
    buf.extend_from_slice(quoted.as_bytes());
}

fn push_int(buf: &mut Vec<u8>, key: &str, value: impl std::fmt::Display) {
    push_key(buf, key);
    buf.extend_from_slice(value.to_string().as_bytes());
}

/// The JSON shape of a statement on the wire.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct WireStatement {
    #[serde(rename = ".sig")]
    sig: String,
    #[serde(default)]
    data: Option<String>,
    kid: String,
    #[serde(default)]
    nonce: Option<String>,
    #[serde(default)]
    prev: Option<String>,
    #[serde(default)]
    revoke: Option<u64>,
    #[serde(default)]
    seq: Option<u64>,
    #[serde(default)]
    ts: Option<i64>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
}

/// The signing input recovered from wire bytes by excising the signature.
///
/// Returns `None` if the input does not carry a signature at the fixed
/// offset.
pub fn excise_signature(raw: &[u8]) -> Option<Vec<u8>> {
    if raw.len() <= MIN_STATEMENT_LENGTH
        || !raw.starts_with(SIG_PREFIX)
        || raw[MIN_STATEMENT_LENGTH] != b'"'
    {
        return None;
    }
    let mut out = Vec::with_capacity(raw.len() - SIG_BASE64_LENGTH);
    out.extend_from_slice(&raw[..SIG_OFFSET]);
    out.extend_from_slice(&raw[MIN_STATEMENT_LENGTH..]);
    Some(out)
}

/// Parse a signed statement from its wire bytes.
///
/// The result is guaranteed to re-serialize to exactly `raw`. Signature
/// validity is not checked here; see [`Statement::verify`].
pub fn parse_statement(raw: &[u8]) -> Result<Statement, StatementError> {
    if raw.len() < MIN_STATEMENT_LENGTH {
        return Err(EncodingError::TooShort(raw.len()).into());
    }
    if !raw.starts_with(SIG_PREFIX) {
        return Err(EncodingError::MalformedStatement("statement must start with .sig".into()).into());
    }

    let sig_b64 = &raw[SIG_OFFSET..MIN_STATEMENT_LENGTH];
    let sig_bytes = STANDARD
        .decode(sig_b64)
        .map_err(|e| base64_error(".sig", e))?;
    let sig = Signature::from_slice(&sig_bytes)?;

    let wire: WireStatement =
        serde_json::from_slice(raw).map_err(|e| EncodingError::Json(e.to_string()))?;
    if wire.sig.len() != SIG_BASE64_LENGTH {
        return Err(EncodingError::MalformedStatement("signature is not at a fixed offset".into()).into());
    }

    let prev = match wire.prev {
        Some(p) => {
            let bytes = decode_field("prev", &p)?;
            let hash = Sha256Hash::try_from(bytes.as_slice()).map_err(|_| {
                EncodingError::MalformedStatement(format!("prev must be 32 bytes, got {}", bytes.len()))
            })?;
            Some(hash)
        }
        None => None,
    };

    let st = Statement {
        sig: Some(sig),
        data: Bytes::from(decode_optional("data", wire.data)?),
        kid: ID::parse(&wire.kid)?,
        seq: wire.seq.unwrap_or(0),
        prev,
        revoke: wire.revoke.unwrap_or(0),
        kind: wire.kind.unwrap_or_default(),
        timestamp: wire.ts.unwrap_or(0),
        nonce: decode_optional("nonce", wire.nonce)?,
    };

    // Any valid JSON that is not the specific serialization is rejected, so
    // a signature only ever covers the bytes that were transmitted.
    let unsigned = excise_signature(raw).ok_or(VerifyError::SpecificSerializationMismatch)?;
    if unsigned != bytes_to_sign(&st) {
        return Err(VerifyError::SpecificSerializationMismatch.into());
    }

    Ok(st)
}

fn decode_field(field: &'static str, value: &str) -> Result<Vec<u8>, EncodingError> {
    STANDARD.decode(value).map_err(|e| base64_error(field, e))
}

fn decode_optional(field: &'static str, value: Option<String>) -> Result<Vec<u8>, EncodingError> {
    match value {
        Some(v) => decode_field(field, &v),
        None => Ok(Vec::new()),
    }
}

fn base64_error(field: &'static str, err: base64::DecodeError) -> EncodingError {
    EncodingError::Base64 {
        field,
        reason: err.to_string(),
    }
}
