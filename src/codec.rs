//! Shareable link codec.
//!
//! ```text
//! Timeline ─serde_json→ UTF-8 bytes ─zlib→ compressed ─base64url (no pad)→ "v1:" + text
//! ```
//!
//! The zlib stream is what `pako.deflate` writes, so links produced by the
//! browser tool and by this crate are interchangeable. Decoding is total:
//! every failure, at any stage, comes back as `None` and the caller starts
//! from a default timeline instead.

use base64::Engine;
use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, NO_PAD};
use base64::engine::DecodePaddingMode;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use std::io::{Read, Write};

use crate::config;
use crate::error::{DecodeError, EncodeError};
use crate::timeline::model::{Timeline, VERSION};

/// Format tag in front of the encoded payload.
pub const PREFIX: &str = "v1:";
/// The same tag as it appears in `location.hash`.
pub const FRAGMENT_PREFIX: &str = "#v1:";

/// URL-safe alphabet, no padding on output; padded input is still accepted.
const LINK_ENGINE: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    NO_PAD.with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Encode a timeline as `v1:<payload>`, ready to follow a `#`.
pub fn encode(tl: &Timeline) -> Result<String, EncodeError> {
    let json = serde_json::to_vec(tl)?;
    let mut z = ZlibEncoder::new(Vec::with_capacity(json.len() / 2), Compression::default());
    z.write_all(&json)?;
    let compressed = z.finish()?;
    Ok(format!("{}{}", PREFIX, LINK_ENGINE.encode(compressed)))
}

/// Full shareable URL. Any fragment already on `base` is replaced.
pub fn share_url(base: &str, tl: &Timeline) -> Result<String, EncodeError> {
    let base = base.split('#').next().unwrap_or(base);
    Ok(format!("{}#{}", base, encode(tl)?))
}

/// Decode a `v1:<payload>` string.
pub fn decode(encoded: &str) -> Option<Timeline> {
    let max = config::current().max_inflated_bytes;
    match try_decode(encoded, max) {
        Ok(tl) => Some(tl),
        Err(e) => {
            log::warn!("shared timeline not decodable: {}", e);
            None
        }
    }
}

/// Decode a raw `location.hash`. Anything without the exact `#v1:` tag is
/// treated as "no shared timeline".
pub fn decode_fragment(hash: &str) -> Option<Timeline> {
    if !hash.starts_with(FRAGMENT_PREFIX) {
        return None;
    }
    decode(&hash[1..])
}

/// Decode with the failing stage reported.
pub fn try_decode(encoded: &str, max_inflated: usize) -> Result<Timeline, DecodeError> {
    let payload = encoded.strip_prefix(PREFIX).ok_or(DecodeError::Prefix)?;
    let compressed = LINK_ENGINE.decode(payload.trim())?;

    let mut bytes = Vec::new();
    ZlibDecoder::new(compressed.as_slice())
        .take(max_inflated as u64 + 1)
        .read_to_end(&mut bytes)?;
    if bytes.len() > max_inflated {
        return Err(DecodeError::TooLarge(max_inflated));
    }

    let json = String::from_utf8(bytes)?;
    let value: serde_json::Value = serde_json::from_str(&json)?;
    let version = value.get("v").and_then(serde_json::Value::as_u64).unwrap_or(0);
    if version != VERSION as u64 {
        return Err(DecodeError::Version(version));
    }
    let tl: Timeline = serde_json::from_value(value)?;
    tl.check_shape().map_err(DecodeError::Shape)?;
    Ok(tl)
}
