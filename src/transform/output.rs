// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

//! Encoding of a transform result into response body bytes

use base64::Engine as _;
use bytes::Bytes;

use super::TransformResult;

/// Prefix of the inline source map trailer line
pub const SOURCE_MAP_PREFIX: &str = "//# sourceMappingURL=data:application/json;base64,";

/// Render the response body for a transform result
///
/// With a map and `embed_map` set, the body is the code, a newline unless the
/// code already ends with one, then the trailer line. Otherwise it is the code
/// unchanged.
pub fn render_output(result: &TransformResult, embed_map: bool) -> Bytes {
    let map = match (&result.map, embed_map) {
        (Some(map), true) => map,
        _ => return Bytes::from(result.code.clone()),
    };

    let encoded = base64::engine::general_purpose::STANDARD.encode(map.as_bytes());

    let capacity = result.code.len() + SOURCE_MAP_PREFIX.len() + encoded.len() + 2;
    let mut out = String::with_capacity(capacity);
    out.push_str(&result.code);
    if !result.code.ends_with('\n') {
        out.push('\n');
    }
    out.push_str(SOURCE_MAP_PREFIX);
    out.push_str(&encoded);
    out.push('\n');

    Bytes::from(out)
}
