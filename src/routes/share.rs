//! `/api/share`: the shareable link for the live timeline.

use serde_json::json;

use crate::codec;
use crate::error::EncodeError;
use crate::routes::util::{error_json, get_param, ok_json, parse_query};
use crate::session;

/// `?base={location.origin + pathname}`. Without a base only the `v1:` link
/// is returned.
pub fn handle_get(query: &str) -> String {
    let params = parse_query(query);
    let base = get_param(&params, "base").filter(|b| !b.is_empty());
    let result = session::with_session(|s| {
        let link = codec::encode(&s.timeline)?;
        let url = base.map(|b| codec::share_url(b, &s.timeline)).transpose()?;
        Ok::<_, EncodeError>((link, url))
    });
    match result {
        Ok((link, url)) => ok_json(json!({ "link": link, "url": url })),
        Err(e) => {
            log::warn!("share link failed: {}", e);
            error_json("encode_failed", &e.to_string())
        }
    }
}
