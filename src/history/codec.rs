//! Filter/exclusion wire codec.
//!
//! A published payload is either a bare serialized update, or — when some
//! receivers must suppress it — the update prefixed with
//! `-<token>[,<token>...] ` where a token is a player id or the literal
//! GM group marker. Decode anomalies fail open to delivery: suppressing a
//! message a client should have received loses an event, while a
//! harmless duplicate does not.

use crate::constants::FILTER_MARKER;
use crate::constants::GM_FILTER_TOKEN;

/// Prefix `body` with the exclusion token list. An empty filter leaves
/// the body untouched.
pub fn encode_filter(
    filter: &[String],
    body: &str,
) -> String {
    if filter.is_empty() {
        return body.to_string();
    }
    format!("{}{} {}", FILTER_MARKER, filter.join(","), body)
}

/// Split a payload into its exclusion tokens and inner body.
///
/// No leading marker, or a marker with no token/body separator, means no
/// exclusion and the whole payload is the body.
pub fn decode_filter(payload: &str) -> (Vec<String>, &str) {
    let Some(rest) = payload.strip_prefix(FILTER_MARKER) else {
        return (Vec::new(), payload);
    };
    match rest.split_once(' ') {
        Some((tokens, body)) if !tokens.is_empty() => {
            (tokens.split(',').map(str::to_string).collect(), body)
        }
        _ => (Vec::new(), payload),
    }
}

/// Receiver-side suppression: whether this receiver matches any exclusion
/// token.
pub fn filter_excludes(
    filter: &[String],
    player_id: &str,
    is_gm: bool,
) -> bool {
    filter
        .iter()
        .any(|token| token == player_id || (is_gm && token == GM_FILTER_TOKEN))
}
