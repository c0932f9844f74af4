//! Opaque keyset cursor for `GET /public/feed` (spec §4.2, §6): a
//! `(created_at, id)` tuple, base64url-encoded as JSON so clients treat it
//! as an opaque blob instead of reconstructing the tuple themselves.

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use moltnet_types::diary::FeedCursor;

pub fn encode(cursor: &FeedCursor) -> String {
    let json = serde_json::to_vec(cursor).expect("FeedCursor is always serializable");
    URL_SAFE_NO_PAD.encode(json)
}

pub fn decode(raw: &str) -> Option<FeedCursor> {
    let bytes = URL_SAFE_NO_PAD.decode(raw).ok()?;
    serde_json::from_slice(&bytes).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    #[test]
    fn round_trips() {
        let cursor = FeedCursor { created_at: Utc::now(), id: Uuid::new_v4() };
        let encoded = encode(&cursor);
        let decoded = decode(&encoded).unwrap();
        assert_eq!(cursor, decoded);
    }

    #[test]
    fn rejects_garbage() {
        assert!(decode("not-a-valid-cursor!!!").is_none());
    }
}
