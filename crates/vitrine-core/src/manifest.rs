//! # Manifest Codec
//!
//! Converts between the ordered list of [`ArtifactRecord`]s and its two
//! on-the-wire forms:
//!
//! - **Transport form** ([`EncodedContent`]): what the store's contents API
//!   accepts and returns. Produced by [`encode`], consumed by [`decode`].
//! - **Plain JSON**: what the raw-content host serves on the public read
//!   path. Consumed by [`decode_json`].
//!
//! The JSON document is a pretty-printed array (two-space indent, trailing
//! newline), newest record first. Round-trip law: `decode(encode(x)) == x`
//! for any records, including arbitrary Unicode text.

use crate::error::CodecError;
use crate::record::ArtifactRecord;
use crate::transport::EncodedContent;

/// Canonical JSON bytes of a manifest.
pub fn to_json(records: &[ArtifactRecord]) -> Result<Vec<u8>, CodecError> {
    let mut bytes = serde_json::to_vec_pretty(records)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Encode a manifest for the store's write API.
pub fn encode(records: &[ArtifactRecord]) -> Result<EncodedContent, CodecError> {
    Ok(EncodedContent::from_bytes(&to_json(records)?))
}

/// Decode a manifest returned by the store's read API.
pub fn decode(content: &EncodedContent) -> Result<Vec<ArtifactRecord>, CodecError> {
    let bytes = content.decode()?;
    decode_json(&bytes)
}

/// Decode plain manifest JSON.
pub fn decode_json(bytes: &[u8]) -> Result<Vec<ArtifactRecord>, CodecError> {
    Ok(serde_json::from_slice(bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::temporal::{MAX_UNIX_MILLIS, MIN_UNIX_MILLIS};
    use crate::{ArtifactId, ArtifactMetadata, Timestamp};
    use proptest::prelude::*;

    fn record(id: &str, title: &str) -> ArtifactRecord {
        ArtifactRecord::new(
            ArtifactId::new(id).unwrap(),
            format!("https://raw.example.test/images/{id}.png"),
            ArtifactMetadata {
                title: title.to_string(),
                description: String::new(),
                medium: String::new(),
                tags: Vec::new(),
            },
            Timestamp::from_unix_millis(1_768_478_400_000).unwrap(),
        )
    }

    #[test]
    fn empty_manifest_is_an_empty_array() {
        let json = to_json(&[]).unwrap();
        assert_eq!(json, b"[]\n");
        assert!(decode(&encode(&[]).unwrap()).unwrap().is_empty());
    }

    #[test]
    fn preserves_order() {
        let records = vec![record("b", "second"), record("a", "first")];
        let decoded = decode(&encode(&records).unwrap()).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn unicode_fields_round_trip() {
        let mut r = record("u", "夜の東京 🌃");
        r.description = "Ölgemälde, «naïve» — ⅓ größer; עברית; ✨".to_string();
        r.medium = "墨".to_string();
        r.tags = vec!["🎨".to_string(), "Ελληνικά".to_string()];
        let decoded = decode(&encode(&[r.clone()]).unwrap()).unwrap();
        assert_eq!(decoded, vec![r]);
    }

    #[test]
    fn decodes_store_wrapped_content() {
        let records = vec![record("a", "A")];
        let encoded = encode(&records).unwrap();
        let wrapped: String = encoded
            .as_str()
            .as_bytes()
            .chunks(60)
            .map(|c| format!("{}\n", std::str::from_utf8(c).unwrap()))
            .collect();
        let decoded = decode(&EncodedContent::from_wire(wrapped)).unwrap();
        assert_eq!(decoded, records);
    }

    #[test]
    fn malformed_json_is_a_codec_error() {
        let content = EncodedContent::from_bytes(b"{ not json");
        assert!(matches!(decode(&content), Err(CodecError::Json(_))));
    }

    #[test]
    fn json_object_instead_of_array_is_a_codec_error() {
        assert!(matches!(
            decode_json(br#"{"id":"a"}"#),
            Err(CodecError::Json(_))
        ));
    }

    #[test]
    fn bad_transport_is_a_codec_error() {
        let content = EncodedContent::from_wire("%%%");
        assert!(matches!(decode(&content), Err(CodecError::Transport(_))));
    }

    fn arb_record() -> impl Strategy<Value = ArtifactRecord> {
        (
            "[a-z0-9-]{1,36}",
            any::<String>(),
            any::<String>(),
            any::<String>(),
            any::<String>(),
            prop::collection::vec(any::<String>(), 0..6),
            MIN_UNIX_MILLIS..=MAX_UNIX_MILLIS,
        )
            .prop_map(|(id, locator, title, description, medium, tags, ms)| ArtifactRecord {
                id: ArtifactId::new(id).unwrap(),
                locator,
                title,
                description,
                medium,
                tags,
                created_at: Timestamp::from_unix_millis(ms).unwrap(),
            })
    }

    proptest! {
        /// decode(encode(x)) == x for arbitrary Unicode content.
        #[test]
        fn round_trip(records in prop::collection::vec(arb_record(), 0..8)) {
            let decoded = decode(&encode(&records).unwrap()).unwrap();
            prop_assert_eq!(decoded, records);
        }

        /// The public JSON form decodes to the same records as the transport form.
        #[test]
        fn json_and_transport_agree(records in prop::collection::vec(arb_record(), 0..4)) {
            let from_json = decode_json(&to_json(&records).unwrap()).unwrap();
            prop_assert_eq!(from_json, records);
        }
    }
}
