//! URL slugs for entity ids.
//!
//! A UUID is written in URLs as the 22-character unpadded URL-safe base64 of
//! its 16 bytes, e.g. `ba4a2a49-2b66-4a54-a7d5-e19b6a1d5a1f` becomes
//! `ukoqSStmSlSn1eGbah1aHw`.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use uuid::Uuid;

use crate::error::{Result, RouterError};

pub const SLUG_LEN: usize = 22;

pub fn encode_id(id: &Uuid) -> String {
    URL_SAFE_NO_PAD.encode(id.as_bytes())
}

pub fn decode_id(slug: &str) -> Result<Uuid> {
    let invalid = || RouterError::InvalidSlug {
        value: slug.to_string(),
    };

    if slug.len() != SLUG_LEN {
        return Err(invalid());
    }

    let bytes = URL_SAFE_NO_PAD.decode(slug).map_err(|_| invalid())?;
    Uuid::from_slice(&bytes).map_err(|_| invalid())
}

/// Encode `id` when it is a UUID, otherwise return it unchanged.
pub fn encode_if_uuid(id: &str) -> String {
    match Uuid::parse_str(id) {
        Ok(uuid) => encode_id(&uuid),
        Err(_) => id.to_string(),
    }
}
