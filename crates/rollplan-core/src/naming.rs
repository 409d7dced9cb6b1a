//! Object name shortening.
//!
//! Stored plan records are addressed by names built from cluster and machine
//! identifiers, which can outgrow the 63-character limit Kubernetes and most
//! object stores impose on a single name segment.

use sha2::{Digest, Sha256};

const HASH_LENGTH: usize = 6;

/// Join `parts` with `-`, shortening to at most `max_length` bytes.
///
/// Names that fit are returned unchanged. Longer names keep a prefix and end
/// in a digest of the full name so that distinct long names stay distinct.
pub fn safe_concat_name(max_length: usize, parts: &[&str]) -> String {
    if max_length == 0 {
        return String::new();
    }

    let full = parts.join("-");
    if full.len() <= max_length {
        return full;
    }

    if max_length < HASH_LENGTH {
        return truncate(&full, max_length).to_string();
    }

    let digest = hex::encode(Sha256::digest(full.as_bytes()));
    let prefix = truncate(&full, max_length - HASH_LENGTH);

    match prefix.chars().last() {
        None => digest[..HASH_LENGTH - 1].to_string(),
        Some(c) if c.is_ascii_lowercase() || c.is_ascii_digit() => {
            format!("{prefix}-{}", &digest[..HASH_LENGTH - 1])
        }
        // A dangling separator or symbol absorbs the dash slot.
        Some(_) => format!("{prefix}{}", &digest[..HASH_LENGTH]),
    }
}

fn truncate(s: &str, max: usize) -> &str {
    let mut end = max.min(s.len());
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}
