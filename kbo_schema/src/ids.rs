use sha2::{Digest, Sha256};

/// Joins composite-ID components. A control character that cannot appear in any CSV field of
/// this archive format (comma-delimited, double-quoted text), so `"1.2" + "3"` can never
/// collide with `"1" + "2.3"`.
const COMPONENT_SEP: char = '\u{1F}';

/// Number of hex characters kept from the SHA-256 digest of a denomination's text (§3.1, §9).
///
/// Kept as a named constant so that widening it (the open question in §9 — collision
/// probability at ~3M denominations is negligible but non-zero) is a one-line change rather
/// than a scattered one.
pub const DENOMINATION_HASH_HEX_LEN: usize = 8;

fn join(parts: &[&str]) -> String {
    parts.join(&COMPONENT_SEP.to_string())
}

/// An 8-hex-character prefix of the SHA-256 digest of `text`, used to bound the length of
/// denomination composite IDs (§3.1, §4.2).
pub fn short_hash(text: &str) -> String {
    let digest = Sha256::digest(text.as_bytes());
    let hex = hex_encode(&digest);
    hex[..DENOMINATION_HASH_HEX_LEN].to_string()
}

fn hex_encode(bytes: &[u8]) -> String {
    let mut s = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        s.push_str(&format!("{b:02x}"));
    }
    s
}

/// `id = entity_number ⨁ type ⨁ language ⨁ 8-hex-short-hash(denomination)` (§3.1).
pub fn denomination_id(entity_number: &str, type_code: &str, language: &str, denomination: &str) -> String {
    join(&[entity_number, type_code, language, &short_hash(denomination)])
}

/// `id = entity_number ⨁ type_of_address` (§3.1).
pub fn address_id(entity_number: &str, type_of_address: &str) -> String {
    join(&[entity_number, type_of_address])
}

/// `id = entity_number ⨁ group ⨁ version ⨁ code ⨁ classification` (§3.1).
pub fn activity_id(entity_number: &str, group: &str, version: &str, code: &str, classification: &str) -> String {
    join(&[entity_number, group, version, code, classification])
}

/// `id = entity_number ⨁ entity_contact ⨁ type ⨁ value` (§3.1).
pub fn contact_id(entity_number: &str, entity_contact: &str, contact_type: &str, value: &str) -> String {
    join(&[entity_number, entity_contact, contact_type, value])
}

/// `id = entity_number ⨁ branch_number`.
///
/// Branches are the one composite-ID table §3.1 doesn't give an explicit formula for ("Sparse,
/// thousands of rows" is its only note). The source `branch.csv` carries its own natural-key
/// column (renamed `branch_number` by [`crate::csv_column_to_db_column_for_table`] to avoid
/// colliding with this engine's composite `id` column), so the two together form a stable key.
pub fn branch_id(entity_number: &str, branch_number: &str) -> String {
    join(&[entity_number, branch_number])
}
