use blake3::Hasher;

/// Hex BLAKE3 digest of arbitrary bytes.
#[inline]
pub fn hash_hex(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}

/// Content hash of a taxonomy snapshot.
///
/// Fed the canonical JSON of the structural content (every collection plus the ordered
/// leaf keys). Two snapshots hash equal iff they describe the same hierarchy, which is what
/// the leaf-embeddings artifact is checked against.
pub fn hash_taxonomy_structure(canonical_json: &[u8]) -> String {
    let mut hasher = Hasher::new();
    hasher.update(b"taxonomy:v1|");
    hasher.update(canonical_json);
    hasher.finalize().to_hex().to_string()
}

#[inline]
pub fn hash_title(normalized: &str) -> [u8; 32] {
    *blake3::hash(normalized.as_bytes()).as_bytes()
}
