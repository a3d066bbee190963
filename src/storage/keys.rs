//! Key encoding/decoding for RocksDB.
//!
//! Collection names may not contain ':' so keys split unambiguously.

use uuid::Uuid;

/// Encode collection key: collection:{name}
pub fn encode_collection_key(collection: &str) -> Vec<u8> {
    format!("collection:{}", collection).into_bytes()
}

/// Encode document key: doc:{collection}:{uuid}
pub fn encode_document_key(collection: &str, id: Uuid) -> Vec<u8> {
    format!("doc:{}:{}", collection, id).into_bytes()
}

/// Encode document prefix for iteration: doc:{collection}:
pub fn encode_document_prefix(collection: &str) -> Vec<u8> {
    format!("doc:{}:", collection).into_bytes()
}

/// Encode embedding key: emb:{collection}:{uuid}
pub fn encode_embedding_key(collection: &str, id: Uuid) -> Vec<u8> {
    format!("emb:{}:{}", collection, id).into_bytes()
}

/// Check that a collection name is usable in keys.
pub fn is_valid_collection_name(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= 63
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixes_do_not_overlap_collections() {
        let id = Uuid::new_v4();
        let key = encode_document_key("docs2", id);

        assert!(key.starts_with(&encode_document_prefix("docs2")));
        assert!(!key.starts_with(&encode_document_prefix("docs")));
    }

    #[test]
    fn test_collection_names() {
        assert!(is_valid_collection_name("langchain"));
        assert!(is_valid_collection_name("my-docs_v1.2"));
        assert!(!is_valid_collection_name(""));
        assert!(!is_valid_collection_name("a:b"));
        assert!(!is_valid_collection_name(&"x".repeat(64)));
    }
}
