// src/common/id_generator.rs
//! Crockford Base32 ID Generator
//!
//! Generates human-readable, prefixed IDs using Crockford Base32 encoding.
//! Format: PREFIX_XXXXXX (e.g., A_K7NP3X for applications)
//!
//! Benefits:
//! - No ambiguous characters (excludes I, L, O, U)
//! - Case-insensitive
//! - ~1 billion combinations per entity type (32^6)
//! - Easy to read, type, and communicate verbally

use rand::Rng;

/// Crockford Base32 alphabet (excludes I, L, O, U to avoid confusion)
const CROCKFORD_ALPHABET: &[u8; 32] = b"0123456789ABCDEFGHJKMNPQRSTVWXYZ";

/// Entity type prefixes for ID generation
#[derive(Debug, Clone, Copy)]
pub enum EntityPrefix {
    /// User (U_)
    User,
    /// Profile (P_)
    Profile,
    /// Uploaded document (D_)
    Document,
    /// Job application (A_)
    Application,
    /// Mentor message (M_)
    Message,
    /// Invitation (N_)
    Invitation,
}

impl EntityPrefix {
    fn as_char(&self) -> char {
        match self {
            EntityPrefix::User => 'U',
            EntityPrefix::Profile => 'P',
            EntityPrefix::Document => 'D',
            EntityPrefix::Application => 'A',
            EntityPrefix::Message => 'M',
            EntityPrefix::Invitation => 'N',
        }
    }
}

/// Generate a random Crockford Base32 string of the given length
fn random_base32(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| CROCKFORD_ALPHABET[rng.gen_range(0..32)] as char)
        .collect()
}

/// Generate a prefixed ID with the default 6-character random part
pub fn generate_id(prefix: EntityPrefix) -> String {
    generate_id_with_length(prefix, 6)
}

/// Generate a prefixed ID with a custom random-part length
pub fn generate_id_with_length(prefix: EntityPrefix, length: usize) -> String {
    format!("{}_{}", prefix.as_char(), random_base32(length))
}

/// Generate an unprefixed random ID (for invitation codes, filenames, etc.)
pub fn generate_raw_id(length: usize) -> String {
    random_base32(length)
}

/// Generate a User ID (U_XXXXXX)
pub fn generate_user_id() -> String {
    generate_id(EntityPrefix::User)
}

/// Generate a Profile ID (P_XXXXXX)
pub fn generate_profile_id() -> String {
    generate_id(EntityPrefix::Profile)
}

/// Generate a Document ID (D_XXXXXX)
pub fn generate_document_id() -> String {
    generate_id(EntityPrefix::Document)
}

/// Generate an Application ID (A_XXXXXX)
pub fn generate_application_id() -> String {
    generate_id(EntityPrefix::Application)
}

/// Generate a Mentor Message ID (M_XXXXXX)
pub fn generate_message_id() -> String {
    generate_id(EntityPrefix::Message)
}

/// Generate an Invitation ID (N_XXXXXX)
pub fn generate_invitation_id() -> String {
    generate_id(EntityPrefix::Invitation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_generate_id_format() {
        let app_id = generate_application_id();
        assert!(app_id.starts_with("A_"));
        assert_eq!(app_id.len(), 8); // "A_" + 6 chars

        let doc_id = generate_document_id();
        assert!(doc_id.starts_with("D_"));
        assert_eq!(doc_id.len(), 8);
    }

    #[test]
    fn test_crockford_alphabet_only() {
        let id = generate_user_id();
        let random_part = &id[2..]; // Skip "U_"

        for c in random_part.chars() {
            assert!(
                CROCKFORD_ALPHABET.contains(&(c as u8)),
                "Character '{}' not in Crockford alphabet",
                c
            );
        }

        // Verify no ambiguous characters
        assert!(!random_part.contains('I'));
        assert!(!random_part.contains('L'));
        assert!(!random_part.contains('O'));
        assert!(!random_part.contains('U'));
    }

    #[test]
    fn test_uniqueness() {
        let mut ids = HashSet::new();
        for _ in 0..1000 {
            let id = generate_application_id();
            assert!(ids.insert(id), "Duplicate ID generated");
        }
    }

    #[test]
    fn test_all_prefixes() {
        assert!(generate_user_id().starts_with("U_"));
        assert!(generate_profile_id().starts_with("P_"));
        assert!(generate_document_id().starts_with("D_"));
        assert!(generate_application_id().starts_with("A_"));
        assert!(generate_message_id().starts_with("M_"));
        assert!(generate_invitation_id().starts_with("N_"));
    }

    #[test]
    fn test_raw_id() {
        let raw = generate_raw_id(8);
        assert_eq!(raw.len(), 8);
        assert!(!raw.contains('_')); // No prefix separator
    }
}
