//! Tests for auth module
//!
//! These tests verify core authentication functionality including:
//! - JWT token creation and validation
//! - Claims structure
//! - Auth payload deserialization

#[cfg(test)]
mod tests {
    use super::super::*;
    use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

    #[test]
    fn test_claims_structure() {
        let claims = models::Claims {
            sub: "test-user-id".to_string(),
            exp: 1234567890,
        };

        assert_eq!(claims.sub, "test-user-id");
        assert_eq!(claims.exp, 1234567890);
    }

    #[test]
    fn test_jwt_encoding_and_decoding() {
        let secret = "test_secret_key";
        let claims = models::Claims {
            sub: "test-user-123".to_string(),
            exp: 9999999999, // Far future
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to encode token");

        let decoded = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        )
        .expect("Failed to decode token");

        assert_eq!(decoded.claims.sub, "test-user-123");
        assert_eq!(decoded.claims.exp, 9999999999);
    }

    #[test]
    fn test_jwt_validation_fails_with_wrong_secret() {
        let secret = "test_secret_key";
        let wrong_secret = "wrong_secret_key";

        let claims = models::Claims {
            sub: "test-user-456".to_string(),
            exp: 9999999999,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to encode token");

        let result = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret(wrong_secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_jwt_validation_fails_when_expired() {
        let secret = "test_secret_key";
        let claims = models::Claims {
            sub: "test-user-789".to_string(),
            exp: 1000, // 1970, long past
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .expect("Failed to encode token");

        let result = decode::<models::Claims>(
            &token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::new(Algorithm::HS256),
        );

        assert!(result.is_err());
    }

    #[test]
    fn test_google_payload_invite_code_optional() {
        let with_code: models::GoogleIdTokenPayload =
            serde_json::from_str(r#"{"id_token": "abc", "invite_code": "WELCOME1"}"#)
                .expect("payload with invite code should deserialize");
        assert_eq!(with_code.invite_code.as_deref(), Some("WELCOME1"));

        let without_code: models::GoogleIdTokenPayload =
            serde_json::from_str(r#"{"id_token": "abc"}"#)
                .expect("payload without invite code should deserialize");
        assert!(without_code.invite_code.is_none());
    }
}
