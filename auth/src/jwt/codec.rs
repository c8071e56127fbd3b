use chrono::Duration;
use chrono::Utc;
use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;

use super::claims::Claims;
use super::errors::TokenError;
use crate::role::Role;

/// Bearer token codec.
///
/// Issues and verifies HS256-signed tokens carrying [`Claims`]. Tokens are
/// stateless: validity depends only on the signature and the expiry claim.
#[derive(Clone)]
pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    validation: Validation,
}

impl TokenCodec {
    /// Create a new codec with a secret key.
    ///
    /// # Arguments
    /// * `secret` - Secret key for signing tokens
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Supply it through configuration, never in code
    pub fn new(secret: &[u8]) -> Self {
        let algorithm = Algorithm::HS256;

        let mut validation = Validation::new(algorithm);
        // Expiry is checked by `verify_at` so the boundary is exact and clock injectable
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.required_spec_claims.clear();

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm,
            validation,
        }
    }

    /// Issue a token for `subject` valid for `ttl` from now.
    ///
    /// # Errors
    /// * `EncodingFailed` - Non-positive lifetime or signing failure
    pub fn issue(
        &self,
        subject: impl ToString,
        role: Role,
        ttl: Duration,
    ) -> Result<String, TokenError> {
        self.issue_at(subject, role, ttl, Utc::now().timestamp())
    }

    /// Issue a token as if the current time were `issued_at` (Unix seconds).
    pub fn issue_at(
        &self,
        subject: impl ToString,
        role: Role,
        ttl: Duration,
        issued_at: i64,
    ) -> Result<String, TokenError> {
        if ttl <= Duration::zero() {
            return Err(TokenError::EncodingFailed(
                "token lifetime must be positive".to_string(),
            ));
        }

        self.encode(&Claims::new(subject, role, issued_at, ttl))
    }

    /// Sign an already built claim set.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode(&self, claims: &Claims) -> Result<String, TokenError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| TokenError::EncodingFailed(e.to_string()))
    }

    /// Verify a token against the current time.
    ///
    /// # Errors
    /// * `Malformed` - Token is not a decodable JWT carrying our claims
    /// * `SignatureInvalid` - Signature does not match the payload
    /// * `Expired` - Current time is at or past the expiry claim
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// Verify a token as if the current time were `now` (Unix seconds).
    ///
    /// The signature is checked before any claim is looked at.
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let token_data =
            decode::<Claims>(token, &self.decoding_key, &self.validation).map_err(classify)?;

        let claims = token_data.claims;
        if claims.is_expired(now) {
            return Err(TokenError::Expired);
        }

        Ok(claims)
    }
}

fn classify(error: jsonwebtoken::errors::Error) -> TokenError {
    match error.kind() {
        ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => TokenError::SignatureInvalid,
        ErrorKind::ExpiredSignature => TokenError::Expired,
        _ => TokenError::Malformed(error.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &[u8] = b"my_secret_key_at_least_32_bytes_long!";

    fn flip_char(token: &str, index: usize) -> String {
        let mut bytes = token.as_bytes().to_vec();
        bytes[index] = if bytes[index] == b'A' { b'B' } else { b'A' };
        String::from_utf8(bytes).unwrap()
    }

    #[test]
    fn test_issue_and_verify() {
        let codec = TokenCodec::new(SECRET);

        let token = codec
            .issue("user123", Role::Admin, Duration::hours(1))
            .expect("Failed to issue token");
        assert_eq!(token.split('.').count(), 3);

        let claims = codec.verify(&token).expect("Failed to verify token");
        assert_eq!(claims.sub, "user123");
        assert_eq!(claims.role, Role::Admin);
        assert_eq!(claims.exp - claims.iat, 3600);
    }

    #[test]
    fn test_expiry_boundary() {
        let codec = TokenCodec::new(SECRET);
        let token = codec
            .issue_at("user123", Role::User, Duration::seconds(60), 1_000)
            .unwrap();

        assert!(codec.verify_at(&token, 1_000).is_ok());
        assert!(codec.verify_at(&token, 1_059).is_ok());
        assert_eq!(codec.verify_at(&token, 1_060), Err(TokenError::Expired));
        assert_eq!(codec.verify_at(&token, 5_000), Err(TokenError::Expired));
    }

    #[test]
    fn test_verify_expired_token_against_wall_clock() {
        let codec = TokenCodec::new(SECRET);
        let two_hours_ago = Utc::now().timestamp() - 7_200;
        let token = codec
            .issue_at("user123", Role::User, Duration::hours(1), two_hours_ago)
            .unwrap();

        assert_eq!(codec.verify(&token), Err(TokenError::Expired));
    }

    #[test]
    fn test_issue_rejects_non_positive_ttl() {
        let codec = TokenCodec::new(SECRET);

        assert!(matches!(
            codec.issue("user123", Role::User, Duration::zero()),
            Err(TokenError::EncodingFailed(_))
        ));
    }

    #[test]
    fn test_verify_garbage_is_malformed() {
        let codec = TokenCodec::new(SECRET);

        assert!(matches!(
            codec.verify("invalid.token.here"),
            Err(TokenError::Malformed(_))
        ));
        assert!(matches!(codec.verify(""), Err(TokenError::Malformed(_))));
        assert!(matches!(
            codec.verify("no-dots-at-all"),
            Err(TokenError::Malformed(_))
        ));
    }

    #[test]
    fn test_verify_with_wrong_secret() {
        let codec1 = TokenCodec::new(b"secret1_at_least_32_bytes_long_key!");
        let codec2 = TokenCodec::new(b"secret2_at_least_32_bytes_long_key!");

        let token = codec1
            .issue("user123", Role::Admin, Duration::hours(1))
            .unwrap();

        assert_eq!(codec2.verify(&token), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_tampered_signature_is_rejected() {
        let codec = TokenCodec::new(SECRET);
        let token = codec
            .issue("user123", Role::User, Duration::hours(1))
            .unwrap();

        let signature_start = token.rfind('.').unwrap() + 1;
        let tampered = flip_char(&token, signature_start + 5);

        assert_eq!(codec.verify(&tampered), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_tampered_payload_is_rejected() {
        let codec = TokenCodec::new(SECRET);
        let token = codec
            .issue("user123", Role::User, Duration::hours(1))
            .unwrap();

        let payload_start = token.find('.').unwrap() + 1;
        for offset in 0..8 {
            let tampered = flip_char(&token, payload_start + offset);
            let result = codec.verify(&tampered);
            assert!(
                matches!(
                    result,
                    Err(TokenError::SignatureInvalid) | Err(TokenError::Malformed(_))
                ),
                "tampered token was accepted: {:?}",
                result
            );
        }
    }

    #[test]
    fn test_forged_role_is_rejected() {
        let codec = TokenCodec::new(SECRET);
        let token = codec
            .issue("user123", Role::User, Duration::hours(1))
            .unwrap();

        // Re-sign an escalated claim set with a different key and splice it in
        let forger = TokenCodec::new(b"attacker_key_at_least_32_bytes_long!");
        let mut claims = codec.verify(&token).unwrap();
        claims.role = Role::Admin;
        let forged = forger.encode(&claims).unwrap();

        let original_signature = token.rsplit('.').next().unwrap();
        let forged_body = forged.rsplitn(2, '.').nth(1).unwrap();
        let spliced = format!("{}.{}", forged_body, original_signature);

        assert_eq!(codec.verify(&spliced), Err(TokenError::SignatureInvalid));
    }

    #[test]
    fn test_token_without_role_is_malformed() {
        #[derive(serde::Serialize)]
        struct Partial {
            sub: String,
            exp: i64,
        }

        let codec = TokenCodec::new(SECRET);
        let token = encode(
            &Header::new(Algorithm::HS256),
            &Partial {
                sub: "user123".to_string(),
                exp: Utc::now().timestamp() + 60,
            },
            &EncodingKey::from_secret(SECRET),
        )
        .unwrap();

        assert!(matches!(codec.verify(&token), Err(TokenError::Malformed(_))));
    }
}
