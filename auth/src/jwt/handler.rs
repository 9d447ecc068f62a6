use jsonwebtoken::decode;
use jsonwebtoken::encode;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::Algorithm;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use jsonwebtoken::Header;
use jsonwebtoken::Validation;
use serde::Deserialize;
use serde::Serialize;

use super::errors::JwtError;

/// JWT token handler for encoding and decoding access tokens.
///
/// Uses HS256 (HMAC with SHA-256) over a single static symmetric key. The key
/// is immutable after construction and the handler is safely shared across
/// concurrent issuances and validations.
pub struct JwtHandler {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    algorithm: Algorithm,
    expected_issuer: Option<String>,
    expected_audience: Option<String>,
}

impl JwtHandler {
    /// Create a new JWT handler with a secret key.
    ///
    /// # Security Notes
    /// - The secret should be at least 256 bits (32 bytes) for HS256
    /// - Store secrets in environment variables or secure vaults, never in code
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            algorithm: Algorithm::HS256,
            expected_issuer: None,
            expected_audience: None,
        }
    }

    /// Require a specific `iss` claim during validation.
    pub fn with_issuer(mut self, issuer: impl ToString) -> Self {
        self.expected_issuer = Some(issuer.to_string());
        self
    }

    /// Require a specific `aud` claim during validation.
    pub fn with_audience(mut self, audience: impl ToString) -> Self {
        self.expected_audience = Some(audience.to_string());
        self
    }

    /// Encode claims into a signed JWT token.
    ///
    /// # Errors
    /// * `EncodingFailed` - Token encoding failed
    pub fn encode<T: Serialize>(&self, claims: &T) -> Result<String, JwtError> {
        let header = Header::new(self.algorithm);

        encode(&header, claims, &self.encoding_key)
            .map_err(|e| JwtError::EncodingFailed(e.to_string()))
    }

    /// Decode and validate a JWT token.
    ///
    /// Verifies the signature, the expiration claim, and the issuer/audience
    /// when the handler was configured to expect them.
    ///
    /// # Errors
    /// * `TokenExpired` - The `exp` claim is in the past
    /// * `InvalidToken` - Signature, issuer, or audience check failed
    /// * `DecodingFailed` - Token is malformed
    pub fn decode<T: for<'de> Deserialize<'de>>(&self, token: &str) -> Result<T, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        if let Some(iss) = &self.expected_issuer {
            validation.set_issuer(&[iss]);
        }
        match &self.expected_audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        let token_data =
            decode::<T>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => JwtError::TokenExpired,
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience
                | ErrorKind::ImmatureSignature => JwtError::InvalidToken(e.to_string()),
                _ => JwtError::DecodingFailed(e.to_string()),
            })?;

        Ok(token_data.claims)
    }

    /// Decode and validate a JWT token, tolerating an expired `exp` claim.
    ///
    /// The signature (and issuer/audience, when expected) is still verified.
    /// This exists for the refresh flow, where an already-expired access token
    /// is inspected so its subject and `jti` can be compared against the
    /// refresh session. Never use the result to grant access directly.
    ///
    /// # Errors
    /// * `InvalidToken` - Signature, issuer, or audience check failed
    /// * `DecodingFailed` - Token is malformed
    pub fn decode_allow_expired<T: for<'de> Deserialize<'de>>(
        &self,
        token: &str,
    ) -> Result<T, JwtError> {
        let mut validation = Validation::new(self.algorithm);
        validation.validate_exp = false;
        if let Some(iss) = &self.expected_issuer {
            validation.set_issuer(&[iss]);
        }
        match &self.expected_audience {
            Some(aud) => validation.set_audience(&[aud]),
            None => validation.validate_aud = false,
        }

        let token_data =
            decode::<T>(token, &self.decoding_key, &validation).map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature
                | ErrorKind::InvalidIssuer
                | ErrorKind::InvalidAudience => JwtError::InvalidToken(e.to_string()),
                _ => JwtError::DecodingFailed(e.to_string()),
            })?;

        Ok(token_data.claims)
    }
}
