/// JWT token generation and validation
///
/// Tokens are HS256-signed and always tied to a server-side session through
/// the `sid` claim. A valid signature is necessary but not sufficient: the
/// auth middleware also checks the session is still active, so signing out
/// invalidates every token issued for the session.
///
/// # Token Types
///
/// - **Access**: Authenticates API requests (24 hours)
/// - **Refresh**: Exchanged for new access tokens (30 days, same as the session)
///
/// # Example
///
/// ```
/// use gearloan_shared::auth::jwt::{create_token, validate_access_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// let secret = "a-secret-key-that-is-at-least-32-bytes";
/// let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), TokenType::Access);
/// let token = create_token(&claims, secret).unwrap();
///
/// let validated = validate_access_token(&token, secret).unwrap();
/// assert_eq!(validated.sid, claims.sid);
/// ```

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Issuer claim of every token
pub const ISSUER: &str = "gearloan";

/// JWT-related errors
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("Failed to create token: {0}")]
    CreateError(String),

    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    #[error("Token has expired")]
    Expired,

    #[error("Invalid issuer")]
    InvalidIssuer,

    #[error("Expected {expected} token, got {actual} token")]
    WrongTokenType {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Token type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    /// Default lifetime of a token of this type
    pub fn default_expiration(&self) -> Duration {
        match self {
            TokenType::Access => Duration::hours(24),
            TokenType::Refresh => Duration::days(30),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }
}

/// Lifetime of a session (matches the refresh token)
pub fn session_lifetime() -> Duration {
    TokenType::Refresh.default_expiration()
}

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID)
    pub sub: Uuid,

    /// Issuer (always "gearloan")
    pub iss: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration (Unix timestamp)
    pub exp: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Session the token belongs to
    pub sid: Uuid,

    pub token_type: TokenType,
}

impl Claims {
    /// Creates claims with the default expiration for `token_type`
    pub fn new(user_id: Uuid, session_id: Uuid, token_type: TokenType) -> Self {
        Self::with_expiration(user_id, session_id, token_type, token_type.default_expiration())
    }

    /// Creates claims expiring `expires_in` from now
    pub fn with_expiration(
        user_id: Uuid,
        session_id: Uuid,
        token_type: TokenType,
        expires_in: Duration,
    ) -> Self {
        let now = Utc::now();

        Self {
            sub: user_id,
            iss: ISSUER.to_string(),
            iat: now.timestamp(),
            exp: (now + expires_in).timestamp(),
            nbf: now.timestamp(),
            sid: session_id,
            token_type,
        }
    }
}

/// Signs claims into a token
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Verifies signature, issuer, expiration and not-before
pub fn validate_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(secret.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[ISSUER]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer,
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

fn validate_typed(token: &str, secret: &str, expected: TokenType) -> Result<Claims, JwtError> {
    let claims = validate_token(token, secret)?;

    if claims.token_type != expected {
        return Err(JwtError::WrongTokenType {
            expected: expected.as_str(),
            actual: claims.token_type.as_str(),
        });
    }

    Ok(claims)
}

/// Validates a token and requires it to be an access token
pub fn validate_access_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Access)
}

/// Validates a token and requires it to be a refresh token
pub fn validate_refresh_token(token: &str, secret: &str) -> Result<Claims, JwtError> {
    validate_typed(token, secret, TokenType::Refresh)
}

/// Issues an access and refresh token pair for a session
pub fn issue_token_pair(
    user_id: Uuid,
    session_id: Uuid,
    secret: &str,
) -> Result<(String, String), JwtError> {
    let access = create_token(&Claims::new(user_id, session_id, TokenType::Access), secret)?;
    let refresh = create_token(&Claims::new(user_id, session_id, TokenType::Refresh), secret)?;
    Ok((access, refresh))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    #[test]
    fn test_token_type_expiration() {
        assert_eq!(TokenType::Access.default_expiration(), Duration::hours(24));
        assert_eq!(TokenType::Refresh.default_expiration(), Duration::days(30));
        assert_eq!(session_lifetime(), Duration::days(30));
    }

    #[test]
    fn test_claims_creation() {
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();

        let claims = Claims::new(user_id, session_id, TokenType::Access);

        assert_eq!(claims.sub, user_id);
        assert_eq!(claims.sid, session_id);
        assert_eq!(claims.iss, "gearloan");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_create_and_validate_token() {
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();

        let token = create_token(&Claims::new(user_id, session_id, TokenType::Access), SECRET)
            .expect("Should create token");

        let validated = validate_token(&token, SECRET).expect("Should validate token");
        assert_eq!(validated.sub, user_id);
        assert_eq!(validated.sid, session_id);
        assert_eq!(validated.token_type, TokenType::Access);
    }

    #[test]
    fn test_validate_with_wrong_secret() {
        let claims = Claims::new(Uuid::new_v4(), Uuid::new_v4(), TokenType::Access);
        let token = create_token(&claims, SECRET).unwrap();

        assert!(validate_token(&token, "another-secret-key-of-32-bytes-len").is_err());
    }

    #[test]
    fn test_validate_expired_token() {
        let claims = Claims::with_expiration(
            Uuid::new_v4(),
            Uuid::new_v4(),
            TokenType::Access,
            Duration::seconds(-3600),
        );

        let token = create_token(&claims, SECRET).unwrap();
        assert!(matches!(validate_token(&token, SECRET), Err(JwtError::Expired)));
    }

    #[test]
    fn test_token_type_is_enforced() {
        let (access, refresh) = issue_token_pair(Uuid::new_v4(), Uuid::new_v4(), SECRET).unwrap();

        assert!(validate_access_token(&access, SECRET).is_ok());
        assert!(validate_refresh_token(&refresh, SECRET).is_ok());

        assert!(matches!(
            validate_access_token(&refresh, SECRET),
            Err(JwtError::WrongTokenType { expected: "access", actual: "refresh" })
        ));
        assert!(matches!(
            validate_refresh_token(&access, SECRET),
            Err(JwtError::WrongTokenType { expected: "refresh", actual: "access" })
        ));
    }

    #[test]
    fn test_token_pair_shares_session() {
        let user_id = Uuid::new_v4();
        let session_id = Uuid::new_v4();
        let (access, refresh) = issue_token_pair(user_id, session_id, SECRET).unwrap();

        let access = validate_access_token(&access, SECRET).unwrap();
        let refresh = validate_refresh_token(&refresh, SECRET).unwrap();
        assert_eq!(access.sid, session_id);
        assert_eq!(refresh.sid, session_id);
        assert_eq!(access.sub, refresh.sub);
    }
}
