/// JWT token generation and validation module
///
/// Tokens are identity assertions for authenticated users. They are signed
/// using HS256 (HMAC-SHA256) and scoped to a configured issuer and audience.
///
/// # Security
///
/// - **Algorithm**: HS256 (HMAC with SHA-256)
/// - **Expiration**: Configurable in hours (default 24)
/// - **Validation**: Signature, expiration, not-before, issuer and audience
/// - **Secret Management**: The signing key is never logged; `JwtConfig`'s
///   `Debug` output redacts it
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::jwt::{JwtConfig, TokenIssuer};
/// use taskdesk_shared::models::user::User;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let issuer = TokenIssuer::new(JwtConfig::new("an-example-secret-of-at-least-32-bytes"));
/// let user = User::new("alice.b", "a@x.com", "hash");
///
/// let token = issuer.issue(&user)?;
/// let claims = issuer.validate(&token)?;
/// assert_eq!(claims.sub, user.id);
/// # Ok(())
/// # }
/// ```

use std::fmt;

use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::models::user::User;

/// Default token lifetime in hours
pub const DEFAULT_EXPIRES_HOURS: i64 = 24;

/// Longest token lifetime a configuration may ask for (one year)
pub const MAX_EXPIRES_HOURS: i64 = 24 * 365;

/// Default `iss` claim
pub const DEFAULT_ISSUER: &str = "taskdesk";

/// Default `aud` claim
pub const DEFAULT_AUDIENCE: &str = "taskdesk-clients";

/// Error type for JWT operations
#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    /// Failed to create token
    #[error("Failed to create token: {0}")]
    CreateError(String),

    /// Failed to validate token
    #[error("Failed to validate token: {0}")]
    ValidationError(String),

    /// Token has expired
    #[error("Token has expired")]
    Expired,

    /// Issuer claim did not match
    #[error("Invalid issuer: expected {expected}")]
    InvalidIssuer { expected: String },

    /// Audience claim did not match
    #[error("Invalid audience: expected {expected}")]
    InvalidAudience { expected: String },
}

/// Token signing configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// Symmetric signing key
    pub secret_key: String,

    /// Token lifetime in hours
    pub expires_hours: i64,

    /// Expected and emitted `iss` claim
    pub issuer: String,

    /// Expected and emitted `aud` claim
    pub audience: String,
}

impl JwtConfig {
    /// Creates a configuration with default lifetime, issuer and audience
    pub fn new(secret_key: impl Into<String>) -> Self {
        Self {
            secret_key: secret_key.into(),
            expires_hours: DEFAULT_EXPIRES_HOURS,
            issuer: DEFAULT_ISSUER.to_string(),
            audience: DEFAULT_AUDIENCE.to_string(),
        }
    }
}

impl fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret_key", &"[REDACTED]")
            .field("expires_hours", &self.expires_hours)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

/// JWT claims structure
///
/// # Standard Claims
///
/// - `sub`: Subject (user ID)
/// - `iss`: Issuer
/// - `aud`: Audience
/// - `iat`: Issued at timestamp
/// - `nbf`: Not before timestamp
/// - `exp`: Expiration timestamp
///
/// # Custom Claims
///
/// - `email`: User email at issuance time
/// - `username`: Username at issuance time
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject - User ID
    pub sub: Uuid,

    /// User email (custom claim)
    pub email: String,

    /// Username (custom claim)
    pub username: String,

    /// Issuer
    pub iss: String,

    /// Audience
    pub aud: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Not before (Unix timestamp)
    pub nbf: i64,

    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Builds claims for `user` valid from now for `config.expires_hours`
    ///
    /// # Errors
    ///
    /// Returns `JwtError::CreateError` if the lifetime is not positive or the
    /// expiration does not fit in a timestamp
    pub fn for_user(user: &User, config: &JwtConfig) -> Result<Self, JwtError> {
        if config.expires_hours <= 0 {
            return Err(JwtError::CreateError(format!(
                "Token lifetime must be positive, got {} hours",
                config.expires_hours
            )));
        }

        let now = Utc::now();
        let expiration = Duration::try_hours(config.expires_hours)
            .and_then(|lifetime| now.checked_add_signed(lifetime))
            .ok_or_else(|| {
                JwtError::CreateError(format!(
                    "Token lifetime of {} hours is out of range",
                    config.expires_hours
                ))
            })?;

        Ok(Self {
            sub: user.id,
            email: user.email.clone(),
            username: user.username.clone(),
            iss: config.issuer.clone(),
            aud: config.audience.clone(),
            iat: now.timestamp(),
            nbf: now.timestamp(),
            exp: expiration.timestamp(),
        })
    }
}

/// Signs claims into a compact JWT
///
/// # Errors
///
/// Returns `JwtError::CreateError` if encoding fails
pub fn create_token(claims: &Claims, secret: &str) -> Result<String, JwtError> {
    let header = Header::new(Algorithm::HS256);
    let key = EncodingKey::from_secret(secret.as_bytes());

    encode(&header, claims, &key)
        .map_err(|e| JwtError::CreateError(format!("Token encoding failed: {}", e)))
}

/// Validates a JWT and extracts its claims
///
/// Verifies:
/// - Signature is valid
/// - Token hasn't expired and is past its nbf time
/// - Issuer and audience match `config`
///
/// # Errors
///
/// - `JwtError::Expired` when `exp` has passed
/// - `JwtError::InvalidIssuer` / `JwtError::InvalidAudience` on a claim mismatch
/// - `JwtError::ValidationError` for a bad signature or malformed token
pub fn validate_token(token: &str, config: &JwtConfig) -> Result<Claims, JwtError> {
    let key = DecodingKey::from_secret(config.secret_key.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[config.issuer.as_str()]);
    validation.set_audience(&[config.audience.as_str()]);
    validation.validate_exp = true;
    validation.validate_nbf = true;

    let token_data = decode::<Claims>(token, &key, &validation).map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::Expired,
        jsonwebtoken::errors::ErrorKind::InvalidIssuer => JwtError::InvalidIssuer {
            expected: config.issuer.clone(),
        },
        jsonwebtoken::errors::ErrorKind::InvalidAudience => JwtError::InvalidAudience {
            expected: config.audience.clone(),
        },
        _ => JwtError::ValidationError(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}

/// Issues and validates access tokens for one signing configuration
#[derive(Debug, Clone)]
pub struct TokenIssuer {
    config: JwtConfig,
}

impl TokenIssuer {
    pub fn new(config: JwtConfig) -> Self {
        Self { config }
    }

    /// Issues a signed token asserting `user`'s identity
    ///
    /// Logs the issuance with the user's email; the key is never logged.
    pub fn issue(&self, user: &User) -> Result<String, JwtError> {
        let claims = Claims::for_user(user, &self.config)?;
        let token = create_token(&claims, &self.config.secret_key)?;

        info!(
            user_id = %user.id,
            email = %user.email,
            "User {} authenticated successfully",
            user.email
        );

        Ok(token)
    }

    /// Validates a token issued under this configuration
    pub fn validate(&self, token: &str) -> Result<Claims, JwtError> {
        validate_token(token, &self.config)
    }
}
