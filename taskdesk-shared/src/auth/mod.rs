/// Authentication utilities
///
/// This module provides the credential primitives for TaskDesk:
///
/// # Modules
///
/// - [`password`]: Salted SHA-256 password hashing and verification
/// - [`jwt`]: JWT issuance and validation
///
/// # Security Features
///
/// - **Password Hashing**: 16-byte random salt, SHA-256 digest, Base64 storage
/// - **JWT Tokens**: HS256 signing scoped to an issuer and audience
/// - **Constant-time Comparison**: Digest verification never short-circuits
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("user_password")?;
/// assert!(verify_password("user_password", &hash)?);
/// # Ok(())
/// # }
/// ```

pub mod jwt;
pub mod password;
