/// Password hashing module using salted SHA-256
///
/// Stored credentials are an opaque Base64 blob of `salt || digest`, where the
/// digest is SHA-256 over `password_bytes || salt`.
///
/// # Format
///
/// - **Salt**: 16 bytes from the OS random number generator
/// - **Digest**: 32 bytes (SHA-256)
/// - **Encoding**: standard Base64 of the 48 concatenated bytes
///
/// Every call to [`hash_password`] draws a fresh salt, so hashing the same
/// password twice yields different strings that both verify.
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::password::{hash_password, verify_password};
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("secret1")?;
///
/// assert!(verify_password("secret1", &hash)?);
/// assert!(!verify_password("secret2", &hash)?);
/// # Ok(())
/// # }
/// ```

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use sha2::{Digest, Sha256};

/// Salt length in bytes
pub const SALT_SIZE: usize = 16;

/// Digest length in bytes (SHA-256)
pub const HASH_SIZE: usize = 32;

/// Error type for password hashing operations
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    /// Password was empty or whitespace-only
    #[error("Password must not be empty")]
    EmptyPassword,

    /// Stored hash was empty or whitespace-only
    #[error("Stored password hash must not be empty")]
    EmptyHash,

    /// Stored hash could not be decoded into salt and digest
    #[error("Invalid password hash format: {0}")]
    InvalidHash(String),
}

/// Hashes a password with a fresh random salt
///
/// # Returns
///
/// Base64 encoding of `salt || SHA-256(password || salt)`
///
/// # Errors
///
/// Returns `PasswordError::EmptyPassword` if `password` is empty or only
/// whitespace
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::password::hash_password;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("my_password")?;
/// assert_eq!(hash.len(), 64); // 48 bytes, Base64 encoded
/// # Ok(())
/// # }
/// ```
pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.trim().is_empty() {
        return Err(PasswordError::EmptyPassword);
    }

    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);

    let digest = salted_digest(password.as_bytes(), &salt);

    let mut blob = Vec::with_capacity(SALT_SIZE + HASH_SIZE);
    blob.extend_from_slice(&salt);
    blob.extend_from_slice(&digest);

    Ok(STANDARD.encode(blob))
}

/// Verifies a password against a stored hash
///
/// The leading 16 bytes of the decoded blob are the salt; the digest is
/// recomputed and compared against the trailing 32 bytes in constant time.
///
/// # Returns
///
/// `Ok(true)` only on an exact digest match, `Ok(false)` otherwise
///
/// # Errors
///
/// - `PasswordError::EmptyPassword` / `PasswordError::EmptyHash` for blank input
/// - `PasswordError::InvalidHash` if the blob is not Base64 or not 48 bytes
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    if password.trim().is_empty() {
        return Err(PasswordError::EmptyPassword);
    }
    if stored_hash.trim().is_empty() {
        return Err(PasswordError::EmptyHash);
    }

    let blob = STANDARD
        .decode(stored_hash.trim())
        .map_err(|e| PasswordError::InvalidHash(format!("not valid Base64: {}", e)))?;

    if blob.len() != SALT_SIZE + HASH_SIZE {
        return Err(PasswordError::InvalidHash(format!(
            "expected {} bytes, got {}",
            SALT_SIZE + HASH_SIZE,
            blob.len()
        )));
    }

    let (salt, expected) = blob.split_at(SALT_SIZE);
    let actual = salted_digest(password.as_bytes(), salt);

    Ok(constant_time_eq(&actual, expected))
}

/// SHA-256 over `password || salt`
fn salted_digest(password: &[u8], salt: &[u8]) -> [u8; HASH_SIZE] {
    let mut hasher = Sha256::new();
    hasher.update(password);
    hasher.update(salt);
    let digest = hasher.finalize();

    let mut out = [0u8; HASH_SIZE];
    out.copy_from_slice(&digest);
    out
}

/// Constant-time byte comparison
///
/// Accumulates the XOR of every byte pair so the loop always runs over the
/// full input, regardless of where the slices differ.
///
/// # Example
///
/// ```
/// use taskdesk_shared::auth::password::constant_time_eq;
///
/// assert!(constant_time_eq(b"hello", b"hello"));
/// assert!(!constant_time_eq(b"hello", b"world"));
/// ```
pub fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }

    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_password_layout() {
        let hash = hash_password("test_password_123").expect("Hash should succeed");
        let blob = STANDARD.decode(&hash).expect("Hash should be Base64");

        assert_eq!(blob.len(), SALT_SIZE + HASH_SIZE);
        assert_ne!(hash, "test_password_123");
    }

    #[test]
    fn test_digest_covers_password_then_salt() {
        let hash = hash_password("secret1").unwrap();
        let blob = STANDARD.decode(&hash).unwrap();
        let (salt, digest) = blob.split_at(SALT_SIZE);

        let mut hasher = Sha256::new();
        hasher.update(b"secret1");
        hasher.update(salt);
        assert_eq!(hasher.finalize().as_slice(), digest);
    }

    #[test]
    fn test_hash_password_produces_different_salts() {
        let hash1 = hash_password("same_password").expect("Hash 1 should succeed");
        let hash2 = hash_password("same_password").expect("Hash 2 should succeed");

        assert_ne!(hash1, hash2);
        assert!(verify_password("same_password", &hash1).unwrap());
        assert!(verify_password("same_password", &hash2).unwrap());
    }

    #[test]
    fn test_verify_password_incorrect() {
        let hash = hash_password("correct_password").expect("Hash should succeed");

        let result = verify_password("wrong_password", &hash).expect("Verify should succeed");
        assert!(!result, "Wrong password should not verify");
    }

    #[test]
    fn test_blank_password_rejected() {
        assert!(matches!(hash_password(""), Err(PasswordError::EmptyPassword)));
        assert!(matches!(hash_password("   "), Err(PasswordError::EmptyPassword)));

        let hash = hash_password("password").unwrap();
        assert!(matches!(verify_password("\t", &hash), Err(PasswordError::EmptyPassword)));
    }

    #[test]
    fn test_blank_hash_rejected() {
        assert!(matches!(verify_password("password", " "), Err(PasswordError::EmptyHash)));
    }

    #[test]
    fn test_verify_password_invalid_hash() {
        let result = verify_password("password", "not base64 at all!");
        assert!(matches!(result, Err(PasswordError::InvalidHash(_))));
    }

    #[test]
    fn test_verify_password_truncated_hash() {
        let short = STANDARD.encode([7u8; SALT_SIZE]);
        let result = verify_password("password", &short);
        assert!(matches!(result, Err(PasswordError::InvalidHash(_))));
    }

    #[test]
    fn test_hash_verify_roundtrip() {
        let passwords = vec![
            "simple",
            "with spaces",
            "with-special-chars!@#$%",
            "unicode-密码-パスワード",
        ];

        for password in passwords {
            let hash = hash_password(password).expect("Hash should succeed");
            let verified = verify_password(password, &hash).expect("Verify should succeed");
            assert!(verified, "Password '{}' should verify", password);
        }
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2]));
        assert!(constant_time_eq(&[], &[]));
    }
}
