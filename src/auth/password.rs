use tracing::debug;

use crate::shared::AppError;

/// Fixed bcrypt work factor. Each unit doubles the hashing cost.
const HASH_COST: u32 = 10;

/// Hashes a plaintext password with bcrypt (salted, cost 10).
pub fn hash_password(plaintext: &str) -> Result<String, AppError> {
    bcrypt::hash(plaintext, HASH_COST).map_err(|e| {
        debug!(error = %e, "Failed to hash password");
        AppError::Internal
    })
}

/// Verifies a plaintext password against a stored bcrypt hash.
///
/// bcrypt re-derives the key from the stored salt and compares the
/// result, so verification cost matches hashing cost and does not
/// short-circuit on the first differing byte.
pub fn verify_password(plaintext: &str, hashed: &str) -> Result<bool, AppError> {
    bcrypt::verify(plaintext, hashed).map_err(|e| {
        debug!(error = %e, "Failed to verify password");
        AppError::Internal
    })
}
