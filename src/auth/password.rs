//! bcrypt password hashing.
//!
//! bcrypt is deliberately slow, so both operations run on Tokio's blocking
//! pool instead of stalling a runtime worker.

use crate::error::TaskboardError;

/// Hashes and verifies passwords with a fixed bcrypt cost.
#[derive(Debug, Clone, Copy)]
pub struct PasswordHasher {
    cost: u32,
}

impl PasswordHasher {
    /// Creates a hasher using `cost`, clamped to bcrypt's valid range.
    #[must_use]
    pub fn new(cost: u32) -> Self {
        Self {
            cost: cost.clamp(4, 31),
        }
    }

    /// Hashes `password` with a random salt.
    ///
    /// # Errors
    ///
    /// Returns [`TaskboardError::Internal`] if hashing fails or the blocking
    /// task panics.
    pub async fn hash(&self, password: &str) -> Result<String, TaskboardError> {
        let cost = self.cost;
        let password = password.to_owned();
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| TaskboardError::Internal(format!("hashing task failed: {e}")))?
            .map_err(|e| TaskboardError::Internal(format!("password hashing failed: {e}")))
    }

    /// Returns `true` if `password` matches `hash`.
    ///
    /// A malformed stored hash counts as a mismatch.
    ///
    /// # Errors
    ///
    /// Returns [`TaskboardError::Internal`] if the blocking task panics.
    pub async fn verify(&self, password: &str, hash: &str) -> Result<bool, TaskboardError> {
        let password = password.to_owned();
        let hash = hash.to_owned();
        let outcome = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| TaskboardError::Internal(format!("verify task failed: {e}")))?;
        match outcome {
            Ok(matches) => Ok(matches),
            Err(err) => {
                tracing::warn!(error = %err, "stored password hash is unreadable");
                Ok(false)
            }
        }
    }
}

impl Default for PasswordHasher {
    fn default() -> Self {
        Self::new(bcrypt::DEFAULT_COST)
    }
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use tokio_test::assert_ok;

    use super::*;

    #[tokio::test]
    async fn hash_then_verify() {
        let hasher = PasswordHasher::new(4);
        let hash = assert_ok!(hasher.hash("s3cret!").await);
        assert_ne!(hash, "s3cret!");
        assert!(assert_ok!(hasher.verify("s3cret!", &hash).await));
        assert!(!assert_ok!(hasher.verify("wrong", &hash).await));
    }

    #[tokio::test]
    async fn malformed_hash_is_a_mismatch() {
        let hasher = PasswordHasher::new(4);
        assert!(!assert_ok!(hasher.verify("anything", "not-a-bcrypt-hash").await));
    }

    #[test]
    fn cost_is_clamped() {
        assert_eq!(PasswordHasher::new(1).cost, 4);
        assert_eq!(PasswordHasher::new(99).cost, 31);
    }
}
