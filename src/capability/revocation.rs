//! External revocation-service seam (§1, §4.2 step 6)

use async_trait::async_trait;

use crate::error::AppResult;

#[async_trait]
pub trait RevocationClient: Send + Sync {
    /// Returns whether any of `token_hashes` has been revoked.
    async fn is_revoked(&self, token_hashes: &[String]) -> AppResult<bool>;
}

/// Ships with the crate as the default collaborator; a production
/// deployment injects a client backed by the real revocation service.
pub struct NullRevocationClient;

#[async_trait]
impl RevocationClient for NullRevocationClient {
    async fn is_revoked(&self, _token_hashes: &[String]) -> AppResult<bool> {
        Ok(false)
    }
}
