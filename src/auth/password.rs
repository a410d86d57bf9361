use bcrypt::{hash, verify};
use tracing::error;

/// bcrypt cost used for every stored digest.
pub const HASH_COST: u32 = 10;

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let digest = hash(plain, HASH_COST).map_err(|e| {
        error!(error = %e, "bcrypt hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(digest)
}

/// A malformed stored digest is an error, not a mismatch.
pub fn verify_password(plain: &str, digest: &str) -> anyhow::Result<bool> {
    let ok = verify(plain, digest).map_err(|e| {
        error!(error = %e, "bcrypt verify error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(ok)
}
