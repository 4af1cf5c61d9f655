use rand_core::{OsRng, RngCore};
use std::time::{SystemTime, UNIX_EPOCH};

/// `TXN-<epoch millis>-<random>`. Unique with high probability; a collision
/// is rejected by the store's primary key on `reference`, so the caller
/// simply re-initiates.
pub fn funding_reference() -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default();
    let nonce = OsRng.next_u32() % 1_000_000;
    format!("TXN-{millis}-{nonce}")
}
