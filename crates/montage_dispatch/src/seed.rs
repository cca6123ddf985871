//! Per-scene generation seeds.

use montage_core::Scene;
use sha2::{Digest, Sha256};

/// Seed for a scene's video request.
///
/// A shared seed applies to every scene of the run. Otherwise the seed is
/// derived from the scene number and prompt, so the same scene always maps
/// to the same seed and therefore the same fingerprint.
pub fn scene_seed(shared: Option<u64>, scene: &Scene) -> u64 {
    if let Some(seed) = shared {
        return seed;
    }
    let mut hasher = Sha256::new();
    hasher.update(scene.scene_number().to_be_bytes());
    hasher.update(scene.detailed_prompt().as_bytes());
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes)
}
