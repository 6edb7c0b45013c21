//! Merge-candidate detection.

use aether_types::{InstanceId, Position, TokenInstance};

/// Distance below which two tokens attempt to merge.
pub const DEFAULT_MERGE_THRESHOLD: f64 = 60.0;

/// Find the first instance, in surface order, strictly closer than
/// `threshold` to `position`. The moved instance itself never matches.
#[must_use]
pub fn detect(
    moved: InstanceId,
    position: Position,
    instances: &[TokenInstance],
    threshold: f64,
) -> Option<InstanceId> {
    instances
        .iter()
        .filter(|instance| instance.id != moved)
        .find(|instance| instance.position.distance_to(position) < threshold)
        .map(|instance| instance.id)
}
