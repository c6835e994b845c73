use serde::{Deserialize, Serialize};

use crate::device::DeviceClass;

const PERFECT_THRESHOLD: f64 = 15.0;
const GOOD_THRESHOLD: f64 = 31.0;

/// Judgment of one entry, ordered best to worst
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum_macros::Display,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE")]
pub enum RatingLabel {
    Perfect,
    Good,
    Ok,
    Miss,
}

/// Rate a cue position against the perfect zone.
///
/// A cue that is as far from the zone as the zone is from the origin (for
/// instance, one that never left position 0) is always a miss.
pub fn calculate_rating(position: f64, perfect_zone: f64, device: DeviceClass) -> RatingLabel {
    let distance = (position - perfect_zone).abs();

    if distance >= perfect_zone.abs() {
        RatingLabel::Miss
    } else if distance <= PERFECT_THRESHOLD {
        RatingLabel::Perfect
    } else if distance <= GOOD_THRESHOLD {
        RatingLabel::Good
    } else if distance <= device.geometry().ok_threshold {
        RatingLabel::Ok
    } else {
        RatingLabel::Miss
    }
}
