use std::sync::{Arc, RwLock};

/// Landmarks the hand tracker reports per detected hand
pub const POINTS_PER_HAND: usize = 21;

/// Labels the sign classifier can answer with
pub const SIGN_LABELS: [&str; 27] = [
    "A", "B", "C", "D", "E", "F", "G", "H", "I", "K", "L", "M", "N", "O", "P", "Q", "R", "S", "T",
    "U", "V", "W", "X", "Y", "I love you", "You", "Me",
];

/// One camera frame worth of hand landmarks, `[x, y]` per point
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkFrame {
    pub points: Vec<[f32; 2]>,
}

impl LandmarkFrame {
    pub fn new(points: Vec<[f32; 2]>) -> Self {
        Self { points }
    }

    pub fn hand_count(&self) -> usize {
        self.points.len() / POINTS_PER_HAND
    }

    /// Per-hand slices of the frame, ignoring a trailing partial hand
    pub fn hands(&self) -> impl Iterator<Item = &[[f32; 2]]> {
        self.points.chunks_exact(POINTS_PER_HAND)
    }
}

/// Latest known landmarks, written by the tracker and read by the classifier.
/// Cloning shares the same buffer.
#[derive(Debug, Clone, Default)]
pub struct LandmarkBuffer {
    latest: Arc<RwLock<Option<LandmarkFrame>>>,
}

impl LandmarkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, frame: LandmarkFrame) {
        match self.latest.write() {
            Ok(mut guard) => *guard = Some(frame),
            Err(poisoned) => *poisoned.into_inner() = Some(frame),
        }
    }

    pub fn clear(&self) {
        match self.latest.write() {
            Ok(mut guard) => *guard = None,
            Err(poisoned) => *poisoned.into_inner() = None,
        }
    }

    pub fn snapshot(&self) -> Option<LandmarkFrame> {
        match self.latest.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

/// Model input for one hand: coordinates relative to the first point (the
/// wrist), flattened and scaled so the largest magnitude is 1.
pub fn preprocess_landmarks(points: &[[f32; 2]]) -> Vec<f32> {
    let Some(&[base_x, base_y]) = points.first() else {
        return Vec::new();
    };

    let flat: Vec<f32> = points
        .iter()
        .flat_map(|&[x, y]| [x - base_x, y - base_y])
        .collect();

    let max = flat.iter().fold(0.0_f32, |m, v| m.max(v.abs()));
    if max == 0.0 {
        return flat;
    }
    flat.into_iter().map(|v| v / max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hand(offset: f32) -> Vec<[f32; 2]> {
        (0..POINTS_PER_HAND)
            .map(|i| [offset + i as f32, offset - i as f32 * 0.5])
            .collect()
    }

    #[test]
    fn test_preprocess_is_relative_and_normalized() {
        let out = preprocess_landmarks(&hand(10.0));
        assert_eq!(out.len(), POINTS_PER_HAND * 2);
        assert_eq!(out[0], 0.0);
        assert_eq!(out[1], 0.0);
        let max = out.iter().fold(0.0_f32, |m, v| m.max(v.abs()));
        assert!((max - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_preprocess_is_translation_invariant() {
        let a = preprocess_landmarks(&hand(0.0));
        let b = preprocess_landmarks(&hand(250.0));
        for (x, y) in a.iter().zip(b.iter()) {
            assert!((x - y).abs() < 1e-5);
        }
    }

    #[test]
    fn test_preprocess_degenerate_input() {
        assert!(preprocess_landmarks(&[]).is_empty());
        assert_eq!(preprocess_landmarks(&[[3.0, 3.0], [3.0, 3.0]]), vec![0.0; 4]);
    }

    #[test]
    fn test_frame_hands() {
        let mut points = hand(0.0);
        points.extend(hand(5.0));
        points.push([1.0, 1.0]);
        let frame = LandmarkFrame::new(points);
        assert_eq!(frame.hand_count(), 2);
        assert_eq!(frame.hands().count(), 2);
    }

    #[test]
    fn test_buffer_shares_latest_frame() {
        let buffer = LandmarkBuffer::new();
        let reader = buffer.clone();
        assert!(reader.snapshot().is_none());

        buffer.publish(LandmarkFrame::new(hand(1.0)));
        assert_eq!(reader.snapshot().unwrap().points.len(), POINTS_PER_HAND);

        buffer.clear();
        assert!(reader.snapshot().is_none());
    }

    #[test]
    fn test_labels_cover_phrases() {
        assert!(SIGN_LABELS.contains(&"I love you"));
        assert!(!SIGN_LABELS.contains(&"J"));
    }
}
