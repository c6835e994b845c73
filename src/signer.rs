//! Stand-ins for a camera and sign model: the keyboard poses a hand for the
//! sign it holds, a template model reads it back, and a simulated player
//! covers unattended runs.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::landmarks::{preprocess_landmarks, LandmarkFrame, POINTS_PER_HAND, SIGN_LABELS};

/// How long a key press keeps counting as a held sign
pub const HOLD: Duration = Duration::from_millis(400);

/// Squared distance within which a hand matches a known pose
const MATCH_DISTANCE: f32 = 0.05;

/// Sign produced by a key: letters are fingerspelled, digits are phrases.
/// Letters the model has no pose for (J and Z move) make no sign.
pub fn sign_for_key(c: char) -> Option<String> {
    let sign = match c {
        'a'..='z' | 'A'..='Z' => c.to_ascii_uppercase().to_string(),
        '1' => "I love you".to_string(),
        '2' => "You".to_string(),
        '3' => "Me".to_string(),
        _ => return None,
    };
    SIGN_LABELS.contains(&sign.as_str()).then_some(sign)
}

/// The hand the keyboard shows the camera for `sign`: one fixed pose per
/// known label, fanned out from a wrist near the middle of the frame.
pub fn pose_for_sign(sign: &str) -> Option<LandmarkFrame> {
    let k = SIGN_LABELS.iter().position(|s| *s == sign)? as f32;
    let spread = 0.29 + k * 0.11;
    let points = (0..POINTS_PER_HAND)
        .map(|i| {
            let i = i as f32;
            let reach = 0.05 + 0.004 * i;
            let angle = i * spread;
            [0.5 + reach * angle.cos(), 0.6 - reach * angle.sin()]
        })
        .collect();
    Some(LandmarkFrame::new(points))
}

/// Nearest-template sign model over preprocessed landmarks
#[derive(Debug, Clone)]
pub struct SignModel {
    templates: Vec<(&'static str, Vec<f32>)>,
}

impl SignModel {
    pub fn new() -> Self {
        let templates = SIGN_LABELS
            .iter()
            .filter_map(|&label| {
                let pose = pose_for_sign(label)?;
                Some((label, preprocess_landmarks(&pose.points)))
            })
            .collect();
        Self { templates }
    }

    /// Label of the closest known pose, if `input` is close enough to one
    pub fn predict(&self, input: &[f32]) -> Option<&'static str> {
        self.templates
            .iter()
            .filter(|(_, template)| template.len() == input.len())
            .map(|(label, template)| {
                let distance: f32 = template
                    .iter()
                    .zip(input)
                    .map(|(a, b)| (a - b) * (a - b))
                    .sum();
                (*label, distance)
            })
            .filter(|(_, distance)| *distance <= MATCH_DISTANCE)
            .min_by(|a, b| a.1.total_cmp(&b.1))
            .map(|(label, _)| label)
    }
}

impl Default for SignModel {
    fn default() -> Self {
        Self::new()
    }
}

/// Most recent sign "made" by the player. Cloning shares it.
#[derive(Debug, Clone, Default)]
pub struct KeySigner {
    held: Arc<Mutex<Option<(String, Instant)>>>,
}

impl KeySigner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, sign: impl Into<String>, at: Instant) {
        let mut held = match self.held.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *held = Some((sign.into(), at));
    }

    /// Let go of whatever is held
    pub fn release(&self) {
        let mut held = match self.held.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *held = None;
    }

    /// The sign being held at `now`, if any
    pub fn held(&self, now: Instant) -> Option<String> {
        let held = match self.held.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        (*held)
            .as_ref()
            .filter(|(_, at)| now.saturating_duration_since(*at) < HOLD)
            .map(|(sign, _)| sign.clone())
    }

    /// What the camera would see at `now`: the held sign's pose, or no hand.
    pub fn capture(&self, now: Instant) -> Option<LandmarkFrame> {
        self.held(now).and_then(|sign| pose_for_sign(&sign))
    }
}

/// Simulated player. Signs every entry once, at a random point in its
/// travel, getting it right with probability `accuracy`.
#[derive(Debug)]
pub struct Autoplayer {
    rng: StdRng,
    accuracy: f64,
    planned: Option<(String, Instant)>,
}

impl Autoplayer {
    pub fn new(accuracy: f64) -> Self {
        Self::with_rng(StdRng::from_entropy(), accuracy)
    }

    pub fn seeded(seed: u64, accuracy: f64) -> Self {
        Self::with_rng(StdRng::seed_from_u64(seed), accuracy)
    }

    fn with_rng(rng: StdRng, accuracy: f64) -> Self {
        Self {
            rng,
            accuracy: accuracy.clamp(0.0, 1.0),
            planned: None,
        }
    }

    /// A new entry is on the conveyor; decide when and what to sign.
    pub fn on_entry(&mut self, expected_sign: &str, duration: Duration, now: Instant) {
        let sign = if self.rng.gen_bool(self.accuracy) {
            expected_sign.to_string()
        } else {
            let wrong: Vec<&str> = SIGN_LABELS
                .iter()
                .copied()
                .filter(|s| *s != expected_sign)
                .collect();
            wrong
                .choose(&mut self.rng)
                .map(|s| s.to_string())
                .unwrap_or_default()
        };
        let at = now + duration.mul_f64(self.rng.gen_range(0.4..0.95));
        self.planned = Some((sign, at));
    }

    /// Press the planned sign once its time has come. Returns true when it did.
    pub fn poll(&mut self, signer: &KeySigner, now: Instant) -> bool {
        let due = matches!(&self.planned, Some((_, at)) if *at <= now);
        if !due {
            return false;
        }
        if let Some((sign, _)) = self.planned.take() {
            signer.press(sign, now);
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_map_to_signs() {
        assert_eq!(sign_for_key('a').as_deref(), Some("A"));
        assert_eq!(sign_for_key('Y').as_deref(), Some("Y"));
        assert_eq!(sign_for_key('1').as_deref(), Some("I love you"));
        assert_eq!(sign_for_key('2').as_deref(), Some("You"));
        assert_eq!(sign_for_key('3').as_deref(), Some("Me"));
        assert_eq!(sign_for_key('9'), None);
        assert_eq!(sign_for_key(' '), None);
        assert_eq!(sign_for_key('j'), None);
        assert_eq!(sign_for_key('Z'), None);
    }

    #[test]
    fn test_model_reads_back_every_pose() {
        let model = SignModel::new();
        for label in SIGN_LABELS {
            let pose = pose_for_sign(label).unwrap();
            assert_eq!(pose.hand_count(), 1);
            let input = preprocess_landmarks(&pose.points);
            assert_eq!(model.predict(&input), Some(label), "pose for {label}");
        }
    }

    #[test]
    fn test_model_ignores_unknown_hands() {
        let model = SignModel::new();
        assert!(pose_for_sign("J").is_none());
        assert_eq!(model.predict(&[]), None);

        let flat: Vec<[f32; 2]> = (0..POINTS_PER_HAND)
            .map(|i| [0.1 + i as f32 * 0.01, 0.5])
            .collect();
        assert_eq!(model.predict(&preprocess_landmarks(&flat)), None);
    }

    #[test]
    fn test_capture_shows_held_sign() {
        let signer = KeySigner::new();
        let t0 = Instant::now();
        assert!(signer.capture(t0).is_none());

        signer.press("B", t0);
        assert_eq!(signer.capture(t0), pose_for_sign("B"));
        assert!(signer.capture(t0 + HOLD).is_none());
    }

    #[test]
    fn test_held_sign_expires() {
        let signer = KeySigner::new();
        let t0 = Instant::now();
        signer.press("C", t0);
        assert_eq!(signer.held(t0 + Duration::from_millis(399)).as_deref(), Some("C"));
        assert_eq!(signer.held(t0 + HOLD), None);
    }

    #[test]
    fn test_release_drops_held_sign() {
        let signer = KeySigner::new();
        let t0 = Instant::now();
        signer.press("D", t0);
        signer.release();
        assert_eq!(signer.held(t0), None);
    }

    #[test]
    fn test_accurate_autoplayer_signs_expected() {
        let signer = KeySigner::new();
        let mut player = Autoplayer::seeded(7, 1.0);
        let t0 = Instant::now();
        player.on_entry("You", Duration::from_millis(1000), t0);

        assert!(!player.poll(&signer, t0 + Duration::from_millis(100)));
        assert!(player.poll(&signer, t0 + Duration::from_millis(960)));
        assert_eq!(
            signer.held(t0 + Duration::from_millis(960)).as_deref(),
            Some("You")
        );
        assert!(!player.poll(&signer, t0 + Duration::from_millis(990)));
    }

    #[test]
    fn test_inaccurate_autoplayer_signs_something_else() {
        let signer = KeySigner::new();
        let mut player = Autoplayer::seeded(7, 0.0);
        let t0 = Instant::now();
        player.on_entry("A", Duration::from_millis(500), t0);
        assert!(player.poll(&signer, t0 + Duration::from_millis(500)));

        let sign = signer.held(t0 + Duration::from_millis(500)).unwrap();
        assert_ne!(sign, "A");
        assert!(SIGN_LABELS.contains(&sign.as_str()));
    }
}
