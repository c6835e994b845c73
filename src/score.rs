use serde::{Deserialize, Serialize};

use crate::rating::RatingLabel;

/// Song difficulty. Carried through scoring but currently worth no points.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, strum_macros::Display,
)]
pub enum Difficulty {
    #[default]
    Unrated,
    Easy,
    Medium,
    Hard,
}

pub fn calculate_score(rating: RatingLabel, _difficulty: Difficulty) -> u32 {
    match rating {
        RatingLabel::Perfect => 100,
        RatingLabel::Good => 75,
        RatingLabel::Ok => 50,
        RatingLabel::Miss => 0,
    }
}
