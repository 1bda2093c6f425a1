use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Which side is currently serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServingPlayer {
    Player1,
    Player2,
}

/// One full match-state frame as pushed by the score server.
///
/// Every frame replaces the previous one wholesale; nothing is merged.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedUpdate {
    pub player1: String,
    pub player2: String,
    /// Completed set scores for player 1, oldest first. May be shorter or
    /// longer than the three slots the overlay shows.
    pub score1: Vec<u32>,
    pub score2: Vec<u32>,
    /// Points within the current game (0, 15, 30, 40, ...)
    #[serde(default)]
    pub current_game_points1: u32,
    #[serde(default)]
    pub current_game_points2: u32,
    #[serde(default)]
    pub serving_player: Option<ServingPlayer>,
}

/// The latest successfully decoded frame for a feed, stamped on arrival.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Snapshot {
    pub update: FeedUpdate,
    pub received_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(update: FeedUpdate) -> Self {
        Snapshot {
            update,
            received_at: Utc::now(),
        }
    }
}
