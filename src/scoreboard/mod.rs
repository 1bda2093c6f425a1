pub mod layout;

pub use layout::ScoreboardLayout;

use serde::Serialize;

use crate::feed::{FeedUpdate, ServingPlayer};

/// Number of set columns the overlay always shows.
pub const SET_SLOTS: usize = 3;

/// What the overlay actually draws: a feed update squeezed into the fixed
/// three-set layout, or the placeholder when nothing has arrived yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreboardView {
    pub player1: String,
    pub player2: String,
    pub score1: [u32; SET_SLOTS],
    pub score2: [u32; SET_SLOTS],
    pub current_game_points1: u32,
    pub current_game_points2: u32,
    pub serving_player: ServingPlayer,
}

impl ScoreboardView {
    /// Shown before the first frame and whenever the feed has no data.
    pub fn placeholder() -> Self {
        ScoreboardView {
            player1: "J. DOE".to_string(),
            player2: "A. SMITH".to_string(),
            score1: [0; SET_SLOTS],
            score2: [0; SET_SLOTS],
            current_game_points1: 0,
            current_game_points2: 0,
            serving_player: ServingPlayer::Player2,
        }
    }

    pub fn from_update(update: Option<&FeedUpdate>) -> Self {
        let Some(update) = update else {
            return Self::placeholder();
        };
        ScoreboardView {
            player1: update.player1.clone(),
            player2: update.player2.clone(),
            score1: normalize_scores(&update.score1),
            score2: normalize_scores(&update.score2),
            current_game_points1: update.current_game_points1,
            current_game_points2: update.current_game_points2,
            serving_player: update
                .serving_player
                .unwrap_or(ServingPlayer::Player2),
        }
    }

    pub fn is_serving(&self, player: ServingPlayer) -> bool {
        self.serving_player == player
    }
}

/// Keep the first three set scores, padding missing sets with zero.
pub fn normalize_scores(scores: &[u32]) -> [u32; SET_SLOTS] {
    let mut out = [0; SET_SLOTS];
    for (slot, score) in out.iter_mut().zip(scores) {
        *slot = *score;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_scores() {
        assert_eq!(normalize_scores(&[]), [0, 0, 0]);
        assert_eq!(normalize_scores(&[7]), [7, 0, 0]);
        assert_eq!(normalize_scores(&[6, 4, 7]), [6, 4, 7]);
        assert_eq!(normalize_scores(&[1, 2, 3, 4]), [1, 2, 3]);
        assert_eq!(normalize_scores(&[6, 3, 4, 6, 7]), [6, 3, 4]);
    }

    #[test]
    fn test_placeholder_when_no_data() {
        let view = ScoreboardView::from_update(None);
        assert_eq!(view, ScoreboardView::placeholder());
        assert_eq!(view.player1, "J. DOE");
        assert_eq!(view.player2, "A. SMITH");
        assert!(view.is_serving(ServingPlayer::Player2));
        assert!(!view.is_serving(ServingPlayer::Player1));
    }

    #[test]
    fn test_view_from_update() {
        let update = FeedUpdate {
            player1: "R. NADAL".into(),
            player2: "N. DJOKOVIC".into(),
            score1: vec![6, 4],
            score2: vec![3, 6],
            current_game_points1: 40,
            current_game_points2: 30,
            serving_player: Some(ServingPlayer::Player1),
        };
        let view = ScoreboardView::from_update(Some(&update));
        assert_eq!(view.score1, [6, 4, 0]);
        assert_eq!(view.score2, [3, 6, 0]);
        assert_eq!(view.current_game_points1, 40);
        assert!(view.is_serving(ServingPlayer::Player1));
    }

    #[test]
    fn test_missing_server_defaults_to_player2() {
        let update = FeedUpdate {
            player1: "A".into(),
            player2: "B".into(),
            score1: vec![],
            score2: vec![],
            current_game_points1: 0,
            current_game_points2: 0,
            serving_player: None,
        };
        let view = ScoreboardView::from_update(Some(&update));
        assert_eq!(view.serving_player, ServingPlayer::Player2);
    }

    #[test]
    fn test_view_serializes_camel_case() {
        let json = serde_json::to_value(ScoreboardView::placeholder()).unwrap();
        assert_eq!(json["servingPlayer"], "player2");
        assert_eq!(json["currentGamePoints1"], 0);
        assert_eq!(json["score1"], serde_json::json!([0, 0, 0]));
    }
}
