pub mod models;

pub use models::{FeedUpdate, ServingPlayer, Snapshot};

/// Decode one inbound text frame into a [`FeedUpdate`].
///
/// Unknown fields are ignored. A frame missing a required field (names or
/// set scores) is rejected as a whole.
pub fn decode_frame(text: &str) -> Result<FeedUpdate, serde_json::Error> {
    serde_json::from_str(text)
}
