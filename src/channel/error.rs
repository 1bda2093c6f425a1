use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("invalid feed endpoint '{url}': {source}")]
    InvalidEndpoint {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("unsupported feed scheme '{0}' (expected ws or wss)")]
    UnsupportedScheme(String),

    #[error("transport error: {0}")]
    Transport(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("feed was torn down or superseded")]
    FeedEnded,

    #[error("channel manager has shut down")]
    ManagerClosed,
}
