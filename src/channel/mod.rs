mod connection;
pub mod endpoint;
pub mod error;
pub mod manager;
pub mod transport;

pub use error::ChannelError;
pub use manager::{ChannelManager, ChannelState, ChannelStatus, FeedSubscription, ManagerConfig};
pub use transport::{Connector, FeedStream, TungsteniteConnector};
