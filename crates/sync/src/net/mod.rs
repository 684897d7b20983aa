mod clock_sync;
mod connection;
mod endpoint;
mod protocol;
mod stats;
mod transport;

pub use clock_sync::{ClockSyncEstimator, TimeSample, corrected_timestamp};
pub use connection::{ConnectionManager, ConnectionState};
pub use endpoint::{DEVELOPMENT_PORT, Endpoint, EndpointError, PRODUCTION_PORT, Profile, SOCKET_PATH};
pub use protocol::{
    AnswerSubmission, Envelope, FrameError, GameStateFrame, Inbound, MessageType, Outbound,
    TimeReply, TimeRequest,
};
pub use stats::NetworkStats;
pub use transport::{
    Connector, DEFAULT_CONNECT_TIMEOUT, EventSink, Generation, SendError, Transport,
    TransportEvent, TransportMessage, WebSocketConnector, WebSocketTransport,
};
