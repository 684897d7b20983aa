pub mod client;
pub mod game;
pub mod net;
pub mod submit;
pub mod time;

pub use client::{SyncClient, SyncConfig, SyncHandle, SyncStatus, SyncView};
pub use game::{
    ActionWindow, AnswerMark, AnswerOption, AnswerView, GamePhase, GamePhaseStore, GameSnapshot,
    PlayerScore, Question, Round, StandingRow, Status, UserAnswer,
};
pub use net::{
    AnswerSubmission, ClockSyncEstimator, ConnectionManager, ConnectionState, Connector, Endpoint,
    EndpointError, EventSink, FrameError, GameStateFrame, Inbound, MessageType, NetworkStats,
    Outbound, Profile, SendError, TimeReply, TimeRequest, Transport, TransportEvent,
    TransportMessage, WebSocketConnector, WebSocketTransport,
};
pub use submit::{ActionSubmitter, FrameSink, SubmitOutcome};
pub use time::{Clock, ManualClock, SystemClock};
