//! Portal engine: remote service calls, progress tickers and the presence
//! channel, executed on a background tokio runtime.
mod client;
mod engine;
mod filename;
mod packet;
mod persist;
mod presence;
mod ticker;
mod types;

pub use client::{PortalService, ReqwestService, ServiceSettings};
pub use engine::{EngineHandle, EngineSettings};
pub use filename::download_filename;
pub use packet::{decode_packet, encode_connect, encode_event, Handshake, Packet, PacketError, PONG};
pub use persist::{ensure_download_dir, DownloadSink, SaveError};
pub use presence::{presence_url, PresenceClient};
pub use ticker::{TickerSet, TickerSpec};
pub use types::{
    AnalysisOutcome, ChannelError, DeleteOutcome, EngineEvent, FailureKind, PresenceEvent,
    RecognizedText, ServiceError, Ticket, UploadReceipt,
};
