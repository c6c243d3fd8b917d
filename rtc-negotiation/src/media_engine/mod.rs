//! Interface to the engine that owns the real transports.
//!
//! The negotiation session never performs I/O itself. It asks a
//! [`MediaEngine`] for one [`MediaTransport`] per active stream and drives it
//! with commands; the engine reports back through [`MediaEngineEvent`]s that
//! the application feeds into
//! [`RTCSession::handle_media_event`](crate::session::RTCSession::handle_media_event).
//!
//! Implementations must not call back into the session from within a command.

use ice::candidate::Candidate;
use serde::{Deserialize, Serialize};
use shared::error::Result;

use crate::configuration::helper_server::HelperServer;
use crate::description::{DtlsSetup, StreamType};
use crate::payload::codec::TransportPayload;

/// Opaque handle to a media source (capture device, track, ...) owned by the
/// media engine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MediaSourceHandle(pub u64);

/// Parameters of a data channel the remote side opened.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataChannelParameters {
    pub label: String,
    pub protocol: String,
    pub ordered: bool,
    pub stream_id: u16,
}

/// Everything a transport needs at creation time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportConfig {
    pub stream_index: usize,
    pub stream_type: StreamType,
    pub ufrag: String,
    pub password: String,
    pub helper_servers: Vec<HelperServer>,
    pub fingerprint_hash_function: String,
}

/// Asynchronous signal from a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaEngineEvent {
    /// A local candidate was gathered.
    NewCandidate(Candidate),
    /// The local DTLS certificate, PEM encoded.
    DtlsCertificateChanged(String),
    CnameChanged(String),
    SendSsrcChanged(u32),
    /// The remote side started sending media.
    IncomingSource(MediaSourceHandle),
    DataChannelRequested(DataChannelParameters),
}

pub trait MediaTransport: Send {
    fn add_remote_candidate(&mut self, candidate: &Candidate) -> Result<()>;
    fn set_remote_credentials(&mut self, ufrag: &str, password: &str) -> Result<()>;
    fn set_remote_fingerprint(&mut self, hash_function: &str, fingerprint: &str) -> Result<()>;
    fn set_dtls_setup(&mut self, setup: DtlsSetup) -> Result<()>;
    fn set_send_payload(&mut self, payload: &TransportPayload) -> Result<()>;
    fn add_receive_payload(&mut self, payload: &TransportPayload) -> Result<()>;
    fn set_rtcp_mux(&mut self, enabled: bool) -> Result<()>;
    fn set_sctp_local_port(&mut self, port: u16) -> Result<()>;
    fn set_sctp_remote_port(&mut self, port: u16) -> Result<()>;
    fn set_send_source(&mut self, source: Option<MediaSourceHandle>) -> Result<()>;
    /// Releases the transport. No command follows.
    fn close(&mut self) -> Result<()>;
}

pub trait MediaEngine: Send {
    fn create_transport(&mut self, config: TransportConfig) -> Result<Box<dyn MediaTransport>>;
}
