pub mod payload;
pub mod sdp_type;
pub mod stream_mode;

use std::fmt;

use ice::candidate::Candidate;
use sdp::ConnectionRole;
use serde::{Deserialize, Serialize};
use shared::error::{Error, Result};

pub use payload::RTCPayload;
pub use sdp_type::RTCSdpType;
pub use stream_mode::StreamMode;

pub const DEFAULT_FINGERPRINT_HASH_FUNCTION: &str = "sha-256";

/// Kind of media carried by a stream.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StreamType {
    #[default]
    #[serde(rename = "audio")]
    Audio,
    #[serde(rename = "video")]
    Video,
    #[serde(rename = "data")]
    Data,
}

const STREAM_TYPE_AUDIO_STR: &str = "audio";
const STREAM_TYPE_VIDEO_STR: &str = "video";
const STREAM_TYPE_DATA_STR: &str = "data";
const MEDIA_APPLICATION_STR: &str = "application";

impl StreamType {
    /// Returns the media name used on the `m=` line.
    pub fn media_name(self) -> &'static str {
        match self {
            StreamType::Audio => STREAM_TYPE_AUDIO_STR,
            StreamType::Video => STREAM_TYPE_VIDEO_STR,
            StreamType::Data => MEDIA_APPLICATION_STR,
        }
    }

    /// Maps an `m=` line media name to a stream type.
    pub fn from_media_name(media: &str) -> Result<Self> {
        match media {
            STREAM_TYPE_AUDIO_STR => Ok(StreamType::Audio),
            STREAM_TYPE_VIDEO_STR => Ok(StreamType::Video),
            MEDIA_APPLICATION_STR => Ok(StreamType::Data),
            _ => Err(Error::ErrSdpInvalidValue(format!("media {media}"))),
        }
    }

    pub fn is_media(self) -> bool {
        !matches!(self, StreamType::Data)
    }
}

impl fmt::Display for StreamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StreamType::Audio => STREAM_TYPE_AUDIO_STR,
            StreamType::Video => STREAM_TYPE_VIDEO_STR,
            StreamType::Data => STREAM_TYPE_DATA_STR,
        };
        write!(f, "{s}")
    }
}

/// DTLS setup role of a stream, as carried by `a=setup`.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq)]
pub enum DtlsSetup {
    #[default]
    Actpass,
    Active,
    Passive,
}

impl DtlsSetup {
    /// Returns the role the local side takes when the remote side declared
    /// `self`.
    pub fn counterpart(self) -> Self {
        match self {
            DtlsSetup::Actpass => DtlsSetup::Active,
            DtlsSetup::Active => DtlsSetup::Passive,
            DtlsSetup::Passive => DtlsSetup::Active,
        }
    }
}

impl fmt::Display for DtlsSetup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", ConnectionRole::from(*self))
    }
}

impl From<DtlsSetup> for ConnectionRole {
    fn from(setup: DtlsSetup) -> Self {
        match setup {
            DtlsSetup::Actpass => ConnectionRole::Actpass,
            DtlsSetup::Active => ConnectionRole::Active,
            DtlsSetup::Passive => ConnectionRole::Passive,
        }
    }
}

impl TryFrom<ConnectionRole> for DtlsSetup {
    type Error = Error;

    fn try_from(role: ConnectionRole) -> Result<Self> {
        match role {
            ConnectionRole::Actpass => Ok(DtlsSetup::Actpass),
            ConnectionRole::Active => Ok(DtlsSetup::Active),
            ConnectionRole::Passive => Ok(DtlsSetup::Passive),
            ConnectionRole::Holdconn => Err(Error::ErrSdpInvalidValue(format!("setup {role}"))),
        }
    }
}

/// StreamDescription is the negotiated description of one stream of a
/// session. It is immutable; build one with [`StreamDescriptionBuilder`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamDescription {
    stream_type: StreamType,
    mode: StreamMode,
    mid: Option<String>,
    ufrag: Option<String>,
    password: Option<String>,
    candidates: Vec<Candidate>,
    setup: DtlsSetup,
    fingerprint_hash_function: String,
    fingerprint: Option<String>,

    cname: Option<String>,
    rtcp_mux: bool,
    ssrcs: Vec<u32>,
    payloads: Vec<RTCPayload>,
    media_stream_id: Option<String>,
    media_stream_track_id: Option<String>,

    sctp_port: Option<u16>,
    sctp_stream_count: Option<u16>,
    app_label: Option<String>,
}

impl StreamDescription {
    pub fn stream_type(&self) -> StreamType {
        self.stream_type
    }

    pub fn mode(&self) -> StreamMode {
        self.mode
    }

    pub fn mid(&self) -> Option<&str> {
        self.mid.as_deref()
    }

    pub fn ufrag(&self) -> Option<&str> {
        self.ufrag.as_deref()
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    pub fn setup(&self) -> DtlsSetup {
        self.setup
    }

    pub fn fingerprint_hash_function(&self) -> &str {
        &self.fingerprint_hash_function
    }

    pub fn fingerprint(&self) -> Option<&str> {
        self.fingerprint.as_deref()
    }

    pub fn cname(&self) -> Option<&str> {
        self.cname.as_deref()
    }

    pub fn rtcp_mux(&self) -> bool {
        self.rtcp_mux
    }

    pub fn ssrcs(&self) -> &[u32] {
        &self.ssrcs
    }

    pub fn payloads(&self) -> &[RTCPayload] {
        &self.payloads
    }

    pub fn media_stream_id(&self) -> Option<&str> {
        self.media_stream_id.as_deref()
    }

    pub fn media_stream_track_id(&self) -> Option<&str> {
        self.media_stream_track_id.as_deref()
    }

    pub fn sctp_port(&self) -> Option<u16> {
        self.sctp_port
    }

    pub fn sctp_stream_count(&self) -> Option<u16> {
        self.sctp_stream_count
    }

    pub fn app_label(&self) -> Option<&str> {
        self.app_label.as_deref()
    }
}

/// Mutable accumulator for a [`StreamDescription`].
#[derive(Debug, Clone)]
pub struct StreamDescriptionBuilder {
    description: StreamDescription,
}

impl StreamDescriptionBuilder {
    pub fn new(stream_type: StreamType) -> Self {
        StreamDescriptionBuilder {
            description: StreamDescription {
                stream_type,
                mode: StreamMode::default(),
                mid: None,
                ufrag: None,
                password: None,
                candidates: vec![],
                setup: DtlsSetup::default(),
                fingerprint_hash_function: DEFAULT_FINGERPRINT_HASH_FUNCTION.to_owned(),
                fingerprint: None,
                cname: None,
                rtcp_mux: false,
                ssrcs: vec![],
                payloads: vec![],
                media_stream_id: None,
                media_stream_track_id: None,
                sctp_port: None,
                sctp_stream_count: None,
                app_label: None,
            },
        }
    }

    pub fn stream_type(&self) -> StreamType {
        self.description.stream_type
    }

    pub fn mode(&self) -> StreamMode {
        self.description.mode
    }

    pub fn with_mode(mut self, mode: StreamMode) -> Self {
        self.description.mode = mode;
        self
    }

    pub fn set_mode(&mut self, mode: StreamMode) {
        self.description.mode = mode;
    }

    pub fn with_mid(mut self, mid: Option<String>) -> Self {
        self.description.mid = mid;
        self
    }

    pub fn with_ice_credentials(mut self, ufrag: String, password: String) -> Self {
        self.description.ufrag = Some(ufrag);
        self.description.password = Some(password);
        self
    }

    pub fn with_candidates(mut self, candidates: Vec<Candidate>) -> Self {
        self.description.candidates = candidates;
        self
    }

    pub fn add_candidate(&mut self, candidate: Candidate) {
        self.description.candidates.push(candidate);
    }

    pub fn with_setup(mut self, setup: DtlsSetup) -> Self {
        self.description.setup = setup;
        self
    }

    pub fn with_fingerprint_hash_function(mut self, hash_function: &str) -> Self {
        self.description.fingerprint_hash_function = hash_function.to_owned();
        self
    }

    pub fn with_fingerprint(mut self, fingerprint: Option<String>) -> Self {
        self.description.fingerprint = fingerprint;
        self
    }

    pub fn set_fingerprint(&mut self, fingerprint: String) {
        self.description.fingerprint = Some(fingerprint);
    }

    pub fn with_cname(mut self, cname: Option<String>) -> Self {
        self.description.cname = cname;
        self
    }

    pub fn set_cname(&mut self, cname: String) {
        self.description.cname = Some(cname);
    }

    pub fn with_rtcp_mux(mut self, rtcp_mux: bool) -> Self {
        self.description.rtcp_mux = rtcp_mux;
        self
    }

    pub fn with_ssrcs(mut self, ssrcs: Vec<u32>) -> Self {
        self.description.ssrcs = ssrcs;
        self
    }

    pub fn add_ssrc(&mut self, ssrc: u32) {
        if !self.description.ssrcs.contains(&ssrc) {
            self.description.ssrcs.push(ssrc);
        }
    }

    pub fn with_payloads(mut self, payloads: Vec<RTCPayload>) -> Self {
        self.description.payloads = payloads;
        self
    }

    pub fn with_media_stream_ids(
        mut self,
        media_stream_id: Option<String>,
        media_stream_track_id: Option<String>,
    ) -> Self {
        self.description.media_stream_id = media_stream_id;
        self.description.media_stream_track_id = media_stream_track_id;
        self
    }

    pub fn with_sctp(mut self, port: u16, stream_count: Option<u16>, app_label: &str) -> Self {
        self.description.sctp_port = Some(port);
        self.description.sctp_stream_count = stream_count;
        self.description.app_label = Some(app_label.to_owned());
        self
    }

    pub fn build(self) -> StreamDescription {
        self.description
    }
}

/// SessionDescription is the structured, immutable form of an offer or an
/// answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    sdp_type: RTCSdpType,
    session_id: u64,
    streams: Vec<StreamDescription>,
}

impl SessionDescription {
    pub fn sdp_type(&self) -> RTCSdpType {
        self.sdp_type
    }

    pub fn session_id(&self) -> u64 {
        self.session_id
    }

    pub fn streams(&self) -> &[StreamDescription] {
        &self.streams
    }
}

#[derive(Default)]
pub struct SessionDescriptionBuilder {
    sdp_type: RTCSdpType,
    session_id: u64,
    streams: Vec<StreamDescription>,
}

impl SessionDescriptionBuilder {
    pub fn new(sdp_type: RTCSdpType) -> Self {
        SessionDescriptionBuilder {
            sdp_type,
            ..Default::default()
        }
    }

    pub fn with_session_id(mut self, session_id: u64) -> Self {
        self.session_id = session_id;
        self
    }

    pub fn with_stream(mut self, stream: StreamDescription) -> Self {
        self.streams.push(stream);
        self
    }

    pub fn with_streams(mut self, streams: Vec<StreamDescription>) -> Self {
        self.streams = streams;
        self
    }

    pub fn build(self) -> SessionDescription {
        SessionDescription {
            sdp_type: self.sdp_type,
            session_id: self.session_id,
            streams: self.streams,
        }
    }
}
