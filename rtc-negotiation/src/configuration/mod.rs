pub mod helper_server;

use crate::description::payload::{PARAM_PACKETIZATION_MODE, RTCPayload};
use crate::description::{DEFAULT_FINGERPRINT_HASH_FUNCTION, StreamType};
use helper_server::HelperServer;

pub const DEFAULT_SCTP_PORT: u16 = 5000;
pub const DEFAULT_SCTP_STREAM_COUNT: u16 = 1024;
pub const DEFAULT_DATA_APP_LABEL: &str = "webrtc-datachannel";
pub const DEFAULT_ICE_UFRAG_LENGTH: usize = 16;
pub const DEFAULT_ICE_PASSWORD_LENGTH: usize = 32;

const OPUS_PAYLOAD_TYPE: u8 = 111;
const PCMA_PAYLOAD_TYPE: u8 = 8;
const PCMU_PAYLOAD_TYPE: u8 = 0;
const VP8_PAYLOAD_TYPE: u8 = 100;
const VP8_RTX_PAYLOAD_TYPE: u8 = 120;
const H264_PAYLOAD_TYPE: u8 = 103;
const H264_RTX_PAYLOAD_TYPE: u8 = 123;

const AUDIO_CLOCK_RATE_OPUS: u32 = 48000;
const AUDIO_CLOCK_RATE_G711: u32 = 8000;
const VIDEO_CLOCK_RATE: u32 = 90000;

/// Default audio payloads, in order of preference.
pub fn default_audio_payloads() -> Vec<RTCPayload> {
    vec![
        RTCPayload::new(OPUS_PAYLOAD_TYPE, "opus", AUDIO_CLOCK_RATE_OPUS)
            .with_channels(2)
            .with_parameter("minptime", "10")
            .with_parameter("useinbandfec", "1"),
        RTCPayload::new(PCMA_PAYLOAD_TYPE, "PCMA", AUDIO_CLOCK_RATE_G711),
        RTCPayload::new(PCMU_PAYLOAD_TYPE, "PCMU", AUDIO_CLOCK_RATE_G711),
    ]
}

/// Default video payloads, in order of preference, each followed by its RTX.
pub fn default_video_payloads() -> Vec<RTCPayload> {
    vec![
        RTCPayload::new(VP8_PAYLOAD_TYPE, "VP8", VIDEO_CLOCK_RATE).with_feedback(true, true, true),
        RTCPayload::rtx(VP8_RTX_PAYLOAD_TYPE, VP8_PAYLOAD_TYPE, VIDEO_CLOCK_RATE),
        RTCPayload::new(H264_PAYLOAD_TYPE, "H264", VIDEO_CLOCK_RATE)
            .with_parameter("levelAsymmetryAllowed", "1")
            .with_parameter(PARAM_PACKETIZATION_MODE, "1")
            .with_parameter("profileLevelId", "42e01f")
            .with_feedback(true, true, true),
        RTCPayload::rtx(H264_RTX_PAYLOAD_TYPE, H264_PAYLOAD_TYPE, VIDEO_CLOCK_RATE),
    ]
}

/// RTCSessionConfiguration holds the local preferences of a negotiation
/// session. Build one with [`RTCSessionConfigurationBuilder`].
#[derive(Debug, Clone)]
pub struct RTCSessionConfiguration {
    pub(crate) helper_servers: Vec<HelperServer>,

    pub(crate) audio_payloads: Vec<RTCPayload>,

    pub(crate) video_payloads: Vec<RTCPayload>,

    /// keep the remote payload order in answers instead of the local preference
    pub(crate) respect_remote_payload_order: bool,

    pub(crate) fingerprint_hash_function: String,

    pub(crate) sctp_port: u16,

    pub(crate) sctp_stream_count: u16,

    pub(crate) data_app_label: String,

    pub(crate) ice_ufrag_length: usize,

    pub(crate) ice_password_length: usize,
}

impl Default for RTCSessionConfiguration {
    fn default() -> Self {
        RTCSessionConfigurationBuilder::new().build()
    }
}

impl RTCSessionConfiguration {
    pub fn helper_servers(&self) -> &[HelperServer] {
        &self.helper_servers
    }

    /// Returns the default payloads for a stream type, empty for data streams.
    pub fn default_payloads(&self, stream_type: StreamType) -> &[RTCPayload] {
        match stream_type {
            StreamType::Audio => &self.audio_payloads,
            StreamType::Video => &self.video_payloads,
            StreamType::Data => &[],
        }
    }

    pub fn respect_remote_payload_order(&self) -> bool {
        self.respect_remote_payload_order
    }

    pub fn fingerprint_hash_function(&self) -> &str {
        &self.fingerprint_hash_function
    }

    pub fn sctp_port(&self) -> u16 {
        self.sctp_port
    }

    pub fn sctp_stream_count(&self) -> u16 {
        self.sctp_stream_count
    }

    pub fn data_app_label(&self) -> &str {
        &self.data_app_label
    }

    pub fn ice_ufrag_length(&self) -> usize {
        self.ice_ufrag_length
    }

    pub fn ice_password_length(&self) -> usize {
        self.ice_password_length
    }
}

pub struct RTCSessionConfigurationBuilder {
    helper_servers: Vec<HelperServer>,
    audio_payloads: Vec<RTCPayload>,
    video_payloads: Vec<RTCPayload>,
    respect_remote_payload_order: bool,
    fingerprint_hash_function: String,
    sctp_port: u16,
    sctp_stream_count: u16,
    data_app_label: String,
    ice_ufrag_length: usize,
    ice_password_length: usize,
}

impl Default for RTCSessionConfigurationBuilder {
    fn default() -> Self {
        RTCSessionConfigurationBuilder {
            helper_servers: vec![],
            audio_payloads: default_audio_payloads(),
            video_payloads: default_video_payloads(),
            respect_remote_payload_order: false,
            fingerprint_hash_function: DEFAULT_FINGERPRINT_HASH_FUNCTION.to_owned(),
            sctp_port: DEFAULT_SCTP_PORT,
            sctp_stream_count: DEFAULT_SCTP_STREAM_COUNT,
            data_app_label: DEFAULT_DATA_APP_LABEL.to_owned(),
            ice_ufrag_length: DEFAULT_ICE_UFRAG_LENGTH,
            ice_password_length: DEFAULT_ICE_PASSWORD_LENGTH,
        }
    }
}

impl RTCSessionConfigurationBuilder {
    pub fn new() -> Self {
        RTCSessionConfigurationBuilder::default()
    }

    pub fn with_helper_servers(mut self, helper_servers: Vec<HelperServer>) -> Self {
        self.helper_servers = helper_servers;
        self
    }

    pub fn with_audio_payloads(mut self, audio_payloads: Vec<RTCPayload>) -> Self {
        self.audio_payloads = audio_payloads;
        self
    }

    pub fn with_video_payloads(mut self, video_payloads: Vec<RTCPayload>) -> Self {
        self.video_payloads = video_payloads;
        self
    }

    pub fn with_respect_remote_payload_order(mut self, respect_remote_payload_order: bool) -> Self {
        self.respect_remote_payload_order = respect_remote_payload_order;
        self
    }

    pub fn with_fingerprint_hash_function(mut self, fingerprint_hash_function: &str) -> Self {
        self.fingerprint_hash_function = fingerprint_hash_function.to_owned();
        self
    }

    pub fn with_sctp_port(mut self, sctp_port: u16) -> Self {
        self.sctp_port = sctp_port;
        self
    }

    pub fn with_sctp_stream_count(mut self, sctp_stream_count: u16) -> Self {
        self.sctp_stream_count = sctp_stream_count;
        self
    }

    pub fn with_data_app_label(mut self, data_app_label: &str) -> Self {
        self.data_app_label = data_app_label.to_owned();
        self
    }

    pub fn with_ice_credential_lengths(mut self, ufrag_length: usize, password_length: usize) -> Self {
        self.ice_ufrag_length = ufrag_length;
        self.ice_password_length = password_length;
        self
    }

    pub fn build(self) -> RTCSessionConfiguration {
        RTCSessionConfiguration {
            helper_servers: self.helper_servers,
            audio_payloads: self.audio_payloads,
            video_payloads: self.video_payloads,
            respect_remote_payload_order: self.respect_remote_payload_order,
            fingerprint_hash_function: self.fingerprint_hash_function,
            sctp_port: self.sctp_port,
            sctp_stream_count: self.sctp_stream_count,
            data_app_label: self.data_app_label,
            ice_ufrag_length: self.ice_ufrag_length,
            ice_password_length: self.ice_password_length,
        }
    }
}
