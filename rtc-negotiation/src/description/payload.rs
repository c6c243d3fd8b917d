use sdp::{FmtpParameters, PayloadFormat};

pub const RTX_ENCODING_NAME: &str = "rtx";
pub const PARAM_APT: &str = "apt";
pub const PARAM_RTX_TIME: &str = "rtxTime";
pub const PARAM_PACKETIZATION_MODE: &str = "packetizationMode";

/// RTCPayload is one codec entry of a media stream.
///
/// Parameter keys are kept camelCase (`packetizationMode`, `rtxTime`, `apt`).
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct RTCPayload {
    pub payload_type: u8,
    pub encoding_name: String,
    pub clock_rate: u32,
    pub channels: Option<u16>,
    pub parameters: FmtpParameters,
    pub nack: bool,
    pub nack_pli: bool,
    pub ccm_fir: bool,
}

impl RTCPayload {
    pub fn new(payload_type: u8, encoding_name: &str, clock_rate: u32) -> Self {
        RTCPayload {
            payload_type,
            encoding_name: encoding_name.to_owned(),
            clock_rate,
            ..Default::default()
        }
    }

    /// Creates a retransmission payload associated with `apt`.
    pub fn rtx(payload_type: u8, apt: u8, clock_rate: u32) -> Self {
        RTCPayload::new(payload_type, RTX_ENCODING_NAME, clock_rate)
            .with_parameter(PARAM_APT, &apt.to_string())
    }

    pub fn with_channels(mut self, channels: u16) -> Self {
        self.channels = Some(channels);
        self
    }

    pub fn with_parameter(mut self, key: &str, value: &str) -> Self {
        self.parameters.insert(key, value);
        self
    }

    pub fn with_feedback(mut self, nack: bool, nack_pli: bool, ccm_fir: bool) -> Self {
        self.nack = nack;
        self.nack_pli = nack_pli;
        self.ccm_fir = ccm_fir;
        self
    }

    pub fn is_rtx(&self) -> bool {
        self.encoding_name.eq_ignore_ascii_case(RTX_ENCODING_NAME)
    }

    /// Payload type this retransmission payload is associated with.
    pub fn apt(&self) -> Option<u8> {
        self.parameters.get(PARAM_APT)?.parse().ok()
    }

    pub fn rtx_time(&self) -> Option<u32> {
        self.parameters.get(PARAM_RTX_TIME)?.parse().ok()
    }

    pub fn packetization_mode(&self) -> Option<&str> {
        self.parameters.get(PARAM_PACKETIZATION_MODE)
    }
}

impl From<&PayloadFormat> for RTCPayload {
    fn from(format: &PayloadFormat) -> Self {
        RTCPayload {
            payload_type: format.payload_type,
            encoding_name: format.encoding_name.clone(),
            clock_rate: format.clock_rate,
            channels: format.channels,
            parameters: format.parameters.clone(),
            nack: format.nack,
            nack_pli: format.nack_pli,
            ccm_fir: format.ccm_fir,
        }
    }
}

impl From<&RTCPayload> for PayloadFormat {
    fn from(payload: &RTCPayload) -> Self {
        PayloadFormat {
            payload_type: payload.payload_type,
            encoding_name: payload.encoding_name.clone(),
            clock_rate: payload.clock_rate,
            channels: payload.channels,
            parameters: payload.parameters.clone(),
            nack: payload.nack,
            nack_pli: payload.nack_pli,
            ccm_fir: payload.ccm_fir,
        }
    }
}
