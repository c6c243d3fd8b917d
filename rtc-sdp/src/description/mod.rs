
pub mod common;
pub mod media;
pub mod session;

pub(crate) const END_LINE: &str = "\r\n";

pub const ATTR_KEY_CANDIDATE: &str = "candidate";
pub const ATTR_KEY_END_OF_CANDIDATES: &str = "end-of-candidates";
pub const ATTR_KEY_ICE_UFRAG: &str = "ice-ufrag";
pub const ATTR_KEY_ICE_PWD: &str = "ice-pwd";
pub const ATTR_KEY_FINGERPRINT: &str = "fingerprint";
pub const ATTR_KEY_SETUP: &str = "setup";
pub const ATTR_KEY_MID: &str = "mid";
pub const ATTR_KEY_MSID: &str = "msid";
pub const ATTR_KEY_MSID_SEMANTIC: &str = "msid-semantic";
pub const ATTR_KEY_RTPMAP: &str = "rtpmap";
pub const ATTR_KEY_FMTP: &str = "fmtp";
pub const ATTR_KEY_RTCP_FB: &str = "rtcp-fb";
pub const ATTR_KEY_RTCP: &str = "rtcp";
pub const ATTR_KEY_RTCP_MUX: &str = "rtcp-mux";
pub const ATTR_KEY_SSRC: &str = "ssrc";
pub const ATTR_KEY_SCTPMAP: &str = "sctpmap";
pub const ATTR_KEY_SCTP_PORT: &str = "sctp-port";
