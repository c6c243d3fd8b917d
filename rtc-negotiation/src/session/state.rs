use std::fmt;

/// Indicates where an [`RTCSession`](super::RTCSession) stands in the
/// offer/answer exchange.
///
/// The initiating side moves through
///
/// ```text
/// Init → Setup → AwaitingAnswer → Active
/// ```
///
/// and the answering side through
///
/// ```text
/// Init → ReceivedOffer → Setup → Active
/// ```
///
/// Any state moves to `Stopped` on [`stop`](super::RTCSession::stop).
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RTCSessionState {
    /// Nothing happened yet.
    #[default]
    Init,

    /// A remote offer was accepted; the session answers it once set up.
    ReceivedOffer,

    /// Stream handlers exist and wait for their transports to report
    /// readiness.
    Setup,

    /// The local offer was delivered; the remote answer is pending.
    AwaitingAnswer,

    /// Both descriptions are known.
    Active,

    /// Terminal.
    Stopped,
}

const SESSION_STATE_INIT_STR: &str = "init";
const SESSION_STATE_RECEIVED_OFFER_STR: &str = "received-offer";
const SESSION_STATE_SETUP_STR: &str = "setup";
const SESSION_STATE_AWAITING_ANSWER_STR: &str = "awaiting-answer";
const SESSION_STATE_ACTIVE_STR: &str = "active";
const SESSION_STATE_STOPPED_STR: &str = "stopped";

impl fmt::Display for RTCSessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            RTCSessionState::Init => SESSION_STATE_INIT_STR,
            RTCSessionState::ReceivedOffer => SESSION_STATE_RECEIVED_OFFER_STR,
            RTCSessionState::Setup => SESSION_STATE_SETUP_STR,
            RTCSessionState::AwaitingAnswer => SESSION_STATE_AWAITING_ANSWER_STR,
            RTCSessionState::Active => SESSION_STATE_ACTIVE_STR,
            RTCSessionState::Stopped => SESSION_STATE_STOPPED_STR,
        };
        write!(f, "{s}")
    }
}
