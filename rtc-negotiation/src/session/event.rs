use ice::candidate::Candidate;

use super::state::RTCSessionState;
use crate::description::SessionDescription;
use crate::media_engine::{DataChannelParameters, MediaSourceHandle};

/// Application-facing events, drained with
/// [`RTCSession::poll_event`](super::RTCSession::poll_event).
#[allow(clippy::enum_variant_names)]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RTCSessionEvent {
    /// The local offer or answer is complete and can be sent to the remote
    /// peer. Emitted once per session.
    OnSetupComplete(SessionDescription),

    /// A local candidate gathered after the description was completed, to be
    /// trickled to the remote peer.
    OnLocalCandidate(Candidate),

    OnStateChange(RTCSessionState),

    /// The remote peer started sending on stream `stream_index`.
    OnRemoteSource {
        stream_index: usize,
        source: MediaSourceHandle,
    },

    /// The remote peer opened a data channel on stream `stream_index`.
    OnDataChannel {
        stream_index: usize,
        parameters: DataChannelParameters,
    },

    /// The locally requested stream at `local_index` found no remote
    /// counterpart and stays inactive.
    OnLocalStreamInactive { local_index: usize },
}
