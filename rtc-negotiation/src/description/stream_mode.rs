use std::fmt;

use sdp::Direction;

/// Media flow direction of a stream, seen from the local side.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum StreamMode {
    #[default]
    SendReceive,
    SendOnly,
    ReceiveOnly,
    Inactive,
}

impl StreamMode {
    /// Returns the mode for a local side that wants to send and/or receive.
    pub fn get(want_send: bool, want_receive: bool) -> Self {
        match (want_send, want_receive) {
            (true, true) => StreamMode::SendReceive,
            (true, false) => StreamMode::SendOnly,
            (false, true) => StreamMode::ReceiveOnly,
            (false, false) => StreamMode::Inactive,
        }
    }

    /// Returns the local mode answering a remote side that declared `self`.
    pub fn reverse(self, want_send: bool, want_receive: bool) -> Self {
        match self {
            StreamMode::Inactive => StreamMode::Inactive,
            StreamMode::SendOnly => {
                if want_receive {
                    StreamMode::ReceiveOnly
                } else {
                    StreamMode::Inactive
                }
            }
            StreamMode::ReceiveOnly => {
                if want_send {
                    StreamMode::SendOnly
                } else {
                    StreamMode::Inactive
                }
            }
            StreamMode::SendReceive => StreamMode::get(want_send, want_receive),
        }
    }

    pub fn is_sending(self) -> bool {
        matches!(self, StreamMode::SendReceive | StreamMode::SendOnly)
    }

    pub fn is_receiving(self) -> bool {
        matches!(self, StreamMode::SendReceive | StreamMode::ReceiveOnly)
    }
}

impl fmt::Display for StreamMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", Direction::from(*self))
    }
}

impl From<Direction> for StreamMode {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::SendRecv => StreamMode::SendReceive,
            Direction::SendOnly => StreamMode::SendOnly,
            Direction::RecvOnly => StreamMode::ReceiveOnly,
            Direction::Inactive => StreamMode::Inactive,
        }
    }
}

impl From<StreamMode> for Direction {
    fn from(mode: StreamMode) -> Self {
        match mode {
            StreamMode::SendReceive => Direction::SendRecv,
            StreamMode::SendOnly => Direction::SendOnly,
            StreamMode::ReceiveOnly => Direction::RecvOnly,
            StreamMode::Inactive => Direction::Inactive,
        }
    }
}
