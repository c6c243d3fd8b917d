use std::fmt;

use crate::description::StreamType;

/// Codecs the media engine can be configured with.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Codec {
    Opus,
    Pcma,
    Pcmu,
    G722,
    Vp8,
    Vp9,
    H264,
}

impl Codec {
    /// Resolves an encoding name for the given stream type, case-insensitively.
    pub fn from_name(name: &str, stream_type: StreamType) -> Option<Self> {
        let codec = match name.to_ascii_uppercase().as_str() {
            "OPUS" => Codec::Opus,
            "PCMA" => Codec::Pcma,
            "PCMU" => Codec::Pcmu,
            "G722" => Codec::G722,
            "VP8" => Codec::Vp8,
            "VP9" => Codec::Vp9,
            "H264" => Codec::H264,
            _ => return None,
        };
        if codec.stream_type() == stream_type {
            Some(codec)
        } else {
            None
        }
    }

    pub fn stream_type(self) -> StreamType {
        match self {
            Codec::Opus | Codec::Pcma | Codec::Pcmu | Codec::G722 => StreamType::Audio,
            Codec::Vp8 | Codec::Vp9 | Codec::H264 => StreamType::Video,
        }
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Codec::Opus => "opus",
            Codec::Pcma => "PCMA",
            Codec::Pcmu => "PCMU",
            Codec::G722 => "G722",
            Codec::Vp8 => "VP8",
            Codec::Vp9 => "VP9",
            Codec::H264 => "H264",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioPayload {
    pub payload_type: u8,
    pub codec: Codec,
    pub clock_rate: u32,
    pub channels: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VideoPayload {
    pub payload_type: u8,
    pub codec: Codec,
    pub clock_rate: u32,
    pub ccm_fir: bool,
    pub nack_pli: bool,
    pub rtx_payload_type: Option<u8>,
    pub rtx_time: Option<u32>,
}

/// Concrete payload configuration handed to a media transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportPayload {
    Audio(AudioPayload),
    Video(VideoPayload),
}

impl TransportPayload {
    pub fn payload_type(&self) -> u8 {
        match self {
            TransportPayload::Audio(audio) => audio.payload_type,
            TransportPayload::Video(video) => video.payload_type,
        }
    }

    pub fn codec(&self) -> Codec {
        match self {
            TransportPayload::Audio(audio) => audio.codec,
            TransportPayload::Video(video) => video.codec,
        }
    }
}
