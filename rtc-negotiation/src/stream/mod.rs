pub mod fingerprint;
pub mod handler;

use crate::description::StreamType;
use crate::media_engine::MediaSourceHandle;

/// A locally requested audio or video stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaStreamRequest {
    pub stream_type: StreamType,
    pub want_send: bool,
    pub want_receive: bool,
    pub source: Option<MediaSourceHandle>,
    pub media_stream_id: Option<String>,
    pub track_id: Option<String>,
}

/// A locally requested data stream.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct DataStreamRequest {
    pub app_label: Option<String>,
}

/// One stream the application asks the session to negotiate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamRequest {
    Media(MediaStreamRequest),
    Data(DataStreamRequest),
}

impl StreamRequest {
    pub fn audio(want_send: bool, want_receive: bool) -> Self {
        StreamRequest::media(StreamType::Audio, want_send, want_receive)
    }

    pub fn video(want_send: bool, want_receive: bool) -> Self {
        StreamRequest::media(StreamType::Video, want_send, want_receive)
    }

    pub fn data() -> Self {
        StreamRequest::Data(DataStreamRequest::default())
    }

    fn media(stream_type: StreamType, want_send: bool, want_receive: bool) -> Self {
        StreamRequest::Media(MediaStreamRequest {
            stream_type,
            want_send,
            want_receive,
            source: None,
            media_stream_id: None,
            track_id: None,
        })
    }

    /// Sets the source to send from. No-op on data streams.
    pub fn with_source(mut self, source: MediaSourceHandle) -> Self {
        if let StreamRequest::Media(media) = &mut self {
            media.source = Some(source);
        }
        self
    }

    /// Sets the stream and track identifiers. No-op on data streams.
    pub fn with_ids(mut self, media_stream_id: &str, track_id: &str) -> Self {
        if let StreamRequest::Media(media) = &mut self {
            media.media_stream_id = Some(media_stream_id.to_owned());
            media.track_id = Some(track_id.to_owned());
        }
        self
    }

    pub fn stream_type(&self) -> StreamType {
        match self {
            StreamRequest::Media(media) => media.stream_type,
            StreamRequest::Data(_) => StreamType::Data,
        }
    }

    pub fn want_send(&self) -> bool {
        match self {
            StreamRequest::Media(media) => media.want_send,
            StreamRequest::Data(_) => true,
        }
    }

    pub fn want_receive(&self) -> bool {
        match self {
            StreamRequest::Media(media) => media.want_receive,
            StreamRequest::Data(_) => true,
        }
    }
}

/// Ordered set of requested streams.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct StreamSet {
    streams: Vec<StreamRequest>,
}

impl StreamSet {
    pub fn new() -> Self {
        StreamSet::default()
    }

    pub fn with_stream(mut self, stream: StreamRequest) -> Self {
        self.streams.push(stream);
        self
    }

    pub fn streams(&self) -> &[StreamRequest] {
        &self.streams
    }

    pub fn len(&self) -> usize {
        self.streams.len()
    }

    pub fn is_empty(&self) -> bool {
        self.streams.is_empty()
    }
}

impl From<Vec<StreamRequest>> for StreamSet {
    fn from(streams: Vec<StreamRequest>) -> Self {
        StreamSet { streams }
    }
}
