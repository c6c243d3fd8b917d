//! The offer/answer state machine.
//!
//! An [`RTCSession`] pairs the locally requested streams with the streams of
//! the remote peer, drives one [`StreamHandler`] per paired stream and
//! assembles the local offer or answer once every handler reports readiness.
//!
//! Like the rest of the stack the session performs no I/O: the application
//! feeds it remote descriptions, remote candidates and media engine signals,
//! and drains the resulting [`RTCSessionEvent`]s with
//! [`RTCSession::poll_event`].
//!
//! ```text
//!             initiator                          answerer
//!   setup(streams)                      set_remote_description(offer)
//!   ... handle_media_event ...          setup(streams)
//!   OnSetupComplete(offer)  ------->    ... handle_media_event ...
//!                           <-------    OnSetupComplete(answer)
//!   set_remote_description(answer)
//! ```

pub mod event;
pub mod state;

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use ice::candidate::Candidate;
use log::{debug, trace, warn};
use shared::error::{Error, Result};
use shared::util::rand_session_id;

use crate::configuration::RTCSessionConfiguration;
use crate::description::{
    RTCSdpType, SessionDescription, SessionDescriptionBuilder, StreamMode, StreamType,
};
use crate::media_engine::{MediaEngine, MediaEngineEvent};
use crate::stream::StreamSet;
use crate::stream::handler::StreamHandler;

pub use event::RTCSessionEvent;
pub use state::RTCSessionState;

/// RTCSession negotiates the streams of one call with one remote peer.
///
/// Every method takes the session lock, so a session can be shared between
/// the application and the thread delivering media engine signals.
pub struct RTCSession {
    internal: Mutex<RTCSessionInternal>,
}

struct RTCSessionInternal {
    config: RTCSessionConfiguration,
    engine: Box<dyn MediaEngine>,

    state: RTCSessionState,
    is_answerer: bool,
    session_id: u64,

    handlers: Vec<StreamHandler>,
    // handler index of each locally requested stream, None when unpaired
    local_handlers: Vec<Option<usize>>,

    local_description: Option<SessionDescription>,
    remote_description: Option<SessionDescription>,

    pending_candidates: VecDeque<Candidate>,
    events: VecDeque<RTCSessionEvent>,
}

impl RTCSession {
    pub fn new(config: RTCSessionConfiguration, engine: Box<dyn MediaEngine>) -> Self {
        RTCSession {
            internal: Mutex::new(RTCSessionInternal {
                config,
                engine,
                state: RTCSessionState::Init,
                is_answerer: false,
                session_id: rand_session_id(),
                handlers: vec![],
                local_handlers: vec![],
                local_description: None,
                remote_description: None,
                pending_candidates: VecDeque::new(),
                events: VecDeque::new(),
            }),
        }
    }

    /// Creates the stream handlers for the requested streams.
    ///
    /// Without a remote offer every request gets its own handler and the
    /// session will produce an offer. After
    /// [`set_remote_description`](Self::set_remote_description) accepted an
    /// offer, requests are paired with the remote streams by type in order;
    /// requests left over are reported with
    /// [`RTCSessionEvent::OnLocalStreamInactive`].
    pub fn setup(&self, streams: StreamSet) -> Result<()> {
        let mut internal = self.internal.lock()?;
        internal.setup(streams)
    }

    /// Accepts the remote offer (before [`setup`](Self::setup)) or the remote
    /// answer (once the local offer was delivered).
    pub fn set_remote_description(&self, description: SessionDescription) -> Result<()> {
        let mut internal = self.internal.lock()?;
        internal.set_remote_description(description)
    }

    /// Routes a remote candidate to its stream, or buffers it until the remote
    /// description is known and the streams exist.
    pub fn add_remote_candidate(&self, candidate: Candidate) -> Result<()> {
        let mut internal = self.internal.lock()?;
        internal.add_remote_candidate(candidate)
    }

    /// Feeds a signal of the transport of stream `stream_index` into the
    /// session.
    pub fn handle_media_event(&self, stream_index: usize, event: MediaEngineEvent) -> Result<()> {
        let mut internal = self.internal.lock()?;
        internal.handle_media_event(stream_index, event)
    }

    /// Closes every transport and drops all pending state. Calling it again
    /// has no effect.
    pub fn stop(&self) -> Result<()> {
        let mut internal = self.internal.lock()?;
        internal.stop();
        Ok(())
    }

    #[deprecated(note = "use `stop` instead")]
    pub fn end(&self) -> Result<()> {
        self.stop()
    }

    /// Returns the next queued event, if any.
    pub fn poll_event(&self) -> Result<Option<RTCSessionEvent>> {
        Ok(self.internal.lock()?.events.pop_front())
    }

    pub fn state(&self) -> Result<RTCSessionState> {
        Ok(self.internal.lock()?.state)
    }

    pub fn is_answerer(&self) -> Result<bool> {
        Ok(self.internal.lock()?.is_answerer)
    }

    pub fn session_id(&self) -> Result<u64> {
        Ok(self.internal.lock()?.session_id)
    }

    /// Returns the mode of every negotiated stream, in description order.
    pub fn stream_modes(&self) -> Result<Vec<StreamMode>> {
        let internal = self.internal.lock()?;
        Ok(internal.handlers.iter().map(StreamHandler::mode).collect())
    }

    /// Returns the mode of every locally requested stream, in request order.
    /// Requests without a remote counterpart are inactive.
    pub fn local_stream_modes(&self) -> Result<Vec<StreamMode>> {
        let internal = self.internal.lock()?;
        Ok(internal
            .local_handlers
            .iter()
            .map(|index| {
                index
                    .and_then(|index| internal.handlers.get(index))
                    .map(StreamHandler::mode)
                    .unwrap_or(StreamMode::Inactive)
            })
            .collect())
    }

    pub fn local_description(&self) -> Result<Option<SessionDescription>> {
        Ok(self.internal.lock()?.local_description.clone())
    }

    pub fn remote_description(&self) -> Result<Option<SessionDescription>> {
        Ok(self.internal.lock()?.remote_description.clone())
    }
}

impl RTCSessionInternal {
    fn set_state(&mut self, state: RTCSessionState) {
        if self.state != state {
            debug!("session state {} -> {}", self.state, state);
            self.state = state;
            self.events.push_back(RTCSessionEvent::OnStateChange(state));
        }
    }

    fn setup(&mut self, streams: StreamSet) -> Result<()> {
        let result = match self.state {
            RTCSessionState::Init => self.create_offering_handlers(&streams),
            RTCSessionState::ReceivedOffer => self.create_answering_handlers(&streams),
            state => {
                return Err(Error::ErrProtocolViolation(format!(
                    "setup in state {state}"
                )));
            }
        };
        if let Err(err) = result {
            self.close_handlers();
            return Err(err);
        }

        self.set_state(RTCSessionState::Setup);
        self.replay_pending_candidates();
        self.maybe_finalize();

        Ok(())
    }

    fn create_offering_handlers(&mut self, streams: &StreamSet) -> Result<()> {
        for (index, request) in streams.streams().iter().enumerate() {
            let handler = StreamHandler::new(
                index,
                Some(request),
                None,
                &self.config,
                self.engine.as_mut(),
            )?;
            self.handlers.push(handler);
            self.local_handlers.push(Some(index));
        }
        Ok(())
    }

    fn create_answering_handlers(&mut self, streams: &StreamSet) -> Result<()> {
        let Some(remote) = self.remote_description.as_ref() else {
            return Err(Error::ErrProtocolViolation(
                "answering without a remote offer".to_owned(),
            ));
        };

        let mut queues: HashMap<StreamType, VecDeque<usize>> = HashMap::new();
        for (local_index, request) in streams.streams().iter().enumerate() {
            queues
                .entry(request.stream_type())
                .or_default()
                .push_back(local_index);
        }

        self.local_handlers = vec![None; streams.len()];
        for (index, remote_stream) in remote.streams().iter().enumerate() {
            let local_index = queues
                .get_mut(&remote_stream.stream_type())
                .and_then(VecDeque::pop_front);
            let request = local_index.map(|local_index| &streams.streams()[local_index]);

            let handler = StreamHandler::new(
                index,
                request,
                Some(remote_stream),
                &self.config,
                self.engine.as_mut(),
            )?;
            self.handlers.push(handler);

            match local_index {
                Some(local_index) => self.local_handlers[local_index] = Some(index),
                None => debug!(
                    "remote stream {index}: no local {} stream left",
                    remote_stream.stream_type()
                ),
            }
        }

        for (local_index, handler) in self.local_handlers.iter().enumerate() {
            if handler.is_none() {
                debug!("local stream {local_index}: no remote counterpart");
                self.events
                    .push_back(RTCSessionEvent::OnLocalStreamInactive { local_index });
            }
        }

        Ok(())
    }

    fn set_remote_description(&mut self, description: SessionDescription) -> Result<()> {
        match (self.state, description.sdp_type()) {
            (RTCSessionState::Init, RTCSdpType::Offer) => {
                self.is_answerer = true;
                self.remote_description = Some(description);
                self.set_state(RTCSessionState::ReceivedOffer);
                Ok(())
            }
            (RTCSessionState::AwaitingAnswer, RTCSdpType::Answer) => self.apply_answer(description),
            (state, sdp_type) => Err(Error::ErrProtocolViolation(format!(
                "remote {sdp_type} in state {state}"
            ))),
        }
    }

    fn apply_answer(&mut self, description: SessionDescription) -> Result<()> {
        if description.streams().len() != self.handlers.len() {
            return Err(Error::ErrProtocolViolation(format!(
                "answer carries {} streams, offered {}",
                description.streams().len(),
                self.handlers.len()
            )));
        }
        for (handler, remote) in self.handlers.iter().zip(description.streams()) {
            if handler.stream_type() != remote.stream_type() {
                return Err(Error::ErrProtocolViolation(format!(
                    "stream {}: answered {} to offered {}",
                    handler.index(),
                    remote.stream_type(),
                    handler.stream_type()
                )));
            }
        }

        let config = &self.config;
        let applied = self
            .handlers
            .iter_mut()
            .zip(description.streams())
            .try_for_each(|(handler, remote)| handler.set_remote_description(remote, config));
        if let Err(err) = applied {
            warn!("answer rejected by the media engine: {err}");
            self.stop();
            return Err(err);
        }

        self.remote_description = Some(description);
        self.set_state(RTCSessionState::Active);
        self.replay_pending_candidates();

        Ok(())
    }

    fn accepts_remote_candidates(&self) -> bool {
        self.remote_description.is_some()
            && !matches!(
                self.state,
                RTCSessionState::ReceivedOffer | RTCSessionState::Stopped
            )
    }

    fn add_remote_candidate(&mut self, candidate: Candidate) -> Result<()> {
        if self.state == RTCSessionState::Stopped {
            trace!("session stopped, dropping remote candidate {candidate}");
            Ok(())
        } else if self.accepts_remote_candidates() {
            self.dispatch_remote_candidate(&candidate)
        } else {
            trace!("buffering remote candidate {candidate}");
            self.pending_candidates.push_back(candidate);
            Ok(())
        }
    }

    fn dispatch_remote_candidate(&mut self, candidate: &Candidate) -> Result<()> {
        let index = candidate
            .stream_index
            .filter(|index| *index < self.handlers.len())
            .or_else(|| {
                candidate.stream_id.as_deref().and_then(|mid| {
                    self.handlers
                        .iter()
                        .position(|handler| handler.mid() == Some(mid))
                })
            });

        match index.and_then(|index| self.handlers.get_mut(index)) {
            Some(handler) => handler.add_remote_candidate(candidate),
            None => Err(Error::ErrInvalidArgument(format!(
                "no stream for remote candidate {candidate}"
            ))),
        }
    }

    fn replay_pending_candidates(&mut self) {
        if !self.accepts_remote_candidates() {
            return;
        }
        while let Some(candidate) = self.pending_candidates.pop_front() {
            if let Err(err) = self.dispatch_remote_candidate(&candidate) {
                warn!("dropping buffered candidate {candidate}: {err}");
            }
        }
    }

    fn handle_media_event(&mut self, stream_index: usize, event: MediaEngineEvent) -> Result<()> {
        if self.state == RTCSessionState::Stopped {
            trace!("session stopped, dropping media event of stream {stream_index}");
            return Ok(());
        }
        let Some(handler) = self.handlers.get_mut(stream_index) else {
            return Err(Error::ErrInvalidArgument(format!(
                "media event for unknown stream {stream_index}"
            )));
        };

        match event {
            MediaEngineEvent::NewCandidate(candidate) => {
                if let Some(candidate) = handler.on_new_candidate(candidate) {
                    self.events
                        .push_back(RTCSessionEvent::OnLocalCandidate(candidate));
                }
            }
            MediaEngineEvent::DtlsCertificateChanged(pem_certificate) => {
                handler.on_dtls_certificate_changed(&pem_certificate)
            }
            MediaEngineEvent::CnameChanged(cname) => handler.on_cname_changed(cname),
            MediaEngineEvent::SendSsrcChanged(ssrc) => handler.on_send_ssrc_changed(ssrc),
            MediaEngineEvent::IncomingSource(source) => {
                if handler.on_incoming_source(source) {
                    self.events.push_back(RTCSessionEvent::OnRemoteSource {
                        stream_index,
                        source,
                    });
                }
            }
            MediaEngineEvent::DataChannelRequested(parameters) => {
                if handler.on_data_channel_requested(&parameters) {
                    self.events.push_back(RTCSessionEvent::OnDataChannel {
                        stream_index,
                        parameters,
                    });
                }
            }
        }

        self.maybe_finalize();
        Ok(())
    }

    /// Assembles the local description once every handler is ready. Only acts
    /// in state `Setup`, which it leaves.
    fn maybe_finalize(&mut self) {
        if self.state != RTCSessionState::Setup
            || !self.handlers.iter().all(StreamHandler::is_ready)
        {
            return;
        }

        let streams = self
            .handlers
            .iter_mut()
            .map(StreamHandler::finalize)
            .collect();
        let (sdp_type, next_state) = if self.is_answerer {
            (RTCSdpType::Answer, RTCSessionState::Active)
        } else {
            (RTCSdpType::Offer, RTCSessionState::AwaitingAnswer)
        };
        let description = SessionDescriptionBuilder::new(sdp_type)
            .with_session_id(self.session_id)
            .with_streams(streams)
            .build();
        debug!(
            "local {sdp_type} complete with {} streams",
            description.streams().len()
        );

        self.local_description = Some(description.clone());
        self.events
            .push_back(RTCSessionEvent::OnSetupComplete(description));
        self.set_state(next_state);
    }

    fn close_handlers(&mut self) {
        for handler in self.handlers.iter_mut() {
            handler.close();
        }
        self.handlers.clear();
        self.local_handlers.clear();
    }

    fn stop(&mut self) {
        if self.state == RTCSessionState::Stopped {
            return;
        }
        self.close_handlers();
        self.pending_candidates.clear();
        self.set_state(RTCSessionState::Stopped);
    }
}
