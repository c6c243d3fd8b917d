use ice::candidate::{Candidate, CandidateComponent};
use log::{debug, error, trace, warn};
use shared::error::{Error, Result};
use shared::util::{math_rand_alpha_number, rand_ice_chars};

use super::fingerprint::compute_fingerprint;
use super::StreamRequest;
use crate::configuration::RTCSessionConfiguration;
use crate::description::{
    DtlsSetup, RTCPayload, StreamDescription, StreamDescriptionBuilder, StreamMode, StreamType,
};
use crate::media_engine::{
    DataChannelParameters, MediaEngine, MediaSourceHandle, MediaTransport, TransportConfig,
};
use crate::payload::codec::TransportPayload;
use crate::payload::{intersect, reorder_by_preference, select_preferred, transform};

const MEDIA_STREAM_ID_LENGTH: usize = 16;

/// State shared by media and data stream handlers: the local description
/// under construction, the paired remote description and the transport.
pub struct NegotiationState {
    index: usize,
    mid: Option<String>,
    ufrag: String,
    password: String,
    setup: DtlsSetup,
    hash_function: String,
    want_send: bool,
    want_receive: bool,

    local: StreamDescriptionBuilder,
    remote: Option<StreamDescription>,
    negotiated_mode: Option<StreamMode>,
    transport: Option<Box<dyn MediaTransport>>,

    candidate_gathered: bool,
    fingerprint_computed: bool,
    finalized: bool,
}

impl NegotiationState {
    fn new(
        index: usize,
        stream_type: StreamType,
        request: Option<&StreamRequest>,
        remote: Option<&StreamDescription>,
        config: &RTCSessionConfiguration,
    ) -> Self {
        let (want_send, want_receive) = request
            .map(|r| (r.want_send(), r.want_receive()))
            .unwrap_or((false, false));

        let (mode, setup, hash_function, mid) = match remote {
            None => (
                StreamMode::get(want_send, want_receive),
                DtlsSetup::Actpass,
                config.fingerprint_hash_function().to_owned(),
                Some(index.to_string()),
            ),
            Some(remote) => (
                remote.mode().reverse(want_send, want_receive),
                remote.setup().counterpart(),
                remote.fingerprint_hash_function().to_owned(),
                remote.mid().map(str::to_owned),
            ),
        };

        let ufrag = rand_ice_chars(config.ice_ufrag_length());
        let password = rand_ice_chars(config.ice_password_length());

        let local = StreamDescriptionBuilder::new(stream_type)
            .with_mode(mode)
            .with_mid(mid.clone())
            .with_ice_credentials(ufrag.clone(), password.clone())
            .with_setup(setup)
            .with_fingerprint_hash_function(&hash_function);

        NegotiationState {
            index,
            mid,
            ufrag,
            password,
            setup,
            hash_function,
            want_send,
            want_receive,
            local,
            remote: remote.cloned(),
            negotiated_mode: None,
            transport: None,
            candidate_gathered: false,
            fingerprint_computed: false,
            finalized: false,
        }
    }

    fn mode(&self) -> StreamMode {
        self.negotiated_mode.unwrap_or_else(|| self.local.mode())
    }

    fn open_transport(
        &mut self,
        engine: &mut dyn MediaEngine,
        config: &RTCSessionConfiguration,
    ) -> Result<()> {
        let mut transport = engine.create_transport(TransportConfig {
            stream_index: self.index,
            stream_type: self.local.stream_type(),
            ufrag: self.ufrag.clone(),
            password: self.password.clone(),
            helper_servers: config.helper_servers().to_vec(),
            fingerprint_hash_function: self.hash_function.clone(),
        })?;
        transport.set_dtls_setup(self.setup)?;
        self.transport = Some(transport);
        Ok(())
    }

    /// Hands the remote ICE credentials and DTLS fingerprint to the transport.
    fn apply_remote_transport_parameters(&mut self) -> Result<()> {
        let (Some(transport), Some(remote)) = (self.transport.as_mut(), self.remote.as_ref())
        else {
            return Ok(());
        };
        if let (Some(ufrag), Some(password)) = (remote.ufrag(), remote.password()) {
            transport.set_remote_credentials(ufrag, password)?;
        }
        if let Some(fingerprint) = remote.fingerprint() {
            transport.set_remote_fingerprint(remote.fingerprint_hash_function(), fingerprint)?;
        }
        Ok(())
    }

    fn on_new_candidate(&mut self, candidate: Candidate) -> Option<Candidate> {
        let candidate = candidate.with_stream_context(
            self.index,
            self.mid.clone(),
            Some(self.ufrag.clone()),
            Some(self.password.clone()),
        );
        self.candidate_gathered = true;

        if self.finalized {
            Some(candidate)
        } else {
            trace!("stream {}: gathered {}", self.index, candidate);
            self.local.add_candidate(candidate);
            None
        }
    }

    fn on_dtls_certificate_changed(&mut self, pem_certificate: &str) {
        match compute_fingerprint(pem_certificate, &self.hash_function) {
            Ok(fingerprint) => {
                self.local.set_fingerprint(fingerprint);
                self.fingerprint_computed = true;
            }
            Err(err) => error!("stream {}: fingerprint not computed: {}", self.index, err),
        }
    }

    /// Hands the candidates embedded in the remote description to the
    /// transport.
    fn apply_remote_candidates(&mut self, rtcp_mux: bool) -> Result<()> {
        let candidates = self
            .remote
            .as_ref()
            .map(|remote| remote.candidates().to_vec())
            .unwrap_or_default();
        for candidate in &candidates {
            self.add_remote_candidate(candidate, rtcp_mux)?;
        }
        Ok(())
    }

    /// RTCP candidates are dropped while rtcp-mux is in use.
    fn add_remote_candidate(&mut self, candidate: &Candidate, rtcp_mux: bool) -> Result<()> {
        if rtcp_mux && candidate.component == CandidateComponent::Rtcp {
            trace!(
                "stream {}: dropping rtcp candidate under rtcp-mux",
                self.index
            );
            return Ok(());
        }
        match self.transport.as_mut() {
            Some(transport) => transport.add_remote_candidate(candidate),
            None => {
                trace!(
                    "stream {}: no transport, dropping remote candidate",
                    self.index
                );
                Ok(())
            }
        }
    }

    fn finalize(&mut self) -> StreamDescription {
        self.finalized = true;
        self.local.clone().build()
    }

    fn close(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(err) = transport.close() {
                warn!("stream {}: closing transport failed: {}", self.index, err);
            }
        }
    }
}

/// Negotiation of one audio or video stream.
pub struct MediaStreamHandler {
    state: NegotiationState,
    source: Option<MediaSourceHandle>,
    payloads: Vec<RTCPayload>,
    rtcp_mux: bool,
    cname_received: bool,
    ssrc_received: bool,
}

impl MediaStreamHandler {
    fn new(
        index: usize,
        stream_type: StreamType,
        request: Option<&StreamRequest>,
        remote: Option<&StreamDescription>,
        config: &RTCSessionConfiguration,
        engine: &mut dyn MediaEngine,
    ) -> Result<Self> {
        let mut state = NegotiationState::new(index, stream_type, request, remote, config);

        let defaults = config.default_payloads(stream_type);
        let payloads = match remote {
            None => defaults.to_vec(),
            Some(remote) => {
                let payloads = intersect(remote.payloads(), defaults);
                if config.respect_remote_payload_order() {
                    payloads
                } else {
                    reorder_by_preference(&payloads, defaults)
                }
            }
        };
        let transformed = transform(Some(&payloads), stream_type)?;
        if transformed.is_empty() && state.local.mode() != StreamMode::Inactive {
            warn!("stream {index}: {}, forcing inactive", Error::ErrNoUsablePayload);
            state.local.set_mode(StreamMode::Inactive);
        }

        let rtcp_mux = remote.map(StreamDescription::rtcp_mux).unwrap_or(true);
        let (source, media_stream_id, track_id) = match request {
            Some(StreamRequest::Media(media)) => (
                media.source,
                Some(
                    media
                        .media_stream_id
                        .clone()
                        .unwrap_or_else(|| math_rand_alpha_number(MEDIA_STREAM_ID_LENGTH)),
                ),
                Some(
                    media
                        .track_id
                        .clone()
                        .unwrap_or_else(|| math_rand_alpha_number(MEDIA_STREAM_ID_LENGTH)),
                ),
            ),
            _ => (None, None, None),
        };

        state.local = state
            .local
            .with_rtcp_mux(rtcp_mux)
            .with_payloads(payloads.clone())
            .with_media_stream_ids(media_stream_id, track_id);

        let mut handler = MediaStreamHandler {
            state,
            source,
            payloads,
            rtcp_mux,
            cname_received: false,
            ssrc_received: false,
        };

        let mode = handler.state.mode();
        if mode != StreamMode::Inactive {
            handler.state.open_transport(engine, config)?;
            if let Some(transport) = handler.state.transport.as_mut() {
                transport.set_rtcp_mux(rtcp_mux)?;
                if mode.is_receiving() {
                    for payload in &transformed {
                        transport.add_receive_payload(payload)?;
                    }
                }
            }
            if remote.is_some() {
                handler.state.apply_remote_transport_parameters()?;
                let rtcp_mux = handler.uses_rtcp_mux();
                handler.state.apply_remote_candidates(rtcp_mux)?;
                handler.start_sending()?;
            }
        }

        Ok(handler)
    }

    fn preferred_send_payload(&self) -> Result<Option<TransportPayload>> {
        let preferred = select_preferred(&self.payloads);
        let transformed = transform(Some(&preferred), self.state.local.stream_type())?;
        Ok(transformed.into_iter().next())
    }

    fn start_sending(&mut self) -> Result<()> {
        if !self.state.mode().is_sending() {
            return Ok(());
        }
        let payload = self.preferred_send_payload()?;
        if let Some(transport) = self.state.transport.as_mut() {
            if let Some(payload) = &payload {
                debug!(
                    "stream {}: sending {} as payload {}",
                    self.state.index,
                    payload.codec(),
                    payload.payload_type()
                );
                transport.set_send_payload(payload)?;
            }
            transport.set_send_source(self.source)?;
        }
        Ok(())
    }

    fn set_remote_description(
        &mut self,
        remote: &StreamDescription,
        config: &RTCSessionConfiguration,
    ) -> Result<()> {
        let stream_type = self.state.local.stream_type();
        let mut mode = remote
            .mode()
            .reverse(self.state.want_send, self.state.want_receive);

        let payloads = intersect(remote.payloads(), &self.payloads);
        let payloads = if config.respect_remote_payload_order() {
            payloads
        } else {
            reorder_by_preference(&payloads, &self.payloads)
        };
        if mode != StreamMode::Inactive && transform(Some(&payloads), stream_type)?.is_empty() {
            warn!(
                "stream {}: {}, forcing inactive",
                self.state.index,
                Error::ErrNoUsablePayload
            );
            mode = StreamMode::Inactive;
        }

        self.payloads = payloads;
        self.rtcp_mux = self.rtcp_mux && remote.rtcp_mux();
        self.state.remote = Some(remote.clone());
        self.state.negotiated_mode = Some(mode);

        if mode == StreamMode::Inactive {
            self.state.close();
            return Ok(());
        }
        if let Some(transport) = self.state.transport.as_mut() {
            transport.set_dtls_setup(remote.setup().counterpart())?;
            transport.set_rtcp_mux(self.rtcp_mux)?;
        }
        self.state.apply_remote_transport_parameters()?;
        let rtcp_mux = self.uses_rtcp_mux();
        self.state.apply_remote_candidates(rtcp_mux)?;
        self.start_sending()
    }

    fn uses_rtcp_mux(&self) -> bool {
        self.rtcp_mux
            && self
                .state
                .remote
                .as_ref()
                .is_some_and(StreamDescription::rtcp_mux)
    }

    fn is_ready(&self) -> bool {
        self.state.mode() == StreamMode::Inactive
            || (self.state.candidate_gathered
                && self.state.fingerprint_computed
                && self.cname_received
                && self.ssrc_received)
    }
}

/// Negotiation of one SCTP data stream.
pub struct DataStreamHandler {
    state: NegotiationState,
}

impl DataStreamHandler {
    fn new(
        index: usize,
        request: Option<&StreamRequest>,
        remote: Option<&StreamDescription>,
        config: &RTCSessionConfiguration,
        engine: &mut dyn MediaEngine,
    ) -> Result<Self> {
        let mut state = NegotiationState::new(index, StreamType::Data, request, remote, config);

        let app_label = match request {
            Some(StreamRequest::Data(data)) => data.app_label.clone(),
            _ => None,
        }
        .or_else(|| remote.and_then(|r| r.app_label().map(str::to_owned)))
        .unwrap_or_else(|| config.data_app_label().to_owned());
        let stream_count = remote
            .and_then(StreamDescription::sctp_stream_count)
            .map(|count| count.min(config.sctp_stream_count()))
            .unwrap_or(config.sctp_stream_count());
        state.local = state
            .local
            .with_sctp(config.sctp_port(), Some(stream_count), &app_label);

        let mut handler = DataStreamHandler { state };
        if handler.state.mode() != StreamMode::Inactive {
            handler.state.open_transport(engine, config)?;
            if let Some(transport) = handler.state.transport.as_mut() {
                transport.set_sctp_local_port(config.sctp_port())?;
            }
            if remote.is_some() {
                handler.apply_remote_sctp()?;
            }
        }

        Ok(handler)
    }

    fn apply_remote_sctp(&mut self) -> Result<()> {
        self.state.apply_remote_transport_parameters()?;
        self.state.apply_remote_candidates(false)?;
        let port = self.state.remote.as_ref().and_then(StreamDescription::sctp_port);
        if let (Some(transport), Some(port)) = (self.state.transport.as_mut(), port) {
            transport.set_sctp_remote_port(port)?;
        }
        Ok(())
    }

    fn set_remote_description(&mut self, remote: &StreamDescription) -> Result<()> {
        let mode = remote
            .mode()
            .reverse(self.state.want_send, self.state.want_receive);
        self.state.remote = Some(remote.clone());
        self.state.negotiated_mode = Some(mode);

        if mode == StreamMode::Inactive {
            self.state.close();
            return Ok(());
        }
        if let Some(transport) = self.state.transport.as_mut() {
            transport.set_dtls_setup(remote.setup().counterpart())?;
        }
        self.apply_remote_sctp()
    }

    fn is_ready(&self) -> bool {
        self.state.mode() == StreamMode::Inactive
            || (self.state.candidate_gathered && self.state.fingerprint_computed)
    }
}

/// Per-stream negotiation, one per paired (or unpaired) stream of a session.
pub enum StreamHandler {
    Media(MediaStreamHandler),
    Data(DataStreamHandler),
}

impl StreamHandler {
    /// Creates the handler for stream `index`.
    ///
    /// Without a remote description the handler offers the request. With
    /// one, it answers it; an absent request yields an inactive handler bound
    /// only to the remote description.
    pub fn new(
        index: usize,
        request: Option<&StreamRequest>,
        remote: Option<&StreamDescription>,
        config: &RTCSessionConfiguration,
        engine: &mut dyn MediaEngine,
    ) -> Result<Self> {
        let stream_type = request
            .map(StreamRequest::stream_type)
            .or_else(|| remote.map(StreamDescription::stream_type))
            .ok_or_else(|| {
                Error::ErrInvalidArgument("stream without request or remote description".to_owned())
            })?;

        let handler = if stream_type.is_media() {
            StreamHandler::Media(MediaStreamHandler::new(
                index,
                stream_type,
                request,
                remote,
                config,
                engine,
            )?)
        } else {
            StreamHandler::Data(DataStreamHandler::new(
                index, request, remote, config, engine,
            )?)
        };
        debug!(
            "stream {index}: {stream_type} handler created, mode {}",
            handler.mode()
        );

        Ok(handler)
    }

    fn state(&self) -> &NegotiationState {
        match self {
            StreamHandler::Media(media) => &media.state,
            StreamHandler::Data(data) => &data.state,
        }
    }

    fn state_mut(&mut self) -> &mut NegotiationState {
        match self {
            StreamHandler::Media(media) => &mut media.state,
            StreamHandler::Data(data) => &mut data.state,
        }
    }

    pub fn index(&self) -> usize {
        self.state().index
    }

    pub fn stream_type(&self) -> StreamType {
        self.state().local.stream_type()
    }

    pub fn mid(&self) -> Option<&str> {
        self.state().mid.as_deref()
    }

    /// Current mode: the offered or answered mode, narrowed by the remote
    /// answer once it is known.
    pub fn mode(&self) -> StreamMode {
        self.state().mode()
    }

    pub fn is_ready(&self) -> bool {
        match self {
            StreamHandler::Media(media) => media.is_ready(),
            StreamHandler::Data(data) => data.is_ready(),
        }
    }

    pub fn is_finalized(&self) -> bool {
        self.state().finalized
    }

    /// Records a gathered local candidate. Returns it tagged with the stream
    /// context when the local description is already finalized and it must be
    /// trickled instead.
    pub fn on_new_candidate(&mut self, candidate: Candidate) -> Option<Candidate> {
        self.state_mut().on_new_candidate(candidate)
    }

    pub fn on_dtls_certificate_changed(&mut self, pem_certificate: &str) {
        self.state_mut().on_dtls_certificate_changed(pem_certificate)
    }

    pub fn on_cname_changed(&mut self, cname: String) {
        match self {
            StreamHandler::Media(media) => {
                media.state.local.set_cname(cname);
                media.cname_received = true;
            }
            StreamHandler::Data(data) => {
                debug!("stream {}: ignoring cname on data stream", data.state.index)
            }
        }
    }

    pub fn on_send_ssrc_changed(&mut self, ssrc: u32) {
        match self {
            StreamHandler::Media(media) => {
                media.state.local.add_ssrc(ssrc);
                media.ssrc_received = true;
            }
            StreamHandler::Data(data) => {
                debug!("stream {}: ignoring ssrc on data stream", data.state.index)
            }
        }
    }

    /// Reports whether a source the remote side started sending may be
    /// surfaced to the application.
    pub fn on_incoming_source(&self, source: MediaSourceHandle) -> bool {
        match self {
            StreamHandler::Media(media) if media.state.mode().is_receiving() => true,
            _ => {
                debug!(
                    "stream {}: ignoring incoming source {:?}",
                    self.index(),
                    source
                );
                false
            }
        }
    }

    /// Reports whether a data channel opened by the remote side may be
    /// surfaced to the application.
    pub fn on_data_channel_requested(&self, parameters: &DataChannelParameters) -> bool {
        match self {
            StreamHandler::Data(data) if data.state.mode() != StreamMode::Inactive => true,
            _ => {
                debug!(
                    "stream {}: ignoring data channel {}",
                    self.index(),
                    parameters.label
                );
                false
            }
        }
    }

    /// Forwards a remote candidate to the transport. RTCP candidates are
    /// dropped while rtcp-mux is in use.
    pub fn add_remote_candidate(&mut self, candidate: &Candidate) -> Result<()> {
        match self {
            StreamHandler::Media(media) => {
                let rtcp_mux = media.uses_rtcp_mux();
                media.state.add_remote_candidate(candidate, rtcp_mux)
            }
            StreamHandler::Data(data) => data.state.add_remote_candidate(candidate, false),
        }
    }

    /// Completes negotiation with the remote answer.
    pub fn set_remote_description(
        &mut self,
        remote: &StreamDescription,
        config: &RTCSessionConfiguration,
    ) -> Result<()> {
        match self {
            StreamHandler::Media(media) => media.set_remote_description(remote, config),
            StreamHandler::Data(data) => data.set_remote_description(remote),
        }
    }

    /// Freezes the local description. Candidates gathered afterwards are
    /// trickled.
    pub fn finalize(&mut self) -> StreamDescription {
        self.state_mut().finalize()
    }

    /// Detaches the handler from its transport.
    pub fn close(&mut self) {
        self.state_mut().close()
    }
}
