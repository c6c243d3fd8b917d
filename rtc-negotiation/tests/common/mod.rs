#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use ice::candidate::{Candidate, unmarshal_candidate};
use shared::error::{Error, Result};

use rtc_negotiation::configuration::{default_audio_payloads, default_video_payloads};
use rtc_negotiation::description::{
    DtlsSetup, RTCSdpType, SessionDescription, SessionDescriptionBuilder, StreamDescription,
    StreamDescriptionBuilder, StreamMode, StreamType,
};
use rtc_negotiation::media_engine::{
    MediaEngine, MediaEngineEvent, MediaSourceHandle, MediaTransport, TransportConfig,
};
use rtc_negotiation::payload::codec::TransportPayload;
use rtc_negotiation::session::{RTCSession, RTCSessionEvent};

/// A command the session issued to the media engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    CreateTransport {
        stream_index: usize,
        stream_type: StreamType,
    },
    AddRemoteCandidate {
        stream_index: usize,
        candidate: Candidate,
    },
    SetRemoteCredentials {
        stream_index: usize,
        ufrag: String,
        password: String,
    },
    SetRemoteFingerprint {
        stream_index: usize,
        hash_function: String,
        fingerprint: String,
    },
    SetDtlsSetup {
        stream_index: usize,
        setup: DtlsSetup,
    },
    SetSendPayload {
        stream_index: usize,
        payload: TransportPayload,
    },
    AddReceivePayload {
        stream_index: usize,
        payload: TransportPayload,
    },
    SetRtcpMux {
        stream_index: usize,
        enabled: bool,
    },
    SetSctpLocalPort {
        stream_index: usize,
        port: u16,
    },
    SetSctpRemotePort {
        stream_index: usize,
        port: u16,
    },
    SetSendSource {
        stream_index: usize,
        source: Option<MediaSourceHandle>,
    },
    Close {
        stream_index: usize,
    },
}

/// Shared record of every command, in issue order.
#[derive(Default, Clone)]
pub struct CommandLog {
    commands: Arc<Mutex<Vec<Command>>>,
    rejected: Arc<Mutex<Option<fn(&Command) -> bool>>>,
}

impl CommandLog {
    /// Records `command`, unless the transports were told to reject it.
    fn push(&self, command: Command) -> Result<()> {
        let rejected = self.rejected.lock()?.is_some_and(|rejects| rejects(&command));
        if rejected {
            return Err(Error::Other(format!("transport rejected {command:?}")));
        }
        self.commands.lock()?.push(command);
        Ok(())
    }

    /// Makes every transport of the engine fail the commands matching
    /// `rejects`.
    pub fn reject(&self, rejects: fn(&Command) -> bool) {
        if let Ok(mut rejected) = self.rejected.lock() {
            *rejected = Some(rejects);
        }
    }

    pub fn commands(&self) -> Vec<Command> {
        self.commands
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn clear(&self) {
        if let Ok(mut commands) = self.commands.lock() {
            commands.clear();
        }
    }

    pub fn remote_candidate_ports(&self) -> Vec<u16> {
        self.commands()
            .into_iter()
            .filter_map(|command| match command {
                Command::AddRemoteCandidate { candidate, .. } => Some(candidate.port),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, matches: impl Fn(&Command) -> bool) -> usize {
        self.commands().iter().filter(|c| matches(*c)).count()
    }
}

pub struct RecordingEngine {
    log: CommandLog,
}

impl RecordingEngine {
    pub fn new() -> (Box<dyn MediaEngine>, CommandLog) {
        let log = CommandLog::default();
        (Box::new(RecordingEngine { log: log.clone() }), log)
    }
}

impl MediaEngine for RecordingEngine {
    fn create_transport(&mut self, config: TransportConfig) -> Result<Box<dyn MediaTransport>> {
        self.log.push(Command::CreateTransport {
            stream_index: config.stream_index,
            stream_type: config.stream_type,
        })?;
        Ok(Box::new(RecordingTransport {
            stream_index: config.stream_index,
            log: self.log.clone(),
        }))
    }
}

struct RecordingTransport {
    stream_index: usize,
    log: CommandLog,
}

impl MediaTransport for RecordingTransport {
    fn add_remote_candidate(&mut self, candidate: &Candidate) -> Result<()> {
        self.log.push(Command::AddRemoteCandidate {
            stream_index: self.stream_index,
            candidate: candidate.clone(),
        })
    }

    fn set_remote_credentials(&mut self, ufrag: &str, password: &str) -> Result<()> {
        self.log.push(Command::SetRemoteCredentials {
            stream_index: self.stream_index,
            ufrag: ufrag.to_owned(),
            password: password.to_owned(),
        })
    }

    fn set_remote_fingerprint(&mut self, hash_function: &str, fingerprint: &str) -> Result<()> {
        self.log.push(Command::SetRemoteFingerprint {
            stream_index: self.stream_index,
            hash_function: hash_function.to_owned(),
            fingerprint: fingerprint.to_owned(),
        })
    }

    fn set_dtls_setup(&mut self, setup: DtlsSetup) -> Result<()> {
        self.log.push(Command::SetDtlsSetup {
            stream_index: self.stream_index,
            setup,
        })
    }

    fn set_send_payload(&mut self, payload: &TransportPayload) -> Result<()> {
        self.log.push(Command::SetSendPayload {
            stream_index: self.stream_index,
            payload: payload.clone(),
        })
    }

    fn add_receive_payload(&mut self, payload: &TransportPayload) -> Result<()> {
        self.log.push(Command::AddReceivePayload {
            stream_index: self.stream_index,
            payload: payload.clone(),
        })
    }

    fn set_rtcp_mux(&mut self, enabled: bool) -> Result<()> {
        self.log.push(Command::SetRtcpMux {
            stream_index: self.stream_index,
            enabled,
        })
    }

    fn set_sctp_local_port(&mut self, port: u16) -> Result<()> {
        self.log.push(Command::SetSctpLocalPort {
            stream_index: self.stream_index,
            port,
        })
    }

    fn set_sctp_remote_port(&mut self, port: u16) -> Result<()> {
        self.log.push(Command::SetSctpRemotePort {
            stream_index: self.stream_index,
            port,
        })
    }

    fn set_send_source(&mut self, source: Option<MediaSourceHandle>) -> Result<()> {
        self.log.push(Command::SetSendSource {
            stream_index: self.stream_index,
            source,
        })
    }

    fn close(&mut self) -> Result<()> {
        self.log.push(Command::Close {
            stream_index: self.stream_index,
        })
    }
}

pub fn init_logger() {
    env_logger::builder()
        .filter_level(log::LevelFilter::Trace)
        .is_test(true)
        .try_init()
        .ok();
}

pub fn certificate_pem() -> String {
    pem::encode(&pem::Pem::new("CERTIFICATE", b"test certificate".to_vec()))
}

pub fn host_candidate(component: u16, port: u16) -> Result<Candidate> {
    unmarshal_candidate(&format!(
        "candidate:1 {component} UDP 2130706431 192.168.1.10 {port} typ host"
    ))
}

/// Delivers every readiness signal to the active streams of `session`,
/// whose types are `stream_types` in description order.
pub fn signal_streams(session: &RTCSession, stream_types: &[StreamType]) -> Result<()> {
    let modes = session.stream_modes()?;
    for (stream_index, (stream_type, mode)) in stream_types.iter().zip(modes).enumerate() {
        if mode == StreamMode::Inactive {
            continue;
        }
        let port = 50000 + stream_index as u16;
        session.handle_media_event(
            stream_index,
            MediaEngineEvent::NewCandidate(host_candidate(1, port)?),
        )?;
        session.handle_media_event(
            stream_index,
            MediaEngineEvent::DtlsCertificateChanged(certificate_pem()),
        )?;
        if stream_type.is_media() {
            session.handle_media_event(
                stream_index,
                MediaEngineEvent::CnameChanged(format!("cname-{stream_index}")),
            )?;
            session.handle_media_event(
                stream_index,
                MediaEngineEvent::SendSsrcChanged(1000 + stream_index as u32),
            )?;
        }
    }
    Ok(())
}

pub fn drain_events(session: &RTCSession) -> Vec<RTCSessionEvent> {
    let mut events = vec![];
    while let Ok(Some(event)) = session.poll_event() {
        events.push(event);
    }
    events
}

pub fn setup_complete(events: &[RTCSessionEvent]) -> Option<SessionDescription> {
    events.iter().find_map(|event| match event {
        RTCSessionEvent::OnSetupComplete(description) => Some(description.clone()),
        _ => None,
    })
}

fn remote_stream(index: usize, stream_type: StreamType, setup: DtlsSetup) -> StreamDescription {
    let builder = StreamDescriptionBuilder::new(stream_type)
        .with_mode(StreamMode::SendReceive)
        .with_mid(Some(index.to_string()))
        .with_ice_credentials(format!("ufrag{index}"), format!("password{index}"))
        .with_setup(setup)
        .with_fingerprint(Some("AA:BB:CC".to_owned()));
    let builder = match stream_type {
        StreamType::Audio => builder
            .with_rtcp_mux(true)
            .with_payloads(default_audio_payloads()),
        StreamType::Video => builder
            .with_rtcp_mux(true)
            .with_payloads(default_video_payloads()),
        StreamType::Data => builder.with_sctp(5000, Some(256), "webrtc-datachannel"),
    };
    builder.build()
}

/// A remote offer with one send-receive stream per type.
pub fn remote_offer(stream_types: &[StreamType]) -> SessionDescription {
    SessionDescriptionBuilder::new(RTCSdpType::Offer)
        .with_session_id(1)
        .with_streams(
            stream_types
                .iter()
                .enumerate()
                .map(|(index, stream_type)| remote_stream(index, *stream_type, DtlsSetup::Actpass))
                .collect(),
        )
        .build()
}

/// A send-receive remote answer to `offer`, echoing its payloads.
pub fn remote_answer(offer: &SessionDescription, rtcp_mux: bool) -> SessionDescription {
    SessionDescriptionBuilder::new(RTCSdpType::Answer)
        .with_session_id(2)
        .with_streams(
            offer
                .streams()
                .iter()
                .enumerate()
                .map(|(index, stream)| {
                    let builder = StreamDescriptionBuilder::new(stream.stream_type())
                        .with_mode(StreamMode::SendReceive)
                        .with_mid(stream.mid().map(str::to_owned))
                        .with_ice_credentials(format!("ufrag{index}"), format!("password{index}"))
                        .with_setup(DtlsSetup::Active)
                        .with_fingerprint(Some("AA:BB:CC".to_owned()));
                    let builder = if stream.stream_type().is_media() {
                        builder
                            .with_rtcp_mux(rtcp_mux)
                            .with_payloads(stream.payloads().to_vec())
                    } else {
                        builder.with_sctp(5000, Some(256), "webrtc-datachannel")
                    };
                    builder.build()
                })
                .collect(),
        )
        .build()
}
