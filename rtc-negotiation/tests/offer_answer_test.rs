/// Integration test for a complete offer/answer exchange between two sessions
///
/// Both sides run against recording media engines. Descriptions and trickled
/// candidates travel through their JSEP JSON form, the way an application
/// would hand them to a signaling channel.
use anyhow::Result;
use log::info;
use serde_json::{Value, json};

use rtc_negotiation::configuration::RTCSessionConfiguration;
use rtc_negotiation::description::{DtlsSetup, RTCSdpType, SessionDescription, StreamMode, StreamType};
use rtc_negotiation::jsep::{candidate_to_jsep, jsep_to_candidate, jsep_to_session, session_to_jsep};
use rtc_negotiation::media_engine::{DataChannelParameters, MediaEngineEvent, MediaSourceHandle};
use rtc_negotiation::payload::codec::{Codec, TransportPayload};
use rtc_negotiation::session::{RTCSession, RTCSessionEvent, RTCSessionState};
use rtc_negotiation::stream::{StreamRequest, StreamSet};

mod common;
use common::{
    Command, RecordingEngine, drain_events, host_candidate, init_logger, setup_complete,
    signal_streams,
};

const STREAM_TYPES: [StreamType; 3] = [StreamType::Audio, StreamType::Video, StreamType::Data];

fn over_the_wire(description: &SessionDescription) -> Result<SessionDescription> {
    let text = serde_json::to_string(&session_to_jsep(description))?;
    info!("signaling {text}");
    let value: Value = serde_json::from_str(&text)?;
    Ok(jsep_to_session(&value)?)
}

#[test]
fn test_offer_answer_exchange() -> Result<()> {
    init_logger();

    let (engine_a, log_a) = RecordingEngine::new();
    let (engine_b, log_b) = RecordingEngine::new();
    let offerer = RTCSession::new(RTCSessionConfiguration::default(), engine_a);
    let answerer = RTCSession::new(RTCSessionConfiguration::default(), engine_b);

    // offerer
    offerer.setup(
        StreamSet::new()
            .with_stream(StreamRequest::audio(true, true).with_source(MediaSourceHandle(1)))
            .with_stream(StreamRequest::video(true, true).with_source(MediaSourceHandle(2)))
            .with_stream(StreamRequest::data()),
    )?;
    assert_eq!(offerer.state()?, RTCSessionState::Setup);
    assert!(!offerer.is_answerer()?);
    assert_eq!(
        log_a.count(|c| matches!(c, Command::SetDtlsSetup { setup: DtlsSetup::Actpass, .. })),
        3
    );

    signal_streams(&offerer, &STREAM_TYPES)?;
    let events = drain_events(&offerer);
    assert_eq!(events.len(), 3);
    assert_eq!(
        events[0],
        RTCSessionEvent::OnStateChange(RTCSessionState::Setup)
    );
    assert!(matches!(events[1], RTCSessionEvent::OnSetupComplete(_)));
    assert_eq!(
        events[2],
        RTCSessionEvent::OnStateChange(RTCSessionState::AwaitingAnswer)
    );
    let offer = offerer
        .local_description()?
        .ok_or_else(|| anyhow::anyhow!("offer missing"))?;
    assert_eq!(offer.sdp_type(), RTCSdpType::Offer);
    assert_eq!(offer.session_id(), offerer.session_id()?);
    assert_eq!(offer.streams().len(), 3);
    for (index, stream) in offer.streams().iter().enumerate() {
        assert_eq!(stream.mid(), Some(index.to_string().as_str()));
        assert_eq!(stream.candidates().len(), 1);
        assert!(stream.fingerprint().is_some());
    }

    // answerer
    let received_offer = over_the_wire(&offer)?;
    assert_eq!(received_offer.streams().len(), 3);
    answerer.set_remote_description(received_offer)?;
    assert_eq!(answerer.state()?, RTCSessionState::ReceivedOffer);
    assert!(answerer.is_answerer()?);

    answerer.setup(
        StreamSet::new()
            .with_stream(StreamRequest::audio(true, true).with_source(MediaSourceHandle(10)))
            .with_stream(StreamRequest::video(false, true))
            .with_stream(StreamRequest::data()),
    )?;
    assert_eq!(
        answerer.stream_modes()?,
        vec![
            StreamMode::SendReceive,
            StreamMode::ReceiveOnly,
            StreamMode::SendReceive
        ]
    );
    assert_eq!(
        log_b.count(|c| matches!(c, Command::SetDtlsSetup { setup: DtlsSetup::Active, .. })),
        3
    );
    assert_eq!(
        log_b.count(|c| matches!(c, Command::SetRemoteFingerprint { .. })),
        3
    );
    assert!(log_b.commands().contains(&Command::SetSctpRemotePort {
        stream_index: 2,
        port: 5000
    }));
    assert!(log_b.commands().contains(&Command::SetSendSource {
        stream_index: 0,
        source: Some(MediaSourceHandle(10))
    }));
    // candidates embedded in the offer
    assert_eq!(log_b.remote_candidate_ports(), vec![50000, 50001, 50002]);
    // receive-only video never starts sending
    assert_eq!(
        log_b.count(|c| matches!(c, Command::SetSendPayload { stream_index: 1, .. })),
        0
    );

    signal_streams(&answerer, &STREAM_TYPES)?;
    let answer = setup_complete(&drain_events(&answerer))
        .ok_or_else(|| anyhow::anyhow!("answer missing"))?;
    assert_eq!(answerer.state()?, RTCSessionState::Active);
    assert_eq!(answer.sdp_type(), RTCSdpType::Answer);
    assert_eq!(answer.streams()[1].mode(), StreamMode::ReceiveOnly);
    assert!(answer.streams().iter().all(|s| s.setup() == DtlsSetup::Active));

    // offerer completes
    log_a.clear();
    offerer.set_remote_description(over_the_wire(&answer)?)?;
    assert_eq!(offerer.state()?, RTCSessionState::Active);
    assert_eq!(
        drain_events(&offerer),
        vec![RTCSessionEvent::OnStateChange(RTCSessionState::Active)]
    );
    assert_eq!(
        offerer.stream_modes()?,
        vec![
            StreamMode::SendReceive,
            StreamMode::SendOnly,
            StreamMode::SendReceive
        ]
    );
    assert_eq!(
        log_a.count(|c| matches!(c, Command::SetDtlsSetup { setup: DtlsSetup::Passive, .. })),
        3
    );
    // candidates embedded in the answer
    assert_eq!(log_a.remote_candidate_ports(), vec![50000, 50001, 50002]);

    let video_payload = log_a
        .commands()
        .into_iter()
        .find_map(|command| match command {
            Command::SetSendPayload {
                stream_index: 1,
                payload: TransportPayload::Video(video),
            } => Some(video),
            _ => None,
        })
        .ok_or_else(|| anyhow::anyhow!("video send payload missing"))?;
    assert_eq!(video_payload.codec, Codec::Vp8);
    assert_eq!(video_payload.payload_type, 100);
    assert_eq!(video_payload.rtx_payload_type, Some(120));

    let audio_payload = log_a
        .commands()
        .into_iter()
        .find_map(|command| match command {
            Command::SetSendPayload {
                stream_index: 0,
                payload,
            } => Some(payload),
            _ => None,
        })
        .ok_or_else(|| anyhow::anyhow!("audio send payload missing"))?;
    assert_eq!(audio_payload.codec(), Codec::Opus);

    // late candidates are trickled
    offerer.handle_media_event(0, MediaEngineEvent::NewCandidate(host_candidate(1, 60000)?))?;
    let trickled = match drain_events(&offerer).as_slice() {
        [RTCSessionEvent::OnLocalCandidate(candidate)] => candidate.clone(),
        events => anyhow::bail!("unexpected events {events:?}"),
    };
    assert_eq!(trickled.stream_index, Some(0));
    assert_eq!(trickled.stream_id.as_deref(), Some("0"));

    let value = serde_json::to_value(candidate_to_jsep(&trickled))?;
    answerer.add_remote_candidate(jsep_to_candidate(&value)?)?;
    assert_eq!(
        log_b.remote_candidate_ports(),
        vec![50000, 50001, 50002, 60000]
    );

    // remote media
    answerer.handle_media_event(1, MediaEngineEvent::IncomingSource(MediaSourceHandle(7)))?;
    answerer.handle_media_event(
        2,
        MediaEngineEvent::DataChannelRequested(DataChannelParameters {
            label: "chat".to_owned(),
            protocol: String::new(),
            ordered: true,
            stream_id: 1,
        }),
    )?;
    let events = drain_events(&answerer);
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        RTCSessionEvent::OnRemoteSource {
            stream_index: 1,
            source: MediaSourceHandle(7)
        }
    );
    assert!(matches!(
        &events[1],
        RTCSessionEvent::OnDataChannel { stream_index: 2, parameters } if parameters.label == "chat"
    ));

    offerer.stop()?;
    answerer.stop()?;
    assert_eq!(log_a.count(|c| matches!(c, Command::Close { .. })), 3);
    assert_eq!(log_b.count(|c| matches!(c, Command::Close { .. })), 3);

    Ok(())
}

#[test]
fn test_send_only_offer_is_answered_receive_only() -> Result<()> {
    init_logger();

    let (engine_a, _log_a) = RecordingEngine::new();
    let (engine_b, log_b) = RecordingEngine::new();
    let offerer = RTCSession::new(RTCSessionConfiguration::default(), engine_a);
    let answerer = RTCSession::new(RTCSessionConfiguration::default(), engine_b);

    offerer.setup(StreamSet::new().with_stream(StreamRequest::audio(true, false)))?;
    signal_streams(&offerer, &[StreamType::Audio])?;
    let offer = setup_complete(&drain_events(&offerer))
        .ok_or_else(|| anyhow::anyhow!("offer missing"))?;
    assert_eq!(offer.streams()[0].mode(), StreamMode::SendOnly);

    answerer.set_remote_description(over_the_wire(&offer)?)?;
    answerer.setup(StreamSet::new().with_stream(StreamRequest::audio(true, true)))?;
    assert_eq!(answerer.stream_modes()?, vec![StreamMode::ReceiveOnly]);
    assert!(log_b.count(|c| matches!(c, Command::AddReceivePayload { .. })) > 0);
    assert_eq!(
        log_b.count(|c| matches!(c, Command::SetSendPayload { .. } | Command::SetSendSource { .. })),
        0
    );

    Ok(())
}

const OFFER_WITH_CANDIDATES: &str = "v=0
o=- 4611731400430051336 2 IN IP4 127.0.0.1
s=-
t=0 0
a=fingerprint:sha-256 AA:BB:CC
a=setup:actpass
m=audio 54400 RTP/SAVPF 111 0
c=IN IP4 192.168.1.2
a=candidate:1 1 udp 2130706431 192.168.1.2 54400 typ host generation 0
a=candidate:1 2 udp 2130706430 192.168.1.2 54401 typ host generation 0
a=ice-ufrag:audioufrag
a=ice-pwd:audiopassword0123456789
a=mid:audio
a=sendrecv
a=rtcp-mux
a=rtpmap:111 opus/48000/2
m=application 54402 DTLS/SCTP 5000
c=IN IP4 192.168.1.2
a=candidate:2 1 udp 2130706431 192.168.1.2 54402 typ host
a=ice-ufrag:dataufrag
a=ice-pwd:datapassword0123456789
a=mid:data
a=sctpmap:5000 webrtc-datachannel 1024
";

const ANSWER_WITH_CANDIDATES: &str = "v=0
o=- 1 2 IN IP4 127.0.0.1
s=-
t=0 0
m=audio 55400 RTP/SAVPF 111
c=IN IP4 192.168.1.3
a=rtcp:55401 IN IP4 192.168.1.3
a=candidate:1 1 udp 2130706431 192.168.1.3 55400 typ host
a=candidate:1 2 udp 2130706430 192.168.1.3 55401 typ host
a=ice-ufrag:answerufrag
a=ice-pwd:answerpassword0123456789
a=fingerprint:sha-256 AA:BB:CC
a=setup:active
a=mid:0
a=sendrecv
a=rtpmap:111 opus/48000/2
";

fn remote_candidate_routes(log: &common::CommandLog) -> Vec<(usize, u16)> {
    log.commands()
        .into_iter()
        .filter_map(|command| match command {
            Command::AddRemoteCandidate {
                stream_index,
                candidate,
            } => Some((stream_index, candidate.port)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_offer_candidates_reach_answering_transports() -> Result<()> {
    init_logger();

    let (engine, log) = RecordingEngine::new();
    let answerer = RTCSession::new(RTCSessionConfiguration::default(), engine);

    let offer = jsep_to_session(&json!({"type": "offer", "sdp": OFFER_WITH_CANDIDATES}))?;
    assert_eq!(offer.streams()[0].candidates().len(), 2);
    answerer.set_remote_description(offer)?;
    assert!(log.commands().is_empty());

    answerer.setup(
        StreamSet::new()
            .with_stream(StreamRequest::audio(true, true))
            .with_stream(StreamRequest::data()),
    )?;

    // the rtcp candidate is redundant under rtcp-mux
    assert_eq!(remote_candidate_routes(&log), vec![(0, 54400), (1, 54402)]);

    Ok(())
}

#[test]
fn test_answer_candidates_reach_offering_transports() -> Result<()> {
    init_logger();

    let (engine, log) = RecordingEngine::new();
    let offerer = RTCSession::new(RTCSessionConfiguration::default(), engine);

    offerer.setup(StreamSet::new().with_stream(StreamRequest::audio(true, true)))?;
    signal_streams(&offerer, &[StreamType::Audio])?;
    assert_eq!(offerer.state()?, RTCSessionState::AwaitingAnswer);
    assert!(log.remote_candidate_ports().is_empty());

    let answer = jsep_to_session(&json!({"type": "answer", "sdp": ANSWER_WITH_CANDIDATES}))?;
    offerer.set_remote_description(answer)?;
    assert_eq!(offerer.state()?, RTCSessionState::Active);

    // no rtcp-mux in the answer, both components are kept
    assert_eq!(remote_candidate_routes(&log), vec![(0, 55400), (0, 55401)]);
    assert!(log.commands().contains(&Command::SetRtcpMux {
        stream_index: 0,
        enabled: false,
    }));

    Ok(())
}
