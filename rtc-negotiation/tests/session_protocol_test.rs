/// Integration tests for the session state machine rules: operations out of
/// order, remote candidate buffering and routing, and teardown.
use anyhow::Result;

use ice::candidate::Candidate;
use shared::error::Error;

use rtc_negotiation::configuration::{RTCSessionConfiguration, RTCSessionConfigurationBuilder};
use rtc_negotiation::description::{SessionDescription, StreamType};
use rtc_negotiation::media_engine::MediaEngineEvent;
use rtc_negotiation::session::{RTCSession, RTCSessionEvent, RTCSessionState};
use rtc_negotiation::stream::{StreamRequest, StreamSet};

mod common;
use common::{
    Command, CommandLog, RecordingEngine, drain_events, host_candidate, init_logger, remote_answer,
    remote_offer, setup_complete, signal_streams,
};

const A: StreamType = StreamType::Audio;
const V: StreamType = StreamType::Video;

fn new_session() -> (RTCSession, CommandLog) {
    let (engine, log) = RecordingEngine::new();
    (
        RTCSession::new(RTCSessionConfiguration::default(), engine),
        log,
    )
}

fn audio_streams(count: usize) -> StreamSet {
    StreamSet::from(vec![StreamRequest::audio(true, true); count])
}

fn indexed_candidate(stream_index: usize, component: u16, port: u16) -> Result<Candidate> {
    Ok(host_candidate(component, port)?.with_stream_context(stream_index, None, None, None))
}

/// Runs the offerer side up to the delivered offer.
fn offer(session: &RTCSession, stream_types: &[StreamType]) -> Result<SessionDescription> {
    let streams = stream_types
        .iter()
        .map(|stream_type| match stream_type {
            StreamType::Data => StreamRequest::data(),
            StreamType::Video => StreamRequest::video(true, true),
            StreamType::Audio => StreamRequest::audio(true, true),
        })
        .collect::<Vec<_>>();
    session.setup(StreamSet::from(streams))?;
    signal_streams(session, stream_types)?;
    setup_complete(&drain_events(session)).ok_or_else(|| anyhow::anyhow!("offer missing"))
}

fn assert_protocol_violation(result: shared::error::Result<()>) {
    assert!(
        result.as_ref().is_err_and(Error::is_protocol_violation),
        "{result:?}"
    );
}

#[test]
fn test_setup_twice() -> Result<()> {
    init_logger();

    let (session, log) = new_session();
    session.setup(audio_streams(1))?;
    assert_protocol_violation(session.setup(audio_streams(1)));
    assert_eq!(session.state()?, RTCSessionState::Setup);
    assert_eq!(
        log.count(|c| matches!(c, Command::CreateTransport { .. })),
        1
    );

    Ok(())
}

#[test]
fn test_remote_description_out_of_order() -> Result<()> {
    init_logger();

    // offer twice
    let (session, _log) = new_session();
    session.set_remote_description(remote_offer(&[A]))?;
    assert_protocol_violation(session.set_remote_description(remote_offer(&[A])));
    assert_eq!(session.state()?, RTCSessionState::ReceivedOffer);

    // answer without an offer
    let (session, _log) = new_session();
    let answer = remote_answer(&remote_offer(&[A]), true);
    assert_protocol_violation(session.set_remote_description(answer.clone()));
    assert_eq!(session.state()?, RTCSessionState::Init);
    assert_eq!(session.remote_description()?, None);

    // answer before the local offer is complete
    session.setup(audio_streams(1))?;
    assert_protocol_violation(session.set_remote_description(answer));
    assert_eq!(session.state()?, RTCSessionState::Setup);

    // offer while awaiting the answer
    let (session, _log) = new_session();
    offer(&session, &[A])?;
    assert_eq!(session.state()?, RTCSessionState::AwaitingAnswer);
    assert_protocol_violation(session.set_remote_description(remote_offer(&[A])));
    assert_eq!(session.state()?, RTCSessionState::AwaitingAnswer);

    Ok(())
}

#[test]
fn test_answer_must_match_offer() -> Result<()> {
    init_logger();

    let (session, _log) = new_session();
    let local_offer = offer(&session, &[A, V])?;

    let tests = vec![
        remote_answer(&remote_offer(&[A]), true),
        remote_answer(&remote_offer(&[A, V, A]), true),
        remote_answer(&remote_offer(&[V, A]), true),
    ];
    for answer in tests {
        assert_protocol_violation(session.set_remote_description(answer));
        assert_eq!(session.state()?, RTCSessionState::AwaitingAnswer);
    }

    session.set_remote_description(remote_answer(&local_offer, true))?;
    assert_eq!(session.state()?, RTCSessionState::Active);
    assert_protocol_violation(session.set_remote_description(remote_answer(&local_offer, true)));

    Ok(())
}

#[test]
fn test_rejected_answer_stops_session() -> Result<()> {
    init_logger();

    let (session, log) = new_session();
    let local_offer = offer(&session, &[A, A])?;
    drain_events(&session);

    // the second transport refuses the remote credentials
    log.reject(|command| {
        matches!(
            command,
            Command::SetRemoteCredentials {
                stream_index: 1,
                ..
            }
        )
    });
    let result = session.set_remote_description(remote_answer(&local_offer, true));
    assert!(matches!(result, Err(Error::Other(_))), "{result:?}");

    assert_eq!(session.state()?, RTCSessionState::Stopped);
    assert_eq!(session.remote_description()?, None);
    assert!(session.stream_modes()?.is_empty());
    assert_eq!(log.count(|c| matches!(c, Command::Close { .. })), 2);
    assert_eq!(
        drain_events(&session),
        vec![RTCSessionEvent::OnStateChange(RTCSessionState::Stopped)]
    );

    assert_protocol_violation(session.set_remote_description(remote_answer(&local_offer, true)));

    Ok(())
}

#[test]
fn test_answerer_buffers_candidates_until_setup() -> Result<()> {
    init_logger();

    let (session, log) = new_session();
    session.add_remote_candidate(indexed_candidate(0, 1, 1001)?)?;
    session.add_remote_candidate(indexed_candidate(1, 1, 1002)?)?;

    session.set_remote_description(remote_offer(&[A, A]))?;
    session.add_remote_candidate(indexed_candidate(0, 1, 1003)?)?;
    assert!(log.remote_candidate_ports().is_empty());

    session.setup(audio_streams(2))?;
    assert_eq!(log.remote_candidate_ports(), vec![1001, 1002, 1003]);

    session.add_remote_candidate(indexed_candidate(1, 1, 1004)?)?;
    assert_eq!(log.remote_candidate_ports(), vec![1001, 1002, 1003, 1004]);
    assert!(log.commands().contains(&Command::AddRemoteCandidate {
        stream_index: 1,
        candidate: indexed_candidate(1, 1, 1004)?,
    }));

    Ok(())
}

#[test]
fn test_offerer_buffers_candidates_until_answer() -> Result<()> {
    init_logger();

    let (session, log) = new_session();
    session.setup(audio_streams(1))?;
    session.add_remote_candidate(indexed_candidate(0, 1, 2001)?)?;
    signal_streams(&session, &[A])?;
    let local_offer = setup_complete(&drain_events(&session))
        .ok_or_else(|| anyhow::anyhow!("offer missing"))?;
    session.add_remote_candidate(indexed_candidate(0, 1, 2002)?)?;
    assert!(log.remote_candidate_ports().is_empty());

    session.set_remote_description(remote_answer(&local_offer, true))?;
    assert_eq!(log.remote_candidate_ports(), vec![2001, 2002]);

    Ok(())
}

#[test]
fn test_rtcp_candidates_under_rtcp_mux() -> Result<()> {
    init_logger();

    let tests = vec![(true, vec![3001]), (false, vec![3001, 3002])];
    for (rtcp_mux, expected) in tests {
        let (session, log) = new_session();
        let local_offer = offer(&session, &[A])?;
        session.set_remote_description(remote_answer(&local_offer, rtcp_mux))?;
        assert!(log.commands().contains(&Command::SetRtcpMux {
            stream_index: 0,
            enabled: rtcp_mux,
        }));

        session.add_remote_candidate(indexed_candidate(0, 1, 3001)?)?;
        session.add_remote_candidate(indexed_candidate(0, 2, 3002)?)?;
        assert_eq!(log.remote_candidate_ports(), expected, "rtcp-mux {rtcp_mux}");
    }

    Ok(())
}

#[test]
fn test_candidate_routing() -> Result<()> {
    init_logger();

    let (session, log) = new_session();
    session.set_remote_description(remote_offer(&[A, A]))?;
    session.setup(audio_streams(2))?;

    let by_mid = Candidate {
        stream_id: Some("1".to_owned()),
        ..host_candidate(1, 4001)?
    };
    session.add_remote_candidate(by_mid)?;

    let stale_index = Candidate {
        stream_index: Some(9),
        stream_id: Some("0".to_owned()),
        ..host_candidate(1, 4002)?
    };
    session.add_remote_candidate(stale_index)?;

    let routes: Vec<(usize, u16)> = log
        .commands()
        .into_iter()
        .filter_map(|command| match command {
            Command::AddRemoteCandidate {
                stream_index,
                candidate,
            } => Some((stream_index, candidate.port)),
            _ => None,
        })
        .collect();
    assert_eq!(routes, vec![(1, 4001), (0, 4002)]);

    let unroutable = vec![
        host_candidate(1, 4003)?,
        Candidate {
            stream_index: Some(2),
            ..host_candidate(1, 4004)?
        },
        Candidate {
            stream_id: Some("video".to_owned()),
            ..host_candidate(1, 4005)?
        },
    ];
    for candidate in unroutable {
        let result = session.add_remote_candidate(candidate);
        assert!(
            matches!(result, Err(Error::ErrInvalidArgument(_))),
            "{result:?}"
        );
    }

    Ok(())
}

#[test]
fn test_media_event_for_unknown_stream() -> Result<()> {
    init_logger();

    let (session, _log) = new_session();
    session.setup(audio_streams(1))?;
    let result = session.handle_media_event(1, MediaEngineEvent::CnameChanged("cname".to_owned()));
    assert!(
        matches!(result, Err(Error::ErrInvalidArgument(_))),
        "{result:?}"
    );

    Ok(())
}

#[test]
fn test_unsupported_hash_function_keeps_session_pending() -> Result<()> {
    init_logger();

    let (engine, _log) = RecordingEngine::new();
    let session = RTCSession::new(
        RTCSessionConfigurationBuilder::new()
            .with_fingerprint_hash_function("md5")
            .build(),
        engine,
    );
    session.setup(audio_streams(1))?;
    signal_streams(&session, &[A])?;

    assert_eq!(session.state()?, RTCSessionState::Setup);
    assert_eq!(setup_complete(&drain_events(&session)), None);
    assert_eq!(session.local_description()?, None);

    Ok(())
}

#[test]
fn test_poll_event_drains_queue() -> Result<()> {
    init_logger();

    let (session, _log) = new_session();
    assert_eq!(session.poll_event()?, None);

    session.setup(audio_streams(1))?;
    assert_eq!(
        session.poll_event()?,
        Some(RTCSessionEvent::OnStateChange(RTCSessionState::Setup))
    );
    assert_eq!(session.poll_event()?, None);

    Ok(())
}

#[test]
fn test_stop() -> Result<()> {
    init_logger();

    let (session, log) = new_session();
    session.setup(audio_streams(2))?;
    session.add_remote_candidate(indexed_candidate(0, 1, 5001)?)?;
    drain_events(&session);

    session.stop()?;
    assert_eq!(session.state()?, RTCSessionState::Stopped);
    assert_eq!(
        drain_events(&session),
        vec![RTCSessionEvent::OnStateChange(RTCSessionState::Stopped)]
    );
    assert_eq!(log.count(|c| matches!(c, Command::Close { .. })), 2);
    assert!(session.stream_modes()?.is_empty());

    session.stop()?;
    #[allow(deprecated)]
    let ended = session.end();
    ended?;
    assert!(drain_events(&session).is_empty());
    assert_eq!(log.count(|c| matches!(c, Command::Close { .. })), 2);

    // late signals are dropped
    log.clear();
    session.add_remote_candidate(indexed_candidate(0, 1, 5002)?)?;
    session.handle_media_event(0, MediaEngineEvent::SendSsrcChanged(1))?;
    assert!(log.commands().is_empty());
    assert!(drain_events(&session).is_empty());

    assert_protocol_violation(session.setup(audio_streams(1)));
    assert_protocol_violation(session.set_remote_description(remote_offer(&[A])));

    Ok(())
}
