use ice::candidate::{Candidate, CandidateComponent};
use sdp::description::media::DEFAULT_SCTP_APP;
use sdp::{
    ConnectionInformation, Fingerprint, MediaDescription, Origin, PayloadFormat, RtcpAttribute,
    SctpMap, SsrcDescription,
};
use shared::error::Result;

use crate::description::{
    DtlsSetup, RTCPayload, RTCSdpType, SessionDescription, SessionDescriptionBuilder,
    StreamDescription, StreamDescriptionBuilder, StreamMode, StreamType,
};

pub const MEDIA_PROTOCOL_RTP: &str = "RTP/SAVPF";
pub const MEDIA_PROTOCOL_SCTP: &str = "DTLS/SCTP";

// RFC 8840 placeholder port for streams without a gathered RTP candidate
const DEFAULT_MEDIA_PORT: u16 = 9;
const INACTIVE_MEDIA_PORT: u16 = 0;

/// Builds the SDP document carrying a session description.
pub fn session_to_sdp(description: &SessionDescription) -> sdp::SessionDescription {
    let media_descriptions: Vec<MediaDescription> =
        description.streams().iter().map(stream_to_media).collect();

    sdp::SessionDescription {
        origin: Origin {
            session_id: description.session_id(),
            ..Default::default()
        },
        msid_semantic: media_descriptions
            .iter()
            .any(MediaDescription::has_stream_ids),
        media_descriptions,
        ..Default::default()
    }
}

/// Reads a session description of type `sdp_type` out of an SDP document.
/// Candidates are bound to the index and mid of their media block.
pub fn sdp_to_session(
    sdp_type: RTCSdpType,
    document: &sdp::SessionDescription,
) -> Result<SessionDescription> {
    let streams = document
        .media_descriptions
        .iter()
        .enumerate()
        .map(|(index, media)| media_to_stream(index, media))
        .collect::<Result<Vec<_>>>()?;

    Ok(SessionDescriptionBuilder::new(sdp_type)
        .with_session_id(document.origin.session_id)
        .with_streams(streams)
        .build())
}

fn first_candidate(stream: &StreamDescription, component: CandidateComponent) -> Option<&Candidate> {
    stream
        .candidates()
        .iter()
        .find(|candidate| candidate.component == component)
}

fn stream_to_media(stream: &StreamDescription) -> MediaDescription {
    let rtp_candidate = first_candidate(stream, CandidateComponent::Rtp);
    let port = match rtp_candidate {
        Some(candidate) => candidate.port,
        None if stream.mode() == StreamMode::Inactive && stream.candidates().is_empty() => {
            INACTIVE_MEDIA_PORT
        }
        None => DEFAULT_MEDIA_PORT,
    };

    let mut media = MediaDescription {
        media: stream.stream_type().media_name().to_owned(),
        port,
        connection: rtp_candidate
            .map(|candidate| ConnectionInformation::for_address(&candidate.address))
            .unwrap_or_default(),
        direction: stream.mode().into(),
        mid: stream.mid().map(str::to_owned),
        ice_ufrag: stream.ufrag().map(str::to_owned),
        ice_pwd: stream.password().map(str::to_owned),
        candidates: stream.candidates().to_vec(),
        fingerprint: stream.fingerprint().map(|value| Fingerprint {
            hash_function: stream.fingerprint_hash_function().to_owned(),
            value: value.to_owned(),
        }),
        setup: Some(stream.setup().into()),
        ..Default::default()
    };

    if stream.stream_type().is_media() {
        media.protocol = MEDIA_PROTOCOL_RTP.to_owned();
        media.formats = stream
            .payloads()
            .iter()
            .map(|payload| payload.payload_type.to_string())
            .collect();
        media.payloads = stream.payloads().iter().map(PayloadFormat::from).collect();
        media.rtcp_mux = stream.rtcp_mux();
        if !stream.rtcp_mux() {
            media.rtcp =
                first_candidate(stream, CandidateComponent::Rtcp).map(|candidate| RtcpAttribute {
                    port: candidate.port,
                    connection: Some(ConnectionInformation::for_address(&candidate.address)),
                });
        }
        media.ssrcs = stream
            .ssrcs()
            .iter()
            .map(|&ssrc| SsrcDescription {
                ssrc,
                cname: stream.cname().map(str::to_owned),
                media_stream_id: stream.media_stream_id().map(str::to_owned),
                media_stream_track_id: stream.media_stream_track_id().map(str::to_owned),
            })
            .collect();
        media.media_stream_id = stream.media_stream_id().map(str::to_owned);
        media.media_stream_track_id = stream.media_stream_track_id().map(str::to_owned);
    } else {
        media.protocol = MEDIA_PROTOCOL_SCTP.to_owned();
        if let Some(port) = stream.sctp_port() {
            media.formats = vec![port.to_string()];
            media.sctp = Some(SctpMap {
                port,
                app: stream.app_label().unwrap_or(DEFAULT_SCTP_APP).to_owned(),
                streams: stream.sctp_stream_count(),
            });
        }
    }

    media
}

fn media_to_stream(index: usize, media: &MediaDescription) -> Result<StreamDescription> {
    let stream_type = StreamType::from_media_name(&media.media)?;
    let setup = media
        .setup
        .map(DtlsSetup::try_from)
        .transpose()?
        .unwrap_or_default();
    let candidates = media
        .candidates
        .iter()
        .cloned()
        .map(|candidate| {
            candidate.with_stream_context(
                index,
                media.mid.clone(),
                media.ice_ufrag.clone(),
                media.ice_pwd.clone(),
            )
        })
        .collect();

    let mut builder = StreamDescriptionBuilder::new(stream_type)
        .with_mode(media.direction.into())
        .with_mid(media.mid.clone())
        .with_candidates(candidates)
        .with_setup(setup)
        .with_rtcp_mux(media.rtcp_mux);
    if let (Some(ufrag), Some(password)) = (&media.ice_ufrag, &media.ice_pwd) {
        builder = builder.with_ice_credentials(ufrag.clone(), password.clone());
    }
    if let Some(fingerprint) = &media.fingerprint {
        builder = builder
            .with_fingerprint_hash_function(&fingerprint.hash_function)
            .with_fingerprint(Some(fingerprint.value.clone()));
    }

    if stream_type.is_media() {
        let media_stream_id = media
            .media_stream_id
            .clone()
            .or_else(|| media.ssrcs.iter().find_map(|s| s.media_stream_id.clone()));
        let media_stream_track_id = media
            .media_stream_track_id
            .clone()
            .or_else(|| media.ssrcs.iter().find_map(|s| s.media_stream_track_id.clone()));
        builder = builder
            .with_payloads(media.payloads.iter().map(RTCPayload::from).collect())
            .with_ssrcs(media.ssrcs.iter().map(|s| s.ssrc).collect())
            .with_cname(media.ssrcs.iter().find_map(|s| s.cname.clone()))
            .with_media_stream_ids(media_stream_id, media_stream_track_id);
    } else if let Some(sctp) = &media.sctp {
        builder = builder.with_sctp(sctp.port, sctp.streams, &sctp.app);
    }

    Ok(builder.build())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::configuration::{default_audio_payloads, default_video_payloads};
    use ice::candidate::unmarshal_candidate;

    fn audio_stream() -> Result<StreamDescription> {
        let mut builder = StreamDescriptionBuilder::new(StreamType::Audio)
            .with_mode(StreamMode::SendReceive)
            .with_mid(Some("0".to_owned()))
            .with_ice_credentials("ufrag".to_owned(), "password".to_owned())
            .with_fingerprint(Some("AB:CD".to_owned()))
            .with_rtcp_mux(false)
            .with_payloads(default_audio_payloads())
            .with_media_stream_ids(Some("stream".to_owned()), Some("track".to_owned()));
        builder.add_candidate(unmarshal_candidate(
            "candidate:1 2 UDP 2130706430 192.168.1.2 54401 typ host",
        )?);
        builder.add_candidate(unmarshal_candidate(
            "candidate:1 1 UDP 2130706431 192.168.1.2 54400 typ host",
        )?);
        builder.set_cname("cname".to_owned());
        builder.add_ssrc(1234);
        Ok(builder.build())
    }

    #[test]
    fn test_stream_to_media_ports() -> Result<()> {
        let media = stream_to_media(&audio_stream()?);
        assert_eq!(media.port, 54400);
        assert_eq!(media.connection.address, "192.168.1.2");
        assert_eq!(media.protocol, MEDIA_PROTOCOL_RTP);
        assert_eq!(media.formats, vec!["111", "8", "0"]);
        assert_eq!(media.rtcp.as_ref().map(|rtcp| rtcp.port), Some(54401));

        let tests = vec![
            (StreamMode::SendReceive, 9),
            (StreamMode::Inactive, 0),
        ];
        for (mode, expected_port) in tests {
            let stream = StreamDescriptionBuilder::new(StreamType::Video)
                .with_mode(mode)
                .with_rtcp_mux(true)
                .with_payloads(default_video_payloads())
                .build();
            let media = stream_to_media(&stream);
            assert_eq!(media.port, expected_port, "{mode}");
            assert_eq!(media.connection, ConnectionInformation::default());
            assert!(media.rtcp.is_none());
        }

        Ok(())
    }

    #[test]
    fn test_data_stream_to_media() {
        let stream = StreamDescriptionBuilder::new(StreamType::Data)
            .with_sctp(5000, Some(1024), "webrtc-datachannel")
            .build();
        let media = stream_to_media(&stream);

        assert_eq!(media.media, "application");
        assert_eq!(media.protocol, MEDIA_PROTOCOL_SCTP);
        assert_eq!(media.formats, vec!["5000"]);
        assert_eq!(
            media.sctp,
            Some(SctpMap {
                port: 5000,
                app: "webrtc-datachannel".to_owned(),
                streams: Some(1024),
            })
        );
    }

    #[test]
    fn test_session_sdp_round_trip() -> Result<()> {
        let data = StreamDescriptionBuilder::new(StreamType::Data)
            .with_mid(Some("1".to_owned()))
            .with_setup(DtlsSetup::Active)
            .with_sctp(5000, Some(1024), "webrtc-datachannel")
            .build();
        let description = SessionDescriptionBuilder::new(RTCSdpType::Offer)
            .with_session_id(4242)
            .with_stream(audio_stream()?)
            .with_stream(data)
            .build();

        let text = session_to_sdp(&description).marshal();
        assert!(text.contains("a=msid-semantic: WMS\r\n"));

        let parsed = sdp_to_session(RTCSdpType::Offer, &sdp::SessionDescription::unmarshal(&text)?)?;
        assert_eq!(parsed.session_id(), 4242);
        assert_eq!(parsed.streams().len(), 2);

        let audio = &parsed.streams()[0];
        let expected = audio_stream()?;
        assert_eq!(audio.stream_type(), StreamType::Audio);
        assert_eq!(audio.mode(), StreamMode::SendReceive);
        assert_eq!(audio.mid(), Some("0"));
        assert_eq!(audio.ufrag(), Some("ufrag"));
        assert_eq!(audio.password(), Some("password"));
        assert_eq!(audio.fingerprint(), Some("AB:CD"));
        assert_eq!(audio.fingerprint_hash_function(), "sha-256");
        assert_eq!(audio.setup(), DtlsSetup::Actpass);
        assert!(!audio.rtcp_mux());
        assert_eq!(audio.payloads(), expected.payloads());
        assert_eq!(audio.ssrcs(), &[1234]);
        assert_eq!(audio.cname(), Some("cname"));
        assert_eq!(audio.media_stream_id(), Some("stream"));
        assert_eq!(audio.media_stream_track_id(), Some("track"));
        assert_eq!(audio.candidates().len(), 2);
        for candidate in audio.candidates() {
            assert_eq!(candidate.stream_index, Some(0));
            assert_eq!(candidate.stream_id.as_deref(), Some("0"));
            assert_eq!(candidate.ufrag.as_deref(), Some("ufrag"));
        }

        let data = &parsed.streams()[1];
        assert_eq!(data.stream_type(), StreamType::Data);
        assert_eq!(data.setup(), DtlsSetup::Active);
        assert_eq!(data.sctp_port(), Some(5000));
        assert_eq!(data.sctp_stream_count(), Some(1024));
        assert_eq!(data.app_label(), Some("webrtc-datachannel"));

        Ok(())
    }

    #[test]
    fn test_sdp_to_session_rejects_unknown_media() -> Result<()> {
        let text = "v=0\r\no=- 1 1 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\nm=text 9 RTP/SAVPF 0\r\n";
        let document = sdp::SessionDescription::unmarshal(text)?;
        assert!(sdp_to_session(RTCSdpType::Offer, &document).is_err());

        Ok(())
    }
}
