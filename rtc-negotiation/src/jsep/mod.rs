//! JSEP wire shapes: `{type, sdp}` session descriptions and
//! `{candidate, sdpMid, sdpMLineIndex}` candidates.

pub mod sdp_conversion;

use ice::candidate::{Candidate, unmarshal_candidate};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use shared::error::{Error, Result};

use crate::description::{RTCSdpType, SessionDescription};
use sdp_conversion::{sdp_to_session, session_to_sdp};

const JSEP_KEY_TYPE: &str = "type";
const JSEP_KEY_SDP: &str = "sdp";
const JSEP_KEY_CANDIDATE: &str = "candidate";
const JSEP_KEY_SDP_MID: &str = "sdpMid";
const JSEP_KEY_SDP_MLINE_INDEX: &str = "sdpMLineIndex";
const JSEP_KEY_USERNAME_FRAGMENT: &str = "usernameFragment";

/// A session description as exchanged with the remote peer.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RTCSessionDescriptionInit {
    #[serde(rename = "type")]
    pub sdp_type: RTCSdpType,
    pub sdp: String,
}

impl RTCSessionDescriptionInit {
    /// Parses the carried SDP into a session description.
    pub fn to_session(&self) -> Result<SessionDescription> {
        let document = sdp::SessionDescription::unmarshal(&self.sdp)?;
        sdp_to_session(self.sdp_type, &document)
    }
}

/// ICECandidateInit is used to serialize ice candidates
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RTCIceCandidateInit {
    pub candidate: String,
    pub sdp_mid: Option<String>,
    #[serde(rename = "sdpMLineIndex")]
    pub sdp_mline_index: Option<u16>,
    pub username_fragment: Option<String>,
}

pub fn session_to_jsep(description: &SessionDescription) -> RTCSessionDescriptionInit {
    RTCSessionDescriptionInit {
        sdp_type: description.sdp_type(),
        sdp: session_to_sdp(description).marshal(),
    }
}

/// Reads a `{type, sdp}` object. Both members must be present strings and
/// `type` must be `offer` or `answer`.
pub fn jsep_to_session(value: &Value) -> Result<SessionDescription> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::ErrMalformedJsep("session description is not an object".to_owned()))?;
    let sdp_type = object
        .get(JSEP_KEY_TYPE)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::ErrMalformedJsep(format!("missing `{JSEP_KEY_TYPE}`")))?;
    let sdp = object
        .get(JSEP_KEY_SDP)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::ErrMalformedJsep(format!("missing `{JSEP_KEY_SDP}`")))?;

    RTCSessionDescriptionInit {
        sdp_type: RTCSdpType::try_from(sdp_type)?,
        sdp: sdp.to_owned(),
    }
    .to_session()
}

pub fn candidate_to_jsep(candidate: &Candidate) -> RTCIceCandidateInit {
    RTCIceCandidateInit {
        candidate: candidate.marshal(),
        sdp_mid: candidate.stream_id.clone(),
        sdp_mline_index: candidate
            .stream_index
            .and_then(|index| u16::try_from(index).ok()),
        username_fragment: candidate.ufrag.clone(),
    }
}

// Browsers disagree on the JSON type of sdpMLineIndex. Anything that is not
// a non-negative integer reads as -1.
fn parse_mline_index(value: &Value) -> i64 {
    match value {
        Value::Number(number) => number.as_i64().unwrap_or(-1),
        Value::String(s) => s.trim().parse().unwrap_or(-1),
        _ => -1,
    }
}

/// Reads a `{candidate, sdpMid?, sdpMLineIndex?}` object into a candidate
/// bound to the stream it names.
pub fn jsep_to_candidate(value: &Value) -> Result<Candidate> {
    let object = value
        .as_object()
        .ok_or_else(|| Error::ErrMalformedJsep("candidate is not an object".to_owned()))?;
    let line = object
        .get(JSEP_KEY_CANDIDATE)
        .and_then(Value::as_str)
        .ok_or_else(|| Error::ErrMalformedJsep(format!("missing `{JSEP_KEY_CANDIDATE}`")))?;

    let sdp_mid = object
        .get(JSEP_KEY_SDP_MID)
        .and_then(Value::as_str)
        .map(str::to_owned);
    let sdp_mline_index = object
        .get(JSEP_KEY_SDP_MLINE_INDEX)
        .map(parse_mline_index)
        .unwrap_or(-1);
    if sdp_mid.is_none() && sdp_mline_index < 0 {
        return Err(Error::ErrJsepCandidateMissingMidAndIndex);
    }

    let candidate = unmarshal_candidate(line)?;
    Ok(Candidate {
        stream_index: usize::try_from(sdp_mline_index).ok(),
        stream_id: sdp_mid,
        ufrag: object
            .get(JSEP_KEY_USERNAME_FRAGMENT)
            .and_then(Value::as_str)
            .map(str::to_owned),
        ..candidate
    })
}
