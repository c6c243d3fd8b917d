use std::fmt;

use serde::{Deserialize, Serialize};
use shared::error::{Error, Result};

/// Describes the type of a session description in the SDP offer/answer model.
#[derive(Default, Debug, PartialEq, Eq, Copy, Clone, Serialize, Deserialize)]
pub enum RTCSdpType {
    /// Indicates that a description MUST be treated as an SDP offer.
    #[default]
    #[serde(rename = "offer")]
    Offer,

    /// Indicates that a description MUST be treated as a final SDP answer.
    #[serde(rename = "answer")]
    Answer,
}

const SDP_TYPE_OFFER_STR: &str = "offer";
const SDP_TYPE_ANSWER_STR: &str = "answer";

/// creates an SDPType from a string
impl TryFrom<&str> for RTCSdpType {
    type Error = Error;

    fn try_from(raw: &str) -> Result<Self> {
        match raw {
            SDP_TYPE_OFFER_STR => Ok(RTCSdpType::Offer),
            SDP_TYPE_ANSWER_STR => Ok(RTCSdpType::Answer),
            _ => Err(Error::ErrMalformedJsep(format!("unknown type {raw}"))),
        }
    }
}

impl fmt::Display for RTCSdpType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            RTCSdpType::Offer => write!(f, "{SDP_TYPE_OFFER_STR}"),
            RTCSdpType::Answer => write!(f, "{SDP_TYPE_ANSWER_STR}"),
        }
    }
}
