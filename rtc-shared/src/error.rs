#![allow(dead_code)]

use std::num::ParseIntError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug, PartialEq)]
#[non_exhaustive]
pub enum Error {
    //Candidate errors
    #[error("invalid candidate: {0}")]
    ErrInvalidCandidate(String),
    #[error("candidate: missing candidate: prefix")]
    ErrCandidateMissingPrefix,
    #[error("candidate: attribute too short ({0} fields)")]
    ErrAttributeTooShortIceCandidate(usize),
    #[error("candidate: unknown component {0}")]
    ErrUnknownComponent(String),
    #[error("candidate: unknown transport {0}")]
    ErrUnknownTransport(String),
    #[error("candidate: unknown candidate type {0}")]
    ErrUnknownCandidateType(String),
    #[error("candidate: could not parse related addresses")]
    ErrParseRelatedAddr,
    #[error("candidate: could not parse tcptype")]
    ErrParseTcpType,
    #[error("candidate: host candidate must not carry a related address")]
    ErrHostWithRelatedAddress,
    #[error("candidate: {0} candidate requires a related address")]
    ErrMissingRelatedAddress(String),
    #[error("candidate: tcp candidate without tcptype must use port 0 or 9, got {0}")]
    ErrTcpCandidateWithoutType(u16),

    //SDP errors
    #[error("sdp: invalid syntax `{0}`")]
    ErrSdpInvalidSyntax(String),
    #[error("sdp: invalid value `{0}`")]
    ErrSdpInvalidValue(String),
    #[error("sdp: missing `{0}=` line")]
    ErrSdpMissingLine(&'static str),
    #[error("sdp: empty description")]
    ErrSdpEmpty,

    //JSEP errors
    #[error("jsep: malformed input: {0}")]
    ErrMalformedJsep(String),
    #[error("jsep: candidate must carry sdpMid or sdpMLineIndex")]
    ErrJsepCandidateMissingMidAndIndex,

    //Negotiation errors
    #[error("protocol violation: {0}")]
    ErrProtocolViolation(String),
    #[error("unsupported codec: {0}")]
    ErrUnsupportedCodec(String),
    #[error("no usable payload")]
    ErrNoUsablePayload,
    #[error("crypto algorithm unavailable: {0}")]
    ErrCryptoAlgorithmUnavailable(String),
    #[error("invalid PEM: {0}")]
    ErrInvalidPem(String),
    #[error("invalid argument: {0}")]
    ErrInvalidArgument(String),
    #[error("media engine: {0}")]
    ErrMediaEngine(String),

    #[error("mutex poison: {0}")]
    PoisonError(String),
    #[error("parse int: {0}")]
    ParseInt(#[from] ParseIntError),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Reports whether the error breaks the offer/answer sequencing rules and is
    /// therefore fatal to the session.
    pub fn is_protocol_violation(&self) -> bool {
        matches!(self, Error::ErrProtocolViolation(_))
    }

    /// Reports whether the error stems from unparseable SDP, candidate or JSEP input.
    pub fn is_malformed_input(&self) -> bool {
        matches!(
            self,
            Error::ErrInvalidCandidate(_)
                | Error::ErrCandidateMissingPrefix
                | Error::ErrAttributeTooShortIceCandidate(_)
                | Error::ErrUnknownComponent(_)
                | Error::ErrUnknownTransport(_)
                | Error::ErrUnknownCandidateType(_)
                | Error::ErrParseRelatedAddr
                | Error::ErrParseTcpType
                | Error::ErrHostWithRelatedAddress
                | Error::ErrMissingRelatedAddress(_)
                | Error::ErrTcpCandidateWithoutType(_)
                | Error::ErrSdpInvalidSyntax(_)
                | Error::ErrSdpInvalidValue(_)
                | Error::ErrSdpMissingLine(_)
                | Error::ErrSdpEmpty
                | Error::ErrMalformedJsep(_)
                | Error::ErrJsepCandidateMissingMidAndIndex
                | Error::ParseInt(_)
        )
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        Error::PoisonError(e.to_string())
    }
}
