
use serde::{Deserialize, Serialize};
use shared::error::*;
use std::fmt;

const CANDIDATE_PREFIX: &str = "candidate:";
const ATTRIBUTE_PREFIX: &str = "a=";
const CRLF: &str = "\r\n";

/// Port a TCP candidate without an explicit `tcptype` is normalized to.
pub const TCP_DISCARD_PORT: u16 = 9;

/// Represents the type of candidate `CandidateType` enum.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateType {
    #[default]
    #[serde(rename = "host")]
    Host,
    #[serde(rename = "srflx")]
    ServerReflexive,
    #[serde(rename = "prflx")]
    PeerReflexive,
    #[serde(rename = "relay")]
    Relay,
}

impl fmt::Display for CandidateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match *self {
            CandidateType::Host => "host",
            CandidateType::ServerReflexive => "srflx",
            CandidateType::PeerReflexive => "prflx",
            CandidateType::Relay => "relay",
        };
        write!(f, "{s}")
    }
}

impl TryFrom<&str> for CandidateType {
    type Error = Error;

    fn try_from(raw: &str) -> Result<Self> {
        match raw {
            "host" => Ok(CandidateType::Host),
            "srflx" => Ok(CandidateType::ServerReflexive),
            "prflx" => Ok(CandidateType::PeerReflexive),
            "relay" => Ok(CandidateType::Relay),
            _ => Err(Error::ErrUnknownCandidateType(raw.to_owned())),
        }
    }
}

/// The ICE component a candidate belongs to.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CandidateComponent {
    #[default]
    Rtp,
    Rtcp,
}

impl CandidateComponent {
    /// Returns the component id used on the wire (1 for RTP, 2 for RTCP).
    pub const fn id(self) -> u16 {
        match self {
            CandidateComponent::Rtp => 1,
            CandidateComponent::Rtcp => 2,
        }
    }
}

impl fmt::Display for CandidateComponent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

impl TryFrom<&str> for CandidateComponent {
    type Error = Error;

    fn try_from(raw: &str) -> Result<Self> {
        match raw {
            "1" => Ok(CandidateComponent::Rtp),
            "2" => Ok(CandidateComponent::Rtcp),
            _ => Err(Error::ErrUnknownComponent(raw.to_owned())),
        }
    }
}

/// Transport protocol of a candidate, with the TCP connection role folded in.
#[derive(Default, Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TransportType {
    #[default]
    Udp,
    TcpActive,
    TcpPassive,
    TcpSo,
}

impl TransportType {
    pub fn is_tcp(self) -> bool {
        !matches!(self, TransportType::Udp)
    }

    /// Returns the protocol token used on the wire.
    pub fn network_short(self) -> &'static str {
        if self.is_tcp() { "TCP" } else { "UDP" }
    }

    /// Returns the `tcptype` token, if any.
    pub fn tcp_type(self) -> Option<&'static str> {
        match self {
            TransportType::Udp => None,
            TransportType::TcpActive => Some("active"),
            TransportType::TcpPassive => Some("passive"),
            TransportType::TcpSo => Some("so"),
        }
    }

    fn from_tcp_type(raw: &str) -> Result<Self> {
        match raw {
            "active" => Ok(TransportType::TcpActive),
            "passive" => Ok(TransportType::TcpPassive),
            "so" => Ok(TransportType::TcpSo),
            _ => Err(Error::ErrParseTcpType),
        }
    }
}

impl fmt::Display for TransportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.tcp_type() {
            Some(tcp_type) => write!(f, "tcp-{tcp_type}"),
            None => write!(f, "udp"),
        }
    }
}

/// Convey transport addresses related to the candidate, useful for diagnostics and other purposes.
#[derive(PartialEq, Eq, Debug, Clone, Serialize, Deserialize)]
pub struct CandidateRelatedAddress {
    pub address: String,
    pub port: u16,
}

impl fmt::Display for CandidateRelatedAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, " related {}:{}", self.address, self.port)
    }
}

/// An ICE candidate as carried on an `a=candidate` line.
///
/// The stream context (`stream_index`, `stream_id`, `ufrag`, `password`) is
/// empty on a freshly parsed candidate and is filled in once the candidate is
/// attached to a stream.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub foundation: String,
    pub component: CandidateComponent,
    pub transport: TransportType,
    pub priority: u32,
    pub address: String,
    pub port: u16,
    pub candidate_type: CandidateType,
    pub related_address: Option<CandidateRelatedAddress>,
    /// Transport token as spelled on the received line when it is not the
    /// upper-case form (browsers send `udp`). `marshal` re-emits it.
    pub transport_token: Option<String>,

    pub stream_index: Option<usize>,
    pub stream_id: Option<String>,
    pub ufrag: Option<String>,
    pub password: Option<String>,
}

impl Candidate {
    /// Returns the string representation of the ICECandidate, without the `a=`
    /// prefix and without a line terminator.
    pub fn marshal(&self) -> String {
        let mut val = format!(
            "{CANDIDATE_PREFIX}{} {} {} {} {} {} typ {}",
            self.foundation,
            self.component,
            self.wire_transport(),
            self.priority,
            self.address,
            self.port,
            self.candidate_type
        );

        if let Some(related_address) = &self.related_address {
            val += format!(
                " raddr {} rport {}",
                related_address.address, related_address.port,
            )
            .as_str();
        }

        if let Some(tcp_type) = self.transport.tcp_type() {
            val += format!(" tcptype {tcp_type}").as_str();
        }

        val
    }

    fn wire_transport(&self) -> &str {
        let canonical = self.transport.network_short();
        self.transport_token
            .as_deref()
            .filter(|token| token.eq_ignore_ascii_case(canonical))
            .unwrap_or(canonical)
    }

    /// Returns a copy of the candidate bound to the given stream.
    pub fn with_stream_context(
        mut self,
        stream_index: usize,
        stream_id: Option<String>,
        ufrag: Option<String>,
        password: Option<String>,
    ) -> Self {
        self.stream_index = Some(stream_index);
        self.stream_id = stream_id;
        self.ufrag = ufrag;
        self.password = password;
        self
    }

    /// Reports whether the candidate is bound to a stream.
    pub fn has_stream_context(&self) -> bool {
        self.stream_index.is_some() || self.stream_id.is_some()
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(related_address) = &self.related_address {
            write!(
                f,
                "{} {} {}:{}{}",
                self.transport, self.candidate_type, self.address, self.port, related_address
            )
        } else {
            write!(
                f,
                "{} {} {}:{}",
                self.transport, self.candidate_type, self.address, self.port,
            )
        }
    }
}

/// Creates a Candidate from its `a=candidate` line representation.
///
/// The `a=` prefix and a trailing CRLF are optional; tokens after the
/// recognized fields (`generation`, `ufrag`, `network-id`, ...) are ignored.
pub fn unmarshal_candidate(raw: &str) -> Result<Candidate> {
    let line = raw.strip_suffix(CRLF).unwrap_or(raw);
    if line.contains(['\r', '\n']) {
        return Err(Error::ErrInvalidCandidate(
            "embedded line terminator".to_owned(),
        ));
    }

    let line = line.strip_prefix(ATTRIBUTE_PREFIX).unwrap_or(line);
    let line = line
        .strip_prefix(CANDIDATE_PREFIX)
        .ok_or(Error::ErrCandidateMissingPrefix)?;

    let split: Vec<&str> = line.split(' ').collect();
    if split.len() < 8 || split[..8].iter().any(|s| s.is_empty()) {
        return Err(Error::ErrAttributeTooShortIceCandidate(split.len()));
    }

    // Foundation
    let foundation = split[0].to_owned();

    // Component
    let component = CandidateComponent::try_from(split[1])?;

    // Network
    let is_tcp = if split[2].eq_ignore_ascii_case("udp") {
        false
    } else if split[2].eq_ignore_ascii_case("tcp") {
        true
    } else {
        return Err(Error::ErrUnknownTransport(split[2].to_owned()));
    };

    // Priority
    let priority: u32 = split[3].parse()?;

    // Address
    let address = split[4].to_owned();

    // Port
    let mut port: u16 = split[5].parse()?;

    if split[6] != "typ" {
        return Err(Error::ErrInvalidCandidate(format!(
            "expected typ, got {}",
            split[6]
        )));
    }
    let candidate_type = CandidateType::try_from(split[7])?;

    let mut rest = &split[8..];
    let mut related_address = None;
    let mut tcp_type = None;

    if rest.first() == Some(&"raddr") {
        if rest.len() < 4 || rest[2] != "rport" || rest[1].is_empty() {
            return Err(Error::ErrParseRelatedAddr);
        }
        related_address = Some(CandidateRelatedAddress {
            address: rest[1].to_owned(),
            port: rest[3].parse().map_err(|_| Error::ErrParseRelatedAddr)?,
        });
        rest = &rest[4..];
    }

    if rest.first() == Some(&"tcptype") {
        if rest.len() < 2 {
            return Err(Error::ErrParseTcpType);
        }
        tcp_type = Some(TransportType::from_tcp_type(rest[1])?);
    }

    match (candidate_type, &related_address) {
        (CandidateType::Host, Some(_)) => return Err(Error::ErrHostWithRelatedAddress),
        (CandidateType::Host, None) | (_, Some(_)) => {}
        (typ, None) => return Err(Error::ErrMissingRelatedAddress(typ.to_string())),
    }

    let transport = if !is_tcp {
        TransportType::Udp
    } else if let Some(tcp_type) = tcp_type {
        tcp_type
    } else if port == 0 || port == TCP_DISCARD_PORT {
        port = TCP_DISCARD_PORT;
        TransportType::TcpActive
    } else {
        return Err(Error::ErrTcpCandidateWithoutType(port));
    };

    let transport_token = (split[2] != transport.network_short()).then(|| split[2].to_owned());

    Ok(Candidate {
        foundation,
        component,
        transport,
        priority,
        address,
        port,
        candidate_type,
        related_address,
        transport_token,
        ..Default::default()
    })
}
