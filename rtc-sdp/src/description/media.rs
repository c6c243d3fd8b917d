use std::fmt;

use ice::candidate::{unmarshal_candidate, Candidate};
use log::{debug, trace};
use shared::error::{Error, Result};

use super::common::*;
use super::*;
use crate::util::FmtpParameters;

pub const DEFAULT_SCTP_APP: &str = "webrtc-datachannel";

const PCMU_PAYLOAD_TYPE: u8 = 0;
const PCMA_PAYLOAD_TYPE: u8 = 8;
const STATIC_AUDIO_CLOCK_RATE: u32 = 8000;

/// A payload format of a media block, assembled from the format id on the
/// `m=` line and its `rtpmap`, `fmtp` and `rtcp-fb` attributes.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct PayloadFormat {
    pub payload_type: u8,
    pub encoding_name: String,
    pub clock_rate: u32,
    pub channels: Option<u16>,
    pub parameters: FmtpParameters,
    pub nack: bool,
    pub nack_pli: bool,
    pub ccm_fir: bool,
}

impl PayloadFormat {
    fn unmarshal_rtpmap(value: &str) -> Result<Self> {
        let (payload_type, encoding) = value
            .split_once(' ')
            .ok_or_else(|| Error::ErrSdpInvalidValue(format!("rtpmap {value}")))?;
        let payload_type = parse_payload_type(payload_type)?;

        let mut split = encoding.trim().split('/');
        let encoding_name = split
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| Error::ErrSdpInvalidValue(format!("rtpmap {value}")))?;
        let clock_rate = match split.next() {
            Some(clock_rate) => clock_rate
                .parse::<u32>()
                .map_err(|_| Error::ErrSdpInvalidValue(format!("rtpmap clock rate {value}")))?,
            None => 0,
        };
        let channels = match split.next() {
            Some(channels) => Some(
                channels
                    .parse::<u16>()
                    .map_err(|_| Error::ErrSdpInvalidValue(format!("rtpmap channels {value}")))?,
            ),
            None => None,
        };

        Ok(PayloadFormat {
            payload_type,
            encoding_name: encoding_name.to_owned(),
            clock_rate,
            channels,
            ..Default::default()
        })
    }

    fn implicit(payload_type: u8) -> Option<Self> {
        let encoding_name = match payload_type {
            PCMU_PAYLOAD_TYPE => "PCMU",
            PCMA_PAYLOAD_TYPE => "PCMA",
            _ => return None,
        };
        Some(PayloadFormat {
            payload_type,
            encoding_name: encoding_name.to_owned(),
            clock_rate: STATIC_AUDIO_CLOCK_RATE,
            ..Default::default()
        })
    }

    fn apply_feedback(&mut self, feedback: &str) {
        match feedback {
            "nack" => self.nack = true,
            "nack pli" => self.nack_pli = true,
            "ccm fir" => self.ccm_fir = true,
            _ => trace!("ignoring rtcp-fb {feedback} for payload {}", self.payload_type),
        }
    }
}

/// `a=rtcp` port with an optional connection address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RtcpAttribute {
    pub port: u16,
    pub connection: Option<ConnectionInformation>,
}

impl RtcpAttribute {
    fn unmarshal(value: &str) -> Result<Self> {
        let fields: Vec<&str> = value.split_whitespace().collect();
        let port = fields
            .first()
            .ok_or_else(|| Error::ErrSdpInvalidValue("rtcp".to_owned()))?
            .parse::<u16>()
            .map_err(|_| Error::ErrSdpInvalidValue(format!("rtcp {value}")))?;
        let connection = if fields.len() >= 4 {
            Some(ConnectionInformation::unmarshal(&fields[1..].join(" "))?)
        } else {
            None
        };
        Ok(RtcpAttribute { port, connection })
    }
}

impl fmt::Display for RtcpAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.connection {
            Some(connection) => write!(f, "{} {}", self.port, connection),
            None => write!(f, "{}", self.port),
        }
    }
}

/// Source description gathered from the `a=ssrc` lines sharing one SSRC.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct SsrcDescription {
    pub ssrc: u32,
    pub cname: Option<String>,
    pub media_stream_id: Option<String>,
    pub media_stream_track_id: Option<String>,
}

/// SCTP association parameters of a data block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SctpMap {
    pub port: u16,
    pub app: String,
    pub streams: Option<u16>,
}

impl SctpMap {
    fn unmarshal(value: &str) -> Result<Self> {
        let fields: Vec<&str> = value.split_whitespace().collect();
        if fields.len() < 2 {
            return Err(Error::ErrSdpInvalidValue(format!("sctpmap {value}")));
        }
        let port = fields[0]
            .parse::<u16>()
            .map_err(|_| Error::ErrSdpInvalidValue(format!("sctpmap port {value}")))?;
        let streams = match fields.get(2) {
            Some(streams) => Some(
                streams
                    .parse::<u16>()
                    .map_err(|_| Error::ErrSdpInvalidValue(format!("sctpmap streams {value}")))?,
            ),
            None => None,
        };
        Ok(SctpMap {
            port,
            app: fields[1].to_owned(),
            streams,
        })
    }
}

impl fmt::Display for SctpMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.port, self.app)?;
        if let Some(streams) = self.streams {
            write!(f, " {streams}")?;
        }
        Ok(())
    }
}

/// MediaDescription represents one media block of a session description,
/// from its `m=` line up to the next one.
///
/// Fields that may be declared at session level (`connection`, `direction`,
/// ICE credentials, `fingerprint`, `setup`) are already resolved against the
/// session on a parsed description.
#[derive(Default, Debug, Clone, PartialEq, Eq)]
pub struct MediaDescription {
    pub media: String,
    pub port: u16,
    pub protocol: String,
    pub formats: Vec<String>,

    pub connection: ConnectionInformation,
    pub direction: Direction,
    pub mid: Option<String>,

    pub payloads: Vec<PayloadFormat>,
    pub rtcp: Option<RtcpAttribute>,
    pub rtcp_mux: bool,
    pub ssrcs: Vec<SsrcDescription>,
    pub media_stream_id: Option<String>,
    pub media_stream_track_id: Option<String>,

    pub ice_ufrag: Option<String>,
    pub ice_pwd: Option<String>,
    pub candidates: Vec<Candidate>,
    pub fingerprint: Option<Fingerprint>,
    pub setup: Option<ConnectionRole>,

    pub sctp: Option<SctpMap>,
}

impl MediaDescription {
    /// Reports whether the block carries any stream or track identifier.
    pub fn has_stream_ids(&self) -> bool {
        self.media_stream_id.is_some()
            || self.media_stream_track_id.is_some()
            || self
                .ssrcs
                .iter()
                .any(|s| s.media_stream_id.is_some() || s.media_stream_track_id.is_some())
    }

    pub fn payload(&self, payload_type: u8) -> Option<&PayloadFormat> {
        self.payloads.iter().find(|p| p.payload_type == payload_type)
    }
}

impl fmt::Display for MediaDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "m={} {} {}", self.media, self.port, self.protocol)?;
        for format in &self.formats {
            write!(f, " {format}")?;
        }
        write!(f, "{END_LINE}")?;
        write!(f, "c={}{END_LINE}", self.connection)?;

        if let Some(rtcp) = &self.rtcp {
            write!(f, "a=rtcp:{rtcp}{END_LINE}")?;
        }
        if self.rtcp_mux {
            write!(f, "a=rtcp-mux{END_LINE}")?;
        }
        if let Some(ufrag) = &self.ice_ufrag {
            write!(f, "a=ice-ufrag:{ufrag}{END_LINE}")?;
        }
        if let Some(pwd) = &self.ice_pwd {
            write!(f, "a=ice-pwd:{pwd}{END_LINE}")?;
        }
        for candidate in &self.candidates {
            write!(f, "a={}{END_LINE}", candidate.marshal())?;
        }
        if let Some(fingerprint) = &self.fingerprint {
            write!(f, "a=fingerprint:{fingerprint}{END_LINE}")?;
        }
        if let Some(setup) = &self.setup {
            write!(f, "a=setup:{setup}{END_LINE}")?;
        }
        if let Some(mid) = &self.mid {
            write!(f, "a=mid:{mid}{END_LINE}")?;
        }
        if let Some(stream_id) = &self.media_stream_id {
            write!(f, "a=msid:{stream_id}")?;
            if let Some(track_id) = &self.media_stream_track_id {
                write!(f, " {track_id}")?;
            }
            write!(f, "{END_LINE}")?;
        }
        write!(f, "a={}{END_LINE}", self.direction)?;

        for payload in &self.payloads {
            write!(
                f,
                "a=rtpmap:{} {}/{}",
                payload.payload_type, payload.encoding_name, payload.clock_rate
            )?;
            if let Some(channels) = payload.channels {
                write!(f, "/{channels}")?;
            }
            write!(f, "{END_LINE}")?;
            if !payload.parameters.is_empty() {
                write!(
                    f,
                    "a=fmtp:{} {}{END_LINE}",
                    payload.payload_type, payload.parameters
                )?;
            }
            if payload.nack {
                write!(f, "a=rtcp-fb:{} nack{END_LINE}", payload.payload_type)?;
            }
            if payload.nack_pli {
                write!(f, "a=rtcp-fb:{} nack pli{END_LINE}", payload.payload_type)?;
            }
            if payload.ccm_fir {
                write!(f, "a=rtcp-fb:{} ccm fir{END_LINE}", payload.payload_type)?;
            }
        }

        for ssrc in &self.ssrcs {
            if let Some(cname) = &ssrc.cname {
                write!(f, "a=ssrc:{} cname:{cname}{END_LINE}", ssrc.ssrc)?;
            }
            if let Some(stream_id) = &ssrc.media_stream_id {
                write!(f, "a=ssrc:{} msid:{stream_id}", ssrc.ssrc)?;
                if let Some(track_id) = &ssrc.media_stream_track_id {
                    write!(f, " {track_id}")?;
                }
                write!(f, "{END_LINE}")?;
            }
        }

        if let Some(sctp) = &self.sctp {
            write!(f, "a=sctpmap:{sctp}{END_LINE}")?;
        }

        Ok(())
    }
}

/// Attributes that may be declared at session level and inherited by every
/// media block that does not declare its own.
#[derive(Default, Debug, Clone)]
pub(crate) struct SessionFallback {
    pub(crate) connection: Option<ConnectionInformation>,
    pub(crate) direction: Option<Direction>,
    pub(crate) ice_ufrag: Option<String>,
    pub(crate) ice_pwd: Option<String>,
    pub(crate) fingerprint: Option<Fingerprint>,
    pub(crate) setup: Option<ConnectionRole>,
}

impl SessionFallback {
    /// Applies a session-level attribute, returning false when the key is
    /// not one a media block can inherit.
    pub(crate) fn apply_attribute(&mut self, key: &str, value: Option<&str>) -> Result<bool> {
        if let Some(direction) = Direction::from_attribute(key) {
            self.direction = Some(direction);
            return Ok(true);
        }
        match (key, value) {
            (ATTR_KEY_ICE_UFRAG, Some(value)) => self.ice_ufrag = Some(value.to_owned()),
            (ATTR_KEY_ICE_PWD, Some(value)) => self.ice_pwd = Some(value.to_owned()),
            (ATTR_KEY_FINGERPRINT, Some(value)) => {
                self.fingerprint = Some(Fingerprint::unmarshal(value)?)
            }
            (ATTR_KEY_SETUP, Some(value)) => {
                self.setup = Some(ConnectionRole::try_from(value.trim())?)
            }
            _ => return Ok(false),
        }
        Ok(true)
    }
}

/// Accumulates the lines of one media block until the whole document has
/// been read and session-level fallbacks are known.
#[derive(Default, Debug)]
pub(crate) struct MediaDraft {
    description: MediaDescription,
    connection: Option<ConnectionInformation>,
    fallback: SessionFallback,
    rtpmaps: Vec<PayloadFormat>,
    fmtps: Vec<(u8, FmtpParameters)>,
    feedback: Vec<(Option<u8>, String)>,
    ssrc_lines: Vec<(String, String)>,
    msid: Option<String>,
    sctp_port: Option<u16>,
}

impl MediaDraft {
    /// Starts a block from the value of its `m=` line.
    pub(crate) fn from_media_line(value: &str) -> Result<Self> {
        let fields: Vec<&str> = value.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(Error::ErrSdpInvalidSyntax(format!("m={value}")));
        }
        // "<port>/<number of ports>" keeps only the base port
        let port = fields[1].split('/').next().unwrap_or(fields[1]);
        let port = port
            .parse::<u16>()
            .map_err(|_| Error::ErrSdpInvalidValue(format!("media port {}", fields[1])))?;

        Ok(MediaDraft {
            description: MediaDescription {
                media: fields[0].to_owned(),
                port,
                protocol: fields[2].to_owned(),
                formats: fields[3..].iter().map(|s| s.to_string()).collect(),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    pub(crate) fn set_connection(&mut self, value: &str) -> Result<()> {
        self.connection = Some(ConnectionInformation::unmarshal(value)?);
        Ok(())
    }

    pub(crate) fn apply_attribute(&mut self, key: &str, value: Option<&str>) -> Result<()> {
        if self.fallback.apply_attribute(key, value)? {
            return Ok(());
        }

        let description = &mut self.description;
        match (key, value) {
            (ATTR_KEY_RTPMAP, Some(value)) => {
                let payload = PayloadFormat::unmarshal_rtpmap(value)?;
                self.rtpmaps.retain(|p| p.payload_type != payload.payload_type);
                self.rtpmaps.push(payload);
            }
            (ATTR_KEY_FMTP, Some(value)) => {
                let (payload_type, parameters) = match value.split_once(' ') {
                    Some((payload_type, parameters)) => (payload_type, parameters),
                    None => (value, ""),
                };
                self.fmtps.push((
                    parse_payload_type(payload_type)?,
                    FmtpParameters::unmarshal(parameters),
                ));
            }
            (ATTR_KEY_RTCP_FB, Some(value)) => {
                let (target, feedback) = value
                    .split_once(' ')
                    .ok_or_else(|| Error::ErrSdpInvalidValue(format!("rtcp-fb {value}")))?;
                let target = if target == "*" {
                    None
                } else {
                    Some(parse_payload_type(target)?)
                };
                self.feedback.push((target, feedback.trim().to_owned()));
            }
            (ATTR_KEY_RTCP, Some(value)) => {
                description.rtcp = Some(RtcpAttribute::unmarshal(value)?);
            }
            (ATTR_KEY_RTCP_MUX, _) => description.rtcp_mux = true,
            (ATTR_KEY_SSRC, Some(value)) => {
                if let Some((ssrc, attribute)) = value.split_once(' ') {
                    self.ssrc_lines
                        .push((ssrc.to_owned(), attribute.trim().to_owned()));
                }
            }
            (ATTR_KEY_MSID, Some(value)) => self.msid = Some(value.trim().to_owned()),
            (ATTR_KEY_MID, Some(value)) => description.mid = Some(value.to_owned()),
            (ATTR_KEY_CANDIDATE, Some(value)) => {
                let candidate = unmarshal_candidate(&format!("{ATTR_KEY_CANDIDATE}:{value}"))?;
                description.candidates.push(candidate);
            }
            (ATTR_KEY_SCTPMAP, Some(value)) => {
                description.sctp = Some(SctpMap::unmarshal(value)?);
            }
            (ATTR_KEY_SCTP_PORT, Some(value)) => {
                self.sctp_port = Some(
                    value
                        .trim()
                        .parse::<u16>()
                        .map_err(|_| Error::ErrSdpInvalidValue(format!("sctp-port {value}")))?,
                );
            }
            _ => trace!("ignoring media attribute {key}"),
        }
        Ok(())
    }

    /// Resolves the block against the session-level fallbacks.
    pub(crate) fn finish(
        self,
        session: &SessionFallback,
        msid_semantic: bool,
    ) -> Result<MediaDescription> {
        let MediaDraft {
            mut description,
            connection,
            fallback,
            rtpmaps,
            fmtps,
            feedback,
            ssrc_lines,
            msid,
            sctp_port,
        } = self;

        description.connection = connection
            .or_else(|| session.connection.clone())
            .unwrap_or_default();
        description.direction = fallback
            .direction
            .or(session.direction)
            .unwrap_or_default();
        description.ice_ufrag = fallback.ice_ufrag.or_else(|| session.ice_ufrag.clone());
        description.ice_pwd = fallback.ice_pwd.or_else(|| session.ice_pwd.clone());
        description.fingerprint = fallback
            .fingerprint
            .or_else(|| session.fingerprint.clone());
        description.setup = fallback.setup.or(session.setup);

        for format in &description.formats {
            let Ok(payload_type) = format.parse::<u8>() else {
                trace!("format {format} is not a payload type");
                continue;
            };
            let payload = rtpmaps
                .iter()
                .find(|p| p.payload_type == payload_type)
                .cloned()
                .or_else(|| PayloadFormat::implicit(payload_type));
            let Some(mut payload) = payload else {
                debug!("dropping payload {payload_type} without rtpmap");
                continue;
            };
            for (_, parameters) in fmtps.iter().filter(|(pt, _)| *pt == payload_type) {
                for (key, value) in parameters.iter() {
                    payload.parameters.insert(key, value);
                }
            }
            for (_, kind) in feedback
                .iter()
                .filter(|(target, _)| target.is_none_or(|pt| pt == payload_type))
            {
                payload.apply_feedback(kind);
            }
            description.payloads.push(payload);
        }

        if msid_semantic {
            if let Some(msid) = msid {
                let mut ids = msid.split_whitespace();
                description.media_stream_id = ids.next().map(str::to_owned);
                description.media_stream_track_id = ids.next().map(str::to_owned);
            }
            description.ssrcs = ssrc_descriptions(&ssrc_lines)?;
        }

        if description.sctp.is_none() {
            if let Some(port) = sctp_port {
                description.sctp = Some(SctpMap {
                    port,
                    app: description
                        .formats
                        .first()
                        .cloned()
                        .unwrap_or_else(|| DEFAULT_SCTP_APP.to_owned()),
                    streams: None,
                });
            }
        }

        Ok(description)
    }
}

fn ssrc_descriptions(lines: &[(String, String)]) -> Result<Vec<SsrcDescription>> {
    let mut ssrcs: Vec<SsrcDescription> = vec![];
    for (ssrc, attribute) in lines {
        let ssrc = ssrc
            .parse::<u32>()
            .map_err(|_| Error::ErrSdpInvalidValue(format!("ssrc {ssrc}")))?;
        let idx = match ssrcs.iter().position(|s| s.ssrc == ssrc) {
            Some(idx) => idx,
            None => {
                ssrcs.push(SsrcDescription {
                    ssrc,
                    ..Default::default()
                });
                ssrcs.len() - 1
            }
        };
        let entry = &mut ssrcs[idx];

        match attribute.split_once(':') {
            Some(("cname", cname)) => entry.cname = Some(cname.to_owned()),
            Some(("msid", msid)) => {
                let mut ids = msid.split_whitespace();
                entry.media_stream_id = ids.next().map(str::to_owned);
                entry.media_stream_track_id = ids.next().map(str::to_owned);
            }
            _ => trace!("ignoring ssrc attribute {attribute}"),
        }
    }
    Ok(ssrcs)
}

fn parse_payload_type(raw: &str) -> Result<u8> {
    raw.trim()
        .parse::<u8>()
        .map_err(|_| Error::ErrSdpInvalidValue(format!("payload type {raw}")))
}
