use std::fmt;

use log::trace;
use shared::error::{Error, Result};

use super::common::*;
use super::media::*;
use super::*;

const MSID_SEMANTIC_WMS: &str = "WMS";

/// Origin defines the structure for the "o=" field which provides the
/// originator of the session plus a session identifier and version number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub username: String,
    pub session_id: u64,
    pub session_version: u64,
    pub network_type: String,
    pub address_type: String,
    pub unicast_address: String,
}

impl Default for Origin {
    fn default() -> Self {
        Origin {
            username: "-".to_owned(),
            session_id: 0,
            session_version: 1,
            network_type: DEFAULT_NETWORK_TYPE.to_owned(),
            address_type: DEFAULT_ADDRESS_TYPE.to_owned(),
            unicast_address: "127.0.0.1".to_owned(),
        }
    }
}

impl Origin {
    fn unmarshal(value: &str) -> Result<Self> {
        let fields: Vec<&str> = value.split_whitespace().collect();
        if fields.len() != 6 {
            return Err(Error::ErrSdpInvalidSyntax(format!("o={value}")));
        }
        Ok(Origin {
            username: fields[0].to_owned(),
            session_id: fields[1]
                .parse()
                .map_err(|_| Error::ErrSdpInvalidValue(format!("session id {}", fields[1])))?,
            session_version: fields[2]
                .parse()
                .map_err(|_| Error::ErrSdpInvalidValue(format!("session version {}", fields[2])))?,
            network_type: fields[3].to_owned(),
            address_type: fields[4].to_owned(),
            unicast_address: fields[5].to_owned(),
        })
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {} {} {}",
            self.username,
            self.session_id,
            self.session_version,
            self.network_type,
            self.address_type,
            self.unicast_address,
        )
    }
}

/// Timing defines the "t=" field's structured representation for the start and
/// stop times.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    pub start_time: u64,
    pub stop_time: u64,
}

impl Timing {
    fn unmarshal(value: &str) -> Result<Self> {
        let fields: Vec<&str> = value.split_whitespace().collect();
        if fields.len() != 2 {
            return Err(Error::ErrSdpInvalidSyntax(format!("t={value}")));
        }
        Ok(Timing {
            start_time: fields[0]
                .parse()
                .map_err(|_| Error::ErrSdpInvalidValue(format!("start time {}", fields[0])))?,
            stop_time: fields[1]
                .parse()
                .map_err(|_| Error::ErrSdpInvalidValue(format!("stop time {}", fields[1])))?,
        })
    }
}

impl fmt::Display for Timing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.start_time, self.stop_time)
    }
}

/// SessionDescription is the structured form of an SDP document.
///
/// Only the subset of the grammar used for WebRTC negotiation is modelled;
/// lines and attributes outside it are skipped when parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionDescription {
    /// v=0
    pub version: u32,
    /// o=<username> <sess-id> <sess-version> <nettype> <addrtype> <unicast-address>
    pub origin: Origin,
    /// s=<session name>
    pub session_name: String,
    /// t=<start-time> <stop-time>
    pub timing: Timing,
    /// a=msid-semantic present; ssrc and msid lines are interpreted only when set
    pub msid_semantic: bool,
    pub media_descriptions: Vec<MediaDescription>,
}

impl Default for SessionDescription {
    fn default() -> Self {
        SessionDescription {
            version: 0,
            origin: Origin::default(),
            session_name: "-".to_owned(),
            timing: Timing::default(),
            msid_semantic: false,
            media_descriptions: vec![],
        }
    }
}

impl SessionDescription {
    /// Parses an SDP document. Both CRLF and bare LF line endings are
    /// accepted.
    pub fn unmarshal(raw: &str) -> Result<Self> {
        if raw.trim().is_empty() {
            return Err(Error::ErrSdpEmpty);
        }

        let mut version = None;
        let mut origin = None;
        let mut session_name = None;
        let mut timing = None;
        let mut msid_semantic = false;
        let mut fallback = SessionFallback::default();
        let mut drafts: Vec<MediaDraft> = vec![];

        for line in raw.lines() {
            let line = line.strip_suffix('\r').unwrap_or(line);
            if line.trim().is_empty() {
                continue;
            }

            let (typ, value) = line
                .split_once('=')
                .ok_or_else(|| Error::ErrSdpInvalidSyntax(line.to_owned()))?;
            if typ.len() != 1 {
                return Err(Error::ErrSdpInvalidSyntax(line.to_owned()));
            }

            if typ == "m" {
                drafts.push(MediaDraft::from_media_line(value)?);
                continue;
            }

            match (typ, drafts.last_mut()) {
                ("v", _) => {
                    version = Some(value.trim().parse::<u32>().map_err(|_| {
                        Error::ErrSdpInvalidValue(format!("version {value}"))
                    })?);
                }
                ("o", _) => origin = Some(Origin::unmarshal(value)?),
                ("s", _) => session_name = Some(value.to_owned()),
                ("t", _) => timing = Some(Timing::unmarshal(value)?),
                ("c", Some(draft)) => draft.set_connection(value)?,
                ("c", None) => {
                    fallback.connection = Some(ConnectionInformation::unmarshal(value)?)
                }
                ("a", draft) => {
                    let (key, value) = match value.split_once(':') {
                        Some((key, value)) => (key, Some(value)),
                        None => (value, None),
                    };
                    match draft {
                        Some(draft) => draft.apply_attribute(key, value)?,
                        None if key == ATTR_KEY_MSID_SEMANTIC => msid_semantic = true,
                        None => {
                            if !fallback.apply_attribute(key, value)? {
                                trace!("ignoring session attribute {key}");
                            }
                        }
                    }
                }
                _ => trace!("ignoring line {typ}="),
            }
        }

        let version = version.ok_or(Error::ErrSdpMissingLine("v"))?;
        let origin = origin.ok_or(Error::ErrSdpMissingLine("o"))?;
        let session_name = session_name.ok_or(Error::ErrSdpMissingLine("s"))?;
        let timing = timing.ok_or(Error::ErrSdpMissingLine("t"))?;

        let media_descriptions = drafts
            .into_iter()
            .map(|draft| draft.finish(&fallback, msid_semantic))
            .collect::<Result<Vec<_>>>()?;

        Ok(SessionDescription {
            version,
            origin,
            session_name,
            timing,
            msid_semantic,
            media_descriptions,
        })
    }

    /// Generates the SDP text, CRLF terminated.
    pub fn marshal(&self) -> String {
        self.to_string()
    }

    /// Reports whether any media block carries stream or track identifiers,
    /// which is what decides whether `a=msid-semantic` is generated.
    pub fn has_stream_ids(&self) -> bool {
        self.media_descriptions
            .iter()
            .any(MediaDescription::has_stream_ids)
    }
}

impl fmt::Display for SessionDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v={}{END_LINE}", self.version)?;
        write!(f, "o={}{END_LINE}", self.origin)?;
        write!(f, "s={}{END_LINE}", self.session_name)?;
        write!(f, "t={}{END_LINE}", self.timing)?;
        if self.has_stream_ids() {
            write!(f, "a={ATTR_KEY_MSID_SEMANTIC}: {MSID_SEMANTIC_WMS}{END_LINE}")?;
        }
        for media in &self.media_descriptions {
            write!(f, "{media}")?;
        }
        Ok(())
    }
}
