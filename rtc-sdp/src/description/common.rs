use std::fmt;

use shared::error::{Error, Result};

pub const DEFAULT_NETWORK_TYPE: &str = "IN";
pub const DEFAULT_ADDRESS_TYPE: &str = "IP4";
pub const DEFAULT_ADDRESS: &str = "0.0.0.0";

/// ConnectionInformation defines the representation for the "c=" field
/// containing connection data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionInformation {
    pub network_type: String,
    pub address_type: String,
    pub address: String,
}

impl Default for ConnectionInformation {
    fn default() -> Self {
        ConnectionInformation {
            network_type: DEFAULT_NETWORK_TYPE.to_owned(),
            address_type: DEFAULT_ADDRESS_TYPE.to_owned(),
            address: DEFAULT_ADDRESS.to_owned(),
        }
    }
}

impl ConnectionInformation {
    /// Builds the connection line for a transport address, picking the
    /// address type from its shape.
    pub fn for_address(address: &str) -> Self {
        ConnectionInformation {
            network_type: DEFAULT_NETWORK_TYPE.to_owned(),
            address_type: if address.contains(':') { "IP6" } else { "IP4" }.to_owned(),
            address: address.to_owned(),
        }
    }

    pub(crate) fn unmarshal(value: &str) -> Result<Self> {
        let fields: Vec<&str> = value.split_whitespace().collect();
        if fields.len() < 3 {
            return Err(Error::ErrSdpInvalidSyntax(format!("c={value}")));
        }
        Ok(ConnectionInformation {
            network_type: fields[0].to_owned(),
            address_type: fields[1].to_owned(),
            address: fields[2].to_owned(),
        })
    }
}

impl fmt::Display for ConnectionInformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {}",
            self.network_type, self.address_type, self.address
        )
    }
}

/// Direction is a marker for transmission direction of an endpoint.
#[derive(Default, Debug, PartialEq, Eq, Clone, Copy)]
pub enum Direction {
    #[default]
    SendRecv,
    SendOnly,
    RecvOnly,
    Inactive,
}

const DIRECTION_SEND_RECV_STR: &str = "sendrecv";
const DIRECTION_SEND_ONLY_STR: &str = "sendonly";
const DIRECTION_RECV_ONLY_STR: &str = "recvonly";
const DIRECTION_INACTIVE_STR: &str = "inactive";

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Direction::SendRecv => DIRECTION_SEND_RECV_STR,
            Direction::SendOnly => DIRECTION_SEND_ONLY_STR,
            Direction::RecvOnly => DIRECTION_RECV_ONLY_STR,
            Direction::Inactive => DIRECTION_INACTIVE_STR,
        };
        write!(f, "{s}")
    }
}

impl Direction {
    /// Returns the direction named by an attribute key, if the key is one.
    pub fn from_attribute(key: &str) -> Option<Self> {
        match key {
            DIRECTION_SEND_RECV_STR => Some(Direction::SendRecv),
            DIRECTION_SEND_ONLY_STR => Some(Direction::SendOnly),
            DIRECTION_RECV_ONLY_STR => Some(Direction::RecvOnly),
            DIRECTION_INACTIVE_STR => Some(Direction::Inactive),
            _ => None,
        }
    }
}

/// DTLS certificate fingerprint carried by `a=fingerprint`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fingerprint {
    pub hash_function: String,
    pub value: String,
}

impl Fingerprint {
    pub(crate) fn unmarshal(value: &str) -> Result<Self> {
        let (hash_function, fingerprint) = value
            .trim()
            .split_once(' ')
            .ok_or_else(|| Error::ErrSdpInvalidValue(format!("fingerprint {value}")))?;
        Ok(Fingerprint {
            hash_function: hash_function.to_owned(),
            value: fingerprint.trim().to_owned(),
        })
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.hash_function, self.value)
    }
}

/// DTLS connection role carried by `a=setup`.
#[derive(Debug, PartialEq, Eq, Copy, Clone)]
pub enum ConnectionRole {
    Active,
    Passive,
    Actpass,
    Holdconn,
}

const CONNECTION_ROLE_ACTIVE_STR: &str = "active";
const CONNECTION_ROLE_PASSIVE_STR: &str = "passive";
const CONNECTION_ROLE_ACTPASS_STR: &str = "actpass";
const CONNECTION_ROLE_HOLDCONN_STR: &str = "holdconn";

impl fmt::Display for ConnectionRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConnectionRole::Active => CONNECTION_ROLE_ACTIVE_STR,
            ConnectionRole::Passive => CONNECTION_ROLE_PASSIVE_STR,
            ConnectionRole::Actpass => CONNECTION_ROLE_ACTPASS_STR,
            ConnectionRole::Holdconn => CONNECTION_ROLE_HOLDCONN_STR,
        };
        write!(f, "{s}")
    }
}

impl TryFrom<&str> for ConnectionRole {
    type Error = Error;

    fn try_from(raw: &str) -> Result<Self> {
        match raw {
            CONNECTION_ROLE_ACTIVE_STR => Ok(ConnectionRole::Active),
            CONNECTION_ROLE_PASSIVE_STR => Ok(ConnectionRole::Passive),
            CONNECTION_ROLE_ACTPASS_STR => Ok(ConnectionRole::Actpass),
            CONNECTION_ROLE_HOLDCONN_STR => Ok(ConnectionRole::Holdconn),
            _ => Err(Error::ErrSdpInvalidValue(format!("setup {raw}"))),
        }
    }
}
