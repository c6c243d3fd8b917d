use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of ICE helper server handed to the media engine.
#[derive(Default, Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HelperServerType {
    #[default]
    Stun,
    TurnUdp,
    TurnTcp,
    TurnTls,
}

impl HelperServerType {
    pub fn is_turn(self) -> bool {
        !matches!(self, HelperServerType::Stun)
    }
}

impl fmt::Display for HelperServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            HelperServerType::Stun => "STUN",
            HelperServerType::TurnUdp => "TURN_UDP",
            HelperServerType::TurnTcp => "TURN_TCP",
            HelperServerType::TurnTls => "TURN_TLS",
        };
        write!(f, "{s}")
    }
}

/// A STUN or TURN server the media engine may use while gathering candidates.
#[derive(Default, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HelperServer {
    pub server_type: HelperServerType,
    pub address: String,
    pub port: u16,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

impl HelperServer {
    pub fn stun(address: &str, port: u16) -> Self {
        HelperServer {
            server_type: HelperServerType::Stun,
            address: address.to_owned(),
            port,
            ..Default::default()
        }
    }

    pub fn turn(
        server_type: HelperServerType,
        address: &str,
        port: u16,
        username: &str,
        password: &str,
    ) -> Self {
        HelperServer {
            server_type,
            address: address.to_owned(),
            port,
            username: username.to_owned(),
            password: password.to_owned(),
        }
    }

    /// Returns the server as a `stun:`/`turn:`/`turns:` URI.
    pub fn url(&self) -> String {
        match self.server_type {
            HelperServerType::Stun => format!("stun:{}:{}", self.address, self.port),
            HelperServerType::TurnUdp => {
                format!("turn:{}:{}?transport=udp", self.address, self.port)
            }
            HelperServerType::TurnTcp => {
                format!("turn:{}:{}?transport=tcp", self.address, self.port)
            }
            HelperServerType::TurnTls => {
                format!("turns:{}:{}?transport=tcp", self.address, self.port)
            }
        }
    }
}
