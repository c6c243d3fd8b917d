#![warn(rust_2018_idioms)]
#![allow(dead_code)]

pub mod description;
pub mod util;

pub use description::common::{ConnectionInformation, ConnectionRole, Direction, Fingerprint};
pub use description::media::{MediaDescription, PayloadFormat, RtcpAttribute, SctpMap, SsrcDescription};
pub use description::session::{Origin, SessionDescription, Timing};
pub use util::FmtpParameters;
