//! DHCP option area: magic cookie, TLV options and the END marker.

use crate::error::{Error, Result};
use crate::MessageType;
use serde::Serialize;
use std::net::Ipv4Addr;
use tracing::trace;

/// DHCP magic cookie (RFC 2131 section 3)
pub const MAGIC_COOKIE: [u8; 4] = [99, 130, 83, 99];

/// Largest value a single length byte can describe
pub const MAX_OPTION_LEN: usize = u8::MAX as usize;

/// Option codes from RFC 2132
pub mod code {
    pub const PAD: u8 = 0;
    pub const SUBNET_MASK: u8 = 1;
    pub const ROUTER: u8 = 3;
    pub const DNS_SERVER: u8 = 6;
    pub const HOSTNAME: u8 = 12;
    pub const DOMAIN_NAME: u8 = 15;
    pub const REQUESTED_IP_ADDRESS: u8 = 50;
    pub const LEASE_TIME: u8 = 51;
    pub const OVERLOAD: u8 = 52;
    pub const MESSAGE_TYPE: u8 = 53;
    pub const SERVER_IDENTIFIER: u8 = 54;
    pub const PARAMETER_REQUEST_LIST: u8 = 55;
    pub const MESSAGE: u8 = 56;
    pub const MAX_MESSAGE_SIZE: u8 = 57;
    pub const RENEWAL_TIME: u8 = 58;
    pub const REBINDING_TIME: u8 = 59;
    pub const CLIENT_IDENTIFIER: u8 = 61;
    pub const END: u8 = 255;
}

/// A single option as it appears on the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DhcpOption {
    pub code: u8,
    pub value: Vec<u8>,
}

impl DhcpOption {
    pub fn new(code: u8, value: impl Into<Vec<u8>>) -> Result<Self> {
        let value = value.into();
        if value.len() > MAX_OPTION_LEN {
            return Err(Error::OptionValueTooLong {
                code,
                len: value.len(),
            });
        }
        Ok(Self { code, value })
    }

    /// PAD and END carry no length or value
    pub fn is_structural(&self) -> bool {
        self.code == code::PAD || self.code == code::END
    }
}

/// Serialize the option area: cookie, options in order, then END.
pub fn encode_options(options: &[DhcpOption]) -> Result<Vec<u8>> {
    let mut bytes = Vec::with_capacity(
        MAGIC_COOKIE.len() + options.iter().map(|o| o.value.len() + 2).sum::<usize>() + 1,
    );
    bytes.extend_from_slice(&MAGIC_COOKIE);

    for option in options {
        if option.is_structural() {
            bytes.push(option.code);
            continue;
        }
        let len = u8::try_from(option.value.len()).map_err(|_| Error::OptionValueTooLong {
            code: option.code,
            len: option.value.len(),
        })?;
        bytes.push(option.code);
        bytes.push(len);
        bytes.extend_from_slice(&option.value);
    }

    if options.last().map(|o| o.code) != Some(code::END) {
        bytes.push(code::END);
    }

    Ok(bytes)
}

/// Parse the option area that follows the fixed header.
///
/// PAD bytes are skipped. Parsing stops at END or at the end of the buffer,
/// whichever comes first; a missing END is accepted.
pub fn decode_options(data: &[u8]) -> Result<Vec<DhcpOption>> {
    if data.get(..MAGIC_COOKIE.len()) != Some(&MAGIC_COOKIE[..]) {
        return Err(Error::MissingMagicCookie);
    }

    let mut options = Vec::new();
    let mut i = MAGIC_COOKIE.len();

    while let Some(&option_code) = data.get(i) {
        match option_code {
            code::END => {
                if i + 1 < data.len() {
                    trace!("Ignoring {} bytes after END option", data.len() - i - 1);
                }
                return Ok(options);
            }
            code::PAD => {
                i += 1;
                continue;
            }
            _ => {}
        }

        let truncated = Error::TruncatedOption {
            code: option_code,
            offset: i,
        };
        let len = usize::from(*data.get(i + 1).ok_or(truncated.clone())?);
        let value = data.get(i + 2..i + 2 + len).ok_or(truncated)?;

        options.push(DhcpOption {
            code: option_code,
            value: value.to_vec(),
        });
        i += 2 + len;
    }

    trace!("Option area ended without END option");
    Ok(options)
}

/// Typed view of the common RFC 2132 options
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    SubnetMask(Ipv4Addr),
    Router(Vec<Ipv4Addr>),
    DnsServer(Vec<Ipv4Addr>),
    Hostname(String),
    DomainName(String),
    RequestedIpAddress(Ipv4Addr),
    LeaseTime(u32),
    Overload(u8),
    MessageType(MessageType),
    ServerIdentifier(Ipv4Addr),
    ParameterRequestList(Vec<u8>),
    Message(String),
    MaxMessageSize(u16),
    RenewalTime(u32),
    RebindingTime(u32),
    ClientIdentifier(Vec<u8>),
    Unknown(u8, Vec<u8>),
}

fn ipv4(data: &[u8]) -> Option<Ipv4Addr> {
    let octets: [u8; 4] = data.try_into().ok()?;
    Some(Ipv4Addr::from(octets))
}

fn ipv4_list(data: &[u8]) -> Option<Vec<Ipv4Addr>> {
    if data.is_empty() || data.len() % 4 != 0 {
        return None;
    }
    Some(data.chunks_exact(4).filter_map(ipv4).collect())
}

fn be_u32(data: &[u8]) -> Option<u32> {
    Some(u32::from_be_bytes(data.try_into().ok()?))
}

fn text(data: &[u8]) -> String {
    String::from_utf8_lossy(data).into_owned()
}

impl OptionValue {
    /// Interpret a wire option. Payloads with the wrong shape become `Unknown`.
    pub fn parse(option: &DhcpOption) -> Self {
        let data = option.value.as_slice();
        let parsed = match option.code {
            code::SUBNET_MASK => ipv4(data).map(Self::SubnetMask),
            code::ROUTER => ipv4_list(data).map(Self::Router),
            code::DNS_SERVER => ipv4_list(data).map(Self::DnsServer),
            code::HOSTNAME => Some(Self::Hostname(text(data))),
            code::DOMAIN_NAME => Some(Self::DomainName(text(data))),
            code::REQUESTED_IP_ADDRESS => ipv4(data).map(Self::RequestedIpAddress),
            code::LEASE_TIME => be_u32(data).map(Self::LeaseTime),
            code::OVERLOAD => match data {
                [flag @ 1..=3] => Some(Self::Overload(*flag)),
                _ => None,
            },
            code::MESSAGE_TYPE => match data {
                [value] => MessageType::from_u8(*value).map(Self::MessageType),
                _ => None,
            },
            code::SERVER_IDENTIFIER => ipv4(data).map(Self::ServerIdentifier),
            code::PARAMETER_REQUEST_LIST => Some(Self::ParameterRequestList(data.to_vec())),
            code::MESSAGE => Some(Self::Message(text(data))),
            code::MAX_MESSAGE_SIZE => <[u8; 2]>::try_from(data)
                .ok()
                .map(|b| Self::MaxMessageSize(u16::from_be_bytes(b))),
            code::RENEWAL_TIME => be_u32(data).map(Self::RenewalTime),
            code::REBINDING_TIME => be_u32(data).map(Self::RebindingTime),
            code::CLIENT_IDENTIFIER if !data.is_empty() => {
                Some(Self::ClientIdentifier(data.to_vec()))
            }
            _ => None,
        };
        parsed.unwrap_or_else(|| Self::Unknown(option.code, data.to_vec()))
    }

    pub fn code(&self) -> u8 {
        match self {
            Self::SubnetMask(_) => code::SUBNET_MASK,
            Self::Router(_) => code::ROUTER,
            Self::DnsServer(_) => code::DNS_SERVER,
            Self::Hostname(_) => code::HOSTNAME,
            Self::DomainName(_) => code::DOMAIN_NAME,
            Self::RequestedIpAddress(_) => code::REQUESTED_IP_ADDRESS,
            Self::LeaseTime(_) => code::LEASE_TIME,
            Self::Overload(_) => code::OVERLOAD,
            Self::MessageType(_) => code::MESSAGE_TYPE,
            Self::ServerIdentifier(_) => code::SERVER_IDENTIFIER,
            Self::ParameterRequestList(_) => code::PARAMETER_REQUEST_LIST,
            Self::Message(_) => code::MESSAGE,
            Self::MaxMessageSize(_) => code::MAX_MESSAGE_SIZE,
            Self::RenewalTime(_) => code::RENEWAL_TIME,
            Self::RebindingTime(_) => code::REBINDING_TIME,
            Self::ClientIdentifier(_) => code::CLIENT_IDENTIFIER,
            Self::Unknown(code, _) => *code,
        }
    }

    /// Build the wire option; fails if the payload exceeds 255 bytes
    pub fn to_option(&self) -> Result<DhcpOption> {
        let value = match self {
            Self::SubnetMask(addr)
            | Self::RequestedIpAddress(addr)
            | Self::ServerIdentifier(addr) => addr.octets().to_vec(),
            Self::Router(addrs) | Self::DnsServer(addrs) => {
                addrs.iter().flat_map(|addr| addr.octets()).collect()
            }
            Self::Hostname(name) | Self::DomainName(name) | Self::Message(name) => {
                name.as_bytes().to_vec()
            }
            Self::LeaseTime(time) | Self::RenewalTime(time) | Self::RebindingTime(time) => {
                time.to_be_bytes().to_vec()
            }
            Self::Overload(flag) => vec![*flag],
            Self::MessageType(mt) => vec![mt.to_u8()],
            Self::MaxMessageSize(size) => size.to_be_bytes().to_vec(),
            Self::ParameterRequestList(data)
            | Self::ClientIdentifier(data)
            | Self::Unknown(_, data) => data.clone(),
        };
        DhcpOption::new(self.code(), value)
    }
}
