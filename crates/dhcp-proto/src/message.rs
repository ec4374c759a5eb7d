use crate::error::{Error, Result};
use crate::header::{Header, OpCode, HEADER_LEN};
use crate::option::{code, decode_options, encode_options, DhcpOption, OptionValue};
use crate::{MacAddress, MessageType};
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::net::Ipv4Addr;
use tracing::debug;

/// How repeated option codes are resolved on lookup
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicatePolicy {
    /// The last occurrence overrides earlier ones
    #[default]
    LastWins,
    FirstWins,
    /// Join every occurrence in wire order (RFC 3396 long options)
    Concatenate,
}

/// A complete DHCP/BOOTP message: fixed header plus ordered options
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub header: Header,
    options: Vec<DhcpOption>,
}

impl Message {
    pub fn new(header: Header) -> Self {
        Self {
            header,
            options: Vec::new(),
        }
    }

    /// Parse a received datagram. Nothing is returned unless the whole buffer is valid.
    pub fn decode(data: &[u8]) -> Result<Self> {
        let header = Header::decode(data)?;
        let options = decode_options(&data[HEADER_LEN..])?;

        debug!(
            xid = header.xid,
            options = options.len(),
            "Decoded {} byte DHCP message",
            data.len()
        );

        Ok(Self { header, options })
    }

    pub fn encode(&self) -> Result<Vec<u8>> {
        self.header.validate()?;
        let options = encode_options(&self.options)?;
        let mut bytes = Vec::with_capacity(HEADER_LEN + options.len());
        bytes.extend_from_slice(&self.header.encode());
        bytes.extend_from_slice(&options);
        Ok(bytes)
    }

    pub fn options(&self) -> &[DhcpOption] {
        &self.options
    }

    /// Append a data option; PAD and END are rejected
    pub fn push_option(&mut self, option: DhcpOption) -> Result<()> {
        if option.is_structural() {
            return Err(Error::ReservedOptionCode(option.code));
        }
        if option.value.len() > crate::option::MAX_OPTION_LEN {
            return Err(Error::OptionValueTooLong {
                code: option.code,
                len: option.value.len(),
            });
        }
        self.options.push(option);
        Ok(())
    }

    pub fn push_value(&mut self, value: OptionValue) -> Result<()> {
        self.push_option(value.to_option()?)
    }

    pub fn with_option(mut self, code: u8, value: impl Into<Vec<u8>>) -> Result<Self> {
        self.push_option(DhcpOption::new(code, value)?)?;
        Ok(self)
    }

    pub fn with_message_type(mut self, message_type: MessageType) -> Self {
        self.options.push(DhcpOption {
            code: code::MESSAGE_TYPE,
            value: vec![message_type.to_u8()],
        });
        self
    }

    /// DHCP message type from option 53, or `None` for plain BOOTP
    /// and unrecognised values
    pub fn classify(&self) -> Option<MessageType> {
        match self.lookup(code::MESSAGE_TYPE)? {
            [value] => MessageType::from_u8(*value),
            _ => None,
        }
    }

    /// Value of the last option with this code
    pub fn lookup(&self, code: u8) -> Option<&[u8]> {
        self.options
            .iter()
            .rev()
            .find(|o| o.code == code)
            .map(|o| o.value.as_slice())
    }

    pub fn lookup_with(&self, code: u8, policy: DuplicatePolicy) -> Option<Cow<'_, [u8]>> {
        match policy {
            DuplicatePolicy::LastWins => self.lookup(code).map(Cow::Borrowed),
            DuplicatePolicy::FirstWins => self
                .options
                .iter()
                .find(|o| o.code == code)
                .map(|o| Cow::Borrowed(o.value.as_slice())),
            DuplicatePolicy::Concatenate => {
                let mut matches = self.options.iter().filter(|o| o.code == code).peekable();
                let first = matches.next()?;
                if matches.peek().is_none() {
                    return Some(Cow::Borrowed(first.value.as_slice()));
                }
                let mut joined = first.value.clone();
                for option in matches {
                    joined.extend_from_slice(&option.value);
                }
                Some(Cow::Owned(joined))
            }
        }
    }

    /// Typed view of the last option with this code
    pub fn lookup_value(&self, code: u8) -> Option<OptionValue> {
        self.options
            .iter()
            .rev()
            .find(|o| o.code == code)
            .map(OptionValue::parse)
    }

    pub fn requested_ip(&self) -> Option<Ipv4Addr> {
        match self.lookup_value(code::REQUESTED_IP_ADDRESS)? {
            OptionValue::RequestedIpAddress(ip) => Some(ip),
            _ => None,
        }
    }

    pub fn server_identifier(&self) -> Option<Ipv4Addr> {
        match self.lookup_value(code::SERVER_IDENTIFIER)? {
            OptionValue::ServerIdentifier(ip) => Some(ip),
            _ => None,
        }
    }

    pub fn lease_time(&self) -> Option<u32> {
        match self.lookup_value(code::LEASE_TIME)? {
            OptionValue::LeaseTime(secs) => Some(secs),
            _ => None,
        }
    }

    pub fn parameter_request_list(&self) -> Option<&[u8]> {
        self.lookup(code::PARAMETER_REQUEST_LIST)
    }

    /// Client DISCOVER broadcast for the given MAC
    pub fn discover(xid: u32, mac: MacAddress) -> Self {
        Self::new(Self::client_header(xid, mac)).with_message_type(MessageType::Discover)
    }

    /// Client REQUEST for a previously offered address
    pub fn request(xid: u32, mac: MacAddress, requested_ip: Ipv4Addr) -> Self {
        let mut message =
            Self::new(Self::client_header(xid, mac)).with_message_type(MessageType::Request);
        message.options.push(DhcpOption {
            code: code::REQUESTED_IP_ADDRESS,
            value: requested_ip.octets().to_vec(),
        });
        message
    }

    fn client_header(xid: u32, mac: MacAddress) -> Header {
        let mut header = Header::new(OpCode::BootRequest);
        header.xid = xid;
        header.chaddr[..6].copy_from_slice(mac.as_bytes());
        header.set_broadcast(true);
        header
    }

    /// Server reply skeleton echoing the request's transaction fields
    pub fn reply(request: &Message, message_type: MessageType) -> Self {
        let mut header = Header::new(OpCode::BootReply);
        header.htype = request.header.htype;
        header.xid = request.header.xid;
        header.flags = request.header.flags;
        header.giaddr = request.header.giaddr;
        let hardware = request.header.hardware_address();
        header.chaddr[..hardware.len()].copy_from_slice(hardware);
        header.hlen = hardware.len() as u8;

        Self::new(header).with_message_type(message_type)
    }
}
