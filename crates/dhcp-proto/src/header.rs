//! Fixed 236-byte BOOTP header (RFC 2131 section 2).
//!
//! ```text
//! 0                   1                   2                   3
//! 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1 2 3 4 5 6 7 8 9 0 1
//! +---------------+---------------+---------------+---------------+
//! |     op (1)    |   htype (1)   |   hlen (1)    |   hops (1)    |
//! +---------------+---------------+---------------+---------------+
//! |                            xid (4)                            |
//! +-------------------------------+-------------------------------+
//! |           secs (2)            |           flags (2)           |
//! +-------------------------------+-------------------------------+
//! |                ciaddr / yiaddr / siaddr / giaddr (4 each)     |
//! +---------------------------------------------------------------+
//! |                          chaddr (16)                          |
//! +---------------------------------------------------------------+
//! |                          sname (64)                           |
//! +---------------------------------------------------------------+
//! |                          file (128)                           |
//! +---------------------------------------------------------------+
//! ```

use crate::error::{Error, Result};
use crate::MacAddress;
use serde::{Serialize, Serializer};
use std::borrow::Cow;
use std::fmt;
use std::net::Ipv4Addr;

/// Size of the fixed header on the wire
pub const HEADER_LEN: usize = 236;

/// Capacity of the `chaddr` block
pub const CHADDR_LEN: usize = 16;
pub const SNAME_LEN: usize = 64;
pub const FILE_LEN: usize = 128;

/// Hardware type for Ethernet
pub const HTYPE_ETHERNET: u8 = 1;

/// Broadcast bit of the `flags` field (leftmost bit on the wire).
/// The other 15 bits are reserved and always zero on the wire.
pub const BROADCAST_FLAG: u16 = 0x8000;

const CHADDR_OFFSET: usize = 28;
const SNAME_OFFSET: usize = CHADDR_OFFSET + CHADDR_LEN;
const FILE_OFFSET: usize = SNAME_OFFSET + SNAME_LEN;

/// BOOTP operation code
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum OpCode {
    BootRequest,
    BootReply,
    /// Values other than 1 and 2 are kept so they survive a round-trip
    Unknown(u8),
}

impl OpCode {
    pub fn to_u8(self) -> u8 {
        match self {
            Self::BootRequest => 1,
            Self::BootReply => 2,
            Self::Unknown(value) => value,
        }
    }
}

impl From<u8> for OpCode {
    fn from(value: u8) -> Self {
        match value {
            1 => Self::BootRequest,
            2 => Self::BootReply,
            other => Self::Unknown(other),
        }
    }
}

/// NUL-padded string stored in an `N`-byte header block.
///
/// Holds at most `N - 1` bytes so the terminator always fits, and never
/// contains a NUL itself.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct PaddedString<const N: usize> {
    bytes: Vec<u8>,
}

impl<const N: usize> PaddedString<N> {
    pub fn new(value: &str) -> Result<Self> {
        Self::from_bytes(value.as_bytes())
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() > N - 1 {
            return Err(Error::FieldTooLong {
                max: N - 1,
                len: bytes.len(),
            });
        }
        if bytes.contains(&0) {
            return Err(Error::InvalidString);
        }
        Ok(Self {
            bytes: bytes.to_vec(),
        })
    }

    /// Read a block, stopping at the first NUL or at the terminator slot
    fn decode(block: &[u8]) -> Self {
        let usable = &block[..block.len().min(N - 1)];
        let end = usable.iter().position(|&b| b == 0).unwrap_or(usable.len());
        Self {
            bytes: usable[..end].to_vec(),
        }
    }

    fn encode_into(&self, block: &mut [u8]) {
        block[..self.bytes.len()].copy_from_slice(&self.bytes);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn to_string_lossy(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}

impl<const N: usize> fmt::Display for PaddedString<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_string_lossy())
    }
}

impl<const N: usize> Serialize for PaddedString<N> {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string_lossy())
    }
}

/// Server host name block
pub type ServerName = PaddedString<SNAME_LEN>;

/// Boot file name block
pub type BootFile = PaddedString<FILE_LEN>;

/// BOOTP/DHCP fixed header
///
/// `hlen` and `chaddr` are public for reading; [`Header::set_chaddr`] is the
/// checked way to set them. [`Header::validate`] rejects an `hlen` above 16
/// before a message is encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Header {
    pub op: OpCode,
    pub htype: u8,
    pub hlen: u8,
    pub hops: u8,
    pub xid: u32,
    pub secs: u16,
    pub flags: u16,
    pub ciaddr: Ipv4Addr,
    pub yiaddr: Ipv4Addr,
    pub siaddr: Ipv4Addr,
    pub giaddr: Ipv4Addr,
    pub chaddr: [u8; CHADDR_LEN],
    pub sname: ServerName,
    pub file: BootFile,
}

impl Header {
    /// Empty Ethernet header with the given op code
    pub fn new(op: OpCode) -> Self {
        Self {
            op,
            htype: HTYPE_ETHERNET,
            hlen: 6,
            hops: 0,
            xid: 0,
            secs: 0,
            flags: 0,
            ciaddr: Ipv4Addr::UNSPECIFIED,
            yiaddr: Ipv4Addr::UNSPECIFIED,
            siaddr: Ipv4Addr::UNSPECIFIED,
            giaddr: Ipv4Addr::UNSPECIFIED,
            chaddr: [0; CHADDR_LEN],
            sname: ServerName::default(),
            file: BootFile::default(),
        }
    }

    /// Parse the first 236 bytes of `data`
    pub fn decode(data: &[u8]) -> Result<Self> {
        let data: &[u8; HEADER_LEN] = data
            .get(..HEADER_LEN)
            .and_then(|block| block.try_into().ok())
            .ok_or(Error::TruncatedHeader { len: data.len() })?;

        // bytes past hlen are padding
        let hlen = usize::from(data[2]).min(CHADDR_LEN);
        let mut chaddr = [0u8; CHADDR_LEN];
        chaddr[..hlen].copy_from_slice(&data[CHADDR_OFFSET..CHADDR_OFFSET + hlen]);

        Ok(Self {
            op: OpCode::from(data[0]),
            htype: data[1],
            hlen: data[2],
            hops: data[3],
            xid: u32::from_be_bytes([data[4], data[5], data[6], data[7]]),
            secs: u16::from_be_bytes([data[8], data[9]]),
            flags: u16::from_be_bytes([data[10], data[11]]) & BROADCAST_FLAG,
            ciaddr: Ipv4Addr::new(data[12], data[13], data[14], data[15]),
            yiaddr: Ipv4Addr::new(data[16], data[17], data[18], data[19]),
            siaddr: Ipv4Addr::new(data[20], data[21], data[22], data[23]),
            giaddr: Ipv4Addr::new(data[24], data[25], data[26], data[27]),
            chaddr,
            sname: ServerName::decode(&data[SNAME_OFFSET..FILE_OFFSET]),
            file: BootFile::decode(&data[FILE_OFFSET..HEADER_LEN]),
        })
    }

    pub fn encode(&self) -> [u8; HEADER_LEN] {
        let mut bytes = [0u8; HEADER_LEN];

        bytes[0] = self.op.to_u8();
        bytes[1] = self.htype;
        bytes[2] = self.hlen;
        bytes[3] = self.hops;

        bytes[4..8].copy_from_slice(&self.xid.to_be_bytes());
        bytes[8..10].copy_from_slice(&self.secs.to_be_bytes());
        bytes[10..12].copy_from_slice(&(self.flags & BROADCAST_FLAG).to_be_bytes());

        bytes[12..16].copy_from_slice(&self.ciaddr.octets());
        bytes[16..20].copy_from_slice(&self.yiaddr.octets());
        bytes[20..24].copy_from_slice(&self.siaddr.octets());
        bytes[24..28].copy_from_slice(&self.giaddr.octets());

        let hardware = self.hardware_address();
        bytes[CHADDR_OFFSET..CHADDR_OFFSET + hardware.len()].copy_from_slice(hardware);
        self.sname.encode_into(&mut bytes[SNAME_OFFSET..FILE_OFFSET]);
        self.file.encode_into(&mut bytes[FILE_OFFSET..HEADER_LEN]);

        bytes
    }

    /// Check the fields that plain assignment can put out of range
    pub fn validate(&self) -> Result<()> {
        if usize::from(self.hlen) > CHADDR_LEN {
            return Err(Error::FieldTooLong {
                max: CHADDR_LEN,
                len: usize::from(self.hlen),
            });
        }
        Ok(())
    }

    /// Store a hardware address, updating `hlen` and zeroing the rest of `chaddr`
    pub fn set_chaddr(&mut self, address: &[u8]) -> Result<()> {
        if address.len() > CHADDR_LEN {
            return Err(Error::FieldTooLong {
                max: CHADDR_LEN,
                len: address.len(),
            });
        }
        self.chaddr = [0; CHADDR_LEN];
        self.chaddr[..address.len()].copy_from_slice(address);
        self.hlen = address.len() as u8;
        Ok(())
    }

    /// The meaningful `hlen` bytes of `chaddr`
    pub fn hardware_address(&self) -> &[u8] {
        &self.chaddr[..usize::from(self.hlen).min(CHADDR_LEN)]
    }

    /// Client MAC, for Ethernet headers only
    pub fn client_mac(&self) -> Option<MacAddress> {
        if self.htype != HTYPE_ETHERNET || self.hlen != 6 {
            return None;
        }
        MacAddress::from_slice(&self.chaddr)
    }

    pub fn is_broadcast(&self) -> bool {
        self.flags & BROADCAST_FLAG != 0
    }

    pub fn set_broadcast(&mut self, broadcast: bool) {
        if broadcast {
            self.flags |= BROADCAST_FLAG;
        } else {
            self.flags &= !BROADCAST_FLAG;
        }
    }
}

impl Default for Header {
    fn default() -> Self {
        Self::new(OpCode::BootRequest)
    }
}
