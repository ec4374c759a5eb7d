//! DHCP/BOOTP message codec (RFC 2131 layout, RFC 2132 options)
//!
//! Converts between [`Message`] values and their exact wire bytes. Decoding
//! never trusts its input: short, malformed or hostile buffers produce an
//! [`Error`] instead of a panic. The crate performs no I/O and keeps no state,
//! so it can be used from any number of threads or tasks at once.

pub mod error;
pub mod header;
pub mod mac;
pub mod message;
pub mod message_type;
pub mod option;

pub use error::{Error, Result};
pub use header::{BootFile, Header, OpCode, PaddedString, ServerName, HEADER_LEN};
pub use mac::MacAddress;
pub use message::{DuplicatePolicy, Message};
pub use message_type::MessageType;
pub use option::{code, decode_options, encode_options, DhcpOption, OptionValue, MAGIC_COOKIE};
