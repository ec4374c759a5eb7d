//! Error types for DHCP message encoding and decoding.

/// Errors returned by the header, option and message codecs.
///
/// Construction errors (`FieldTooLong`, `InvalidString`, `OptionValueTooLong`,
/// `ReservedOptionCode`) are caller bugs. Decode errors mean the received
/// buffer is not a usable DHCP message and should be dropped.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// A fixed-size header field was given more bytes than it can hold.
    #[error("field too long: {len} bytes, at most {max} allowed")]
    FieldTooLong { max: usize, len: usize },

    /// A header string contains a NUL byte, which would end it early on the wire.
    #[error("header string contains an embedded NUL byte")]
    InvalidString,

    /// An option value does not fit in a single length byte.
    #[error("option {code} value too long: {len} bytes, at most 255 allowed")]
    OptionValueTooLong { code: u8, len: usize },

    /// PAD (0) and END (255) cannot be carried as data options.
    #[error("option code {0} is reserved")]
    ReservedOptionCode(u8),

    /// Fewer than 236 bytes were available for the fixed header.
    #[error("truncated header: got {len} bytes, need 236")]
    TruncatedHeader { len: usize },

    /// The options area does not start with 99.130.83.99.
    #[error("missing DHCP magic cookie")]
    MissingMagicCookie,

    /// An option's length byte is missing or overruns the buffer.
    #[error("truncated option {code} at offset {offset}")]
    TruncatedOption { code: u8, offset: usize },
}

impl Error {
    /// Whether this error came from parsing a received buffer.
    ///
    /// Such packets are expected to be logged and discarded.
    pub fn is_decode_error(&self) -> bool {
        matches!(
            self,
            Self::TruncatedHeader { .. } | Self::MissingMagicCookie | Self::TruncatedOption { .. }
        )
    }
}

/// Result alias used throughout the codec.
pub type Result<T> = std::result::Result<T, Error>;
