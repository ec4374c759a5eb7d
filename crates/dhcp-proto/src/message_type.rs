use serde::Serialize;
use std::fmt;

/// DHCP message types carried in option 53 (RFC 2132 section 9.6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum MessageType {
    Discover = 1,
    Offer = 2,
    Request = 3,
    Decline = 4,
    Ack = 5,
    Nak = 6,
    Release = 7,
    Inform = 8,
}

impl MessageType {
    pub fn to_u8(self) -> u8 {
        self as u8
    }

    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            1 => Some(Self::Discover),
            2 => Some(Self::Offer),
            3 => Some(Self::Request),
            4 => Some(Self::Decline),
            5 => Some(Self::Ack),
            6 => Some(Self::Nak),
            7 => Some(Self::Release),
            8 => Some(Self::Inform),
            _ => None,
        }
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Discover => "DHCPDISCOVER",
            Self::Offer => "DHCPOFFER",
            Self::Request => "DHCPREQUEST",
            Self::Decline => "DHCPDECLINE",
            Self::Ack => "DHCPACK",
            Self::Nak => "DHCPNAK",
            Self::Release => "DHCPRELEASE",
            Self::Inform => "DHCPINFORM",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_type_to_u8() {
        assert_eq!(MessageType::Discover.to_u8(), 1);
        assert_eq!(MessageType::Offer.to_u8(), 2);
        assert_eq!(MessageType::Nak.to_u8(), 6);
        assert_eq!(MessageType::Inform.to_u8(), 8);
    }

    #[test]
    fn test_message_type_from_u8() {
        for value in 1..=8 {
            assert_eq!(MessageType::from_u8(value).map(MessageType::to_u8), Some(value));
        }
        assert_eq!(MessageType::from_u8(0), None);
        assert_eq!(MessageType::from_u8(99), None);
    }

    #[test]
    fn test_message_type_display() {
        assert_eq!(MessageType::Ack.to_string(), "DHCPACK");
    }
}
