use proptest::prelude::*;
use std::net::Ipv4Addr;

use dhcp_proto::{
    BootFile, DhcpOption, Error, Header, Message, MessageType, OpCode, ServerName, HEADER_LEN,
    MAGIC_COOKIE,
};

fn valid_prefix() -> Vec<u8> {
    let mut packet = Header::default().encode().to_vec();
    packet.extend_from_slice(&MAGIC_COOKIE);
    packet
}

fn arb_header() -> impl Strategy<Value = Header> {
    (
        (
            any::<u8>(),
            any::<u8>(),
            any::<u8>(),
            any::<u32>(),
            any::<u16>(),
            prop_oneof![Just(0u16), Just(0x8000u16)],
        ),
        any::<[[u8; 4]; 4]>(),
        prop::collection::vec(any::<u8>(), 0..=16),
        "[a-zA-Z0-9.-]{0,63}",
        "[a-zA-Z0-9./_-]{0,127}",
    )
        .prop_map(|((op, htype, hops, xid, secs, flags), addrs, chaddr, sname, file)| {
            let mut header = Header::new(OpCode::from(op));
            header.htype = htype;
            header.hops = hops;
            header.xid = xid;
            header.secs = secs;
            header.flags = flags;
            header.ciaddr = Ipv4Addr::from(addrs[0]);
            header.yiaddr = Ipv4Addr::from(addrs[1]);
            header.siaddr = Ipv4Addr::from(addrs[2]);
            header.giaddr = Ipv4Addr::from(addrs[3]);
            header.set_chaddr(&chaddr).unwrap();
            header.sname = ServerName::new(&sname).unwrap();
            header.file = BootFile::new(&file).unwrap();
            header
        })
}

fn arb_option() -> impl Strategy<Value = DhcpOption> {
    (1u8..=254, prop::collection::vec(any::<u8>(), 0..=255))
        .prop_map(|(code, value)| DhcpOption::new(code, value).unwrap())
}

fn arb_message() -> impl Strategy<Value = Message> {
    (arb_header(), prop::collection::vec(arb_option(), 0..8)).prop_map(|(header, options)| {
        let mut message = Message::new(header);
        for option in options {
            message.push_option(option).unwrap();
        }
        message
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(2000))]

    #[test]
    fn decode_never_panics_on_arbitrary_bytes(data in prop::collection::vec(any::<u8>(), 0..700)) {
        let _ = Message::decode(&data);
    }

    #[test]
    fn decode_never_panics_on_random_options(
        options_data in prop::collection::vec(any::<u8>(), 0..512)
    ) {
        let mut packet = valid_prefix();
        packet.extend_from_slice(&options_data);
        match Message::decode(&packet) {
            Ok(_) | Err(Error::TruncatedOption { .. }) => {}
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    #[test]
    fn short_buffers_always_truncated_header(data in prop::collection::vec(any::<u8>(), 0..HEADER_LEN)) {
        prop_assert_eq!(
            Message::decode(&data),
            Err(Error::TruncatedHeader { len: data.len() })
        );
    }

    #[test]
    fn bad_magic_cookie_always_rejected(cookie in any::<[u8; 4]>()) {
        prop_assume!(cookie != MAGIC_COOKIE);

        let mut packet = Header::default().encode().to_vec();
        packet.extend_from_slice(&cookie);
        packet.push(255);

        prop_assert_eq!(Message::decode(&packet), Err(Error::MissingMagicCookie));
    }

    #[test]
    fn header_is_always_fixed_width(header in arb_header()) {
        prop_assert_eq!(header.encode().len(), HEADER_LEN);
    }

    #[test]
    fn length_overrun_is_truncated_option(
        code in 1u8..=254,
        declared in 1u8..=255,
        fill in prop::collection::vec(any::<u8>(), 0..255)
    ) {
        let available = fill.len().min(usize::from(declared) - 1);
        let mut packet = valid_prefix();
        packet.push(code);
        packet.push(declared);
        packet.extend_from_slice(&fill[..available]);

        prop_assert_eq!(
            Message::decode(&packet),
            Err(Error::TruncatedOption { code, offset: 4 })
        );
    }

    #[test]
    fn reserved_wire_bits_are_always_zero(
        hlen in 0u8..=16,
        chaddr in any::<[u8; 16]>(),
        flags in any::<u16>()
    ) {
        let mut header = Header::default();
        header.hlen = hlen;
        header.chaddr = chaddr;
        header.flags = flags;

        let bytes = header.encode();
        prop_assert_eq!(u16::from_be_bytes([bytes[10], bytes[11]]) & !0x8000, 0);
        prop_assert!(bytes[28 + usize::from(hlen)..44].iter().all(|&b| b == 0));
    }

    #[test]
    fn constructed_messages_round_trip(message in arb_message()) {
        let bytes = message.encode().unwrap();
        prop_assert!(bytes.len() > HEADER_LEN + MAGIC_COOKIE.len());

        let decoded = Message::decode(&bytes).unwrap();
        prop_assert_eq!(decoded.classify(), message.classify());
        prop_assert_eq!(&decoded, &message);
    }

    #[test]
    fn reencoding_decoded_bytes_is_stable(message in arb_message()) {
        let bytes = message.encode().unwrap();
        let decoded = Message::decode(&bytes).unwrap();
        prop_assert_eq!(decoded.encode().unwrap(), bytes);
    }

    #[test]
    fn classification_follows_last_option_53(types in prop::collection::vec(1u8..=8, 1..4)) {
        let mut message = Message::new(Header::default());
        for value in &types {
            message.push_option(DhcpOption::new(53, vec![*value]).unwrap()).unwrap();
        }
        let decoded = Message::decode(&message.encode().unwrap()).unwrap();
        prop_assert_eq!(decoded.classify(), MessageType::from_u8(*types.last().unwrap()));
    }
}
