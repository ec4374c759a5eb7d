use anyhow::{bail, Context};
use dhcp_proto::{DhcpOption, DuplicatePolicy, Message, OptionValue};
use std::fmt;

/// Parse hex text such as a tcpdump or Wireshark export.
///
/// Whitespace and `:` separators are ignored.
pub fn parse_hex(text: &str) -> anyhow::Result<Vec<u8>> {
    let digits: Vec<u8> = text
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();
    if digits.len() % 2 != 0 {
        bail!("odd number of hex digits ({})", digits.len());
    }

    digits
        .chunks_exact(2)
        .enumerate()
        .map(|(i, pair)| {
            let pair = std::str::from_utf8(pair).context("non-ASCII input")?;
            u8::from_str_radix(pair, 16).with_context(|| format!("invalid hex byte {:?} at {}", pair, i))
        })
        .collect()
}

pub fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

/// One-line description for logs
pub fn headline(message: &Message) -> String {
    let kind = message
        .classify()
        .map(|mt| mt.to_string())
        .unwrap_or_else(|| "BOOTP".to_string());
    let client = message
        .header
        .client_mac()
        .map(|mac| mac.to_string())
        .unwrap_or_else(|| to_hex(message.header.hardware_address()));
    format!("{} xid={:#010x} from {}", kind, message.header.xid, client)
}

/// Multi-line human readable dump, resolving repeated codes with `policy`
pub fn summarize(message: &Message, policy: DuplicatePolicy) -> String {
    Summary { message, policy }.to_string()
}

struct Summary<'a> {
    message: &'a Message,
    policy: DuplicatePolicy,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = self.message;
        let header = &message.header;

        writeln!(f, "{}", headline(message))?;
        writeln!(
            f,
            "  op={:?} htype={} hlen={} hops={} secs={} broadcast={}",
            header.op,
            header.htype,
            header.hlen,
            header.hops,
            header.secs,
            header.is_broadcast()
        )?;
        writeln!(
            f,
            "  ciaddr={} yiaddr={} siaddr={} giaddr={}",
            header.ciaddr, header.yiaddr, header.siaddr, header.giaddr
        )?;
        if !header.sname.is_empty() {
            writeln!(f, "  sname={}", header.sname)?;
        }
        if !header.file.is_empty() {
            writeln!(f, "  file={}", header.file)?;
        }

        let mut seen = Vec::new();
        for option in message.options() {
            if seen.contains(&option.code) {
                continue;
            }
            seen.push(option.code);

            let Some(value) = message.lookup_with(option.code, self.policy) else {
                continue;
            };
            let resolved = DhcpOption {
                code: option.code,
                value: value.into_owned(),
            };
            writeln!(f, "  option {:>3}: {}", option.code, describe(&resolved))?;
        }

        Ok(())
    }
}

fn describe(option: &DhcpOption) -> String {
    match OptionValue::parse(option) {
        OptionValue::Unknown(_, data) => to_hex(&data),
        typed => format!("{:?}", typed),
    }
}
