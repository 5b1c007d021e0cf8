//! Line-oriented consensus parser.

use std::net::IpAddr;

use log::{debug, trace};

use crate::models::RelayRecord;

/// Keyword line announcing the document version and flavor.
const VERSION_KEYWORD: &str = "network-status-version";

/// Consensus flavor, which decides where the address sits on an `r` line.
///
/// ```text
/// ns:        r nickname identity digest YYYY-MM-DD HH:MM:SS IP ORPort DirPort
/// microdesc: r nickname identity YYYY-MM-DD HH:MM:SS IP ORPort DirPort
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConsensusFlavor {
    /// Full `ns` consensus, with a descriptor digest on each `r` line
    #[default]
    Ns,
    /// Microdescriptor consensus
    Microdesc,
}

impl ConsensusFlavor {
    /// Flavor name as written in the version header.
    pub fn as_str(self) -> &'static str {
        match self {
            ConsensusFlavor::Ns => "ns",
            ConsensusFlavor::Microdesc => "microdesc",
        }
    }

    /// Index of the IP field, counting the leading `r`.
    pub fn address_field(self) -> usize {
        match self {
            ConsensusFlavor::Ns => 6,
            ConsensusFlavor::Microdesc => 5,
        }
    }

    fn from_version_line(line: &str) -> Self {
        // network-status-version 3 [flavor]
        match line.split_whitespace().nth(2) {
            Some("microdesc") => ConsensusFlavor::Microdesc,
            _ => ConsensusFlavor::Ns,
        }
    }
}

/// Result of parsing a consensus document.
#[derive(Debug, Clone, Default)]
pub struct ParsedConsensus {
    /// Flavor detected from the header.
    pub flavor: ConsensusFlavor,
    /// Relays in document order.
    pub relays: Vec<RelayRecord>,
    /// `r` lines dropped because they were malformed.
    pub skipped: usize,
    /// `a` lines that could not be attached to a relay.
    pub orphan_addresses: usize,
}

/// Parses consensus text into relay records.
///
/// Malformed `r` entries are skipped and counted; parsing never fails as a
/// whole. The flavor is taken from the `network-status-version` header when
/// it precedes the first relay, and defaults to `ns`.
pub fn parse_consensus(text: &str) -> ParsedConsensus {
    let mut parsed = ParsedConsensus::default();
    // Whether the last `r` line produced a record that `a` lines may extend
    let mut current_open = false;

    for line in text.lines() {
        let line = line.trim_end();

        if line.starts_with(VERSION_KEYWORD) && parsed.relays.is_empty() {
            parsed.flavor = ConsensusFlavor::from_version_line(line);
            debug!("Consensus flavor: {:?}", parsed.flavor);
            continue;
        }

        if let Some(rest) = line.strip_prefix("r ") {
            match parse_router_line(rest, parsed.flavor) {
                Some(relay) => {
                    parsed.relays.push(relay);
                    current_open = true;
                }
                None => {
                    trace!("Skipping malformed relay entry: {}", line);
                    parsed.skipped += 1;
                    current_open = false;
                }
            }
            continue;
        }

        if let Some(rest) = line.strip_prefix("a ") {
            let attached = current_open
                && match (parse_or_address(rest), parsed.relays.last_mut()) {
                    (Some(addr), Some(relay)) => {
                        if relay.ipv6_address.is_none() && addr.is_ipv6() {
                            relay.ipv6_address = Some(addr);
                        }
                        true
                    }
                    _ => false,
                };
            if !attached {
                parsed.orphan_addresses += 1;
            }
        }
    }

    parsed
}

/// Parses the fields after the `r` keyword.
fn parse_router_line(rest: &str, flavor: ConsensusFlavor) -> Option<RelayRecord> {
    let fields: Vec<&str> = rest.split_whitespace().collect();
    // `rest` has no leading "r", so shift indices by one
    let address_idx = flavor.address_field() - 1;

    let address = parse_address(fields.get(address_idx)?)?;
    let nickname = fields.first()?.to_string();
    let identity = fields.get(1)?.to_string();
    let or_port = fields
        .get(address_idx + 1)
        .and_then(|port| port.parse::<u16>().ok());

    Some(RelayRecord {
        nickname,
        identity,
        address,
        or_port,
        ipv6_address: None,
    })
}

/// Parses `[2001:db8::1]:9001` or `192.0.2.1:9001` into the address part.
fn parse_or_address(rest: &str) -> Option<IpAddr> {
    let token = rest.split_whitespace().next()?;
    if let Some(bracketed) = token.strip_prefix('[') {
        let (host, _port) = bracketed.split_once(']')?;
        return host.parse().ok();
    }
    let host = token.rsplit_once(':').map_or(token, |(host, _)| host);
    host.parse().ok()
}

/// Parses a bare address, tolerating IPv6 brackets.
pub(crate) fn parse_address(field: &str) -> Option<IpAddr> {
    let trimmed = field
        .strip_prefix('[')
        .and_then(|f| f.strip_suffix(']'))
        .unwrap_or(field);
    trimmed.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const NS_CONSENSUS: &str = "\
network-status-version 3
vote-status consensus
valid-after 2024-05-01 12:00:00
dir-source moria1 D586D18309DED4CD6D57C18FDB97EFA96D330566 128.31.0.34 128.31.0.34 9131 9101
r seele AAoQ1DAR6kkoo19hBAX5K0QztNw 7iFtMAg8zFbzX9rLi8SZZzfY4dU 2024-05-01 01:57:05 104.53.221.159 9001 0
a [2600:1700:3c21:b3f0::10]:9001
s Running Stable V2Dir Valid
v Tor 0.4.8.10
w Bandwidth=1110
r CalyxInstitute14 ABG9JIWtRdmE7EFZyI/AZuXjMA4 9Ib2DZCKMxh1lHvkwSDHhI5ZXag 2024-05-01 09:14:21 162.247.74.201 443 80
s Exit Fast Guard Running Stable Valid
r truncated AAAA
s Running
r badip BBBB CCCC 2024-05-01 09:14:21 not-an-ip 443 80
r v6only DDDD EEEE 2024-05-01 09:14:21 2001:db8::7 9001 0
directory-footer
";

    #[test]
    fn test_parse_ns_consensus() {
        let parsed = parse_consensus(NS_CONSENSUS);
        assert_eq!(parsed.flavor, ConsensusFlavor::Ns);
        assert_eq!(parsed.relays.len(), 3);
        assert_eq!(parsed.skipped, 2);

        let first = &parsed.relays[0];
        assert_eq!(first.nickname, "seele");
        assert_eq!(first.identity, "AAoQ1DAR6kkoo19hBAX5K0QztNw");
        assert_eq!(first.address, "104.53.221.159".parse::<IpAddr>().unwrap());
        assert_eq!(first.or_port, Some(9001));
        assert_eq!(
            first.ipv6_address,
            Some("2600:1700:3c21:b3f0::10".parse().unwrap())
        );

        assert_eq!(parsed.relays[1].nickname, "CalyxInstitute14");
        assert_eq!(parsed.relays[1].or_port, Some(443));
        assert!(parsed.relays[1].ipv6_address.is_none());
        assert!(parsed.relays[2].address.is_ipv6());
    }

    #[test]
    fn test_parse_microdesc_consensus() {
        let text = "\
network-status-version 3 microdesc
r seele AAoQ1DAR6kkoo19hBAX5K0QztNw 2024-05-01 01:57:05 104.53.221.159 9001 0
m 8Hq2mEHgi8ilu3XRA9+qt2jBwhMbmSNAYCsNyoEE+Gw
r CalyxInstitute14 ABG9JIWtRdmE7EFZyI/AZuXjMA4 2024-05-01 09:14:21 162.247.74.201 443 80
";
        let parsed = parse_consensus(text);
        assert_eq!(parsed.flavor, ConsensusFlavor::Microdesc);
        assert_eq!(parsed.relays.len(), 2);
        assert_eq!(parsed.skipped, 0);
        assert_eq!(
            parsed.relays[1].address,
            "162.247.74.201".parse::<IpAddr>().unwrap()
        );
    }

    #[test]
    fn test_microdesc_line_in_ns_document_is_skipped() {
        // Without the flavor header the port lands in the address slot
        let text = "r seele AAoQ1DAR6kkoo19hBAX5K0QztNw 2024-05-01 01:57:05 104.53.221.159 9001 0\n";
        let parsed = parse_consensus(text);
        assert!(parsed.relays.is_empty());
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_relay_order_is_preserved() {
        let text: String = (1..=20)
            .map(|i| format!("r relay{i} ID{i} DG{i} 2024-05-01 00:00:00 10.0.0.{i} 9001 0\n"))
            .collect();
        let parsed = parse_consensus(&text);
        let names: Vec<String> = parsed.relays.iter().map(|r| r.nickname.clone()).collect();
        let expected: Vec<String> = (1..=20).map(|i| format!("relay{i}")).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_empty_and_non_consensus_input() {
        assert!(parse_consensus("").relays.is_empty());
        let parsed = parse_consensus("hello world\nrandom text\n");
        assert!(parsed.relays.is_empty());
        assert_eq!(parsed.skipped, 0);
    }

    #[test]
    fn test_orphan_address_lines() {
        let text = "\
a [2001:db8::1]:9001
r broken X
a [2001:db8::2]:9001
";
        let parsed = parse_consensus(text);
        assert_eq!(parsed.orphan_addresses, 2);
        assert_eq!(parsed.skipped, 1);
    }

    #[test]
    fn test_parse_or_address_forms() {
        assert_eq!(
            parse_or_address("[2001:db8::1]:9001"),
            Some("2001:db8::1".parse().unwrap())
        );
        assert_eq!(
            parse_or_address("192.0.2.1:443"),
            Some("192.0.2.1".parse().unwrap())
        );
        assert_eq!(parse_or_address("[2001:db8::1"), None);
        assert_eq!(parse_or_address(""), None);
    }

    #[test]
    fn test_parse_address_rejects_garbage() {
        assert!(parse_address("8.8.8.8").is_some());
        assert!(parse_address("[::1]").is_some());
        assert!(parse_address("256.1.1.1").is_none());
        assert!(parse_address(" 8.8.8.8 ").is_none());
        assert!(parse_address("8.8.8.8\0").is_none());
    }

    #[test]
    fn test_crlf_line_endings() {
        let text = "r seele ID DG 2024-05-01 01:57:05 104.53.221.159 9001 0\r\n";
        let parsed = parse_consensus(text);
        assert_eq!(parsed.relays.len(), 1);
        assert_eq!(parsed.relays[0].or_port, Some(9001));
    }
}
