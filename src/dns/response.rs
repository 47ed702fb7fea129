use std::collections::BTreeMap;
use std::net::IpAddr;

use crate::types::Value;
use crate::{Error, Result};

/// Field of the DNS record holding the resolver addresses
pub const SERVER_ADDRESSES: &str = "ServerAddresses";

/// Extract the resolver addresses from a converted DNS record
///
/// Entries that are not text or not valid IPv4/IPv6 literals are skipped, and
/// a `ServerAddresses` field that is not a sequence yields no addresses. The
/// order of the remaining entries is kept.
///
/// # Errors
/// Returns [`Error::EmptyServerList`] if the record has no `ServerAddresses` field
pub fn parse_dns_response(record: &BTreeMap<Value, Value>) -> Result<Vec<IpAddr>> {
    let servers = record
        .get(&Value::text(SERVER_ADDRESSES))
        .ok_or(Error::EmptyServerList)?;

    let Some(entries) = servers.as_sequence() else {
        log::debug!("{SERVER_ADDRESSES} is {}, ignoring it", servers.kind_name());
        return Ok(Vec::new());
    };

    let addrs = entries
        .iter()
        .filter_map(|entry| {
            let text = entry.as_text()?;
            match text.parse::<IpAddr>() {
                Ok(addr) => Some(addr),
                Err(e) => {
                    log::trace!("skipping server address {text:?}: {e}");
                    None
                }
            }
        })
        .collect();

    Ok(addrs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{Ipv4Addr, Ipv6Addr};

    fn record(servers: Value) -> BTreeMap<Value, Value> {
        let mut map = BTreeMap::new();
        map.insert(Value::text(SERVER_ADDRESSES), servers);
        map.insert(
            Value::text("SearchDomains"),
            Value::Sequence(vec![Value::text("lan")]),
        );
        map
    }

    fn texts(items: &[&str]) -> Value {
        Value::Sequence(items.iter().map(|s| Value::text(*s)).collect())
    }

    #[test]
    fn test_invalid_entries_dropped_in_order() {
        let addrs = parse_dns_response(&record(texts(&["8.8.8.8", "1.1.1.1", "not-an-ip"])))
            .unwrap();
        assert_eq!(
            addrs,
            vec![
                IpAddr::V4(Ipv4Addr::new(8, 8, 8, 8)),
                IpAddr::V4(Ipv4Addr::new(1, 1, 1, 1)),
            ]
        );
    }

    #[test]
    fn test_ipv6_and_mixed_order() {
        let addrs = parse_dns_response(&record(texts(&[
            "2001:4860:4860::8888",
            "300.1.1.1",
            "192.168.1.1",
            "::1",
            "",
        ])))
        .unwrap();
        assert_eq!(
            addrs,
            vec![
                "2001:4860:4860::8888".parse::<IpAddr>().unwrap(),
                IpAddr::V4(Ipv4Addr::new(192, 168, 1, 1)),
                IpAddr::V6(Ipv6Addr::LOCALHOST),
            ]
        );
    }

    #[test]
    fn test_missing_field_is_error() {
        let mut map = BTreeMap::new();
        map.insert(Value::text("SearchDomains"), texts(&["lan"]));
        assert!(matches!(
            parse_dns_response(&map),
            Err(Error::EmptyServerList)
        ));
        assert!(matches!(
            parse_dns_response(&BTreeMap::new()),
            Err(Error::EmptyServerList)
        ));
    }

    #[test]
    fn test_non_sequence_field_is_empty() {
        assert!(parse_dns_response(&record(Value::text("8.8.8.8")))
            .unwrap()
            .is_empty());
        assert!(parse_dns_response(&record(Value::Mapping(BTreeMap::new())))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_non_text_entries_skipped() {
        let servers = Value::Sequence(vec![
            Value::Sequence(vec![Value::text("8.8.4.4")]),
            Value::text("9.9.9.9"),
            Value::Mapping(BTreeMap::new()),
        ]);
        assert_eq!(
            parse_dns_response(&record(servers)).unwrap(),
            vec![IpAddr::V4(Ipv4Addr::new(9, 9, 9, 9))]
        );
    }

    #[test]
    fn test_empty_sequence() {
        assert!(parse_dns_response(&record(Value::Sequence(Vec::new())))
            .unwrap()
            .is_empty());
    }
}
