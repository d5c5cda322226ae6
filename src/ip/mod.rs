//! IP address validation and scope classification.
//!
//! Candidate IPs arrive as free text extracted from forensic documents, so
//! everything here works on strings first and `std::net::IpAddr` second.
//! No DNS resolution is ever performed.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};

use strum_macros::EnumIter as EnumIterMacro;

/// Classification of an address that falls in a reserved-use range.
///
/// Public/routable addresses have no scope kind (`classify` returns `None`).
/// The display labels feed the enrichment data contract
/// (`isp = "Red <label>"`, `error = "IP <label>"`), so they are part of the
/// report format and must stay stable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIterMacro)]
pub enum ScopeKind {
    /// RFC 1918 (IPv4) or unique-local fc00::/7 (IPv6)
    Private,
    /// 127.0.0.0/8 or ::1
    Loopback,
    /// 169.254.0.0/16 or fe80::/10
    LinkLocal,
    /// 224.0.0.0/4 or ff00::/8
    Multicast,
    /// 0.0.0.0/8, 240.0.0.0/4, 255.255.255.255, or ::
    Reserved,
}

impl ScopeKind {
    /// Report-facing label for this scope kind.
    pub fn label(&self) -> &'static str {
        match self {
            ScopeKind::Private => "Privada",
            ScopeKind::Loopback => "Loopback",
            ScopeKind::LinkLocal => "Link-Local",
            ScopeKind::Multicast => "Multicast",
            ScopeKind::Reserved => "Reservada",
        }
    }
}

impl std::fmt::Display for ScopeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Returns true iff `s` parses as an IPv4 or IPv6 address.
///
/// Empty and whitespace-only strings are invalid; callers are expected to
/// trim before asking. The grammar is exactly `std::net::IpAddr`'s: numeric
/// octets without leading zeros, standard `:`-separated IPv6 forms.
pub fn is_valid_ip(s: &str) -> bool {
    if s.is_empty() || s.chars().all(char::is_whitespace) {
        return false;
    }
    s.parse::<IpAddr>().is_ok()
}

/// Classifies `ip` if it falls in a reserved-use range, else `None`.
pub fn classify(ip: &IpAddr) -> Option<ScopeKind> {
    match ip {
        IpAddr::V4(v4) => classify_v4(v4),
        IpAddr::V6(v6) => classify_v6(v6),
    }
}

/// Convenience wrapper: parse then classify. `None` for unparseable input
/// as well as for public addresses; use [`is_valid_ip`] to tell them apart.
pub fn classify_str(s: &str) -> Option<ScopeKind> {
    s.parse::<IpAddr>().ok().and_then(|ip| classify(&ip))
}

fn classify_v4(ip: &Ipv4Addr) -> Option<ScopeKind> {
    let octets = ip.octets();
    if ip.is_private() {
        Some(ScopeKind::Private)
    } else if ip.is_loopback() {
        Some(ScopeKind::Loopback)
    } else if ip.is_link_local() {
        Some(ScopeKind::LinkLocal)
    } else if ip.is_multicast() {
        Some(ScopeKind::Multicast)
    } else if octets[0] == 0 || octets[0] >= 240 || ip.is_broadcast() {
        // 0.0.0.0/8 "this network", 240.0.0.0/4 future use, limited broadcast
        Some(ScopeKind::Reserved)
    } else {
        None
    }
}

fn classify_v6(ip: &Ipv6Addr) -> Option<ScopeKind> {
    let segments = ip.segments();
    if ip.is_loopback() {
        Some(ScopeKind::Loopback)
    } else if segments[0] & 0xfe00 == 0xfc00 {
        // fc00::/7 unique-local
        Some(ScopeKind::Private)
    } else if segments[0] & 0xffc0 == 0xfe80 {
        // fe80::/10 link-local
        Some(ScopeKind::LinkLocal)
    } else if ip.is_multicast() {
        Some(ScopeKind::Multicast)
    } else if ip.is_unspecified() {
        Some(ScopeKind::Reserved)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn valid_ipv4_addresses() {
        for ip in ["8.8.8.8", "203.0.113.45", "192.168.1.1", "1.0.0.1"] {
            assert!(is_valid_ip(ip), "{} should be valid", ip);
        }
    }

    #[test]
    fn valid_ipv6_addresses() {
        for ip in [
            "2001:0db8:85a3:0000:0000:8a2e:0370:7334",
            "2001:db8:abcd:12::1",
            "::1",
            "fe80::1",
            "::ffff:192.168.1.1",
        ] {
            assert!(is_valid_ip(ip), "{} should be valid", ip);
        }
    }

    #[test]
    fn malformed_addresses_rejected() {
        for ip in [
            "",
            "   ",
            "256.1.1.1",
            "1.1.1",
            "1.1.1.1.1",
            "999.999.999.999",
            "8.8.8.8 ",
            " 8.8.8.8",
            "8.8.8.8\n",
            "not.an.ip.address",
            "8,8,8,8",
            "01.2.3.4",
            "2001:::1",
        ] {
            assert!(!is_valid_ip(ip), "{:?} should be invalid", ip);
        }
    }

    #[test]
    fn classify_private_ranges() {
        for ip in ["10.0.0.1", "172.16.0.1", "172.31.255.255", "192.168.1.1", "fc00::1", "fd12::1"] {
            assert_eq!(classify_str(ip), Some(ScopeKind::Private), "{}", ip);
        }
        // 172.32.x is outside the /12
        assert_eq!(classify_str("172.32.0.1"), None);
    }

    #[test]
    fn classify_loopback_and_link_local() {
        assert_eq!(classify_str("127.0.0.1"), Some(ScopeKind::Loopback));
        assert_eq!(classify_str("127.255.255.254"), Some(ScopeKind::Loopback));
        assert_eq!(classify_str("::1"), Some(ScopeKind::Loopback));
        assert_eq!(classify_str("169.254.10.20"), Some(ScopeKind::LinkLocal));
        assert_eq!(classify_str("fe80::1"), Some(ScopeKind::LinkLocal));
    }

    #[test]
    fn classify_multicast_and_reserved() {
        assert_eq!(classify_str("224.0.0.1"), Some(ScopeKind::Multicast));
        assert_eq!(classify_str("239.255.255.255"), Some(ScopeKind::Multicast));
        assert_eq!(classify_str("ff02::1"), Some(ScopeKind::Multicast));
        assert_eq!(classify_str("240.0.0.1"), Some(ScopeKind::Reserved));
        assert_eq!(classify_str("255.255.255.255"), Some(ScopeKind::Reserved));
        assert_eq!(classify_str("0.1.2.3"), Some(ScopeKind::Reserved));
        assert_eq!(classify_str("::"), Some(ScopeKind::Reserved));
    }

    #[test]
    fn public_addresses_have_no_scope() {
        for ip in ["8.8.8.8", "203.0.113.45", "2001:db8:abcd:12::1", "1.1.1.1"] {
            assert_eq!(classify_str(ip), None, "{} should be public", ip);
        }
    }

    #[test]
    fn all_scope_kinds_have_labels() {
        for kind in ScopeKind::iter() {
            assert!(!kind.label().is_empty(), "{:?} needs a label", kind);
        }
    }

    #[test]
    fn labels_match_report_contract() {
        assert_eq!(ScopeKind::Private.to_string(), "Privada");
        assert_eq!(ScopeKind::Reserved.to_string(), "Reservada");
        assert_eq!(ScopeKind::LinkLocal.to_string(), "Link-Local");
    }
}
