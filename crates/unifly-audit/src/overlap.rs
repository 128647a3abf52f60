//! Set-overlap primitives shared by the firewall detector and the grouper.
//!
//! Every function here is null-safe: an absent value is the most permissive
//! one ("all ports", "all protocols", "any ICMP type"). Malformed input is
//! non-matching, never an error.

use std::net::Ipv4Addr;
use std::ops::RangeInclusive;

use ipnet::Ipv4Net;

use crate::model::{MatchTarget, ids_match};

// ── CIDR ────────────────────────────────────────────────────────────

/// Parse `a.b.c.d/n` or a bare address (implicit `/32`).
///
/// Host bits are preserved so that a bare address stays itself.
pub fn parse_cidr(raw: &str) -> Option<Ipv4Net> {
    let raw = raw.trim();
    if raw.contains('/') {
        raw.parse::<Ipv4Net>().ok()
    } else {
        raw.parse::<Ipv4Addr>()
            .ok()
            .and_then(|addr| Ipv4Net::new(addr, 32).ok())
    }
}

/// `true` when `candidate` lies entirely inside `reference`.
///
/// The candidate's address masked by the reference prefix must equal the
/// reference network, and the candidate must be at least as specific.
/// A larger block is never contained in a smaller one, even if they
/// intersect.
pub fn cidr_contains(reference: &str, candidate: &str) -> bool {
    let (Some(reference), Some(candidate)) = (parse_cidr(reference), parse_cidr(candidate)) else {
        return false;
    };
    net_contains(reference, candidate)
}

fn net_contains(reference: Ipv4Net, candidate: Ipv4Net) -> bool {
    let mask = u32::from(reference.netmask());
    let masked = u32::from(candidate.addr()) & mask;
    masked == u32::from(reference.network()) && candidate.prefix_len() >= reference.prefix_len()
}

/// Two address lists overlap when some entry contains another, either way.
pub fn ip_sets_overlap(a: &[String], b: &[String]) -> bool {
    let a: Vec<Ipv4Net> = a.iter().filter_map(|s| parse_cidr(s)).collect();
    let b: Vec<Ipv4Net> = b.iter().filter_map(|s| parse_cidr(s)).collect();
    a.iter()
        .any(|x| b.iter().any(|y| net_contains(*x, *y) || net_contains(*y, *x)))
}

// ── Domains ─────────────────────────────────────────────────────────

fn normalize_domain(raw: &str) -> String {
    let lowered = raw.trim().trim_end_matches('.').to_ascii_lowercase();
    lowered
        .strip_prefix("*.")
        .map_or_else(|| lowered.clone(), str::to_owned)
}

fn is_label_suffix(longer: &str, shorter: &str) -> bool {
    longer
        .strip_suffix(shorter)
        .is_some_and(|head| head.ends_with('.'))
}

/// Equal, or one is a subdomain of the other on a label boundary.
pub fn domains_overlap(a: &str, b: &str) -> bool {
    let (a, b) = (normalize_domain(a), normalize_domain(b));
    if a.is_empty() || b.is_empty() {
        return false;
    }
    a == b || is_label_suffix(&a, &b) || is_label_suffix(&b, &a)
}

// ── Ports ───────────────────────────────────────────────────────────

/// Parsed destination port spec.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortSet {
    All,
    Ranges(Vec<RangeInclusive<u16>>),
}

impl PortSet {
    /// Parse `"80,443,8000-8080"`. Absent or blank means every port.
    /// Reversed ranges and non-numeric tokens are dropped.
    pub fn parse(spec: Option<&str>) -> Self {
        let Some(spec) = spec.map(str::trim).filter(|s| !s.is_empty()) else {
            return Self::All;
        };
        let ranges = spec
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .filter_map(parse_port_token)
            .collect();
        Self::Ranges(ranges)
    }

    pub fn contains(&self, port: u16) -> bool {
        match self {
            Self::All => true,
            Self::Ranges(ranges) => ranges.iter().any(|r| r.contains(&port)),
        }
    }

    pub fn overlaps(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::All, Self::All) => true,
            (Self::All, Self::Ranges(r)) | (Self::Ranges(r), Self::All) => !r.is_empty(),
            (Self::Ranges(a), Self::Ranges(b)) => a
                .iter()
                .any(|x| b.iter().any(|y| x.start() <= y.end() && y.start() <= x.end())),
        }
    }
}

fn parse_port_token(token: &str) -> Option<RangeInclusive<u16>> {
    match token.split_once('-') {
        Some((lo, hi)) => {
            let lo: u16 = lo.trim().parse().ok()?;
            let hi: u16 = hi.trim().parse().ok()?;
            (lo <= hi).then_some(lo..=hi)
        }
        None => token.parse::<u16>().ok().map(|p| p..=p),
    }
}

pub fn ports_overlap(a: Option<&str>, b: Option<&str>) -> bool {
    PortSet::parse(a).overlaps(&PortSet::parse(b))
}

// ── Protocols ───────────────────────────────────────────────────────

fn normalize_protocol(raw: Option<&str>) -> String {
    raw.map(str::trim)
        .filter(|p| !p.is_empty())
        .map_or_else(|| "all".to_owned(), str::to_ascii_lowercase)
}

/// Exact match, either side `all`, or `tcp_udp` against `tcp`/`udp`.
pub fn protocols_overlap(a: Option<&str>, b: Option<&str>) -> bool {
    let (a, b) = (normalize_protocol(a), normalize_protocol(b));
    if a == b || a == "all" || b == "all" {
        return true;
    }
    matches!(
        (a.as_str(), b.as_str()),
        ("tcp_udp", "tcp" | "udp") | ("tcp" | "udp", "tcp_udp")
    )
}

/// Protocols whose rules carry a meaningful destination port.
pub fn protocol_has_ports(protocol: Option<&str>) -> bool {
    matches!(normalize_protocol(protocol).as_str(), "tcp" | "udp" | "tcp_udp")
}

// ── ICMP ────────────────────────────────────────────────────────────

fn is_any_icmp(raw: Option<&str>) -> bool {
    raw.map(str::trim)
        .is_none_or(|t| t.is_empty() || t.eq_ignore_ascii_case("any"))
}

/// `ANY` (or absent) overlaps every type; concrete types must match.
pub fn icmp_types_overlap(a: Option<&str>, b: Option<&str>) -> bool {
    if is_any_icmp(a) || is_any_icmp(b) {
        return true;
    }
    match (a, b) {
        (Some(a), Some(b)) => a.trim().eq_ignore_ascii_case(b.trim()),
        _ => true,
    }
}

// ── Matching targets ────────────────────────────────────────────────

/// `Any` overlaps everything; otherwise only targets of the same type can
/// overlap, through the primitive for that type.
pub fn targets_overlap(a: &MatchTarget, b: &MatchTarget) -> bool {
    match (a, b) {
        (MatchTarget::Any, _) | (_, MatchTarget::Any) => true,
        (MatchTarget::Networks(x), MatchTarget::Networks(y)) => {
            x.iter().any(|n| y.iter().any(|m| ids_match(n, m)))
        }
        (MatchTarget::Ips(x), MatchTarget::Ips(y)) => ip_sets_overlap(x, y),
        (MatchTarget::Domains(x), MatchTarget::Domains(y)) => {
            x.iter().any(|d| y.iter().any(|e| domains_overlap(d, e)))
        }
        (
            MatchTarget::Other { kind: ka, values: va },
            MatchTarget::Other { kind: kb, values: vb },
        ) => ka.eq_ignore_ascii_case(kb) && va.iter().any(|v| vb.contains(v)),
        _ => false,
    }
}
