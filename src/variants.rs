//! Address generalization variants
//!
//! Pure helpers that expand a domain or address into the candidate
//! patterns a matching rule could use, from most to least specific.

/// Parent-domain variants, dropping one leading label at a time
///
/// `a.b.example.com` yields `a.b.example.com`, `b.example.com`,
/// `example.com`. A single label (or empty input) has no variants.
pub fn domain_variants(domain: &str) -> Vec<String> {
    let parts: Vec<&str> = domain.split('.').collect();
    let mut variants = Vec::new();

    for i in 0..parts.len().saturating_sub(1) {
        variants.push(parts[i..].join("."));
    }

    variants
}

/// CIDR variants for an address, widest last
///
/// IPv4 addresses yield `/32`, `/24`, `/16`, `/8` with trailing octets
/// zeroed; IPv6 addresses yield `/128`, `/64`, `/48`, `/32` over the
/// literal text. Port suffixes are stripped first. Anything that is not
/// a valid dotted quad or an IPv6 literal yields nothing.
pub fn ip_variants(address: &str) -> Vec<String> {
    if address.starts_with('[') {
        return ipv6_variants(bracket_contents(address));
    }

    // More than one colon group means a bare IPv6 literal
    if address.matches(':').count() > 1 {
        return ipv6_variants(address);
    }

    let bare = match address.split_once(':') {
        Some((host, _port)) => host,
        None => address,
    };

    let octets: Vec<&str> = bare.split('.').collect();
    if octets.len() != 4 || octets.iter().any(|o| o.parse::<u8>().is_err()) {
        return Vec::new();
    }

    vec![
        format!("{}/32", bare),
        format!("{}.{}.{}.0/24", octets[0], octets[1], octets[2]),
        format!("{}.{}.0.0/16", octets[0], octets[1]),
        format!("{}.0.0.0/8", octets[0]),
    ]
}

/// Strip a port suffix and bracket notation from an address
///
/// `[2001:db8::1]:443` becomes `2001:db8::1`, `10.0.0.1:443` becomes
/// `10.0.0.1`, and a bare IPv6 literal passes through whole.
pub fn strip_port(address: &str) -> &str {
    if address.starts_with('[') {
        return bracket_contents(address);
    }

    if address.matches(':').count() > 1 {
        return address;
    }

    match address.split_once(':') {
        Some((host, _port)) => host,
        None => address,
    }
}

fn bracket_contents(address: &str) -> &str {
    let inner = address.strip_prefix('[').unwrap_or(address);
    match inner.find(']') {
        Some(end) => &inner[..end],
        None => inner,
    }
}

fn ipv6_variants(address: &str) -> Vec<String> {
    [128, 64, 48, 32]
        .iter()
        .map(|prefix| format!("{}/{}", address, prefix))
        .collect()
}
