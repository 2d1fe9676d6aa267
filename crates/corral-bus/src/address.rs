//! Address grammar: `agent[.instance][@scope]`, `@anyone[@scope]`,
//! `@everyone[@scope]`.
//!
//! Segments are case-preserving; the reserved keywords are matched
//! case-insensitively. Agent and instance segments allow ASCII
//! alphanumerics, `-` and `_`. Scopes additionally allow `.`.

use corral_core::constants::{ANYONE, EVERYONE, MAX_ADDRESS_SEGMENT_LEN};
use corral_core::errors::BusError;
use corral_core::models::Address;

/// Parse a recipient address.
pub fn parse(raw: &str) -> Result<Address, BusError> {
    let s = raw.trim();
    if s.is_empty() {
        return Err(invalid(raw, "address is empty"));
    }

    if let Some(rest) = s.strip_prefix('@') {
        let (keyword, scope) = match rest.split_once('@') {
            Some((keyword, scope)) => (keyword, Some(scope)),
            None => (rest, None),
        };
        let scope = scope.map(|sc| segment(raw, "scope", sc, true)).transpose()?;
        return if keyword.eq_ignore_ascii_case(ANYONE) {
            Ok(Address::Anyone { scope })
        } else if keyword.eq_ignore_ascii_case(EVERYONE) {
            Ok(Address::Everyone { scope })
        } else {
            Err(invalid(raw, &format!("unknown keyword '@{keyword}'")))
        };
    }

    let (head, scope) = match s.split_once('@') {
        Some((head, scope)) => (head, Some(scope)),
        None => (s, None),
    };
    let (agent, instance) = match head.split_once('.') {
        Some((agent, instance)) => (agent, Some(instance)),
        None => (head, None),
    };

    let agent = segment(raw, "agent", agent, false)?;
    if agent.eq_ignore_ascii_case(ANYONE) || agent.eq_ignore_ascii_case(EVERYONE) {
        return Err(invalid(raw, &format!("'{agent}' is reserved; did you mean '@{agent}'?")));
    }
    Ok(Address::Direct {
        agent,
        instance: instance
            .map(|i| segment(raw, "instance", i, false))
            .transpose()?,
        scope: scope.map(|sc| segment(raw, "scope", sc, true)).transpose()?,
    })
}

fn segment(raw: &str, what: &str, value: &str, allow_dot: bool) -> Result<String, BusError> {
    if value.is_empty() {
        return Err(invalid(raw, &format!("{what} is empty")));
    }
    if value.len() > MAX_ADDRESS_SEGMENT_LEN {
        return Err(invalid(
            raw,
            &format!("{what} too long ({} chars, max {MAX_ADDRESS_SEGMENT_LEN})", value.len()),
        ));
    }
    let ok = |c: char| c.is_ascii_alphanumeric() || c == '-' || c == '_' || (allow_dot && c == '.');
    if let Some(bad) = value.chars().find(|c| !ok(*c)) {
        return Err(invalid(raw, &format!("{what} contains invalid character '{bad}'")));
    }
    Ok(value.to_string())
}

fn invalid(raw: &str, reason: &str) -> BusError {
    BusError::InvalidAddress {
        address: raw.to_string(),
        reason: reason.to_string(),
    }
}
