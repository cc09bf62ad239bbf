//! Dotted numeric version comparison used to resolve duplicate packages

use std::cmp::Ordering;

/// Split a dotted version into numeric components, as digit strings without
/// leading zeros.
///
/// Components that are not non-negative integers degrade to "0". Components
/// stay strings so arbitrarily long numbers still compare by magnitude.
///
/// Examples:
/// - "1.04" -> ["1", "4"]
/// - "1.x.3" -> ["1", "0", "3"]
fn parse_components(version: &str) -> Vec<&str> {
    version
        .split('.')
        .map(|part| {
            let part = part.trim();
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return "0";
            }
            match part.trim_start_matches('0') {
                "" => "0",
                digits => digits,
            }
        })
        .collect()
}

fn compare_component(a: &str, b: &str) -> Ordering {
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Returns true when `candidate` should replace `incumbent`.
///
/// A missing or empty version on either side always counts as newer. Otherwise
/// the shorter version is padded with zeros and components are compared left
/// to right. Equal versions are not newer, so the incumbent keeps ties.
pub fn is_newer(candidate: &str, incumbent: &str) -> bool {
    if candidate.is_empty() || incumbent.is_empty() {
        return true;
    }

    let candidate = parse_components(candidate);
    let incumbent = parse_components(incumbent);
    let len = candidate.len().max(incumbent.len());

    for i in 0..len {
        let c = candidate.get(i).copied().unwrap_or("0");
        let n = incumbent.get(i).copied().unwrap_or("0");
        match compare_component(c, n) {
            Ordering::Greater => return true,
            Ordering::Less => return false,
            Ordering::Equal => {}
        }
    }

    false
}
