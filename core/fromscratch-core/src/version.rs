//! Version string ordering.
//!
//! Versions are dotted numeric releases (`1.10.0`), optionally prefixed with
//! `v`, optionally followed by `-prerelease` and `+build`. Segments compare as
//! numbers, missing segments count as zero, and a prerelease sorts before its
//! release. Build metadata never affects ordering.
//!
//! ```
//! use std::cmp::Ordering;
//! use fromscratch_core::version::compare;
//!
//! assert_eq!(compare("1.9.0", "1.10.0"), Ordering::Less);
//! assert_eq!(compare("1.0", "1.0.0"), Ordering::Equal);
//! ```

use std::cmp::Ordering;

pub fn compare(a: &str, b: &str) -> Ordering {
    let (a_release, a_pre) = split(a);
    let (b_release, b_pre) = split(b);

    compare_release(a_release, b_release).then_with(|| compare_prerelease(a_pre, b_pre))
}

/// True when `remote` is strictly newer than `local`.
pub fn is_newer(remote: &str, local: &str) -> bool {
    compare(remote, local) == Ordering::Greater
}

fn split(version: &str) -> (&str, Option<&str>) {
    let version = version.trim();
    let version = version
        .strip_prefix('v')
        .or_else(|| version.strip_prefix('V'))
        .unwrap_or(version);
    let version = version.split('+').next().unwrap_or(version);
    match version.split_once('-') {
        Some((release, pre)) => (release, Some(pre)),
        None => (version, None),
    }
}

fn compare_release(a: &str, b: &str) -> Ordering {
    let a: Vec<u64> = a.split('.').map(numeric_prefix).collect();
    let b: Vec<u64> = b.split('.').map(numeric_prefix).collect();
    let len = a.len().max(b.len());

    (0..len)
        .map(|i| {
            let left = a.get(i).copied().unwrap_or(0);
            let right = b.get(i).copied().unwrap_or(0);
            left.cmp(&right)
        })
        .find(|ord| ord.is_ne())
        .unwrap_or(Ordering::Equal)
}

/// Leading digits of a segment; a segment with none counts as zero.
fn numeric_prefix(segment: &str) -> u64 {
    let digits: String = segment
        .trim()
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    digits.parse().unwrap_or(if digits.is_empty() { 0 } else { u64::MAX })
}

fn compare_prerelease(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => {
            let mut left = a.split('.');
            let mut right = b.split('.');
            loop {
                match (left.next(), right.next()) {
                    (None, None) => return Ordering::Equal,
                    (None, Some(_)) => return Ordering::Less,
                    (Some(_), None) => return Ordering::Greater,
                    (Some(l), Some(r)) => {
                        let ord = compare_identifier(l, r);
                        if ord.is_ne() {
                            return ord;
                        }
                    }
                }
            }
        }
    }
}

fn compare_identifier(a: &str, b: &str) -> Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(l), Ok(r)) => l.cmp(&r),
        // Numeric identifiers sort before alphanumeric ones.
        (Ok(_), Err(_)) => Ordering::Less,
        (Err(_), Ok(_)) => Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}
