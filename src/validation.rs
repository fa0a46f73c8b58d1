//! Score validators
//!
//! Pure predicates deciding whether a token is a legal value for a given score
//! type. A failed check is not an error; it only means the token is not the
//! value a machine is waiting for.

use std::ops::RangeInclusive;

/// Legal range of a Mayo subscore (stool frequency, bleeding, mucosa, global).
pub const SUBSCORE_RANGE: RangeInclusive<i64> = 0..=3;

/// Legal range of an explicit Mayo total.
pub const MAYO_TOTAL_RANGE: RangeInclusive<i64> = 0..=12;

/// Parse `token` as an integer, tolerating one trailing period (`"2."`).
pub fn parse_integer(token: &str) -> Option<i64> {
    let trimmed = token.strip_suffix('.').unwrap_or(token);
    trimmed.parse::<i64>().ok()
}

fn in_range(token: &str, range: &RangeInclusive<i64>) -> Option<u8> {
    parse_integer(token)
        .filter(|value| range.contains(value))
        .and_then(|value| u8::try_from(value).ok())
}

/// The token's value if it is a valid subscore (0..=3).
pub fn subscore(token: &str) -> Option<u8> {
    in_range(token, &SUBSCORE_RANGE)
}

pub fn is_subscore(token: &str) -> bool {
    subscore(token).is_some()
}

/// The token's value if it is a valid Mayo total (0..=12).
pub fn total_score(token: &str) -> Option<u8> {
    in_range(token, &MAYO_TOTAL_RANGE)
}

pub fn is_total_score(token: &str) -> bool {
    total_score(token).is_some()
}

/// The token's value if it is a non-negative integer written in ASCII digits.
///
/// SES-CD has no ceiling beyond that; the machine's state decides whether the
/// number is the total or a regional subscore.
pub fn ses_cd_score(token: &str) -> Option<u32> {
    let trimmed = token.strip_suffix('.').unwrap_or(token);
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    trimmed.parse::<u32>().ok()
}
