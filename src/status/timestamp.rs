//! LDAP GeneralizedTime (RFC 4517 §3.3.13) parsing.

use chrono::{DateTime, Duration, FixedOffset, NaiveDate, TimeZone, Utc};

/// Parse `YYYYMMDDHH[MM[SS]][(.|,)fraction](Z|+HH[MM]|-HH[MM])`.
///
/// Returns `None` for anything that does not follow the grammar; callers
/// treat unparseable timestamps as absent evidence.
pub fn parse_generalized_time(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    let digits = value.bytes().take_while(u8::is_ascii_digit).count();
    if !matches!(digits, 10 | 12 | 14) {
        return None;
    }

    let field = |start: usize, len: usize| -> Option<u32> { value.get(start..start + len)?.parse().ok() };
    let year = value.get(0..4)?.parse::<i32>().ok()?;
    let month = field(4, 2)?;
    let day = field(6, 2)?;
    let hour = field(8, 2)?;
    let minute = if digits >= 12 { field(10, 2)? } else { 0 };
    let second = if digits >= 14 { field(12, 2)? } else { 0 };

    let mut rest = &value[digits..];
    let mut fraction = 0f64;
    if let Some(stripped) = rest.strip_prefix('.').or_else(|| rest.strip_prefix(',')) {
        let len = stripped.bytes().take_while(u8::is_ascii_digit).count();
        if len == 0 {
            return None;
        }
        fraction = format!("0.{}", &stripped[..len]).parse().ok()?;
        rest = &stripped[len..];
    }

    let offset = parse_offset(rest)?;

    // Leap second (60) is clamped.
    let naive = NaiveDate::from_ymd_opt(year, month, day)?.and_hms_opt(hour, minute, second.min(59))?;

    // The fraction applies to the least significant field present.
    let unit_seconds = match digits {
        10 => 3600.0,
        12 => 60.0,
        _ => 1.0,
    };
    let extra = Duration::milliseconds((fraction * unit_seconds * 1000.0).round() as i64);

    let local = offset.from_local_datetime(&naive).single()?;
    Some(local.with_timezone(&Utc) + extra)
}

fn parse_offset(rest: &str) -> Option<FixedOffset> {
    if rest == "Z" {
        return FixedOffset::east_opt(0);
    }
    let sign = match rest.as_bytes().first()? {
        b'+' => 1,
        b'-' => -1,
        _ => return None,
    };
    let body = &rest[1..];
    if !body.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let (hours, minutes) = match body.len() {
        2 => (body.parse::<i32>().ok()?, 0),
        4 => (body[..2].parse::<i32>().ok()?, body[2..].parse::<i32>().ok()?),
        _ => return None,
    };
    if hours > 23 || minutes > 59 {
        return None;
    }
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn test_parse_full_utc() {
        assert_eq!(
            parse_generalized_time("20240115093000Z"),
            Some(utc(2024, 1, 15, 9, 30, 0))
        );
    }

    #[test]
    fn test_parse_short_forms() {
        assert_eq!(
            parse_generalized_time("202401150930Z"),
            Some(utc(2024, 1, 15, 9, 30, 0))
        );
        assert_eq!(
            parse_generalized_time("2024011509Z"),
            Some(utc(2024, 1, 15, 9, 0, 0))
        );
    }

    #[test]
    fn test_parse_offset() {
        assert_eq!(
            parse_generalized_time("20240115093000+0200"),
            Some(utc(2024, 1, 15, 7, 30, 0))
        );
        assert_eq!(
            parse_generalized_time("20240115093000-05"),
            Some(utc(2024, 1, 15, 14, 30, 0))
        );
    }

    #[test]
    fn test_parse_fraction() {
        let parsed = parse_generalized_time("20240115093000.5Z").unwrap();
        assert_eq!(parsed, utc(2024, 1, 15, 9, 30, 0) + Duration::milliseconds(500));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        for input in [
            "",
            "never",
            "2024-01-15T09:30:00Z",
            "20240115093000",
            "20241315093000Z",
            "20240115093000+2500",
            "20240115093000.Z",
        ] {
            assert_eq!(parse_generalized_time(input), None, "accepted {input:?}");
        }
    }
}
