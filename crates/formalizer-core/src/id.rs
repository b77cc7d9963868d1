//! Node and Edge identifiers.
//!
//! A `NodeId` is a calendar timestamp plus a minor enumerator distinguishing
//! Nodes created within the same second. Ordering is lexicographic from year
//! down to minor, matching `ID_TimeStamp::operator<` in the reference
//! implementation.

use std::cmp::Ordering;
use std::fmt;

use crate::error::IdError;

/// The minimum year accepted in a `NodeId`'s calendar portion.
pub const MIN_YEAR: u16 = 1999;

/// String rendering of a null (all-zero) key.
pub const NULL_KEY_STR: &str = "{null-key}";

/// A Node identifier: a calendar timestamp with a minor enumerator.
///
/// The calendar portion doubles as the Node's creation time. IDs are
/// immutable once constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
    minor: u8,
}

impl NodeId {
    /// Construct and validate a `NodeId` from its calendar fields.
    pub fn new(
        year: u16,
        month: u8,
        day: u8,
        hour: u8,
        minute: u8,
        second: u8,
        minor: u8,
    ) -> Result<Self, IdError> {
        let id = NodeId {
            year,
            month,
            day,
            hour,
            minute,
            second,
            minor,
        };
        id.validate()?;
        Ok(id)
    }

    /// The null key: a recognizable, always-invalid sentinel (month = 0).
    /// Used where "no Node" must be distinguishable from a real ID.
    pub const fn null() -> Self {
        NodeId {
            year: 0,
            month: 0,
            day: 0,
            hour: 0,
            minute: 0,
            second: 0,
            minor: 0,
        }
    }

    pub const fn is_null(&self) -> bool {
        self.month == 0
    }

    fn validate(&self) -> Result<(), IdError> {
        if self.is_null() {
            return Ok(());
        }
        if self.year < MIN_YEAR {
            return Err(IdError::InvalidId(format!(
                "year {} is before minimum {}",
                self.year, MIN_YEAR
            )));
        }
        if !(1..=12).contains(&self.month) {
            return Err(IdError::InvalidId(format!("month {} out of range", self.month)));
        }
        let max_day = days_in_month(self.year, self.month);
        if self.day < 1 || self.day > max_day {
            return Err(IdError::InvalidId(format!(
                "day {} out of range for {}-{}",
                self.day, self.year, self.month
            )));
        }
        if self.hour > 23 {
            return Err(IdError::InvalidId(format!("hour {} out of range", self.hour)));
        }
        if self.minute > 59 {
            return Err(IdError::InvalidId(format!("minute {} out of range", self.minute)));
        }
        if self.second > 59 {
            return Err(IdError::InvalidId(format!("second {} out of range", self.second)));
        }
        if self.minor < 1 {
            return Err(IdError::InvalidId("minor must be >= 1".to_string()));
        }
        Ok(())
    }

    /// Parse a `YYYYmmddHHMMSS.m` string.
    pub fn parse(s: &str) -> Result<Self, IdError> {
        if s == NULL_KEY_STR {
            return Ok(NodeId::null());
        }
        let (ts, minor_str) = s
            .split_once('.')
            .ok_or_else(|| IdError::BadTimestamp(s.to_string()))?;
        if ts.len() != 14 {
            return Err(IdError::BadTimestamp(s.to_string()));
        }
        let field = |range: std::ops::Range<usize>| -> Result<u32, IdError> {
            ts.get(range)
                .and_then(|v| v.parse::<u32>().ok())
                .ok_or_else(|| IdError::BadTimestamp(s.to_string()))
        };
        let year = field(0..4)?;
        let month = field(4..6)?;
        let day = field(6..8)?;
        let hour = field(8..10)?;
        let minute = field(10..12)?;
        let second = field(12..14)?;
        let minor = minor_str
            .parse::<u32>()
            .map_err(|_| IdError::BadTimestamp(s.to_string()))?;
        NodeId::new(
            year as u16,
            month as u8,
            day as u8,
            hour as u8,
            minute as u8,
            second as u8,
            minor as u8,
        )
    }

    /// Build a `NodeId` from an epoch-seconds timestamp plus a minor
    /// enumerator, using the given timezone offset in hours.
    pub fn from_epoch(epoch: i64, minor: u8, tz_offset_hours: i32) -> Result<Self, IdError> {
        let (y, mo, d, h, mi, s) = crate::time::epoch_to_calendar(epoch, tz_offset_hours);
        NodeId::new(y, mo, d, h, mi, s, minor)
    }

    /// Convert the calendar portion back to epoch seconds (ignoring minor,
    /// per the reference implementation — multiple Nodes may share an
    /// epoch-time if only their minor enumerator differs).
    pub fn epoch_time(&self, tz_offset_hours: i32) -> i64 {
        crate::time::calendar_to_epoch(
            self.year, self.month, self.day, self.hour, self.minute, self.second, tz_offset_hours,
        )
    }

    pub const fn minor(&self) -> u8 {
        self.minor
    }
}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        (
            self.year,
            self.month,
            self.day,
            self.hour,
            self.minute,
            self.second,
            self.minor,
        )
            .cmp(&(
                other.year,
                other.month,
                other.day,
                other.hour,
                other.minute,
                other.second,
                other.minor,
            ))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            return write!(f, "{}", NULL_KEY_STR);
        }
        write!(
            f,
            "{:04}{:02}{:02}{:02}{:02}{:02}.{}",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.minor
        )
    }
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => {
            if is_leap_year(year) {
                29
            } else {
                28
            }
        }
        _ => 0,
    }
}

fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

/// An Edge identifier: the pair of Node IDs it connects. Canonical string
/// form is `<dep>><sup>`; containers order Edges by `(sup, dep)` so that all
/// dependencies of a superior group together.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeId {
    pub dep: NodeId,
    pub sup: NodeId,
}

impl EdgeId {
    pub const fn new(dep: NodeId, sup: NodeId) -> Self {
        EdgeId { dep, sup }
    }
}

impl PartialOrd for EdgeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for EdgeId {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.sup, self.dep).cmp(&(other.sup, other.dep))
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}>{}", self.dep, self.sup)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn node_id_round_trips_through_string() {
        let id = NodeId::new(2024, 3, 15, 9, 30, 0, 1).unwrap();
        let s = id.to_string();
        assert_eq!(s, "20240315093000.1");
        let parsed = NodeId::parse(&s).unwrap();
        assert_eq!(parsed, id);
    }

    #[test]
    fn null_key_round_trips() {
        let id = NodeId::null();
        assert_eq!(id.to_string(), NULL_KEY_STR);
        assert_eq!(NodeId::parse(NULL_KEY_STR).unwrap(), id);
    }

    #[test]
    fn ordering_is_lexicographic_year_down_to_minor() {
        let a = NodeId::new(2024, 1, 1, 0, 0, 0, 1).unwrap();
        let b = NodeId::new(2024, 1, 1, 0, 0, 0, 2).unwrap();
        let c = NodeId::new(2024, 1, 2, 0, 0, 0, 1).unwrap();
        assert!(a < b);
        assert!(b < c);
    }

    #[test]
    fn rejects_year_before_minimum() {
        let err = NodeId::new(1998, 1, 1, 0, 0, 0, 1).unwrap_err();
        assert!(matches!(err, IdError::InvalidId(_)));
    }

    #[test]
    fn rejects_invalid_month_and_day() {
        assert!(NodeId::new(2024, 13, 1, 0, 0, 0, 1).is_err());
        assert!(NodeId::new(2024, 2, 30, 0, 0, 0, 1).is_err());
        assert!(NodeId::new(2024, 2, 29, 0, 0, 0, 1).is_ok()); // leap year
        assert!(NodeId::new(2023, 2, 29, 0, 0, 0, 1).is_err()); // not a leap year
    }

    #[test]
    fn rejects_minor_zero() {
        assert!(NodeId::new(2024, 1, 1, 0, 0, 0, 0).is_err());
    }

    #[test]
    fn edge_id_string_form_and_ordering() {
        let n1 = NodeId::new(2024, 1, 1, 0, 0, 0, 1).unwrap();
        let n2 = NodeId::new(2024, 1, 2, 0, 0, 0, 1).unwrap();
        let e = EdgeId::new(n1, n2);
        assert_eq!(e.to_string(), format!("{}>{}", n1, n2));

        let e_same_sup_earlier_dep = EdgeId::new(n1, n2);
        let e_same_sup_later_dep = EdgeId::new(n2, n2);
        assert!(e_same_sup_earlier_dep < e_same_sup_later_dep);
    }
}
