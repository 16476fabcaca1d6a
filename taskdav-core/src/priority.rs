//! Mapping between local priorities and the iCalendar 1-9 PRIORITY scale.
//!
//! RFC 5545 section 3.8.1.9: 1-4 is high, 5 is medium, 6-9 is low and 0 is
//! undefined. Reading collapses the scale into four buckets; writing keeps the
//! previous remote value when it already falls in the right bucket, so other
//! clients' finer grained choices survive a local edit.

use crate::task::Priority;

/// PRIORITY value to write for `local`, given what the remote object had.
pub fn to_remote(local: Priority, previous: u8) -> u8 {
    match local {
        Priority::None => 0,
        Priority::Medium => 5,
        Priority::High => {
            if previous < 5 {
                previous.max(1)
            } else {
                1
            }
        }
        Priority::Low => {
            if previous > 5 {
                previous.min(9)
            } else {
                9
            }
        }
    }
}

pub fn from_remote(remote: u8) -> Priority {
    match remote {
        1..=4 => Priority::High,
        5 => Priority::Medium,
        6..=9 => Priority::Low,
        _ => Priority::None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Priority; 4] = [Priority::High, Priority::Medium, Priority::Low, Priority::None];

    #[test]
    fn test_written_value_stays_in_bucket_for_any_previous_value() {
        for previous in 0..=12u8 {
            assert!((1..=4).contains(&to_remote(Priority::High, previous)));
            assert!((6..=9).contains(&to_remote(Priority::Low, previous)));
            assert_eq!(to_remote(Priority::Medium, previous), 5);
            assert_eq!(to_remote(Priority::None, previous), 0);
        }
    }

    #[test]
    fn test_keeps_previous_value_inside_bucket() {
        assert_eq!(to_remote(Priority::High, 3), 3);
        assert_eq!(to_remote(Priority::High, 0), 1);
        assert_eq!(to_remote(Priority::High, 7), 1);
        assert_eq!(to_remote(Priority::Low, 7), 7);
        assert_eq!(to_remote(Priority::Low, 2), 9);
        assert_eq!(to_remote(Priority::Low, 5), 9);
    }

    #[test]
    fn test_round_trip_returns_local_priority() {
        for previous in 0..=9u8 {
            for local in ALL {
                assert_eq!(from_remote(to_remote(local, previous)), local);
            }
        }
    }

    #[test]
    fn test_out_of_range_reads_as_none() {
        assert_eq!(from_remote(0), Priority::None);
        assert_eq!(from_remote(10), Priority::None);
    }
}
