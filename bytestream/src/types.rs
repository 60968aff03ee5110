//! Value types with a fixed wire meaning.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

const TICKS_PER_SECOND: u64 = 10_000_000;
const NANOS_PER_TICK: u128 = 100;

/// A point in time counted in 100-nanosecond ticks since 0001-01-01T00:00:00.
///
/// Encoded as the raw tick count in a fixed64 field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct DateTime {
    ticks: u64,
}

impl DateTime {
    /// 0001-01-01T00:00:00.
    pub const MIN: Self = Self { ticks: 0 };

    /// 9999-12-31T23:59:59.9999999, the last representable instant.
    pub const MAX: Self = Self {
        ticks: 3_155_378_975_999_999_999,
    };

    /// 1970-01-01T00:00:00.
    pub const UNIX_EPOCH: Self = Self {
        ticks: 621_355_968_000_000_000,
    };

    /// Creates a value from a raw tick count.
    #[must_use]
    pub const fn from_ticks(ticks: u64) -> Self {
        Self { ticks }
    }

    /// Returns the raw tick count.
    #[must_use]
    pub const fn ticks(self) -> u64 {
        self.ticks
    }

    /// Converts a system time, truncating to whole ticks.
    ///
    /// Returns `None` if the time falls outside the tick range.
    #[must_use]
    pub fn from_system_time(time: SystemTime) -> Option<Self> {
        let ticks = match time.duration_since(UNIX_EPOCH) {
            Ok(after) => Self::UNIX_EPOCH.ticks.checked_add(duration_to_ticks(after)?)?,
            Err(before) => Self::UNIX_EPOCH
                .ticks
                .checked_sub(duration_to_ticks(before.duration())?)?,
        };
        Some(Self { ticks })
    }

    /// Converts to a system time.
    ///
    /// Returns `None` if the platform cannot represent the instant.
    #[must_use]
    pub fn to_system_time(self) -> Option<SystemTime> {
        let epoch = Self::UNIX_EPOCH.ticks;
        if self.ticks >= epoch {
            UNIX_EPOCH.checked_add(ticks_to_duration(self.ticks - epoch))
        } else {
            UNIX_EPOCH.checked_sub(ticks_to_duration(epoch - self.ticks))
        }
    }
}

/// A signed duration counted in 100-nanosecond ticks.
///
/// Encoded as the two's complement tick count in a fixed64 field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct TimeSpan {
    ticks: i64,
}

impl TimeSpan {
    /// The empty duration.
    pub const ZERO: Self = Self { ticks: 0 };

    /// Creates a value from a raw tick count.
    #[must_use]
    pub const fn from_ticks(ticks: i64) -> Self {
        Self { ticks }
    }

    /// Returns the raw tick count.
    #[must_use]
    pub const fn ticks(self) -> i64 {
        self.ticks
    }

    /// Returns `true` for durations below zero.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.ticks < 0
    }

    /// Converts a duration, truncating to whole ticks.
    ///
    /// Returns `None` if the duration exceeds `i64::MAX` ticks.
    #[must_use]
    pub fn from_duration(duration: Duration) -> Option<Self> {
        let ticks = i64::try_from(duration_to_ticks(duration)?).ok()?;
        Some(Self { ticks })
    }

    /// Converts to a duration, or `None` for negative spans.
    #[must_use]
    pub fn to_duration(self) -> Option<Duration> {
        u64::try_from(self.ticks).ok().map(ticks_to_duration)
    }
}

fn duration_to_ticks(duration: Duration) -> Option<u64> {
    u64::try_from(duration.as_nanos() / NANOS_PER_TICK).ok()
}

fn ticks_to_duration(ticks: u64) -> Duration {
    let nanos = (ticks % TICKS_PER_SECOND) * 100;
    Duration::new(ticks / TICKS_PER_SECOND, nanos as u32)
}

/// Marks a signed integer field for zig-zag varint encoding.
///
/// Plain integers encode at fixed width. Wrapping one in `Optimal` selects the
/// compact form, which is also how enumeration values are written.
///
/// ```
/// use bytestream::{Optimal, Reader, Writer};
///
/// let mut writer = Writer::new();
/// writer.write(&Optimal(-3i32)).unwrap();
/// assert_eq!(writer.as_bytes(), &[5]);
///
/// let bytes = writer.into_bytes();
/// let mut reader = Reader::new(&bytes);
/// assert_eq!(reader.read::<Optimal<i32>>().unwrap(), Optimal(-3));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Optimal<T>(pub T);

impl<T> Optimal<T> {
    /// Unwraps the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> From<T> for Optimal<T> {
    fn from(value: T) -> Self {
        Self(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unix_epoch_matches_system_time() {
        assert_eq!(DateTime::from_system_time(UNIX_EPOCH), Some(DateTime::UNIX_EPOCH));
        assert_eq!(DateTime::UNIX_EPOCH.to_system_time(), Some(UNIX_EPOCH));
    }

    #[test]
    fn system_time_roundtrip_truncates_to_ticks() {
        let time = UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_789);
        let converted = DateTime::from_system_time(time).unwrap();
        assert_eq!(
            converted.ticks() - DateTime::UNIX_EPOCH.ticks(),
            17_000_000_001_234_567
        );
        assert_eq!(
            converted.to_system_time().unwrap(),
            UNIX_EPOCH + Duration::new(1_700_000_000, 123_456_700)
        );
    }

    #[test]
    fn before_epoch() {
        let time = UNIX_EPOCH - Duration::from_secs(1);
        let converted = DateTime::from_system_time(time).unwrap();
        assert_eq!(converted.ticks(), DateTime::UNIX_EPOCH.ticks() - TICKS_PER_SECOND);
    }

    #[test]
    fn timespan_conversions() {
        let span = TimeSpan::from_duration(Duration::from_millis(1500)).unwrap();
        assert_eq!(span.ticks(), 15_000_000);
        assert_eq!(span.to_duration(), Some(Duration::from_millis(1500)));

        let negative = TimeSpan::from_ticks(-1);
        assert!(negative.is_negative());
        assert_eq!(negative.to_duration(), None);
    }

    #[test]
    fn optimal_wraps() {
        let value: Optimal<i64> = 5.into();
        assert_eq!(value.into_inner(), 5);
    }
}
