use std::time::{Duration, SystemTime};

/// An expiration for a stored entry.
///
/// Every form is normalized to a number of seconds relative to now before it is
/// used. Zero or negative means the entry is already expired.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ttl {
    Seconds(i64),
    Interval(Duration),
    At(SystemTime),
}

impl Ttl {
    pub fn relative_seconds(&self) -> i64 {
        match *self {
            Ttl::Seconds(secs) => secs,
            Ttl::Interval(d) => duration_seconds(d),
            Ttl::At(at) => match at.duration_since(SystemTime::now()) {
                Ok(ahead) => duration_seconds(ahead),
                Err(e) => -duration_seconds(e.duration()),
            },
        }
    }
}

// rounds up so a sub-second ttl still stores
fn duration_seconds(d: Duration) -> i64 {
    let secs = d.as_secs() + u64::from(d.subsec_nanos() > 0);
    i64::try_from(secs).unwrap_or(i64::MAX)
}

/// Normalizes an optional ttl into optional relative seconds.
pub fn normalize(ttl: Option<Ttl>) -> Option<i64> {
    ttl.map(|t| t.relative_seconds())
}

/// The transport ttl for a normalized, positive ttl.
pub(crate) fn transport_ttl(secs: Option<i64>) -> Option<u32> {
    secs.map(|s| u32::try_from(s).unwrap_or(u32::MAX))
}

impl From<i64> for Ttl {
    fn from(secs: i64) -> Self {
        Ttl::Seconds(secs)
    }
}

impl From<Duration> for Ttl {
    fn from(d: Duration) -> Self {
        Ttl::Interval(d)
    }
}

impl From<SystemTime> for Ttl {
    fn from(at: SystemTime) -> Self {
        Ttl::At(at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intervals_round_up() {
        assert_eq!(Ttl::Interval(Duration::from_millis(1)).relative_seconds(), 1);
        assert_eq!(Ttl::Interval(Duration::from_secs(5)).relative_seconds(), 5);
        assert_eq!(Ttl::Interval(Duration::ZERO).relative_seconds(), 0);
    }

    #[test]
    fn points_in_time() {
        let past = SystemTime::now() - Duration::from_secs(60);
        assert!(Ttl::At(past).relative_seconds() <= -60);

        let future = SystemTime::now() + Duration::from_secs(120);
        let secs = Ttl::At(future).relative_seconds();
        assert!(secs > 118 && secs <= 120);
    }

    #[test]
    fn normalize_keeps_absence() {
        assert_eq!(normalize(None), None);
        assert_eq!(normalize(Some(Ttl::Seconds(-3))), Some(-3));
        assert_eq!(transport_ttl(Some(i64::MAX)), Some(u32::MAX));
    }

    #[test]
    fn conversions() {
        assert_eq!(Ttl::from(5i64), Ttl::Seconds(5));
        assert_eq!(
            Ttl::from(Duration::from_secs(5)),
            Ttl::Interval(Duration::from_secs(5))
        );
        let at = SystemTime::UNIX_EPOCH;
        assert_eq!(Ttl::from(at), Ttl::At(at));
    }
}
