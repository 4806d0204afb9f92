use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TimeError {
    #[error("Time {0:?} does not split into HH:MM:SS")]
    Malformed(String),
}

/// Seconds after midnight of the service day.
/// Hours may exceed 23 for trips running past midnight,
/// so the value is never reduced modulo one day.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct ServiceTime(u32);

impl From<u32> for ServiceTime {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl ServiceTime {
    pub const fn from_seconds(secs: u32) -> Self {
        Self(secs)
    }

    pub const fn as_seconds(&self) -> u32 {
        self.0
    }

    /// Signed elapsed seconds since an earlier time.
    /// Negative when the clock runs backwards between two rows.
    pub const fn seconds_since(&self, earlier: ServiceTime) -> i64 {
        self.0 as i64 - earlier.0 as i64
    }

    pub fn to_hms_string(&self) -> String {
        let h = self.0 / 3600;
        let m = (self.0 % 3600) / 60;
        let s = self.0 % 60;
        format!("{:02}:{:02}:{:02}", h, m, s)
    }

    pub fn parse(time: &str) -> Result<Self, TimeError> {
        const HOUR_TO_SEC: u32 = 60 * 60;
        const MINUTE_TO_SEC: u32 = 60;
        let malformed = || TimeError::Malformed(time.to_string());
        let mut split = time.split(':');
        let hours: u32 = split
            .next()
            .and_then(|val| val.trim().parse().ok())
            .ok_or_else(malformed)?;
        let minutes: u32 = split
            .next()
            .and_then(|val| val.trim().parse().ok())
            .ok_or_else(malformed)?;
        let seconds: u32 = split
            .next()
            .and_then(|val| val.trim().parse().ok())
            .ok_or_else(malformed)?;
        if split.next().is_some() {
            return Err(malformed());
        }
        Ok(Self(hours * HOUR_TO_SEC + minutes * MINUTE_TO_SEC + seconds))
    }

    /// Bulk form of [`ServiceTime::parse`] with identical semantics per element.
    pub fn parse_all<'a, I>(times: I) -> Result<Vec<ServiceTime>, TimeError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        times.into_iter().map(Self::parse).collect()
    }
}

#[test]
fn parse_unparse_1() {
    let time = "00:00:00";
    let stime = ServiceTime::parse(time).unwrap();
    assert_eq!(time, stime.to_hms_string())
}

#[test]
fn parse_unparse_2() {
    let time = "12:30:30";
    let stime = ServiceTime::parse(time).unwrap();
    assert_eq!(time, stime.to_hms_string())
}

#[test]
fn parse_unparse_3() {
    let time = "25:10:00";
    let stime = ServiceTime::parse(time).unwrap();
    assert_eq!(time, stime.to_hms_string())
}

#[test]
fn valid_time_test_1() {
    let time = "00:00:30";
    assert_eq!(ServiceTime::parse(time).unwrap().as_seconds(), 30);
}

#[test]
fn valid_time_test_2() {
    let time = "08:05:03";
    assert_eq!(ServiceTime::parse(time).unwrap().as_seconds(), 29103);
}

#[test]
fn past_midnight_test() {
    let time = "25:10:00";
    assert_eq!(ServiceTime::parse(time).unwrap().as_seconds(), 90600);
}

#[test]
fn invalid_time_test_1() {
    let time = "00:00:0a";
    assert!(ServiceTime::parse(time).is_err())
}

#[test]
fn invalid_time_test_2() {
    let time = "00:00";
    assert!(ServiceTime::parse(time).is_err())
}

#[test]
fn invalid_time_test_3() {
    let time = "00:00:00:00";
    assert!(ServiceTime::parse(time).is_err())
}

#[test]
fn invalid_time_test_4() {
    let time = "-01:00:00";
    assert!(ServiceTime::parse(time).is_err())
}

#[test]
fn seconds_since_test() {
    let arrival = ServiceTime::from_seconds(29100);
    let departure = ServiceTime::from_seconds(28800);
    assert_eq!(arrival.seconds_since(departure), 300);
    assert_eq!(departure.seconds_since(arrival), -300);
}

#[test]
fn parse_all_test() {
    let times = ServiceTime::parse_all(["08:00:00", "24:00:00"]).unwrap();
    assert_eq!(times[0].as_seconds(), 28800);
    assert_eq!(times[1].as_seconds(), 86400);
    assert!(ServiceTime::parse_all(["08:00:00", "oops"]).is_err());
}
