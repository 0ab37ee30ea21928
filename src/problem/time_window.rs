use jiff::Timestamp;

/// Closed service-time interval. A job may carry several, sorted and
/// disjoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    start: Timestamp,
    end: Timestamp,
}

impl TimeWindow {
    pub fn new(start: Timestamp, end: Timestamp) -> Self {
        assert!(start <= end, "time window must not be inverted");
        TimeWindow { start, end }
    }

    pub fn from_iso(start: &str, end: &str) -> Self {
        TimeWindow::new(
            start.parse().expect("Error parsing ISO timestamp"),
            end.parse().expect("Error parsing ISO timestamp"),
        )
    }

    pub fn start(&self) -> Timestamp {
        self.start
    }

    pub fn end(&self) -> Timestamp {
        self.end
    }

    pub fn contains(&self, time: Timestamp) -> bool {
        self.start <= time && time <= self.end
    }
}
