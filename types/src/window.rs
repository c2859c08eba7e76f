use chrono::{DateTime, TimeDelta, Utc};

/// The `[start, start + length]` time interval of one archived broadcast.
///
/// Used to filter a newest-first message stream down to the messages sent
/// during that broadcast. Both boundary instants are inside the window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StreamWindow {
    start: DateTime<Utc>,
    length: TimeDelta,
}

/// Where a timestamp falls relative to a [`StreamWindow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPosition {
    /// Newer than the broadcast end. In a newest-first stream, later
    /// messages may still fall inside the window.
    AfterEnd,
    /// Inside the window; `offset` is the distance from the broadcast start.
    Inside { offset: TimeDelta },
    /// Older than the broadcast start. In a newest-first stream, nothing
    /// after this can match.
    BeforeStart,
}

impl StreamWindow {
    #[must_use]
    pub fn new(start: DateTime<Utc>, length_seconds: u64) -> Self {
        Self {
            start,
            length: TimeDelta::seconds(length_seconds as i64),
        }
    }

    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.start + self.length
    }

    #[must_use]
    pub fn classify(&self, at: DateTime<Utc>) -> WindowPosition {
        if at > self.end() {
            WindowPosition::AfterEnd
        } else if at >= self.start {
            WindowPosition::Inside { offset: at - self.start }
        } else {
            WindowPosition::BeforeStart
        }
    }

    /// Fraction of the window that lies at or above `offset`, in `[0, 1]`.
    ///
    /// The message stream pages newest-first, so this decreases toward zero
    /// as the fetch walks back to the broadcast start, which makes it a
    /// natural progress value.
    #[must_use]
    pub fn progress(&self, offset: TimeDelta) -> f64 {
        let length = self.length.num_seconds();
        if length <= 0 {
            return 1.0;
        }
        let remaining = (length - offset.num_seconds()) as f64 / length as f64;
        remaining.clamp(0.0, 1.0)
    }
}

/// Format an in-window offset as a `HH:MM:SS` broadcast timecode.
#[must_use]
pub fn timecode(offset: TimeDelta) -> String {
    let total = offset.num_seconds().max(0);
    format!(
        "{:02}:{:02}:{:02}",
        total / 3600,
        (total % 3600) / 60,
        total % 60
    )
}
