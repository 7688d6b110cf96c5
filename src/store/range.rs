use crate::core::DayKey;

/// Navigable date interval for the history browser.
///
/// Derived from the owner's stored dates when the browser opens, not kept
/// continuously live; the staleness window is bounded by the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    min: DayKey,
    max: DayKey,
}

impl DateRange {
    /// `min` is the earliest stored date, or `today` when nothing is stored.
    /// `max` is always `today`: the browser never navigates into the future.
    pub fn from_dates(dates: &[DayKey], today: DayKey) -> Self {
        let min = dates.first().copied().unwrap_or(today);
        Self { min, max: today }
    }

    pub fn min(&self) -> DayKey {
        self.min
    }

    pub fn max(&self) -> DayKey {
        self.max
    }

    pub fn contains(&self, date: DayKey) -> bool {
        self.min <= date && date <= self.max
    }
}
