//! Bounded date navigation for the history browser.
//!
//! `HistoryNavigator` is a pure state machine: stepping or jumping hands back
//! a `LoadTicket`, the caller fetches the day however it likes and feeds the
//! outcome to `apply`. Each ticket carries a generation number so a response
//! that arrives after the user has already moved on is dropped instead of
//! overwriting the newer day.

use crate::core::{DayKey, EntryDraft};
use crate::store::DateRange;
use std::time::{Duration, Instant};

/// How long the page-flip indicator stays visible after a navigation.
pub const FLIP_FEEDBACK_TTL: Duration = Duration::from_millis(600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepDirection {
    Back,
    Forward,
}

/// Permission to load one day. Stale tickets (superseded by a later
/// navigation) are rejected by `apply`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    date: DayKey,
}

impl LoadTicket {
    pub fn date(&self) -> DayKey {
        self.date
    }
}

/// What the browser currently shows for the selected date.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum DayView {
    #[default]
    Loading,
    Loaded(EntryDraft),
    /// The load failed; the message is for the status line.
    Unavailable(String),
}

pub struct HistoryNavigator {
    bounds: DateRange,
    current: DayKey,
    generation: u64,
    view: DayView,
    flip: Option<(StepDirection, Instant)>,
}

impl HistoryNavigator {
    /// Opens at the newest navigable date and immediately wants it loaded.
    pub fn new(bounds: DateRange) -> (Self, LoadTicket) {
        let current = bounds.max();
        let navigator = Self {
            bounds,
            current,
            generation: 0,
            view: DayView::Loading,
            flip: None,
        };
        let ticket = navigator.ticket();
        (navigator, ticket)
    }

    fn ticket(&self) -> LoadTicket {
        LoadTicket {
            generation: self.generation,
            date: self.current,
        }
    }

    fn begin_load(&mut self, date: DayKey) -> LoadTicket {
        self.current = date;
        self.generation += 1;
        self.view = DayView::Loading;
        self.ticket()
    }

    /// Moves one day back or forward. Refusal at a bound is a silent no-op.
    pub fn step(&mut self, direction: StepDirection, now: Instant) -> Option<LoadTicket> {
        let delta = match direction {
            StepDirection::Back => -1,
            StepDirection::Forward => 1,
        };
        let target = self.current.offset(delta)?;
        if !self.bounds.contains(target) {
            return None;
        }
        self.flip = Some((direction, now));
        Some(self.begin_load(target))
    }

    /// Jumps to an arbitrary in-bounds date. Jumping to the current date is
    /// allowed and reloads it (used after a delete).
    pub fn jump(&mut self, target: DayKey, now: Instant) -> Option<LoadTicket> {
        if !self.bounds.contains(target) {
            return None;
        }
        if target != self.current {
            let direction = if target < self.current {
                StepDirection::Back
            } else {
                StepDirection::Forward
            };
            self.flip = Some((direction, now));
        }
        Some(self.begin_load(target))
    }

    /// Feeds a load outcome back in. Returns false when the ticket is stale
    /// and the outcome was discarded.
    pub fn apply(&mut self, ticket: LoadTicket, outcome: Result<EntryDraft, String>) -> bool {
        if ticket.generation != self.generation || ticket.date != self.current {
            return false;
        }
        self.view = match outcome {
            Ok(draft) => DayView::Loaded(draft),
            Err(message) => DayView::Unavailable(message),
        };
        true
    }

    /// The flip indicator to render, if the last navigation is still fresh.
    pub fn flip_feedback(&mut self, now: Instant) -> Option<StepDirection> {
        match self.flip {
            Some((direction, at)) if now.duration_since(at) < FLIP_FEEDBACK_TTL => Some(direction),
            Some(_) => {
                self.flip = None;
                None
            }
            None => None,
        }
    }

    pub fn current_date(&self) -> DayKey {
        self.current
    }

    pub fn view(&self) -> &DayView {
        &self.view
    }

    pub fn bounds(&self) -> DateRange {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(raw: &str) -> DayKey {
        DayKey::parse(raw).unwrap()
    }

    fn bounds(min: &str, max: &str) -> DateRange {
        DateRange::from_dates(&[day(min)], day(max))
    }

    fn loaded(notes: &str) -> Result<EntryDraft, String> {
        Ok(EntryDraft {
            notes: notes.to_string(),
            spent_items: vec![],
        })
    }

    #[test]
    fn opens_at_the_newest_date() {
        let (nav, ticket) = HistoryNavigator::new(bounds("2025-09-01", "2025-09-10"));
        assert_eq!(nav.current_date(), day("2025-09-10"));
        assert_eq!(ticket.date(), day("2025-09-10"));
        assert_eq!(*nav.view(), DayView::Loading);
    }

    #[test]
    fn steps_stay_inside_the_bounds() {
        let (mut nav, _) = HistoryNavigator::new(bounds("2025-09-09", "2025-09-10"));
        let now = Instant::now();

        assert!(nav.step(StepDirection::Forward, now).is_none());
        assert_eq!(nav.current_date(), day("2025-09-10"));

        let ticket = nav.step(StepDirection::Back, now).unwrap();
        assert_eq!(ticket.date(), day("2025-09-09"));

        // At the lower bound now; another step back is refused silently.
        assert!(nav.step(StepDirection::Back, now).is_none());
        assert_eq!(nav.current_date(), day("2025-09-09"));
    }

    #[test]
    fn stale_outcome_is_dropped() {
        let (mut nav, first) = HistoryNavigator::new(bounds("2025-09-01", "2025-09-10"));
        let second = nav.step(StepDirection::Back, Instant::now()).unwrap();

        assert!(!nav.apply(first, loaded("old day")));
        assert_eq!(*nav.view(), DayView::Loading);

        assert!(nav.apply(second, loaded("new day")));
        assert_eq!(
            *nav.view(),
            DayView::Loaded(EntryDraft {
                notes: "new day".into(),
                spent_items: vec![],
            })
        );
    }

    #[test]
    fn failed_load_shows_unavailable() {
        let (mut nav, ticket) = HistoryNavigator::new(bounds("2025-09-01", "2025-09-10"));
        assert!(nav.apply(ticket, Err("connection refused".into())));
        assert_eq!(*nav.view(), DayView::Unavailable("connection refused".into()));
    }

    #[test]
    fn jump_rejects_out_of_bounds_and_reloads_same_date() {
        let (mut nav, _) = HistoryNavigator::new(bounds("2025-09-01", "2025-09-10"));
        let now = Instant::now();

        assert!(nav.jump(day("2025-08-31"), now).is_none());
        assert!(nav.jump(day("2025-09-11"), now).is_none());

        let reload = nav.jump(day("2025-09-10"), now).unwrap();
        assert_eq!(reload.date(), day("2025-09-10"));
        assert_eq!(*nav.view(), DayView::Loading);
    }

    #[test]
    fn flip_feedback_expires() {
        let (mut nav, _) = HistoryNavigator::new(bounds("2025-09-01", "2025-09-10"));
        let start = Instant::now();
        nav.step(StepDirection::Back, start).unwrap();

        assert_eq!(nav.flip_feedback(start), Some(StepDirection::Back));
        assert_eq!(
            nav.flip_feedback(start + Duration::from_millis(599)),
            Some(StepDirection::Back)
        );
        assert_eq!(nav.flip_feedback(start + FLIP_FEEDBACK_TTL), None);
    }

    #[test]
    fn jump_direction_matches_the_date_comparison() {
        let (mut nav, _) = HistoryNavigator::new(bounds("2025-09-01", "2025-09-10"));
        let now = Instant::now();

        nav.jump(day("2025-09-03"), now).unwrap();
        assert_eq!(nav.flip_feedback(now), Some(StepDirection::Back));

        nav.jump(day("2025-09-08"), now).unwrap();
        assert_eq!(nav.flip_feedback(now), Some(StepDirection::Forward));
    }
}
