//! Recency History Resolver
//!
//! Looks up an entrant's most recent finishing positions strictly before a
//! reference date, padded to a fixed window.

use chrono::{DateTime, Utc};

use crate::models::RaceRecord;

/// Number of recent races used as short-term form
pub const RECENT_RACE_WINDOW: usize = 5;

/// Padding value for missing history (nominal mid-field)
pub const HISTORY_PAD_POSITION: u32 = 10;

/// Races already assembled in the current run
///
/// Records are appended in ascending date order as the assembler finishes
/// featurizing them.
#[derive(Debug, Default)]
pub struct RecencyHistory {
    races: Vec<RaceRecord>,
}

impl RecencyHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a featurized race visible to later lookups
    ///
    /// Records without a date are ignored since they can't be ordered.
    pub fn push(&mut self, race: RaceRecord) {
        if race.date.is_some() {
            self.races.push(race);
        }
    }

    /// Most recent positions before `reference_date`, newest first
    ///
    /// Always returns exactly `window` entries, right-padded with
    /// [`HISTORY_PAD_POSITION`].
    pub fn history(&self, entrant_id: &str, reference_date: DateTime<Utc>, window: usize) -> Vec<u32> {
        let mut prior: Vec<(&DateTime<Utc>, &RaceRecord)> = self
            .races
            .iter()
            .filter_map(|r| r.date.as_ref().map(|d| (d, r)))
            .filter(|(d, _)| **d < reference_date)
            .collect();
        prior.sort_by(|a, b| b.0.cmp(a.0));

        let mut positions = Vec::with_capacity(window);
        for (date, race) in prior {
            if positions.len() >= window {
                break;
            }
            debug_assert!(*date < reference_date, "history consulted a race at or after the reference date");
            if let Some(pos) = race.position_of(entrant_id) {
                positions.push(pos);
            }
        }

        positions.resize(window, HISTORY_PAD_POSITION);
        positions
    }

    /// Number of races visible to lookups
    pub fn len(&self) -> usize {
        self.races.len()
    }

    pub fn is_empty(&self) -> bool {
        self.races.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EntrantResult;
    use chrono::TimeZone;

    fn day(d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, d, 15, 0, 0).unwrap()
    }

    fn race(d: u32, round: u32, results: &[(&str, u32)]) -> RaceRecord {
        results.iter().fold(RaceRecord::new(day(d), 2024, round), |r, (id, pos)| {
            r.with_result(EntrantResult::new(*id, "Team", *pos))
        })
    }

    #[test]
    fn test_no_history_is_fully_padded() {
        let history = RecencyHistory::new();
        assert_eq!(history.history("1", day(10), 5), vec![10, 10, 10, 10, 10]);
    }

    #[test]
    fn test_most_recent_first_then_padding() {
        let mut history = RecencyHistory::new();
        history.push(race(1, 1, &[("1", 1)]));
        history.push(race(8, 2, &[("1", 5)]));

        assert_eq!(history.history("1", day(15), 5), vec![5, 1, 10, 10, 10]);
    }

    #[test]
    fn test_excludes_same_and_later_dates() {
        let mut history = RecencyHistory::new();
        history.push(race(1, 1, &[("1", 2)]));
        history.push(race(8, 2, &[("1", 3)]));
        history.push(race(15, 3, &[("1", 4)]));

        assert_eq!(history.history("1", day(8), 5), vec![2, 10, 10, 10, 10]);
        assert_eq!(history.history("1", day(1), 5), vec![10, 10, 10, 10, 10]);
    }

    #[test]
    fn test_window_truncates() {
        let mut history = RecencyHistory::new();
        for (i, pos) in [7, 6, 5, 4, 3, 2, 1].iter().enumerate() {
            history.push(race(i as u32 + 1, i as u32 + 1, &[("1", *pos)]));
        }

        assert_eq!(history.history("1", day(20), 5), vec![1, 2, 3, 4, 5]);
        assert_eq!(history.history("1", day(20), 3), vec![1, 2, 3]);
    }

    #[test]
    fn test_skips_races_without_entrant_or_unscored() {
        let mut history = RecencyHistory::new();
        history.push(race(1, 1, &[("1", 4)]));
        history.push(race(8, 2, &[("44", 1)]));
        history.push(race(15, 3, &[("1", 21)]));

        assert_eq!(history.history("1", day(20), 5), vec![4, 10, 10, 10, 10]);
    }

    #[test]
    fn test_unsorted_insertion_still_newest_first() {
        let mut history = RecencyHistory::new();
        history.push(race(8, 2, &[("1", 5)]));
        history.push(race(1, 1, &[("1", 1)]));

        assert_eq!(history.history("1", day(15), 2), vec![5, 1]);
    }

    #[test]
    fn test_undated_records_ignored() {
        let mut history = RecencyHistory::new();
        let mut undated = race(1, 1, &[("1", 1)]);
        undated.date = None;
        history.push(undated);

        assert!(history.is_empty());
    }
}
