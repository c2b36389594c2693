//! Rolling Statistics Tracker
//!
//! Running per-entrant and per-team aggregates, updated after each race.
//! One tracker belongs to exactly one assembly run.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Championship points for positions 1..=10
const POINTS_TABLE: [u32; 10] = [25, 18, 15, 12, 10, 8, 6, 4, 2, 1];

/// Average finish reported for an entrant with no results (nominal mid-field)
pub const DEFAULT_AVG_FINISH: f64 = 10.5;

/// Championship points awarded for a finishing position
pub fn points_for_position(position: u32) -> u32 {
    match position {
        1..=10 => POINTS_TABLE[(position - 1) as usize],
        _ => 0,
    }
}

/// Aggregates for a single entrant
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntrantStats {
    pub points: u32,
    pub wins: u32,
    pub podiums: u32,
    /// Never populated: no supplier exposes qualifying results
    pub poles: u32,
    /// Last observed team
    pub team: String,
    pub positions: Vec<u32>,
    pub avg_finish: f64,
}

impl Default for EntrantStats {
    fn default() -> Self {
        Self {
            points: 0,
            wins: 0,
            podiums: 0,
            poles: 0,
            team: String::new(),
            positions: Vec::new(),
            avg_finish: DEFAULT_AVG_FINISH,
        }
    }
}

/// Aggregates for a single team
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStats {
    pub points: u32,
    pub wins: u32,
    pub podiums: u32,
}

/// Per-entrant and per-team running aggregates
#[derive(Debug, Default)]
pub struct RollingStatsTracker {
    entrants: HashMap<String, EntrantStats>,
    teams: HashMap<String, TeamStats>,
}

impl RollingStatsTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one scored result
    ///
    /// Must only be called after every entrant of the race has been read.
    pub fn update(&mut self, entrant_id: &str, team_id: &str, position: u32) {
        let points = points_for_position(position);
        let win = u32::from(position == 1);
        let podium = u32::from((1..=3).contains(&position));

        let entrant = self.entrants.entry(entrant_id.to_string()).or_default();
        entrant.points += points;
        entrant.wins += win;
        entrant.podiums += podium;
        if !team_id.is_empty() {
            entrant.team = team_id.to_string();
        }
        entrant.positions.push(position);
        entrant.avg_finish =
            entrant.positions.iter().map(|&p| p as f64).sum::<f64>() / entrant.positions.len() as f64;

        if !team_id.is_empty() {
            let team = self.teams.entry(team_id.to_string()).or_default();
            team.points += points;
            team.wins += win;
            team.podiums += podium;
        }
    }

    /// Snapshot of an entrant's current aggregates (defaults if unseen)
    pub fn read(&self, entrant_id: &str) -> EntrantStats {
        self.entrants.get(entrant_id).cloned().unwrap_or_default()
    }

    /// Snapshot of a team's current aggregates (zeros if unseen)
    pub fn read_team(&self, team_id: &str) -> TeamStats {
        self.teams.get(team_id).cloned().unwrap_or_default()
    }

    pub fn entrant_count(&self) -> usize {
        self.entrants.len()
    }

    pub fn team_count(&self) -> usize {
        self.teams.len()
    }

    /// Drop all aggregates
    pub fn reset(&mut self) {
        self.entrants.clear();
        self.teams.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_points_table() {
        assert_eq!(points_for_position(1), 25);
        assert_eq!(points_for_position(2), 18);
        assert_eq!(points_for_position(10), 1);
        assert_eq!(points_for_position(11), 0);
        assert_eq!(points_for_position(0), 0);
    }

    #[test]
    fn test_unseen_entrant_defaults() {
        let tracker = RollingStatsTracker::new();
        let stats = tracker.read("99");

        assert_eq!(stats.points, 0);
        assert_eq!(stats.wins, 0);
        assert!(stats.positions.is_empty());
        assert!((stats.avg_finish - 10.5).abs() < 1e-9);
        assert_eq!(tracker.read_team("Nobody"), TeamStats::default());
    }

    #[test]
    fn test_win_updates_entrant_and_team() {
        let mut tracker = RollingStatsTracker::new();
        tracker.update("1", "Red Bull", 1);

        let driver = tracker.read("1");
        assert_eq!(driver.points, 25);
        assert_eq!(driver.wins, 1);
        assert_eq!(driver.podiums, 1);
        assert_eq!(driver.poles, 0);
        assert_eq!(driver.team, "Red Bull");

        let team = tracker.read_team("Red Bull");
        assert_eq!(team.points, 25);
        assert_eq!(team.wins, 1);
        assert_eq!(team.podiums, 1);
    }

    #[test]
    fn test_running_average_and_podiums() {
        let mut tracker = RollingStatsTracker::new();
        tracker.update("44", "Mercedes", 3);
        tracker.update("44", "Mercedes", 12);
        tracker.update("44", "Ferrari", 6);

        let stats = tracker.read("44");
        assert_eq!(stats.points, 15 + 8);
        assert_eq!(stats.wins, 0);
        assert_eq!(stats.podiums, 1);
        assert_eq!(stats.positions, vec![3, 12, 6]);
        assert!((stats.avg_finish - 7.0).abs() < 1e-9);
        assert_eq!(stats.team, "Ferrari");

        assert_eq!(tracker.read_team("Mercedes").points, 15);
        assert_eq!(tracker.read_team("Ferrari").points, 8);
    }

    #[test]
    fn test_team_aggregates_across_drivers() {
        let mut tracker = RollingStatsTracker::new();
        tracker.update("16", "Ferrari", 1);
        tracker.update("55", "Ferrari", 2);

        let team = tracker.read_team("Ferrari");
        assert_eq!(team.points, 43);
        assert_eq!(team.wins, 1);
        assert_eq!(team.podiums, 2);
        assert_eq!(tracker.team_count(), 1);
        assert_eq!(tracker.entrant_count(), 2);
    }

    #[test]
    fn test_empty_team_not_tracked() {
        let mut tracker = RollingStatsTracker::new();
        tracker.update("7", "", 4);

        assert_eq!(tracker.team_count(), 0);
        assert_eq!(tracker.read("7").points, 12);
    }

    #[test]
    fn test_snapshot_is_detached() {
        let mut tracker = RollingStatsTracker::new();
        tracker.update("1", "Red Bull", 2);
        let before = tracker.read("1");
        tracker.update("1", "Red Bull", 1);

        assert_eq!(before.points, 18);
        assert_eq!(tracker.read("1").points, 43);
    }

    #[test]
    fn test_reset() {
        let mut tracker = RollingStatsTracker::new();
        tracker.update("1", "Red Bull", 1);
        tracker.reset();

        assert_eq!(tracker.entrant_count(), 0);
        assert_eq!(tracker.read("1").points, 0);
    }
}
