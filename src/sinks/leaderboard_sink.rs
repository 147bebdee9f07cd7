//! LeaderboardModel - live ranking by race distance

use std::cmp::Ordering;

use crate::error::SinkError;
use crate::session::types::SessionInfo;
use crate::sinks::FrameSink;
use crate::types::{DriverCode, Frame, TyreCompound};

/// One row of the leaderboard
#[derive(Debug, Clone, PartialEq)]
pub struct LeaderboardEntry {
    /// 1-based position
    pub position: usize,
    pub code: DriverCode,
    pub race_distance: f64,
    /// Distance behind the leader, 0 for the leader
    pub gap_to_leader: f64,
    pub lap: u32,
    pub tyre: TyreCompound,
}

/// Rank the drivers of a frame: race distance descending, ties broken by
/// driver code ascending so the order is stable between frames.
pub fn rank(frame: &Frame) -> Vec<LeaderboardEntry> {
    let mut entries: Vec<LeaderboardEntry> = frame
        .drivers
        .iter()
        .map(|(code, state)| LeaderboardEntry {
            position: 0,
            code: code.clone(),
            race_distance: state.race_distance,
            gap_to_leader: 0.0,
            lap: state.lap,
            tyre: state.tyre_compound,
        })
        .collect();
    entries.sort_by(compare_entries);

    let leader = entries.first().map(|e| e.race_distance).unwrap_or(0.0);
    for (i, entry) in entries.iter_mut().enumerate() {
        entry.position = i + 1;
        entry.gap_to_leader = leader - entry.race_distance;
    }
    entries
}

/// Ordering used by [`rank`]
pub fn compare_entries(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.race_distance
        .total_cmp(&a.race_distance)
        .then_with(|| a.code.cmp(&b.code))
}

/// Ranking for the most recent frame
#[derive(Debug, Default)]
pub struct LeaderboardModel {
    entries: Vec<LeaderboardEntry>,
    frame_index: Option<usize>,
}

impl LeaderboardModel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[LeaderboardEntry] {
        &self.entries
    }

    pub fn leader(&self) -> Option<&LeaderboardEntry> {
        self.entries.first()
    }

    /// Position of a driver, if ranked
    pub fn position_of(&self, code: &str) -> Option<usize> {
        self.entries
            .iter()
            .find(|e| e.code == code)
            .map(|e| e.position)
    }

    pub fn frame_index(&self) -> Option<usize> {
        self.frame_index
    }

    pub fn update(&mut self, frame: &Frame) {
        self.entries = rank(frame);
        self.frame_index = Some(frame.index);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.frame_index = None;
    }
}

impl FrameSink for LeaderboardModel {
    fn name(&self) -> &str {
        "LeaderboardModel"
    }

    fn on_frame(&mut self, frame: &Frame) -> Result<(), SinkError> {
        self.update(frame);
        Ok(())
    }

    fn on_session(&mut self, _session: &SessionInfo) {
        self.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DriverState;
    use std::time::Duration;

    fn state(dist: f64) -> DriverState {
        DriverState {
            x: 0.0,
            y: 0.0,
            speed: 0.0,
            gear: 0,
            throttle: 0.0,
            brake: 0.0,
            drs_active: false,
            tyre_compound: TyreCompound::Medium,
            race_distance: dist,
            lap: 1,
        }
    }

    #[test]
    fn test_rank_ties_broken_by_code() {
        let frame = Frame::new(0, Duration::ZERO)
            .with_driver("A", state(10.0))
            .with_driver("C", state(20.0))
            .with_driver("B", state(20.0));

        let ranking = rank(&frame);
        let codes: Vec<&str> = ranking.iter().map(|e| e.code.as_str()).collect();
        assert_eq!(codes, vec!["B", "C", "A"]);
        assert_eq!(ranking[0].position, 1);
        assert_eq!(ranking[2].gap_to_leader, 10.0);
    }

    #[test]
    fn test_rank_empty_frame() {
        assert!(rank(&Frame::new(0, Duration::ZERO)).is_empty());
    }

    #[test]
    fn test_model_tracks_latest_frame() {
        let mut model = LeaderboardModel::new();
        model.update(
            &Frame::new(3, Duration::ZERO)
                .with_driver("HAM", state(500.0))
                .with_driver("RUS", state(900.0)),
        );
        assert_eq!(model.leader().map(|e| e.code.as_str()), Some("RUS"));
        assert_eq!(model.position_of("HAM"), Some(2));
        assert_eq!(model.frame_index(), Some(3));

        model.clear();
        assert!(model.entries().is_empty());
    }

    #[test]
    fn test_compare_entries_matches_rank() {
        let frame = Frame::new(0, Duration::ZERO)
            .with_driver("X", state(1.0))
            .with_driver("Y", state(3.0));
        let mut entries = rank(&frame);
        entries.reverse();
        entries.sort_by(compare_entries);
        assert_eq!(entries[0].code, "Y");
    }
}
