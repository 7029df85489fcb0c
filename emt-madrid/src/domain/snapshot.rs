//! In-memory state of one monitored stop.

use std::collections::BTreeMap;

use serde::Serialize;

use super::line::{ArrivalEstimate, LineRecord};
use super::stop::StopId;

/// WGS84 position of a stop.
///
/// EMT sends GeoJSON points, so the wire order is `[longitude, latitude]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Coordinates {
    pub longitude: f64,
    pub latitude: f64,
}

/// Stop metadata parsed from a stop-info response, ready to be applied.
#[derive(Debug, Clone, PartialEq)]
pub struct StopDetails {
    pub name: String,
    pub coordinates: Coordinates,
    pub address: String,
    pub lines: BTreeMap<String, LineRecord>,
}

/// Latest known state of a stop.
///
/// Created empty when the client is built; metadata is filled in by a
/// stop-info fetch and the per-line estimates are replaced on every
/// arrivals poll.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StopSnapshot {
    stop_id: StopId,
    name: Option<String>,
    coordinates: Option<Coordinates>,
    address: Option<String>,
    lines: BTreeMap<String, LineRecord>,
}

impl StopSnapshot {
    /// Create an empty snapshot for the given stop.
    pub fn new(stop_id: StopId) -> Self {
        Self {
            stop_id,
            name: None,
            coordinates: None,
            address: None,
            lines: BTreeMap::new(),
        }
    }

    pub fn stop_id(&self) -> StopId {
        self.stop_id
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        self.coordinates
    }

    pub fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }

    /// All lines at the stop, keyed by label.
    pub fn lines(&self) -> &BTreeMap<String, LineRecord> {
        &self.lines
    }

    /// Look up a line by label.
    pub fn line(&self, label: &str) -> Option<&LineRecord> {
        self.lines.get(label)
    }

    /// Replace metadata and the line table with freshly parsed details.
    pub fn apply_details(&mut self, details: StopDetails) {
        self.name = Some(details.name);
        self.coordinates = Some(details.coordinates);
        self.address = Some(details.address);
        self.lines = details.lines;
    }

    /// Replace the estimates of every known line with `estimates`.
    ///
    /// Lines missing from `estimates` end up empty. Estimates for lines the
    /// stop does not know about are dropped. Returns how many were applied.
    pub fn apply_arrivals(&mut self, estimates: impl IntoIterator<Item = ArrivalEstimate>) -> usize {
        for record in self.lines.values_mut() {
            record.clear_estimates();
        }

        let mut applied = 0;
        for estimate in estimates {
            if let Some(record) = self.lines.get_mut(&estimate.line) {
                record.push_estimate(estimate.minutes, estimate.distance);
                applied += 1;
            }
        }
        applied
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cibeles() -> StopDetails {
        let mut lines = BTreeMap::new();
        lines.insert("5".to_string(), LineRecord::new("CHAMARTIN", "SOL/SEVILLA"));
        lines.insert("27".to_string(), LineRecord::new("PLAZA CASTILLA", "EMBAJADORES"));
        lines.insert("N26".to_string(), LineRecord::new("ALONSO MARTINEZ", "ALUCHE"));
        StopDetails {
            name: "Cibeles-Casa de América".to_string(),
            coordinates: Coordinates {
                longitude: -3.69214452424823,
                latitude: 40.4203613685499,
            },
            address: "Pº de Recoletos, 2 (Pza. de Cibeles)".to_string(),
            lines,
        }
    }

    fn estimate(line: &str, minutes: u32, distance: i64) -> ArrivalEstimate {
        ArrivalEstimate {
            line: line.to_string(),
            minutes,
            distance: Some(distance),
        }
    }

    #[test]
    fn new_snapshot_is_empty() {
        let snapshot = StopSnapshot::new(StopId::new(72).unwrap());
        assert_eq!(snapshot.stop_id().get(), 72);
        assert_eq!(snapshot.name(), None);
        assert_eq!(snapshot.coordinates(), None);
        assert_eq!(snapshot.address(), None);
        assert!(snapshot.lines().is_empty());
    }

    #[test]
    fn apply_details_fills_metadata() {
        let mut snapshot = StopSnapshot::new(StopId::new(72).unwrap());
        snapshot.apply_details(cibeles());

        assert_eq!(snapshot.name(), Some("Cibeles-Casa de América"));
        assert_eq!(
            snapshot.address(),
            Some("Pº de Recoletos, 2 (Pza. de Cibeles)")
        );
        assert_eq!(
            snapshot.lines().keys().collect::<Vec<_>>(),
            vec!["27", "5", "N26"]
        );
    }

    #[test]
    fn arrivals_are_grouped_by_line() {
        let mut snapshot = StopSnapshot::new(StopId::new(72).unwrap());
        snapshot.apply_details(cibeles());

        let applied = snapshot.apply_arrivals(vec![
            estimate("27", 3, 674),
            estimate("5", 5, 1777),
            estimate("27", 25, 1777),
        ]);

        assert_eq!(applied, 3);
        assert_eq!(snapshot.line("27").unwrap().arrivals, vec![3, 25]);
        assert_eq!(
            snapshot.line("27").unwrap().distances,
            vec![Some(674), Some(1777)]
        );
        assert_eq!(snapshot.line("5").unwrap().arrivals, vec![5]);
        assert!(snapshot.line("N26").unwrap().arrivals.is_empty());
    }

    #[test]
    fn arrivals_replace_previous_poll() {
        let mut snapshot = StopSnapshot::new(StopId::new(72).unwrap());
        snapshot.apply_details(cibeles());

        snapshot.apply_arrivals(vec![estimate("27", 3, 674), estimate("N26", 40, 9000)]);
        snapshot.apply_arrivals(vec![estimate("27", 1, 120)]);

        assert_eq!(snapshot.line("27").unwrap().arrivals, vec![1]);
        assert_eq!(snapshot.line("27").unwrap().distances, vec![Some(120)]);
        assert!(snapshot.line("N26").unwrap().arrivals.is_empty());
        assert!(snapshot.line("N26").unwrap().distances.is_empty());
    }

    #[test]
    fn unknown_lines_are_dropped() {
        let mut snapshot = StopSnapshot::new(StopId::new(72).unwrap());
        snapshot.apply_details(cibeles());

        let applied = snapshot.apply_arrivals(vec![estimate("150", 4, 800)]);

        assert_eq!(applied, 0);
        assert!(snapshot.line("150").is_none());
        assert_eq!(snapshot.lines().len(), 3);
    }
}
