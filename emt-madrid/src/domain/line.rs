//! Per-line records and the arithmetic around arrival estimates.

use serde::Serialize;

/// Arrival estimates are reported in minutes, capped at this value.
///
/// EMT returns very large estimates (e.g. `999999`) for buses that have not
/// started their trip yet; everything beyond the cap is shown as the cap.
pub const MAX_ARRIVAL_MINUTES: u32 = 45;

/// Convert an upstream estimate in seconds to whole minutes.
///
/// Truncates towards zero and caps at [`MAX_ARRIVAL_MINUTES`]. Negative
/// estimates (bus already at the stop) count as zero.
///
/// ```
/// use emt_madrid::domain::arrival_minutes;
///
/// assert_eq!(arrival_minutes(233), 3);
/// assert_eq!(arrival_minutes(1556), 25);
/// assert_eq!(arrival_minutes(999999), 45);
/// ```
pub fn arrival_minutes(estimate_secs: i64) -> u32 {
    let minutes = estimate_secs.max(0) / 60;
    minutes.min(i64::from(MAX_ARRIVAL_MINUTES)) as u32
}

/// Resolve the direction flag of a line into `(destination, origin)`.
///
/// Both upstream schemas describe a line by its two terminal names and a flag
/// saying which one the buses at this stop are heading to. Flag `"A"` means
/// the bus heads to `side_a`; anything else means it heads to `side_b`.
pub fn resolve_direction(direction: &str, side_a: &str, side_b: &str) -> (String, String) {
    if direction == "A" {
        (side_a.to_string(), side_b.to_string())
    } else {
        (side_b.to_string(), side_a.to_string())
    }
}

/// A single arrival estimate, already converted to minutes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrivalEstimate {
    /// Line label the estimate belongs to (e.g. "27").
    pub line: String,
    /// Minutes until the bus reaches the stop (capped).
    pub minutes: u32,
    /// Distance of the bus to the stop in meters, if reported.
    pub distance: Option<i64>,
}

/// Everything known about one line at one stop.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct LineRecord {
    /// Terminal the buses at this stop are heading to.
    pub destination: String,
    /// Terminal the buses at this stop are coming from.
    pub origin: String,
    /// Maximum scheduled headway in minutes (detail endpoint only).
    pub max_freq: Option<u32>,
    /// Minimum scheduled headway in minutes (detail endpoint only).
    pub min_freq: Option<u32>,
    /// First service of the day, "HH:MM".
    pub start_time: Option<String>,
    /// Last service of the day, "HH:MM".
    pub end_time: Option<String>,
    /// Day type the schedule applies to (e.g. "LA", "FE").
    pub day_type: Option<String>,
    /// Upcoming arrivals in minutes, soonest first.
    pub arrivals: Vec<u32>,
    /// Distance to the stop in meters, index-aligned with `arrivals`.
    pub distances: Vec<Option<i64>>,
}

impl LineRecord {
    /// Create a record with only the directional fields set.
    pub fn new(destination: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            destination: destination.into(),
            origin: origin.into(),
            ..Default::default()
        }
    }

    /// The next two arrivals, padded with `None`.
    pub fn arrival_pair(&self) -> (Option<u32>, Option<u32>) {
        (
            self.arrivals.first().copied(),
            self.arrivals.get(1).copied(),
        )
    }

    /// Drop all estimates from the previous poll.
    pub fn clear_estimates(&mut self) {
        self.arrivals.clear();
        self.distances.clear();
    }

    /// Append one estimate, keeping arrivals and distances aligned.
    pub fn push_estimate(&mut self, minutes: u32, distance: Option<i64>) {
        self.arrivals.push(minutes);
        self.distances.push(distance);
    }
}

/// Presentation view of a line.
///
/// Unlike [`LineRecord`] every field is optional, so a line that does not
/// exist at the stop can still be rendered as [`LineInfo::placeholder`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineInfo {
    pub destination: Option<String>,
    pub origin: Option<String>,
    pub max_freq: Option<u32>,
    pub min_freq: Option<u32>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub day_type: Option<String>,
    /// Never empty: a line without estimates shows a single `None`.
    pub distance: Vec<Option<i64>>,
    pub arrivals: Vec<Option<u32>>,
}

impl LineInfo {
    /// All-null view used for lines unknown at the stop.
    pub fn placeholder() -> Self {
        Self {
            destination: None,
            origin: None,
            max_freq: None,
            min_freq: None,
            start_time: None,
            end_time: None,
            day_type: None,
            distance: vec![None],
            arrivals: vec![None, None],
        }
    }

    /// Distance of the next bus, if any.
    pub fn next_distance(&self) -> Option<i64> {
        self.distance.first().copied().flatten()
    }
}

impl From<&LineRecord> for LineInfo {
    fn from(record: &LineRecord) -> Self {
        let distance = if record.distances.is_empty() {
            vec![None]
        } else {
            record.distances.clone()
        };

        Self {
            destination: Some(record.destination.clone()),
            origin: Some(record.origin.clone()),
            max_freq: record.max_freq,
            min_freq: record.min_freq,
            start_time: record.start_time.clone(),
            end_time: record.end_time.clone(),
            day_type: record.day_type.clone(),
            distance,
            arrivals: record.arrivals.iter().copied().map(Some).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn minutes_truncate_and_cap() {
        assert_eq!(arrival_minutes(0), 0);
        assert_eq!(arrival_minutes(59), 0);
        assert_eq!(arrival_minutes(60), 1);
        assert_eq!(arrival_minutes(345), 5);
        assert_eq!(arrival_minutes(45 * 60), 45);
        assert_eq!(arrival_minutes(46 * 60), 45);
        assert_eq!(arrival_minutes(-120), 0);
    }

    #[test]
    fn direction_a_heads_to_side_a() {
        let (dest, origin) = resolve_direction("A", "ALONSO MARTINEZ", "ALUCHE");
        assert_eq!(dest, "ALONSO MARTINEZ");
        assert_eq!(origin, "ALUCHE");
    }

    #[test]
    fn direction_b_heads_to_side_b() {
        let (dest, origin) = resolve_direction("B", "EMBAJADORES", "PLAZA CASTILLA");
        assert_eq!(dest, "PLAZA CASTILLA");
        assert_eq!(origin, "EMBAJADORES");
    }

    #[test]
    fn unknown_direction_falls_back_to_side_b() {
        let (dest, origin) = resolve_direction("", "X", "Y");
        assert_eq!(dest, "Y");
        assert_eq!(origin, "X");
    }

    #[test]
    fn arrival_pair_pads_with_none() {
        let mut record = LineRecord::new("CHAMARTIN", "SOL/SEVILLA");
        assert_eq!(record.arrival_pair(), (None, None));

        record.push_estimate(5, Some(1777));
        assert_eq!(record.arrival_pair(), (Some(5), None));

        record.push_estimate(12, None);
        record.push_estimate(30, Some(9000));
        assert_eq!(record.arrival_pair(), (Some(5), Some(12)));
    }

    #[test]
    fn clear_estimates_keeps_schedule() {
        let mut record = LineRecord {
            max_freq: Some(25),
            ..LineRecord::new("PLAZA CASTILLA", "EMBAJADORES")
        };
        record.push_estimate(3, Some(674));
        record.clear_estimates();

        assert!(record.arrivals.is_empty());
        assert!(record.distances.is_empty());
        assert_eq!(record.max_freq, Some(25));
    }

    #[test]
    fn info_pads_empty_distance() {
        let record = LineRecord::new("ALONSO MARTINEZ", "ALUCHE");
        let info = LineInfo::from(&record);

        assert_eq!(info.distance, vec![None]);
        assert_eq!(info.next_distance(), None);
        assert!(info.arrivals.is_empty());
        assert_eq!(info.destination.as_deref(), Some("ALONSO MARTINEZ"));
    }

    #[test]
    fn info_keeps_reported_distances() {
        let mut record = LineRecord::new("PLAZA CASTILLA", "EMBAJADORES");
        record.push_estimate(3, Some(674));
        record.push_estimate(25, Some(1777));
        let info = LineInfo::from(&record);

        assert_eq!(info.distance, vec![Some(674), Some(1777)]);
        assert_eq!(info.next_distance(), Some(674));
        assert_eq!(info.arrivals, vec![Some(3), Some(25)]);
    }

    #[test]
    fn placeholder_is_all_null() {
        let info = LineInfo::placeholder();
        assert_eq!(info.destination, None);
        assert_eq!(info.origin, None);
        assert_eq!(info.max_freq, None);
        assert_eq!(info.min_freq, None);
        assert_eq!(info.start_time, None);
        assert_eq!(info.end_time, None);
        assert_eq!(info.day_type, None);
        assert_eq!(info.distance, vec![None]);
        assert_eq!(info.arrivals, vec![None, None]);
    }

    proptest! {
        #[test]
        fn minutes_match_floor_division_with_cap(secs in 0i64..10_000_000) {
            let expected = std::cmp::min(secs / 60, 45) as u32;
            prop_assert_eq!(arrival_minutes(secs), expected);
        }

        #[test]
        fn minutes_never_exceed_cap(secs in any::<i64>()) {
            prop_assert!(arrival_minutes(secs) <= MAX_ARRIVAL_MINUTES);
        }

        #[test]
        fn arrival_pair_matches_prefix(arrivals in proptest::collection::vec(0u32..=45, 0..6)) {
            let mut record = LineRecord::new("A", "B");
            for &m in &arrivals {
                record.push_estimate(m, None);
            }
            let (next, following) = record.arrival_pair();
            prop_assert_eq!(next, arrivals.first().copied());
            prop_assert_eq!(following, arrivals.get(1).copied());
            prop_assert_eq!(record.arrivals.len(), record.distances.len());
        }
    }
}
