use serde::{Deserialize, Serialize};

use crate::error::CoreResult;
use crate::provider::Registry;
use crate::seeds::SeedPair;

/// How many rounds the analyzer keeps in its top list.
pub const TOP_OUTCOMES: usize = 10;

/// One row of a generated outcome series. Rounds are 1-based; the nonce for
/// round r is r - 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    pub round: u32,
    pub multiplier: f64,
}

/// Drive the selected algorithm across the contiguous nonce range
/// 0..rounds-1. Pure replay; no state is mutated.
pub fn generate_series(
    registry: &Registry,
    seeds: &SeedPair,
    rounds: u32,
) -> CoreResult<Vec<SeriesPoint>> {
    let mut series = Vec::with_capacity(rounds as usize);
    for nonce in 0..rounds as u64 {
        series.push(SeriesPoint {
            round: nonce as u32 + 1,
            multiplier: registry.multiplier(seeds, nonce, None)?,
        });
    }
    Ok(series)
}

/// Summary statistics over a generated series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesAnalysis {
    /// The single highest outcome, if the series is non-empty.
    pub highest: Option<SeriesPoint>,
    /// Top outcomes by multiplier, descending; ties keep round order.
    pub top: Vec<SeriesPoint>,
    /// Run lengths below the threshold, when one was given.
    pub run_lengths: Option<Vec<i64>>,
}

impl SeriesAnalysis {
    pub fn analyze(series: &[SeriesPoint], threshold: Option<f64>) -> Self {
        let mut top: Vec<SeriesPoint> = series.to_vec();
        top.sort_by(|a, b| b.multiplier.total_cmp(&a.multiplier));
        top.truncate(TOP_OUTCOMES);

        // stable sort keeps the earliest round in front on ties
        let highest = top.first().copied();

        Self {
            highest,
            top,
            run_lengths: threshold.map(|t| run_lengths(series, t)),
        }
    }
}

/// Counts of consecutive rounds strictly below `threshold` between
/// qualifying rounds. The trailing element is the count of sub-threshold
/// rounds after the last qualifying round when the series ends on one
/// (zero in that case), and the -1 sentinel when the series ends without
/// a final qualifying round.
pub fn run_lengths(series: &[SeriesPoint], threshold: f64) -> Vec<i64> {
    let mut runs = Vec::new();
    let mut count: i64 = 0;
    for point in series {
        if point.multiplier >= threshold {
            runs.push(count);
            count = 0;
        } else {
            count += 1;
        }
    }
    if !series.is_empty() {
        runs.push(if count > 0 { -1 } else { 0 });
    }
    runs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Provider;

    fn points(multipliers: &[f64]) -> Vec<SeriesPoint> {
        multipliers
            .iter()
            .enumerate()
            .map(|(i, &m)| SeriesPoint {
                round: i as u32 + 1,
                multiplier: m,
            })
            .collect()
    }

    #[test]
    fn run_lengths_match_reference_example() {
        let series = points(&[1.5, 1.2, 2.5, 1.1, 3.0]);
        assert_eq!(run_lengths(&series, 2.0), vec![2, 1, 0]);
    }

    #[test]
    fn run_lengths_flag_unfinished_trailing_run() {
        let series = points(&[2.5, 1.1, 1.2]);
        assert_eq!(run_lengths(&series, 2.0), vec![0, -1]);
    }

    #[test]
    fn run_lengths_of_empty_series_are_empty() {
        assert!(run_lengths(&[], 2.0).is_empty());
    }

    #[test]
    fn top_outcomes_are_stable_on_ties() {
        let series = points(&[1.5, 3.0, 1.5, 3.0, 2.0]);
        let analysis = SeriesAnalysis::analyze(&series, None);

        let rounds: Vec<u32> = analysis.top.iter().map(|p| p.round).collect();
        assert_eq!(rounds, vec![2, 4, 5, 1, 3]);
        assert_eq!(analysis.highest.unwrap().round, 2);
        assert!(analysis.run_lengths.is_none());
    }

    #[test]
    fn top_is_capped_at_ten() {
        let series = points(&[1.0; 25]);
        let analysis = SeriesAnalysis::analyze(&series, None);
        assert_eq!(analysis.top.len(), TOP_OUTCOMES);
    }

    #[test]
    fn generated_series_is_deterministic_and_contiguous() {
        let registry = Registry::new(Provider::Bch);
        let seeds = SeedPair::new("client-seed", "server-seed").unwrap();

        let a = generate_series(&registry, &seeds, 50).unwrap();
        let b = generate_series(&registry, &seeds, 50).unwrap();
        assert_eq!(a, b);
        assert_eq!(a.len(), 50);
        assert_eq!(a.first().unwrap().round, 1);
        assert_eq!(a.last().unwrap().round, 50);
    }
}
