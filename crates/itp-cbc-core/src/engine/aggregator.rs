//! Per-indicator time series over a patient's panels.
//!
//! Trend policy: the label compares only the two most recent points, never a
//! fit over the whole series.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};

use crate::config::{AnalysisConfig, DuplicateDatePolicy};
use crate::models::{Indicator, Panel, TrendDirection, TrendSeries};

/// One observation placed on the time axis.
#[derive(Debug, Clone, Copy)]
struct Point {
    date: NaiveDate,
    collected_at: DateTime<Utc>,
    /// Position of the source panel in the input
    seq: usize,
    value: f64,
}

/// Build trend series for every indicator observed at least twice.
///
/// The caller supplies panels of a single patient; their order only matters
/// for breaking ties between panels with the same test date.
pub fn aggregate<'a, I>(panels: I, config: &AnalysisConfig) -> BTreeMap<Indicator, TrendSeries>
where
    I: IntoIterator<Item = &'a Panel>,
{
    let mut groups: BTreeMap<Indicator, Vec<Point>> = BTreeMap::new();
    let mut panel_count = 0usize;

    for (seq, panel) in panels.into_iter().enumerate() {
        panel_count += 1;
        for observation in panel.observations() {
            groups.entry(observation.indicator).or_default().push(Point {
                date: panel.test_date(),
                collected_at: panel.collected_at(),
                seq,
                value: observation.value,
            });
        }
    }

    let trends: BTreeMap<Indicator, TrendSeries> = groups
        .into_iter()
        .filter_map(|(indicator, points)| {
            build_series(indicator, points, config).map(|series| (indicator, series))
        })
        .collect();

    tracing::debug!(panels = panel_count, series = trends.len(), "aggregated trends");

    trends
}

fn build_series(indicator: Indicator, mut points: Vec<Point>, config: &AnalysisConfig) -> Option<TrendSeries> {
    match config.duplicate_dates {
        DuplicateDatePolicy::KeepAll => {
            points.sort_by_key(|p| (p.date, p.seq));
        }
        DuplicateDatePolicy::KeepLatestPerDate => {
            points.sort_by_key(|p| (p.date, p.collected_at, p.seq));
            // Keep the last point of each date run.
            let mut kept: Vec<Point> = Vec::with_capacity(points.len());
            for point in points {
                match kept.last_mut() {
                    Some(last) if last.date == point.date => *last = point,
                    _ => kept.push(point),
                }
            }
            points = kept;
        }
    }

    if points.len() < 2 {
        return None;
    }

    let values: Vec<f64> = points.iter().map(|p| p.value).collect();
    let dates: Vec<NaiveDate> = points.iter().map(|p| p.date).collect();
    let trend = trend_of(&values, config.trend_noise_threshold)?;

    Some(TrendSeries {
        indicator,
        values,
        dates,
        trend,
    })
}

/// Trend label of a date-ordered value sequence, `None` with fewer than 2 values.
pub fn trend_of(values: &[f64], threshold: f64) -> Option<TrendDirection> {
    match values {
        [.., previous, latest] => Some(direction(*previous, *latest, threshold)),
        _ => None,
    }
}

/// Direction of the change from `previous` to `latest`.
///
/// The relative change must strictly exceed `threshold` to leave `stable`.
pub fn direction(previous: f64, latest: f64, threshold: f64) -> TrendDirection {
    let change = relative_change(previous, latest);
    if change > threshold {
        TrendDirection::Rising
    } else if change < -threshold {
        TrendDirection::Falling
    } else {
        TrendDirection::Stable
    }
}

/// Relative change from `previous` to `latest`.
///
/// A zero baseline yields +inf for any increase and 0 otherwise.
pub fn relative_change(previous: f64, latest: f64) -> f64 {
    if previous == 0.0 {
        if latest > 0.0 {
            f64::INFINITY
        } else {
            0.0
        }
    } else {
        (latest - previous) / previous.abs()
    }
}
