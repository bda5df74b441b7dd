//! Compare a focal report against the patient's earlier reports.

use std::collections::{BTreeMap, HashSet};

use crate::config::AnalysisConfig;
use crate::models::{
    ChangeCounts, ComparisonResult, Indicator, Panel, TrendDirection, TrendSeries,
};
use crate::reference::ReferenceTable;

use super::aggregator::{aggregate, relative_change};
use super::classifier::assess_treatment_response;
use super::evaluator::evaluate;

/// Summary used when there is nothing to compare against.
pub const INSUFFICIENT_HISTORY_SUMMARY: &str =
    "Insufficient history: no prior reports to compare against.";

/// Compare `focal` against `history`.
///
/// `history` may contain the focal report itself, reports of other patients
/// and reports dated after the focal one; all of these are filtered out so the
/// focal report is the endpoint of every series and each panel counts once.
pub fn compare(
    table: &ReferenceTable,
    config: &AnalysisConfig,
    focal: &Panel,
    history: &[Panel],
) -> ComparisonResult {
    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(focal.report_id());

    let mut panels: Vec<&Panel> = Vec::with_capacity(history.len() + 1);
    for panel in history {
        if panel.patient_id() != focal.patient_id() {
            tracing::warn!(
                report_id = panel.report_id(),
                expected = focal.patient_id(),
                found = panel.patient_id(),
                "dropping report of another patient from history"
            );
            continue;
        }
        if panel.test_date() > focal.test_date() {
            tracing::debug!(
                report_id = panel.report_id(),
                focal = focal.report_id(),
                "skipping report dated after the focal report"
            );
            continue;
        }
        if seen.insert(panel.report_id()) {
            panels.push(panel);
        }
    }

    if panels.is_empty() {
        tracing::debug!(report_id = focal.report_id(), "no prior reports to compare");
        return ComparisonResult {
            trends: BTreeMap::new(),
            abnormal_changes: Vec::new(),
            comparison_summary: INSUFFICIENT_HISTORY_SUMMARY.to_string(),
            counts: ChangeCounts::default(),
            treatment_response: None,
        };
    }

    panels.push(focal);
    let trends = aggregate(panels.iter().copied(), config);

    let evaluation = evaluate(table, focal);
    let abnormal_changes: Vec<String> = evaluation
        .classifications
        .values()
        .filter(|c| c.is_abnormal)
        .filter_map(|c| trends.get(&c.indicator))
        .filter(|series| series.trend != TrendDirection::Stable)
        .filter_map(describe_change)
        .collect();

    let mut counts = count_changes(table, &trends);
    counts.flagged = abnormal_changes.len();

    let treatment_response = trends.get(&Indicator::Plt).and_then(|plt| {
        Some(assess_treatment_response(plt.first()?, plt.last()?))
    });

    tracing::debug!(
        report_id = focal.report_id(),
        prior_reports = panels.len() - 1,
        series = trends.len(),
        flagged = counts.flagged,
        "compared report against history"
    );

    ComparisonResult {
        comparison_summary: render_summary(&counts),
        trends,
        abnormal_changes,
        counts,
        treatment_response,
    }
}

/// Classify each series' latest move relative to its reference range.
pub fn count_changes(table: &ReferenceTable, trends: &BTreeMap<Indicator, TrendSeries>) -> ChangeCounts {
    let mut counts = ChangeCounts::default();

    for (indicator, series) in trends {
        let movement = match (series.trend, table.range(*indicator), series.latest_pair()) {
            (TrendDirection::Stable, _, _) | (_, None, _) | (_, _, None) => None,
            (_, Some(range), Some((prev, last))) => {
                Some(range.distance(last).partial_cmp(&range.distance(prev)))
            }
        };

        match movement {
            Some(Some(std::cmp::Ordering::Less)) => counts.improved += 1,
            Some(Some(std::cmp::Ordering::Greater)) => counts.worsened += 1,
            _ => counts.unchanged += 1,
        }
    }

    counts
}

/// Human-readable summary, derived only from the counts.
pub fn render_summary(counts: &ChangeCounts) -> String {
    if counts.total() == 0 {
        return "No indicator was measured in more than one report.".to_string();
    }

    format!(
        "Compared {} indicator{}: {} improved, {} worsened, {} unchanged; {} abnormal change{} flagged.",
        counts.total(),
        plural(counts.total()),
        counts.improved,
        counts.worsened,
        counts.unchanged,
        counts.flagged,
        plural(counts.flagged),
    )
}

fn plural(n: usize) -> &'static str {
    if n == 1 {
        ""
    } else {
        "s"
    }
}

/// One line per flagged indicator, e.g. `PLT falling: 250 -> 100 (-60.0%)`.
fn describe_change(series: &TrendSeries) -> Option<String> {
    let (prev, last) = series.latest_pair()?;
    let change = relative_change(prev, last);
    let percent = if change.is_finite() {
        format!("{:+.1}%", change * 100.0)
    } else {
        "from zero".to_string()
    };

    Some(format!(
        "{} {}: {} -> {} ({})",
        series.indicator.abbreviation(),
        series.trend.as_str(),
        prev,
        last,
        percent
    ))
}
