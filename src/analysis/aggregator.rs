//! Assessment aggregation and statistics.
//!
//! This module computes the overall score of a single submission and the
//! cross-submission statistics of a survey. Nothing here rounds: rounding
//! is a presentation concern handled in [`crate::report::presenter`].

use crate::error::StoreError;
use crate::models::{
    Assessment, Dimension, DimensionStats, Scores, SummaryAggregate, SurveyId, DIMENSION_COUNT,
};
use crate::store::Store;

/// Arithmetic mean of the eight dimension scores, at full precision.
pub fn overall_score(scores: &Scores) -> f64 {
    f64::from(scores.total()) / DIMENSION_COUNT as f64
}

/// Recompute the summary of a survey from the rows currently visible in
/// the store. Unknown survey ids yield the empty aggregate.
pub fn summarize(store: &dyn Store, survey_id: &SurveyId) -> Result<SummaryAggregate, StoreError> {
    let rows = store.assessments_for(survey_id)?;
    Ok(summarize_rows(&rows))
}

/// Reduce a set of assessments into a [`SummaryAggregate`].
///
/// The reduction is commutative: dimension columns are summed as integers,
/// and stored overall scores are multiples of 1/8, so their `f64` sum is
/// exact and independent of row order.
pub fn summarize_rows(rows: &[Assessment]) -> SummaryAggregate {
    if rows.is_empty() {
        return SummaryAggregate::empty();
    }

    let count = rows.len() as u64;
    let mut dimension_totals = [0u64; DIMENSION_COUNT];
    let mut overall_total = 0.0f64;

    for row in rows {
        for (total, &score) in dimension_totals.iter_mut().zip(row.scores.values()) {
            *total += u64::from(score);
        }
        overall_total += row.overall_score;
    }

    let n = count as f64;
    let mut dimension_averages = [None; DIMENSION_COUNT];
    for (average, total) in dimension_averages.iter_mut().zip(dimension_totals) {
        *average = Some(total as f64 / n);
    }

    SummaryAggregate {
        total_responses: count,
        average_overall_score: Some(overall_total / n),
        dimension_averages,
    }
}

/// Mean, min, max and population standard deviation for every dimension.
///
/// Returns an empty list when there are no rows.
pub fn dimension_stats(rows: &[Assessment]) -> Vec<DimensionStats> {
    if rows.is_empty() {
        return Vec::new();
    }

    Dimension::ALL
        .iter()
        .map(|&dimension| {
            let values: Vec<u8> = rows.iter().map(|r| r.scores.get(dimension)).collect();
            describe(dimension, &values)
        })
        .collect()
}

fn describe(dimension: Dimension, values: &[u8]) -> DimensionStats {
    let n = values.len() as f64;
    let total: u64 = values.iter().map(|&v| u64::from(v)).sum();
    let mean = total as f64 / n;

    let variance = values
        .iter()
        .map(|&v| {
            let delta = f64::from(v) - mean;
            delta * delta
        })
        .sum::<f64>()
        / n;

    DimensionStats {
        dimension,
        mean,
        min: values.iter().copied().min().unwrap_or_default(),
        max: values.iter().copied().max().unwrap_or_default(),
        std_dev: variance.sqrt(),
    }
}

/// Sort assessments newest first, breaking timestamp ties by id.
pub fn sort_newest_first(rows: &mut [Assessment]) {
    rows.sort_by(|a, b| {
        b.submitted_at
            .cmp(&a.submitted_at)
            .then_with(|| b.id.cmp(&a.id))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;
    use crate::validation::validate_scores;
    use chrono::{Duration, TimeZone, Utc};
    use serde_json::json;

    fn scores(values: [i64; 8]) -> Scores {
        validate_scores(Some(&json!(values))).unwrap()
    }

    fn create_test_assessment(id: i64, values: [i64; 8]) -> Assessment {
        let s = scores(values);
        Assessment {
            id,
            survey_id: SurveyId::from("survey"),
            respondent_name: format!("User {}", id),
            respondent_team: "Team".to_string(),
            submitted_at: Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap()
                + Duration::seconds(id),
            scores: s,
            overall_score: overall_score(&s),
            notes: None,
        }
    }

    #[test]
    fn test_overall_score_is_exact_mean() {
        assert_eq!(overall_score(&scores([5, 4, 5, 3, 4, 5, 4, 5])), 4.375);
        assert_eq!(overall_score(&scores([5, 4, 3, 2, 1, 5, 4, 3])), 3.375);
        assert_eq!(overall_score(&scores([1, 1, 1, 1, 1, 1, 1, 1])), 1.0);
        assert_eq!(overall_score(&scores([5, 5, 5, 5, 5, 5, 5, 5])), 5.0);
    }

    #[test]
    fn test_summarize_empty_is_all_absent() {
        let summary = summarize_rows(&[]);
        assert_eq!(summary.total_responses, 0);
        assert_eq!(summary.average_overall_score, None);
        assert!(summary.dimension_averages.iter().all(Option::is_none));
    }

    #[test]
    fn test_summarize_two_rows() {
        let rows = vec![
            create_test_assessment(1, [5, 4, 5, 4, 5, 4, 5, 4]),
            create_test_assessment(2, [3, 3, 3, 3, 3, 3, 3, 3]),
        ];

        let summary = summarize_rows(&rows);
        assert_eq!(summary.total_responses, 2);
        assert_eq!(summary.average_overall_score, Some(3.75));
        assert_eq!(
            summary.dimension_average(Dimension::ProjectProgressTransparency),
            Some(4.0)
        );
        assert_eq!(
            summary.dimension_average(Dimension::RequirementResponseSpeed),
            Some(3.5)
        );
    }

    #[test]
    fn test_summarize_is_order_independent() {
        let a = create_test_assessment(1, [5, 4, 5, 3, 4, 5, 4, 5]);
        let b = create_test_assessment(2, [3, 4, 3, 5, 4, 3, 4, 3]);
        let c = create_test_assessment(3, [1, 2, 1, 2, 1, 2, 1, 2]);

        let forward = summarize_rows(&[a.clone(), b.clone(), c.clone()]);
        let backward = summarize_rows(&[c, b, a]);

        assert_eq!(forward, backward);
        assert_eq!(
            forward.average_overall_score.map(f64::to_bits),
            backward.average_overall_score.map(f64::to_bits)
        );
    }

    #[test]
    fn test_summarize_reads_store_and_tolerates_unknown_survey() {
        let store = MemoryStore::new();
        let summary = summarize(&store, &SurveyId::from("never-registered")).unwrap();
        assert_eq!(summary, SummaryAggregate::empty());
    }

    #[test]
    fn test_dimension_stats() {
        let rows = vec![
            create_test_assessment(1, [5, 1, 3, 3, 3, 3, 3, 3]),
            create_test_assessment(2, [3, 1, 3, 3, 3, 3, 3, 3]),
        ];

        let stats = dimension_stats(&rows);
        assert_eq!(stats.len(), DIMENSION_COUNT);

        let first = &stats[0];
        assert_eq!(first.dimension, Dimension::ProjectProgressTransparency);
        assert_eq!(first.mean, 4.0);
        assert_eq!(first.min, 3);
        assert_eq!(first.max, 5);
        assert_eq!(first.std_dev, 1.0);

        assert_eq!(stats[1].std_dev, 0.0);
        assert!(dimension_stats(&[]).is_empty());
    }

    #[test]
    fn test_sort_newest_first_breaks_ties_by_id() {
        let mut rows = vec![
            create_test_assessment(1, [3; 8]),
            create_test_assessment(3, [3; 8]),
            create_test_assessment(2, [3; 8]),
        ];
        rows[1].submitted_at = rows[2].submitted_at;

        sort_newest_first(&mut rows);
        let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
        assert_eq!(ids, vec![3, 2, 1]);
    }
}
