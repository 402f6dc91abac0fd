//! History policy: timeline reconciliation of time-bounded states.
//!
//! Observations tagged `@history` carry optional `from`/`thru` instants.
//! A missing `from` is open-started and a missing `thru` open-ended; open
//! bounds sort at the extremes. After sorting by `(from, thru)` the
//! timeline is collapsed into adjacency runs: maximal consecutive
//! sequences sharing the same value and child-resource set. Non-adjacent
//! repeats of a value stay separate, since temporal order matters.
//!
//! Each run yields one merged property spanning the run's earliest start
//! and latest end, tagged `@first` and/or `@last` by timeline position.
//! Provenance collapses to the first and last distinct source markers per
//! run rather than retaining every contributor.

use crate::model::{dedup_first_seen, Property, TAG_FIRST, TAG_LAST};
use chrono::{DateTime, Utc};

/// Merge a history group into its timeline runs.
///
/// `tags` is the group's merged tag set; the run markers are appended on
/// top of it per run. Sorting is stable, so observations with identical
/// intervals keep their input order and the result is deterministic for
/// a given input ordering.
pub(crate) fn merge_timeline(
    name: &str,
    mut observations: Vec<Property>,
    tags: Vec<String>,
) -> Vec<Property> {
    observations.sort_by_key(|p| (start_key(p.from), end_key(p.thru)));

    let mut runs: Vec<Vec<Property>> = Vec::new();
    for obs in observations {
        match runs.last_mut() {
            Some(run)
                if run
                    .first()
                    .is_some_and(|head| head.values == obs.values && head.resources == obs.resources) =>
            {
                run.push(obs)
            }
            _ => runs.push(vec![obs]),
        }
    }

    let last_index = runs.len().saturating_sub(1);
    runs.into_iter()
        .enumerate()
        .map(|(index, run)| {
            let mut merged = Property::new(name);
            merged.values = run.first().map(|p| p.values.clone()).unwrap_or_default();
            merged.resources = run.first().map(|p| p.resources.clone()).unwrap_or_default();

            // Earliest start and latest end across the run; an open bound
            // anywhere in the run wins over any explicit instant.
            merged.from = run
                .iter()
                .map(|p| p.from)
                .min_by_key(|f| start_key(*f))
                .flatten();
            merged.thru = run
                .iter()
                .map(|p| p.thru)
                .max_by_key(|t| end_key(*t))
                .flatten();

            merged.sources = collapse_sources(&run);

            merged.tags = tags.clone();
            if index == 0 {
                merged.tags.push(TAG_FIRST.to_string());
            }
            if index == last_index {
                merged.tags.push(TAG_LAST.to_string());
            }
            merged
        })
        .collect()
}

fn start_key(from: Option<DateTime<Utc>>) -> DateTime<Utc> {
    from.unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn end_key(thru: Option<DateTime<Utc>>) -> DateTime<Utc> {
    thru.unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// First and last distinct source markers seen across a run.
fn collapse_sources(run: &[Property]) -> Vec<String> {
    let distinct = dedup_first_seen(run.iter().flat_map(|p| p.sources.iter()).cloned());
    match distinct.len() {
        0 | 1 | 2 => distinct,
        n => vec![distinct[0].clone(), distinct[n - 1].clone()],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TAG_HISTORY;
    use chrono::TimeZone;

    fn ts(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    fn obs(
        value: &str,
        from: Option<DateTime<Utc>>,
        thru: Option<DateTime<Utc>>,
        source: &str,
    ) -> Property {
        Property::new("status")
            .with_values([value])
            .with_tags([TAG_HISTORY])
            .with_interval(from, thru)
            .with_sources([source])
    }

    fn history_tags() -> Vec<String> {
        vec![TAG_HISTORY.to_string()]
    }

    #[test]
    fn test_adjacent_equal_values_collapse() {
        let runs = merge_timeline(
            "status",
            vec![
                obs("active", Some(ts(2024, 1, 1)), Some(ts(2024, 2, 1)), "a"),
                obs("active", Some(ts(2024, 2, 1)), Some(ts(2024, 3, 1)), "a"),
                obs("inactive", Some(ts(2024, 3, 1)), Some(ts(2024, 4, 1)), "a"),
            ],
            history_tags(),
        );

        assert_eq!(runs.len(), 2);

        assert_eq!(runs[0].values, vec!["active"]);
        assert_eq!(runs[0].from, Some(ts(2024, 1, 1)));
        assert_eq!(runs[0].thru, Some(ts(2024, 3, 1)));
        assert!(runs[0].has_tag(TAG_FIRST));
        assert!(!runs[0].has_tag(TAG_LAST));

        assert_eq!(runs[1].values, vec!["inactive"]);
        assert_eq!(runs[1].from, Some(ts(2024, 3, 1)));
        assert_eq!(runs[1].thru, Some(ts(2024, 4, 1)));
        assert!(!runs[1].has_tag(TAG_FIRST));
        assert!(runs[1].has_tag(TAG_LAST));
    }

    #[test]
    fn test_single_run_is_first_and_last() {
        let runs = merge_timeline(
            "status",
            vec![obs("active", Some(ts(2024, 1, 1)), None, "a")],
            history_tags(),
        );

        assert_eq!(runs.len(), 1);
        assert!(runs[0].has_tag(TAG_FIRST));
        assert!(runs[0].has_tag(TAG_LAST));
    }

    #[test]
    fn test_non_adjacent_repeats_stay_separate() {
        let runs = merge_timeline(
            "status",
            vec![
                obs("active", Some(ts(2024, 1, 1)), Some(ts(2024, 2, 1)), "a"),
                obs("inactive", Some(ts(2024, 2, 1)), Some(ts(2024, 3, 1)), "a"),
                obs("active", Some(ts(2024, 3, 1)), Some(ts(2024, 4, 1)), "a"),
            ],
            history_tags(),
        );

        assert_eq!(runs.len(), 3);
        assert_eq!(runs[0].values, vec!["active"]);
        assert_eq!(runs[1].values, vec!["inactive"]);
        assert_eq!(runs[2].values, vec!["active"]);
    }

    #[test]
    fn test_open_bounds_sort_at_extremes() {
        // Open-started observation sorts before Jan 1.
        let runs = merge_timeline(
            "status",
            vec![
                obs("active", Some(ts(2024, 1, 1)), Some(ts(2024, 2, 1)), "a"),
                obs("planned", None, Some(ts(2024, 1, 1)), "a"),
            ],
            history_tags(),
        );

        assert_eq!(runs[0].values, vec!["planned"]);
        assert_eq!(runs[0].from, None);
        assert!(runs[0].has_tag(TAG_FIRST));
        assert!(runs[1].has_tag(TAG_LAST));
    }

    #[test]
    fn test_open_bound_wins_within_run() {
        let runs = merge_timeline(
            "status",
            vec![
                obs("active", None, Some(ts(2024, 2, 1)), "a"),
                obs("active", Some(ts(2024, 2, 1)), None, "a"),
            ],
            history_tags(),
        );

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].from, None);
        assert_eq!(runs[0].thru, None);
    }

    #[test]
    fn test_intervals_contiguous_and_cover_input() {
        let runs = merge_timeline(
            "status",
            vec![
                obs("a", Some(ts(2024, 1, 1)), Some(ts(2024, 2, 1)), "s1"),
                obs("a", Some(ts(2024, 2, 1)), Some(ts(2024, 3, 1)), "s2"),
                obs("b", Some(ts(2024, 3, 1)), Some(ts(2024, 5, 1)), "s3"),
                obs("c", Some(ts(2024, 5, 1)), Some(ts(2024, 6, 1)), "s4"),
            ],
            history_tags(),
        );

        // Contiguous, non-overlapping [from, thru) chain.
        for pair in runs.windows(2) {
            assert_eq!(pair[0].thru, pair[1].from);
        }
        assert_eq!(runs.first().and_then(|r| r.from), Some(ts(2024, 1, 1)));
        assert_eq!(runs.last().and_then(|r| r.thru), Some(ts(2024, 6, 1)));

        // Exactly one @first and one @last.
        assert_eq!(runs.iter().filter(|r| r.has_tag(TAG_FIRST)).count(), 1);
        assert_eq!(runs.iter().filter(|r| r.has_tag(TAG_LAST)).count(), 1);
    }

    #[test]
    fn test_sources_collapse_to_first_and_last() {
        let runs = merge_timeline(
            "status",
            vec![
                obs("a", Some(ts(2024, 1, 1)), Some(ts(2024, 2, 1)), "s1"),
                obs("a", Some(ts(2024, 2, 1)), Some(ts(2024, 3, 1)), "s2"),
                obs("a", Some(ts(2024, 3, 1)), Some(ts(2024, 4, 1)), "s3"),
            ],
            history_tags(),
        );

        assert_eq!(runs.len(), 1);
        assert_eq!(runs[0].sources, vec!["s1", "s3"]);
    }

    #[test]
    fn test_duplicate_sources_dedup_before_collapse() {
        let runs = merge_timeline(
            "status",
            vec![
                obs("a", Some(ts(2024, 1, 1)), Some(ts(2024, 2, 1)), "s1"),
                obs("a", Some(ts(2024, 2, 1)), Some(ts(2024, 3, 1)), "s1"),
            ],
            history_tags(),
        );

        assert_eq!(runs[0].sources, vec!["s1"]);
    }
}
