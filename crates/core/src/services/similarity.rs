//! Near-duplicate detection.
//!
//! Two reports are "similar" when they share a type and sit within a fixed
//! coordinate tolerance of each other on both axes. Submission-time counting
//! uses an inclusive box; feed grouping uses a strict one and is greedy, so
//! its result depends on input order.

use ecowatch_common::{AppResult, BoundingBox};
use ecowatch_db::entities::report;

use crate::store::{ReportAggregate, ReportQuery, ReportStore};

/// Per-axis tolerance in degrees (roughly 1 km at mid-latitudes).
pub const SIMILARITY_TOLERANCE_DEG: f64 = 0.01;

/// Query selecting reports similar to `report` for submission-time counting.
#[must_use]
pub fn similar_query(report: &report::Model) -> ReportQuery {
    let center = ecowatch_common::Coordinates::new(report.latitude, report.longitude);
    ReportQuery {
        report_type: Some(report.report_type),
        bounds: Some(BoundingBox::around(center, SIMILARITY_TOLERANCE_DEG)),
        ..Default::default()
    }
}

/// Number of other stored reports similar to `report`.
pub async fn count_similar(store: &dyn ReportStore, report: &report::Model) -> AppResult<u64> {
    store.count(&similar_query(report), Some(&report.id)).await
}

/// Whether `candidate` joins the group seeded by `seed`.
#[must_use]
pub fn joins_group(seed: &report::Model, candidate: &report::Model) -> bool {
    seed.report_type == candidate.report_type
        && (seed.latitude - candidate.latitude).abs() < SIMILARITY_TOLERANCE_DEG
        && (seed.longitude - candidate.longitude).abs() < SIMILARITY_TOLERANCE_DEG
}

/// A feed entry: the seed report followed by the reports that joined it.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportGroup {
    members: Vec<ReportAggregate>,
}

impl ReportGroup {
    fn seeded(seed: ReportAggregate) -> Self {
        Self {
            members: vec![seed],
        }
    }

    /// The representative report.
    #[must_use]
    pub fn seed(&self) -> &ReportAggregate {
        &self.members[0]
    }

    #[must_use]
    pub fn members(&self) -> &[ReportAggregate] {
        &self.members
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    #[must_use]
    pub fn member_ids(&self) -> Vec<String> {
        self.members.iter().map(|m| m.report.id.clone()).collect()
    }

    /// Sum of upvotes across the group.
    #[must_use]
    pub fn total_upvotes(&self) -> i64 {
        self.members
            .iter()
            .map(|m| i64::from(m.report.upvotes))
            .sum()
    }

    /// The seed's description, annotated with the group size when the group
    /// holds more than one report.
    #[must_use]
    pub fn display_description(&self) -> String {
        let description = self.seed().report.description.as_deref().unwrap_or("");
        let n = self.len();
        if n < 2 {
            description.to_string()
        } else if description.is_empty() {
            format!("{n} people reported this issue")
        } else {
            format!("{description} ({n} people reported this issue)")
        }
    }
}

/// Greedy first-match grouping.
///
/// Each report joins the first existing group whose seed it matches, or seeds
/// a new group. Groups keep the order in which their seeds appeared.
#[must_use]
pub fn group_for_feed(reports: Vec<ReportAggregate>) -> Vec<ReportGroup> {
    reports
        .into_iter()
        .fold(Vec::<ReportGroup>::new(), |mut groups, report| {
            match groups
                .iter_mut()
                .find(|g| joins_group(&g.seed().report, &report.report))
            {
                Some(group) => group.members.push(report),
                None => groups.push(ReportGroup::seeded(report)),
            }
            groups
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, fixtures};
    use ecowatch_db::entities::report::ReportType;

    fn aggregate(id: &str, report_type: ReportType, lat: f64, lng: f64, upvotes: i32) -> ReportAggregate {
        let mut report = fixtures::report(id, report_type, lat, lng);
        report.upvotes = upvotes;
        ReportAggregate::new(report)
    }

    #[test]
    fn test_grouping_is_seed_relative() {
        let groups = group_for_feed(vec![
            aggregate("a", ReportType::Dumping, 0.0, 0.0, 2),
            aggregate("b", ReportType::Dumping, 0.005, 0.005, 3),
            aggregate("c", ReportType::Dumping, 0.02, 0.02, 1),
        ]);

        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].member_ids(), ["a", "b"]);
        assert_eq!(groups[0].total_upvotes(), 5);
        assert_eq!(groups[1].member_ids(), ["c"]);
    }

    #[test]
    fn test_grouping_is_not_transitive() {
        // b is close to both a and c, but c is measured against a.
        let groups = group_for_feed(vec![
            aggregate("a", ReportType::Dumping, 0.0, 0.0, 0),
            aggregate("b", ReportType::Dumping, 0.008, 0.0, 0),
            aggregate("c", ReportType::Dumping, 0.016, 0.0, 0),
        ]);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[1].member_ids(), ["c"]);
    }

    #[test]
    fn test_grouping_order_changes_seed() {
        let forward = group_for_feed(vec![
            aggregate("a", ReportType::Dumping, 0.0, 0.0, 0),
            aggregate("b", ReportType::Dumping, 0.008, 0.0, 0),
            aggregate("c", ReportType::Dumping, 0.016, 0.0, 0),
        ]);
        let reversed = group_for_feed(vec![
            aggregate("b", ReportType::Dumping, 0.008, 0.0, 0),
            aggregate("c", ReportType::Dumping, 0.016, 0.0, 0),
            aggregate("a", ReportType::Dumping, 0.0, 0.0, 0),
        ]);
        assert_eq!(forward.len(), 2);
        assert_eq!(reversed.len(), 1);
        assert_eq!(reversed[0].seed().id(), "b");
    }

    #[test]
    fn test_grouping_requires_same_type_and_strict_bound() {
        let groups = group_for_feed(vec![
            aggregate("a", ReportType::Dumping, 0.0, 0.0, 0),
            aggregate("b", ReportType::AirPollution, 0.0, 0.0, 0),
            aggregate("c", ReportType::Dumping, 0.01, 0.0, 0),
        ]);
        assert_eq!(groups.len(), 3);
    }

    #[test]
    fn test_singletons_are_not_annotated() {
        assert!(group_for_feed(Vec::new()).is_empty());

        let mut lone = aggregate("a", ReportType::Other, 0.0, 0.0, 0);
        lone.report.description = Some("Smells bad".to_string());
        let groups = group_for_feed(vec![lone]);
        assert_eq!(groups[0].display_description(), "Smells bad");
    }

    #[test]
    fn test_group_description() {
        let mut seed = aggregate("a", ReportType::Dumping, 0.0, 0.0, 0);
        seed.report.description = Some("Tyres dumped".to_string());
        let groups = group_for_feed(vec![
            seed,
            aggregate("b", ReportType::Dumping, 0.001, 0.001, 0),
        ]);
        assert_eq!(
            groups[0].display_description(),
            "Tyres dumped (2 people reported this issue)"
        );

        let groups = group_for_feed(vec![
            aggregate("a", ReportType::Dumping, 0.0, 0.0, 0),
            aggregate("b", ReportType::Dumping, 0.001, 0.001, 0),
            aggregate("c", ReportType::Dumping, 0.002, 0.002, 0),
        ]);
        assert_eq!(groups[0].display_description(), "3 people reported this issue");
    }

    #[tokio::test]
    async fn test_count_similar_inclusive_box() {
        let store = MemoryStore::new();
        for (id, report_type, lat, lng) in [
            ("near", ReportType::Dumping, 0.01, 0.0),
            ("edge", ReportType::Dumping, 0.0, -0.01),
            ("far", ReportType::Dumping, 0.0101, 0.0),
            ("other", ReportType::WaterPollution, 0.0, 0.0),
        ] {
            store
                .insert(fixtures::report(id, report_type, lat, lng))
                .await
                .unwrap();
        }
        let fresh = fixtures::report("new", ReportType::Dumping, 0.0, 0.0);
        store.insert(fresh.clone()).await.unwrap();

        assert_eq!(count_similar(&store, &fresh).await.unwrap(), 2);
    }
}
