//! Ranking of stored schools by distance from a query point.

use crate::types::{Coordinate, RankedSchool, School};

/// Annotate every school with its distance from `target` and order them
/// nearest first.
///
/// The sort is stable: schools at equal distance keep their input order.
/// Every record is scored and returned; there is no limit or radius.
pub fn rank_by_proximity(target: Coordinate, schools: &[School]) -> Vec<RankedSchool> {
    let mut ranked: Vec<RankedSchool> = schools
        .iter()
        .map(|school| RankedSchool {
            distance: target.distance_to(&school.coordinate()),
            school: school.clone(),
        })
        .collect();

    ranked.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    ranked
}
