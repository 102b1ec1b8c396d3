//! Spatial joining of deforestation features to boundary polygons.
//!
//! Both collections must already share one CRS (the normalizer's job). The
//! join never aborts a run: its outcome is a tagged value the aggregator
//! dispatches on, and a failed join degrades to year-only aggregation.

use geo::{BoundingRect, Intersects, MultiPolygon, Rect};
use rstar::{AABB, RTree, RTreeObject};

use super::Boundary;

/// One (feature, boundary) pair whose geometries intersect. Indices point
/// into the pipeline's feature and boundary vectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JoinedRecord {
    pub feature: usize,
    pub boundary: usize,
}

/// Result of invoking (or skipping) the spatial join.
#[derive(Debug)]
pub enum JoinOutcome {
    /// The join ran; aggregate per (boundary, year).
    Joined(Vec<JoinedRecord>),
    /// No usable boundary collection; aggregate per year.
    Unavailable,
    /// The join itself failed; caught, aggregate per year.
    Failed(String),
}

/// Boundary bounding box in the R-tree, tagged with its vector index.
#[derive(Debug, Clone)]
struct IndexedBounds {
    idx: usize,
    bbox: Rect<f64>,
}

impl RTreeObject for IndexedBounds {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_corners(self.bbox.min().into(), self.bbox.max().into())
    }
}

/// Compute all intersecting (feature, boundary) pairs.
///
/// A feature spanning several boundaries yields one record per boundary;
/// area is not apportioned between them. Touching-only contact counts as
/// intersecting. `None` features (invalidated upstream) are skipped.
pub(crate) fn spatial_join(
    features: &[Option<MultiPolygon<f64>>],
    boundaries: &[Boundary],
) -> JoinOutcome {
    if boundaries.is_empty() {
        return JoinOutcome::Unavailable;
    }

    let leaves: Vec<IndexedBounds> = boundaries
        .iter()
        .enumerate()
        .filter_map(|(idx, b)| b.geom.bounding_rect().map(|bbox| IndexedBounds { idx, bbox }))
        .collect();
    if leaves.is_empty() {
        return JoinOutcome::Failed("boundary collection has no valid geometry".into());
    }
    let rtree = RTree::bulk_load(leaves);

    let mut records = Vec::new();
    for (feature, geom) in features.iter().enumerate() {
        let Some(geom) = geom else { continue };
        let Some(rect) = geom.bounding_rect() else { continue };
        let search = AABB::from_corners(rect.min().into(), rect.max().into());

        for cand in rtree.locate_in_envelope_intersecting(&search) {
            if geom.intersects(&boundaries[cand.idx].geom) {
                records.push(JoinedRecord { feature, boundary: cand.idx });
            }
        }
    }
    JoinOutcome::Joined(records)
}

#[cfg(test)]
mod tests {
    use geo::polygon;

    use super::*;

    fn square(x: f64, y: f64, size: f64) -> MultiPolygon<f64> {
        MultiPolygon(vec![polygon![
            (x: x, y: y),
            (x: x + size, y: y),
            (x: x + size, y: y + size),
            (x: x, y: y + size),
        ]])
    }

    fn boundary(name: &str, geom: MultiPolygon<f64>) -> Boundary {
        Boundary { id: name.to_string(), geom }
    }

    fn records(outcome: JoinOutcome) -> Vec<JoinedRecord> {
        match outcome {
            JoinOutcome::Joined(records) => records,
            other => panic!("expected Joined, got {other:?}"),
        }
    }

    #[test]
    fn feature_joins_containing_boundary() {
        let features = vec![Some(square(1.0, 1.0, 0.1))];
        let bounds = vec![boundary("a", square(0.0, 0.0, 10.0)), boundary("b", square(20.0, 20.0, 1.0))];
        let recs = records(spatial_join(&features, &bounds));
        assert_eq!(recs, vec![JoinedRecord { feature: 0, boundary: 0 }]);
    }

    #[test]
    fn touching_counts_as_intersecting() {
        // Shares only the edge x = 1.
        let features = vec![Some(square(0.0, 0.0, 1.0))];
        let bounds = vec![boundary("adjacent", square(1.0, 0.0, 1.0))];
        assert_eq!(records(spatial_join(&features, &bounds)).len(), 1);
    }

    #[test]
    fn spanning_feature_yields_one_record_per_boundary() {
        // Straddles the boundary between two adjacent squares.
        let features = vec![Some(square(0.9, 0.4, 0.2))];
        let bounds = vec![boundary("west", square(0.0, 0.0, 1.0)), boundary("east", square(1.0, 0.0, 1.0))];
        let mut recs = records(spatial_join(&features, &bounds));
        recs.sort_by_key(|r| r.boundary);
        assert_eq!(
            recs,
            vec![
                JoinedRecord { feature: 0, boundary: 0 },
                JoinedRecord { feature: 0, boundary: 1 },
            ]
        );
    }

    #[test]
    fn empty_boundaries_are_unavailable() {
        let features = vec![Some(square(0.0, 0.0, 1.0))];
        assert!(matches!(spatial_join(&features, &[]), JoinOutcome::Unavailable));
    }

    #[test]
    fn degenerate_boundaries_fail_the_join() {
        let features = vec![Some(square(0.0, 0.0, 1.0))];
        let bounds = vec![boundary("empty", MultiPolygon(vec![]))];
        assert!(matches!(spatial_join(&features, &bounds), JoinOutcome::Failed(_)));
    }

    #[test]
    fn invalidated_features_are_skipped() {
        let features = vec![None, Some(square(0.0, 0.0, 1.0))];
        let bounds = vec![boundary("a", square(0.0, 0.0, 10.0))];
        let recs = records(spatial_join(&features, &bounds));
        assert_eq!(recs, vec![JoinedRecord { feature: 1, boundary: 0 }]);
    }
}
