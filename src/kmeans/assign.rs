//! Nearest-center assignment.

use std::ops::Range;

use rayon::prelude::*;

use super::index::NearestNeighborIndex;
use super::{chunk_ranges, exact_nearest, squared_distance, Rows};

/// Labels and squared distances for every row.
pub(crate) struct Assignment {
    pub labels: Vec<usize>,
    pub distances: Vec<f64>,
}

/// Assign every row to a center through `index`.
///
/// With `previous` labels, a match farther than the row's previous center
/// (measured against the current centers) is ignored and the previous label
/// kept, so an approximate search can never make an assignment worse.
pub(crate) fn assign<I>(
    rows: &Rows,
    centers: &[f32],
    index: &I,
    previous: Option<&[usize]>,
    use_parallel: bool,
) -> Assignment
where
    I: NearestNeighborIndex + ?Sized,
{
    let n = rows.len();
    if !use_parallel {
        let (labels, distances) = assign_range(rows, centers, index, previous, 0..n);
        return Assignment { labels, distances };
    }

    let parts: Vec<(Vec<usize>, Vec<f64>)> = chunk_ranges(n, rayon::current_num_threads())
        .into_par_iter()
        .map(|range| assign_range(rows, centers, index, previous, range))
        .collect();

    let mut labels = Vec::with_capacity(n);
    let mut distances = Vec::with_capacity(n);
    for (chunk_labels, chunk_distances) in parts {
        labels.extend(chunk_labels);
        distances.extend(chunk_distances);
    }
    Assignment { labels, distances }
}

fn assign_range<I>(
    rows: &Rows,
    centers: &[f32],
    index: &I,
    previous: Option<&[usize]>,
    range: Range<usize>,
) -> (Vec<usize>, Vec<f64>)
where
    I: NearestNeighborIndex + ?Sized,
{
    let dims = rows.dims;
    let k = centers.len() / dims;
    let mut labels = Vec::with_capacity(range.len());
    let mut distances = Vec::with_capacity(range.len());

    for i in range {
        let query = rows.row(i);
        let (mut label, mut distance) = match index.search(query, 1).first() {
            Some(&(label, _)) if label < k => (
                label,
                squared_distance(query, &centers[label * dims..(label + 1) * dims]),
            ),
            _ => exact_nearest(query, centers, dims),
        };

        if let Some(previous) = previous {
            let prev = previous[i];
            let prev_distance = squared_distance(query, &centers[prev * dims..(prev + 1) * dims]);
            if distance > prev_distance {
                label = prev;
                distance = prev_distance;
            }
        }

        labels.push(label);
        distances.push(distance);
    }

    (labels, distances)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ClusterError;
    use crate::kmeans::BruteForceIndex;
    use crate::types::FeatureMatrix;

    /// Always proposes the last center, however far away it is.
    struct WrongIndex {
        k: usize,
    }

    impl NearestNeighborIndex for WrongIndex {
        fn build(&mut self, centers: &FeatureMatrix) -> Result<(), ClusterError> {
            self.k = centers.nrows();
            Ok(())
        }

        fn search(&self, _query: &[f32], _k: usize) -> Vec<(usize, f32)> {
            vec![(self.k - 1, 0.0)]
        }
    }

    fn rows() -> Rows {
        Rows {
            values: vec![0.0, 0.1, 0.2, 9.8, 9.9, 10.0],
            dims: 1,
        }
    }

    fn index_for(centers: &[f32]) -> BruteForceIndex {
        let mut index = BruteForceIndex::new();
        index
            .build(&FeatureMatrix::from_row_slice(centers.len(), 1, centers))
            .unwrap();
        index
    }

    #[test]
    fn assigns_to_nearest_center() {
        let centers = [0.0f32, 10.0];
        let index = index_for(&centers);
        let result = assign(&rows(), &centers, &index, None, false);
        assert_eq!(result.labels, vec![0, 0, 0, 1, 1, 1]);
        assert!((result.distances[1] - 0.01).abs() < 1e-6);
    }

    #[test]
    fn worse_match_keeps_previous_label() {
        let centers = [0.0f32, 10.0];
        let mut index = WrongIndex { k: 0 };
        index
            .build(&FeatureMatrix::from_row_slice(2, 1, &centers))
            .unwrap();
        let previous = vec![0, 0, 0, 1, 1, 1];

        let result = assign(&rows(), &centers, &index, Some(&previous), false);
        assert_eq!(result.labels, previous);

        // Without a previous assignment the bad match is taken as is.
        let result = assign(&rows(), &centers, &index, None, false);
        assert_eq!(result.labels, vec![1; 6]);
    }

    #[test]
    fn parallel_matches_serial() {
        let values: Vec<f32> = (0..997).map(|i| (i % 37) as f32 * 0.5).collect();
        let rows = Rows { values, dims: 1 };
        let centers = [0.0f32, 5.0, 11.0, 17.5];
        let index = index_for(&centers);

        let serial = assign(&rows, &centers, &index, None, false);
        let parallel = assign(&rows, &centers, &index, None, true);
        assert_eq!(serial.labels, parallel.labels);
        assert_eq!(serial.distances, parallel.distances);
    }
}
