//! Center update and empty-cluster repair.

use rayon::prelude::*;

use super::{chunk_ranges, Rows};

/// Per-cluster coordinate sums (`f64`, row-major `k × dims`) and member counts.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ClusterSums {
    pub sums: Vec<f64>,
    pub counts: Vec<usize>,
    pub dims: usize,
}

impl ClusterSums {
    fn zeros(k: usize, dims: usize) -> Self {
        Self {
            sums: vec![0.0; k * dims],
            counts: vec![0; k],
            dims,
        }
    }

    fn add(&mut self, label: usize, row: &[f32]) {
        let sum = &mut self.sums[label * self.dims..(label + 1) * self.dims];
        for (s, &v) in sum.iter_mut().zip(row) {
            *s += f64::from(v);
        }
        self.counts[label] += 1;
    }

    fn remove(&mut self, label: usize, row: &[f32]) {
        let sum = &mut self.sums[label * self.dims..(label + 1) * self.dims];
        for (s, &v) in sum.iter_mut().zip(row) {
            *s -= f64::from(v);
        }
        self.counts[label] -= 1;
    }

    fn merge(mut self, other: Self) -> Self {
        for (a, b) in self.sums.iter_mut().zip(other.sums) {
            *a += b;
        }
        for (a, b) in self.counts.iter_mut().zip(other.counts) {
            *a += b;
        }
        self
    }

    /// Centers as per-cluster means. Callers repair empty clusters first.
    pub fn centers(&self) -> Vec<f32> {
        let mut centers = vec![0.0f32; self.sums.len()];
        for (label, &count) in self.counts.iter().enumerate() {
            if count == 0 {
                continue;
            }
            let range = label * self.dims..(label + 1) * self.dims;
            for (c, &s) in centers[range.clone()].iter_mut().zip(&self.sums[range]) {
                *c = (s / count as f64) as f32;
            }
        }
        centers
    }
}

/// Sum the rows of every cluster, optionally in parallel chunks.
pub(crate) fn accumulate(
    rows: &Rows,
    labels: &[usize],
    k: usize,
    use_parallel: bool,
) -> ClusterSums {
    let dims = rows.dims;
    let sum_range = |range: std::ops::Range<usize>| {
        let mut sums = ClusterSums::zeros(k, dims);
        for i in range {
            sums.add(labels[i], rows.row(i));
        }
        sums
    };

    if !use_parallel {
        return sum_range(0..rows.len());
    }

    chunk_ranges(rows.len(), rayon::current_num_threads())
        .into_par_iter()
        .map(sum_range)
        .reduce(|| ClusterSums::zeros(k, dims), ClusterSums::merge)
}

/// Give every empty cluster one member.
///
/// Clusters are visited in increasing label order. Each takes the row with
/// the largest distance to its current center among rows not already moved in
/// this pass and whose cluster has more than one member; ties go to the lowest
/// row index. Returns the number of repaired clusters.
pub(crate) fn repair_empty_clusters(
    rows: &Rows,
    labels: &mut [usize],
    distances: &mut [f64],
    sums: &mut ClusterSums,
) -> usize {
    let k = sums.counts.len();
    let mut claimed = vec![false; labels.len()];
    let mut repaired = 0;

    for empty in 0..k {
        if sums.counts[empty] > 0 {
            continue;
        }

        let mut donor_row: Option<usize> = None;
        for i in 0..labels.len() {
            if claimed[i] || sums.counts[labels[i]] <= 1 {
                continue;
            }
            if donor_row.map_or(true, |best| distances[i] > distances[best]) {
                donor_row = Some(i);
            }
        }
        let Some(i) = donor_row else {
            // Fewer rows than clusters; excluded by the entry checks.
            break;
        };

        let row = rows.row(i);
        sums.remove(labels[i], row);
        sums.add(empty, row);
        labels[i] = empty;
        // Sole member of `empty`, so it sits exactly on the new center.
        distances[i] = 0.0;
        claimed[i] = true;
        repaired += 1;
    }

    repaired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kmeans::squared_distance;

    fn rows(values: &[f32], dims: usize) -> Rows {
        Rows {
            values: values.to_vec(),
            dims,
        }
    }

    #[test]
    fn centers_are_member_means() {
        let r = rows(&[0.0, 0.0, 2.0, 2.0, 10.0, 10.0], 2);
        let sums = accumulate(&r, &[0, 0, 1], 2, false);
        assert_eq!(sums.counts, vec![2, 1]);
        assert_eq!(sums.centers(), vec![1.0, 1.0, 10.0, 10.0]);
    }

    #[test]
    fn parallel_sums_match_serial() {
        let values: Vec<f32> = (0..3001).map(|i| (i as f32 * 0.37).sin()).collect();
        let r = rows(&values, 3);
        let labels: Vec<usize> = (0..r.len()).map(|i| i % 4).collect();

        let serial = accumulate(&r, &labels, 4, false);
        let parallel = accumulate(&r, &labels, 4, true);
        assert_eq!(serial.counts, parallel.counts);
        for (a, b) in serial.sums.iter().zip(&parallel.sums) {
            assert!((a - b).abs() < 1e-9);
        }
    }

    #[test]
    fn empty_cluster_takes_farthest_point() {
        let r = rows(&[0.0, 1.0, 2.0, 50.0], 1);
        let mut labels = vec![0, 0, 0, 0];
        let mut distances = vec![4.0, 1.0, 0.0, 2304.0];
        let mut sums = accumulate(&r, &labels, 2, false);

        let repaired = repair_empty_clusters(&r, &mut labels, &mut distances, &mut sums);
        assert_eq!(repaired, 1);
        assert_eq!(labels, vec![0, 0, 0, 1]);
        assert_eq!(sums.counts, vec![3, 1]);
        assert_eq!(sums.centers(), vec![1.0, 50.0]);
        assert_eq!(distances[3], 0.0);
    }

    #[test]
    fn moved_row_distance_matches_its_new_center() {
        let r = rows(&[0.0, 0.0, 1.0, 0.0, 7.0, 3.0], 2);
        let mut labels = vec![0, 0, 0];
        let mut distances = vec![5.0, 2.0, 40.0];
        let mut sums = accumulate(&r, &labels, 2, false);

        repair_empty_clusters(&r, &mut labels, &mut distances, &mut sums);
        assert_eq!(labels, vec![0, 0, 1]);
        let centers = sums.centers();
        assert_eq!(distances[2], squared_distance(r.row(2), &centers[2..4]));
    }

    #[test]
    fn repair_never_empties_a_singleton_donor() {
        // Cluster 0 holds one far point; cluster 1 holds three close points.
        let r = rows(&[100.0, 0.0, 0.5, 1.0], 1);
        let mut labels = vec![0, 1, 1, 1];
        let mut distances = vec![10_000.0, 0.25, 0.0, 0.25];
        let mut sums = accumulate(&r, &labels, 3, false);

        repair_empty_clusters(&r, &mut labels, &mut distances, &mut sums);
        assert_eq!(labels[0], 0);
        // Row 1 wins the tie with row 3 by index.
        assert_eq!(labels, vec![0, 2, 1, 1]);
        assert!(sums.counts.iter().all(|&c| c > 0));
    }

    #[test]
    fn several_empty_clusters_claim_distinct_points() {
        let r = rows(&[0.0, 1.0, 2.0, 3.0, 4.0], 1);
        let mut labels = vec![0; 5];
        let mut distances = vec![4.0, 1.0, 0.0, 1.0, 4.0];
        let mut sums = accumulate(&r, &labels, 4, false);

        let repaired = repair_empty_clusters(&r, &mut labels, &mut distances, &mut sums);
        assert_eq!(repaired, 3);
        assert_eq!(labels, vec![1, 3, 0, 0, 2]);
        assert_eq!(sums.counts, vec![2, 1, 1, 1]);
    }
}
