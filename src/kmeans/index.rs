//! Nearest-center search structures used by the assignment step.

use usearch::{Index, IndexOptions, MetricKind, ScalarKind};

use crate::error::ClusterError;
use crate::types::FeatureMatrix;

/// Index over the current cluster centers.
///
/// The engine rebuilds the index after every center update and then queries
/// it once per feature, possibly from several threads at once.
///
/// # Example: custom index
///
/// ```rust
/// use consensus::error::ClusterError;
/// use consensus::kmeans::NearestNeighborIndex;
/// use consensus::types::FeatureMatrix;
///
/// /// Always answers with the first center.
/// struct FirstCenter;
///
/// impl NearestNeighborIndex for FirstCenter {
///     fn build(&mut self, _centers: &FeatureMatrix) -> Result<(), ClusterError> {
///         Ok(())
///     }
///
///     fn search(&self, _query: &[f32], _k: usize) -> Vec<(usize, f32)> {
///         vec![(0, 0.0)]
///     }
/// }
/// ```
pub trait NearestNeighborIndex: Sync {
    /// Index the rows of `centers`; row `i` is reported as label `i`.
    fn build(&mut self, centers: &FeatureMatrix) -> Result<(), ClusterError>;

    /// Up to `k` `(label, squared distance)` pairs, nearest first.
    fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)>;
}

/// Exact linear scan over all centers.
#[derive(Debug, Default, Clone)]
pub struct BruteForceIndex {
    centers: Vec<f32>,
    dims: usize,
}

impl BruteForceIndex {
    pub fn new() -> Self {
        Self::default()
    }
}

impl NearestNeighborIndex for BruteForceIndex {
    fn build(&mut self, centers: &FeatureMatrix) -> Result<(), ClusterError> {
        self.dims = centers.ncols();
        self.centers.clear();
        self.centers.reserve(centers.len());
        for row in centers.row_iter() {
            self.centers.extend(row.iter());
        }
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        if self.dims == 0 || query.len() != self.dims {
            return Vec::new();
        }
        let mut hits: Vec<(usize, f32)> = self
            .centers
            .chunks_exact(self.dims)
            .enumerate()
            .map(|(label, center)| {
                let d: f32 = center
                    .iter()
                    .zip(query)
                    .map(|(c, q)| (c - q) * (c - q))
                    .sum();
                (label, d)
            })
            .collect();
        hits.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
        hits.truncate(k);
        hits
    }
}

/// Approximate HNSW index backed by `usearch`.
pub struct UsearchIndex {
    index: Option<Index>,
    connectivity: usize,
    expansion_search: usize,
}

impl Default for UsearchIndex {
    fn default() -> Self {
        Self::new()
    }
}

impl UsearchIndex {
    /// Index with the library's default graph parameters.
    pub fn new() -> Self {
        Self {
            index: None,
            connectivity: 0,
            expansion_search: 0,
        }
    }

    /// Graph degree; `0` keeps the library default.
    pub fn with_connectivity(mut self, connectivity: usize) -> Self {
        self.connectivity = connectivity;
        self
    }

    /// Candidate list size at query time; larger is slower and more exact.
    pub fn with_expansion_search(mut self, expansion_search: usize) -> Self {
        self.expansion_search = expansion_search;
        self
    }
}

impl NearestNeighborIndex for UsearchIndex {
    fn build(&mut self, centers: &FeatureMatrix) -> Result<(), ClusterError> {
        let dims = centers.ncols();
        if dims == 0 {
            return Err(ClusterError::EmptyFeatureDimension);
        }

        let mut options = IndexOptions {
            dimensions: dims,
            // Squared L2, matching the compactness objective.
            metric: MetricKind::L2sq,
            quantization: ScalarKind::F32,
            ..Default::default()
        };
        if self.connectivity > 0 {
            options.connectivity = self.connectivity;
        }
        if self.expansion_search > 0 {
            options.expansion_search = self.expansion_search;
        }

        let index = Index::new(&options).map_err(|e| ClusterError::Index(e.to_string()))?;
        index
            .reserve(centers.nrows())
            .map_err(|e| ClusterError::Index(e.to_string()))?;

        let mut vector = Vec::<f32>::with_capacity(dims);
        for (label, row) in centers.row_iter().enumerate() {
            vector.clear();
            vector.extend(row.iter());
            index
                .add(label as u64, &vector)
                .map_err(|e| ClusterError::Index(e.to_string()))?;
        }

        self.index = Some(index);
        Ok(())
    }

    fn search(&self, query: &[f32], k: usize) -> Vec<(usize, f32)> {
        let Some(index) = &self.index else {
            return Vec::new();
        };
        match index.search(query, k) {
            Ok(matches) => matches
                .keys
                .iter()
                .zip(matches.distances.iter())
                .map(|(&key, &distance)| (key as usize, distance))
                .collect(),
            Err(_) => Vec::new(),
        }
    }
}
