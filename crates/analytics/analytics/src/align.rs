//! Series alignment.
//!
//! Stores return sparse series in whatever order their query plan produced.
//! Alignment always matches points to buckets by key, never by position.

use crate::buckets::BucketSequence;
use crate::fetcher::SparseSeries;
use tutorhub_core::SparsePoint;

/// A dense series, one value per bucket of the sequence it was aligned to.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignedSeries {
    pub name: String,
    pub data: Vec<f64>,
}

impl AlignedSeries {
    /// Sum of all values in the series.
    pub fn total(&self) -> f64 {
        self.data.iter().sum()
    }
}

/// Spreads `points` over `buckets`, zero-filling buckets with no point.
///
/// Points whose key is outside the window are dropped.
pub fn align(buckets: &BucketSequence, points: &[SparsePoint]) -> Vec<f64> {
    let mut data = vec![0.0; buckets.len()];
    for point in points {
        match buckets.index_of(&point.key) {
            Some(i) => data[i] = point.value,
            None => tracing::debug!(key = %point.key, "Dropping point outside bucket window"),
        }
    }
    data
}

/// Aligns each sparse series onto the same bucket axis.
pub fn align_all(buckets: &BucketSequence, series: &[SparseSeries]) -> Vec<AlignedSeries> {
    series
        .iter()
        .map(|s| AlignedSeries {
            name: s.name.clone(),
            data: align(buckets, &s.points),
        })
        .collect()
}
