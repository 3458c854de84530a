use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use crate::census::{BoundingBox, Dataset};
use crate::error::{PopulationError, Result};
use crate::grid::{GridShape, HistogramBuilder, PartitionMerge, SequentialGrid, SharedLockedGrid};
use crate::parallel::Cutoffs;
use crate::query::{QueryAnswer, QueryEngine, QueryRect};

/// Strategy selector, `-v1` .. `-v6` on the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Version {
    /// Sequential bounding box, linear scan per query.
    V1,
    /// Parallel bounding box, parallel scan per query.
    V2,
    /// Sequential histogram + prefix sums.
    V3,
    /// Partition-and-merge histogram + prefix sums.
    V4,
    /// Shared grid with per-cell locks + prefix sums.
    V5,
    /// Reserved.
    V6,
}

impl Version {
    pub const ALL: [Version; 6] = [
        Version::V1,
        Version::V2,
        Version::V3,
        Version::V4,
        Version::V5,
        Version::V6,
    ];

    pub fn parallel_bounding_box(self) -> bool {
        !matches!(self, Version::V1 | Version::V3)
    }

    /// `None` for versions that answer straight from the points.
    pub fn histogram_builder(self, cutoffs: Cutoffs) -> Option<Box<dyn HistogramBuilder>> {
        match self {
            Version::V3 => Some(Box::new(SequentialGrid)),
            Version::V4 => Some(Box::new(PartitionMerge::new(cutoffs))),
            Version::V5 => Some(Box::new(SharedLockedGrid::new(cutoffs))),
            _ => None,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let n = match self {
            Version::V1 => 1,
            Version::V2 => 2,
            Version::V3 => 3,
            Version::V4 => 4,
            Version::V5 => 5,
            Version::V6 => 6,
        };
        write!(f, "-v{n}")
    }
}

impl FromStr for Version {
    type Err = PopulationError;

    fn from_str(s: &str) -> Result<Self> {
        Version::ALL
            .into_iter()
            .find(|v| v.to_string() == s)
            .ok_or_else(|| PopulationError::UnknownVersion(s.to_string()))
    }
}

/// A dataset prepared for rectangle queries under one [`Version`].
#[derive(Debug)]
pub struct PopulationIndex {
    dataset: Dataset,
    bbox: BoundingBox,
    shape: GridShape,
    version: Version,
    engine: QueryEngine,
}

impl PopulationIndex {
    pub fn build(dataset: Dataset, shape: GridShape, version: Version, cutoffs: Cutoffs) -> Result<Self> {
        if version == Version::V6 {
            log::warn!("version {version} requested but reserved");
            return Err(PopulationError::NotImplemented(version));
        }

        let t0 = Instant::now();
        let bbox = if version.parallel_bounding_box() {
            dataset.par_bounding_box(&cutoffs)?
        } else {
            dataset.bounding_box()?
        };
        log::info!(
            "bounding box over {} points in {:.3}s (parallel={})",
            dataset.len(),
            t0.elapsed().as_secs_f64(),
            version.parallel_bounding_box()
        );

        let engine = match version.histogram_builder(cutoffs) {
            Some(builder) => {
                let t_hist = Instant::now();
                let grid = builder.build(dataset.points(), &bbox, shape);
                log::info!(
                    "{} histogram {}x{} in {:.3}s",
                    builder.name(),
                    shape.ydim,
                    shape.xdim,
                    t_hist.elapsed().as_secs_f64()
                );
                let t_prefix = Instant::now();
                let prefix = grid.into_prefix();
                log::info!("prefix transform in {:.3}s", t_prefix.elapsed().as_secs_f64());
                QueryEngine::PrefixSum(prefix)
            }
            None if version == Version::V2 => QueryEngine::ParallelScan(cutoffs),
            None => QueryEngine::LinearScan,
        };

        Ok(Self {
            dataset,
            bbox,
            shape,
            version,
            engine,
        })
    }

    pub fn dataset(&self) -> &Dataset {
        &self.dataset
    }

    pub fn bounding_box(&self) -> &BoundingBox {
        &self.bbox
    }

    pub fn shape(&self) -> GridShape {
        self.shape
    }

    pub fn version(&self) -> Version {
        self.version
    }

    pub fn engine(&self) -> &QueryEngine {
        &self.engine
    }

    pub fn population(&self, rect: &QueryRect) -> i64 {
        self.engine
            .population(self.dataset.points(), &self.bbox, self.shape, rect)
    }

    pub fn answer(&self, rect: &QueryRect) -> QueryAnswer {
        QueryAnswer::new(self.population(rect), self.dataset.total_population())
    }

    /// Validate and answer in one step; `None` for an out-of-range rectangle.
    pub fn query(&self, west: i64, south: i64, east: i64, north: i64) -> Option<QueryAnswer> {
        QueryRect::new(west, south, east, north, self.shape).map(|rect| self.answer(&rect))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_tokens_round_trip() {
        for v in Version::ALL {
            assert_eq!(v.to_string().parse::<Version>().unwrap(), v);
        }
        assert!(matches!(
            "-v7".parse::<Version>(),
            Err(PopulationError::UnknownVersion(s)) if s == "-v7"
        ));
        assert!("v1".parse::<Version>().is_err());
    }

    #[test]
    fn reserved_version_is_typed_error() {
        let ds = Dataset::from_points(vec![crate::GeoPoint::new(1, 0.0, 0.0)]);
        let shape = GridShape::new(2, 2).unwrap();
        let err = PopulationIndex::build(ds, shape, Version::V6, Cutoffs::default()).unwrap_err();
        assert!(matches!(err, PopulationError::NotImplemented(Version::V6)));
    }

    #[test]
    fn engines_follow_version() {
        let ds = Dataset::from_points(vec![crate::GeoPoint::new(1, 0.0, 0.0)]);
        let shape = GridShape::new(2, 2).unwrap();
        let names: Vec<&str> = Version::ALL[..5]
            .iter()
            .map(|&v| {
                let idx = PopulationIndex::build(ds.clone(), shape, v, Cutoffs::default()).unwrap();
                idx.engine().name()
            })
            .collect();
        assert_eq!(
            names,
            ["linear-scan", "parallel-scan", "prefix-sum", "prefix-sum", "prefix-sum"]
        );
    }
}
