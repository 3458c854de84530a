use std::fmt;
use std::str::FromStr;

use crate::error::{PopulationError, Result};
use crate::parallel::{Cutoffs, fork_join};

/// Mercator-style projection of a latitude in degrees.
#[inline]
pub fn project_latitude(degrees: f64) -> f64 {
    let phi = degrees.to_radians();
    (phi.tan() + 1.0 / phi.cos()).ln()
}

/// A census block in projected space: `x` is raw longitude, `y` projected latitude.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoPoint {
    pub population: i64,
    pub x: f64,
    pub y: f64,
}

impl GeoPoint {
    pub fn new(population: i64, x: f64, y: f64) -> Self {
        Self { population, x, y }
    }

    /// Build from raw degrees, projecting the latitude.
    pub fn from_degrees(population: i64, latitude: f64, longitude: f64) -> Self {
        Self::new(population, longitude, project_latitude(latitude))
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
    pub top: f64,
}

impl BoundingBox {
    pub fn new(left: f64, right: f64, bottom: f64, top: f64) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    /// Degenerate box around one point.
    #[inline]
    pub fn around(p: &GeoPoint) -> Self {
        Self::new(p.x, p.x, p.y, p.y)
    }

    /// Smallest box covering both. Commutative and associative.
    #[inline]
    pub fn encompass(self, other: Self) -> Self {
        Self {
            left: self.left.min(other.left),
            right: self.right.max(other.right),
            bottom: self.bottom.min(other.bottom),
            top: self.top.max(other.top),
        }
    }

    /// Sequential fold; `None` for an empty slice.
    pub fn enclosing(points: &[GeoPoint]) -> Option<Self> {
        let (first, rest) = points.split_first()?;
        Some(
            rest.iter()
                .fold(Self::around(first), |acc, p| acc.encompass(Self::around(p))),
        )
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.top - self.bottom
    }

    /// Inclusive on every edge.
    #[inline]
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.left && x <= self.right && y >= self.bottom && y <= self.top
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[left={} right={} top={} bottom={}]",
            self.left, self.right, self.top, self.bottom
        )
    }
}

/// How the loader accumulates `total_population`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TotalPopulationPolicy {
    /// Count every population field that parses, even when the row's
    /// coordinates do not and the point is dropped.
    #[default]
    CountParsed,
    /// Count only points that make it into the dataset.
    IncludedOnly,
}

impl FromStr for TotalPopulationPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "parsed" => Ok(Self::CountParsed),
            "included" => Ok(Self::IncludedOnly),
            other => Err(format!("unknown total population policy {other:?}")),
        }
    }
}

/// Immutable set of projected points plus the population used as the
/// denominator of query percentages.
///
/// `total_population` is normally the sum over `points`, but under
/// [`TotalPopulationPolicy::CountParsed`] it may be larger.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    points: Vec<GeoPoint>,
    total_population: i64,
}

impl Dataset {
    pub fn new(points: Vec<GeoPoint>, total_population: i64) -> Self {
        Self {
            points,
            total_population,
        }
    }

    pub fn from_points(points: Vec<GeoPoint>) -> Self {
        let total_population = points.iter().map(|p| p.population).sum();
        Self::new(points, total_population)
    }

    #[inline]
    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    #[inline]
    pub fn total_population(&self) -> i64 {
        self.total_population
    }

    pub fn included_population(&self) -> i64 {
        self.points.iter().map(|p| p.population).sum()
    }

    pub fn bounding_box(&self) -> Result<BoundingBox> {
        BoundingBox::enclosing(&self.points).ok_or(PopulationError::EmptyDataset)
    }

    /// Fork-join reduction of the bounding box.
    pub fn par_bounding_box(&self, cutoffs: &Cutoffs) -> Result<BoundingBox> {
        if self.points.is_empty() {
            return Err(PopulationError::EmptyDataset);
        }
        fork_join(
            &self.points,
            cutoffs,
            &BoundingBox::enclosing,
            &|a: Option<BoundingBox>, b: Option<BoundingBox>| match (a, b) {
                (Some(a), Some(b)) => Some(a.encompass(b)),
                (a, b) => a.or(b),
            },
        )
        .ok_or(PopulationError::EmptyDataset)
    }
}
