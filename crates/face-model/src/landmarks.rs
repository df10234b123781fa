//! 68-point facial landmark sets

use crate::{ModelError, Point2D};
use serde::{Deserialize, Serialize};
use std::ops::{Index, RangeInclusive};

/// Number of points in every landmark set
pub const LANDMARK_COUNT: usize = 68;

/// Semantic landmark groups of the 68-point layout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LandmarkGroup {
    Jaw,
    RightEyebrow,
    LeftEyebrow,
    NoseBridge,
    NoseBase,
    RightEye,
    LeftEye,
    OuterLip,
    InnerLip,
}

impl LandmarkGroup {
    /// All groups in index order
    pub const ALL: [LandmarkGroup; 9] = [
        LandmarkGroup::Jaw,
        LandmarkGroup::RightEyebrow,
        LandmarkGroup::LeftEyebrow,
        LandmarkGroup::NoseBridge,
        LandmarkGroup::NoseBase,
        LandmarkGroup::RightEye,
        LandmarkGroup::LeftEye,
        LandmarkGroup::OuterLip,
        LandmarkGroup::InnerLip,
    ];

    /// First landmark index of the group
    pub const fn first(self) -> usize {
        match self {
            LandmarkGroup::Jaw => 0,
            LandmarkGroup::RightEyebrow => 17,
            LandmarkGroup::LeftEyebrow => 22,
            LandmarkGroup::NoseBridge => 27,
            LandmarkGroup::NoseBase => 31,
            LandmarkGroup::RightEye => 36,
            LandmarkGroup::LeftEye => 42,
            LandmarkGroup::OuterLip => 48,
            LandmarkGroup::InnerLip => 60,
        }
    }

    /// Last landmark index of the group
    pub const fn last(self) -> usize {
        match self {
            LandmarkGroup::InnerLip => LANDMARK_COUNT - 1,
            LandmarkGroup::Jaw => 16,
            LandmarkGroup::RightEyebrow => 21,
            LandmarkGroup::LeftEyebrow => 26,
            LandmarkGroup::NoseBridge => 30,
            LandmarkGroup::NoseBase => 35,
            LandmarkGroup::RightEye => 41,
            LandmarkGroup::LeftEye => 47,
            LandmarkGroup::OuterLip => 59,
        }
    }

    pub fn indices(self) -> RangeInclusive<usize> {
        self.first()..=self.last()
    }

    /// Group that owns a landmark index
    pub fn of(index: usize) -> Option<LandmarkGroup> {
        Self::ALL
            .into_iter()
            .find(|group| group.indices().contains(&index))
    }
}

/// Ordered set of exactly 68 landmark points.
///
/// Index meaning never changes; a set with any other length cannot be built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Point2D>", into = "Vec<Point2D>")]
pub struct LandmarkSet {
    points: Vec<Point2D>,
}

impl LandmarkSet {
    pub fn points(&self) -> &[Point2D] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Build a new set by mapping every point; length is preserved
    pub fn map_points(&self, f: impl Fn(usize, Point2D) -> Point2D) -> Self {
        Self {
            points: self
                .points
                .iter()
                .enumerate()
                .map(|(i, p)| f(i, *p))
                .collect(),
        }
    }
}

impl TryFrom<Vec<Point2D>> for LandmarkSet {
    type Error = ModelError;

    fn try_from(points: Vec<Point2D>) -> Result<Self, Self::Error> {
        if points.len() != LANDMARK_COUNT {
            return Err(ModelError::LandmarkCount {
                expected: LANDMARK_COUNT,
                actual: points.len(),
            });
        }
        Ok(Self { points })
    }
}

impl From<LandmarkSet> for Vec<Point2D> {
    fn from(set: LandmarkSet) -> Self {
        set.points
    }
}

impl Index<usize> for LandmarkSet {
    type Output = Point2D;

    fn index(&self, index: usize) -> &Self::Output {
        &self.points[index]
    }
}
