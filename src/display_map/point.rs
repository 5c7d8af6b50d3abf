//! Point and range types for the document and screen coordinate spaces

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::Point;

/// A point in screen coordinate space (after folding and soft wrapping)
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ScreenPoint(pub Point);

impl ScreenPoint {
    pub const ZERO: ScreenPoint = ScreenPoint(Point::ZERO);

    pub fn new(row: usize, column: usize) -> Self {
        Self(Point::new(row, column))
    }

    pub fn row(&self) -> usize {
        self.0.row
    }

    pub fn column(&self) -> usize {
        self.0.column
    }
}

impl From<Point> for ScreenPoint {
    fn from(point: Point) -> Self {
        Self(point)
    }
}

impl From<ScreenPoint> for Point {
    fn from(point: ScreenPoint) -> Self {
        point.0
    }
}

/// Which side of a fold boundary a queried position belongs to
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Side {
    /// A position on the fold's start is outside the fold
    Before,
    /// Both boundaries count as inside
    #[default]
    Either,
    /// A position on the fold's end is outside the fold
    After,
}

/// How another range sits relative to a range
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RangeRelation {
    /// Ends before this range starts
    Before,
    /// Starts before this range and ends inside it
    StartsBefore,
    /// One range contains the other
    Overlaps,
    /// Starts inside this range and ends after it
    EndsAfter,
    /// Starts after this range ends
    After,
    /// Start after this range but end inside it, which only an inverted range can do
    Inverted,
}

/// A half-open span of document positions
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Range {
    pub start: Point,
    pub end: Point,
}

impl Range {
    pub fn new(start_row: usize, start_column: usize, end_row: usize, end_column: usize) -> Self {
        Self {
            start: Point::new(start_row, start_column),
            end: Point::new(end_row, end_column),
        }
    }

    pub fn from_points(start: Point, end: Point) -> Self {
        Self { start, end }
    }

    /// Range with start and end swapped if needed so that start <= end
    pub fn ordered(self) -> Self {
        if self.end < self.start {
            Self { start: self.end, end: self.start }
        } else {
            self
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    pub fn is_multi_line(&self) -> bool {
        self.start.row != self.end.row
    }

    pub fn is_start(&self, point: Point) -> bool {
        self.start == point
    }

    pub fn is_end(&self, point: Point) -> bool {
        self.end == point
    }

    /// Whether `point` lies within the range, boundaries included
    pub fn contains(&self, point: Point) -> bool {
        self.compare(point) == Ordering::Equal
    }

    /// Whether `other` lies entirely within this range
    pub fn contains_range(&self, other: &Range) -> bool {
        self.contains(other.start) && self.contains(other.end)
    }

    /// `Less` if `point` is before the range, `Greater` if after, `Equal` inside
    pub fn compare(&self, point: Point) -> Ordering {
        self.compare_signed(point.row, point.column as isize)
    }

    /// Like [`Range::compare`], with `point == start` counted as before the range
    pub fn compare_start(&self, point: Point) -> Ordering {
        if self.start == point {
            Ordering::Less
        } else {
            self.compare(point)
        }
    }

    /// Like [`Range::compare`], with `point == end` counted as after the range
    pub fn compare_end(&self, point: Point) -> Ordering {
        if self.end == point {
            Ordering::Greater
        } else {
            self.compare(point)
        }
    }

    /// Like [`Range::compare`], with both boundaries counted as outside
    pub fn compare_inside(&self, point: Point) -> Ordering {
        if self.end == point {
            Ordering::Greater
        } else if self.start == point {
            Ordering::Less
        } else {
            self.compare(point)
        }
    }

    pub fn compare_range(&self, other: &Range) -> RangeRelation {
        self.relation_to(
            (other.start.row, other.start.column as isize),
            (other.end.row, other.end.column as isize),
        )
    }

    /// Compare with a column that may sit one step left of column zero
    pub(crate) fn compare_signed(&self, row: usize, column: isize) -> Ordering {
        let start_column = self.start.column as isize;
        let end_column = self.end.column as isize;

        if !self.is_multi_line() && row == self.start.row {
            return if column < start_column {
                Ordering::Less
            } else if column > end_column {
                Ordering::Greater
            } else {
                Ordering::Equal
            };
        }

        if row < self.start.row {
            return Ordering::Less;
        }
        if row > self.end.row {
            return Ordering::Greater;
        }
        if row == self.start.row {
            return if column >= start_column { Ordering::Equal } else { Ordering::Less };
        }
        if row == self.end.row {
            return if column <= end_column { Ordering::Equal } else { Ordering::Greater };
        }
        Ordering::Equal
    }

    pub(crate) fn relation_to(&self, start: (usize, isize), end: (usize, isize)) -> RangeRelation {
        match self.compare_signed(end.0, end.1) {
            Ordering::Greater => match self.compare_signed(start.0, start.1) {
                Ordering::Greater => RangeRelation::After,
                Ordering::Equal => RangeRelation::EndsAfter,
                Ordering::Less => RangeRelation::Overlaps,
            },
            Ordering::Less => RangeRelation::Before,
            Ordering::Equal => match self.compare_signed(start.0, start.1) {
                Ordering::Less => RangeRelation::StartsBefore,
                Ordering::Greater => RangeRelation::Inverted,
                Ordering::Equal => RangeRelation::Overlaps,
            },
        }
    }
}

impl std::fmt::Display for Range {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} -> {}", self.start, self.end)
    }
}
