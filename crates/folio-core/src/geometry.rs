#![forbid(unsafe_code)]

//! Intersection geometry.
//!
//! The same math a browser's intersection observation performs, expressed on
//! plain rectangles so that hosts without one (native shells, tests) can drive
//! the viewport utilities deterministically.
//!
//! # Invariants
//!
//! 1. `RootMargin::apply` never produces negative width or height.
//! 2. `intersection_ratio` is always within `[0, 1]`.
//! 3. Edge-adjacent rectangles intersect (zero-area intersection).
//! 4. A [`ThresholdSet`] is sorted, deduplicated and clamped to `[0, 1]`.
//!
//! # Failure Modes
//!
//! | Failure | Cause | Behavior |
//! |---------|-------|----------|
//! | Empty margin string | `""` | `MarginParseError::Empty` |
//! | More than four lengths | `"1px 2px 3px 4px 5px"` | `MarginParseError::TooManyLengths` |
//! | Unsupported unit | `"1em"` | `MarginParseError::InvalidLength` |
//! | NaN threshold | host bug | dropped from the set |

use core::fmt;
use core::str::FromStr;

/// Axis-aligned rectangle in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    /// Create a rectangle; negative sizes are clamped to zero.
    #[must_use]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width: width.max(0.0),
            height: height.max(0.0),
        }
    }

    #[must_use]
    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    #[must_use]
    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    #[must_use]
    pub fn area(&self) -> f64 {
        self.width * self.height
    }

    /// Same rectangle moved by `(dx, dy)`.
    #[must_use]
    pub fn translate(&self, dx: f64, dy: f64) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Overlap of two rectangles, `None` when they are disjoint.
    ///
    /// Touching edges yield a zero-area intersection.
    #[must_use]
    pub fn intersection(&self, other: &Rect) -> Option<Rect> {
        let left = self.x.max(other.x);
        let top = self.y.max(other.y);
        let right = self.right().min(other.right());
        let bottom = self.bottom().min(other.bottom());
        if right < left || bottom < top {
            return None;
        }
        Some(Rect::new(left, top, right - left, bottom - top))
    }
}

/// Visibility of `target` inside `root`: `(is_intersecting, ratio)`.
///
/// The ratio is intersection area over target area. A zero-area target that
/// intersects reports a ratio of `1.0`.
#[must_use]
pub fn intersection_ratio(target: &Rect, root: &Rect) -> (bool, f64) {
    match target.intersection(root) {
        None => (false, 0.0),
        Some(overlap) => {
            let area = target.area();
            if area <= 0.0 {
                (true, 1.0)
            } else {
                (true, (overlap.area() / area).clamp(0.0, 1.0))
            }
        }
    }
}

/// One side of a root margin.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MarginLength {
    Px(f64),
    /// Percentage of the root's height (top/bottom) or width (left/right).
    Percent(f64),
}

impl MarginLength {
    /// Resolve against the root dimension on the same axis.
    #[must_use]
    pub fn resolve(self, basis: f64) -> f64 {
        match self {
            Self::Px(px) => px,
            Self::Percent(pct) => basis * pct / 100.0,
        }
    }
}

impl fmt::Display for MarginLength {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Px(px) => write!(f, "{px}px"),
            Self::Percent(pct) => write!(f, "{pct}%"),
        }
    }
}

impl FromStr for MarginLength {
    type Err = MarginParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let token = raw.trim();
        let invalid = || MarginParseError::InvalidLength(token.to_string());
        let (number, percent) = if let Some(n) = token.strip_suffix('%') {
            (n, true)
        } else if let Some(n) = token.strip_suffix("px") {
            (n, false)
        } else if token == "0" {
            (token, false)
        } else {
            return Err(invalid());
        };
        let value: f64 = number.parse().map_err(|_| invalid())?;
        if !value.is_finite() {
            return Err(invalid());
        }
        Ok(if percent {
            Self::Percent(value)
        } else {
            Self::Px(value)
        })
    }
}

/// Errors from parsing a root margin string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarginParseError {
    /// The margin string had no lengths.
    Empty,
    /// CSS margin shorthand accepts at most four lengths.
    TooManyLengths(usize),
    /// A token was not `<number>px`, `<number>%` or `0`.
    InvalidLength(String),
}

impl fmt::Display for MarginParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "root margin is empty"),
            Self::TooManyLengths(n) => write!(f, "root margin has {n} lengths, expected 1 to 4"),
            Self::InvalidLength(token) => write!(f, "invalid root margin length: {token}"),
        }
    }
}

impl std::error::Error for MarginParseError {}

/// Grow (positive) or shrink (negative) the observation root, CSS-margin style.
///
/// ```
/// # use folio_core::geometry::{Rect, RootMargin};
/// let margin: RootMargin = "-60% 0px -35% 0px".parse().unwrap();
/// let band = margin.apply(&Rect::new(0.0, 0.0, 800.0, 1000.0));
/// assert_eq!(band, Rect::new(0.0, 600.0, 800.0, 50.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RootMargin {
    pub top: MarginLength,
    pub right: MarginLength,
    pub bottom: MarginLength,
    pub left: MarginLength,
}

impl Default for RootMargin {
    fn default() -> Self {
        Self::ZERO
    }
}

impl RootMargin {
    pub const ZERO: Self = Self {
        top: MarginLength::Px(0.0),
        right: MarginLength::Px(0.0),
        bottom: MarginLength::Px(0.0),
        left: MarginLength::Px(0.0),
    };

    /// Shrink the bottom edge by `fraction` of the root height.
    ///
    /// `bottom_shrink(0.1)` is `"0px 0px -10% 0px"`.
    #[must_use]
    pub fn bottom_shrink(fraction: f64) -> Self {
        Self {
            bottom: MarginLength::Percent(-fraction * 100.0),
            ..Self::ZERO
        }
    }

    /// Parse CSS margin shorthand (one to four lengths).
    pub fn parse(raw: &str) -> Result<Self, MarginParseError> {
        let lengths = raw
            .split_whitespace()
            .map(str::parse::<MarginLength>)
            .collect::<Result<Vec<_>, _>>()?;
        let [top, right, bottom, left] = match lengths.as_slice() {
            [] => return Err(MarginParseError::Empty),
            [all] => [*all; 4],
            [vertical, horizontal] => [*vertical, *horizontal, *vertical, *horizontal],
            [top, horizontal, bottom] => [*top, *horizontal, *bottom, *horizontal],
            [top, right, bottom, left] => [*top, *right, *bottom, *left],
            more => return Err(MarginParseError::TooManyLengths(more.len())),
        };
        Ok(Self {
            top,
            right,
            bottom,
            left,
        })
    }

    /// The effective observation root for a viewport rectangle.
    #[must_use]
    pub fn apply(&self, root: &Rect) -> Rect {
        let top = self.top.resolve(root.height);
        let bottom = self.bottom.resolve(root.height);
        let left = self.left.resolve(root.width);
        let right = self.right.resolve(root.width);
        Rect::new(
            root.x - left,
            root.y - top,
            root.width + left + right,
            root.height + top + bottom,
        )
    }
}

impl FromStr for RootMargin {
    type Err = MarginParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        Self::parse(raw)
    }
}

impl fmt::Display for RootMargin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} {}", self.top, self.right, self.bottom, self.left)
    }
}

/// Sorted visibility-ratio thresholds of one observer.
#[derive(Debug, Clone, PartialEq)]
pub struct ThresholdSet {
    values: Vec<f64>,
}

impl Default for ThresholdSet {
    fn default() -> Self {
        Self { values: vec![0.0] }
    }
}

impl ThresholdSet {
    /// Build from arbitrary values: NaN dropped, clamped, sorted, deduplicated.
    ///
    /// An empty input behaves like `[0.0]`.
    #[must_use]
    pub fn new(values: impl IntoIterator<Item = f64>) -> Self {
        let mut values: Vec<f64> = values
            .into_iter()
            .filter(|v| !v.is_nan())
            .map(|v| v.clamp(0.0, 1.0))
            .collect();
        values.sort_by(f64::total_cmp);
        values.dedup();
        if values.is_empty() {
            values.push(0.0);
        }
        Self { values }
    }

    /// A single threshold.
    #[must_use]
    pub fn single(value: f64) -> Self {
        Self::new([value])
    }

    #[must_use]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Number of thresholds at or below `ratio`.
    ///
    /// A change of this index (or of the intersecting flag) between two
    /// observations is what produces a callback.
    #[must_use]
    pub fn index_of(&self, ratio: f64) -> usize {
        self.values.iter().take_while(|t| ratio >= **t).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    const VIEWPORT: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 1000.0,
        height: 1000.0,
    };

    #[test]
    fn parse_four_value_margin() {
        let margin = RootMargin::parse("-60% 0px -35% 0px").unwrap();
        assert_eq!(margin.top, MarginLength::Percent(-60.0));
        assert_eq!(margin.right, MarginLength::Px(0.0));
        assert_eq!(margin.bottom, MarginLength::Percent(-35.0));
        assert_eq!(margin.left, MarginLength::Px(0.0));
    }

    #[test]
    fn parse_shorthand_forms() {
        let one = RootMargin::parse("10px").unwrap();
        assert_eq!(one.left, MarginLength::Px(10.0));
        let two = RootMargin::parse("5% 0").unwrap();
        assert_eq!(two.bottom, MarginLength::Percent(5.0));
        assert_eq!(two.right, MarginLength::Px(0.0));
        let three = RootMargin::parse("1px 2px 3px").unwrap();
        assert_eq!(three.left, MarginLength::Px(2.0));
        assert_eq!(three.bottom, MarginLength::Px(3.0));
    }

    #[test]
    fn parse_errors() {
        assert_eq!(RootMargin::parse("  "), Err(MarginParseError::Empty));
        assert_eq!(
            RootMargin::parse("1px 1px 1px 1px 1px"),
            Err(MarginParseError::TooManyLengths(5))
        );
        assert_eq!(
            RootMargin::parse("1em"),
            Err(MarginParseError::InvalidLength("1em".into()))
        );
    }

    #[test]
    fn display_round_trips_through_css() {
        let margin = RootMargin::bottom_shrink(0.1);
        assert_eq!(margin.to_string(), "0px 0px -10% 0px");
        assert_eq!(RootMargin::parse(&margin.to_string()).unwrap(), margin);
    }

    #[test]
    fn spy_margin_leaves_central_band() {
        let band = RootMargin::parse("-60% 0px -35% 0px")
            .unwrap()
            .apply(&VIEWPORT);
        assert_eq!(band, Rect::new(0.0, 600.0, 1000.0, 50.0));
    }

    #[test]
    fn overlapping_margins_collapse_to_empty_root() {
        let root = RootMargin::parse("-70% 0px -70% 0px")
            .unwrap()
            .apply(&VIEWPORT);
        assert_eq!(root.height, 0.0);
    }

    #[test]
    fn ratio_of_partially_visible_target() {
        let target = Rect::new(0.0, 900.0, 1000.0, 200.0);
        let (hit, ratio) = intersection_ratio(&target, &VIEWPORT);
        assert!(hit);
        assert!((ratio - 0.5).abs() < 1e-9);
    }

    #[test]
    fn edge_adjacent_counts_as_intersecting() {
        let target = Rect::new(0.0, 1000.0, 100.0, 100.0);
        assert_eq!(intersection_ratio(&target, &VIEWPORT), (true, 0.0));
        let below = Rect::new(0.0, 1001.0, 100.0, 100.0);
        assert_eq!(intersection_ratio(&below, &VIEWPORT), (false, 0.0));
    }

    #[test]
    fn zero_area_target_reports_full_ratio() {
        let target = Rect::new(10.0, 10.0, 0.0, 0.0);
        assert_eq!(intersection_ratio(&target, &VIEWPORT), (true, 1.0));
    }

    #[test]
    fn threshold_set_normalizes() {
        let set = ThresholdSet::new([1.0, 0.5, f64::NAN, 0.5, -1.0, 0.2]);
        assert_eq!(set.values(), &[0.0, 0.2, 0.5, 1.0]);
        assert_eq!(ThresholdSet::new([]).values(), &[0.0]);
    }

    #[test]
    fn threshold_index_counts_crossed_values() {
        let set = ThresholdSet::new([0.0, 0.2, 0.5, 1.0]);
        assert_eq!(set.index_of(0.0), 1);
        assert_eq!(set.index_of(0.19), 1);
        assert_eq!(set.index_of(0.2), 2);
        assert_eq!(set.index_of(0.7), 3);
        assert_eq!(set.index_of(1.0), 4);
    }
}
