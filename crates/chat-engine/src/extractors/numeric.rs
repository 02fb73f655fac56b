// Numeric parameter extraction for chat messages
use lazy_static::lazy_static;
use regex::Regex;

pub const DEFAULT_TOP_COUNT: u32 = 5;
pub const MAX_TOP_COUNT: u32 = 100;
pub const DEFAULT_HEIGHT_RANGE: (f64, f64) = (100.0, 500.0);

lazy_static! {
    static ref TOP_N: Regex = Regex::new(r"top\s+(\d+)").unwrap();
    static ref HEIGHT_RANGE: Regex =
        Regex::new(r"(\d+)\s*(to|-)\s*(\d+)\s*(meters?|m)").unwrap();
    static ref EXACT_HEIGHT: Regex = Regex::new(
        r"(?:exactly|precisely)\s+(\d+(?:\.\d+)?)|(\d+(?:\.\d+)?)\s*(?:meters?|m)\s+tall"
    )
    .unwrap();
    static ref OVER_HEIGHT: Regex = Regex::new(
        r"(?:over|above|taller than|more than|greater than|higher than)\s+(\d+(?:\.\d+)?)"
    )
    .unwrap();
    static ref UNDER_HEIGHT: Regex = Regex::new(
        r"(?:under|below|shorter than|less than|lower than)\s+(\d+(?:\.\d+)?)"
    )
    .unwrap();
}

/// Height constraint stated in a search message
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HeightComparator {
    Exact(f64),
    Over(f64),
    Under(f64),
    Between(f64, f64),
}

impl HeightComparator {
    /// Inclusive (min, max) bounds. `Exact` matches heights that round to the value.
    pub fn bounds(&self) -> (Option<f64>, Option<f64>) {
        match *self {
            HeightComparator::Exact(h) => (Some(h - 0.5), Some(h + 0.5)),
            HeightComparator::Over(h) => (Some(h), None),
            HeightComparator::Under(h) => (None, Some(h)),
            HeightComparator::Between(min, max) => (Some(min), Some(max)),
        }
    }

    pub fn describe(&self) -> String {
        match *self {
            HeightComparator::Exact(h) => format!("about {}m tall", h),
            HeightComparator::Over(h) => format!("over {}m", h),
            HeightComparator::Under(h) => format!("under {}m", h),
            HeightComparator::Between(min, max) => format!("between {}m and {}m", min, max),
        }
    }
}

/// N from "top N", clamped to 1..=100; 5 when no number is given.
/// Numbers too long to parse saturate at the maximum.
pub fn extract_top_count(text: &str) -> u32 {
    TOP_N
        .captures(text)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().parse::<u64>().unwrap_or(u64::MAX))
        .map(|n| n.clamp(1, u64::from(MAX_TOP_COUNT)) as u32)
        .unwrap_or(DEFAULT_TOP_COUNT)
}

/// Explicit "A to B meters" / "A-B m" range, ordered low to high
pub fn extract_height_range(text: &str) -> Option<(f64, f64)> {
    let cap = HEIGHT_RANGE.captures(text)?;
    let a: f64 = cap.get(1)?.as_str().parse().ok()?;
    let b: f64 = cap.get(3)?.as_str().parse().ok()?;
    Some(if a <= b { (a, b) } else { (b, a) })
}

/// Range for the height-range intent, falling back to 100–500 m
pub fn height_range_or_default(text: &str) -> (f64, f64) {
    extract_height_range(text).unwrap_or(DEFAULT_HEIGHT_RANGE)
}

fn first_number(re: &Regex, text: &str) -> Option<f64> {
    let cap = re.captures(text)?;
    cap.iter()
        .skip(1)
        .flatten()
        .next()
        .and_then(|m| m.as_str().parse().ok())
}

/// Height comparator in a search message: range, then over, then under, then exact.
/// "over 200 meters tall" is a lower bound, not an exact height.
pub fn extract_height_comparator(text: &str) -> Option<HeightComparator> {
    if let Some((min, max)) = extract_height_range(text) {
        return Some(HeightComparator::Between(min, max));
    }
    if let Some(h) = first_number(&OVER_HEIGHT, text) {
        return Some(HeightComparator::Over(h));
    }
    if let Some(h) = first_number(&UNDER_HEIGHT, text) {
        return Some(HeightComparator::Under(h));
    }
    first_number(&EXACT_HEIGHT, text).map(HeightComparator::Exact)
}
