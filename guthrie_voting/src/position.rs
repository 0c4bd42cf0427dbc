use std::cmp::Ordering;
use std::fmt::Display;

/// A point in the issue space. Every coordinate is in [0, 1] after normalization.
#[derive(PartialEq, Debug, Clone)]
pub struct Position {
    coords: Vec<f64>,
}

impl Position {
    pub fn new(coords: Vec<f64>) -> Position {
        assert!(!coords.is_empty(), "a position needs at least one axis");
        Position { coords }
    }

    /// A position on a single axis.
    pub fn on_line(x: f64) -> Position {
        Position { coords: vec![x] }
    }

    pub fn axes(&self) -> usize {
        self.coords.len()
    }

    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    pub(crate) fn coords_mut(&mut self) -> &mut [f64] {
        &mut self.coords
    }

    /// The coordinate on the first axis.
    pub fn primary(&self) -> f64 {
        self.coords[0]
    }

    /// Euclidean distance. On a single axis, this is the absolute difference.
    pub fn distance(&self, other: &Position) -> f64 {
        debug_assert_eq!(self.axes(), other.axes());
        if self.coords.len() == 1 {
            return (self.coords[0] - other.coords[0]).abs();
        }
        self.coords
            .iter()
            .zip(other.coords.iter())
            .map(|(a, b)| (a - b) * (a - b))
            .sum::<f64>()
            .sqrt()
    }

    /// Orders by the first axis only.
    pub fn cmp_primary(&self, other: &Position) -> Ordering {
        self.primary().total_cmp(&other.primary())
    }
}

impl Display for Position {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "(")?;
        for (idx, x) in self.coords.iter().enumerate() {
            if idx > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{:.3}", x)?;
        }
        write!(f, ")")
    }
}
