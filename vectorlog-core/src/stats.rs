//! Aggregate statistics over a decoded record stream.
//!
//! [`Statistics`] is a single-pass accumulator: it works the same over a
//! materialized `Vec<Record>` or a lazy iterator.

use crate::types::{EventKind, Record};
use std::borrow::Borrow;
use std::fmt;

const NO_DATA: &str = "no data";

/// Inclusive `(min, max)` of a set of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Range {
    pub min: u64,
    pub max: u64,
}

impl Range {
    #[inline]
    fn extend(range: &mut Option<Range>, value: u64) {
        match range {
            Some(r) => {
                r.min = r.min.min(value);
                r.max = r.max.max(value);
            }
            None => {
                *range = Some(Range {
                    min: value,
                    max: value,
                })
            }
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.min, self.max)
    }
}

/// Descriptive statistics of a vector log.
///
/// Ranges and averages are computed over the coordinate-bearing subset:
/// samples whose `x` is present. `None` means "no data".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Statistics {
    /// Number of records seen (samples and events)
    pub record_count: usize,
    /// Samples with a present `x`
    pub total_points: usize,
    /// `max(frame) + 1` over all records, 0 when empty
    pub frame_count: u64,
    pub x_range: Option<Range>,
    /// Over coordinate-bearing samples that also carry `y`
    pub y_range: Option<Range>,
    /// Over coordinate-bearing samples that also carry `z`
    pub z_range: Option<Range>,
    pub blank_count: usize,
    pub unblank_count: usize,
    z_sum: u128,
    z_count: usize,
}

impl Statistics {
    /// Creates an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes statistics over a record stream in one pass.
    pub fn compute<I>(records: I) -> Self
    where
        I: IntoIterator,
        I::Item: Borrow<Record>,
    {
        let mut stats = Self::new();
        for record in records {
            stats.push(record.borrow());
        }
        stats
    }

    /// Adds one record.
    pub fn push(&mut self, record: &Record) {
        self.record_count += 1;
        self.frame_count = self.frame_count.max(record.frame().saturating_add(1));

        match record {
            Record::Sample(sample) => {
                let Some(x) = sample.x else {
                    return;
                };
                self.total_points += 1;
                Range::extend(&mut self.x_range, x);
                if let Some(y) = sample.y {
                    Range::extend(&mut self.y_range, y);
                }
                if let Some(z) = sample.z {
                    Range::extend(&mut self.z_range, z);
                    self.z_sum += u128::from(z);
                    self.z_count += 1;
                }
            }
            Record::Event(event) => match event.kind {
                EventKind::Blank => self.blank_count += 1,
                EventKind::Unblank => self.unblank_count += 1,
            },
        }
    }

    /// Mean `z` over coordinate-bearing samples with a present `z`.
    pub fn z_average(&self) -> Option<f64> {
        if self.z_count == 0 {
            return None;
        }
        Some(self.z_sum as f64 / self.z_count as f64)
    }

    /// Average number of points per frame.
    pub fn points_per_frame(&self) -> Option<f64> {
        if self.frame_count == 0 {
            return None;
        }
        Some(self.total_points as f64 / self.frame_count as f64)
    }

    /// Returns true if no coordinate-bearing sample was seen.
    pub fn is_empty(&self) -> bool {
        self.total_points == 0
    }
}

impl<R: Borrow<Record>> FromIterator<R> for Statistics {
    fn from_iter<I: IntoIterator<Item = R>>(iter: I) -> Self {
        Self::compute(iter)
    }
}

impl fmt::Display for Statistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Statistics ===")?;
        writeln!(f, "Total points: {}", self.total_points)?;
        writeln!(f, "Frames: {}", self.frame_count)?;
        if let Some(avg) = self.points_per_frame() {
            writeln!(f, "Avg points/frame: {:.1}", avg)?;
        }
        writeln!(f)?;

        let show =
            |range: Option<Range>| range.map_or_else(|| NO_DATA.to_string(), |r| r.to_string());
        writeln!(f, "X range: {}", show(self.x_range))?;
        writeln!(f, "Y range: {}", show(self.y_range))?;
        writeln!(f, "Z range: {}", show(self.z_range))?;
        match self.z_average() {
            Some(avg) => writeln!(f, "Z average: {:.1}", avg)?,
            None => writeln!(f, "Z average: {}", NO_DATA)?,
        }
        writeln!(f)?;

        writeln!(f, "Blank events: {}", self.blank_count)?;
        write!(f, "Unblank events: {}", self.unblank_count)
    }
}
