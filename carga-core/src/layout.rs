//! Three-column layout for printable piece tables.
//!
//! ```text
//! pieces:  [1 2 3 4 5 6 7]
//! per_col: ceil(7 / 3) = 3
//! columns: [1 2 3] [4 5 6] [7]
//! ```

use crate::config::COLUMN_COUNT;
use crate::model::{Piece, Platform};

/// Sizes of the three columns for `total` pieces.
///
/// Columns take `ceil(total / 3)` pieces each, in order; the last one gets
/// what remains and may be shorter or empty.
#[must_use]
pub fn column_sizes(total: usize) -> [usize; COLUMN_COUNT] {
    let per_column = total.div_ceil(COLUMN_COUNT);
    let mut sizes = [0; COLUMN_COUNT];
    let mut remaining = total;
    for size in &mut sizes {
        *size = per_column.min(remaining);
        remaining -= *size;
    }
    sizes
}

/// A piece list partitioned into three contiguous columns.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSplit<'a> {
    columns: [&'a [Piece]; COLUMN_COUNT],
}

impl<'a> ColumnSplit<'a> {
    /// The three columns, left to right.
    #[must_use]
    pub fn columns(&self) -> &[&'a [Piece]; COLUMN_COUNT] {
        &self.columns
    }

    /// Iterate columns left to right.
    pub fn iter(&self) -> impl Iterator<Item = &'a [Piece]> + '_ {
        self.columns.iter().copied()
    }

    /// Column sizes.
    #[must_use]
    pub fn sizes(&self) -> [usize; COLUMN_COUNT] {
        self.columns.map(<[Piece]>::len)
    }

    /// Whether every column is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|c| c.is_empty())
    }

    /// Concatenate the columns back into one list.
    #[must_use]
    pub fn concat(&self) -> Vec<Piece> {
        self.columns.concat()
    }
}

/// Split pieces into three balanced columns, preserving order.
#[must_use]
pub fn split_columns(pieces: &[Piece]) -> ColumnSplit<'_> {
    let [first, second, _] = column_sizes(pieces.len());
    let (col1, rest) = pieces.split_at(first);
    let (col2, col3) = rest.split_at(second);
    ColumnSplit {
        columns: [col1, col2, col3],
    }
}

/// Totals row, taken verbatim from the platform's precomputed aggregates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TotalsRow {
    /// Total length in metres.
    pub total_length: f64,
    /// Standard width in metres.
    pub standard_width: f64,
    /// Total linear metres.
    pub total_linear_meters: f64,
}

impl TotalsRow {
    /// Build the totals row without re-summing pieces.
    #[must_use]
    pub fn from_platform(platform: &Platform) -> Self {
        Self {
            total_length: platform.total_length,
            standard_width: platform.standard_width,
            total_linear_meters: platform.total_linear_meters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn pieces(n: u32) -> Vec<Piece> {
        (1..=n).map(|i| Piece::new(i, f64::from(i), 1.0)).collect()
    }

    #[test]
    fn test_seven_pieces() {
        let list = pieces(7);
        let split = split_columns(&list);
        assert_eq!(split.sizes(), [3, 3, 1]);
        assert_eq!(split.columns()[2][0].number, 7);
    }

    #[test]
    fn test_small_counts_follow_slice_semantics() {
        assert_eq!(column_sizes(0), [0, 0, 0]);
        assert_eq!(column_sizes(1), [1, 0, 0]);
        assert_eq!(column_sizes(4), [2, 2, 0]);
        assert_eq!(column_sizes(9), [3, 3, 3]);
        assert_eq!(column_sizes(10), [4, 4, 2]);
    }

    #[test]
    fn test_empty_split() {
        let split = split_columns(&[]);
        assert!(split.is_empty());
        assert_eq!(split.iter().count(), 3);
    }

    #[test]
    fn test_totals_are_not_resummed() {
        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).expect("date");
        let mut platform = Platform::new("P", date).with_pieces(pieces(3));
        platform.total_linear_meters = 123.456;
        platform.standard_width = 1.2;
        let totals = TotalsRow::from_platform(&platform);
        assert!((totals.total_linear_meters - 123.456).abs() < f64::EPSILON);
        assert!((totals.standard_width - 1.2).abs() < f64::EPSILON);
    }

    proptest! {
        #[test]
        fn prop_split_is_balanced_and_lossless(n in 0u32..300) {
            let list = pieces(n);
            let split = split_columns(&list);
            let per = list.len().div_ceil(3);
            let sizes = split.sizes();
            prop_assert_eq!(sizes[0], per.min(list.len()));
            prop_assert!(sizes[1] <= per);
            prop_assert!(sizes[2] <= per);
            prop_assert_eq!(sizes.iter().sum::<usize>(), list.len());
            if list.len() >= 3 {
                prop_assert_eq!(sizes[1], per);
                prop_assert_eq!(sizes[2], list.len() - 2 * per);
            }
            prop_assert_eq!(split.concat(), list);
        }
    }
}
