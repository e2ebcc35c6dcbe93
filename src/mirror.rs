//! Structural mirroring – reverses column order so that a renderer that only
//! places cells left to right produces a right-to-left reading order.
//!
//! Mirroring only permutes; cell contents are never looked at.

/// Reverse the entries of one row.
pub fn mirror_row<T: Clone>(row: &[T]) -> Vec<T> {
    row.iter().rev().cloned().collect()
}

/// Reverse the column order of every row, keeping rows top to bottom.
///
/// Column widths are not touched here; callers pass widths already in
/// visual (mirrored) order.
pub fn mirror_table<T: Clone>(rows: &[Vec<T>]) -> Vec<Vec<T>> {
    rows.iter().map(|row| mirror_row(row)).collect()
}

/// Rows of a line-item table that get a bottom border: the header row and
/// the row just above the last one (the subtotal/total boundary).
///
/// Returned indices are sorted and unique, so a two-row table yields `[0]`.
pub fn bordered_rows(row_count: usize) -> Vec<usize> {
    match row_count {
        0 => Vec::new(),
        1 | 2 => vec![0],
        n => vec![0, n - 2],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mirror_row_reverses() {
        assert_eq!(mirror_row(&["Date", "2024-01-01"]), vec!["2024-01-01", "Date"]);
    }

    #[test]
    fn mirroring_twice_is_identity() {
        let table = vec![
            vec!["Item", "Qty", "Price"],
            vec!["Widget", "2", "$10"],
            vec!["Total", "", "$20"],
        ];
        let twice = mirror_table(&mirror_table(&table));
        assert_eq!(twice, table);
    }

    #[test]
    fn mirror_table_keeps_rows_and_contents() {
        let table = vec![vec!["a", "b", "c"], vec!["d", "e", "f"]];
        let mirrored = mirror_table(&table);
        assert_eq!(mirrored.len(), table.len());
        assert_eq!(mirrored[0], vec!["c", "b", "a"]);
        assert_eq!(mirrored[1], vec!["f", "e", "d"]);
    }

    #[test]
    fn ragged_rows_mirror_independently() {
        let table = vec![vec!["a", "b"], vec!["c"]];
        assert_eq!(mirror_table(&table), vec![vec!["b", "a"], vec!["c"]]);
    }

    #[test]
    fn border_rows() {
        assert!(bordered_rows(0).is_empty());
        assert_eq!(bordered_rows(1), vec![0]);
        assert_eq!(bordered_rows(2), vec![0]);
        assert_eq!(bordered_rows(3), vec![0, 1]);
        assert_eq!(bordered_rows(6), vec![0, 4]);
    }
}
