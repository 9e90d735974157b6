/// Hungarian (Kuhn-Munkres) solver for maximum-weight one-to-one assignment
///
/// Rows are current-frame boxes, columns are previous-frame boxes, and the
/// weight of a cell is the number of keypoint correspondences linking them.
use ndarray::ArrayView2;
use pathfinding::prelude::{kuhn_munkres, Matrix};
use rayon::prelude::*;

/// Result of the assignment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentResult {
    /// Assignments as (row_idx, col_idx) pairs, sorted by row
    pub assignments: Vec<(usize, usize)>,
    /// Indices of rows left without a partner
    pub unassigned_rows: Vec<usize>,
    /// Indices of columns left without a partner
    pub unassigned_cols: Vec<usize>,
    /// Sum of weights over the kept assignments
    pub total_weight: i64,
}

/// Maximum-weight bipartite matching
pub struct HungarianSolver;

impl HungarianSolver {
    /// Solve for the one-to-one assignment maximizing total weight.
    ///
    /// Zero-weight pairs are dropped from the result, so a row is only ever
    /// paired with a column it actually shares votes with.
    pub fn solve_max(weights: ArrayView2<u32>) -> AssignmentResult {
        let num_rows = weights.nrows();
        let num_cols = weights.ncols();

        if num_rows == 0 || num_cols == 0 {
            return AssignmentResult {
                assignments: Vec::new(),
                unassigned_rows: (0..num_rows).collect(),
                unassigned_cols: (0..num_cols).collect(),
                total_weight: 0,
            };
        }

        // kuhn_munkres needs rows <= columns; pad to square with zero weight
        let size = num_rows.max(num_cols);
        let mut weight_matrix = Matrix::new(size, size, 0i64);

        let cells: Vec<(usize, usize, i64)> = (0..num_rows)
            .into_par_iter()
            .flat_map_iter(|i| (0..num_cols).map(move |j| (i, j, weights[[i, j]] as i64)))
            .collect();

        for (i, j, w) in cells {
            weight_matrix[(i, j)] = w;
        }

        let (_, raw_assignments) = kuhn_munkres(&weight_matrix);

        let assignments: Vec<(usize, usize)> = raw_assignments
            .iter()
            .enumerate()
            .filter(|&(row, &col)| row < num_rows && col < num_cols && weights[[row, col]] > 0)
            .map(|(row, &col)| (row, col))
            .collect();

        let mut row_used = vec![false; num_rows];
        let mut col_used = vec![false; num_cols];
        for &(row, col) in &assignments {
            row_used[row] = true;
            col_used[col] = true;
        }

        let total_weight = assignments
            .iter()
            .map(|&(row, col)| weights[[row, col]] as i64)
            .sum();

        AssignmentResult {
            assignments,
            unassigned_rows: (0..num_rows).filter(|&i| !row_used[i]).collect(),
            unassigned_cols: (0..num_cols).filter(|&j| !col_used[j]).collect(),
            total_weight,
        }
    }
}
