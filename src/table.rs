//! Structural inspection of parsed tables.

use crate::docx::SourceDocument;
use crate::model::{Table, VMerge};

/// Read-only summary of a table's merge and row-shape features.
#[derive(Clone, Debug, PartialEq)]
pub struct TableStructure {
    pub has_horizontal_merge: bool,
    pub has_vertical_merge: bool,
    /// Rows occupy differing numbers of grid columns.
    pub irregular_rows: bool,
    /// Grid columns per row: spans plus `gridBefore`/`gridAfter`.
    pub row_cell_counts: Vec<usize>,
    /// Column widths in points from the table grid, `None` where undeclared.
    pub column_widths: Vec<Option<f32>>,
}

impl TableStructure {
    pub fn has_merged_cells(&self) -> bool {
        self.has_horizontal_merge || self.has_vertical_merge
    }

    pub fn is_complex(&self) -> bool {
        self.has_merged_cells() || self.irregular_rows
    }

    /// Widest row in grid columns, or the declared grid if wider.
    pub fn column_count(&self) -> usize {
        self.row_cell_counts
            .iter()
            .copied()
            .max()
            .unwrap_or(0)
            .max(self.column_widths.len())
    }
}

pub fn analyze(table: &Table) -> TableStructure {
    let cells = table.rows.iter().flat_map(|r| r.cells.iter());
    let has_horizontal_merge = cells.clone().any(|c| c.grid_span > 1);
    let has_vertical_merge = cells.clone().any(|c| c.v_merge != VMerge::None);

    let row_cell_counts: Vec<usize> = table.rows.iter().map(|r| r.grid_width()).collect();
    let irregular_rows = row_cell_counts.windows(2).any(|w| w[0] != w[1]);

    let column_widths = table
        .col_widths
        .iter()
        .map(|&w| (w > 0.0).then_some(w))
        .collect();

    TableStructure {
        has_horizontal_merge,
        has_vertical_merge,
        irregular_rows,
        row_cell_counts,
        column_widths,
    }
}

/// True when any body table of `source` needs reconstruction rather than a
/// verbatim splice.
pub fn has_complex_tables(source: &SourceDocument) -> bool {
    source.tables().enumerate().any(|(i, table)| {
        let structure = analyze(table);
        if structure.is_complex() {
            log::debug!(
                "table {i} is complex: merged={} irregular={} rows={:?}",
                structure.has_merged_cells(),
                structure.irregular_rows,
                structure.row_cell_counts
            );
        }
        structure.is_complex()
    })
}
