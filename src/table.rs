//! Adaptive text-table rendering bounded by the terminal width.
//!
//! Column widths start from the natural content width and are negotiated
//! down, one character at a time from the column with the most slack, until
//! the table fits or every column sits at its floor. Cells that no longer
//! fit their column are truncated with an ellipsis.

use std::io::{self, Write};

/// Preliminary per-cell cap, bounding the width computation.
const SOFT_CAP: usize = 28;

/// Render headers and rows as an aligned table no wider than `term_width`
/// (best effort: if every column is at its floor the table may still
/// overflow). Columns listed in `numeric_columns` are right-aligned.
pub fn render<W: Write>(
    mut out: W,
    headers: &[&str],
    rows: &[Vec<String>],
    numeric_columns: &[usize],
    term_width: usize,
) -> io::Result<()> {
    let mut cells: Vec<Vec<String>> = rows
        .iter()
        .map(|row| row.iter().map(|cell| truncate_cell(cell, SOFT_CAP)).collect())
        .collect();

    let mut widths: Vec<usize> = headers
        .iter()
        .enumerate()
        .map(|(col, header)| {
            cells
                .iter()
                .map(|row| row[col].chars().count())
                .chain(std::iter::once(header.chars().count()))
                .max()
                .unwrap_or(0)
        })
        .collect();

    if total_width(&widths) > term_width {
        let mut over_by = total_width(&widths) - term_width;
        let floors: Vec<usize> = headers
            .iter()
            .map(|header| header.chars().count().min(12).max(4))
            .collect();
        while over_by > 0 {
            // First column with the greatest slack; stable given fixed order.
            let slack = |col: usize| widths[col] as isize - floors[col] as isize;
            let mut widest = 0;
            for col in 1..widths.len() {
                if slack(col) > slack(widest) {
                    widest = col;
                }
            }
            if widths[widest] <= floors[widest] {
                break;
            }
            widths[widest] -= 1;
            over_by -= 1;
        }

        for row in &mut cells {
            for (col, cell) in row.iter_mut().enumerate() {
                *cell = truncate_cell(cell, widths[col]);
            }
        }
    }

    let header_line = headers
        .iter()
        .enumerate()
        .map(|(col, header)| pad(header, widths[col], false))
        .collect::<Vec<_>>()
        .join(" | ");
    writeln!(out, " {header_line}")?;

    let separator = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>()
        .join("-+-");
    writeln!(out, " {separator}")?;

    for row in &cells {
        let line = row
            .iter()
            .enumerate()
            .map(|(col, cell)| pad(cell, widths[col], numeric_columns.contains(&col)))
            .collect::<Vec<_>>()
            .join(" | ");
        writeln!(out, " {line}")?;
    }
    Ok(())
}

/// Total rendered width: cells, " | " separators, and the edge spaces.
fn total_width(widths: &[usize]) -> usize {
    widths.iter().sum::<usize>() + 3 * widths.len().saturating_sub(1) + 2
}

/// Cut `text` to at most `max_width` characters, marking the cut with an
/// ellipsis unless there is no room even for that.
fn truncate_cell(text: &str, max_width: usize) -> String {
    if text.chars().count() <= max_width {
        return text.to_string();
    }
    if max_width <= 1 {
        return text.chars().take(max_width).collect();
    }
    let mut cut: String = text.chars().take(max_width - 1).collect();
    cut.push('…');
    cut
}

fn pad(text: &str, width: usize, right_align: bool) -> String {
    let padding = " ".repeat(width.saturating_sub(text.chars().count()));
    if right_align {
        format!("{padding}{text}")
    } else {
        format!("{text}{padding}")
    }
}
