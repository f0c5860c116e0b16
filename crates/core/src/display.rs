// Text rendering for frames and columns, in the layout analysts expect
// from printed tables: right-aligned cells, a row index, and elided middle
// rows for long tables.

use std::fmt;

use crate::column::Column;
use crate::frame::DataFrame;

/// Tables longer than this print only their first and last rows.
pub const MAX_DISPLAY_ROWS: usize = 60;

/// Rows shown at each end of an elided table.
const EDGE_ROWS: usize = 5;

fn visible_rows(nrows: usize) -> (Vec<usize>, bool) {
    if nrows > MAX_DISPLAY_ROWS {
        let rows = (0..EDGE_ROWS).chain(nrows - EDGE_ROWS..nrows).collect();
        (rows, true)
    } else {
        ((0..nrows).collect(), false)
    }
}

fn width(s: &str) -> usize {
    s.chars().count()
}

impl fmt::Display for DataFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names = self.column_names();
        if self.nrows() == 0 {
            writeln!(f, "Empty DataFrame")?;
            writeln!(f, "Columns: [{}]", names.join(", "))?;
            return write!(f, "Index: []");
        }

        let (rows, truncated) = visible_rows(self.nrows());

        // grid[0] is the header; column 0 is the row index
        let mut grid: Vec<Vec<String>> = Vec::with_capacity(rows.len() + 1);
        grid.push(std::iter::once(String::new()).chain(names.iter().map(|n| n.to_string())).collect());
        for &r in &rows {
            let mut line = vec![r.to_string()];
            line.extend(self.columns().iter().map(|c| c.values()[r].to_string()));
            grid.push(line);
        }

        let ncols = grid[0].len();
        let widths: Vec<usize> = (0..ncols)
            .map(|c| grid.iter().map(|line| width(&line[c])).max().unwrap_or(0).max(3))
            .collect();

        let render = |line: &[String]| -> String {
            line.iter()
                .zip(&widths)
                .enumerate()
                .map(|(i, (cell, w))| {
                    if i == 0 {
                        format!("{cell:<w$}")
                    } else {
                        format!("{cell:>w$}")
                    }
                })
                .collect::<Vec<_>>()
                .join("  ")
                .trim_end()
                .to_string()
        };

        for (i, line) in grid.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", render(line))?;
            if truncated && i == EDGE_ROWS {
                let dots: Vec<String> = (0..ncols).map(|_| "...".to_string()).collect();
                write!(f, "\n{}", render(&dots))?;
            }
        }

        if truncated {
            write!(f, "\n\n[{} rows x {} columns]", self.nrows(), self.ncols())?;
        }
        Ok(())
    }
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (rows, truncated) = visible_rows(self.len());
        let index_w = rows.iter().map(|r| width(&r.to_string())).max().unwrap_or(1);
        let cells: Vec<String> = rows.iter().map(|&r| self.values()[r].to_string()).collect();
        let value_w = cells.iter().map(|c| width(c)).max().unwrap_or(0);

        for (n, (r, cell)) in rows.iter().zip(&cells).enumerate() {
            writeln!(f, "{:<index_w$}    {:>value_w$}", r, cell)?;
            if truncated && n + 1 == EDGE_ROWS {
                writeln!(f, "{:<index_w$}    {:>value_w$}", "...", "...")?;
            }
        }
        if truncated {
            write!(f, "Name: {}, Length: {}, dtype: {}", self.name(), self.len(), self.dtype())
        } else {
            write!(f, "Name: {}, dtype: {}", self.name(), self.dtype())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn test_render_small_frame() {
        let df = DataFrame::new(vec![
            Column::new("a", vec![Value::Int(1), Value::Int(22)]),
            Column::new("name", vec!["x".into(), "yy".into()]),
        ])
        .unwrap();
        let text = df.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "       a  name");
        assert_eq!(lines[1], "0      1     x");
        assert_eq!(lines[2], "1     22    yy");
    }

    #[test]
    fn test_render_long_frame_elides() {
        let df = DataFrame::new(vec![Column::new("n", (0..100).map(Value::Int).collect())]).unwrap();
        let text = df.to_string();
        assert!(text.contains("..."));
        assert!(text.ends_with("[100 rows x 1 columns]"));
        assert_eq!(text.lines().count(), 1 + 5 + 1 + 5 + 2);
    }

    #[test]
    fn test_render_empty_frame() {
        let df = DataFrame::new(vec![Column::new("a", vec![])]).unwrap();
        assert!(df.to_string().starts_with("Empty DataFrame"));
    }

    #[test]
    fn test_render_series() {
        let col = Column::new("x", vec![Value::Float(1.5), Value::Null]);
        assert_eq!(col.to_string(), "0    1.5\n1    NaN\nName: x, dtype: float64");
    }
}
