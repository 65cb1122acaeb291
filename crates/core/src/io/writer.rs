//! Delimited text output of a finished grid

use std::io::Write;

use crate::axis::VariableAxis;
use crate::config::ColumnLayout;
use crate::error::{Error, Result};
use crate::grid::Grid;

/// Options for writing grid rows
#[derive(Debug, Clone, PartialEq)]
pub struct WriteOptions {
    /// Field separator
    pub delimiter: char,
    /// Emitted for every slot of a cell that never matched an observation
    pub default_value: f64,
    /// Fixed number of decimals; `None` prints the shortest exact form
    pub precision: Option<usize>,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            delimiter: ',',
            default_value: 0.0,
            precision: None,
        }
    }
}

impl WriteOptions {
    fn format(&self, value: f64) -> String {
        match self.precision {
            Some(p) => format!("{value:.p$}"),
            None => value.to_string(),
        }
    }
}

/// Write one line per grid point in row-major order:
/// `lat, lon, v0, v1, ...`.
pub fn write_grid<W: Write>(grid: &Grid, mut writer: W, options: &WriteOptions) -> Result<()> {
    let index = grid.index();
    let delim = options.delimiter;
    let mut line = String::new();

    for (x, y) in index.cells() {
        let (lat, lon) = index.grid_point(x, y);
        line.clear();
        line.push_str(&options.format(lat));
        line.push(delim);
        line.push_str(&options.format(lon));
        for slot in 0..grid.num_values() {
            line.push(delim);
            line.push_str(&options.format(grid.value_or(x, y, slot, options.default_value)));
        }
        line.push('\n');
        writer.write_all(line.as_bytes())?;
    }
    writer.flush()?;
    Ok(())
}

/// Write the grid of a tagged run: the whole grid once per variable, in
/// axis order.
///
/// Each line has `layout.max_column() + 1` fields. Latitude, longitude,
/// both tag keys and the variable's value are placed at their input column
/// positions; the remaining fields are left empty.
pub fn write_tagged_grid<W: Write>(
    grid: &Grid,
    axis: &VariableAxis,
    layout: &ColumnLayout,
    mut writer: W,
    options: &WriteOptions,
) -> Result<()> {
    layout.validate()?;
    let ColumnLayout::Tagged {
        lat: lat_col,
        lon: lon_col,
        tag,
        value: value_col,
    } = *layout
    else {
        return Err(Error::invalid(
            "layout",
            "direct",
            "tagged output needs a tagged column layout",
        ));
    };
    if axis.len() != grid.num_values() {
        return Err(Error::SlotOutOfRange {
            slot: axis.len(),
            num_values: grid.num_values(),
        });
    }

    let index = grid.index();
    let delim = options.delimiter.to_string();
    let mut fields = vec![String::new(); layout.max_column() + 1];

    for (slot, key) in axis.keys().iter().enumerate() {
        fields.iter_mut().for_each(String::clear);
        fields[tag.0] = key.first.clone();
        fields[tag.1] = key.second.clone();

        for (x, y) in index.cells() {
            let (lat, lon) = index.grid_point(x, y);
            fields[lat_col] = options.format(lat);
            fields[lon_col] = options.format(lon);
            fields[value_col] = options.format(grid.value_or(x, y, slot, options.default_value));
            writer.write_all(fields.join(&delim).as_bytes())?;
            writer.write_all(b"\n")?;
        }
    }
    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::axis::TagKey;
    use crate::config::GridSpec;
    use ndarray::{Array2, Array3};

    fn filled_grid(num_values: usize) -> Grid {
        let mut grid =
            Grid::from_spec(&GridSpec::new(0.0, 2.0, 10.0, 12.0, 1.0, 1.0), num_values).unwrap();
        let mut next = Array3::zeros((2, 2, num_values));
        for slot in 0..num_values {
            next[(0, 1, slot)] = 1.5 + slot as f64;
        }
        let mut matched = Array2::from_elem((2, 2), false);
        matched[(0, 1)] = true;
        grid.commit_pass(next, &matched).unwrap();
        grid
    }

    fn render(f: impl FnOnce(&mut Vec<u8>) -> Result<()>) -> String {
        let mut buf = Vec::new();
        f(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn direct_output_is_row_major_with_defaults() {
        let grid = filled_grid(2);
        let options = WriteOptions {
            default_value: -9.0,
            ..Default::default()
        };
        let out = render(|buf| write_grid(&grid, buf, &options));
        assert_eq!(
            out,
            "0,10,-9,-9\n0,11,1.5,2.5\n1,10,-9,-9\n1,11,-9,-9\n"
        );
    }

    #[test]
    fn precision_and_delimiter() {
        let grid = filled_grid(1);
        let options = WriteOptions {
            delimiter: ';',
            default_value: 0.0,
            precision: Some(2),
        };
        let out = render(|buf| write_grid(&grid, buf, &options));
        assert_eq!(out.lines().nth(1), Some("0.00;11.00;1.50"));
    }

    #[test]
    fn tagged_output_repeats_grid_per_variable() {
        let grid = filled_grid(2);
        let axis = VariableAxis::from_keys([TagKey::new("TMP", "2m"), TagKey::new("RH", "2m")]);
        let layout = ColumnLayout::Tagged {
            lat: 2,
            lon: 3,
            tag: (0, 1),
            value: 5,
        };
        let out = render(|buf| {
            write_tagged_grid(&grid, &axis, &layout, buf, &WriteOptions::default())
        });
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines.len(), 8);
        assert_eq!(lines[0], "TMP,2m,0,10,,0");
        assert_eq!(lines[1], "TMP,2m,0,11,,1.5");
        assert_eq!(lines[5], "RH,2m,0,11,,2.5");
    }

    #[test]
    fn tagged_output_rejects_direct_layout() {
        let grid = filled_grid(1);
        let axis = VariableAxis::from_keys([TagKey::new("a", "b")]);
        let layout = ColumnLayout::Direct {
            lat: 0,
            lon: 1,
            values: vec![2],
        };
        let res = write_tagged_grid(&grid, &axis, &layout, Vec::new(), &WriteOptions::default());
        assert!(res.is_err());
    }

    #[test]
    fn tagged_output_rejects_overlapping_columns() {
        let grid = filled_grid(1);
        let axis = VariableAxis::from_keys([TagKey::new("T", "2m")]);
        let layout = ColumnLayout::Tagged {
            lat: 0,
            lon: 1,
            tag: (2, 3),
            value: 0,
        };
        let mut out = Vec::new();
        let res = write_tagged_grid(&grid, &axis, &layout, &mut out, &WriteOptions::default());
        assert!(matches!(res, Err(Error::InvalidParameter { name: "columns", .. })));
        assert!(out.is_empty());
    }
}
