//! Rebuild a single gridded field from previously written rows

use ndarray::Array2;

use crate::error::Result;
use crate::grid::GridIndex;
use crate::io::ingest::numeric_field;
use crate::io::RowSource;

/// Read a `height × width` field from `source`, placing each row's value at
/// the cell its coordinates fall in. Cells no row reaches are `NaN`; a later
/// row for the same cell overwrites an earlier one. Rows outside the grid
/// and rows missing a field are ignored; a field that is not a finite
/// number is an error.
pub fn read_field<S>(
    source: &S,
    index: &GridIndex,
    lat_col: usize,
    lon_col: usize,
    value_col: usize,
) -> Result<Array2<f64>>
where
    S: RowSource + ?Sized,
{
    let mut field = Array2::from_elem((index.height(), index.width()), f64::NAN);

    source.visit_rows(&mut |line, fields| {
        if let (Some(lat), Some(lon), Some(value)) = (
            numeric_field(fields, lat_col, line)?,
            numeric_field(fields, lon_col, line)?,
            numeric_field(fields, value_col, line)?,
        ) {
            if let Some((x, y)) = index.cell_of(lat, lon) {
                field[(y, x)] = value;
            }
        }
        Ok(())
    })?;

    Ok(field)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridSpec;
    use crate::io::MemorySource;

    #[test]
    fn rows_land_in_their_cells() {
        let index = GridIndex::new(&GridSpec::new(0.0, 2.0, 0.0, 3.0, 1.0, 1.0)).unwrap();
        let src = MemorySource::new(["0,0,1", "0,2,2", "1,1,3", "9,9,9", "1,2"], ',');
        let field = read_field(&src, &index, 0, 1, 2).unwrap();
        assert_eq!(field.dim(), (2, 3));
        assert_eq!(field[(0, 0)], 1.0);
        assert_eq!(field[(0, 2)], 2.0);
        assert_eq!(field[(1, 1)], 3.0);
        assert!(field[(1, 2)].is_nan());
    }

    #[test]
    fn nan_value_is_rejected() {
        let index = GridIndex::new(&GridSpec::new(0.0, 2.0, 0.0, 3.0, 1.0, 1.0)).unwrap();
        let src = MemorySource::new(["0,0,1", "1,1,nan"], ',');
        let err = read_field(&src, &index, 0, 1, 2).unwrap_err();
        assert!(matches!(
            err,
            crate::Error::MalformedField { line: 2, column: 2, .. }
        ));
    }
}
