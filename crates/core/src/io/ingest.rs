//! Row ingestion: parse coordinates and values, bucket them into the grid

use crate::axis::VariableAxis;
use crate::config::ColumnLayout;
use crate::error::{Error, Result};
use crate::grid::Grid;
use crate::io::RowSource;

/// Counters collected while ingesting rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Rows carrying every required field
    pub rows: usize,
    /// Rows attached to a grid cell
    pub gridded: usize,
    /// Rows whose coordinates fall outside the grid
    pub out_of_grid: usize,
    /// Rows missing a required field
    pub skipped: usize,
}

/// Parse `fields[column]` as a finite number. `Ok(None)` when the row is
/// too short; `NaN` and infinities are rejected like any other bad field.
pub(crate) fn numeric_field(fields: &[&str], column: usize, line: usize) -> Result<Option<f64>> {
    let Some(raw) = fields.get(column) else {
        return Ok(None);
    };
    match raw.trim().parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(Error::MalformedField {
            line,
            column,
            value: raw.to_string(),
        }),
    }
}

/// Read every row of `source` into `grid` according to `layout`.
///
/// A tagged layout needs the `axis` produced by the pre-scan; a row whose
/// tag pair is not on the axis aborts ingestion with
/// [`Error::SchemaViolation`]. Rows outside the grid are counted and dropped.
pub fn ingest<S>(
    source: &S,
    layout: &ColumnLayout,
    axis: Option<&VariableAxis>,
    grid: &mut Grid,
) -> Result<IngestStats>
where
    S: RowSource + ?Sized,
{
    layout.validate()?;
    match layout {
        ColumnLayout::Direct { lat, lon, values } => {
            ingest_direct(source, (*lat, *lon), values, grid)
        }
        ColumnLayout::Tagged {
            lat,
            lon,
            tag,
            value,
        } => {
            let axis = axis.ok_or_else(|| {
                Error::invalid("axis", "none", "a tagged layout needs a discovered variable axis")
            })?;
            if axis.len() != grid.num_values() {
                return Err(Error::invalid(
                    "axis",
                    axis.len(),
                    format!("grid was allocated with {} value slots", grid.num_values()),
                ));
            }
            ingest_tagged(source, (*lat, *lon), *tag, *value, axis, grid)
        }
    }
}

fn ingest_direct<S>(
    source: &S,
    (lat_col, lon_col): (usize, usize),
    value_cols: &[usize],
    grid: &mut Grid,
) -> Result<IngestStats>
where
    S: RowSource + ?Sized,
{
    let mut stats = IngestStats::default();
    let mut values = Vec::with_capacity(value_cols.len());

    source.visit_rows(&mut |line, fields| {
        let (Some(lat), Some(lon)) = (
            numeric_field(fields, lat_col, line)?,
            numeric_field(fields, lon_col, line)?,
        ) else {
            stats.skipped += 1;
            return Ok(());
        };

        values.clear();
        for &col in value_cols {
            match numeric_field(fields, col, line)? {
                Some(v) => values.push(v),
                None => {
                    stats.skipped += 1;
                    return Ok(());
                }
            }
        }

        stats.rows += 1;
        match grid.add_observation(lat, lon, &values)? {
            Some(_) => stats.gridded += 1,
            None => stats.out_of_grid += 1,
        }
        Ok(())
    })?;

    Ok(stats)
}

fn ingest_tagged<S>(
    source: &S,
    (lat_col, lon_col): (usize, usize),
    tag: (usize, usize),
    value_col: usize,
    axis: &VariableAxis,
    grid: &mut Grid,
) -> Result<IngestStats>
where
    S: RowSource + ?Sized,
{
    let mut stats = IngestStats::default();

    source.visit_rows(&mut |line, fields| {
        let (Some(first), Some(second)) = (fields.get(tag.0), fields.get(tag.1)) else {
            stats.skipped += 1;
            return Ok(());
        };
        let slot = axis
            .slot_of(first, second)
            .ok_or_else(|| Error::SchemaViolation {
                line,
                tag: format!("{first}:{second}"),
            })?;

        let (Some(lat), Some(lon), Some(value)) = (
            numeric_field(fields, lat_col, line)?,
            numeric_field(fields, lon_col, line)?,
            numeric_field(fields, value_col, line)?,
        ) else {
            stats.skipped += 1;
            return Ok(());
        };

        stats.rows += 1;
        match grid.merge_observation(lat, lon, slot, value)? {
            Some(_) => stats.gridded += 1,
            None => stats.out_of_grid += 1,
        }
        Ok(())
    })?;

    Ok(stats)
}

/// Coordinate extent of a source, as reported by `csvgrid info`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SourceExtent {
    pub rows: usize,
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

impl Default for SourceExtent {
    fn default() -> Self {
        Self {
            rows: 0,
            lat_min: f64::INFINITY,
            lat_max: f64::NEG_INFINITY,
            lon_min: f64::INFINITY,
            lon_max: f64::NEG_INFINITY,
        }
    }
}

/// Scan `source` for the bounding box of its coordinates. Rows without
/// both coordinate fields are ignored.
pub fn scan_extent<S>(source: &S, lat_col: usize, lon_col: usize) -> Result<SourceExtent>
where
    S: RowSource + ?Sized,
{
    let mut extent = SourceExtent::default();
    source.visit_rows(&mut |line, fields| {
        if let (Some(lat), Some(lon)) = (
            numeric_field(fields, lat_col, line)?,
            numeric_field(fields, lon_col, line)?,
        ) {
            extent.rows += 1;
            extent.lat_min = extent.lat_min.min(lat);
            extent.lat_max = extent.lat_max.max(lat);
            extent.lon_min = extent.lon_min.min(lon);
            extent.lon_max = extent.lon_max.max(lon);
        }
        Ok(())
    })?;
    Ok(extent)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GridSpec;
    use crate::io::MemorySource;

    fn spec() -> GridSpec {
        GridSpec::new(0.0, 2.0, 0.0, 2.0, 1.0, 1.0)
    }

    fn direct(values: Vec<usize>) -> ColumnLayout {
        ColumnLayout::Direct {
            lat: 0,
            lon: 1,
            values,
        }
    }

    fn tagged() -> ColumnLayout {
        ColumnLayout::Tagged {
            lat: 2,
            lon: 3,
            tag: (0, 1),
            value: 4,
        }
    }

    #[test]
    fn direct_rows_are_counted_and_bucketed() {
        let src = MemorySource::new(
            ["0.5,0.5,1,2", "1.5,1.5,3,4", "5.0,0.5,9,9", "0.5", "1.0,1.0,7"],
            ',',
        );
        let mut grid = Grid::from_spec(&spec(), 2).unwrap();
        let stats = ingest(&src, &direct(vec![2, 3]), None, &mut grid).unwrap();
        assert_eq!(
            stats,
            IngestStats {
                rows: 3,
                gridded: 2,
                out_of_grid: 1,
                skipped: 2,
            }
        );
        assert_eq!(grid.observations(1, 1)[0].values, vec![3.0, 4.0]);
    }

    #[test]
    fn non_finite_numbers_are_malformed() {
        let src = MemorySource::new(["0.0,1.0,NaN", "0.0,3.0,5"], ',');
        let mut grid = Grid::from_spec(&spec(), 1).unwrap();
        let err = ingest(&src, &direct(vec![2]), None, &mut grid).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedField { line: 1, column: 2, .. }
        ));

        let src = MemorySource::new(["0.5,inf,1"], ',');
        let mut grid = Grid::from_spec(&spec(), 1).unwrap();
        let err = ingest(&src, &direct(vec![2]), None, &mut grid).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedField { line: 1, column: 1, .. }
        ));

        let axis = VariableAxis::from_keys([crate::axis::TagKey::new("TMP", "2m")]);
        let src = MemorySource::new(["TMP,2m,0.5,0.5,-Infinity"], ',');
        let mut grid = Grid::from_spec(&spec(), 1).unwrap();
        let err = ingest(&src, &tagged(), Some(&axis), &mut grid).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedField { line: 1, column: 4, .. }
        ));
        assert_eq!(grid.observation_count(), 0);
    }

    #[test]
    fn malformed_number_is_fatal() {
        let src = MemorySource::new(["lat,lon,v", "0.5,0.5,1"], ',');
        let mut grid = Grid::from_spec(&spec(), 1).unwrap();
        let err = ingest(&src, &direct(vec![2]), None, &mut grid).unwrap_err();
        assert!(matches!(
            err,
            Error::MalformedField { line: 1, column: 0, .. }
        ));
    }

    #[test]
    fn tagged_rows_merge_partial_records() {
        let src = MemorySource::new(
            [
                "TMP,2m,0.5,0.5,280",
                "RH,2m,1.5,0.5,60",
                "RH,2m,0.5,0.5,75",
            ],
            ',',
        );
        let axis = VariableAxis::discover(&src, (0, 1)).unwrap();
        let mut grid = Grid::from_spec(&spec(), axis.len()).unwrap();
        let stats = ingest(&src, &tagged(), Some(&axis), &mut grid).unwrap();
        assert_eq!(stats.gridded, 3);
        assert_eq!(grid.observation_count(), 2);
        assert_eq!(grid.observations(0, 0)[0].values, vec![280.0, 75.0]);
        assert_eq!(grid.observations(0, 1)[0].values, vec![0.0, 60.0]);
    }

    #[test]
    fn rediscovered_axis_never_violates_schema() {
        let src = MemorySource::new(
            ["a,x,0.1,0.1,1", "b,x,0.2,0.2,2", "a,y,9.0,9.0,3", "b,x,1.1,1.1,4"],
            ',',
        );
        let axis = VariableAxis::discover(&src, (0, 1)).unwrap();
        let mut grid = Grid::from_spec(&spec(), axis.len()).unwrap();
        let stats = ingest(&src, &tagged(), Some(&axis), &mut grid).unwrap();
        assert_eq!(stats.rows, 4);
        assert_eq!(stats.out_of_grid, 1);
    }

    #[test]
    fn unknown_tag_is_schema_violation() {
        let prescan = MemorySource::new(["TMP,2m,0.5,0.5,280"], ',');
        let actual = MemorySource::new(["TMP,2m,0.5,0.5,280", "DPT,2m,0.5,0.5,270"], ',');
        let axis = VariableAxis::discover(&prescan, (0, 1)).unwrap();
        let mut grid = Grid::from_spec(&spec(), axis.len()).unwrap();
        let err = ingest(&actual, &tagged(), Some(&axis), &mut grid).unwrap_err();
        match err {
            Error::SchemaViolation { line, tag } => {
                assert_eq!(line, 2);
                assert_eq!(tag, "DPT:2m");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn tagged_layout_requires_matching_axis() {
        let src = MemorySource::new(["TMP,2m,0.5,0.5,280"], ',');
        let mut grid = Grid::from_spec(&spec(), 2).unwrap();
        assert!(ingest(&src, &tagged(), None, &mut grid).is_err());
        let axis = VariableAxis::discover(&src, (0, 1)).unwrap();
        assert!(ingest(&src, &tagged(), Some(&axis), &mut grid).is_err());
    }

    #[test]
    fn extent_covers_all_rows() {
        let src = MemorySource::new(["1,-5", "3,7", "-2,0", "8"], ',');
        // the last row has no longitude field and is ignored
        let extent = scan_extent(&src, 0, 1).unwrap();
        assert_eq!(extent.rows, 3);
        assert_eq!((extent.lat_min, extent.lat_max), (-2.0, 3.0));
        assert_eq!((extent.lon_min, extent.lon_max), (-5.0, 7.0));
    }
}
