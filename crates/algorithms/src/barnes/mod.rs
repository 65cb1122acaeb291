//! Barnes successive-correction objective analysis
//!
//! Spreads scattered observations over a regular grid with a sequence of
//! Gaussian-weighted correction passes. Each pass nudges every grid value
//! toward the observations near it:
//!
//! ```text
//! w_k      = exp(-d_k² / (L² · γ))
//! g'(i,j)  = g(i,j) + Σ w_k · (o_k - g(cell_k)) / Σ w_k
//! ```
//!
//! where `d_k` is the distance from the grid point to observation `k`
//! (longitude measured along the shorter arc), `L` the length scale, `γ`
//! the pass's convergence factor and `g(cell_k)` the previous-pass value of
//! the cell observation `k` is bucketed in.
//!
//! Reference:
//! Barnes, S.L. (1964). A technique for maximizing details in numerical
//! weather map analysis. Journal of Applied Meteorology, 3(4).

mod window;

pub use window::SearchWindow;

use csvgrid_core::grid::{lat_distance, lon_distance};
use csvgrid_core::{Algorithm, Error, Grid, Result};
use ndarray::{s, Array2, Array3};

use crate::maybe_rayon::*;

/// Parameters for Barnes interpolation
#[derive(Debug, Clone, PartialEq)]
pub struct BarnesParams {
    /// Gaussian length scale `L`, in degrees (default: 2.0)
    pub length_scale: f64,
    /// Convergence factor of each pass, applied in order (default: `[1.0]`)
    pub passes: Vec<f64>,
}

impl Default for BarnesParams {
    fn default() -> Self {
        Self {
            length_scale: 2.0,
            passes: vec![1.0],
        }
    }
}

impl BarnesParams {
    pub fn validate(&self) -> Result<()> {
        if !self.length_scale.is_finite() || self.length_scale <= 0.0 {
            return Err(Error::invalid(
                "length_scale",
                self.length_scale,
                "must be a positive number",
            ));
        }
        if let Some(&gamma) = self.passes.iter().find(|g| !g.is_finite() || **g <= 0.0) {
            return Err(Error::invalid(
                "passes",
                gamma,
                "convergence factors must be positive numbers",
            ));
        }
        Ok(())
    }
}

/// Outcome of one pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PassReport {
    /// 1-based pass number
    pub pass: usize,
    pub convergence_factor: f64,
    /// Cells whose neighbourhood held at least one weighted observation
    pub matched_cells: usize,
    /// Cells left at their previous value because no weight reached them
    pub unmatched_cells: usize,
    /// Observation contributions summed over all target cells
    pub contributions: usize,
}

/// Barnes interpolation as an [`Algorithm`] over a populated grid
#[derive(Debug, Clone, Copy, Default)]
pub struct Barnes;

impl Algorithm for Barnes {
    type Input = Grid;
    type Output = Grid;
    type Params = BarnesParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "Barnes"
    }

    fn description(&self) -> &'static str {
        "Multi-pass Gaussian successive-correction analysis of scattered observations"
    }

    fn execute(&self, mut input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        barnes(&mut input, &params)?;
        Ok(input)
    }
}

/// Run every pass of `params` over `grid`, in order.
///
/// An empty pass list leaves the grid untouched.
pub fn barnes(grid: &mut Grid, params: &BarnesParams) -> Result<Vec<PassReport>> {
    barnes_with_progress(grid, params, |_| {})
}

/// [`barnes`], calling `on_pass` after each pass completes.
pub fn barnes_with_progress<F>(
    grid: &mut Grid,
    params: &BarnesParams,
    mut on_pass: F,
) -> Result<Vec<PassReport>>
where
    F: FnMut(&PassReport),
{
    params.validate()?;
    let mut reports = Vec::with_capacity(params.passes.len());
    for (i, &gamma) in params.passes.iter().enumerate() {
        let mut report = barnes_pass(grid, params.length_scale, gamma)?;
        report.pass = i + 1;
        on_pass(&report);
        reports.push(report);
    }
    Ok(reports)
}

/// Values computed for one grid row during a pass
struct RowUpdate {
    values: Vec<f64>,
    matched: Vec<bool>,
    contributions: usize,
}

/// Run a single correction pass with convergence factor `gamma`.
///
/// The pass first snapshots the current values; every cell's update is
/// computed from that snapshot and the observation set alone, so cells are
/// independent within the pass and rows are processed in parallel.
pub fn barnes_pass(grid: &mut Grid, length_scale: f64, gamma: f64) -> Result<PassReport> {
    BarnesParams {
        length_scale,
        passes: vec![gamma],
    }
    .validate()?;

    grid.snapshot();

    let index = *grid.index();
    let (height, width, num_values) = grid.current().dim();
    let window = SearchWindow::new(&index, length_scale);
    let denom = length_scale * length_scale * gamma;

    let updates: Vec<RowUpdate> = {
        let grid = &*grid;
        let previous = grid.previous();

        (0..height)
            .into_par_iter()
            .map(|y| {
                let mut row = RowUpdate {
                    values: Vec::with_capacity(width * num_values),
                    matched: vec![false; width],
                    contributions: 0,
                };
                let mut residual = vec![0.0; num_values];

                for x in 0..width {
                    let (target_lat, target_lon) = index.grid_point(x, y);
                    residual.iter_mut().for_each(|r| *r = 0.0);
                    let mut weight_sum = 0.0;
                    let mut count = 0usize;

                    for ny in window.rows(&index, y) {
                        for nx in window.columns(&index, x) {
                            let observations = grid.observations(nx, ny);
                            if observations.is_empty() {
                                continue;
                            }
                            let base = previous.slice(s![ny, nx, ..]);
                            for obs in observations {
                                let dlon = lon_distance(obs.lon, target_lon);
                                let dlat = lat_distance(obs.lat, target_lat);
                                let weight = (-(dlon * dlon + dlat * dlat) / denom).exp();
                                for (r, (&o, &b)) in
                                    residual.iter_mut().zip(obs.values.iter().zip(base.iter()))
                                {
                                    *r += weight * (o - b);
                                }
                                weight_sum += weight;
                                count += 1;
                            }
                        }
                    }

                    let before = previous.slice(s![y, x, ..]);
                    if weight_sum > 0.0 {
                        row.values
                            .extend(before.iter().zip(&residual).map(|(&p, &r)| p + r / weight_sum));
                        row.matched[x] = count > 0;
                    } else {
                        row.values.extend(before.iter().copied());
                    }
                    row.contributions += count;
                }
                row
            })
            .collect()
    };

    let mut values = Vec::with_capacity(height * width * num_values);
    let mut matched = Vec::with_capacity(height * width);
    let mut contributions = 0;
    for row in updates {
        values.extend(row.values);
        matched.extend(row.matched);
        contributions += row.contributions;
    }

    let matched_cells = matched.iter().filter(|&&m| m).count();
    let next = Array3::from_shape_vec((height, width, num_values), values)
        .map_err(|e| Error::Algorithm(e.to_string()))?;
    let matched = Array2::from_shape_vec((height, width), matched)
        .map_err(|e| Error::Algorithm(e.to_string()))?;
    grid.commit_pass(next, &matched)?;

    Ok(PassReport {
        pass: 1,
        convergence_factor: gamma,
        matched_cells,
        unmatched_cells: height * width - matched_cells,
        contributions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use csvgrid_core::GridSpec;

    fn grid(spec: GridSpec, num_values: usize) -> Grid {
        Grid::from_spec(&spec, num_values).unwrap()
    }

    #[test]
    fn single_observation_is_recovered_exactly() {
        let mut g = grid(GridSpec::new(0.0, 5.0, 0.0, 5.0, 1.0, 1.0), 1);
        g.add_observation(2.0, 3.0, &[5.0]).unwrap();
        barnes(
            &mut g,
            &BarnesParams {
                length_scale: 1.0,
                passes: vec![0.4],
            },
        )
        .unwrap();
        assert!(g.has_values(3, 2));
        assert_relative_eq!(g.values(3, 2)[0], 5.0, epsilon = 1e-12);
    }

    #[test]
    fn empty_pass_list_changes_nothing() {
        let mut g = grid(GridSpec::new(0.0, 3.0, 0.0, 3.0, 1.0, 1.0), 2);
        g.add_observation(1.0, 1.0, &[1.0, 2.0]).unwrap();
        let reports = barnes(
            &mut g,
            &BarnesParams {
                length_scale: 2.0,
                passes: vec![],
            },
        )
        .unwrap();
        assert!(reports.is_empty());
        assert_eq!(g.filled_cells(), 0);
        assert!(g.current().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn cells_out_of_reach_keep_previous_value() {
        // 20 x 1 grid, observation at column 0, window of one cell
        let mut g = grid(GridSpec::new(0.0, 1.0, 0.0, 20.0, 1.0, 1.0), 1);
        g.add_observation(0.0, 0.0, &[3.0]).unwrap();
        let report = barnes_pass(&mut g, 1.0, 1.0).unwrap();

        assert!(g.has_values(0, 0));
        assert!(g.has_values(1, 0));
        assert!(g.has_values(19, 0));
        assert!(!g.has_values(10, 0));
        assert_eq!(g.values(10, 0)[0], 0.0);
        assert_eq!(report.matched_cells, 3);
        assert_eq!(report.unmatched_cells, 17);
        assert_eq!(report.contributions, 3);
    }

    #[test]
    fn underflowing_weights_count_as_no_match() {
        let mut g = grid(GridSpec::new(0.0, 1.0, 0.0, 100.0, 1.0, 50.0), 1);
        // both targets see the observation, but the one 49.9 degrees away
        // gets a weight that underflows to zero
        g.add_observation(0.0, 49.9, &[1.0]).unwrap();
        let report = barnes_pass(&mut g, 0.01, 1.0).unwrap();
        assert!(!g.has_values(0, 0));
        assert_eq!(g.values(0, 0)[0], 0.0);
        assert!(g.has_values(1, 0));
        assert_relative_eq!(g.values(1, 0)[0], 1.0, epsilon = 1e-12);
        assert_eq!(report.unmatched_cells, 1);
        assert_eq!(report.contributions, 2);
    }

    #[test]
    fn longitude_wraps_across_the_dateline() {
        // cells at both ends of the longitude axis are 2 degrees apart
        let mut g = grid(GridSpec::new(0.0, 1.0, -180.0, 180.0, 1.0, 1.0), 1);
        g.add_observation(0.0, 179.0, &[10.0]).unwrap();
        g.add_observation(0.0, -179.0, &[20.0]).unwrap();
        barnes_pass(&mut g, 2.0, 1.0).unwrap();

        // the grid point at -180 is 1 degree from both observations
        assert!(g.has_values(0, 0));
        assert_relative_eq!(g.values(0, 0)[0], 15.0, epsilon = 1e-9);
    }

    #[test]
    fn passes_are_isolated_from_same_pass_writes() {
        let spec = GridSpec::new(0.0, 1.0, 0.0, 6.0, 1.0, 1.0);
        let mut g = grid(spec, 1);
        g.add_observation(0.0, 1.0, &[4.0]).unwrap();
        g.add_observation(0.0, 4.0, &[8.0]).unwrap();

        barnes_pass(&mut g, 3.0, 1.0).unwrap();
        let after_one = g.current().to_owned();

        // recomputing the same pass from the same snapshot gives the same field
        let mut again = grid(spec, 1);
        again.add_observation(0.0, 4.0, &[8.0]).unwrap();
        again.add_observation(0.0, 1.0, &[4.0]).unwrap();
        barnes_pass(&mut again, 3.0, 1.0).unwrap();
        for (a, b) in after_one.iter().zip(again.current().iter()) {
            assert_relative_eq!(*a, *b, epsilon = 1e-12);
        }
    }

    #[test]
    fn multiple_slots_are_independent() {
        let mut g = grid(GridSpec::new(0.0, 3.0, 0.0, 3.0, 1.0, 1.0), 2);
        g.add_observation(1.0, 1.0, &[10.0, -4.0]).unwrap();
        barnes_pass(&mut g, 2.0, 1.0).unwrap();
        for (x, y) in g.index().cells() {
            assert_relative_eq!(g.values(x, y)[0], 10.0, epsilon = 1e-12);
            assert_relative_eq!(g.values(x, y)[1], -4.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn invalid_parameters_rejected() {
        let mut g = grid(GridSpec::new(0.0, 1.0, 0.0, 1.0, 1.0, 1.0), 1);
        let bad_scale = BarnesParams {
            length_scale: 0.0,
            passes: vec![1.0],
        };
        assert!(barnes(&mut g, &bad_scale).is_err());
        let bad_gamma = BarnesParams {
            length_scale: 1.0,
            passes: vec![1.0, -0.3],
        };
        assert!(barnes(&mut g, &bad_gamma).is_err());
        assert_eq!(g.filled_cells(), 0);
    }

    #[test]
    fn progress_callback_sees_every_pass() {
        let mut g = grid(GridSpec::new(0.0, 2.0, 0.0, 2.0, 1.0, 1.0), 1);
        g.add_observation(0.5, 0.5, &[1.0]).unwrap();
        let mut seen = Vec::new();
        let params = BarnesParams {
            length_scale: 1.0,
            passes: vec![1.0, 0.3, 0.2],
        };
        let reports = barnes_with_progress(&mut g, &params, |r| {
            seen.push((r.pass, r.convergence_factor))
        })
        .unwrap();
        assert_eq!(seen, vec![(1, 1.0), (2, 0.3), (3, 0.2)]);
        assert_eq!(reports.len(), 3);
    }

    #[test]
    fn algorithm_trait_runs_default_params() {
        let mut g = grid(GridSpec::new(0.0, 2.0, 0.0, 2.0, 1.0, 1.0), 1);
        g.add_observation(1.0, 1.0, &[2.0]).unwrap();
        let out = Barnes.execute_default(g).unwrap();
        assert_eq!(Barnes.name(), "Barnes");
        assert_eq!(out.filled_cells(), 4);
    }
}
