//! csvgrid CLI - Barnes objective analysis of scattered CSV samples

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use tracing::{debug, info, Level};
use tracing_subscriber::FmtSubscriber;

use csvgrid_algorithms::{barnes_with_progress, BarnesParams, PassReport};
use csvgrid_colormap::{auto_params, field_to_rgba, write_png, ColorScheme};
use csvgrid_core::io::{
    ingest, read_field, scan_extent, write_grid, write_tagged_grid, DelimitedFile, IngestStats,
    WriteOptions,
};
use csvgrid_core::{CellAnchor, ColumnLayout, Grid, GridIndex, GridSpec, VariableAxis};

// ─── CLI structure ──────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "csvgrid")]
#[command(author, version, about = "Grid scattered lat/lon samples with Barnes interpolation", long_about = None)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interpolate rows carrying every value in fixed columns
    Grid {
        /// Input delimited file
        input: PathBuf,
        /// Output delimited file
        output: PathBuf,
        #[command(flatten)]
        grid: GridArgs,
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        analysis: AnalysisArgs,
        /// Latitude column (0-based)
        #[arg(long, default_value = "0")]
        lat_col: usize,
        /// Longitude column (0-based)
        #[arg(long, default_value = "1")]
        lon_col: usize,
        /// Value columns, comma separated (e.g. 2,3,4)
        #[arg(long, value_delimiter = ',', required = true)]
        value_cols: Vec<usize>,
    },
    /// Interpolate rows tagged with a variable key, one value per row
    GridTagged {
        /// Input delimited file
        input: PathBuf,
        /// Output delimited file
        output: PathBuf,
        #[command(flatten)]
        grid: GridArgs,
        #[command(flatten)]
        source: SourceArgs,
        #[command(flatten)]
        analysis: AnalysisArgs,
        /// Latitude column (0-based)
        #[arg(long, default_value = "0")]
        lat_col: usize,
        /// Longitude column (0-based)
        #[arg(long, default_value = "1")]
        lon_col: usize,
        /// The two tag columns forming the variable key (e.g. 2,3)
        #[arg(long)]
        tag_cols: String,
        /// Value column
        #[arg(long)]
        value_col: usize,
    },
    /// Render one value column of a gridded file as a PNG
    Draw {
        /// Gridded delimited file
        input: PathBuf,
        /// Output PNG
        output: PathBuf,
        #[command(flatten)]
        grid: GridArgs,
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, default_value = "0")]
        lat_col: usize,
        #[arg(long, default_value = "1")]
        lon_col: usize,
        #[arg(long, default_value = "2")]
        value_col: usize,
        /// Color scheme: viridis, jet, grayscale, red, blue-white-red, temperature
        #[arg(short, long, default_value = "viridis")]
        scheme: String,
        /// Value mapped to the low end of the scheme (default: data minimum)
        #[arg(long, allow_negative_numbers = true)]
        min: Option<f64>,
        /// Value mapped to the high end of the scheme (default: data maximum)
        #[arg(long, allow_negative_numbers = true)]
        max: Option<f64>,
    },
    /// Show row count, coordinate extent and tag variables of an input file
    Info {
        /// Input delimited file
        input: PathBuf,
        #[command(flatten)]
        source: SourceArgs,
        #[arg(long, default_value = "0")]
        lat_col: usize,
        #[arg(long, default_value = "1")]
        lon_col: usize,
        /// Tag columns to list discovered variables for (e.g. 2,3)
        #[arg(long)]
        tag_cols: Option<String>,
    },
}

/// Target grid geometry
#[derive(Args)]
struct GridArgs {
    #[arg(long, allow_negative_numbers = true)]
    lat_start: f64,
    #[arg(long, allow_negative_numbers = true)]
    lat_end: f64,
    #[arg(long, allow_negative_numbers = true)]
    lon_start: f64,
    #[arg(long, allow_negative_numbers = true)]
    lon_end: f64,
    #[arg(long)]
    lat_step: f64,
    #[arg(long)]
    lon_step: f64,
    /// Place grid points at cell centres instead of cell corners
    #[arg(long)]
    center: bool,
}

impl GridArgs {
    fn spec(&self) -> GridSpec {
        let anchor = if self.center {
            CellAnchor::Center
        } else {
            CellAnchor::Corner
        };
        GridSpec::new(
            self.lat_start,
            self.lat_end,
            self.lon_start,
            self.lon_end,
            self.lat_step,
            self.lon_step,
        )
        .with_anchor(anchor)
    }
}

/// How input rows are read
#[derive(Args)]
struct SourceArgs {
    /// Field delimiter (a single character, or "tab")
    #[arg(short, long, default_value = ",")]
    delimiter: String,
    /// Skip the first line of the input
    #[arg(long)]
    header: bool,
}

/// Barnes parameters and output formatting
#[derive(Args)]
struct AnalysisArgs {
    /// Gaussian length scale, in degrees
    #[arg(short = 'L', long, default_value = "2.0")]
    length_scale: f64,
    /// Convergence factor of each pass, comma separated; empty for none
    #[arg(short, long, default_value = "1.0")]
    passes: String,
    /// Written for cells no observation reached
    #[arg(long, default_value = "0", allow_negative_numbers = true)]
    default_value: f64,
    /// Fixed number of decimals in the output
    #[arg(long)]
    precision: Option<usize>,
}

impl AnalysisArgs {
    fn params(&self) -> Result<BarnesParams> {
        Ok(BarnesParams {
            length_scale: self.length_scale,
            passes: parse_passes(&self.passes)?,
        })
    }
}

// ─── Helpers ────────────────────────────────────────────────────────────

fn setup_logging(verbose: bool) -> Result<()> {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to install log subscriber")
}

fn spinner(msg: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(msg.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn pass_bar(passes: usize) -> ProgressBar {
    let pb = ProgressBar::new(passes as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{bar:40.cyan/blue} pass {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );
    pb
}

fn parse_delimiter(s: &str) -> Result<char> {
    match s {
        "tab" | "\\t" => Ok('\t'),
        _ => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(c),
                _ => bail!("Delimiter must be a single character, got: {:?}", s),
            }
        }
    }
}

fn parse_passes(s: &str) -> Result<Vec<f64>> {
    s.split(',')
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| {
            p.parse::<f64>()
                .with_context(|| format!("Invalid convergence factor: {}", p))
        })
        .collect()
}

fn parse_tag_cols(s: &str) -> Result<(usize, usize)> {
    let parts: Vec<&str> = s.split(',').map(str::trim).collect();
    if parts.len() != 2 {
        bail!("Tag columns must be 'first,second', got: {}", s);
    }
    let first: usize = parts[0].parse().context("Invalid first tag column")?;
    let second: usize = parts[1].parse().context("Invalid second tag column")?;
    Ok((first, second))
}

fn open_source(path: &Path, args: &SourceArgs) -> Result<DelimitedFile> {
    let delimiter = parse_delimiter(&args.delimiter)?;
    let source = DelimitedFile::open(path, delimiter)
        .with_context(|| format!("Failed to open {}", path.display()))?
        .skip_header(args.header);
    Ok(source)
}

fn new_grid(spec: &GridSpec, num_values: usize) -> Result<Grid> {
    let grid = Grid::from_spec(spec, num_values).context("Invalid grid configuration")?;
    info!(
        "Grid: {} x {} ({} cells), {} value(s) per cell",
        grid.width(),
        grid.height(),
        grid.index().len(),
        num_values
    );
    Ok(grid)
}

fn log_ingest(stats: &IngestStats, grid: &Grid) {
    info!(
        "Rows: {} read, {} gridded, {} outside the grid, {} skipped",
        stats.rows, stats.gridded, stats.out_of_grid, stats.skipped
    );
    debug!("{} distinct observations", grid.observation_count());
}

fn run_passes(grid: &mut Grid, params: &BarnesParams) -> Result<Vec<PassReport>> {
    info!(
        "Barnes: length scale {}, {} pass(es)",
        params.length_scale,
        params.passes.len()
    );
    let pb = pass_bar(params.passes.len());
    let reports = barnes_with_progress(grid, params, |report| {
        pb.inc(1);
        pb.suspend(|| {
            info!(
                "Pass {} (gamma {}): {} cells matched, {} unmatched",
                report.pass,
                report.convergence_factor,
                report.matched_cells,
                report.unmatched_cells
            );
            debug!("  {} weighted contributions", report.contributions);
        });
    })
    .context("Interpolation failed")?;
    pb.finish_and_clear();
    Ok(reports)
}

fn create_output(path: &Path) -> Result<BufWriter<File>> {
    let file =
        File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    Ok(BufWriter::new(file))
}

fn write_options(analysis: &AnalysisArgs, source: &SourceArgs) -> Result<WriteOptions> {
    Ok(WriteOptions {
        delimiter: parse_delimiter(&source.delimiter)?,
        default_value: analysis.default_value,
        precision: analysis.precision,
    })
}

fn done(name: &str, path: &Path, elapsed: Duration) {
    println!("{} saved to: {}", name, path.display());
    println!("  Processing time: {:.2?}", elapsed);
}

// ─── Commands ───────────────────────────────────────────────────────────

fn run(command: Commands) -> Result<()> {
    match command {
        Commands::Grid {
            input,
            output,
            grid,
            source,
            analysis,
            lat_col,
            lon_col,
            value_cols,
        } => {
            let num_values = value_cols.len();
            let layout = ColumnLayout::Direct {
                lat: lat_col,
                lon: lon_col,
                values: value_cols,
            };
            layout.validate().context("Invalid column layout")?;
            let params = analysis.params()?;
            let options = write_options(&analysis, &source)?;
            let rows = open_source(&input, &source)?;
            let mut target = new_grid(&grid.spec(), num_values)?;

            let start = Instant::now();
            let pb = spinner("Reading observations...");
            let stats = ingest(&rows, &layout, None, &mut target)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            pb.finish_and_clear();
            log_ingest(&stats, &target);

            run_passes(&mut target, &params)?;

            let pb = spinner("Writing output...");
            write_grid(&target, create_output(&output)?, &options)
                .context("Failed to write output")?;
            pb.finish_and_clear();
            done("Grid", &output, start.elapsed());
        }

        Commands::GridTagged {
            input,
            output,
            grid,
            source,
            analysis,
            lat_col,
            lon_col,
            tag_cols,
            value_col,
        } => {
            let tag = parse_tag_cols(&tag_cols)?;
            let layout = ColumnLayout::Tagged {
                lat: lat_col,
                lon: lon_col,
                tag,
                value: value_col,
            };
            layout.validate().context("Invalid column layout")?;
            let params = analysis.params()?;
            let options = write_options(&analysis, &source)?;
            let rows = open_source(&input, &source)?;

            let start = Instant::now();
            let pb = spinner("Discovering variables...");
            let axis = VariableAxis::discover(&rows, tag)
                .with_context(|| format!("Failed to scan {}", input.display()))?;
            pb.finish_and_clear();
            if axis.is_empty() {
                bail!("No tagged rows found in {}", input.display());
            }
            info!("Variables: {}", axis_summary(&axis));

            let mut target = new_grid(&grid.spec(), axis.len())?;
            let pb = spinner("Reading observations...");
            let stats = ingest(&rows, &layout, Some(&axis), &mut target)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            pb.finish_and_clear();
            log_ingest(&stats, &target);

            run_passes(&mut target, &params)?;

            let pb = spinner("Writing output...");
            write_tagged_grid(&target, &axis, &layout, create_output(&output)?, &options)
                .context("Failed to write output")?;
            pb.finish_and_clear();
            done("Tagged grid", &output, start.elapsed());
        }

        Commands::Draw {
            input,
            output,
            grid,
            source,
            lat_col,
            lon_col,
            value_col,
            scheme,
            min,
            max,
        } => {
            let scheme: ColorScheme = scheme.parse().context("Invalid color scheme")?;
            let index = GridIndex::new(&grid.spec()).context("Invalid grid configuration")?;
            let rows = open_source(&input, &source)?;

            let start = Instant::now();
            let pb = spinner("Reading grid...");
            let field = read_field(&rows, &index, lat_col, lon_col, value_col)
                .with_context(|| format!("Failed to read {}", input.display()))?;
            pb.finish_and_clear();
            info!("Image: {} x {}", index.width(), index.height());

            let mut params = auto_params(field.view(), scheme);
            if let Some(min) = min {
                params.min = min;
            }
            if let Some(max) = max {
                params.max = max;
            }
            debug!("Color range: [{}, {}] ({})", params.min, params.max, scheme);

            let rgba = field_to_rgba(field.view(), &params);
            write_png(&rgba, index.width(), index.height(), &output)
                .context("Failed to write PNG")?;
            done("Image", &output, start.elapsed());
        }

        Commands::Info {
            input,
            source,
            lat_col,
            lon_col,
            tag_cols,
        } => {
            let rows = open_source(&input, &source)?;
            let extent = scan_extent(&rows, lat_col, lon_col)
                .with_context(|| format!("Failed to read {}", input.display()))?;

            println!("File: {}", input.display());
            println!("Rows with coordinates: {}", extent.rows);
            if extent.rows > 0 {
                println!(
                    "Latitude: {:.6} .. {:.6}",
                    extent.lat_min, extent.lat_max
                );
                println!(
                    "Longitude: {:.6} .. {:.6}",
                    extent.lon_min, extent.lon_max
                );
            }
            if let Some(tag_cols) = tag_cols {
                let axis = VariableAxis::discover(&rows, parse_tag_cols(&tag_cols)?)
                    .with_context(|| format!("Failed to scan {}", input.display()))?;
                println!("\nVariables ({}):", axis.len());
                for (slot, key) in axis.keys().iter().enumerate() {
                    println!("  {:>3}  {}", slot, key);
                }
            }
        }
    }
    Ok(())
}

fn axis_summary(axis: &VariableAxis) -> String {
    axis.keys()
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

// ─── Main ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => {
            // help and version go to stdout and are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            std::process::exit(code);
        }
    };
    setup_logging(cli.verbose)?;
    run(cli.command)
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn args(line: &str) -> Vec<&str> {
        line.split_whitespace().collect()
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn passes_parse_as_list() {
        assert_eq!(parse_passes("1.0, 0.3,0.2").unwrap(), vec![1.0, 0.3, 0.2]);
        assert!(parse_passes("").unwrap().is_empty());
        assert!(parse_passes("1.0,x").is_err());
    }

    #[test]
    fn delimiter_names() {
        assert_eq!(parse_delimiter(";").unwrap(), ';');
        assert_eq!(parse_delimiter("tab").unwrap(), '\t');
        assert!(parse_delimiter(",,").is_err());
    }

    #[test]
    fn tag_columns_need_two_entries() {
        assert_eq!(parse_tag_cols("2,3").unwrap(), (2, 3));
        assert!(parse_tag_cols("2").is_err());
        assert!(parse_tag_cols("2,3,4").is_err());
    }

    #[test]
    fn grid_command_parses_negative_bounds() {
        let cli = Cli::try_parse_from(args(
            "csvgrid grid in.csv out.csv \
             --lat-start -90 --lat-end 90 --lon-start -180 --lon-end 180 \
             --lat-step 1 --lon-step 1 --value-cols 2,3 --passes 1.0,0.3",
        ))
        .unwrap();
        let Commands::Grid {
            grid,
            value_cols,
            analysis,
            ..
        } = cli.command
        else {
            panic!("expected grid command");
        };
        assert_eq!(value_cols, vec![2, 3]);
        assert_eq!(grid.spec().width(), 360);
        assert_eq!(grid.spec().height(), 180);
        assert_eq!(analysis.params().unwrap().passes, vec![1.0, 0.3]);
    }

    #[test]
    fn missing_value_columns_is_a_usage_error() {
        let err = Cli::try_parse_from(args(
            "csvgrid grid in.csv out.csv \
             --lat-start 0 --lat-end 1 --lon-start 0 --lon-end 1 \
             --lat-step 1 --lon-step 1",
        ))
        .err()
        .unwrap();
        assert!(err.use_stderr());
    }
}
