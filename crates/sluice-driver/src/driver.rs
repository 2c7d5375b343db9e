//! The orchestrator: configuration, capabilities, and the step loop.

use crate::error::{DriverError, UnknownActionError};
use crate::schedule::{Action, Capability, Schedule};
use crate::series::{RunSeries, VwcSeries};
use chrono::NaiveDate;
use sluice_core::CellCoord;
use sluice_grid::{FieldGrid, GridError};
use sluice_session::Session;
use smallvec::SmallVec;
use tracing::{debug, info};

/// Path expression for the engine's simulation clock.
pub const CLOCK_PATH: &str = "[Clock].Today";

/// Path expression for the engine's reported rainfall.
pub const RAIN_PATH: &str = "[Weather].Rain";

/// Default number of soil layers sampled per field.
pub const DEFAULT_SOIL_LAYERS: u32 = 10;

/// Default fraction of a cell's runoff sent to each cardinal
/// neighbour. Shares aimed at nonexistent neighbours are lost.
pub const RUNOFF_NEIGHBOUR_SHARE: f64 = 0.25;

/// Tunable parameters for a run.
///
/// The defaults reproduce the historical behavior: ten soil layers and
/// an exact quartering of runoff.
#[derive(Clone, Copy, Debug)]
pub struct DriverConfig {
    /// Number of soil layers queried per field each step.
    pub soil_layers: u32,
    /// Fraction of runoff sent to each existing cardinal neighbour.
    pub runoff_share: f64,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            soil_layers: DEFAULT_SOIL_LAYERS,
            runoff_share: RUNOFF_NEIGHBOUR_SHARE,
        }
    }
}

/// Drives one simulation run over one session.
///
/// Owns the session, the registered grid, and the action schedule.
/// [`run`](Self::run) consumes the driver: the protocol ends in the
/// terminal `finished` state, so a driver cannot be reused.
#[derive(Debug)]
pub struct Driver {
    session: Session,
    grid: FieldGrid,
    config: DriverConfig,
    schedule: Schedule,
}

impl Driver {
    /// Build a driver from an established session and a registered
    /// grid.
    pub fn new(session: Session, grid: FieldGrid, config: DriverConfig) -> Self {
        Self {
            session,
            grid,
            config,
            schedule: Schedule::new(),
        }
    }

    /// Schedule an intervention for a simulation date.
    ///
    /// The operation selector must resolve to an implemented
    /// capability; unresolvable selectors fail here, before the run.
    pub fn add_action(
        &mut self,
        date: NaiveDate,
        name: &str,
        args: Vec<f64>,
    ) -> Result<(), UnknownActionError> {
        self.schedule.add(date, name, args)
    }

    /// Total number of actions still pending.
    pub fn pending_actions(&self) -> usize {
        self.schedule.pending()
    }

    /// The grid this driver orchestrates.
    pub fn grid(&self) -> &FieldGrid {
        &self.grid
    }

    /// Execute the run to completion.
    ///
    /// Energizes the engine, then loops: read the clock, execute any
    /// actions pending for that date, redistribute runoff, sample
    /// water content and rainfall, and resume the engine, until it
    /// reports `finished`. Returns the accumulated series.
    pub fn run(mut self) -> Result<RunSeries, DriverError> {
        self.session.energize()?;
        let (extent_x, extent_y) = self.grid.extent();
        let layers = self.config.soil_layers;
        let mut series = RunSeries {
            dates: Vec::new(),
            rain: Vec::new(),
            vwc: VwcSeries::new(extent_x, extent_y, layers),
        };

        loop {
            let step = series.steps() + 1;
            let clock = self.session.get(CLOCK_PATH)?;
            let today = clock.as_date().ok_or_else(|| DriverError::UnexpectedValue {
                path: CLOCK_PATH.to_string(),
                expected: "timestamp",
                got: clock.type_name(),
            })?;

            // Scheduled actions run before this step's runoff is
            // queried, so an irrigation lands ahead of redistribution.
            let actions = self.schedule.take(today);
            if !actions.is_empty() {
                info!(step, date = %today, count = actions.len(), "executing scheduled actions");
            }
            for action in &actions {
                execute_action(&self.grid, &mut self.session, action)?;
            }

            // Runoff redistribution, row-major over populated cells.
            for (coord, node) in self.grid.iter() {
                let runoff = node.runoff(&mut self.session)?;
                if runoff <= 0.0 {
                    continue;
                }
                let shares =
                    runoff_shares(&self.grid, coord, runoff, self.config.runoff_share)?;
                debug!(step, cell = %coord, runoff, neighbours = shares.len(), "redistributing runoff");
                for (neighbour, amount) in shares {
                    if let Some(target) = self.grid.node_at(neighbour)? {
                        target.apply_irrigation(&mut self.session, amount)?;
                    }
                }
            }

            // Sample the full rectangle; empty cells carry NaN.
            let mut block =
                Vec::with_capacity((extent_x as usize) * (extent_y as usize) * (layers as usize));
            for x in 0..extent_x {
                for y in 0..extent_y {
                    match self.grid.node_at(CellCoord::new(x, y))? {
                        Some(node) => block.extend(node.vwc(&mut self.session, layers)?),
                        None => block.extend(std::iter::repeat(f64::NAN).take(layers as usize)),
                    }
                }
            }
            let rain_value = self.session.get(RAIN_PATH)?;
            let rain = rain_value
                .as_f64()
                .ok_or_else(|| DriverError::UnexpectedValue {
                    path: RAIN_PATH.to_string(),
                    expected: "number",
                    got: rain_value.type_name(),
                })?;

            series.dates.push(today);
            series.rain.push(rain);
            series.vwc.push_step(block);
            info!(step, date = %today, "step sampled");

            if self.session.step()?.is_finished() {
                info!(steps = series.steps(), "engine finished");
                return Ok(series);
            }
        }
    }
}

/// Execute one scheduled action against the grid.
fn execute_action(
    grid: &FieldGrid,
    session: &mut Session,
    action: &Action,
) -> Result<(), DriverError> {
    match action.capability() {
        Capability::Irrigate => {
            let args = action.args();
            if args.len() != 4 {
                return Err(DriverError::BadActionArgs {
                    capability: "irrigate",
                    reason: format!("expected 4 arguments (x, y, depth, amount), got {}", args.len()),
                });
            }
            let x = integral_coord(args[0]).ok_or_else(|| bad_irrigate_coord("x", args[0]))?;
            let y = integral_coord(args[1]).ok_or_else(|| bad_irrigate_coord("y", args[1]))?;
            let (depth, amount) = (args[2], args[3]);
            let coord = CellCoord::new(x, y);
            let node = grid
                .node_at(coord)?
                .ok_or(DriverError::EmptyTarget { coord })?;
            info!(field = node.name(), cell = %coord, depth, amount, "irrigating");
            node.irrigate(session, depth, amount)?;
            Ok(())
        }
    }
}

/// The irrigation shares each existing neighbour of `coord` receives.
///
/// Exact fractional split, no moisture weighting; neighbours beyond
/// the grid edge (or at empty cells) receive nothing and their share
/// is not redistributed elsewhere; runoff leaving the grid is lost.
fn runoff_shares(
    grid: &FieldGrid,
    coord: CellCoord,
    runoff: f64,
    share: f64,
) -> Result<SmallVec<[(CellCoord, f64); 4]>, GridError> {
    let amount = runoff * share;
    Ok(grid
        .neighbours(coord)?
        .into_iter()
        .map(|neighbour| (neighbour, amount))
        .collect())
}

fn integral_coord(value: f64) -> Option<u32> {
    if !value.is_finite() || value < 0.0 || value.fract() != 0.0 || value > f64::from(u32::MAX) {
        return None;
    }
    Some(value as u32)
}

fn bad_irrigate_coord(axis: &'static str, value: f64) -> DriverError {
    DriverError::BadActionArgs {
        capability: "irrigate",
        reason: format!("{axis} must be a non-negative integer, got {value}"),
    }
}
