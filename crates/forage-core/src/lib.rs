//! Decision core for the drone foraging planner.
//!
//! A square grid of reward cells decays to zero on collection and
//! regenerates over time. Each tick, every drone proposes its best next
//! move from a bounded-depth rollout over the shared grid, the coordinator
//! arbitrates competing claims on the same cell, and the approved moves
//! are committed one drone at a time.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::time::{Duration, Instant};
use thiserror::Error;

/// Simulation clock (ticks processed since the start of the run).
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct Tick(pub u64);

impl Tick {
    /// Returns the next sequential tick.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0 + 1)
    }

    /// The first tick of a run.
    #[must_use]
    pub const fn zero() -> Self {
        Self(0)
    }
}

/// A grid coordinate, `(row, col)` with `(0, 0)` in the top-left corner.
#[derive(
    Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct Cell {
    pub row: usize,
    pub col: usize,
}

impl Cell {
    /// Construct a new cell coordinate.
    #[must_use]
    pub const fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// Errors raised when validating grid input, coordinates, or configuration.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GridError {
    /// Coordinate outside the square grid.
    #[error("cell ({row}, {col}) lies outside the {size}x{size} grid")]
    OutOfBounds { row: usize, col: usize, size: usize },
    /// Input matrix rows disagree on width.
    #[error("input matrix is not square: row {row} has {width} entries, expected {expected}")]
    NotSquare {
        row: usize,
        width: usize,
        expected: usize,
    },
    /// Input matrix has no rows.
    #[error("input matrix is empty")]
    EmptyMatrix,
    /// Baseline rewards must be finite and non-negative.
    #[error("cell ({row}, {col}) has an invalid baseline reward")]
    InvalidBaseline { row: usize, col: usize },
    /// Indicates an invalid configuration value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// King-move offsets in fixed compass order: NW, N, NE, W, E, SW, S, SE.
///
/// The planner's argmax keeps the first maximum it sees, so this order is
/// also the tie-breaking order for equally scored moves.
pub const COMPASS_OFFSETS: [(i8, i8); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Static configuration for a foraging run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ForageConfig {
    /// Fraction of a cell's baseline reward restored per tick once the
    /// cell has been collected. A cell recovers fully in roughly
    /// `1 / growth_rate` ticks and then clamps at its baseline.
    pub growth_rate: f64,
    /// Rollout depth used when scoring candidate moves. Evaluation cost
    /// grows as `8^lookahead`, so useful values are small (1–5).
    pub lookahead: u32,
    /// Maximum number of ticks to simulate.
    pub max_ticks: u64,
    /// Wall-clock planning budget in milliseconds. Checked once at the
    /// start of each tick; a single slow tick can overshoot it.
    pub time_budget_ms: u64,
    /// Maximum number of per-tick summaries retained in memory.
    pub history_capacity: usize,
    /// Move offsets tried when enumerating a cell's neighbors, in the
    /// order that also breaks score ties.
    pub neighbor_offsets: [(i8, i8); 8],
}

impl Default for ForageConfig {
    fn default() -> Self {
        Self {
            growth_rate: 0.1,
            lookahead: 3,
            max_ticks: 50,
            time_budget_ms: 1_000,
            history_capacity: 256,
            neighbor_offsets: COMPASS_OFFSETS,
        }
    }
}

impl ForageConfig {
    /// Validates the configuration before a run is constructed from it.
    pub fn validate(&self) -> Result<(), GridError> {
        if !self.growth_rate.is_finite() || self.growth_rate < 0.0 {
            return Err(GridError::InvalidConfig(
                "growth_rate must be a non-negative finite number",
            ));
        }
        if self.lookahead == 0 {
            return Err(GridError::InvalidConfig("lookahead must be at least 1"));
        }
        if self.history_capacity == 0 {
            return Err(GridError::InvalidConfig(
                "history_capacity must be non-zero",
            ));
        }
        for &(d_row, d_col) in &self.neighbor_offsets {
            if d_row == 0 && d_col == 0 {
                return Err(GridError::InvalidConfig(
                    "neighbor offsets must not include the zero move",
                ));
            }
            if d_row.abs() > 1 || d_col.abs() > 1 {
                return Err(GridError::InvalidConfig(
                    "neighbor offsets must be single-step king moves",
                ));
            }
        }
        Ok(())
    }
}

/// Square grid of reward values with collection and regrowth bookkeeping.
///
/// Every cell holds an immutable baseline set at construction and a
/// current value satisfying `0 <= current <= baseline` at all times.
#[derive(Debug, Clone, PartialEq)]
pub struct RewardGrid {
    size: usize,
    initial: Vec<f64>,
    current: Vec<f64>,
    visited: Vec<bool>,
    last_visit: Vec<Tick>,
    neighbor_offsets: [(i8, i8); 8],
}

impl RewardGrid {
    /// Build a grid from a row-major matrix of baseline rewards.
    ///
    /// The matrix must be square, non-empty, and contain only finite
    /// non-negative values.
    pub fn from_matrix(
        matrix: Vec<Vec<f64>>,
        neighbor_offsets: [(i8, i8); 8],
    ) -> Result<Self, GridError> {
        let size = matrix.len();
        if size == 0 {
            return Err(GridError::EmptyMatrix);
        }
        let mut initial = Vec::with_capacity(size * size);
        for (row, values) in matrix.iter().enumerate() {
            if values.len() != size {
                return Err(GridError::NotSquare {
                    row,
                    width: values.len(),
                    expected: size,
                });
            }
            for (col, &value) in values.iter().enumerate() {
                if !value.is_finite() || value < 0.0 {
                    return Err(GridError::InvalidBaseline { row, col });
                }
                initial.push(value);
            }
        }
        let cells = initial.len();
        Ok(Self {
            size,
            current: initial.clone(),
            initial,
            visited: vec![false; cells],
            last_visit: vec![Tick::zero(); cells],
            neighbor_offsets,
        })
    }

    /// Side length of the square grid.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.size
    }

    /// Whether a coordinate lies within the grid.
    #[must_use]
    pub const fn contains(&self, cell: Cell) -> bool {
        cell.row < self.size && cell.col < self.size
    }

    /// Flat index for an in-bounds cell.
    #[inline]
    fn flat(&self, cell: Cell) -> usize {
        cell.row * self.size + cell.col
    }

    fn index_of(&self, cell: Cell) -> Result<usize, GridError> {
        if self.contains(cell) {
            Ok(self.flat(cell))
        } else {
            Err(GridError::OutOfBounds {
                row: cell.row,
                col: cell.col,
                size: self.size,
            })
        }
    }

    /// Current reward of an in-bounds cell; callers must have produced
    /// `cell` through [`RewardGrid::neighbors`] or an earlier bounds check.
    #[inline]
    fn reward(&self, cell: Cell) -> f64 {
        self.current[self.flat(cell)]
    }

    /// Current reward at `cell`.
    pub fn score_at(&self, cell: Cell) -> Result<f64, GridError> {
        Ok(self.current[self.index_of(cell)?])
    }

    /// Baseline reward at `cell`.
    pub fn initial_at(&self, cell: Cell) -> Result<f64, GridError> {
        Ok(self.initial[self.index_of(cell)?])
    }

    /// Whether `cell` has ever been collected.
    pub fn is_visited(&self, cell: Cell) -> Result<bool, GridError> {
        Ok(self.visited[self.index_of(cell)?])
    }

    /// Tick of the most recent collection; meaningful only once
    /// [`RewardGrid::is_visited`] reports true.
    pub fn last_visit(&self, cell: Cell) -> Result<Tick, GridError> {
        Ok(self.last_visit[self.index_of(cell)?])
    }

    /// Row-major view of the current reward values.
    #[must_use]
    pub fn current_rewards(&self) -> &[f64] {
        &self.current
    }

    /// Row-major view of the baseline reward values.
    #[must_use]
    pub fn initial_rewards(&self) -> &[f64] {
        &self.initial
    }

    /// In-bounds neighbors of `cell`, yielded in the configured offset
    /// order (compass order by default).
    pub fn neighbors(&self, cell: Cell) -> impl Iterator<Item = Cell> + '_ {
        self.neighbor_offsets
            .iter()
            .filter_map(move |&(d_row, d_col)| self.step(cell, d_row, d_col))
    }

    fn step(&self, cell: Cell, d_row: i8, d_col: i8) -> Option<Cell> {
        let row = cell.row.checked_add_signed(isize::from(d_row))?;
        let col = cell.col.checked_add_signed(isize::from(d_col))?;
        let next = Cell::new(row, col);
        self.contains(next).then_some(next)
    }

    /// Collect the reward at `cell`: the current value drops to zero and
    /// the cell is marked visited at `tick`. Collecting an already-zero
    /// cell is harmless.
    pub fn collect(&mut self, cell: Cell, tick: Tick) -> Result<(), GridError> {
        let idx = self.index_of(cell)?;
        self.current[idx] = 0.0;
        self.visited[idx] = true;
        self.last_visit[idx] = tick;
        Ok(())
    }

    /// Restore `baseline * growth_rate` reward to every visited cell,
    /// clamped at the baseline. Untouched cells never change.
    ///
    /// The increment is proportional to the baseline, not the remaining
    /// gap, so recovery is linear until the clamp.
    pub fn regenerate(&mut self, growth_rate: f64) {
        if growth_rate <= 0.0 {
            return;
        }
        for ((value, &baseline), &visited) in self
            .current
            .iter_mut()
            .zip(&self.initial)
            .zip(&self.visited)
        {
            if visited {
                *value = (*value + baseline * growth_rate).min(baseline);
            }
        }
    }
}

/// Bounded-depth exhaustive rollout over a grid snapshot.
///
/// `evaluate` explores every king-move chain of the requested depth, so
/// its cost is `O(8^depth)`; keep depths small.
///
/// The rollout reads the grid as it stands at call time and does not
/// simulate collection along the hypothetical path: a chain that revisits
/// a high-value cell scores it at full value every time. This
/// overestimates revisit-heavy paths and is part of the planner's
/// contract, not an accident of implementation.
#[derive(Debug, Clone, Copy)]
pub struct LookaheadEvaluator<'a> {
    grid: &'a RewardGrid,
}

impl<'a> LookaheadEvaluator<'a> {
    /// Borrow a read-only view of the grid for evaluation.
    #[must_use]
    pub const fn new(grid: &'a RewardGrid) -> Self {
        Self { grid }
    }

    /// Best cumulative reward reachable in exactly `depth` further moves
    /// from `from`. Zero when `depth` is zero or no neighbor is in
    /// bounds. The tick advances by one per hypothetical move.
    #[must_use]
    pub fn evaluate(&self, from: Cell, depth: u32, tick: Tick) -> f64 {
        if depth == 0 {
            return 0.0;
        }
        let mut best = 0.0_f64;
        for next in self.grid.neighbors(from) {
            let total = self.grid.reward(next) + self.evaluate(next, depth - 1, tick.next());
            if total > best {
                best = total;
            }
        }
        best
    }
}

/// One foraging drone: its position, visited path, and collected reward.
///
/// Drones only propose moves; every mutation of drone or grid state goes
/// through the commit methods, which the coordinator invokes after
/// arbitration.
#[derive(Debug, Clone, PartialEq)]
pub struct Drone {
    position: Cell,
    path: Vec<Cell>,
    collected: f64,
}

impl Drone {
    /// Place a drone at `start`, crediting the cell's current reward.
    /// The start cell is not collected; the grid keeps its value.
    pub fn new(start: Cell, grid: &RewardGrid) -> Result<Self, GridError> {
        let collected = grid.score_at(start)?;
        Ok(Self {
            position: start,
            path: vec![start],
            collected,
        })
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Cell {
        self.position
    }

    /// Every cell visited so far, starting with the start cell.
    #[must_use]
    pub fn path(&self) -> &[Cell] {
        &self.path
    }

    /// Total reward credited to this drone.
    #[must_use]
    pub const fn collected(&self) -> f64 {
        self.collected
    }

    /// Pick the neighbor maximizing immediate reward plus the rollout
    /// score of the remaining `lookahead - 1` moves. Ties resolve to the
    /// first maximum in neighbor order; with no in-bounds neighbor the
    /// drone proposes to stay where it is.
    #[must_use]
    pub fn propose_move(&self, grid: &RewardGrid, lookahead: u32, tick: Tick) -> Cell {
        let evaluator = LookaheadEvaluator::new(grid);
        let mut best: Option<Cell> = None;
        let mut best_score = f64::NEG_INFINITY;
        for candidate in grid.neighbors(self.position) {
            let immediate = grid.reward(candidate);
            let future = evaluator.evaluate(candidate, lookahead.saturating_sub(1), tick.next());
            let score = immediate + future;
            if score > best_score {
                best_score = score;
                best = Some(candidate);
            }
        }
        best.unwrap_or(self.position)
    }

    /// Apply an approved move: credit the cell's pre-collection reward,
    /// extend the path, and collect the cell. Returns the credited
    /// reward.
    pub fn commit_move(
        &mut self,
        grid: &mut RewardGrid,
        target: Cell,
        tick: Tick,
    ) -> Result<f64, GridError> {
        let reward = grid.score_at(target)?;
        self.apply(target, reward);
        grid.collect(target, tick)?;
        Ok(reward)
    }

    /// Apply an approved move whose cell was already collected earlier in
    /// the same commit pass: the drone still moves and its path still
    /// records the cell, but nothing is credited.
    pub fn commit_move_uncredited(
        &mut self,
        grid: &mut RewardGrid,
        target: Cell,
        tick: Tick,
    ) -> Result<(), GridError> {
        grid.index_of(target)?;
        self.apply(target, 0.0);
        grid.collect(target, tick)?;
        Ok(())
    }

    fn apply(&mut self, target: Cell, reward: f64) {
        self.collected += reward;
        self.path.push(target);
        self.position = target;
    }
}

/// Outcome of a single coordinator tick.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct TickSummary {
    pub tick: Tick,
    /// Drones whose committed move changed their position.
    pub moved: usize,
    /// Drones that stayed put, whether by proposal or by forfeit.
    pub stayed: usize,
    /// Drones forced to stay after losing arbitration.
    pub conflicts: usize,
    /// Reward credited across all commits this tick.
    pub reward_collected: f64,
}

/// Final result for one drone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DroneReport {
    pub start: Cell,
    pub path: Vec<Cell>,
    pub collected: f64,
}

/// Final result of a planning run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SwarmReport {
    pub grid_size: usize,
    pub ticks_completed: u64,
    /// Whether the run stopped on the wall-clock budget rather than the
    /// tick budget.
    pub deadline_hit: bool,
    pub drones: Vec<DroneReport>,
    pub total_collected: f64,
}

/// Owns the shared grid and the drone set, and advances the simulation
/// one arbitrated tick at a time.
///
/// Per tick: the grid regenerates, every drone proposes against the
/// pre-commit grid, claims on the same cell are arbitrated in favor of
/// the lowest drone index, and the approved moves are committed in index
/// order.
#[derive(Debug)]
pub struct SwarmCoordinator {
    config: ForageConfig,
    grid: RewardGrid,
    drones: Vec<Drone>,
    tick: Tick,
    history: VecDeque<TickSummary>,
}

impl SwarmCoordinator {
    /// Build a swarm over a baseline matrix, validating the configuration
    /// and every starting coordinate.
    pub fn new(
        config: ForageConfig,
        matrix: Vec<Vec<f64>>,
        starts: &[Cell],
    ) -> Result<Self, GridError> {
        config.validate()?;
        if starts.is_empty() {
            return Err(GridError::InvalidConfig(
                "at least one starting position is required",
            ));
        }
        let grid = RewardGrid::from_matrix(matrix, config.neighbor_offsets)?;
        let drones = starts
            .iter()
            .map(|&start| Drone::new(start, &grid))
            .collect::<Result<Vec<_>, _>>()?;
        let history = VecDeque::with_capacity(config.history_capacity);
        Ok(Self {
            config,
            grid,
            drones,
            tick: Tick::zero(),
            history,
        })
    }

    /// Read-only access to the shared grid.
    #[must_use]
    pub fn grid(&self) -> &RewardGrid {
        &self.grid
    }

    /// The drones in index order.
    #[must_use]
    pub fn drones(&self) -> &[Drone] {
        &self.drones
    }

    /// Tick reached so far.
    #[must_use]
    pub const fn tick(&self) -> Tick {
        self.tick
    }

    /// Run configuration.
    #[must_use]
    pub const fn config(&self) -> &ForageConfig {
        &self.config
    }

    /// Retained per-tick summaries, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &TickSummary> {
        self.history.iter()
    }

    /// Advance the simulation by one tick:
    /// regenerate, propose, arbitrate, commit.
    pub fn step(&mut self) -> Result<TickSummary, GridError> {
        let tick = self.tick;
        self.grid.regenerate(self.config.growth_rate);

        // Every proposal reads the same pre-commit grid; no drone sees
        // another drone's hypothetical move this tick.
        let proposals: Vec<Cell> = self
            .drones
            .iter()
            .map(|drone| drone.propose_move(&self.grid, self.config.lookahead, tick))
            .collect();

        let (approved, conflicts) = self.arbitrate(&proposals);

        // Commits run in index order so later drones observe earlier
        // collections. Arbitration deduplicates identical first proposals
        // only, so the commit pass re-checks cells collected this tick.
        let mut collected_this_tick: HashSet<Cell> = HashSet::new();
        let mut moved = 0_usize;
        let mut reward_collected = 0.0_f64;
        for (idx, target) in approved.into_iter().enumerate() {
            let drone = &mut self.drones[idx];
            if target == drone.position() {
                continue;
            }
            if collected_this_tick.insert(target) {
                reward_collected += drone.commit_move(&mut self.grid, target, tick)?;
            } else {
                drone.commit_move_uncredited(&mut self.grid, target, tick)?;
            }
            moved += 1;
        }

        let summary = TickSummary {
            tick,
            moved,
            stayed: self.drones.len() - moved,
            conflicts,
            reward_collected,
        };
        if self.history.len() >= self.config.history_capacity {
            self.history.pop_front();
        }
        self.history.push_back(summary);
        self.tick = tick.next();
        Ok(summary)
    }

    /// Resolve simultaneous claims: for each contested cell the lowest
    /// drone index keeps its proposal, every other claimant is forced to
    /// stay at its current position for this tick.
    fn arbitrate(&self, proposals: &[Cell]) -> (Vec<Cell>, usize) {
        let mut first_claim: HashMap<Cell, usize> = HashMap::with_capacity(proposals.len());
        for (idx, &target) in proposals.iter().enumerate() {
            first_claim.entry(target).or_insert(idx);
        }
        let mut conflicts = 0_usize;
        let approved = proposals
            .iter()
            .enumerate()
            .map(|(idx, &target)| {
                if first_claim[&target] == idx {
                    target
                } else {
                    conflicts += 1;
                    self.drones[idx].position()
                }
            })
            .collect();
        (approved, conflicts)
    }

    /// Run up to `max_ticks` ticks, checking the wall-clock budget at the
    /// start of each tick only. The budget is best-effort: a slow tick is
    /// never interrupted, and a run cut short is still a valid result.
    pub fn run(&mut self) -> Result<SwarmReport, GridError> {
        let started = Instant::now();
        let budget = Duration::from_millis(self.config.time_budget_ms);
        let mut deadline_hit = false;
        for _ in 0..self.config.max_ticks {
            if started.elapsed() > budget {
                deadline_hit = true;
                break;
            }
            self.step()?;
        }
        Ok(self.report(deadline_hit))
    }

    fn report(&self, deadline_hit: bool) -> SwarmReport {
        let drones: Vec<DroneReport> = self
            .drones
            .iter()
            .map(|drone| DroneReport {
                start: drone.path()[0],
                path: drone.path().to_vec(),
                collected: drone.collected(),
            })
            .collect();
        let total_collected = drones.iter().map(|d| d.collected).sum();
        SwarmReport {
            grid_size: self.grid.size(),
            ticks_completed: self.tick.0,
            deadline_hit,
            drones,
            total_collected,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uniform(size: usize, value: f64) -> Vec<Vec<f64>> {
        vec![vec![value; size]; size]
    }

    fn grid_from(matrix: Vec<Vec<f64>>) -> RewardGrid {
        RewardGrid::from_matrix(matrix, COMPASS_OFFSETS).expect("grid")
    }

    #[test]
    fn from_matrix_rejects_bad_shapes() {
        assert_eq!(
            RewardGrid::from_matrix(Vec::new(), COMPASS_OFFSETS),
            Err(GridError::EmptyMatrix)
        );
        let ragged = vec![vec![1.0, 2.0], vec![3.0]];
        assert_eq!(
            RewardGrid::from_matrix(ragged, COMPASS_OFFSETS),
            Err(GridError::NotSquare {
                row: 1,
                width: 1,
                expected: 2
            })
        );
        let negative = vec![vec![1.0, 2.0], vec![-3.0, 4.0]];
        assert_eq!(
            RewardGrid::from_matrix(negative, COMPASS_OFFSETS),
            Err(GridError::InvalidBaseline { row: 1, col: 0 })
        );
    }

    #[test]
    fn score_at_checks_bounds() {
        let grid = grid_from(uniform(3, 1.0));
        assert_eq!(grid.score_at(Cell::new(2, 2)), Ok(1.0));
        assert_eq!(
            grid.score_at(Cell::new(3, 0)),
            Err(GridError::OutOfBounds {
                row: 3,
                col: 0,
                size: 3
            })
        );
    }

    #[test]
    fn neighbors_follow_compass_order() {
        let grid = grid_from(uniform(3, 1.0));
        let center: Vec<Cell> = grid.neighbors(Cell::new(1, 1)).collect();
        assert_eq!(
            center,
            vec![
                Cell::new(0, 0),
                Cell::new(0, 1),
                Cell::new(0, 2),
                Cell::new(1, 0),
                Cell::new(1, 2),
                Cell::new(2, 0),
                Cell::new(2, 1),
                Cell::new(2, 2),
            ]
        );
        let corner: Vec<Cell> = grid.neighbors(Cell::new(0, 0)).collect();
        assert_eq!(
            corner,
            vec![Cell::new(0, 1), Cell::new(1, 0), Cell::new(1, 1)]
        );
    }

    #[test]
    fn collect_zeroes_and_marks_visited() {
        let mut grid = grid_from(uniform(2, 4.0));
        let cell = Cell::new(0, 1);
        grid.collect(cell, Tick(7)).expect("collect");
        assert_eq!(grid.score_at(cell), Ok(0.0));
        assert_eq!(grid.is_visited(cell), Ok(true));
        assert_eq!(grid.last_visit(cell), Ok(Tick(7)));
        assert_eq!(grid.is_visited(Cell::new(0, 0)), Ok(false));
    }

    #[test]
    fn regenerate_restores_linearly_and_clamps() {
        let mut grid = grid_from(uniform(2, 10.0));
        let cell = Cell::new(1, 1);
        grid.collect(cell, Tick::zero()).expect("collect");

        grid.regenerate(0.25);
        assert_eq!(grid.score_at(cell), Ok(2.5));
        grid.regenerate(0.25);
        assert_eq!(grid.score_at(cell), Ok(5.0));
        for _ in 0..10 {
            grid.regenerate(0.25);
        }
        assert_eq!(grid.score_at(cell), Ok(10.0));

        // Never-collected cells are untouched.
        assert_eq!(grid.score_at(Cell::new(0, 0)), Ok(10.0));
    }

    #[test]
    fn evaluate_base_cases() {
        let grid = grid_from(uniform(3, 2.0));
        let evaluator = LookaheadEvaluator::new(&grid);
        assert_eq!(evaluator.evaluate(Cell::new(1, 1), 0, Tick::zero()), 0.0);

        let lone = grid_from(uniform(1, 5.0));
        let lone_eval = LookaheadEvaluator::new(&lone);
        assert_eq!(lone_eval.evaluate(Cell::new(0, 0), 4, Tick::zero()), 0.0);
    }

    #[test]
    fn evaluate_sums_best_chain() {
        let matrix = vec![vec![0.0, 3.0], vec![0.0, 5.0]];
        let grid = grid_from(matrix);
        let evaluator = LookaheadEvaluator::new(&grid);
        // One move: the best neighbor of (0, 0) is (1, 1).
        assert_eq!(evaluator.evaluate(Cell::new(0, 0), 1, Tick::zero()), 5.0);
        // Two moves: (1, 1) then its best neighbor (0, 1).
        assert_eq!(evaluator.evaluate(Cell::new(0, 0), 2, Tick::zero()), 8.0);
    }

    #[test]
    fn evaluate_rescores_revisited_cells() {
        // The rollout reads the live snapshot and never zeroes cells its
        // hypothetical path already passed through, so a chain that
        // leaves the high cell and returns counts it twice.
        let matrix = vec![vec![0.0, 0.0], vec![0.0, 10.0]];
        let grid = grid_from(matrix);
        let evaluator = LookaheadEvaluator::new(&grid);
        assert_eq!(evaluator.evaluate(Cell::new(0, 0), 3, Tick::zero()), 20.0);
    }

    #[test]
    fn propose_move_is_greedy_at_depth_one() {
        let matrix = vec![
            vec![1.0, 1.0, 1.0],
            vec![1.0, 10.0, 1.0],
            vec![1.0, 1.0, 1.0],
        ];
        let grid = grid_from(matrix);
        let drone = Drone::new(Cell::new(0, 0), &grid).expect("drone");
        assert_eq!(
            drone.propose_move(&grid, 1, Tick::zero()),
            Cell::new(1, 1),
            "highest immediate reward wins at lookahead 1"
        );
    }

    #[test]
    fn propose_move_breaks_ties_in_neighbor_order() {
        let grid = grid_from(uniform(3, 1.0));
        let drone = Drone::new(Cell::new(1, 1), &grid).expect("drone");
        // All candidates score identically; the first neighbor (NW) wins.
        assert_eq!(drone.propose_move(&grid, 1, Tick::zero()), Cell::new(0, 0));
    }

    #[test]
    fn propose_move_stays_without_neighbors() {
        let grid = grid_from(uniform(1, 3.0));
        let drone = Drone::new(Cell::new(0, 0), &grid).expect("drone");
        assert_eq!(drone.propose_move(&grid, 3, Tick::zero()), Cell::new(0, 0));
    }

    #[test]
    fn drone_new_credits_start_without_collecting() {
        let grid = grid_from(uniform(2, 6.0));
        let drone = Drone::new(Cell::new(0, 0), &grid).expect("drone");
        assert_eq!(drone.collected(), 6.0);
        assert_eq!(drone.path(), &[Cell::new(0, 0)]);
        assert_eq!(grid.score_at(Cell::new(0, 0)), Ok(6.0));
        assert_eq!(grid.is_visited(Cell::new(0, 0)), Ok(false));
    }

    #[test]
    fn drone_new_rejects_out_of_range_start() {
        let grid = grid_from(uniform(2, 1.0));
        assert!(matches!(
            Drone::new(Cell::new(5, 5), &grid),
            Err(GridError::OutOfBounds { .. })
        ));
    }

    #[test]
    fn commit_move_credits_before_collecting() {
        let mut grid = grid_from(uniform(2, 3.0));
        let mut drone = Drone::new(Cell::new(0, 0), &grid).expect("drone");
        let reward = drone
            .commit_move(&mut grid, Cell::new(1, 1), Tick(2))
            .expect("commit");
        assert_eq!(reward, 3.0);
        assert_eq!(drone.collected(), 6.0);
        assert_eq!(drone.position(), Cell::new(1, 1));
        assert_eq!(drone.path(), &[Cell::new(0, 0), Cell::new(1, 1)]);
        assert_eq!(grid.score_at(Cell::new(1, 1)), Ok(0.0));
        assert_eq!(grid.last_visit(Cell::new(1, 1)), Ok(Tick(2)));
    }

    #[test]
    fn uncredited_commit_moves_without_reward() {
        let mut grid = grid_from(uniform(2, 3.0));
        let mut drone = Drone::new(Cell::new(0, 0), &grid).expect("drone");
        drone
            .commit_move_uncredited(&mut grid, Cell::new(0, 1), Tick(4))
            .expect("commit");
        assert_eq!(drone.collected(), 3.0, "only the start credit remains");
        assert_eq!(drone.position(), Cell::new(0, 1));
        assert_eq!(drone.path().len(), 2);
        assert_eq!(grid.is_visited(Cell::new(0, 1)), Ok(true));
    }

    #[test]
    fn config_validation_catches_bad_values() {
        let mut config = ForageConfig::default();
        config.growth_rate = -0.5;
        assert!(config.validate().is_err());

        let mut config = ForageConfig::default();
        config.lookahead = 0;
        assert!(config.validate().is_err());

        let mut config = ForageConfig::default();
        config.neighbor_offsets[3] = (0, 0);
        assert!(config.validate().is_err());

        let mut config = ForageConfig::default();
        config.neighbor_offsets[0] = (-2, 0);
        assert!(config.validate().is_err());

        assert!(ForageConfig::default().validate().is_ok());
    }

    #[test]
    fn coordinator_rejects_invalid_starts() {
        let config = ForageConfig::default();
        let result = SwarmCoordinator::new(config, uniform(3, 1.0), &[Cell::new(9, 9)]);
        assert!(matches!(result, Err(GridError::OutOfBounds { .. })));

        let empty = SwarmCoordinator::new(ForageConfig::default(), uniform(3, 1.0), &[]);
        assert!(matches!(empty, Err(GridError::InvalidConfig(_))));
    }

    #[test]
    fn arbitration_favors_lowest_index() {
        // Both drones flank the single high cell; each proposes it.
        let matrix = vec![
            vec![0.0, 0.0, 0.0],
            vec![0.0, 9.0, 0.0],
            vec![0.0, 0.0, 0.0],
        ];
        let config = ForageConfig {
            lookahead: 1,
            ..ForageConfig::default()
        };
        let starts = [Cell::new(0, 0), Cell::new(2, 2)];
        let mut swarm = SwarmCoordinator::new(config, matrix, &starts).expect("swarm");
        let summary = swarm.step().expect("step");

        assert_eq!(summary.moved, 1);
        assert_eq!(summary.conflicts, 1);
        assert_eq!(summary.reward_collected, 9.0);

        let winner = &swarm.drones()[0];
        assert_eq!(winner.position(), Cell::new(1, 1));
        assert_eq!(winner.collected(), 9.0);

        let loser = &swarm.drones()[1];
        assert_eq!(loser.position(), Cell::new(2, 2), "loser forfeits the tick");
        assert_eq!(loser.collected(), 0.0);
        assert_eq!(loser.path().len(), 1, "a forfeit appends nothing");
    }

    #[test]
    fn step_regenerates_before_proposals() {
        // After the high cell is collected, one regeneration pass restores
        // a tenth of its baseline before the next proposal reads it.
        let matrix = vec![
            vec![1.0, 1.0, 1.0],
            vec![1.0, 10.0, 1.0],
            vec![1.0, 1.0, 1.0],
        ];
        let config = ForageConfig {
            lookahead: 1,
            ..ForageConfig::default()
        };
        let mut swarm =
            SwarmCoordinator::new(config, matrix, &[Cell::new(0, 0)]).expect("swarm");
        swarm.step().expect("step");
        assert_eq!(swarm.grid().score_at(Cell::new(1, 1)), Ok(0.0));
        swarm.step().expect("step");
        assert_eq!(swarm.grid().score_at(Cell::new(1, 1)), Ok(1.0));
    }

    #[test]
    fn history_is_bounded_by_capacity() {
        let config = ForageConfig {
            lookahead: 1,
            history_capacity: 4,
            ..ForageConfig::default()
        };
        let mut swarm =
            SwarmCoordinator::new(config, uniform(4, 1.0), &[Cell::new(0, 0)]).expect("swarm");
        for _ in 0..10 {
            swarm.step().expect("step");
        }
        assert_eq!(swarm.history().count(), 4);
        let oldest = swarm.history().next().expect("summary");
        assert_eq!(oldest.tick, Tick(6));
    }
}
