//! # Water Runners
//!
//! A runner is an entity that pours water into the level a little at a
//! time. Its [`WaterRunner`] component is a small state machine; each
//! frame it does one bounded step and keeps everything it needs for the
//! next one (search map, queue, fill cursor) in the component.
//!
//! ```text
//! Reset -> Start -> LowestPointSearch -> LowestPointMovement
//!                                              |
//!         +------------------------------------+
//!         v
//!   ReachabilitySearch <-> ScanlineFill -> FillComplete
//!         |
//!         +--> Start (found a drop below the row)
//! ```
//!
//! Any tile edit invalidates the cached search; [`World::change_tile`]
//! sends every runner back to `Reset`.

use sluice_core::{BfsTile, ComponentKind, RunnerState, WaterRunner};
use tracing::debug;

use crate::tilemap::{SolidType, TileGrid};
use crate::world::World;

/// Advances every live water runner by one step.
pub fn update_water_runner_system(world: &mut World, dt: f32) {
    let fill_rate = world.config.water.fill_rate;

    let ids = world.take_ids(ComponentKind::WaterRunner);
    for &id in &ids {
        if !world.manager.is_alive(id) {
            continue;
        }
        let Some(runner) = world.manager.get_component_mut::<WaterRunner>(id) else {
            continue;
        };
        let from = runner.state;
        let to = step_runner(runner, &mut world.grid, fill_rate, dt);
        if from != to {
            debug!("water runner {}: {:?} -> {:?}", id, from, to);
        }
    }
    world.release_ids(ids);
}

/// Runs one step of a runner's state machine and returns its new state.
pub fn step_runner(
    runner: &mut WaterRunner,
    grid: &mut TileGrid,
    fill_rate: f32,
    dt: f32,
) -> RunnerState {
    runner.state = match runner.state {
        RunnerState::Reset => {
            reset_runner(runner);
            RunnerState::Start
        }
        RunnerState::Start => start_tile(runner, grid),
        RunnerState::LowestPointSearch => match lowest_point_search(runner, grid) {
            Some(_) => RunnerState::LowestPointMovement,
            None => RunnerState::FillComplete,
        },
        RunnerState::LowestPointMovement => follow_path(runner),
        RunnerState::ReachabilitySearch => reachability_search(runner, grid),
        RunnerState::ScanlineFill => scanline_fill(runner, grid, fill_rate * dt),
        RunnerState::FillComplete => RunnerState::FillComplete,
    };
    runner.state
}

// =============================================================================
// TILE QUERIES
// =============================================================================

fn tile_index(grid: &TileGrid, idx: i32) -> Option<u32> {
    u32::try_from(idx).ok().filter(|&i| (i as usize) < grid.len())
}

fn blocks_water(grid: &TileGrid, idx: u32) -> bool {
    grid.tile(idx).map_or(true, |t| t.solid == SolidType::Solid)
}

/// Non-solid and able to take more water.
fn is_open(grid: &TileGrid, idx: u32) -> bool {
    grid.tile(idx)
        .is_some_and(|t| t.solid != SolidType::Solid && !t.is_full())
}

fn neighbour(grid: &TileGrid, idx: u32, dx: i32, dy: i32) -> Option<u32> {
    let (tx, ty) = grid.coords(idx);
    grid.index(tx as i32 + dx, ty as i32 + dy)
}

// =============================================================================
// STATES
// =============================================================================

fn reset_runner(runner: &mut WaterRunner) {
    runner.bfs_tilemap.fill(BfsTile::default());
    runner.visited.fill(false);
    runner.bfs_queue.clear();
    runner.target_tile = -1;
    runner.fill_idx = 0;
    runner.fill_range = [0, 0];
    runner.counter = 0;
    runner.fractional = 0.0;
}

/// Moves the runner off a solid tile, left first.
fn start_tile(runner: &mut WaterRunner, grid: &TileGrid) -> RunnerState {
    let Some(current) = tile_index(grid, runner.current_tile) else {
        return RunnerState::FillComplete;
    };
    if !blocks_water(grid, current) {
        return RunnerState::LowestPointSearch;
    }

    let (tx, ty) = grid.coords(current);
    let (tx, ty) = (tx as i32, ty as i32);
    let left = (0..tx).rev().filter_map(|x| grid.index(x, ty));
    let right = (tx + 1..grid.width() as i32).filter_map(|x| grid.index(x, ty));
    match left.chain(right).find(|&i| !blocks_water(grid, i)) {
        Some(free) => {
            runner.current_tile = free as i32;
            RunnerState::LowestPointSearch
        }
        None => RunnerState::FillComplete,
    }
}

/// Breadth-first search for the lowest tile water can reach from the
/// runner's tile.
///
/// An open tile below is the only way on; a full one lets the search go
/// down and sideways; a solid floor or the grid edge only sideways. The
/// deepest row wins, the first tile found on it breaks ties. The path to
/// it is written into the `to` links of the search map.
///
/// Returns the target, or `None` if the runner is not on a free tile.
pub fn lowest_point_search(runner: &mut WaterRunner, grid: &TileGrid) -> Option<u32> {
    let start = tile_index(grid, runner.current_tile)?;
    if blocks_water(grid, start) || runner.len() < grid.len() {
        return None;
    }

    runner.bfs_tilemap.fill(BfsTile::default());
    runner.visited.fill(false);
    runner.bfs_queue.clear();

    runner.visited[start as usize] = true;
    runner.bfs_tilemap[start as usize].reachable = true;
    runner.bfs_queue.push_back(start as i32);

    let mut lowest = start;
    let mut lowest_row = grid.coords(start).1;
    let mut next = Vec::with_capacity(3);

    while let Some(curr) = runner.bfs_queue.pop_front() {
        let curr = curr as u32;
        let row = grid.coords(curr).1;
        if row > lowest_row {
            lowest = curr;
            lowest_row = row;
        }

        next.clear();
        match neighbour(grid, curr, 0, 1) {
            Some(below) if is_open(grid, below) => next.push(below),
            Some(below) if !blocks_water(grid, below) => {
                next.push(below);
                next.extend(neighbour(grid, curr, -1, 0));
                next.extend(neighbour(grid, curr, 1, 0));
            }
            _ => {
                next.extend(neighbour(grid, curr, -1, 0));
                next.extend(neighbour(grid, curr, 1, 0));
            }
        }

        for &n in &next {
            let slot = n as usize;
            if runner.visited[slot] || blocks_water(grid, n) {
                continue;
            }
            runner.visited[slot] = true;
            runner.bfs_tilemap[slot].reachable = true;
            runner.bfs_tilemap[slot].from = curr as i32;
            runner.bfs_queue.push_back(n as i32);
        }
    }

    // Turn the parent chain into forward links
    let mut child = lowest as i32;
    while child != start as i32 {
        let parent = runner.bfs_tilemap[child as usize].from;
        if parent < 0 {
            break;
        }
        runner.bfs_tilemap[parent as usize].to = child;
        child = parent;
    }

    runner.target_tile = lowest as i32;
    Some(lowest)
}

fn follow_path(runner: &mut WaterRunner) -> RunnerState {
    if runner.current_tile != runner.target_tile {
        runner.counter += 1;
        if runner.counter < i16::from(runner.movement_delay) {
            return RunnerState::LowestPointMovement;
        }
        runner.counter = 0;
        for _ in 0..runner.movement_speed.max(1) {
            let Some(step) = usize::try_from(runner.current_tile)
                .ok()
                .and_then(|i| runner.bfs_tilemap.get(i))
                .map(|t| t.to)
            else {
                break;
            };
            if step < 0 || runner.current_tile == runner.target_tile {
                break;
            }
            runner.current_tile = step;
        }
    }

    if runner.current_tile == runner.target_tile {
        RunnerState::ReachabilitySearch
    } else {
        RunnerState::LowestPointMovement
    }
}

/// Spreads across the runner's row. Drops into any open tile below the
/// span, otherwise fills the span.
fn reachability_search(runner: &mut WaterRunner, grid: &TileGrid) -> RunnerState {
    let Some(current) = tile_index(grid, runner.current_tile) else {
        return RunnerState::FillComplete;
    };
    if blocks_water(grid, current) {
        return RunnerState::Start;
    }

    let (tx, ty) = grid.coords(current);
    let (tx, ty) = (tx as i32, ty as i32);
    let free = |x: i32| grid.index(x, ty).is_some_and(|i| !blocks_water(grid, i));
    let mut lo = tx;
    while free(lo - 1) {
        lo -= 1;
    }
    let mut hi = tx;
    while free(hi + 1) {
        hi += 1;
    }

    let drop = (lo..=hi)
        .filter_map(|x| grid.index(x, ty + 1))
        .find(|&below| is_open(grid, below));
    if let Some(below) = drop {
        runner.current_tile = below as i32;
        return RunnerState::Start;
    }

    runner.fill_range = [lo, hi];
    runner.fill_idx = lo;
    RunnerState::ScanlineFill
}

/// Next tile of the fill span that can take water, round-robin from the
/// fill cursor.
fn next_fill_tile(runner: &mut WaterRunner, grid: &TileGrid, row: i32) -> Option<u32> {
    let [lo, hi] = runner.fill_range;
    let span = hi - lo + 1;
    for step in 0..span {
        let x = lo + (runner.fill_idx - lo + step).rem_euclid(span);
        let Some(idx) = grid.index(x, row) else {
            continue;
        };
        if is_open(grid, idx) {
            runner.fill_idx = if x >= hi { lo } else { x + 1 };
            return Some(idx);
        }
    }
    None
}

fn scanline_fill(runner: &mut WaterRunner, grid: &mut TileGrid, amount: f32) -> RunnerState {
    let Some(current) = tile_index(grid, runner.current_tile) else {
        return RunnerState::FillComplete;
    };
    let (tx, ty) = grid.coords(current);
    let (tx, ty) = (tx as i32, ty as i32);

    runner.fractional += amount;
    let mut span_full = false;
    while runner.fractional >= 1.0 {
        let Some(idx) = next_fill_tile(runner, grid, ty) else {
            span_full = true;
            break;
        };
        let level = grid.tile(idx).map_or(0, |t| t.water_level);
        grid.set_water_level(idx, level.saturating_add(1));
        runner.fractional -= 1.0;
    }
    if !span_full {
        let [lo, hi] = runner.fill_range;
        span_full = (lo..=hi)
            .filter_map(|x| grid.index(x, ty))
            .all(|i| !is_open(grid, i));
    }
    if !span_full {
        return RunnerState::ScanlineFill;
    }

    runner.fractional = 0.0;
    match grid.index(tx, ty - 1) {
        Some(above) if !blocks_water(grid, above) => {
            runner.current_tile = above as i32;
            RunnerState::ReachabilitySearch
        }
        _ => RunnerState::FillComplete,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tilemap::TileType;

    /// 6x5 grid with a solid floor on the bottom row and a one-tile pit at
    /// column 4 of row 3.
    fn basin() -> TileGrid {
        let mut grid = TileGrid::new(6, 5).unwrap();
        for x in 0..6 {
            let idx = grid.index(x, 4).unwrap();
            grid.change_tile(idx, TileType::Solid);
        }
        for x in [0, 1, 2, 3, 5] {
            let idx = grid.index(x, 3).unwrap();
            grid.change_tile(idx, TileType::Solid);
        }
        grid
    }

    fn runner_at(grid: &TileGrid, tile: u32) -> WaterRunner {
        let mut runner = WaterRunner::default();
        runner.allocate(grid.width(), grid.height());
        runner.current_tile = tile as i32;
        runner.movement_delay = 1;
        runner.movement_speed = 1;
        runner
    }

    #[test]
    fn test_search_finds_pit() {
        let grid = basin();
        let start = grid.index(1, 0).unwrap();
        let mut runner = runner_at(&grid, start);

        let target = lowest_point_search(&mut runner, &grid).unwrap();
        assert_eq!(target, grid.index(4, 3).unwrap());
        assert_eq!(runner.target_tile, target as i32);
    }

    #[test]
    fn test_search_is_repeatable() {
        let grid = basin();
        let mut runner = runner_at(&grid, grid.index(0, 0).unwrap());
        let first = lowest_point_search(&mut runner, &grid);
        let second = lowest_point_search(&mut runner, &grid);
        assert_eq!(first, second);
    }

    #[test]
    fn test_path_reaches_target() {
        let mut grid = basin();
        let mut runner = runner_at(&grid, grid.index(1, 0).unwrap());
        runner.state = RunnerState::LowestPointSearch;
        let mut state = step_runner(&mut runner, &mut grid, 60.0, 0.017);
        assert_eq!(state, RunnerState::LowestPointMovement);

        for _ in 0..32 {
            state = step_runner(&mut runner, &mut grid, 60.0, 0.017);
            if state != RunnerState::LowestPointMovement {
                break;
            }
        }
        assert_eq!(state, RunnerState::ReachabilitySearch);
        assert_eq!(runner.current_tile, grid.index(4, 3).unwrap() as i32);
    }

    #[test]
    fn test_solid_start_moves_sideways() {
        let mut grid = basin();
        let mut runner = runner_at(&grid, grid.index(2, 3).unwrap());
        runner.state = RunnerState::Start;
        assert_eq!(
            step_runner(&mut runner, &mut grid, 60.0, 0.017),
            RunnerState::LowestPointSearch
        );
        assert_eq!(runner.current_tile, grid.index(4, 3).unwrap() as i32);
    }

    #[test]
    fn test_fill_raises_pit_then_row_above() {
        let mut grid = basin();
        let pit = grid.index(4, 3).unwrap();
        let mut runner = runner_at(&grid, pit);
        runner.state = RunnerState::ReachabilitySearch;

        assert_eq!(
            step_runner(&mut runner, &mut grid, 60.0, 0.017),
            RunnerState::ScanlineFill
        );
        assert_eq!(runner.fill_range, [4, 4]);

        let mut state = RunnerState::ScanlineFill;
        for _ in 0..16 {
            state = step_runner(&mut runner, &mut grid, 60.0, 0.017);
            if state != RunnerState::ScanlineFill {
                break;
            }
        }
        assert_eq!(state, RunnerState::ReachabilitySearch);
        assert!(grid.tile(pit).unwrap().is_full());
        assert_eq!(runner.current_tile, grid.index(4, 2).unwrap() as i32);

        assert_eq!(
            step_runner(&mut runner, &mut grid, 60.0, 0.017),
            RunnerState::ScanlineFill
        );
        assert_eq!(runner.fill_range, [0, 5]);
    }

    #[test]
    fn test_sealed_runner_completes() {
        let mut grid = TileGrid::new(1, 1).unwrap();
        grid.change_tile(0, TileType::Solid);
        let mut runner = runner_at(&grid, 0);
        runner.state = RunnerState::Start;
        assert_eq!(
            step_runner(&mut runner, &mut grid, 60.0, 0.017),
            RunnerState::FillComplete
        );
    }
}
