use std::collections::VecDeque;

use fnv::FnvHashMap;

use crate::data::{Dir, MapCell, Pos, DIRECTIONS};
use crate::map::GoalMap;
use crate::solver::SolverErr;
use crate::vec2d::Vec2d;

pub(crate) fn check_reachability(
    grid: &Vec2d<MapCell>,
    player_pos: Pos,
) -> Result<(Vec2d<MapCell>, Vec2d<bool>), SolverErr> {
    // make sure the level is surrounded by wall
    let mut visited = grid.scratchpad();

    let mut to_visit = vec![player_pos];
    while let Some(cur) = to_visit.pop() {
        visited[cur] = true;

        let (r, c) = (i32::from(cur.r), i32::from(cur.c));
        let neighbors = [(r + 1, c), (r - 1, c), (r, c + 1), (r, c - 1)];
        for &(nr, nc) in &neighbors {
            // this is the only place in the solver where we need to check bounds (using signed types)
            // everything after that will be surrounded by walls
            if nr < 0 || nc < 0 || nr >= i32::from(grid.rows()) || nc >= i32::from(grid.cols()) {
                // we got out of bounds without hitting a wall
                return Err(SolverErr::IncompleteBorder);
            }

            let new_pos = Pos::new(nr as u8, nc as u8);
            if !visited[new_pos] && grid[new_pos] != MapCell::Wall {
                to_visit.push(new_pos);
            }
        }
    }

    // make sure all non-reachable cells are walls
    // to avoid errors with some code that iterates through all non-walls
    let mut processed_grid = grid.clone();
    for pos in processed_grid.positions() {
        if !visited[pos] {
            processed_grid[pos] = MapCell::Wall;
        }
    }

    Ok((processed_grid, visited))
}

/// Marks cells from which a box can never reach a goal.
///
/// Walls are marked too so a single lookup rejects both.
pub(crate) fn find_dead_ends(grid: &Vec2d<MapCell>) -> Vec2d<bool> {
    let mut dead_ends = grid.scratchpad();
    let mut corners = Vec::new();

    for pos in grid.positions() {
        match grid[pos] {
            MapCell::Wall => dead_ends[pos] = true,
            MapCell::Goal => {}
            MapCell::Empty => {
                let vertical = grid[pos + Dir::Up] == MapCell::Wall
                    || grid[pos + Dir::Down] == MapCell::Wall;
                let horizontal = grid[pos + Dir::Left] == MapCell::Wall
                    || grid[pos + Dir::Right] == MapCell::Wall;
                if vertical && horizontal {
                    dead_ends[pos] = true;
                    corners.push(pos);
                }
            }
        }
    }

    // walk from each corner along the wall, if we hit another wall
    // before a goal or an opening in the wall, everything in between is dead too
    for &corner in &corners {
        for &dir in &DIRECTIONS {
            if grid[corner + dir] == MapCell::Wall {
                continue;
            }
            for &side in &DIRECTIONS {
                if side.is_vertical() == dir.is_vertical() || grid[corner + side] != MapCell::Wall {
                    continue;
                }

                let mut line = Vec::new();
                let mut cur = corner + dir;
                let confirmed = loop {
                    if grid[cur] == MapCell::Wall {
                        break true;
                    }
                    if grid[cur] == MapCell::Goal || grid[cur + side] != MapCell::Wall {
                        break false;
                    }
                    line.push(cur);
                    cur = cur + dir;
                };
                if confirmed {
                    for pos in line {
                        dead_ends[pos] = true;
                    }
                }
            }
        }
    }

    dead_ends
}

/// If the cell is a one tile wide passage, returns whether it runs vertically.
///
/// Goals are never entrances.
pub(crate) fn passage_axis(grid: &Vec2d<MapCell>, pos: Pos) -> Option<bool> {
    if grid[pos] != MapCell::Empty {
        return None;
    }
    let blocked = |dir: Dir| grid[pos + dir] == MapCell::Wall;
    let vertical_closed = blocked(Dir::Up) && blocked(Dir::Down);
    let horizontal_closed = blocked(Dir::Left) && blocked(Dir::Right);
    match (vertical_closed, horizontal_closed) {
        (false, true) => Some(true),
        (true, false) => Some(false),
        _ => None,
    }
}

pub(crate) fn find_entrances(grid: &Vec2d<MapCell>) -> Vec<(Pos, bool)> {
    grid.positions()
        .filter_map(|pos| passage_axis(grid, pos).map(|vertical| (pos, vertical)))
        .collect()
}

/// Maps an entrance and a direction along its passage to the last cell
/// of the chain of entrances in that direction.
pub(crate) fn find_tunnels(
    grid: &Vec2d<MapCell>,
    entrances: &[(Pos, bool)],
) -> FnvHashMap<(Pos, Dir), Pos> {
    let mut tunnels = FnvHashMap::default();
    for &(entrance, vertical) in entrances {
        for &dir in &DIRECTIONS {
            if dir.is_vertical() != vertical {
                continue;
            }
            let mut end = entrance;
            while passage_axis(grid, end + dir) == Some(vertical) {
                end = end + dir;
            }
            if end != entrance {
                tunnels.insert((entrance, dir), end);
            }
        }
    }
    tunnels
}

/// A region only accessible through one entrance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct AreaShape {
    pub(crate) entrance: Pos,
    /// The direction boxes are pushed into the area.
    pub(crate) dir: Dir,
    /// Sorted, without the entrance.
    pub(crate) squares: Vec<Pos>,
    /// Sorted.
    pub(crate) goals: Vec<Pos>,
}

pub(crate) fn find_goal_areas(
    map: &GoalMap,
    entrances: &[(Pos, bool)],
    max_size: usize,
) -> Vec<AreaShape> {
    let grid = &map.grid;
    let mut areas = Vec::new();

    for &(entrance, vertical) in entrances {
        'dirs: for &dir in &DIRECTIONS {
            if dir.is_vertical() != vertical {
                continue;
            }
            let start = entrance + dir;
            let behind = entrance - dir;
            if grid[start] == MapCell::Wall || grid[behind] == MapCell::Wall {
                continue;
            }

            let mut visited = grid.scratchpad();
            visited[entrance] = true;
            visited[start] = true;
            let mut squares = vec![start];
            let mut to_visit = VecDeque::new();
            to_visit.push_back(start);
            while let Some(cur) = to_visit.pop_front() {
                for &next in &cur.neighbors() {
                    if grid[next] == MapCell::Wall || visited[next] {
                        continue;
                    }
                    if next == behind || squares.len() >= max_size {
                        // reconnected to the other side or too big
                        continue 'dirs;
                    }
                    visited[next] = true;
                    squares.push(next);
                    to_visit.push_back(next);
                }
            }

            squares.sort();
            let goals: Vec<_> = squares
                .iter()
                .cloned()
                .filter(|&pos| grid[pos] == MapCell::Goal)
                .collect();
            if goals.len() >= 2 {
                areas.push(AreaShape {
                    entrance,
                    dir,
                    squares,
                    goals,
                });
            }
        }
    }

    // a tunnel leading into an area produces nested areas, keep the outermost
    let outer: Vec<_> = areas
        .iter()
        .filter(|area| {
            !areas
                .iter()
                .any(|other| other.squares.binary_search(&area.entrance).is_ok())
        })
        .cloned()
        .collect();
    outer
}
