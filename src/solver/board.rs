use fnv::FnvHashMap;

use crate::config::SolverConfig;
use crate::data::{Dir, MapCell, Pos};
use crate::map::GoalMap;
use crate::vec2d::Vec2d;

use super::goal_area::GoalArea;
use super::preprocessing::{find_dead_ends, find_entrances, find_goal_areas, find_tunnels};

/// Everything about a level that doesn't change during the search.
pub(crate) struct Board {
    pub(crate) map: GoalMap,
    pub(crate) dead_ends: Vec2d<bool>,
    pub(crate) tunnels: FnvHashMap<(Pos, Dir), Pos>,
    pub(crate) goal_areas: Vec<GoalArea>,
}

impl Board {
    pub(crate) fn new(map: GoalMap, config: &SolverConfig) -> Board {
        let dead_ends = find_dead_ends(&map.grid);
        let entrances = find_entrances(&map.grid);

        let tunnels = if config.tunnels {
            find_tunnels(&map.grid, &entrances)
        } else {
            FnvHashMap::default()
        };

        let goal_areas: Vec<_> = if config.goal_macros {
            find_goal_areas(&map, &entrances, config.goal_area_max_size)
                .into_iter()
                .map(|shape| GoalArea::new(&map, shape))
                .collect()
        } else {
            Vec::new()
        };

        debug!(
            "Board analysis: {} dead ends, {} entrances, {} tunnels, {} goal areas",
            map.grid
                .positions()
                .filter(|&pos| dead_ends[pos] && map.grid[pos] != MapCell::Wall)
                .count(),
            entrances.len(),
            tunnels.len(),
            goal_areas.len(),
        );

        Board {
            map,
            dead_ends,
            tunnels,
            goal_areas,
        }
    }

    /// Only dead ends, used for nested searches.
    pub(crate) fn plain(map: GoalMap) -> Board {
        let dead_ends = find_dead_ends(&map.grid);
        Board {
            map,
            dead_ends,
            tunnels: FnvHashMap::default(),
            goal_areas: Vec::new(),
        }
    }

    pub(crate) fn grid(&self) -> &Vec2d<MapCell> {
        &self.map.grid
    }
}
