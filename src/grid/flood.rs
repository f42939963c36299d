//! Breadth-first flood fill over a grid.
//!
//! Used by the region driver to isolate the connected component around an
//! exit and by the property pass to number rooms.

use std::collections::VecDeque;

use super::{Dir, Grid, Location};

/// Collect the contiguous region around `seed` whose cells satisfy `filter`.
///
/// Connectivity is 4-way. Returns cells in visit order; empty when the seed
/// itself is out of range or filtered out.
pub fn flood_fill<T, F>(grid: &Grid<T>, seed: Location, filter: F) -> Vec<Location>
where
    F: Fn(&T) -> bool,
{
    let mut region = Vec::new();
    match grid.at(seed) {
        Some(value) if filter(value) => {}
        _ => return region,
    }

    let mut visited = Grid::filled(grid.height, grid.width, false);
    let mut queue = VecDeque::new();
    queue.push_back(seed);
    if let Some(cell) = visited.at_mut(seed) {
        *cell = true;
    }

    while let Some(current) = queue.pop_front() {
        region.push(current);

        for dir in Dir::ALL {
            let next = current.step(dir);
            let seen = visited.get_or(next, true);
            if seen {
                continue;
            }
            if let (Some(value), Some(mark)) = (grid.at(next), visited.at_mut(next)) {
                if filter(value) {
                    *mark = true;
                    queue.push_back(next);
                }
            }
        }
    }

    region
}

#[cfg(test)]
mod tests {
    use super::*;

    fn corridor() -> Grid<char> {
        Grid::from_lines(&[
            "_____",
            "_ccc_",
            "___c_",
            "_B_c_",
            "_____",
        ])
        .unwrap()
    }

    #[test]
    fn test_flood_fill_follows_corridor() {
        let g = corridor();
        let region = flood_fill(&g, Location::new(1, 1), |&c| c != '_');
        assert_eq!(region.len(), 5, "The corridor has five connected cells");
        assert!(region.contains(&Location::new(3, 3)));
    }

    #[test]
    fn test_flood_fill_excludes_disconnected() {
        let g = corridor();
        let region = flood_fill(&g, Location::new(1, 1), |&c| c != '_');
        assert!(
            !region.contains(&Location::new(3, 1)),
            "The lone room cell is not connected to the corridor"
        );
    }

    #[test]
    fn test_flood_fill_filtered_seed_is_empty() {
        let g = corridor();
        let region = flood_fill(&g, Location::new(0, 0), |&c| c != '_');
        assert!(region.is_empty());
    }

    #[test]
    fn test_flood_fill_out_of_range_seed_is_empty() {
        let g = corridor();
        let region = flood_fill(&g, Location::new(-1, 2), |&c| c != '_');
        assert!(region.is_empty());
    }

    #[test]
    fn test_flood_fill_whole_grid() {
        let g = Grid::filled(3, 3, 'x');
        let region = flood_fill(&g, Location::new(1, 1), |&c| c == 'x');
        assert_eq!(region.len(), 9);
    }

    #[test]
    fn test_flood_fill_visits_each_cell_once() {
        let g = corridor();
        let region = flood_fill(&g, Location::new(1, 1), |&c| c != '_');
        let mut sorted: Vec<_> = region.iter().map(|l| (l.row, l.col)).collect();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(sorted.len(), region.len(), "No cell may be reported twice");
    }
}
