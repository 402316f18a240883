//! Row-major grid of tiles.

use crate::tile::{Neighbor, Tile, TileKind};
use thiserror::Error;
use tracing::{debug, warn};

/// Upgrade that widens the grid by one column.
pub const COLUMN_UPGRADE: &str = "land_column";
/// Upgrade that adds one row to the grid.
pub const ROW_UPGRADE: &str = "land_row";

#[derive(Debug, Error, PartialEq)]
pub enum LandError {
    #[error("no empty land left for a {0:?} tile")]
    NoRoom(TileKind),
    #[error("grid index {0} is out of range")]
    OutOfRange(usize),
}

/// The player's land. `tiles.len() == columns × rows` at all times.
#[derive(Clone, Debug, PartialEq)]
pub struct LandGrid {
    tiles: Vec<Tile>,
    columns: usize,
    rows: usize,
}

impl LandGrid {
    pub fn new(columns: usize, rows: usize) -> Self {
        Self {
            tiles: (0..columns * rows).map(|_| Tile::empty()).collect(),
            columns,
            rows,
        }
    }

    /// Lay out loaded tiles on a `columns × rows` grid, dropping extras and
    /// padding with empty land.
    pub fn from_tiles(columns: usize, rows: usize, mut tiles: Vec<Tile>) -> Self {
        let size = columns * rows;
        if tiles.len() != size {
            warn!(expected = size, found = tiles.len(), "saved land does not match grid size");
        }
        tiles.truncate(size);
        tiles.resize_with(size, Tile::empty);
        let mut grid = Self { tiles, columns, rows };
        grid.refresh_adjacency();
        grid
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn get(&self, index: usize) -> Option<&Tile> {
        self.tiles.get(index)
    }

    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Tile> {
        self.tiles.get_mut(index)
    }

    pub fn has_room(&self) -> bool {
        self.tiles.iter().any(Tile::is_empty)
    }

    pub fn count(&self, kind: TileKind) -> usize {
        self.tiles.iter().filter(|t| t.kind() == kind).count()
    }

    /// Put `tile` on the first empty slot and return its index.
    pub fn add_tile(&mut self, tile: Tile) -> Result<usize, LandError> {
        let Some(index) = self.tiles.iter().position(Tile::is_empty) else {
            warn!(kind = ?tile.kind(), "no empty land for new tile");
            return Err(LandError::NoRoom(tile.kind()));
        };
        debug!(index, kind = ?tile.kind(), "tile placed");
        self.tiles[index] = tile;
        self.refresh_adjacency();
        Ok(index)
    }

    /// Swap the tile at `index`, returning the previous one.
    pub fn replace(&mut self, index: usize, tile: Tile) -> Result<Tile, LandError> {
        let slot = self.tiles.get_mut(index).ok_or(LandError::OutOfRange(index))?;
        let old = std::mem::replace(slot, tile);
        self.refresh_adjacency();
        Ok(old)
    }

    /// Append an empty tile to the end of every row. Rows are processed from
    /// the bottom so earlier insertion points stay valid.
    pub fn add_column(&mut self) {
        let old = self.columns;
        for row in (0..self.rows).rev() {
            self.tiles.insert((row + 1) * old, Tile::empty());
        }
        self.columns += 1;
        self.refresh_adjacency();
    }

    pub fn add_row(&mut self) {
        self.tiles.extend((0..self.columns).map(|_| Tile::empty()));
        self.rows += 1;
        self.refresh_adjacency();
    }

    /// Indices of the up-to-four orthogonal neighbours of `index`.
    pub fn adjacent(&self, index: usize) -> Vec<usize> {
        let cols = self.columns;
        if cols == 0 || index >= self.tiles.len() {
            return Vec::new();
        }
        let (row, col) = (index / cols, index % cols);
        let mut out = Vec::with_capacity(4);
        if row > 0 {
            out.push(index - cols);
        }
        if index + cols < self.tiles.len() {
            out.push(index + cols);
        }
        if col > 0 {
            out.push(index - 1);
        }
        if col + 1 < cols {
            out.push(index + 1);
        }
        out
    }

    pub fn neighbors(&self, index: usize) -> Vec<Neighbor> {
        self.adjacent(index)
            .into_iter()
            .map(|i| self.tiles[i].as_neighbor())
            .collect()
    }

    /// Let every tile react to its current neighbourhood.
    pub fn refresh_adjacency(&mut self) {
        for index in 0..self.tiles.len() {
            let neighbors = self.neighbors(index);
            self.tiles[index].on_neighbors_changed(&neighbors);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::minor::Monster;
    use crate::windmill::Windmill;
    use proptest::prelude::*;

    fn marker(id: u64) -> Tile {
        Tile::Monster(Monster { pokes: id })
    }

    fn marker_id(tile: &Tile) -> Option<u64> {
        match tile {
            Tile::Monster(m) => Some(m.pokes),
            _ => None,
        }
    }

    #[test]
    fn add_tile_fills_first_empty_slot() {
        let mut land = LandGrid::new(2, 2);
        assert_eq!(land.add_tile(marker(1)), Ok(0));
        assert_eq!(land.add_tile(marker(2)), Ok(1));
        land.replace(0, Tile::empty()).unwrap();
        assert_eq!(land.add_tile(marker(3)), Ok(0));
    }

    #[test]
    fn full_grid_refuses_tiles() {
        let mut land = LandGrid::new(1, 1);
        land.add_tile(marker(1)).unwrap();
        assert!(!land.has_room());
        assert_eq!(land.add_tile(marker(2)), Err(LandError::NoRoom(TileKind::Monster)));
        assert_eq!(land.replace(5, marker(3)), Err(LandError::OutOfRange(5)));
    }

    #[test]
    fn column_insert_keeps_rows_aligned() {
        let mut land = LandGrid::new(2, 2);
        for id in 0..4 {
            land.add_tile(marker(id)).unwrap();
        }
        land.add_column();
        let ids: Vec<Option<u64>> = land.tiles().iter().map(marker_id).collect();
        assert_eq!(ids, vec![Some(0), Some(1), None, Some(2), Some(3), None]);
        land.add_row();
        assert_eq!(land.len(), 9);
        assert_eq!(land.rows(), 3);
    }

    #[test]
    fn adjacency_respects_edges() {
        let land = LandGrid::new(3, 3);
        let mut center = land.adjacent(4);
        center.sort();
        assert_eq!(center, vec![1, 3, 5, 7]);
        let mut corner = land.adjacent(0);
        corner.sort();
        assert_eq!(corner, vec![1, 3]);
        let mut edge = land.adjacent(5);
        edge.sort();
        assert_eq!(edge, vec![2, 4, 8]);
        assert!(land.adjacent(9).is_empty());
    }

    #[test]
    fn windmill_bonus_follows_neighbours() {
        let mut land = LandGrid::new(3, 1);
        land.add_tile(Tile::Windmill(Windmill::default())).unwrap();
        land.add_tile(Tile::Windmill(Windmill::default())).unwrap();
        land.add_tile(Tile::Windmill(Windmill::default())).unwrap();
        let bonus = |land: &LandGrid, i: usize| match land.get(i) {
            Some(Tile::Windmill(w)) => w.neighbor_bonus,
            _ => -1.0,
        };
        assert!((bonus(&land, 1) - 0.2).abs() < 1e-12);
        assert!((bonus(&land, 0) - 0.1).abs() < 1e-12);
        land.replace(2, Tile::empty()).unwrap();
        assert!((bonus(&land, 1) - 0.1).abs() < 1e-12);
    }

    #[test]
    fn loaded_land_is_fitted_to_grid() {
        let land = LandGrid::from_tiles(2, 2, vec![marker(1)]);
        assert_eq!(land.len(), 4);
        let land = LandGrid::from_tiles(1, 1, vec![marker(1), marker(2)]);
        assert_eq!(land.len(), 1);
        assert_eq!(marker_id(&land.tiles()[0]), Some(1));
    }

    proptest! {
        #[test]
        fn resizing_preserves_shape_and_coordinates(
            cols in 1usize..5,
            rows in 1usize..5,
            ops in proptest::collection::vec(any::<bool>(), 0..6),
        ) {
            let mut land = LandGrid::new(cols, rows);
            let mut id = 0;
            while land.has_room() {
                land.add_tile(marker(id)).unwrap();
                id += 1;
            }
            for add_col in ops {
                if add_col { land.add_column() } else { land.add_row() }
                prop_assert_eq!(land.len(), land.columns() * land.rows());
            }
            for r in 0..rows {
                for c in 0..cols {
                    let original = (r * cols + c) as u64;
                    let now = &land.tiles()[r * land.columns() + c];
                    prop_assert_eq!(marker_id(now), Some(original));
                }
            }
        }
    }
}
