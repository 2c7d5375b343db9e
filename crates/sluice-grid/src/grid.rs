//! The rectangular field grid and engine registration.

use crate::config::FieldConfig;
use crate::error::{ConfigError, GridError};
use crate::node::FieldNode;
use indexmap::IndexMap;
use sluice_core::CellCoord;
use sluice_session::Session;
use smallvec::SmallVec;

/// A rectangular grid of fields, indexed by `(x, y)`.
///
/// Extents are derived from the configuration: `max(x)+1 × max(y)+1`.
/// Every cell in that rectangle is either populated by exactly one
/// field or explicitly empty; addressing a cell outside the rectangle
/// is a [`GridError`], never a silent no-op.
///
/// Iteration over populated cells is row-major (`x` outer, `y` inner)
/// and deterministic, which keeps every engine exchange reproducible
/// run to run.
#[derive(Debug)]
pub struct FieldGrid {
    extent_x: u32,
    extent_y: u32,
    /// Row-major cell table: `x * extent_y + y` → node index.
    cells: Vec<Option<usize>>,
    nodes: Vec<FieldNode>,
    /// Name → node index, in configuration order.
    by_name: IndexMap<String, usize>,
    registered: bool,
}

impl FieldGrid {
    /// Build a grid from configuration records, validating eagerly.
    ///
    /// Duplicate names and duplicate cells fail here, before any
    /// engine interaction, so a bad configuration can never leave the
    /// engine partially registered.
    pub fn from_configs(configs: Vec<FieldConfig>) -> Result<Self, ConfigError> {
        if configs.is_empty() {
            return Err(ConfigError::NoFields);
        }
        let extent_x = configs.iter().map(|c| c.x).max().unwrap_or(0) + 1;
        let extent_y = configs.iter().map(|c| c.y).max().unwrap_or(0) + 1;
        let mut cells: Vec<Option<usize>> = vec![None; (extent_x as usize) * (extent_y as usize)];
        let mut nodes = Vec::with_capacity(configs.len());
        let mut by_name = IndexMap::with_capacity(configs.len());

        for config in configs {
            let coord = config.coord();
            let slot = (config.x as usize) * (extent_y as usize) + config.y as usize;
            if let Some(existing) = cells[slot] {
                let first: &FieldNode = &nodes[existing];
                return Err(ConfigError::DuplicateCoord {
                    coord,
                    first: first.name().to_string(),
                    second: config.name,
                });
            }
            if by_name.contains_key(&config.name) {
                return Err(ConfigError::DuplicateName { name: config.name });
            }
            let index = nodes.len();
            by_name.insert(config.name.clone(), index);
            cells[slot] = Some(index);
            nodes.push(FieldNode::new(config));
        }

        Ok(Self {
            extent_x,
            extent_y,
            cells,
            nodes,
            by_name,
            registered: false,
        })
    }

    /// Grid extents as `(extent_x, extent_y)`.
    pub fn extent(&self) -> (u32, u32) {
        (self.extent_x, self.extent_y)
    }

    /// Number of populated cells.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the grid holds no fields. Construction rejects empty
    /// configurations, so this is always `false` for a built grid.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether [`register`](Self::register) has completed.
    pub fn is_registered(&self) -> bool {
        self.registered
    }

    /// The field at `coord`, or `None` for an explicitly-empty cell.
    ///
    /// A coordinate outside the declared rectangle is an error.
    pub fn node_at(&self, coord: CellCoord) -> Result<Option<&FieldNode>, GridError> {
        let slot = self.slot(coord)?;
        Ok(self.cells[slot].map(|index| &self.nodes[index]))
    }

    /// Look a field up by name.
    pub fn node_by_name(&self, name: &str) -> Option<&FieldNode> {
        self.by_name.get(name).map(|&index| &self.nodes[index])
    }

    /// Populated cells in row-major order (`x` outer, `y` inner).
    pub fn iter(&self) -> impl Iterator<Item = (CellCoord, &FieldNode)> + '_ {
        self.cells.iter().enumerate().filter_map(move |(slot, cell)| {
            cell.map(|index| {
                let x = (slot / self.extent_y as usize) as u32;
                let y = (slot % self.extent_y as usize) as u32;
                (CellCoord::new(x, y), &self.nodes[index])
            })
        })
    }

    /// The populated cardinal neighbours of `coord`, in up, down,
    /// left, right order.
    ///
    /// Cells beyond the grid edge and explicitly-empty cells simply do
    /// not appear; a runoff share aimed at them is lost, not
    /// redistributed.
    pub fn neighbours(&self, coord: CellCoord) -> Result<SmallVec<[CellCoord; 4]>, GridError> {
        // Validate the center even though only neighbours are returned:
        // addressing from an undeclared cell is a programming error.
        self.slot(coord)?;
        let candidates = [
            (coord.x as i64, coord.y as i64 + 1), // up
            (coord.x as i64, coord.y as i64 - 1), // down
            (coord.x as i64 - 1, coord.y as i64), // left
            (coord.x as i64 + 1, coord.y as i64), // right
        ];
        let mut result = SmallVec::new();
        for (x, y) in candidates {
            if x < 0 || y < 0 || x >= i64::from(self.extent_x) || y >= i64::from(self.extent_y) {
                continue;
            }
            let neighbour = CellCoord::new(x as u32, y as u32);
            let slot = (neighbour.x as usize) * (self.extent_y as usize) + neighbour.y as usize;
            if self.cells[slot].is_some() {
                result.push(neighbour);
            }
        }
        Ok(result)
    }

    /// Register every field with the engine, in configuration order,
    /// storing the returned identifiers.
    ///
    /// Exactly-once: a second call is a [`ConfigError::AlreadyRegistered`]
    /// and sends nothing.
    pub fn register(&mut self, session: &mut Session) -> Result<(), ConfigError> {
        if self.registered {
            return Err(ConfigError::AlreadyRegistered);
        }
        for node in &mut self.nodes {
            let id = session.register_field(&node.config().registration_pairs())?;
            node.assign_id(id);
        }
        self.registered = true;
        Ok(())
    }

    fn slot(&self, coord: CellCoord) -> Result<usize, GridError> {
        if coord.x >= self.extent_x || coord.y >= self.extent_y {
            return Err(GridError::CoordOutOfBounds {
                coord,
                extent: (self.extent_x, self.extent_y),
            });
        }
        Ok((coord.x as usize) * (self.extent_y as usize) + coord.y as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(name: &str, x: u32, y: u32) -> FieldConfig {
        FieldConfig {
            name: name.to_string(),
            x,
            y,
            z: 0.0,
            sw: 0.2,
            radius: 1.0,
        }
    }

    fn two_by_two() -> FieldGrid {
        FieldGrid::from_configs(vec![
            config("a", 0, 0),
            config("b", 1, 0),
            config("c", 0, 1),
            config("d", 1, 1),
        ])
        .unwrap()
    }

    #[test]
    fn extents_derive_from_max_coords() {
        let grid = FieldGrid::from_configs(vec![config("a", 0, 0), config("b", 2, 4)]).unwrap();
        assert_eq!(grid.extent(), (3, 5));
        assert_eq!(grid.len(), 2);
    }

    #[test]
    fn empty_configuration_is_rejected() {
        assert!(matches!(
            FieldGrid::from_configs(vec![]),
            Err(ConfigError::NoFields)
        ));
    }

    #[test]
    fn duplicate_coord_is_rejected() {
        let err = FieldGrid::from_configs(vec![config("a", 1, 1), config("b", 1, 1)]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateCoord {
                coord: CellCoord::new(1, 1),
                first: "a".to_string(),
                second: "b".to_string(),
            }
        );
    }

    #[test]
    fn duplicate_name_is_rejected() {
        let err = FieldGrid::from_configs(vec![config("a", 0, 0), config("a", 1, 0)]).unwrap_err();
        assert_eq!(
            err,
            ConfigError::DuplicateName {
                name: "a".to_string()
            }
        );
    }

    #[test]
    fn out_of_bounds_access_is_an_error() {
        let grid = two_by_two();
        assert!(matches!(
            grid.node_at(CellCoord::new(2, 0)),
            Err(GridError::CoordOutOfBounds { .. })
        ));
        assert!(matches!(
            grid.neighbours(CellCoord::new(0, 2)),
            Err(GridError::CoordOutOfBounds { .. })
        ));
    }

    #[test]
    fn empty_cell_is_explicitly_none() {
        // Sparse: only the far corners, so (0,1)/(1,0) are empty cells.
        let grid = FieldGrid::from_configs(vec![config("a", 0, 0), config("b", 1, 1)]).unwrap();
        assert!(grid.node_at(CellCoord::new(0, 1)).unwrap().is_none());
        assert_eq!(
            grid.node_at(CellCoord::new(0, 0)).unwrap().map(FieldNode::name),
            Some("a")
        );
    }

    #[test]
    fn iteration_is_row_major() {
        let grid = two_by_two();
        let order: Vec<&str> = grid.iter().map(|(_, node)| node.name()).collect();
        // x outer, y inner: (0,0), (0,1), (1,0), (1,1).
        assert_eq!(order, vec!["a", "c", "b", "d"]);
    }

    #[test]
    fn interior_cell_has_four_neighbours() {
        let mut configs = Vec::new();
        for x in 0..3 {
            for y in 0..3 {
                configs.push(config(&format!("f{x}{y}"), x, y));
            }
        }
        let grid = FieldGrid::from_configs(configs).unwrap();
        let n = grid.neighbours(CellCoord::new(1, 1)).unwrap();
        assert_eq!(
            n.as_slice(),
            [
                CellCoord::new(1, 2), // up
                CellCoord::new(1, 0), // down
                CellCoord::new(0, 1), // left
                CellCoord::new(2, 1), // right
            ]
        );
    }

    #[test]
    fn corner_cell_has_two_neighbours() {
        let grid = two_by_two();
        let n = grid.neighbours(CellCoord::new(0, 0)).unwrap();
        assert_eq!(n.as_slice(), [CellCoord::new(0, 1), CellCoord::new(1, 0)]);
    }

    #[test]
    fn unpopulated_neighbours_are_skipped() {
        let grid = FieldGrid::from_configs(vec![config("a", 0, 0), config("b", 1, 1)]).unwrap();
        // (0,1) and (1,0) exist in the rectangle but hold no field.
        assert!(grid.neighbours(CellCoord::new(0, 0)).unwrap().is_empty());
    }

    #[test]
    fn lookup_by_name() {
        let grid = two_by_two();
        assert_eq!(
            grid.node_by_name("c").map(FieldNode::coord),
            Some(CellCoord::new(0, 1))
        );
        assert!(grid.node_by_name("missing").is_none());
    }
}
