use std::fmt;

use crate::{MAX_ORDER, cells_at_order};

/// A cell at a given order, numbered in the nested scheme.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub order: u8,
    pub id: u64,
}

impl Cell {
    pub fn new(order: u8, id: u64) -> Self {
        Self { order, id }
    }

    pub fn is_valid(self) -> bool {
        self.order <= MAX_ORDER && self.id < cells_at_order(self.order)
    }

    pub fn parent(self) -> Option<Cell> {
        self.ancestor(self.order.checked_sub(1)?)
    }

    /// The cell at `order` containing this one; `None` if `order` is finer.
    pub fn ancestor(self, order: u8) -> Option<Cell> {
        if order > self.order {
            return None;
        }
        let shift = 2 * u32::from(self.order - order);
        Some(Cell::new(order, self.id >> shift))
    }

    pub fn children(self) -> [Cell; 4] {
        let base = self.id << 2;
        let order = self.order + 1;
        [
            Cell::new(order, base),
            Cell::new(order, base + 1),
            Cell::new(order, base + 2),
            Cell::new(order, base + 3),
        ]
    }

    /// True when `other` is this cell or lies inside it.
    pub fn contains(self, other: Cell) -> bool {
        other.ancestor(self.order) == Some(self)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.order, self.id)
    }
}
