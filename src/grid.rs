//! Round grids: a square of numbered cells shown in shuffled positions.

use rand::Rng;
use rand::seq::SliceRandom;

/// One numbered cell. `consumed` flips once the player clicks it in order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Cell {
    pub number: u32,
    pub consumed: bool,
}

/// Cell padding and font size in px, shrinking as the grid grows.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CellStyle {
    pub padding_px: u32,
    pub font_px: u32,
}

impl CellStyle {
    pub fn for_size(size: u8) -> Self {
        let (padding_px, font_px) = match size {
            0..=2 => (20, 24),
            3 => (15, 20),
            4 => (10, 18),
            5 => (8, 16),
            _ => (4, 12),
        };
        Self { padding_px, font_px }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Grid {
    pub size: u8,
    /// Row-major display order.
    pub cells: Vec<Cell>,
}

impl Grid {
    pub fn generate<R: Rng + ?Sized>(size: u8, rng: &mut R) -> Self {
        let mut numbers = target_sequence(size);
        numbers.shuffle(rng);
        Self {
            size,
            cells: numbers
                .into_iter()
                .map(|number| Cell { number, consumed: false })
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Mark the cell showing `number`. Returns false if no such cell exists.
    pub fn consume(&mut self, number: u32) -> bool {
        match self.cells.iter_mut().find(|c| c.number == number) {
            Some(cell) => {
                cell.consumed = true;
                true
            }
            None => false,
        }
    }

    pub fn style(&self) -> CellStyle {
        CellStyle::for_size(self.size)
    }
}

/// The click order for a `size`×`size` grid: always 1, 2, ..., size².
pub fn target_sequence(size: u8) -> Vec<u32> {
    let n = size as u32;
    (1..=n * n).collect()
}
