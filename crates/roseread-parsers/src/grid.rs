//! Row-major 2D grids and rectangular views over them
//!
//! Terrain formats store a `width × length` array of cells. A [`Grid`] keeps
//! those cells flat, addressed by `(x, y)` with `x < width` (column) and
//! `y < length` (row). Patches are not stored separately; [`Grid::window`]
//! and [`Grid::block`] look at a sub-rectangle of the same cells.

use serde::{Deserialize, Serialize};

use crate::io::ByteCursor;
use crate::traits::{ParseError, ParseResult};

/// Fixed-size 2D array stored row by row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Grid<T> {
    width: usize,
    length: usize,
    cells: Vec<T>,
}

impl<T> Grid<T> {
    /// Build a grid from row-major cells; `None` if the cell count does not
    /// match `width * length`
    pub fn from_vec(width: usize, length: usize, cells: Vec<T>) -> Option<Self> {
        (width.checked_mul(length)? == cells.len()).then_some(Self { width, length, cells })
    }

    /// Read `length` rows of `width` cells each
    pub fn read_rows(
        cursor: &mut ByteCursor<'_>,
        width: usize,
        length: usize,
        read: impl FnMut(&mut ByteCursor<'_>) -> ParseResult<T>,
    ) -> ParseResult<Self> {
        let count = checked_area(width, length)?;
        let cells = cursor.read_array(count, read)?;
        Ok(Self { width, length, cells })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn length(&self) -> usize {
        self.length
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn get(&self, x: usize, y: usize) -> Option<&T> {
        (x < self.width && y < self.length).then(|| &self.cells[y * self.width + x])
    }

    pub fn row(&self, y: usize) -> Option<&[T]> {
        (y < self.length).then(|| &self.cells[y * self.width..(y + 1) * self.width])
    }

    pub fn rows(&self) -> impl Iterator<Item = &[T]> {
        // `max(1)` keeps `chunks` valid for zero-width grids, which hold no cells
        self.cells.chunks(self.width.max(1))
    }

    /// All cells in row-major order
    pub fn cells(&self) -> &[T] {
        &self.cells
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.cells.iter()
    }

    /// View `width × length` cells starting at `(x, y)`
    ///
    /// Returns `None` unless the whole rectangle lies inside the grid.
    pub fn window(&self, x: usize, y: usize, width: usize, length: usize) -> Option<GridWindow<'_, T>> {
        let fits = x.checked_add(width)? <= self.width && y.checked_add(length)? <= self.length;
        fits.then_some(GridWindow {
            grid: self,
            x,
            y,
            width,
            length,
        })
    }

    /// The `size × size` block at block coordinates `(block_x, block_y)`
    pub fn block(&self, block_x: usize, block_y: usize, size: usize) -> Option<GridWindow<'_, T>> {
        self.window(block_x.checked_mul(size)?, block_y.checked_mul(size)?, size, size)
    }
}

impl<T: Clone> Grid<T> {
    /// Read cells stored column by column (`x` outer, `y` inner) into a
    /// row-major grid
    pub fn read_columns(
        cursor: &mut ByteCursor<'_>,
        width: usize,
        length: usize,
        read: impl FnMut(&mut ByteCursor<'_>) -> ParseResult<T>,
    ) -> ParseResult<Self> {
        let count = checked_area(width, length)?;
        let columns = cursor.read_array(count, read)?;
        let columns = &columns;
        let cells = (0..length)
            .flat_map(|y| (0..width).map(move |x| columns[x * length + y].clone()))
            .collect();
        Ok(Self { width, length, cells })
    }
}

impl<'a, T> IntoIterator for &'a Grid<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.cells.iter()
    }
}

/// Borrowed rectangular region of a [`Grid`]
#[derive(Debug, Clone, Copy)]
pub struct GridWindow<'a, T> {
    grid: &'a Grid<T>,
    x: usize,
    y: usize,
    width: usize,
    length: usize,
}

impl<'a, T> GridWindow<'a, T> {
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn length(&self) -> usize {
        self.length
    }

    /// Cell at `(x, y)` relative to the window origin
    pub fn get(&self, x: usize, y: usize) -> Option<&'a T> {
        if x >= self.width || y >= self.length {
            return None;
        }
        self.grid.get(self.x + x, self.y + y)
    }

    pub fn rows(&self) -> impl Iterator<Item = &'a [T]> + '_ {
        (self.y..self.y + self.length).filter_map(move |y| {
            self.grid
                .row(y)
                .map(|row| &row[self.x..self.x + self.width])
        })
    }

    /// Cells in row-major order within the window
    pub fn iter(&self) -> impl Iterator<Item = &'a T> + '_ {
        self.rows().flatten()
    }
}

fn checked_area(width: usize, length: usize) -> ParseResult<usize> {
    width
        .checked_mul(length)
        .ok_or_else(|| ParseError::invalid(format!("grid {width}x{length} is too large")))
}
