//! Text → cursor moves.
//!
//! A character is reached with all vertical presses first, then all
//! horizontal ones.  Dead cells are the extra width of a wide key, so the
//! cursor never rests on one: a vertical press that would land on a dead
//! cell settles on the wide key to its right, and a horizontal press skips
//! a run of dead cells in one step.

use std::iter;

use super::layout::{Cell, KeyboardLayout};
use super::{KeyStroke, KeyboardError};

/// The key the cursor rests on when sent to `col` in `row`: the key itself,
/// or the wide key covering that column.
fn settle(layout: &KeyboardLayout, col: usize, row: usize) -> Option<Cell> {
    (col..layout.cols())
        .map(|col| Cell::new(col, row))
        .find(|&cell| layout.is_live(cell))
}

/// Where one cursor move from `from` lands, if anywhere.
fn step(layout: &KeyboardLayout, from: Cell, stroke: KeyStroke) -> Option<Cell> {
    match stroke {
        KeyStroke::Up => settle(layout, from.col, from.row.checked_sub(1)?),
        KeyStroke::Down if from.row + 1 < layout.rows() => settle(layout, from.col, from.row + 1),
        KeyStroke::Down => None,
        KeyStroke::Left => (0..from.col)
            .rev()
            .map(|col| Cell::new(col, from.row))
            .find(|&cell| layout.is_live(cell)),
        KeyStroke::Right => (from.col + 1..layout.cols())
            .map(|col| Cell::new(col, from.row))
            .find(|&cell| layout.is_live(cell)),
        KeyStroke::Confirm | KeyStroke::LongConfirm => None,
    }
}

/// Cursor moves from `from` to `to`: the row delta first, then the column
/// delta from wherever the vertical moves left the cursor.
///
/// Returns `None` if either cell is dead.
pub fn route_between(layout: &KeyboardLayout, from: Cell, to: Cell) -> Option<Vec<KeyStroke>> {
    if !layout.is_live(from) || !layout.is_live(to) {
        return None;
    }
    let mut path = Vec::new();
    let mut cursor = from;

    let vertical = if to.row < from.row {
        KeyStroke::Up
    } else {
        KeyStroke::Down
    };
    for _ in 0..from.row.abs_diff(to.row) {
        cursor = step(layout, cursor, vertical)?;
        path.push(vertical);
    }

    while cursor.col != to.col {
        let horizontal = if to.col < cursor.col {
            KeyStroke::Left
        } else {
            KeyStroke::Right
        };
        cursor = step(layout, cursor, horizontal)?;
        path.push(horizontal);
    }
    Some(path)
}

/// Routes `text` on `layout`, starting from the layout's start cell.
///
/// Each character is reached with [`route_between`] and confirmed; uppercase
/// letters get [`KeyStroke::LongConfirm`] on layouts that support it.  An
/// Enter keystroke is appended to submit the text.  Nothing is returned
/// unless every character can be typed.
///
/// # Errors
///
/// [`KeyboardError::UnsupportedCharacter`] for the first character with no
/// key on the layout.
pub fn route_text(layout: &KeyboardLayout, text: &str) -> Result<Vec<KeyStroke>, KeyboardError> {
    let mut cursor = layout.start();
    let mut strokes = Vec::new();
    for c in text.chars().chain(iter::once('\n')) {
        let unsupported = || KeyboardError::UnsupportedCharacter(c, layout.name());
        let target = layout.lookup(c).ok_or_else(unsupported)?;
        let path = route_between(layout, cursor, target).ok_or_else(unsupported)?;
        strokes.extend(path);
        strokes.push(if layout.long_press_uppercase() && c.is_ascii_uppercase() {
            KeyStroke::LongConfirm
        } else {
            KeyStroke::Confirm
        });
        cursor = target;
    }
    Ok(strokes)
}
