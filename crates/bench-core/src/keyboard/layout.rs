//! Keyboard grids.

/// Marks an unusable cell in a layout row.
const DEAD: u8 = b'\0';

/// A `(column, row)` position on a keyboard grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    pub col: usize,
    pub row: usize,
}

impl Cell {
    pub const fn new(col: usize, row: usize) -> Self {
        Self { col, row }
    }
}

/// An immutable on-screen keyboard.
///
/// Rows are ASCII strings of equal length.  `'\0'` marks a dead cell: the
/// cursor can never rest there.  Backspace is `'\x08'` and Enter is `'\n'`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyboardLayout {
    name: &'static str,
    rows: &'static [&'static str],
    start: char,
    long_press_uppercase: bool,
}

impl KeyboardLayout {
    /// Text keyboard: letters, digits and `_`, with wide Backspace and Enter
    /// keys whose extra width shows up as dead cells.
    pub const ALPHANUMERIC: KeyboardLayout = KeyboardLayout {
        name: "alphanumeric",
        rows: &[
            "qwertyuiop0123",
            "asdfghjkl\0\x08456",
            "zxcvbnm_\0\0\n789",
        ],
        start: '\n',
        long_press_uppercase: true,
    };

    /// Byte-input keyboard: hex digits, Backspace and Enter.
    pub const HEXADECIMAL: KeyboardLayout = KeyboardLayout {
        name: "hexadecimal",
        rows: &["01234567\x08", "89abcdef\n"],
        start: '0',
        long_press_uppercase: false,
    };

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn rows(&self) -> usize {
        self.rows.len()
    }

    pub fn cols(&self) -> usize {
        self.rows.first().map_or(0, |r| r.len())
    }

    /// Cell the cursor rests on when the keyboard opens.
    pub fn start(&self) -> Cell {
        // Every built-in layout contains its start key.
        self.lookup(self.start).unwrap_or(Cell::new(0, 0))
    }

    /// Whether uppercase letters are entered with a long confirm.
    pub fn long_press_uppercase(&self) -> bool {
        self.long_press_uppercase
    }

    /// Character on the key at `cell`, or `None` for dead or out-of-range
    /// cells.
    pub fn key_at(&self, cell: Cell) -> Option<char> {
        let byte = *self.rows.get(cell.row)?.as_bytes().get(cell.col)?;
        (byte != DEAD).then_some(byte as char)
    }

    pub fn is_live(&self, cell: Cell) -> bool {
        self.key_at(cell).is_some()
    }

    /// Finds the key for `c`, case-folding letters.
    pub fn lookup(&self, c: char) -> Option<Cell> {
        let c = c.to_ascii_lowercase();
        if !c.is_ascii() || c as u8 == DEAD {
            return None;
        }
        self.rows.iter().enumerate().find_map(|(row, keys)| {
            keys.bytes()
                .position(|b| b == c as u8)
                .map(|col| Cell::new(col, row))
        })
    }

    /// Every live cell in row-major order.
    pub fn live_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        (0..self.rows()).flat_map(move |row| {
            (0..self.cols())
                .map(move |col| Cell::new(col, row))
                .filter(|&cell| self.is_live(cell))
        })
    }
}
