//! Long listings for archive entries and cartridge files

use prettytable::{Cell, Row, Table, format};

/// A listing with bold column titles and a closing total line
pub struct Listing {
    table: Table,
}

impl Listing {
    pub fn new(titles: &[&str]) -> Self {
        let mut table = Table::new();
        table.set_format(*format::consts::FORMAT_CLEAN);
        table.set_titles(Row::new(
            titles
                .iter()
                .map(|title| Cell::new(title).style_spec("b"))
                .collect(),
        ));
        Self { table }
    }

    pub fn row<const N: usize>(&mut self, cells: [String; N]) {
        self.table
            .add_row(Row::new(cells.iter().map(|cell| Cell::new(cell)).collect()));
    }

    /// Print the rows, then `Total: {total}`
    pub fn print(&self, total: &str) {
        self.table.printstd();
        println!("\nTotal: {}", total);
    }
}
