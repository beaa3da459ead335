use anyhow::Result;
use comfy_table::{Cell, Table};
use selection_gate::register_markers;

pub fn run() -> Result<()> {
    let registry = register_markers();

    let mut table = Table::new();
    table.set_header(vec!["MARKER", "DESCRIPTION"]);

    for decl in registry.declarations() {
        table.add_row(vec![Cell::new(decl.signature), Cell::new(decl.description)]);
    }

    println!("{}", table);
    Ok(())
}
