use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL_CONDENSED;
use comfy_table::{
    Attribute, Cell, CellAlignment, Color, ColumnConstraint, ContentArrangement, Table, Width,
};

use codelist_core::MergedCodelists;

pub fn print_codelists(merged: &MergedCodelists) {
    println!("{}", codelist_table(merged));
}

/// One row per resolved codelist per directory scope.
pub fn codelist_table(merged: &MergedCodelists) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("Directory"),
        header_cell("Codelist"),
        header_cell("Codes"),
        header_cell("Values"),
    ]);
    apply_table_style(&mut table);
    if let Some(column) = table.column_mut(2) {
        column.set_cell_alignment(CellAlignment::Right);
    }

    for scope in &merged.scopes {
        let directory = scope.directory.display().to_string();
        for (name, codes) in &scope.codelists {
            table.add_row(vec![
                Cell::new(&directory).fg(Color::DarkGrey),
                codelist_cell(name, merged.conflicts.contains(name)),
                Cell::new(codes.len()),
                Cell::new(codes.join(", ")),
            ]);
        }
    }
    table
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
    if table.column_count() >= 4 {
        table.set_constraints(vec![
            ColumnConstraint::UpperBoundary(Width::Percentage(30)),
            ColumnConstraint::UpperBoundary(Width::Percentage(25)),
            ColumnConstraint::LowerBoundary(Width::Fixed(5)),
            ColumnConstraint::LowerBoundary(Width::Fixed(10)),
        ]);
    }
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn codelist_cell(name: &str, conflicting: bool) -> Cell {
    if conflicting {
        Cell::new(format!("{name} (conflict)")).fg(Color::Red)
    } else {
        Cell::new(name).add_attribute(Attribute::Bold)
    }
}
