//! Console summary of runs. Human-facing only.
use colored::*;
use prettytable::{format, Attr, Cell, Row, Table};

use crate::error::{DirectoryError, PersistenceError};
use crate::gate::Rejection;
use crate::status::{NameDirectory, Snapshot};
use crate::store::RunRecord;

pub fn tally_table(snapshot: &Snapshot) -> Table {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(Row::new(vec![
        Cell::new("Status").with_style(Attr::Bold),
        Cell::new("Lots").with_style(Attr::Bold),
    ]));
    for (category, count) in snapshot.tally() {
        table.add_row(Row::new(vec![
            Cell::new(category.label()),
            Cell::new(&count.to_string()),
        ]));
    }
    table
}

/// Timestamp and category tally. Printed for every run.
pub fn print_run(record: &RunRecord) {
    println!("{}", record.display_time().bold());
    if record.snapshot.is_empty() {
        println!("no lots classified");
    } else {
        tally_table(&record.snapshot).printstd();
    }
}

pub fn print_saved(stored: usize) {
    println!("{} ({} runs stored)", "saved".green(), stored);
}

pub fn print_discarded(rejection: &Rejection) {
    println!("{}: {}", "discarded".yellow(), rejection);
}

pub fn print_aborted(error: &DirectoryError) {
    println!("{}: {}", "aborted".red(), error);
}

pub fn print_persist_failed(error: &PersistenceError) {
    println!("{}: {}", "not saved".red(), error);
}

pub fn print_names(names: &NameDirectory) {
    let mut table = Table::new();
    table.set_format(*format::consts::FORMAT_NO_LINESEP_WITH_TITLE);
    table.set_titles(Row::new(vec![
        Cell::new("ID").with_style(Attr::Bold),
        Cell::new("Name").with_style(Attr::Bold),
    ]));
    for (id, name) in names {
        table.add_row(Row::new(vec![Cell::new(id.as_str()), Cell::new(name)]));
    }
    table.printstd();
}
