//! Colored terminal output helpers.
//!
//! All user-facing output goes through these functions so we get
//! consistent styling across every command.

use comfy_table::{ContentArrangement, Table};
use console::style;

use crate::integrity::{IntegrityReport, IntegrityStatus};
use crate::vault::RecordEntry;

/// Print a green success message: "check_mark {msg}"
pub fn success(msg: &str) {
    println!("{} {}", style("\u{2713}").green().bold(), msg);
}

/// Print a red error message: "x_mark {msg}"
pub fn error(msg: &str) {
    eprintln!("{} {}", style("\u{2717}").red().bold(), msg);
}

/// Print a yellow warning: "warning_sign {msg}"
pub fn warning(msg: &str) {
    eprintln!("{} {}", style("\u{26a0}").yellow().bold(), msg);
}

/// Print a blue info message: "info_sign {msg}"
pub fn info(msg: &str) {
    println!("{} {}", style("\u{2139}").blue().bold(), msg);
}

/// Print a dim tip/hint: "arrow {msg}"
pub fn tip(msg: &str) {
    println!("{} {}", style("\u{2192}").dim(), style(msg).dim());
}

/// Print a table of record entries (Name, Type, Created).
pub fn print_records_table(records: &[RecordEntry]) {
    if records.is_empty() {
        info("No records in this vault yet.");
        tip("Run `strongbox add <NAME> <TYPE>` to add your first record.");
        return;
    }

    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(vec!["Name", "Type", "Created"]);

    for r in records {
        table.add_row(vec![
            r.name.clone(),
            r.record_type.clone(),
            r.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        ]);
    }

    println!("{table}");
}

/// Print an integrity report as success or warning.
pub fn print_integrity_report(report: &IntegrityReport) {
    match report.status {
        IntegrityStatus::Ok => success(&format!("Integrity: {}", report.message)),
        status => warning(&format!("Integrity: {status} ({})", report.message)),
    }
}
