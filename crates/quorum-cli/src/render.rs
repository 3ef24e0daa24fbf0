use comfy_table::presets::ASCII_FULL;
use comfy_table::Table;
use quorum::{CommandOutcome, QueryOutput, RowSet};
use serde_json::Value;

/// Grid table with a header row, one line per record.
pub fn grid(rows: &RowSet) -> String {
    let mut table = Table::new();
    table.load_preset(ASCII_FULL);
    table.set_header(rows.columns().to_vec());
    for row in rows.rows() {
        table.add_row(row.iter().map(cell_text).collect::<Vec<_>>());
    }
    table.to_string()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Text shown to the operator once a command finishes. `None` prints nothing.
pub fn outcome(outcome: &CommandOutcome) -> Option<String> {
    match outcome {
        CommandOutcome::Succeeded { sql, output, .. } => Some(match output {
            QueryOutput::Rows(rows) if rows.is_empty() => {
                format!("\nGenerated SQL: {sql}\n\nQuery returned no rows.")
            }
            QueryOutput::Rows(rows) => {
                format!("\nGenerated SQL: {sql}\n\nQuery results:\n{}", grid(rows))
            }
            QueryOutput::Applied { rows_affected } => format!(
                "\nGenerated SQL: {sql}\n\nQuery executed successfully ({rows_affected} row(s) affected)."
            ),
        }),
        CommandOutcome::Declined { .. } => Some("Execution cancelled.".to_string()),
        CommandOutcome::Dismissed { .. } => None,
        CommandOutcome::Exhausted { attempts } => Some(format!(
            "\nFailed to generate a correct SQL after {} attempts. Please check your query.",
            attempts.len()
        )),
    }
}
