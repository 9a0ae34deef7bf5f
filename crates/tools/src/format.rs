//! Rendering of tool outputs into model-readable text.
//!
//! The model sees plain text, so results are rendered compactly: one JSON
//! object per row, a bounded preview, and an explicit truncation note. The
//! counts quoted in the text always refer to the full (clipped) result,
//! not the preview.

use datagate_core::warehouse::ColumnInfo;
use datagate_query::QueryResult;

/// Rows shown verbatim before the preview is elided.
const PREVIEW_ROWS: usize = 20;

/// Render a table listing.
pub fn tables(names: &[String]) -> String {
    if names.is_empty() {
        return "No tables are available.".into();
    }
    format!("Available tables:\n{}", names.join("\n"))
}

/// Render a table's column schema.
pub fn columns(table: &str, columns: &[ColumnInfo]) -> String {
    if columns.is_empty() {
        return format!("Table '{table}' has no visible columns.");
    }
    let lines: Vec<String> = columns
        .iter()
        .map(|c| {
            format!(
                "  {} {}{}",
                c.name,
                c.data_type,
                if c.nullable { "" } else { " NOT NULL" }
            )
        })
        .collect();
    format!("Columns of '{table}':\n{}", lines.join("\n"))
}

/// Render a query result as a bounded row preview.
pub fn query_result(result: &QueryResult) -> String {
    if result.rows.is_empty() {
        return "Query returned no rows.".into();
    }

    let mut out = format!(
        "Query returned {} row{}",
        result.row_count,
        if result.row_count == 1 { "" } else { "s" }
    );
    if result.truncated {
        out.push_str(" (result truncated at the row limit)");
    }
    out.push_str(":\n");

    for row in result.rows.iter().take(PREVIEW_ROWS) {
        out.push_str(&serde_json::to_string(row).unwrap_or_default());
        out.push('\n');
    }

    let hidden = result.rows.len().saturating_sub(PREVIEW_ROWS);
    if hidden > 0 {
        out.push_str(&format!("... and {hidden} more rows\n"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use datagate_core::warehouse::Row;

    fn result_with(rows: usize, truncated: bool) -> QueryResult {
        let rows: Vec<Row> = (0..rows)
            .map(|i| {
                let mut row = Row::new();
                row.insert("ID".into(), serde_json::json!(i));
                row
            })
            .collect();
        QueryResult {
            columns: vec!["ID".into()],
            row_count: rows.len(),
            truncated,
            rows,
        }
    }

    #[test]
    fn empty_table_listing() {
        assert_eq!(tables(&[]), "No tables are available.");
    }

    #[test]
    fn table_listing_one_per_line() {
        let out = tables(&["ORDERS".into(), "CUSTOMERS".into()]);
        assert!(out.contains("ORDERS\nCUSTOMERS"));
    }

    #[test]
    fn column_rendering_marks_not_null() {
        let out = columns(
            "ORDERS",
            &[
                ColumnInfo {
                    name: "ID".into(),
                    data_type: "NUMBER".into(),
                    nullable: false,
                },
                ColumnInfo {
                    name: "NOTE".into(),
                    data_type: "TEXT".into(),
                    nullable: true,
                },
            ],
        );
        assert!(out.contains("ID NUMBER NOT NULL"));
        assert!(out.contains("NOTE TEXT\n") || out.ends_with("NOTE TEXT"));
    }

    #[test]
    fn empty_result() {
        assert_eq!(query_result(&result_with(0, false)), "Query returned no rows.");
    }

    #[test]
    fn small_result_shown_in_full() {
        let out = query_result(&result_with(3, false));
        assert!(out.starts_with("Query returned 3 rows"));
        assert!(!out.contains("more rows"));
        assert!(out.contains(r#"{"ID":2}"#));
    }

    #[test]
    fn large_result_elided() {
        let out = query_result(&result_with(50, false));
        assert!(out.contains(r#"{"ID":19}"#));
        assert!(!out.contains(r#"{"ID":20}"#));
        assert!(out.contains("... and 30 more rows"));
    }

    #[test]
    fn truncation_noted() {
        let out = query_result(&result_with(5, true));
        assert!(out.contains("truncated at the row limit"));
    }

    #[test]
    fn singular_row_count() {
        let out = query_result(&result_with(1, false));
        assert!(out.starts_with("Query returned 1 row:"));
    }
}
