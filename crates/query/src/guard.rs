//! Textual SQL guards — keyword denial, table extraction, LIMIT enforcement.
//!
//! These are deliberately heuristic, documented layers: token scanning and
//! string rewriting, not a SQL grammar. The allow-list check extracts table
//! names from `FROM`/`JOIN` clauses on a best-effort basis; stricter
//! parsing would change policy semantics and is intentionally avoided.

use datagate_core::error::PolicyViolation;

/// A token with its byte range in the original statement.
#[derive(Debug, Clone, Copy)]
struct Token<'a> {
    start: usize,
    end: usize,
    text: &'a str,
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '.' || c == '"'
}

/// Split a statement into identifier-ish tokens and single-character
/// punctuation tokens, preserving byte positions.
fn tokenize(sql: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut start: Option<usize> = None;

    for (i, c) in sql.char_indices() {
        if is_ident_char(c) {
            if start.is_none() {
                start = Some(i);
            }
        } else {
            if let Some(s) = start.take() {
                tokens.push(Token {
                    start: s,
                    end: i,
                    text: &sql[s..i],
                });
            }
            if !c.is_whitespace() {
                tokens.push(Token {
                    start: i,
                    end: i + c.len_utf8(),
                    text: &sql[i..i + c.len_utf8()],
                });
            }
        }
    }
    if let Some(s) = start {
        tokens.push(Token {
            start: s,
            end: sql.len(),
            text: &sql[s..],
        });
    }
    tokens
}

/// Reject statements containing SQL comment sequences or more than one
/// statement. Comments are a common smuggling vector for the keyword
/// guard; multi-statement text defeats the single-LIMIT rewrite.
pub fn scan_statement(sql: &str) -> Result<(), PolicyViolation> {
    if sql.contains("--") {
        return Err(PolicyViolation::ForbiddenSequence("--".into()));
    }
    if sql.contains("/*") {
        return Err(PolicyViolation::ForbiddenSequence("/*".into()));
    }

    let body = sql.trim().trim_end_matches(';');
    if body.contains(';') {
        return Err(PolicyViolation::MultiStatement);
    }

    Ok(())
}

/// Extract the table names referenced after `FROM` and `JOIN` keywords,
/// including comma-separated lists. Quotes are stripped; names are
/// returned as written (case preserved). Subqueries (`FROM (`) contribute
/// nothing at their own position; their inner clauses are still scanned
/// because tokenization is flat.
pub fn referenced_tables(sql: &str) -> Vec<String> {
    let tokens = tokenize(sql);
    let mut tables = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let t = tokens[i].text;
        if t.eq_ignore_ascii_case("from") || t.eq_ignore_ascii_case("join") {
            let mut j = i + 1;
            while j < tokens.len() {
                let candidate = tokens[j].text;
                if candidate == "(" {
                    break;
                }
                if !candidate.chars().next().is_some_and(is_ident_char) {
                    break;
                }
                let name: String = candidate.chars().filter(|c| *c != '"').collect();
                if !name.is_empty() && !name.chars().all(|c| c.is_ascii_digit()) {
                    tables.push(name);
                }
                // Continue through comma lists: FROM a, b, c
                match tokens.get(j + 1).map(|t| t.text) {
                    Some(",") => j += 2,
                    _ => break,
                }
            }
        }
        i += 1;
    }

    tables
}

/// Enforce the policy row limit on a statement.
///
/// Returns the (possibly rewritten) statement and the effective limit used
/// for truncation detection:
/// - No `LIMIT` clause on a SELECT → ` LIMIT <max>` appended.
/// - An existing bound larger than `max` → clamped to `max`.
/// - An existing bound at or under `max` → preserved unchanged (a caller's
///   tighter bound is never widened).
/// - Non-SELECT read statements (`SHOW`, `DESCRIBE`) are dispatched as-is;
///   `max` still bounds their results via post-fetch clipping.
pub fn enforce_limit(sql: &str, max: u32) -> (String, u32) {
    let trimmed = sql.trim().trim_end_matches(';').trim_end();
    let tokens = tokenize(trimmed);

    let is_select = tokens
        .first()
        .is_some_and(|t| t.text.eq_ignore_ascii_case("select") || t.text.eq_ignore_ascii_case("with"));
    if !is_select {
        return (trimmed.to_string(), max);
    }

    // Find the last LIMIT <number> pair.
    let mut limit_value: Option<(Token<'_>, u64)> = None;
    for pair in tokens.windows(2) {
        if pair[0].text.eq_ignore_ascii_case("limit")
            && let Ok(n) = pair[1].text.parse::<u64>()
        {
            limit_value = Some((pair[1], n));
        }
    }

    match limit_value {
        None => (format!("{trimmed} LIMIT {max}"), max),
        Some((token, n)) if n > u64::from(max) => {
            let mut rewritten = String::with_capacity(trimmed.len());
            rewritten.push_str(&trimmed[..token.start]);
            rewritten.push_str(&max.to_string());
            rewritten.push_str(&trimmed[token.end..]);
            (rewritten, max)
        }
        Some((_, n)) => (trimmed.to_string(), n as u32),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_sequences_rejected() {
        assert!(matches!(
            scan_statement("SELECT 1 -- drop"),
            Err(PolicyViolation::ForbiddenSequence(s)) if s == "--"
        ));
        assert!(matches!(
            scan_statement("SELECT /* hidden */ 1"),
            Err(PolicyViolation::ForbiddenSequence(s)) if s == "/*"
        ));
    }

    #[test]
    fn multi_statement_rejected_trailing_semicolon_ok() {
        assert!(scan_statement("SELECT 1;").is_ok());
        assert!(matches!(
            scan_statement("SELECT 1; SELECT 2"),
            Err(PolicyViolation::MultiStatement)
        ));
    }

    #[test]
    fn tables_from_simple_select() {
        assert_eq!(
            referenced_tables("SELECT * FROM customers"),
            vec!["customers"]
        );
    }

    #[test]
    fn tables_from_joins_and_lists() {
        let sql = "SELECT o.id FROM orders o JOIN customers c ON o.cid = c.id";
        let tables = referenced_tables(sql);
        assert!(tables.contains(&"orders".to_string()));
        assert!(tables.contains(&"customers".to_string()));

        let tables = referenced_tables("SELECT * FROM a, b, c WHERE a.x = b.x");
        assert_eq!(tables, vec!["a", "b", "c"]);
    }

    #[test]
    fn qualified_and_quoted_names() {
        let tables = referenced_tables("SELECT * FROM analytics.public.orders");
        assert_eq!(tables, vec!["analytics.public.orders"]);

        let tables = referenced_tables(r#"SELECT * FROM "Orders""#);
        assert_eq!(tables, vec!["Orders"]);
    }

    #[test]
    fn subquery_inner_tables_still_found() {
        let tables = referenced_tables("SELECT * FROM (SELECT * FROM orders) t");
        assert!(tables.contains(&"orders".to_string()));
    }

    #[test]
    fn limit_appended_when_absent() {
        let (sql, limit) = enforce_limit("SELECT * FROM customers", 100);
        assert_eq!(sql, "SELECT * FROM customers LIMIT 100");
        assert_eq!(limit, 100);
    }

    #[test]
    fn limit_appended_after_order_by() {
        let (sql, _) = enforce_limit("SELECT * FROM orders ORDER BY id DESC", 50);
        assert_eq!(sql, "SELECT * FROM orders ORDER BY id DESC LIMIT 50");
    }

    #[test]
    fn larger_limit_clamped() {
        let (sql, limit) = enforce_limit("SELECT * FROM orders LIMIT 5000", 100);
        assert_eq!(sql, "SELECT * FROM orders LIMIT 100");
        assert_eq!(limit, 100);
    }

    #[test]
    fn smaller_limit_preserved() {
        let (sql, limit) = enforce_limit("SELECT * FROM orders LIMIT 10", 100);
        assert_eq!(sql, "SELECT * FROM orders LIMIT 10");
        assert_eq!(limit, 10);
    }

    #[test]
    fn trailing_semicolon_stripped_before_append() {
        let (sql, _) = enforce_limit("SELECT * FROM orders;", 100);
        assert_eq!(sql, "SELECT * FROM orders LIMIT 100");
    }

    #[test]
    fn non_select_left_unmodified() {
        let (sql, limit) = enforce_limit("SHOW TABLES", 100);
        assert_eq!(sql, "SHOW TABLES");
        assert_eq!(limit, 100);
    }

    #[test]
    fn cte_gets_limit() {
        let (sql, _) = enforce_limit("WITH t AS (SELECT 1) SELECT * FROM t", 100);
        assert!(sql.ends_with("LIMIT 100"));
    }

    #[test]
    fn limit_keyword_case_insensitive() {
        let (sql, limit) = enforce_limit("select * from orders limit 200", 100);
        assert_eq!(sql, "select * from orders limit 100");
        assert_eq!(limit, 100);
    }
}
