//! SQL quoting helpers used when building ledger and inspection statements.

/// Quote a SQL identifier, doubling embedded double quotes.
///
/// # Examples
/// ```
/// use tm_core::sql_utils::quote_ident;
/// assert_eq!(quote_ident("orders"), r#""orders""#);
/// ```
pub fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}

/// Quote a possibly schema-qualified name component by component.
///
/// # Examples
/// ```
/// use tm_core::sql_utils::quote_qualified;
/// assert_eq!(quote_qualified("ops.tidemark_migrations"), r#""ops"."tidemark_migrations""#);
/// ```
pub fn quote_qualified(name: &str) -> String {
    name.split('.')
        .map(quote_ident)
        .collect::<Vec<_>>()
        .join(".")
}

/// Render `value` as a single-quoted SQL string literal.
pub fn quote_literal(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Split `schema.table` on the last dot, falling back to `default_schema`.
pub fn split_qualified<'a>(name: &'a str, default_schema: &'a str) -> (&'a str, &'a str) {
    match name.rfind('.') {
        Some(pos) => (&name[..pos], &name[pos + 1..]),
        None => (default_schema, name),
    }
}

/// Split a script into statements on `;`.
///
/// Semicolons inside string literals, quoted identifiers and comments do not
/// split. Comments are dropped and blank statements are skipped.
///
/// # Examples
/// ```
/// use tm_core::sql_utils::split_statements;
/// let stmts = split_statements("INSERT INTO t VALUES ('a;b'); -- done;\nSELECT 1;");
/// assert_eq!(stmts, vec!["INSERT INTO t VALUES ('a;b')", "SELECT 1"]);
/// ```
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut statements = Vec::new();
    let mut current = String::new();
    let mut chars = sql.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\'' | '"' => {
                // A doubled quote closes and immediately reopens the run.
                current.push(c);
                for q in chars.by_ref() {
                    current.push(q);
                    if q == c {
                        break;
                    }
                }
            }
            '-' if chars.peek() == Some(&'-') => {
                for n in chars.by_ref() {
                    if n == '\n' {
                        current.push('\n');
                        break;
                    }
                }
            }
            '/' if chars.peek() == Some(&'*') => {
                chars.next();
                let mut prev = '\0';
                for n in chars.by_ref() {
                    if prev == '*' && n == '/' {
                        break;
                    }
                    prev = n;
                }
                current.push(' ');
            }
            ';' => flush_statement(&mut statements, &mut current),
            _ => current.push(c),
        }
    }
    flush_statement(&mut statements, &mut current);
    statements
}

fn flush_statement(statements: &mut Vec<String>, current: &mut String) {
    let trimmed = current.trim();
    if !trimmed.is_empty() {
        statements.push(trimmed.to_string());
    }
    current.clear();
}
