//! SQL statement construction.
//!
//! Every identifier is quoted with backticks so schema and table names reach
//! the server verbatim. No other validation is done; the server decides what
//! is a legal name.

/// Quote a MySQL identifier using backticks.
///
/// Escapes backticks by doubling them and wraps in backticks.
///
/// ```
/// assert_eq!(rms::db::statements::quote_ident("users"), "`users`");
/// assert_eq!(rms::db::statements::quote_ident("we`ird"), "`we``ird`");
/// ```
pub fn quote_ident(name: &str) -> String {
    format!("`{}`", name.replace('`', "``"))
}

/// Qualify a table name with its schema.
pub fn qualify(schema: &str, table: &str) -> String {
    format!("{}.{}", quote_ident(schema), quote_ident(table))
}

pub fn show_tables(schema: &str) -> String {
    format!("SHOW TABLES IN {}", quote_ident(schema))
}

pub fn create_database(schema: &str) -> String {
    format!("CREATE DATABASE IF NOT EXISTS {}", quote_ident(schema))
}

/// Clone column definitions and indexes, no rows.
pub fn create_table_like(from: &str, to: &str, table: &str) -> String {
    format!(
        "CREATE TABLE {} LIKE {}",
        qualify(to, table),
        qualify(from, table)
    )
}

/// Relies on `create_table_like` having reproduced the exact column order.
pub fn insert_select(from: &str, to: &str, table: &str) -> String {
    format!(
        "INSERT INTO {} SELECT * FROM {}",
        qualify(to, table),
        qualify(from, table)
    )
}
