use log::debug;
use regex::Regex;
use std::sync::OnceLock;

/// Prepended when a sanitized name would not start with a letter.
pub const TABLE_PREFIX: &str = "usuario_";

fn non_word() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[^A-Za-z0-9_]+").expect("static regex"))
}

/// Maps an owner identifier to a table name matching `^[a-z][a-z0-9_]*$`.
///
/// Every run of characters outside `[A-Za-z0-9_]` collapses into one `_`.
/// The function is total and idempotent.
pub fn sanitize_table_name(name: &str) -> String {
    let replaced = non_word().replace_all(name, "_");
    let prefixed = if replaced.starts_with(|c: char| c.is_ascii_alphabetic()) {
        replaced.into_owned()
    } else {
        format!("{TABLE_PREFIX}{replaced}")
    };
    let table_name = prefixed.to_ascii_lowercase();
    debug!("Sanitized table name: {} -> {}", name, table_name);
    table_name
}
