/// Convert a TitleCase CSV column name to its snake_case DB column name, e.g.
/// `EnterpriseNumber` → `enterprise_number`, `TypeOfAddress` → `type_of_address`,
/// `NaceCode` → `nace_code` (§4.2).
///
/// Pure and total: every TitleCase word boundary (an uppercase letter following a lowercase
/// one, or a digit following a letter) becomes an underscore, and the whole string is
/// lowercased. Already-snake_case input passes through unchanged.
pub fn csv_column_to_db_column(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let chars: Vec<char> = name.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() {
            let prev = chars[i - 1];
            let starts_new_word = prev.is_lowercase() || prev.is_ascii_digit();
            if starts_new_word {
                out.push('_');
            }
        }
        out.push(c.to_ascii_lowercase());
    }
    out
}

/// Convert a TitleCase CSV column name to its snake_case DB column name, special-cased per
/// table where the generic conversion would collide with a bookkeeping column this engine
/// adds itself.
///
/// `branch.csv`'s own natural-key column is titled `Id` in the source, which would otherwise
/// convert to the bare `id` this engine already reserves for composite-ID tables' derived
/// primary key (§3.1). Branches renames it to `branch_number` instead.
pub fn csv_column_to_db_column_for_table(csv_table: &str, name: &str) -> String {
    if csv_table == "branch" && name.eq_ignore_ascii_case("Id") {
        return "branch_number".to_string();
    }
    csv_column_to_db_column(name)
}

/// Convert a singular CSV table name to its plural DB table name, e.g. `enterprise` →
/// `enterprises`, `activity` → `activities` (§4.2).
///
/// Only the seven temporal table names are ever passed through this function, so a small
/// explicit table covers the irregular plurals (`activity`/`activities`,
/// `branch`/`branches`) rather than a general English pluralizer.
pub fn csv_table_to_db_table(name: &str) -> String {
    match name {
        "activity" => "activities".to_string(),
        "branch" => "branches".to_string(),
        "address" => "addresses".to_string(),
        other => format!("{other}s"),
    }
}
