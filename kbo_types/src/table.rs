use std::fmt;

/// The seven temporal tables the importer writes into, plus the two auxiliary lookup tables.
///
/// [`TableName::DEPENDENCY_ORDER`] is the fixed processing order the Batch Planner (§4.4) and
/// Orchestrator (§4.9) use so that replay of a job is deterministic: `enterprises` before
/// `establishments` before `denominations` before `addresses` before `activities` before
/// `contacts` before `branches`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize)]
pub enum TableName {
    Enterprises,
    Establishments,
    Denominations,
    Addresses,
    Activities,
    Contacts,
    Branches,
}

impl TableName {
    /// The table processing order used by the Batch Planner, stable across jobs.
    pub const DEPENDENCY_ORDER: [TableName; 7] = [
        TableName::Enterprises,
        TableName::Establishments,
        TableName::Denominations,
        TableName::Addresses,
        TableName::Activities,
        TableName::Contacts,
        TableName::Branches,
    ];

    /// The singular CSV table name used in archive entry names, e.g. `enterprise`.
    pub fn csv_name(&self) -> &'static str {
        match self {
            TableName::Enterprises => "enterprise",
            TableName::Establishments => "establishment",
            TableName::Denominations => "denomination",
            TableName::Addresses => "address",
            TableName::Activities => "activity",
            TableName::Contacts => "contact",
            TableName::Branches => "branch",
        }
    }

    /// The plural DB table name, e.g. `enterprises`.
    pub fn db_name(&self) -> &'static str {
        match self {
            TableName::Enterprises => "enterprises",
            TableName::Establishments => "establishments",
            TableName::Denominations => "denominations",
            TableName::Addresses => "addresses",
            TableName::Activities => "activities",
            TableName::Contacts => "contacts",
            TableName::Branches => "branches",
        }
    }

    /// The staging table name backing this table's imports, e.g. `staging_enterprises`.
    pub fn staging_name(&self) -> String {
        format!("staging_{}", self.db_name())
    }

    /// True for the two tables keyed by a plain entity number (`enterprise_number` /
    /// `establishment_number`) rather than a derived composite `id`.
    pub fn is_natural_key_table(&self) -> bool {
        matches!(self, TableName::Enterprises | TableName::Establishments)
    }

    /// The natural-key column name used in `WHERE`/`PARTITION BY` clauses.
    pub fn natural_key_column(&self) -> &'static str {
        match self {
            TableName::Enterprises => "enterprise_number",
            TableName::Establishments => "establishment_number",
            _ => "id",
        }
    }

    /// Parse a DB or CSV table name back into a [`TableName`].
    pub fn from_name(name: &str) -> Option<Self> {
        TableName::DEPENDENCY_ORDER
            .into_iter()
            .find(|t| t.db_name() == name || t.csv_name() == name)
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.db_name())
    }
}

/// Whether a composite-ID row belongs to an enterprise or an establishment.
///
/// Derived from the entity number: a leading single digit followed by a non-digit separator
/// (e.g. `1.234.567.890`) means establishment; anything else (e.g. `1234.567.890`) means
/// enterprise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum EntityType {
    Enterprise,
    Establishment,
}

impl EntityType {
    /// The DB string representation stored in `entity_type` columns.
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityType::Enterprise => "enterprise",
            EntityType::Establishment => "establishment",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dependency_order_starts_with_enterprises_and_ends_with_branches() {
        assert_eq!(TableName::DEPENDENCY_ORDER[0], TableName::Enterprises);
        assert_eq!(TableName::DEPENDENCY_ORDER[6], TableName::Branches);
    }

    #[test]
    fn csv_name_is_singular_db_name_is_plural() {
        assert_eq!(TableName::Activities.csv_name(), "activity");
        assert_eq!(TableName::Activities.db_name(), "activities");
    }

    #[test]
    fn from_name_round_trips_either_spelling() {
        assert_eq!(TableName::from_name("enterprises"), Some(TableName::Enterprises));
        assert_eq!(TableName::from_name("enterprise"), Some(TableName::Enterprises));
        assert_eq!(TableName::from_name("nonsense"), None);
    }

    #[test]
    fn only_enterprises_and_establishments_are_natural_key_tables() {
        assert!(TableName::Enterprises.is_natural_key_table());
        assert!(TableName::Establishments.is_natural_key_table());
        assert!(!TableName::Denominations.is_natural_key_table());
    }
}
