//! Storage layout for tasks.
//!
//! The table shape lives here, apart from the `Task` type, and the database
//! layer builds its DDL from it.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnType {
    Integer,
    Text,
    /// Stored as an INTEGER 0/1
    Boolean,
}

impl ColumnType {
    pub fn sql_type(self) -> &'static str {
        match self {
            ColumnType::Integer | ColumnType::Boolean => "INTEGER",
            ColumnType::Text => "TEXT",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKey {
    None,
    /// Unique key assigned by storage on insert
    AutoIncrementPrimaryKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub column_type: ColumnType,
    pub nullable: bool,
    pub default: Option<&'static str>,
    pub key: ColumnKey,
}

impl Column {
    const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column_type,
            nullable: false,
            default: None,
            key: ColumnKey::None,
        }
    }

    const fn auto_key(self) -> Self {
        Self { key: ColumnKey::AutoIncrementPrimaryKey, ..self }
    }

    const fn default_value(self, default: &'static str) -> Self {
        Self { default: Some(default), ..self }
    }

    fn definition(&self) -> String {
        let mut def = format!("{} {}", self.name, self.column_type.sql_type());
        if self.key == ColumnKey::AutoIncrementPrimaryKey {
            def.push_str(" PRIMARY KEY AUTOINCREMENT");
            return def;
        }
        if !self.nullable {
            def.push_str(" NOT NULL");
        }
        if let Some(default) = self.default {
            def.push_str(" DEFAULT ");
            def.push_str(default);
        }
        def
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Index {
    pub name: &'static str,
    pub column: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TableSchema {
    pub name: &'static str,
    pub columns: &'static [Column],
    pub indexes: &'static [Index],
}

impl TableSchema {
    /// The column storage assigns on insert
    pub fn primary_key(&self) -> Option<&Column> {
        self.columns.iter().find(|c| c.key == ColumnKey::AutoIncrementPrimaryKey)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> Vec<&'static str> {
        self.columns.iter().map(|c| c.name).collect()
    }

    pub fn create_table_sql(&self) -> String {
        let columns: Vec<String> = self.columns.iter().map(Column::definition).collect();
        format!(
            "CREATE TABLE IF NOT EXISTS {} (\n    {}\n)",
            self.name,
            columns.join(",\n    ")
        )
    }

    pub fn create_index_sql(&self) -> Vec<String> {
        self.indexes
            .iter()
            .map(|index| {
                format!(
                    "CREATE INDEX IF NOT EXISTS {} ON {}({})",
                    index.name, self.name, index.column
                )
            })
            .collect()
    }
}

/// The `task_table` row: one column per stored `Task` field
pub const TASK_TABLE: TableSchema = TableSchema {
    name: "task_table",
    columns: &[
        Column::new("id", ColumnType::Integer).auto_key(),
        Column::new("name", ColumnType::Text),
        Column::new("important", ColumnType::Boolean).default_value("0"),
        Column::new("completed", ColumnType::Boolean).default_value("0"),
        Column::new("created", ColumnType::Integer),
    ],
    indexes: &[Index {
        name: "idx_task_table_name",
        column: "name",
    }],
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_table_has_exactly_one_generated_key() {
        let keys: Vec<_> = TASK_TABLE
            .columns
            .iter()
            .filter(|c| c.key == ColumnKey::AutoIncrementPrimaryKey)
            .collect();
        assert_eq!(keys.len(), 1);
        assert_eq!(TASK_TABLE.primary_key().map(|c| c.name), Some("id"));
    }

    #[test]
    fn task_table_maps_every_stored_field() {
        assert_eq!(
            TASK_TABLE.column_names(),
            vec!["id", "name", "important", "completed", "created"]
        );
        assert_eq!(TASK_TABLE.column("name").map(|c| c.column_type), Some(ColumnType::Text));
        assert_eq!(TASK_TABLE.column("created").map(|c| c.column_type), Some(ColumnType::Integer));
        assert!(TASK_TABLE.column("created_date_formatted").is_none());
    }

    #[test]
    fn create_table_sql_lists_column_definitions() {
        let sql = TASK_TABLE.create_table_sql();
        assert!(sql.starts_with("CREATE TABLE IF NOT EXISTS task_table ("));
        assert!(sql.contains("id INTEGER PRIMARY KEY AUTOINCREMENT"));
        assert!(sql.contains("name TEXT NOT NULL"));
        assert!(sql.contains("important INTEGER NOT NULL DEFAULT 0"));
        assert!(sql.contains("completed INTEGER NOT NULL DEFAULT 0"));
        assert!(sql.contains("created INTEGER NOT NULL"));
    }

    #[test]
    fn index_sql_targets_the_table() {
        assert_eq!(
            TASK_TABLE.create_index_sql(),
            vec!["CREATE INDEX IF NOT EXISTS idx_task_table_name ON task_table(name)".to_string()]
        );
    }
}
