//! Database schema definitions

/// SQL to create the entities table
pub const CREATE_ENTITIES_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS entities (
    name TEXT PRIMARY KEY,
    entity_type TEXT,
    description TEXT NOT NULL DEFAULT '',
    properties TEXT NOT NULL DEFAULT '{}'
)
"#;

/// SQL to create the relations table
/// A relation is unique per (source, target, relation_type)
pub const CREATE_RELATIONS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS relations (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    source TEXT NOT NULL,
    target TEXT NOT NULL,
    relation_type TEXT NOT NULL DEFAULT '',
    description TEXT NOT NULL DEFAULT '',
    keywords TEXT NOT NULL DEFAULT '',
    weight REAL NOT NULL DEFAULT 1.0,
    properties TEXT NOT NULL DEFAULT '{}',
    UNIQUE(source, target, relation_type)
)
"#;

/// SQL to create the embeddings table
pub const CREATE_EMBEDDINGS_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS embeddings (
    name TEXT PRIMARY KEY,
    vector BLOB NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_entities_type ON entities(entity_type)",
    "CREATE INDEX IF NOT EXISTS idx_relations_source ON relations(source)",
    "CREATE INDEX IF NOT EXISTS idx_relations_target ON relations(target)",
    "CREATE INDEX IF NOT EXISTS idx_relations_type ON relations(relation_type)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![
        CREATE_ENTITIES_TABLE,
        CREATE_RELATIONS_TABLE,
        CREATE_EMBEDDINGS_TABLE,
    ];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
