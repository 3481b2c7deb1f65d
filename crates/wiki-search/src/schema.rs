//! Tantivy schema shared by both embedded collections.
//!
//! The full JSON document is stored alongside the searchable fields so a
//! hit can be returned exactly as it was pushed.

use tantivy::schema::{Field, Schema, INDEXED, STORED, STRING, TEXT};

use crate::SearchError;

/// Schema field handles for efficient access
#[derive(Debug, Clone)]
pub struct SearchSchema {
    schema: Schema,
    /// Primary key (STRING | STORED)
    pub id: Field,
    /// "article", "group", "post" or "comment" (STRING | STORED)
    pub doc_type: Field,
    /// Owning group for community documents (STRING | STORED)
    pub group_id: Field,
    /// "PUBLIC" or "PRIVATE" (STRING | STORED)
    pub group_type: Field,
    /// Title or group name (TEXT | STORED)
    pub title: Field,
    /// Content or description (TEXT)
    pub body: Field,
    /// Unix seconds (INDEXED | STORED)
    pub created_at: Field,
    /// Serialized document (STORED)
    pub source: Field,
}

impl SearchSchema {
    /// Get the underlying Tantivy schema
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Create a SearchSchema from an existing Tantivy Schema
    pub fn from_schema(schema: Schema) -> Result<Self, SearchError> {
        let field = |name: &str| {
            schema
                .get_field(name)
                .map_err(|_| SearchError::SchemaMismatch(format!("missing {} field", name)))
        };

        Ok(Self {
            id: field("id")?,
            doc_type: field("doc_type")?,
            group_id: field("group_id")?,
            group_type: field("group_type")?,
            title: field("title")?,
            body: field("body")?,
            created_at: field("created_at")?,
            source: field("source")?,
            schema,
        })
    }
}

/// Build the collection schema.
pub fn build_schema() -> SearchSchema {
    let mut schema_builder = Schema::builder();

    let id = schema_builder.add_text_field("id", STRING | STORED);
    let doc_type = schema_builder.add_text_field("doc_type", STRING | STORED);
    let group_id = schema_builder.add_text_field("group_id", STRING | STORED);
    let group_type = schema_builder.add_text_field("group_type", STRING | STORED);
    let title = schema_builder.add_text_field("title", TEXT | STORED);
    let body = schema_builder.add_text_field("body", TEXT);
    let created_at = schema_builder.add_i64_field("created_at", INDEXED | STORED);
    let source = schema_builder.add_text_field("source", STORED);

    let schema = schema_builder.build();

    SearchSchema {
        schema,
        id,
        doc_type,
        group_id,
        group_type,
        title,
        body,
        created_at,
        source,
    }
}
