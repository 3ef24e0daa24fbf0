//! Prompt templates
//!
//! All prompts are pure functions of the query, the optional candidates and
//! the schema snapshot. The schema JSON is rendered once per builder.

use crate::schema::SchemaDescription;

/// Shown in a vote prompt in place of a candidate whose oracle failed.
pub const MISSING_CANDIDATE: &str = "(no statement was produced)";

const METADATA_LAYOUT: &str = "\
The schema is a JSON object keyed by database name. Each database maps table names to:
- columns: column definitions, each with name, type, nullable and default
- primary_keys: the primary key column names, or null
- foreign_keys: relationships as {columns, referenced_table, referenced_columns}, or null
- create_statement: the raw CREATE TABLE statement, or null";

/// Builds the translate, vote and pre-check prompts for one schema.
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    schema_json: String,
}

impl PromptBuilder {
    pub fn new(schema: &SchemaDescription) -> Self {
        Self {
            schema_json: schema.to_prompt_json(),
        }
    }

    pub fn schema_json(&self) -> &str {
        &self.schema_json
    }

    /// Prompt asking for a single MySQL statement answering `query`.
    pub fn translate(&self, query: &str) -> String {
        format!(
            "You are an expert MySQL engineer working against this database schema.\n\
             {layout}\n\n\
             Schema:\n{schema}\n\n\
             Write one SQL statement that answers the request below.\n\
             - The statement must be valid MySQL.\n\
             - Use only table and column names that exist in the schema.\n\
             - Respect primary and foreign key relationships and column types.\n\
             - If the request implies a filter but does not spell it out, infer a reasonable WHERE condition.\n\
             - Requests about attributes, columns, schema, structure or similar mean the table definition; answer those with DESCRIBE <table>.\n\
             - Output only the SQL statement as plain text: no explanation, no markdown, no code fences.\n\n\
             Request:\n{query}\n",
            layout = METADATA_LAYOUT,
            schema = self.schema_json,
            query = query,
        )
    }

    /// Prompt asking a judge for a `yes|no yes|no` line about two candidates.
    pub fn vote(&self, query: &str, sql_a: Option<&str>, sql_b: Option<&str>) -> String {
        format!(
            "You are an expert MySQL reviewer. You receive a request in natural language, \
             a database schema and two candidate SQL statements.\n\
             Decide for each candidate whether it correctly answers the request against this schema.\n\n\
             Reply with exactly one line holding two words separated by a space, one per candidate in order:\n\
             - yes: the statement is valid and satisfies the request\n\
             - no: the statement is invalid or misses the intent of the request\n\
             Output those two words and nothing else.\n\n\
             Schema:\n{schema}\n\n\
             Request:\n{query}\n\n\
             SQL candidate 1:\n{a}\n\n\
             SQL candidate 2:\n{b}\n",
            schema = self.schema_json,
            query = query,
            a = sql_a.unwrap_or(MISSING_CANDIDATE),
            b = sql_b.unwrap_or(MISSING_CANDIDATE),
        )
    }

    /// Lenient classification prompt: is this input a database request at all?
    pub fn precheck(&self, query: &str) -> String {
        format!(
            "You screen input for a natural-language SQL assistant that has access to this database schema.\n\
             {layout}\n\n\
             Schema:\n{schema}\n\n\
             Judge whether the user input below is a reasonable attempt to interact with a relational database.\n\
             Treat these as valid, among others:\n\
             - requests to see tables, columns or databases (\"show all tables\", \"list columns in X\", \"switch to X database\")\n\
             - partially structured requests (\"first 3 records of X\", \"join X and Y on id\")\n\
             - anything mentioning attributes, fields, columns, rows, schema or structure\n\
             Reject only input that is clearly irrelevant or nonsensical (greetings, \"just testing\", keyboard mashing).\n\
             Be lenient: if a person could read the input as a meaningful database request, it is valid.\n\n\
             Respond with exactly one line:\n\
             - True\n\
             - False <reason>\n\n\
             User input:\n{query}\n",
            layout = METADATA_LAYOUT,
            schema = self.schema_json,
            query = query,
        )
    }
}
