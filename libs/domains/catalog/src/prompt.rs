//! Context rendering and prompt assembly for the generation step.

use std::fmt::Write;

use crate::models::RetrievedRecord;

/// Sentence the model is told to answer with when nothing in the context matches.
pub const NOT_FOUND_ANSWER: &str = "I am sorry, the database you are looking for does not exist.";

const INSTRUCTIONS: &str = "\
You are an assistant. Use the provided database name or description or any column names \
(CVE for example) to answer queries. Don't rely just on the database names clients give you.
If the query matches a database, description, schema, or table, or any related info \
(CVE for example) in the catalog, provide relevant details.
Always provide data in the format: Database: <database name>, Schema: <schema name>, \
Table: <table name>, Description: <description>, Link: <link>, Severity: <severity>, \
Status: <status>.";

/// Render retrieved records as one block each, in retrieval order, separated by a blank line.
pub fn render_context(records: &[RetrievedRecord]) -> String {
    records
        .iter()
        .map(|hit| {
            let r = &hit.record;
            format!(
                "[{}]\nDatabase: {}\nSchema: {}\nTable: {}\nDescription: {}\nLink: {}\nCVE: {}\nSeverity: {}\nStatus: {}",
                hit.rank,
                r.database,
                r.schema,
                r.table,
                r.description,
                r.link,
                r.cve_id,
                r.severity,
                r.status
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Full instruction prompt: role, answer format, fallback sentence, context and query.
pub fn build_prompt(query: &str, role: Option<&str>, context: &str) -> String {
    let role = role.map(str::trim).filter(|r| !r.is_empty());
    let mut prompt = String::new();

    if let Some(role) = role {
        let _ = writeln!(prompt, "Role asking the query: {}", role);
    }
    prompt.push_str(INSTRUCTIONS);
    prompt.push('\n');
    match role {
        Some(role) => {
            let _ = writeln!(
                prompt,
                "Provide a high-level summary along with the data format in a paragraph starting with 'As a {}'.",
                role
            );
        }
        None => {
            prompt.push_str(
                "Provide a high-level summary along with the data format in a paragraph.\n",
            );
        }
    }
    let _ = writeln!(
        prompt,
        "If it does not match anything, respond with \"{}\"",
        NOT_FOUND_ANSWER
    );
    prompt.push_str("Please make sure to make your response human-readable and concise.\n\n");
    let _ = write!(
        prompt,
        "Here is the database catalog:\n\n{}\n\nQuery: {}",
        context, query
    );

    prompt
}
