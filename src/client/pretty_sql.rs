//! Layout for displaying generated SQL.
//!
//! Clauses start on their own line, select-list items and top-level `AND`/`OR`
//! conditions are indented one level. Nothing inside parentheses is moved, so
//! subqueries stay on one line. Runs of whitespace collapse to a single space,
//! which only matters for string literals containing spaces.

const CLAUSE_STARTERS: &[&str] = &[
    "SELECT", "FROM", "WHERE", "ORDER", "GROUP", "HAVING", "LIMIT", "UNION", "INNER", "LEFT",
    "RIGHT", "FULL", "CROSS", "JOIN",
];

const JOIN_QUALIFIERS: &[&str] = &["INNER", "LEFT", "RIGHT", "FULL", "CROSS", "OUTER"];

const INDENT: &str = "    ";

pub fn pretty_sql(sql: &str) -> String {
    let tokens: Vec<&str> = sql.split_whitespace().collect();
    let upper: Vec<String> = tokens.iter().map(|t| t.to_uppercase()).collect();

    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut depth: i32 = 0;
    let mut in_select = false;
    let mut between_pending = false;
    let mut break_next = false;

    for (i, token) in tokens.iter().enumerate() {
        let word = upper[i].as_str();
        let prev = if i > 0 { upper[i - 1].as_str() } else { "" };
        let next = upper.get(i + 1).map(String::as_str).unwrap_or("");

        let starts_clause = depth == 0
            && CLAUSE_STARTERS.contains(&word)
            && !(word == "JOIN" && JOIN_QUALIFIERS.contains(&prev));
        let is_between_and = word == "AND" && between_pending;
        let starts_condition =
            depth == 0 && !in_select && !is_between_and && (word == "AND" || word == "OR");

        if starts_clause || starts_condition || break_next {
            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if !starts_clause {
                current.push_str(INDENT);
            }
            break_next = false;
        } else if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(token);

        if starts_clause {
            in_select = word == "SELECT";
        }
        if word == "BETWEEN" {
            between_pending = true;
        } else if is_between_and {
            between_pending = false;
        }

        depth += token.matches('(').count() as i32;
        depth -= token.matches(')').count() as i32;

        if in_select && depth == 0 {
            let ends_keyword = (word == "SELECT" && next != "DISTINCT")
                || (word == "DISTINCT" && prev == "SELECT");
            if ends_keyword || token.ends_with(',') {
                break_next = true;
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines.join("\n")
}
