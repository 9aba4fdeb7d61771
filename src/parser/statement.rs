//! Classification of statements the stream could not classify.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::lexer::{tokenize, Cursor, Token};
use super::{ParseError, StatementParser};

/// Possibly schema-qualified table reference
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub qualifier: Option<String>,
    pub name: String,
}

impl TableRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            qualifier: None,
            name: name.into(),
        }
    }

    pub fn qualified(qualifier: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            qualifier: Some(qualifier.into()),
            name: name.into(),
        }
    }

    /// True when the reference names a schema other than `db_name`
    pub fn is_foreign_to(&self, db_name: &str) -> bool {
        self.qualifier.as_deref().is_some_and(|q| q != db_name)
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{qualifier}.{}", self.name),
            None => f.write_str(&self.name),
        }
    }
}

/// What a statement may do to existing rows
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Statement {
    /// Adds rows only
    Insert { table: TableRef },
    /// May modify existing rows in any of `tables`
    Update { tables: Vec<TableRef> },
    /// May remove existing rows from any of `tables`
    Delete { tables: Vec<TableRef> },
    /// Anything else, by leading keyword
    Other { keyword: String },
}

impl Statement {
    /// Every table the statement names, in order of appearance
    pub fn tables(&self) -> &[TableRef] {
        match self {
            Statement::Insert { table } => std::slice::from_ref(table),
            Statement::Update { tables } | Statement::Delete { tables } => tables,
            Statement::Other { .. } => &[],
        }
    }
}

const PRIORITY_MODIFIERS: &[&str] = &["LOW_PRIORITY", "HIGH_PRIORITY", "DELAYED", "QUICK", "IGNORE"];

/// Keywords that end a multi-table DELETE's table references
const DELETE_TAIL: &[&str] = &["WHERE", "ORDER", "LIMIT"];

/// Leading-keyword statement classifier for MySQL DML.
///
/// `INSERT ... ON DUPLICATE KEY UPDATE` classifies as an update and `REPLACE`
/// as a delete, since both can overwrite rows that may be cached.
///
/// Multi-table `UPDATE` and `DELETE` report every table in their table
/// references, joined or comma-listed. For `DELETE t1, t2 FROM ...` and
/// `DELETE FROM t1, t2 USING ...` the targets may be aliases, so the tables
/// of the reference list are reported instead. Derived tables are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordStatementParser;

impl KeywordStatementParser {
    pub fn new() -> Self {
        Self
    }
}

impl StatementParser for KeywordStatementParser {
    fn parse(&self, sql: &str) -> Result<Statement, ParseError> {
        let mut cursor = Cursor::new(tokenize(sql)?);

        let keyword = match cursor.next_token() {
            None => return Err(ParseError::Empty),
            Some(Token::Word(word)) => word.to_ascii_uppercase(),
            Some(other) => {
                return Err(ParseError::UnexpectedToken {
                    found: format!("{other:?}"),
                })
            }
        };

        match keyword.as_str() {
            "INSERT" => {
                cursor.skip_keywords(PRIORITY_MODIFIERS);
                cursor.eat_keyword("INTO");
                let table = table_ref(&mut cursor, "INSERT")?;
                if cursor.seek_keyword("DUPLICATE") && cursor.eat_keywords(&["KEY", "UPDATE"]) {
                    Ok(Statement::Update { tables: vec![table] })
                } else {
                    Ok(Statement::Insert { table })
                }
            }
            "REPLACE" => {
                cursor.skip_keywords(PRIORITY_MODIFIERS);
                cursor.eat_keyword("INTO");
                Ok(Statement::Delete {
                    tables: vec![table_ref(&mut cursor, "REPLACE")?],
                })
            }
            "UPDATE" => {
                cursor.skip_keywords(PRIORITY_MODIFIERS);
                Ok(Statement::Update {
                    tables: table_references(&mut cursor, "UPDATE", &["SET"])?,
                })
            }
            "DELETE" => {
                cursor.skip_keywords(PRIORITY_MODIFIERS);
                Ok(Statement::Delete {
                    tables: delete_tables(&mut cursor)?,
                })
            }
            _ => Ok(Statement::Other { keyword }),
        }
    }
}

fn table_ref(cursor: &mut Cursor, statement: &'static str) -> Result<TableRef, ParseError> {
    cursor
        .qualified_name()
        .map(|(qualifier, name)| TableRef { qualifier, name })
        .ok_or(ParseError::MissingTable { statement })
}

fn delete_tables(cursor: &mut Cursor) -> Result<Vec<TableRef>, ParseError> {
    if !cursor.eat_keyword("FROM") {
        // DELETE t1, t2 FROM <references>
        if !cursor.seek_keyword("FROM") {
            return Err(ParseError::MissingTable { statement: "DELETE" });
        }
        return table_references(cursor, "DELETE", DELETE_TAIL);
    }

    let mut terminators = vec!["USING"];
    terminators.extend_from_slice(DELETE_TAIL);
    let targets = table_references(cursor, "DELETE", &terminators)?;
    if cursor.eat_keyword("USING") {
        // DELETE FROM t1, t2 USING <references>
        return table_references(cursor, "DELETE", DELETE_TAIL);
    }
    Ok(targets)
}

/// Collect the tables of a MySQL table-reference list up to the first
/// top-level `terminators` keyword. Tables follow the start of the list, a
/// top-level comma or a JOIN; anything in parentheses is skipped.
fn table_references(
    cursor: &mut Cursor,
    statement: &'static str,
    terminators: &[&str],
) -> Result<Vec<TableRef>, ParseError> {
    let mut tables = vec![table_ref(cursor, statement)?];
    let mut depth = 0usize;

    while let Some(token) = cursor.peek() {
        if depth == 0 && terminators.iter().any(|kw| token.is_keyword(kw)) {
            break;
        }
        let starts_table = depth == 0
            && (token.is_punct(',') || token.is_keyword("JOIN") || token.is_keyword("STRAIGHT_JOIN"));
        if token.is_punct('(') {
            depth += 1;
        } else if token.is_punct(')') {
            depth = depth.saturating_sub(1);
        }
        cursor.next_token();

        if starts_table {
            cursor.eat_keyword("LATERAL");
        }
        if starts_table && !cursor.peek().is_some_and(|t| t.is_punct('(')) {
            let table = table_ref(cursor, statement)?;
            if !tables.contains(&table) {
                tables.push(table);
            }
        }
    }
    Ok(tables)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(sql: &str) -> Result<Statement, ParseError> {
        KeywordStatementParser::new().parse(sql)
    }

    #[test]
    fn test_insert_variants() {
        assert_eq!(
            parse("INSERT INTO t (a) VALUES (1)").unwrap(),
            Statement::Insert { table: TableRef::new("t") }
        );
        assert_eq!(
            parse("insert ignore into db.t values (1)").unwrap(),
            Statement::Insert { table: TableRef::qualified("db", "t") }
        );
        assert_eq!(
            parse("INSERT INTO t (a) VALUES (1) ON DUPLICATE KEY UPDATE a = a + 1").unwrap(),
            Statement::Update { tables: vec![TableRef::new("t")] }
        );
    }

    #[test]
    fn test_update_and_delete() {
        assert_eq!(
            parse("UPDATE LOW_PRIORITY `t` SET a = 1 WHERE b = 'x'").unwrap(),
            Statement::Update { tables: vec![TableRef::new("t")] }
        );
        assert_eq!(
            parse("DELETE FROM other_db.t WHERE id = 1").unwrap(),
            Statement::Delete { tables: vec![TableRef::qualified("other_db", "t")] }
        );
        assert_eq!(
            parse("REPLACE INTO t VALUES (1)").unwrap(),
            Statement::Delete { tables: vec![TableRef::new("t")] }
        );
    }

    fn names(statement: &Statement) -> Vec<String> {
        statement.tables().iter().map(ToString::to_string).collect()
    }

    #[test]
    fn test_multi_table_update() {
        let joined = parse(
            "UPDATE orders o JOIN users u ON u.id = o.user_id SET u.name = 'x' WHERE o.id = 1",
        )
        .unwrap();
        assert!(matches!(joined, Statement::Update { .. }));
        assert_eq!(names(&joined), vec!["orders", "users"]);

        let listed = parse("UPDATE orders, main.users SET users.name = 'x' WHERE orders.id = 1").unwrap();
        assert_eq!(names(&listed), vec!["orders", "main.users"]);

        let outer = parse(
            "UPDATE orders AS o LEFT OUTER JOIN users u USING (user_id) STRAIGHT_JOIN items i ON i.id = o.item SET o.total = 0",
        )
        .unwrap();
        assert_eq!(names(&outer), vec!["orders", "users", "items"]);
    }

    #[test]
    fn test_update_skips_derived_tables_and_subqueries() {
        let derived = parse(
            "UPDATE orders o JOIN (SELECT id FROM users, audit) x ON x.id = o.id SET o.total = 0",
        )
        .unwrap();
        assert_eq!(names(&derived), vec!["orders"]);

        let filtered = parse("UPDATE orders SET total = 0 WHERE id IN (SELECT id FROM users JOIN audit)").unwrap();
        assert_eq!(names(&filtered), vec!["orders"]);
    }

    #[test]
    fn test_multi_table_delete() {
        let targets_first = parse(
            "DELETE orders, users FROM orders JOIN users ON users.id = orders.user_id WHERE orders.id = 1",
        )
        .unwrap();
        assert!(matches!(targets_first, Statement::Delete { .. }));
        assert_eq!(names(&targets_first), vec!["orders", "users"]);

        let using = parse("DELETE FROM o.*, u USING orders o, users u WHERE o.user_id = u.id").unwrap();
        assert_eq!(names(&using), vec!["orders", "users"]);

        let single = parse("DELETE FROM orders WHERE id IN (1, 2) LIMIT 5").unwrap();
        assert_eq!(names(&single), vec!["orders"]);

        assert_eq!(
            parse("DELETE orders WHERE id = 1").unwrap_err(),
            ParseError::MissingTable { statement: "DELETE" }
        );
    }

    #[test]
    fn test_leading_comment() {
        assert_eq!(
            parse("/* app:orders */ update t set a = 1").unwrap(),
            Statement::Update { tables: vec![TableRef::new("t")] }
        );
    }

    #[test]
    fn test_other_statements() {
        assert_eq!(
            parse("SET @@session.time_zone = '+00:00'").unwrap(),
            Statement::Other { keyword: "SET".into() }
        );
        assert_eq!(parse("begin").unwrap(), Statement::Other { keyword: "BEGIN".into() });
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse("   ").unwrap_err(), ParseError::Empty);
        assert_eq!(
            parse("UPDATE").unwrap_err(),
            ParseError::MissingTable { statement: "UPDATE" }
        );
        assert!(matches!(parse("(SELECT 1)"), Err(ParseError::UnexpectedToken { .. })));
        assert!(matches!(parse("UPDATE 't"), Err(ParseError::UnterminatedQuote { .. })));
    }

    #[test]
    fn test_foreign_qualifier() {
        assert!(TableRef::qualified("other", "t").is_foreign_to("main"));
        assert!(!TableRef::qualified("main", "t").is_foreign_to("main"));
        assert!(!TableRef::new("t").is_foreign_to("main"));
        assert_eq!(TableRef::qualified("main", "t").to_string(), "main.t");
    }
}
