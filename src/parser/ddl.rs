//! DDL statement parsing.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::lexer::{tokenize, Cursor};
use super::DdlParser;

/// Kind of schema change a DDL statement performs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DdlAction {
    /// CREATE TABLE / CREATE VIEW
    Create,
    /// ALTER TABLE / ALTER VIEW
    Alter,
    /// DROP TABLE / DROP VIEW
    Drop,
    /// RENAME TABLE, or ALTER TABLE ... RENAME
    Rename,
    /// TRUNCATE TABLE
    Truncate,
    CreateIndex,
    DropIndex,
}

impl DdlAction {
    pub fn description(&self) -> &'static str {
        match self {
            DdlAction::Create => "CREATE TABLE",
            DdlAction::Alter => "ALTER TABLE",
            DdlAction::Drop => "DROP TABLE",
            DdlAction::Rename => "RENAME TABLE",
            DdlAction::Truncate => "TRUNCATE TABLE",
            DdlAction::CreateIndex => "CREATE INDEX",
            DdlAction::DropIndex => "DROP INDEX",
        }
    }
}

impl fmt::Display for DdlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// What to do with table metadata after a DDL statement.
///
/// `table_name` is the table whose current metadata becomes stale and
/// `new_name` the table whose metadata must be (re)loaded. They are equal for
/// in-place changes such as `ALTER TABLE t ADD COLUMN`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdlPlan {
    pub action: Option<DdlAction>,
    pub table_name: Option<String>,
    pub new_name: Option<String>,
}

impl DdlPlan {
    pub fn unrecognized() -> Self {
        Self::default()
    }

    fn new(action: DdlAction, table_name: Option<String>, new_name: Option<String>) -> Self {
        Self {
            action: Some(action),
            table_name,
            new_name,
        }
    }

    fn in_place(action: DdlAction, table: String) -> Self {
        Self::new(action, Some(table.clone()), Some(table))
    }

    pub fn is_recognized(&self) -> bool {
        self.action.is_some()
    }
}

const CREATE_MODIFIERS: &[&str] = &["OR", "REPLACE", "TEMPORARY", "UNIQUE", "FULLTEXT", "SPATIAL"];
const VIEW_OPTIONS: &[&str] = &["ALGORITHM", "DEFINER", "SQL", "SECURITY"];

/// Keyword-driven DDL parser covering the MySQL table and index statements
/// that change cached-table metadata. Anything else parses to
/// [`DdlPlan::unrecognized`], including the multi-table list forms
/// `DROP TABLE a, b` and `RENAME TABLE a TO b, c TO d`, which a single plan
/// cannot describe.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordDdlParser;

impl KeywordDdlParser {
    pub fn new() -> Self {
        Self
    }
}

impl DdlParser for KeywordDdlParser {
    fn parse(&self, sql: &str) -> DdlPlan {
        let Ok(tokens) = tokenize(sql) else {
            return DdlPlan::unrecognized();
        };
        let mut cursor = Cursor::new(tokens);

        let plan = if cursor.eat_keyword("CREATE") {
            parse_create(&mut cursor)
        } else if cursor.eat_keyword("ALTER") {
            parse_alter(&mut cursor)
        } else if cursor.eat_keyword("DROP") {
            parse_drop(&mut cursor)
        } else if cursor.eat_keywords(&["RENAME", "TABLE"]) {
            parse_rename(&mut cursor)
        } else if cursor.eat_keyword("TRUNCATE") {
            cursor.eat_keyword("TABLE");
            table(&mut cursor).map(|t| DdlPlan::in_place(DdlAction::Truncate, t))
        } else {
            None
        };

        plan.unwrap_or_default()
    }
}

/// Next (possibly schema-qualified) name, without its qualifier
fn table(cursor: &mut Cursor) -> Option<String> {
    cursor.qualified_name().map(|(_, name)| name)
}

fn parse_create(cursor: &mut Cursor) -> Option<DdlPlan> {
    cursor.skip_keywords(CREATE_MODIFIERS);

    if cursor.eat_keyword("TABLE") {
        cursor.eat_keywords(&["IF", "NOT", "EXISTS"]);
        return table(cursor).map(|t| DdlPlan::new(DdlAction::Create, None, Some(t)));
    }
    if cursor.eat_keyword("INDEX") {
        return cursor
            .seek_keyword("ON")
            .then(|| table(cursor))
            .flatten()
            .map(|t| DdlPlan::in_place(DdlAction::CreateIndex, t));
    }

    // CREATE [ALGORITHM = ...] [DEFINER = ...] [SQL SECURITY ...] VIEW
    if cursor.peek().is_some_and(|t| VIEW_OPTIONS.iter().any(|kw| t.is_keyword(kw)))
        || cursor.peek_keyword("VIEW")
    {
        return cursor
            .seek_keyword("VIEW")
            .then(|| table(cursor))
            .flatten()
            .map(|t| DdlPlan::new(DdlAction::Create, None, Some(t)));
    }
    None
}

fn parse_alter(cursor: &mut Cursor) -> Option<DdlPlan> {
    cursor.skip_keywords(&["ONLINE", "OFFLINE", "IGNORE"]);

    if cursor.peek().is_some_and(|t| VIEW_OPTIONS.iter().any(|kw| t.is_keyword(kw)))
        || cursor.peek_keyword("VIEW")
    {
        return cursor
            .seek_keyword("VIEW")
            .then(|| table(cursor))
            .flatten()
            .map(|t| DdlPlan::in_place(DdlAction::Alter, t));
    }
    if !cursor.eat_keyword("TABLE") {
        return None;
    }

    let name = table(cursor)?;
    while let Some(token) = cursor.next_token() {
        if !token.is_keyword("RENAME") {
            continue;
        }
        if cursor.peek_keyword("COLUMN") || cursor.peek_keyword("INDEX") || cursor.peek_keyword("KEY") {
            continue;
        }
        if !(cursor.eat_keyword("TO") || cursor.eat_keyword("AS")) && cursor.is_done() {
            break;
        }
        let new_name = table(cursor)?;
        return Some(DdlPlan::new(DdlAction::Rename, Some(name), Some(new_name)));
    }
    Some(DdlPlan::in_place(DdlAction::Alter, name))
}

fn parse_drop(cursor: &mut Cursor) -> Option<DdlPlan> {
    cursor.eat_keyword("TEMPORARY");

    if cursor.eat_keyword("TABLE") || cursor.eat_keyword("VIEW") {
        cursor.eat_keywords(&["IF", "EXISTS"]);
        let name = table(cursor)?;
        if lists_more_tables(cursor) {
            return None;
        }
        return Some(DdlPlan::new(DdlAction::Drop, Some(name), None));
    }
    if cursor.eat_keyword("INDEX") {
        return cursor
            .seek_keyword("ON")
            .then(|| table(cursor))
            .flatten()
            .map(|t| DdlPlan::in_place(DdlAction::DropIndex, t));
    }
    None
}

fn parse_rename(cursor: &mut Cursor) -> Option<DdlPlan> {
    let from = table(cursor)?;
    if !cursor.eat_keyword("TO") {
        return None;
    }
    let to = table(cursor)?;
    if lists_more_tables(cursor) {
        return None;
    }
    Some(DdlPlan::new(DdlAction::Rename, Some(from), Some(to)))
}

fn lists_more_tables(cursor: &Cursor) -> bool {
    cursor.peek().is_some_and(|t| t.is_punct(','))
}
