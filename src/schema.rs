//! Interpreting `sqlite_schema` rows: deciding which root pages are tables or
//! indexes, and deriving each table's column metadata via the embedded
//! `CREATE TABLE` parser (the equivalent of `PRAGMA table_info`).

use std::rc::Rc;

use crate::parser;
use crate::sql_value::SqlValue;
use crate::PageNum;

/// `sqlite_schema` is always rooted at page 1.
pub const SCHEMA_BTREE_ROOT_PAGENUM: PageNum = 1;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("could not parse the CREATE TABLE statement for '{table}': {source}")]
    ColumnExtraction {
        table: String,
        #[source]
        source: parser::Error,
    },
}

/// One column's metadata, equivalent to a row of `PRAGMA table_info`.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnInfo {
    pub cid: i64,
    pub name: String,
    pub type_name: String,
    pub notnull: bool,
    pub default: Option<SqlValue>,
    /// 0 if not part of the primary key, otherwise its 1-based position
    /// within the primary key.
    pub pk: i64,
}

#[derive(Debug)]
pub enum Role {
    /// `sqlite_schema` itself: rows are interpreted rather than surfaced.
    Schema,
    User,
}

/// Shared, read-only metadata for one root page's table, threaded through
/// every row decoded from its subtree.
#[derive(Debug)]
pub struct TableContext {
    pub role: Role,
    pub name: String,
    pub columns: Rc<Vec<ColumnInfo>>,
    pub rowid_alias_index: Option<usize>,
}

impl TableContext {
    pub fn schema() -> TableContext {
        let columns = vec![
            column("type", "text"),
            column("name", "text"),
            column("tbl_name", "text"),
            column("rootpage", "integer"),
            column("sql", "text"),
        ];
        TableContext {
            role: Role::Schema,
            name: "sqlite_schema".to_string(),
            columns: Rc::new(columns),
            rowid_alias_index: None,
        }
    }
}

fn column(name: &str, type_name: &str) -> ColumnInfo {
    ColumnInfo {
        cid: 0,
        name: name.to_string(),
        type_name: type_name.to_string(),
        notnull: false,
        default: None,
        pk: 0,
    }
}

pub enum Action {
    ScheduleTable(PageNum, Rc<TableContext>),
    ScheduleIndex(PageNum),
    Ignore,
}

const TYPE_COLIDX: usize = 0;
const TBL_NAME_COLIDX: usize = 2;
const ROOTPAGE_COLIDX: usize = 3;
const SQL_COLIDX: usize = 4;

fn text(values: &[SqlValue], idx: usize) -> String {
    match &values[idx] {
        SqlValue::Text(s) => s.clone(),
        SqlValue::Null() => String::new(),
        other => format!("{}", other),
    }
}

fn int(values: &[SqlValue], idx: usize) -> i64 {
    match values[idx] {
        SqlValue::Int(i) => i,
        _ => 0,
    }
}

/// Interprets one decoded row of `sqlite_schema`, deciding whether it
/// schedules a new table or index subtree.
pub fn interpret_row(values: &[SqlValue]) -> Result<Action, Error> {
    let entry_type = text(values, TYPE_COLIDX);
    let root_page = int(values, ROOTPAGE_COLIDX) as PageNum;

    match entry_type.as_str() {
        "table" => {
            let tbl_name = text(values, TBL_NAME_COLIDX);
            let sql = text(values, SQL_COLIDX);
            if sql.is_empty() || root_page == 0 {
                // Virtual tables and similar entries have no backing b-tree.
                return Ok(Action::Ignore);
            }
            // sqlite_-prefixed tables get an internal label so the grammar
            // never has to special-case them; the real name still flows
            // through in `TableContext::name` for the row stream.
            let helper_name = if tbl_name.starts_with("sqlite_") {
                format!("_{}", tbl_name)
            } else {
                tbl_name.clone()
            };
            let columns = parser::extract_columns(&sql, &helper_name).map_err(|source| {
                Error::ColumnExtraction {
                    table: tbl_name.clone(),
                    source,
                }
            })?;
            let rowid_alias_index = rowid_alias_index(&columns);
            let ctx = Rc::new(TableContext {
                role: Role::User,
                name: tbl_name,
                columns: Rc::new(columns),
                rowid_alias_index,
            });
            Ok(Action::ScheduleTable(root_page, ctx))
        }
        "index" => {
            if root_page == 0 {
                return Ok(Action::Ignore);
            }
            Ok(Action::ScheduleIndex(root_page))
        }
        _ => Ok(Action::Ignore),
    }
}

/// A table's rowid is transparently aliased by its single `INTEGER PRIMARY
/// KEY` column, if it has exactly one.
fn rowid_alias_index(columns: &[ColumnInfo]) -> Option<usize> {
    let pk_columns: Vec<usize> = columns
        .iter()
        .enumerate()
        .filter(|(_, c)| c.pk != 0)
        .map(|(i, _)| i)
        .collect();
    if pk_columns.len() == 1 && columns[pk_columns[0]].type_name.eq_ignore_ascii_case("integer") {
        Some(pk_columns[0])
    } else {
        None
    }
}
