//! The external schema helper: extracts column descriptors from a
//! `CREATE TABLE` statement using an embedded grammar, independent of the
//! b-tree decoding pipeline.

use pest::iterators::Pair;
use pest::Parser;

use crate::schema::ColumnInfo;
use crate::sql_value::SqlValue;

#[derive(pest_derive::Parser)]
#[grammar = "sql.pest"]
struct SqlParser;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("failed to parse CREATE TABLE statement: {0}")]
    Syntax(#[from] Box<pest::error::Error<Rule>>),
}

struct RawColumn {
    name: String,
    type_name: String,
    notnull: bool,
    default: Option<SqlValue>,
    inline_pk: bool,
}

/// Extracts ordered column descriptors from a `CREATE TABLE` statement,
/// equivalent to SQLite's `PRAGMA table_info(table_name)`.
pub fn extract_columns(create_sql: &str, _table_name: &str) -> Result<Vec<ColumnInfo>, Error> {
    let stmt = SqlParser::parse(Rule::create_stmt, create_sql)
        .map_err(Box::new)?
        .next()
        .expect("create_stmt always produces exactly one pair on success");

    let mut raw_columns = Vec::new();
    let mut table_pk_order: Option<Vec<String>> = None;

    for pair in stmt.into_inner() {
        if pair.as_rule() == Rule::column_defs {
            for item in pair.into_inner() {
                match item.as_rule() {
                    Rule::column_def => raw_columns.push(parse_column_def(item)),
                    Rule::table_constraint => {
                        table_pk_order = Some(
                            item.into_inner()
                                .filter(|p| p.as_rule() == Rule::name)
                                .map(|p| unquote(p.as_str()))
                                .collect(),
                        );
                    }
                    _ => {}
                }
            }
        }
    }

    let pk_rank: std::collections::HashMap<String, i64> = match table_pk_order {
        Some(order) => order
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, (i + 1) as i64))
            .collect(),
        None => raw_columns
            .iter()
            .find(|c| c.inline_pk)
            .map(|c| (c.name.clone(), 1))
            .into_iter()
            .collect(),
    };

    Ok(raw_columns
        .into_iter()
        .enumerate()
        .map(|(cid, c)| ColumnInfo {
            cid: cid as i64,
            pk: *pk_rank.get(&c.name).unwrap_or(&0),
            name: c.name,
            type_name: c.type_name,
            notnull: c.notnull,
            default: c.default,
        })
        .collect())
}

fn parse_column_def(pair: Pair<Rule>) -> RawColumn {
    let mut inner = pair.into_inner();
    let name = unquote(inner.next().unwrap().as_str());

    let mut type_name = String::new();
    let mut notnull = false;
    let mut default = None;
    let mut inline_pk = false;

    for item in inner {
        match item.as_rule() {
            Rule::type_name => type_name = item.as_str().trim().to_string(),
            Rule::column_constraint => {
                let constraint = item.into_inner().next().unwrap();
                match constraint.as_rule() {
                    Rule::not_null => notnull = true,
                    Rule::primary_key => inline_pk = true,
                    Rule::default_clause => {
                        let literal = constraint.into_inner().next().unwrap();
                        default = Some(literal_to_value(literal));
                    }
                    // unique, collate, references, check: recognized so they
                    // don't break parsing, but not surfaced in ColumnInfo.
                    _ => {}
                }
            }
            _ => {}
        }
    }

    RawColumn {
        name,
        type_name,
        notnull,
        default,
        inline_pk,
    }
}

fn literal_to_value(pair: Pair<Rule>) -> SqlValue {
    match pair.as_rule() {
        Rule::integer_literal => SqlValue::Int(pair.as_str().parse().unwrap_or(0)),
        Rule::decimal_literal => SqlValue::Real(pair.as_str().parse().unwrap_or(0.0)),
        Rule::single_quoted_string => {
            let raw = pair.as_str();
            SqlValue::Text(raw[1..raw.len() - 1].replace("''", "'"))
        }
        Rule::null_literal => SqlValue::Null(),
        _ => SqlValue::Null(),
    }
}

fn unquote(s: &str) -> String {
    let bytes = s.as_bytes();
    if bytes.len() >= 2 {
        let (open, close) = (bytes[0], bytes[bytes.len() - 1]);
        let matched = matches!((open, close), (b'"', b'"') | (b'`', b'`') | (b'[', b']'));
        if matched {
            return s[1..s.len() - 1].to_string();
        }
    }
    s.to_string()
}
