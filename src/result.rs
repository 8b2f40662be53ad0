//! Groups the walker's flat row stream into caller-facing table sections,
//! filtering out SQLite's internal `sqlite_`-prefixed tables.

use std::rc::Rc;

use crate::schema::{ColumnInfo, TableContext};
use crate::sql_value::SqlValue;
use crate::walker::WalkEvent;
use crate::Error;

/// One item of the public decode stream: either a new table section
/// beginning, or the next row of the table section currently in progress.
#[derive(Debug, PartialEq)]
pub enum DecodedItem {
    Table {
        name: String,
        columns: Rc<Vec<ColumnInfo>>,
    },
    Row(Vec<SqlValue>),
}

pub struct Grouper<I> {
    inner: I,
    /// The table currently being surfaced to the caller, or `None` while
    /// skipping rows of a filtered `sqlite_`-prefixed table.
    current_table: Option<Rc<TableContext>>,
}

impl<I> Grouper<I> {
    pub fn new(inner: I) -> Self {
        Grouper {
            inner,
            current_table: None,
        }
    }
}

impl<I: Iterator<Item = Result<WalkEvent, Error>>> Iterator for Grouper<I> {
    type Item = Result<DecodedItem, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let event = match self.inner.next() {
                Some(Ok(e)) => e,
                Some(Err(e)) => return Some(Err(e)),
                None => return None,
            };
            match event {
                WalkEvent::TableStart { table } => {
                    if table.name.starts_with("sqlite_") {
                        self.current_table = None;
                        continue;
                    }
                    let name = table.name.clone();
                    let columns = table.columns.clone();
                    self.current_table = Some(table);
                    return Some(Ok(DecodedItem::Table { name, columns }));
                }
                WalkEvent::Row { table, values, .. } => {
                    let surfacing = self
                        .current_table
                        .as_ref()
                        .is_some_and(|t| Rc::ptr_eq(t, &table));
                    if surfacing {
                        return Some(Ok(DecodedItem::Row(values)));
                    }
                    // A row of a filtered (sqlite_*) table; its TableStart
                    // already cleared `current_table`, so drop it.
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Role;

    fn ctx(name: &str) -> Rc<TableContext> {
        Rc::new(TableContext {
            role: Role::User,
            name: name.to_string(),
            columns: Rc::new(vec![]),
            rowid_alias_index: None,
        })
    }

    fn start(table: &Rc<TableContext>) -> Result<WalkEvent, Error> {
        Ok(WalkEvent::TableStart {
            table: table.clone(),
        })
    }

    fn ok_row(table: &Rc<TableContext>, row_id: i64) -> Result<WalkEvent, Error> {
        Ok(WalkEvent::Row {
            table: table.clone(),
            row_id,
            values: vec![SqlValue::Int(row_id)],
        })
    }

    #[test]
    fn coalesces_consecutive_rows_of_the_same_table() {
        let t = ctx("widgets");
        let events = vec![start(&t), ok_row(&t, 1), ok_row(&t, 2)];
        let items: Vec<_> = Grouper::new(events.into_iter())
            .map(|r| r.unwrap())
            .collect();
        assert!(matches!(&items[0], DecodedItem::Table { name, .. } if name == "widgets"));
        assert!(matches!(&items[1], DecodedItem::Row(_)));
        assert!(matches!(&items[2], DecodedItem::Row(_)));
        assert_eq!(items.len(), 3);
    }

    #[test]
    fn emits_a_new_table_marker_when_the_table_changes() {
        let a = ctx("a");
        let b = ctx("b");
        let events = vec![start(&a), ok_row(&a, 1), start(&b), ok_row(&b, 1)];
        let items: Vec<_> = Grouper::new(events.into_iter())
            .map(|r| r.unwrap())
            .collect();
        assert!(matches!(&items[0], DecodedItem::Table { name, .. } if name == "a"));
        assert!(matches!(&items[1], DecodedItem::Row(_)));
        assert!(matches!(&items[2], DecodedItem::Table { name, .. } if name == "b"));
        assert!(matches!(&items[3], DecodedItem::Row(_)));
    }

    #[test]
    fn filters_out_internal_tables() {
        let sqlite_sequence = ctx("sqlite_sequence");
        let widgets = ctx("widgets");
        let events = vec![
            start(&sqlite_sequence),
            ok_row(&sqlite_sequence, 1),
            start(&widgets),
            ok_row(&widgets, 1),
        ];
        let items: Vec<_> = Grouper::new(events.into_iter())
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(items.len(), 2);
        assert!(matches!(&items[0], DecodedItem::Table { name, .. } if name == "widgets"));
    }

    #[test]
    fn a_table_with_no_rows_is_still_surfaced() {
        let empty = ctx("empty");
        let events = vec![start(&empty)];
        let items: Vec<_> = Grouper::new(events.into_iter())
            .map(|r| r.unwrap())
            .collect();
        assert_eq!(items.len(), 1);
        assert!(matches!(&items[0], DecodedItem::Table { name, .. } if name == "empty"));
    }
}
