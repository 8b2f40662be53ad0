//! A streaming decoder for the SQLite database file format.
//!
//! The database is supplied as a sequence of byte chunks (which need not
//! align with pages or any other structure) and is decoded in a single
//! forward pass: [`decode`] returns a lazy sequence of table sections, each
//! followed by its rows, in the order their root pages are first reached by
//! the walk.
//!
//! This crate reads metadata (`CREATE TABLE` column definitions) but does
//! not execute SQL; query planning and execution are out of scope.

mod btree_page;
pub mod chunk_reader;
pub mod config;
pub mod error;
pub mod header;
pub mod overflow;
pub mod page_feed;
pub mod parser;
pub mod record;
pub mod result;
pub mod schema;
pub mod serial_type;
pub mod sql_value;
pub mod varint;
pub mod walker;

pub use config::Config;
pub use error::Error;
pub use result::DecodedItem;

/// A 1-based SQLite page number.
pub type PageNum = u32;

/// Decodes a SQLite database file supplied as a sequence of byte chunks.
///
/// Returns a lazy iterator: each [`DecodedItem::Table`] announces the start
/// of a table section (its name and column metadata), immediately followed
/// by that table's [`DecodedItem::Row`] items, in the order the b-tree walk
/// reaches their root page. Internal `sqlite_`-prefixed tables are not
/// surfaced.
///
/// # Errors
///
/// The stream ends with an `Err` item (and no further items) on any
/// malformed input: a bad file header, a truncated or oversized input, an
/// invalid page type, or buffering more out-of-order page data than
/// `config.max_buffer_size` allows.
pub fn decode<I>(
    chunks: I,
    config: Config,
) -> Result<impl Iterator<Item = Result<DecodedItem, Error>>, Error>
where
    I: IntoIterator<Item = Vec<u8>>,
{
    let pages = page_feed::PageFeed::open(chunks.into_iter())?;
    let walker = walker::Walker::new(pages, config.max_buffer_size);
    Ok(result::Grouper::new(walker))
}
