//! Walks the b-tree structure of a SQLite file as its pages arrive from a
//! [`crate::page_feed::PageFeed`], reconciling pages that arrive before the
//! work that was going to process them has been scheduled (and vice versa).
//!
//! The walk starts with page 1 registered as the root of `sqlite_schema`.
//! Decoding its rows schedules every table and index root page in turn, so
//! the whole database is discovered as a side effect of reading it once.

use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

use crate::btree_page::{BtreeHeader, PageKind};
use crate::page_feed::PageFeed;
use crate::schema::{self, Role, TableContext};
use crate::sql_value::SqlValue;
use crate::{btree_page, header, overflow, record, varint, Error, PageNum};

/// One step of the walk surfaced to the caller: either a table's root page
/// has just been reached (emitted once, before any of its rows, even if it
/// turns out to have none), or one of its rows has been decoded.
#[derive(Debug)]
pub enum WalkEvent {
    TableStart {
        table: Rc<TableContext>,
    },
    Row {
        table: Rc<TableContext>,
        row_id: i64,
        values: Vec<SqlValue>,
    },
}

enum OverflowFinisher {
    TableRow { table: Rc<TableContext>, row_id: i64 },
    Discard,
}

enum Processor {
    Table(Rc<TableContext>),
    Index,
    FreelistTrunk,
    FreelistLeaf,
    Overflow {
        assembly: overflow::Assembly,
        finisher: OverflowFinisher,
    },
}

pub struct Walker<I> {
    pages: PageFeed<I>,
    pending: HashMap<PageNum, Processor>,
    buffered: HashMap<PageNum, Vec<u8>>,
    bytes_buffered: usize,
    max_buffer_size: usize,
    queue: VecDeque<WalkEvent>,
    finished_pages: bool,
}

impl<I: Iterator<Item = Vec<u8>>> Walker<I> {
    pub fn new(pages: PageFeed<I>, max_buffer_size: usize) -> Self {
        let first_freelist_trunk = pages.header.first_freelist_trunk;
        let mut walker = Walker {
            pages,
            pending: HashMap::new(),
            buffered: HashMap::new(),
            bytes_buffered: 0,
            max_buffer_size,
            queue: VecDeque::new(),
            finished_pages: false,
        };
        walker
            .schedule(
                schema::SCHEMA_BTREE_ROOT_PAGENUM,
                Processor::Table(Rc::new(TableContext::schema())),
            )
            .expect("scheduling the initial root page cannot itself exceed the buffer budget");
        if first_freelist_trunk != 0 {
            walker
                .schedule(first_freelist_trunk, Processor::FreelistTrunk)
                .expect("scheduling the initial freelist trunk cannot itself exceed the buffer budget");
        }
        walker
    }

    fn next_event(&mut self) -> Result<Option<WalkEvent>, Error> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Ok(Some(event));
            }
            if self.finished_pages {
                return Ok(None);
            }
            match self.pages.next() {
                Some(Ok((page_number, bytes))) => self.arrival(page_number, bytes)?,
                Some(Err(e)) => {
                    self.finished_pages = true;
                    return Err(e);
                }
                None => {
                    self.finished_pages = true;
                    self.pages.finish()?;
                    self.finish_check()?;
                }
            }
        }
    }

    fn finish_check(&self) -> Result<(), Error> {
        if let Some(&page) = self.pending.keys().next() {
            return Err(Error::UnreconciledPage(page));
        }
        if let Some(&page) = self.buffered.keys().next() {
            return Err(Error::UnreconciledPage(page));
        }
        Ok(())
    }

    /// A page has been read off the input. Either the work to process it was
    /// already scheduled (process it now), or it hasn't been scheduled yet
    /// (hold onto its bytes until it is).
    fn arrival(&mut self, page_number: PageNum, bytes: Vec<u8>) -> Result<(), Error> {
        if let Some(processor) = self.pending.remove(&page_number) {
            log::trace!("page {page_number} arrived with work already scheduled");
            self.process_page(page_number, bytes, processor)
        } else {
            log::trace!("page {page_number} arrived with no work scheduled yet; buffering");
            self.charge(bytes.len())?;
            self.buffered.insert(page_number, bytes);
            Ok(())
        }
    }

    /// Work has been scheduled for `page`. Either its bytes already arrived
    /// (process it now), or they haven't (register it as pending).
    fn schedule(&mut self, page: PageNum, processor: Processor) -> Result<(), Error> {
        if let Some(bytes) = self.buffered.remove(&page) {
            self.release(bytes.len());
            log::trace!("page {page} scheduled; bytes were already buffered");
            self.process_page(page, bytes, processor)
        } else {
            self.pending.insert(page, processor);
            Ok(())
        }
    }

    /// Adds `n` bytes to the buffer-budget counter, failing if doing so
    /// would exceed `max_buffer_size`. Used both for pages held in
    /// `buffered` and for bytes accumulating in an in-flight overflow
    /// `Assembly`, per the combined budget invariant.
    fn charge(&mut self, n: usize) -> Result<(), Error> {
        let new_total = self.bytes_buffered + n;
        if new_total > self.max_buffer_size {
            return Err(Error::BudgetExceeded {
                buffered: new_total,
                budget: self.max_buffer_size,
            });
        }
        self.bytes_buffered = new_total;
        Ok(())
    }

    fn release(&mut self, n: usize) {
        self.bytes_buffered -= n;
    }

    fn process_page(
        &mut self,
        page_number: PageNum,
        bytes: Vec<u8>,
        processor: Processor,
    ) -> Result<(), Error> {
        match processor {
            Processor::Overflow { mut assembly, finisher } => {
                let (added, next) = assembly.feed(page_number, &bytes)?;
                self.charge(added)?;
                match next {
                    Some(next) => self.schedule(
                        next,
                        Processor::Overflow { assembly, finisher },
                    ),
                    None => {
                        let payload = assembly.into_payload();
                        self.release(payload.len());
                        match finisher {
                            OverflowFinisher::TableRow { table, row_id } => {
                                self.handle_table_row(&table, row_id, payload)
                            }
                            OverflowFinisher::Discard => Ok(()),
                        }
                    }
                }
            }
            Processor::FreelistTrunk => self.process_freelist_trunk(&bytes),
            Processor::FreelistLeaf => Ok(()),
            Processor::Table(ctx) => self.process_table_page(page_number, &bytes, ctx),
            Processor::Index => self.process_index_page(page_number, &bytes),
        }
    }

    fn base_offset(&self, page_number: PageNum) -> usize {
        if page_number == 1 {
            header::HEADER_BYTES
        } else {
            0
        }
    }

    fn process_table_page(
        &mut self,
        page_number: PageNum,
        bytes: &[u8],
        ctx: Rc<TableContext>,
    ) -> Result<(), Error> {
        let base = self.base_offset(page_number);
        let page_size = self.pages.header.page_size as usize;
        let btree_header = BtreeHeader::parse(bytes, base, page_number)?;
        let starts = btree_page::cell_starts(bytes, base, &btree_header);

        match btree_header.kind {
            PageKind::TableLeaf => {
                for start in starts {
                    let cell = &bytes[start..];
                    let (payload_len, n1) = varint::read_varint(cell);
                    let (row_id, n2) = varint::read_varint(&cell[n1..]);
                    let offset = n1 + n2;
                    let payload_len = payload_len as usize;
                    let local_len = overflow::local_payload_size(page_size, payload_len, true);

                    if local_len == payload_len {
                        self.handle_table_row(
                            &ctx,
                            row_id,
                            cell[offset..offset + local_len].to_vec(),
                        )?;
                    } else {
                        let initial = &cell[offset..offset + local_len];
                        self.charge(initial.len())?;
                        let overflow_page = read_u32(cell, offset + local_len);
                        let assembly = overflow::Assembly::new(initial, payload_len);
                        self.schedule(
                            overflow_page,
                            Processor::Overflow {
                                assembly,
                                finisher: OverflowFinisher::TableRow {
                                    table: ctx.clone(),
                                    row_id,
                                },
                            },
                        )?;
                    }
                }
                Ok(())
            }
            PageKind::TableInterior => {
                for start in starts {
                    let cell = &bytes[start..];
                    let child = read_u32(cell, 0);
                    self.schedule(child, Processor::Table(ctx.clone()))?;
                }
                if let Some(rightmost) = btree_header.rightmost_pointer {
                    self.schedule(rightmost, Processor::Table(ctx))?;
                }
                Ok(())
            }
            PageKind::IndexInterior | PageKind::IndexLeaf => Err(Error::InvalidPageType(
                page_number,
                btree_header.type_byte,
            )),
        }
    }

    fn process_index_page(&mut self, page_number: PageNum, bytes: &[u8]) -> Result<(), Error> {
        let base = self.base_offset(page_number);
        let page_size = self.pages.header.page_size as usize;
        let btree_header = BtreeHeader::parse(bytes, base, page_number)?;
        let starts = btree_page::cell_starts(bytes, base, &btree_header);

        match btree_header.kind {
            PageKind::IndexLeaf => {
                for start in starts {
                    let cell = &bytes[start..];
                    self.schedule_index_payload(cell, 0, page_size)?;
                }
                Ok(())
            }
            PageKind::IndexInterior => {
                for start in starts {
                    let cell = &bytes[start..];
                    let child = read_u32(cell, 0);
                    self.schedule(child, Processor::Index)?;
                    self.schedule_index_payload(cell, 4, page_size)?;
                }
                if let Some(rightmost) = btree_header.rightmost_pointer {
                    self.schedule(rightmost, Processor::Index)?;
                }
                Ok(())
            }
            PageKind::TableInterior | PageKind::TableLeaf => Err(Error::InvalidPageType(
                page_number,
                btree_header.type_byte,
            )),
        }
    }

    /// Schedules the overflow chain (if any) of an index cell's payload,
    /// starting at `offset` within `cell`. Index payloads are walked but
    /// never surfaced.
    fn schedule_index_payload(
        &mut self,
        cell: &[u8],
        offset: usize,
        page_size: usize,
    ) -> Result<(), Error> {
        let rest = &cell[offset..];
        let (payload_len, n1) = varint::read_varint(rest);
        let payload_len = payload_len as usize;
        let local_len = overflow::local_payload_size(page_size, payload_len, false);
        if local_len != payload_len {
            let initial = &rest[n1..n1 + local_len];
            self.charge(initial.len())?;
            let overflow_page = read_u32(rest, n1 + local_len);
            let assembly = overflow::Assembly::new(initial, payload_len);
            self.schedule(
                overflow_page,
                Processor::Overflow {
                    assembly,
                    finisher: OverflowFinisher::Discard,
                },
            )?;
        }
        Ok(())
    }

    fn process_freelist_trunk(&mut self, bytes: &[u8]) -> Result<(), Error> {
        let next_trunk = read_u32(bytes, 0);
        let num_leaves = read_u32(bytes, 4);
        for i in 0..num_leaves {
            let leaf = read_u32(bytes, 8 + i as usize * 4);
            self.schedule(leaf, Processor::FreelistLeaf)?;
        }
        if next_trunk != 0 {
            self.schedule(next_trunk, Processor::FreelistTrunk)?;
        }
        Ok(())
    }

    fn handle_table_row(
        &mut self,
        table: &Rc<TableContext>,
        row_id: i64,
        payload: Vec<u8>,
    ) -> Result<(), Error> {
        match table.role {
            Role::Schema => {
                let values = record::decode_row(&payload, row_id, None)?;
                match schema::interpret_row(&values)? {
                    schema::Action::ScheduleTable(root, ctx) => {
                        self.queue.push_back(WalkEvent::TableStart { table: ctx.clone() });
                        self.schedule(root, Processor::Table(ctx))
                    }
                    schema::Action::ScheduleIndex(root) => self.schedule(root, Processor::Index),
                    schema::Action::Ignore => Ok(()),
                }
            }
            Role::User => {
                let values = record::decode_row(&payload, row_id, table.rowid_alias_index)?;
                self.queue.push_back(WalkEvent::Row {
                    table: table.clone(),
                    row_id,
                    values,
                });
                Ok(())
            }
        }
    }
}

fn read_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes(buf[offset..offset + 4].try_into().unwrap())
}

impl<I: Iterator<Item = Vec<u8>>> Iterator for Walker<I> {
    type Item = Result<WalkEvent, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_event() {
            Ok(Some(event)) => Some(Ok(event)),
            Ok(None) => None,
            Err(e) => Some(Err(e)),
        }
    }
}
