//! Crate-level error type. Each variant corresponds to one of the fatal
//! conditions a streaming decode can hit; there is no recoverable-error path,
//! since a single malformed page invalidates the rest of the one-pass walk.

use crate::PageNum;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("malformed database header: {0}")]
    MalformedHeader(String),

    #[error("unexpected end of input: needed {expected} more byte(s)")]
    UnexpectedEndOfStream { expected: usize },

    #[error("input continued after the last page declared by the header")]
    ExtraBytes,

    #[error("buffering page data would exceed the configured budget ({buffered} > {budget} bytes)")]
    BudgetExceeded { buffered: usize, budget: usize },

    #[error("page {0} was never reconciled with a scheduled reader")]
    UnreconciledPage(PageNum),

    #[error("page {0} has an unexpected b-tree page type byte {1:#04x}")]
    InvalidPageType(PageNum, u8),

    #[error("page {0} has a non-zero freeblock pointer, which this decoder does not support")]
    UnexpectedFreeblock(PageNum),

    #[error(transparent)]
    Schema(#[from] crate::schema::Error),

    #[error(transparent)]
    Value(#[from] crate::serial_type::Error),
}
