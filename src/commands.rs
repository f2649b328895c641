use crate::fields::{Address, Page};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One contiguous register read: `count` registers from `start` in `page`.
///
/// The transport answers with `2 * count` bytes in protocol byte order.
#[derive(Serialize, Deserialize, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Copy, Clone)]
pub struct QueryRangeCommand {
    page: Page,
    start: Address,
    count: u16,
}

impl QueryRangeCommand {
    pub const fn new(page: Page, start: Address, count: u16) -> Self {
        Self { page, start, count }
    }

    pub const fn page(&self) -> Page {
        self.page
    }

    pub const fn start(&self) -> Address {
        self.start
    }

    pub const fn count(&self) -> u16 {
        self.count
    }

    /// Exclusive end register. Widened so `start + count` cannot wrap.
    pub const fn end(&self) -> u32 {
        self.start as u32 + self.count as u32
    }

    pub const fn byte_len(&self) -> usize {
        self.count as usize * 2
    }

    /// Whether `registers` registers at `address` in `page` all fall inside this range.
    pub const fn covers(&self, page: Page, address: Address, registers: u16) -> bool {
        page == self.page && address >= self.start && address as u32 + registers as u32 <= self.end()
    }
}

impl fmt::Display for QueryRangeCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "page {:#04x} registers {:#04x}..{:#04x}",
            self.page,
            self.start,
            self.end()
        )
    }
}
