//! 1-indexed page/page-size pagination shared by every list operation.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
  pub page:      u32,
  pub page_size: u32,
}

impl Default for Page {
  fn default() -> Self { Self { page: 1, page_size: DEFAULT_PAGE_SIZE } }
}

impl Page {
  /// Build a validated page. `page` starts at 1.
  pub fn new(page: u32, page_size: u32) -> Result<Self> {
    if page == 0 {
      return Err(Error::validation("page must be at least 1"));
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
      return Err(Error::validation(format!(
        "page_size must be between 1 and {MAX_PAGE_SIZE}"
      )));
    }
    Ok(Self { page, page_size })
  }

  pub fn limit(&self) -> i64 { i64::from(self.page_size) }

  /// Rows to skip: `(page - 1) * page_size`.
  pub fn offset(&self) -> i64 {
    i64::from(self.page.saturating_sub(1)) * i64::from(self.page_size)
  }
}
