//! Query-string pagination shared by every list endpoint.

use agora_core::page::{DEFAULT_PAGE_SIZE, Page};
use serde::Deserialize;

use crate::error::ApiError;

/// `?page=<n>&page_size=<n>`; both optional.
#[derive(Debug, Default, Deserialize)]
pub struct PageParams {
  pub page:      Option<u32>,
  pub page_size: Option<u32>,
}

impl PageParams {
  pub fn page(&self) -> Result<Page, ApiError> {
    to_page(self.page, self.page_size)
  }
}

/// Validate raw pagination values, filling in defaults.
pub fn to_page(page: Option<u32>, page_size: Option<u32>) -> Result<Page, ApiError> {
  Ok(Page::new(
    page.unwrap_or(1),
    page_size.unwrap_or(DEFAULT_PAGE_SIZE),
  )?)
}
