use crate::catalog_store::Page;
use crate::error::{ServiceError, ServiceResult};
use serde::Serialize;

pub const DEFAULT_PAGE_SIZE: u32 = 20;
pub const MAX_PAGE_SIZE: u32 = 100;

/// Number of pages needed for `total_count` items.
pub fn total_pages(total_count: u64, page_size: u32) -> u64 {
    if page_size == 0 {
        return 0;
    }
    total_count.div_ceil(page_size as u64)
}

/// Turns optional `page`/`pageSize` query values into a page request.
/// Neither given means the listing is not paged.
pub fn page_from_query(page: Option<u32>, page_size: Option<u32>) -> ServiceResult<Option<Page>> {
    if page.is_none() && page_size.is_none() {
        return Ok(None);
    }
    let page = page.unwrap_or(1);
    let page_size = page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if page == 0 {
        return Err(ServiceError::BadRequest("page starts at 1".to_string()));
    }
    if page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ServiceError::BadRequest(format!(
            "pageSize must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }
    Ok(Some(Page { page, page_size }))
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PageMeta {
    pub unpaged: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
    pub total_count: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_pages: Option<u64>,
}

impl PageMeta {
    pub fn new(page: Option<Page>, total_count: u64) -> Self {
        match page {
            Some(page) => PageMeta {
                unpaged: false,
                page: Some(page.page),
                page_size: Some(page.page_size),
                total_count,
                total_pages: Some(total_pages(total_count, page.page_size)),
            },
            None => PageMeta {
                unpaged: true,
                page: None,
                page_size: None,
                total_count,
                total_pages: None,
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Paginated<T> {
    pub items: Vec<T>,
    pub meta: PageMeta,
}

impl<T> Paginated<T> {
    pub fn empty(page: Option<Page>) -> Self {
        Paginated {
            items: vec![],
            meta: PageMeta::new(page, 0),
        }
    }
}
