//! Page/size slicing over ordered listings.

use serde::{Deserialize, Serialize};

use crate::errors::VersioningError;

#[cfg(test)]
#[path = "pagination_tests.rs"]
mod tests;

/// Page size used when the caller does not ask for one
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Largest page size accepted by [`PageRequest::new`]
pub const MAX_PAGE_SIZE: usize = 1000;

/// A zero-based page of a fixed size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    page: usize,
    size: usize,
}

impl PageRequest {
    /// Create a page request bounded by [`MAX_PAGE_SIZE`]
    pub fn new(page: usize, size: usize) -> Result<Self, VersioningError> {
        Self::with_limit(page, size, MAX_PAGE_SIZE)
    }

    /// Create a page request with a caller-chosen size limit
    ///
    /// # Errors
    /// Returns `VersioningError::InvalidArgument` if `size` is zero or
    /// larger than `max_size`
    pub fn with_limit(page: usize, size: usize, max_size: usize) -> Result<Self, VersioningError> {
        if size == 0 {
            return Err(VersioningError::invalid_argument(
                "size",
                "page size must be at least 1",
            ));
        }

        if size > max_size {
            return Err(VersioningError::invalid_argument(
                "size",
                format!("page size {} exceeds the maximum of {}", size, max_size),
            ));
        }

        Ok(Self { page, size })
    }

    /// The first page with the default size
    pub fn first() -> Self {
        Self {
            page: 0,
            size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Zero-based page number
    pub fn page(&self) -> usize {
        self.page
    }

    /// Page size
    pub fn size(&self) -> usize {
        self.size
    }

    /// Position of the first element of this page, `None` on overflow
    pub fn offset(&self) -> Option<usize> {
        self.page.checked_mul(self.size)
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self::first()
    }
}

/// One page of an ordered listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    /// Elements at positions `[page * size, page * size + size)`
    pub items: Vec<T>,

    /// Zero-based page number
    pub number: usize,

    /// Requested page size
    pub size: usize,

    /// Number of elements in the complete listing
    pub total_elements: usize,

    /// Number of pages in the complete listing
    pub total_pages: usize,
}

impl<T> Page<T> {
    /// Cut the requested page out of an ordered sequence of `total` elements.
    ///
    /// Only the elements of the requested page are pulled from `ordered`.
    pub fn slice<I>(request: PageRequest, total: usize, ordered: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        let items = match request.offset() {
            Some(offset) if offset < total => ordered
                .into_iter()
                .skip(offset)
                .take(request.size())
                .collect(),
            _ => Vec::new(),
        };

        Self {
            items,
            number: request.page(),
            size: request.size(),
            total_elements: total,
            total_pages: total.div_ceil(request.size()),
        }
    }

    /// Map the elements of the page, keeping the paging metadata
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }

    /// Whether the page holds no elements
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
