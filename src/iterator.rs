//! Iterator-based access: walk a mapping's window as successive pages.

use crate::errors::Result;
use crate::mapping::Mapping;
use crate::page::Page;
use crate::utils::page_size;

/// Iterator over fixed-size pages covering a mapping's window.
///
/// Each item is a freshly acquired [`Page`]; the last one may be shorter.
///
/// # Examples
///
/// ```no_run
/// use mmap_pages::Mapping;
///
/// let mapping = Mapping::builder("data.bin").mode_str("re")?.open()?;
///
/// // Iterate over 64KB pages
/// for page in mapping.chunks(64 * 1024) {
///     let page = page?;
///     println!("page at {}: {} bytes", page.offset(), page.len());
/// }
/// # Ok::<(), mmap_pages::MmapPagesError>(())
/// ```
pub struct ChunkIterator<'a> {
    mapping: &'a Mapping,
    chunk_size: usize,
    current_offset: usize,
    total_len: usize,
}

impl<'a> ChunkIterator<'a> {
    pub(crate) fn new(mapping: &'a Mapping, chunk_size: usize) -> Self {
        Self {
            mapping,
            chunk_size,
            current_offset: 0,
            total_len: mapping.len(),
        }
    }
}

impl<'a> Iterator for ChunkIterator<'a> {
    type Item = Result<Page<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_offset >= self.total_len {
            return None;
        }

        let remaining = self.total_len - self.current_offset;
        let chunk_len = remaining.min(self.chunk_size);

        match self.mapping.acquire(chunk_len, self.current_offset) {
            Ok(page) => {
                self.current_offset += chunk_len;
                Some(Ok(page))
            }
            Err(e) => {
                // Stop after the first failure; retrying the same range would fail again.
                self.current_offset = self.total_len;
                Some(Err(e))
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.chunk_size == 0 {
            let n = usize::from(self.current_offset < self.total_len);
            return (n, Some(n));
        }
        let remaining = self.total_len.saturating_sub(self.current_offset);
        let chunks = remaining.div_ceil(self.chunk_size);
        (chunks, Some(chunks))
    }
}

impl<'a> ExactSizeIterator for ChunkIterator<'a> {}

/// Iterator over granularity-sized pages of a mapping.
///
/// The first page is shorter when the window does not start on a
/// granularity boundary, so every later page starts on one.
pub struct PageIterator<'a> {
    head: Option<usize>,
    inner: ChunkIterator<'a>,
}

impl<'a> PageIterator<'a> {
    pub(crate) fn new(mapping: &'a Mapping) -> Self {
        let ps = page_size().max(1);
        let lead = mapping.offset() % ps;
        let head = if lead == 0 {
            None
        } else {
            Some((ps - lead).min(mapping.len()))
        };
        let mut inner = ChunkIterator::new(mapping, ps);
        if let Some(head_len) = head {
            inner.current_offset = head_len;
        }
        Self { head, inner }
    }
}

impl<'a> Iterator for PageIterator<'a> {
    type Item = Result<Page<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(head_len) = self.head.take() {
            return Some(self.inner.mapping.acquire(head_len, 0));
        }
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (n, _) = self.inner.size_hint();
        let n = n + usize::from(self.head.is_some());
        (n, Some(n))
    }
}

impl<'a> ExactSizeIterator for PageIterator<'a> {}

impl Mapping {
    /// Iterate the window as pages of `chunk_size` bytes.
    ///
    /// A `chunk_size` of zero yields a single `RangeInvalid` error.
    pub fn chunks(&self, chunk_size: usize) -> ChunkIterator<'_> {
        ChunkIterator::new(self, chunk_size)
    }

    /// Iterate the window as granularity-aligned pages.
    pub fn pages(&self) -> PageIterator<'_> {
        PageIterator::new(self)
    }
}
