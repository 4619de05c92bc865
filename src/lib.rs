//! # mmap-pages: two-tier memory-mapped file access for Rust
//!
//! This crate opens a byte window ("mapping") over a file once, then maps
//! granularity-aligned views ("pages") of that window on demand. The same
//! logical behavior is produced on POSIX (`mmap`) and on Windows (a
//! file-mapping object plus `MapViewOfFile`).
//!
//! ## Features
//!
//! - **Alignment handled for you**: request any offset; the page hides the
//!   distance to the page-size / allocation-granularity boundary
//! - **Overflow-safe arithmetic**: out-of-window, empty and wrapping requests
//!   are errors, never undefined behavior
//! - **Release order enforced**: pages borrow their mapping, so they are
//!   always unmapped before the file handles close
//! - **Inheritance control**: handles are close-on-exec / non-inheritable
//!   unless the `q` (bequeath) flag is given, atomically at open
//! - **Filename encodings**: narrow, UTF-8 and UTF-16 names
//!
//! ## Quick Start
//!
//! ```no_run
//! use mmap_pages::{acquire, open};
//!
//! // Map bytes 4096.. of a file read-only, to the end of the file.
//! let mapping = open("data.bin", "re", 0, 4096)?;
//!
//! // Map 100 bytes starting 950 bytes into the window.
//! let page = acquire(&mapping, 100, 950)?;
//! assert_eq!(page.len(), 100);
//! println!("{:02x?}", page.as_slice());
//! # Ok::<(), mmap_pages::MmapPagesError>(())
//! ```
//!
//! ## Mode strings
//!
//! `r` read, `w` read+write, `e` extend to end of file, `p` private
//! (copy-on-write), `q` bequeath handles to child processes. See [`mode`].
//!
//! ## Modules
//!
//! - [`errors`]: Error types for all operations
//! - [`mode`]: Mode string parsing
//! - [`filename`]: Filename resolution and UTF-8/UTF-16 transcoding
//! - [`mapping`]: The `Mapping` window and its builder
//! - [`page`]: Pages acquired from a mapping
//! - [`utils`]: Alignment arithmetic
//! - [`manager`]: Open functions taking mode strings
//!
//! ## Feature Flags
//!
//! - `advise` (default): access-pattern hints on pages
//! - `iterator` (default): iterate a mapping as pages
//! - `locking`: lock page memory
//! - `async`: Tokio-based helpers

#![cfg_attr(not(test), deny(clippy::unwrap_used))]
#![deny(missing_docs)]
#![doc(html_root_url = "https://docs.rs/mmap-pages")]

pub mod errors;
pub mod filename;
pub mod manager;
pub mod mapping;
pub mod mode;
pub mod page;
mod platform;
pub mod utils;

#[cfg(feature = "advise")]
pub mod advise;
#[cfg(feature = "iterator")]
pub mod iterator;
#[cfg(feature = "locking")]
mod lock;

pub use errors::{EncodingFault, MmapPagesError, RangeFault};
pub use filename::{utf16_to_utf8, utf8_to_utf16, NativePath};
pub use manager::{acquire, open, open_utf8, open_wide};
pub use mapping::{Mapping, MappingBuilder};
pub use mode::{Access, ModeTag};
pub use page::Page;
pub use platform::{check_bequeath_stop, current_os, Os};
pub use utils::page_size;

#[cfg(feature = "advise")]
pub use advise::MmapAdvice;
#[cfg(feature = "iterator")]
pub use iterator::{ChunkIterator, PageIterator};
