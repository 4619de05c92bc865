//! Alignment arithmetic and range validation shared by both backends.

use crate::errors::{MmapPagesError, RangeFault, Result};
use crate::platform::{Native, Platform};

/// Get the granularity that page offsets are aligned to, in bytes.
///
/// This is the page size on POSIX systems and the allocation granularity on
/// Windows. Callers do not need it to use the crate; it is exposed for
/// diagnostics and tests.
#[must_use]
pub fn page_size() -> usize {
    Native::allocation_granularity()
}

/// Align a value up to the nearest multiple of `alignment`.
///
/// Returns `None` if the result would not fit in a `u64`.
#[must_use]
pub fn align_up(value: u64, alignment: u64) -> Option<u64> {
    if alignment <= 1 {
        return Some(value);
    }
    // Fast path for power-of-2 alignments (common case for page sizes)
    if alignment.is_power_of_two() {
        let mask = alignment - 1;
        value.checked_add(mask).map(|v| v & !mask)
    } else {
        value.div_ceil(alignment).checked_mul(alignment)
    }
}

/// A page request after granularity correction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlignedSpan {
    /// Absolute file offset of the native view; a multiple of the granularity.
    pub offset: u64,
    /// Length of the native view.
    pub len: usize,
    /// Distance from `offset` to the first requested byte.
    pub shift: usize,
}

/// Split an absolute `[absolute, absolute + size)` request into a
/// granularity-aligned span.
///
/// A granularity of 0 is treated as 1 (no alignment).
///
/// # Errors
///
/// Returns `MmapPagesError::RangeInvalid` with `RangeFault::Overflow` when
/// widening the span by the alignment shift would overflow `usize`.
pub fn align_span(absolute: usize, size: usize, granularity: usize) -> Result<AlignedSpan> {
    let shift = if granularity > 1 { absolute % granularity } else { 0 };
    if shift >= usize::MAX - size {
        return Err(MmapPagesError::range(absolute, size, usize::MAX, RangeFault::Overflow));
    }
    let span = AlignedSpan {
        offset: (absolute - shift) as u64,
        len: size + shift,
        shift,
    };
    log::trace!(
        "aligned [{absolute}, +{size}) to [{}, +{}) shift={shift} granularity={granularity}",
        span.offset,
        span.len
    );
    Ok(span)
}

/// Ensure `[offset, offset + len)` is a non-empty range inside `[0, total)`.
///
/// # Errors
///
/// Returns `MmapPagesError::RangeInvalid` with `ZeroLength` or `OutOfWindow`.
pub fn ensure_in_window(offset: usize, len: usize, total: usize) -> Result<()> {
    if len == 0 {
        return Err(MmapPagesError::range(offset, len, total, RangeFault::ZeroLength));
    }
    if offset > total || len > total - offset {
        return Err(MmapPagesError::range(offset, len, total, RangeFault::OutOfWindow));
    }
    Ok(())
}
