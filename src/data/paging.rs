use std::ops::Range;

// ---------------------------------------------------------------------------
// Read-side pagination over the dataset
// ---------------------------------------------------------------------------

/// Number of pages needed for `len` rows. An empty dataset still has one
/// (empty) page so a page index of 0 is always valid.
pub fn page_count(len: usize, page_size: usize) -> usize {
    if page_size == 0 {
        return 1;
    }
    len.div_ceil(page_size).max(1)
}

/// Row range shown on `page`: `[page * size, min((page + 1) * size, len))`.
/// Pages past the end yield an empty range.
pub fn page_range(len: usize, page_size: usize, page: usize) -> Range<usize> {
    let start = page.saturating_mul(page_size).min(len);
    let end = page.saturating_add(1).saturating_mul(page_size).min(len);
    start..end
}

/// Pull a page index back inside the dataset after rows were removed.
pub fn clamp_page(len: usize, page_size: usize, page: usize) -> usize {
    page.min(page_count(len, page_size) - 1)
}
