use super::types::Page;

/// Drops the first `page.start()` items and keeps at most `page.limit`. A start past
/// the end yields an empty result.
#[must_use]
pub fn paginate<T>(items: Vec<T>, page: &Page) -> Vec<T> {
    let start = page.start();
    if start >= items.len() {
        return Vec::new();
    }
    let limit = page.limit.unwrap_or(usize::MAX);
    items.into_iter().skip(start).take(limit).collect()
}
