//! Itinerary day numbering for daily pages.
//!
//! A daily page's `day_index`, once stamped, is authoritative. Unstamped
//! daily pages fall back to their position among the daily pages.

use crate::model::Page;

/// The itinerary day rendered by `pages[index]`.
///
/// `None` for non-daily pages and out-of-range indices.
pub fn derive_day_index(pages: &[Page], index: usize) -> Option<usize> {
    let page = pages.get(index)?;
    if !page.template_key.is_daily() {
        return None;
    }
    page.day_index.or_else(|| {
        Some(
            pages[..index]
                .iter()
                .filter(|p| p.template_key.is_daily())
                .count(),
        )
    })
}

/// Stamp every unstamped daily page with its positional day index.
///
/// Stamped pages keep their value but still count toward the position of
/// later pages. Returns how many pages were stamped.
pub fn backfill_day_indices(pages: &mut [Page]) -> usize {
    let mut position = 0;
    let mut stamped = 0;
    for page in pages.iter_mut().filter(|p| p.template_key.is_daily()) {
        if page.day_index.is_none() {
            page.day_index = Some(position);
            stamped += 1;
        }
        position += 1;
    }
    stamped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::PageId;
    use crate::model::TemplateKey;

    fn page(key: TemplateKey, day: Option<usize>) -> Page {
        let mut p = Page::new(PageId::mint(key.as_str()), "p", key, 10.0, 10.0);
        p.day_index = day;
        p
    }

    #[test]
    fn positional_fallback_counts_preceding_daily_pages() {
        let pages = vec![
            page(TemplateKey::Cover, None),
            page(TemplateKey::Daily, None),
            page(TemplateKey::Memo, None),
            page(TemplateKey::Daily, None),
        ];
        assert_eq!(derive_day_index(&pages, 0), None);
        assert_eq!(derive_day_index(&pages, 1), Some(0));
        assert_eq!(derive_day_index(&pages, 3), Some(1));
        assert_eq!(derive_day_index(&pages, 9), None);
    }

    #[test]
    fn explicit_stamp_wins_over_position() {
        let pages = vec![page(TemplateKey::Daily, Some(4)), page(TemplateKey::Daily, None)];
        assert_eq!(derive_day_index(&pages, 0), Some(4));
        assert_eq!(derive_day_index(&pages, 1), Some(1));
    }

    #[test]
    fn backfill_only_touches_unstamped_pages() {
        let mut pages = vec![
            page(TemplateKey::Cover, None),
            page(TemplateKey::Daily, Some(2)),
            page(TemplateKey::Daily, None),
            page(TemplateKey::Toc, None),
            page(TemplateKey::Daily, None),
        ];
        assert_eq!(backfill_day_indices(&mut pages), 2);
        let days: Vec<_> = pages.iter().map(|p| p.day_index).collect();
        assert_eq!(days, vec![None, Some(2), Some(1), None, Some(2)]);
        assert_eq!(backfill_day_indices(&mut pages), 0);
    }
}
