//! Dual-page (spread) preview.
//!
//! The cover stands alone as the first spread; the remaining pages pair up
//! as `(1, 2), (3, 4), ...` with a trailing single page when the count is
//! even. The preview only navigates: picking a page returns to single-page
//! mode with that page selected. Any edit, selection change or page list
//! change also ends the preview, so its focus never outlives the layout it
//! was computed on.

use crate::bridge::{SceneBridge, TemplateGenerator};
use crate::pages::{PageError, PageManager};
use pd_core::Page;
use smallvec::SmallVec;

/// How the editor is presenting the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViewMode {
    #[default]
    Single,
    /// Read-only spread preview; `focused` is a page index.
    Spread { focused: usize },
}

/// One or two facing pages, by page index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spread {
    pub pages: SmallVec<[usize; 2]>,
}

impl Spread {
    pub fn left(&self) -> usize {
        self.pages[0]
    }

    pub fn right(&self) -> Option<usize> {
        self.pages.get(1).copied()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.pages.contains(&index)
    }
}

/// Position of the spread holding `index`.
fn spread_position(index: usize) -> usize {
    index.div_ceil(2)
}

fn spread_at(position: usize, len: usize) -> Option<Spread> {
    if position == 0 {
        return (len > 0).then(|| Spread { pages: SmallVec::from_slice(&[0]) });
    }
    let left = position * 2 - 1;
    if left >= len {
        return None;
    }
    let mut pages = SmallVec::new();
    pages.push(left);
    if left + 1 < len {
        pages.push(left + 1);
    }
    Some(Spread { pages })
}

/// A spread layout over a page list with one focused page.
#[derive(Debug, Clone, Copy)]
pub struct SpreadView<'a> {
    pages: &'a [Page],
    focused: usize,
}

impl<'a> SpreadView<'a> {
    /// `focused` is clamped to the last page.
    pub fn new(pages: &'a [Page], focused: usize) -> Self {
        Self {
            pages,
            focused: focused.min(pages.len().saturating_sub(1)),
        }
    }

    pub fn focused(&self) -> usize {
        self.focused
    }

    pub fn page(&self, index: usize) -> Option<&'a Page> {
        self.pages.get(index)
    }

    pub fn spreads(&self) -> Vec<Spread> {
        (0..)
            .map_while(|position| spread_at(position, self.pages.len()))
            .collect()
    }

    pub fn focused_spread(&self) -> Option<Spread> {
        spread_at(spread_position(self.focused), self.pages.len())
    }

    /// Focus the first page of the next spread. `false` at the end.
    pub fn next(&mut self) -> bool {
        match spread_at(spread_position(self.focused) + 1, self.pages.len()) {
            Some(spread) => {
                self.focused = spread.left();
                true
            }
            None => false,
        }
    }

    /// Focus the first page of the previous spread. `false` at the cover.
    pub fn previous(&mut self) -> bool {
        let position = spread_position(self.focused);
        if position == 0 || self.pages.is_empty() {
            return false;
        }
        match spread_at(position - 1, self.pages.len()) {
            Some(spread) => {
                self.focused = spread.left();
                true
            }
            None => false,
        }
    }
}

impl<B: SceneBridge, G: TemplateGenerator> PageManager<B, G> {
    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    /// Switch to the spread preview focused on the selected page.
    ///
    /// The live scene is flushed first so the preview shows current edits.
    pub fn enter_spread_mode(&mut self) -> SpreadView<'_> {
        if let Some(page) = self.pages.get_mut(self.current) {
            page.fabric_data = Some(self.bridge.export_scene());
        }
        self.view_mode = ViewMode::Spread { focused: self.current };
        log::debug!("spread preview at page {}", self.current);
        SpreadView::new(&self.pages, self.current)
    }

    /// The spread preview, if it is showing.
    pub fn spread_view(&self) -> Option<SpreadView<'_>> {
        match self.view_mode {
            ViewMode::Spread { focused } => Some(SpreadView::new(&self.pages, focused)),
            ViewMode::Single => None,
        }
    }

    pub fn next_spread(&mut self) -> bool {
        self.move_spread_focus(|view| view.next())
    }

    pub fn previous_spread(&mut self) -> bool {
        self.move_spread_focus(|view| view.previous())
    }

    /// Leave the preview without changing the selection.
    pub fn exit_spread_mode(&mut self) {
        self.view_mode = ViewMode::Single;
    }

    /// Drop back to single-page mode before the document changes.
    pub(crate) fn end_preview(&mut self) {
        if let ViewMode::Spread { focused } = self.view_mode {
            log::debug!("spread preview at page {focused} closed");
            self.view_mode = ViewMode::Single;
        }
    }

    /// Leave the preview and select `index` for editing.
    pub fn select_from_spread(&mut self, index: usize) -> Result<usize, PageError> {
        self.check_index(index)?;
        self.view_mode = ViewMode::Single;
        self.select_page(index)
    }

    fn move_spread_focus(&mut self, step: impl FnOnce(&mut SpreadView<'_>) -> bool) -> bool {
        let ViewMode::Spread { focused } = self.view_mode else {
            return false;
        };
        let mut view = SpreadView::new(&self.pages, focused);
        if !step(&mut view) {
            return false;
        }
        self.view_mode = ViewMode::Spread { focused: view.focused() };
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::{PageId, TemplateKey};

    fn pages(n: usize) -> Vec<Page> {
        (0..n)
            .map(|i| Page::new(PageId::mint("spread"), format!("p{i}"), TemplateKey::Blank, 10.0, 10.0))
            .collect()
    }

    fn layout(n: usize) -> Vec<Vec<usize>> {
        let pages = pages(n);
        SpreadView::new(&pages, 0)
            .spreads()
            .into_iter()
            .map(|s| s.pages.to_vec())
            .collect()
    }

    #[test]
    fn cover_stands_alone() {
        assert_eq!(layout(0), Vec::<Vec<usize>>::new());
        assert_eq!(layout(1), vec![vec![0]]);
        assert_eq!(layout(3), vec![vec![0], vec![1, 2]]);
        assert_eq!(layout(4), vec![vec![0], vec![1, 2], vec![3]]);
    }

    #[test]
    fn focused_spread_contains_focus() {
        let pages = pages(6);
        for i in 0..6 {
            let view = SpreadView::new(&pages, i);
            assert!(view.focused_spread().unwrap().contains(i), "page {i}");
        }
    }

    #[test]
    fn navigation_stops_at_ends() {
        let pages = pages(4);
        let mut view = SpreadView::new(&pages, 2);
        assert!(view.next());
        assert_eq!(view.focused(), 3);
        assert!(!view.next());
        assert!(view.previous());
        assert_eq!(view.focused(), 1);
        assert!(view.previous());
        assert_eq!(view.focused(), 0);
        assert!(!view.previous());
    }

    #[test]
    fn focus_is_clamped() {
        let pages = pages(2);
        assert_eq!(SpreadView::new(&pages, 9).focused(), 1);
    }
}
