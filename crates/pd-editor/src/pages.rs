//! Page list manager: the ordered page collection and its live scene.
//!
//! `PageManager` owns the document's pages, the index of the selected page,
//! the scene bridge showing that page, and the per-page history. Two
//! representations of the selected page exist at once:
//!
//! - **Live scene**: what the user edits, held by the [`SceneBridge`].
//! - **Stored page**: `elements` plus the `fabric_data` snapshot the scene
//!   was last flushed into.
//!
//! Every operation that changes the selected page first flushes the live
//! scene into the outgoing page's `fabric_data` and suspends its history,
//! then loads the incoming page. Flush always completes before the load
//! begins.

use crate::bridge::{BridgeError, SceneBridge, TemplateGenerator};
use crate::history::PageHistory;
use crate::spread::ViewMode;
use pd_core::days::{backfill_day_indices, derive_day_index};
use pd_core::memo::{CountryCode, MemoPageContent, MemoSettings, memo_settings_for, used_memo_item_ids};
use pd_core::{Color, EngineConfig, Page, PageId, SceneSnapshot, StyleSeries, TemplateData, TemplateKey};
use std::ops::Range;
use thiserror::Error;

/// Why a page list operation did not happen.
#[derive(Error, Debug)]
pub enum PageError {
    #[error("page index {index} out of range (document has {len} pages)")]
    IndexOutOfRange { index: usize, len: usize },

    /// Page 0 cannot be deleted, moved, or displaced.
    #[error("the cover page is protected")]
    ProtectedCover,

    #[error("no style series selected")]
    MissingStyle,

    #[error("no template data available")]
    MissingTemplateData,

    /// The style series has no template for this key.
    #[error("style has no template for `{0}`")]
    UnknownTemplate(String),

    /// The generator did not recognise the template id.
    #[error("template `{0}` produced no page")]
    TemplateFailed(String),

    #[error("template data lists no itinerary days")]
    NoItineraryDays,

    #[error("failed to encode template data: {0}")]
    Encode(#[from] serde_json::Error),

    #[error(transparent)]
    Bridge(#[from] BridgeError),
}

fn rejected(err: PageError) -> PageError {
    log::warn!("page operation rejected: {err}");
    err
}

/// The page list, its selection, and the live scene of the selected page.
pub struct PageManager<B, G> {
    pub(crate) pages: Vec<Page>,
    pub(crate) current: usize,
    pub(crate) bridge: B,
    generator: G,
    style: Option<StyleSeries>,
    pub(crate) template_data: Option<TemplateData>,
    pub(crate) history: PageHistory,
    pub(crate) config: EngineConfig,
    pub(crate) view_mode: ViewMode,
    /// Bumped whenever an image edit session opens or the selection
    /// changes. Tokens from older generations are stale.
    pub(crate) edit_generation: u64,
}

impl<B: SceneBridge, G: TemplateGenerator> PageManager<B, G> {
    /// Create an empty document.
    pub fn new(bridge: B, generator: G, config: EngineConfig) -> Self {
        Self {
            pages: Vec::new(),
            current: 0,
            bridge,
            generator,
            style: None,
            template_data: None,
            history: PageHistory::new(config.history_depth),
            config,
            view_mode: ViewMode::Single,
            edit_generation: 0,
        }
    }

    /// Replace the page list and open page 0.
    ///
    /// All retained history is dropped.
    pub fn load_document(&mut self, pages: Vec<Page>) -> Result<(), PageError> {
        self.pages = pages;
        self.current = 0;
        self.history = PageHistory::new(self.config.history_depth);
        self.view_mode = ViewMode::Single;
        self.edit_generation += 1;
        log::debug!("document loaded with {} pages", self.pages.len());
        if self.pages.is_empty() {
            return Ok(());
        }
        self.enter_page(0)
    }

    // ─── Accessors ───────────────────────────────────────────────────────

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_page(&self) -> Option<&Page> {
        self.pages.get(self.current)
    }

    pub fn style(&self) -> Option<&StyleSeries> {
        self.style.as_ref()
    }

    pub fn template_data(&self) -> Option<&TemplateData> {
        self.template_data.as_ref()
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn bridge(&self) -> &B {
        &self.bridge
    }

    /// Direct access to the live scene. Changes made here bypass history;
    /// use [`PageManager::edit`] for undoable edits.
    pub fn bridge_mut(&mut self) -> &mut B {
        &mut self.bridge
    }

    pub fn history(&self) -> &PageHistory {
        &self.history
    }

    // ─── Setters ─────────────────────────────────────────────────────────

    pub fn set_style(&mut self, style: StyleSeries) {
        self.style = Some(style);
    }

    pub fn set_template_data(&mut self, data: TemplateData) {
        self.template_data = Some(data);
    }

    pub fn rename_page(&mut self, index: usize, name: impl Into<String>) -> Result<(), PageError> {
        let len = self.pages.len();
        let page = self
            .pages
            .get_mut(index)
            .ok_or_else(|| rejected(PageError::IndexOutOfRange { index, len }))?;
        page.name = name.into();
        Ok(())
    }

    /// Change a page's background. The live scene follows when the page is
    /// selected; otherwise it is applied the next time the page is entered.
    pub fn set_page_background(&mut self, index: usize, color: Color) -> Result<(), PageError> {
        let len = self.pages.len();
        let page = self
            .pages
            .get_mut(index)
            .ok_or_else(|| rejected(PageError::IndexOutOfRange { index, len }))?;
        page.background_color = color;
        if index == self.current {
            self.bridge.set_background(color);
            self.bridge.render();
        }
        Ok(())
    }

    // ─── Derived values ──────────────────────────────────────────────────

    /// Itinerary day of the selected page, if it is a daily page.
    pub fn current_day_index(&self) -> Option<usize> {
        derive_day_index(&self.pages, self.current)
    }

    /// Memo item ids already placed on some page.
    pub fn used_memo_item_ids(&self) -> Vec<String> {
        used_memo_item_ids(&self.pages)
    }

    /// Memo preset for the destination in the template data.
    ///
    /// An explicit `countryCode` wins; otherwise the country is inferred
    /// from the free-text `destination`.
    pub fn memo_settings(&self) -> Option<MemoSettings> {
        let data = self.template_data.as_ref()?;
        let code = match data.country_code() {
            Some(code) => CountryCode::from_name(code),
            None => CountryCode::from_name(data.destination().unwrap_or_default()),
        };
        Some(memo_settings_for(code))
    }

    // ─── Selection ───────────────────────────────────────────────────────

    /// Switch the live scene to `pages[index]`.
    ///
    /// Re-selecting the current page is a no-op and returns `Ok`.
    pub fn select_page(&mut self, index: usize) -> Result<usize, PageError> {
        self.check_index(index)?;
        if index == self.current {
            return Ok(index);
        }
        let previous = self.current;
        self.leave_current_page();
        if let Err(err) = self.enter_page(index) {
            self.reopen_after_failure(previous);
            return Err(rejected(err));
        }
        log::debug!("selected page {index} ({})", self.pages[index].id);
        Ok(index)
    }

    // ─── Insertion ───────────────────────────────────────────────────────

    /// Append a page and select it.
    ///
    /// `TemplateKey::Blank` synthesises an empty page from the config; any
    /// other key is generated from the current style and template data.
    pub fn add_page(&mut self, key: TemplateKey) -> Result<usize, PageError> {
        let page = match key {
            TemplateKey::Blank => self.blank_page(),
            key => {
                let data = self.template_data.as_ref().ok_or(PageError::MissingTemplateData);
                let data = self.require_style().and(data).map_err(rejected)?;
                self.generate(&key, data)?
            }
        };
        self.append_and_select(vec![page]).map(|range| range.start)
    }

    /// Append one daily page per itinerary day and select the first.
    ///
    /// Each page is generated with `currentDayIndex` set to its day, named
    /// "Day N", and stamped with its `day_index`.
    pub fn add_daily_pages(&mut self) -> Result<Range<usize>, PageError> {
        self.require_style().map_err(rejected)?;
        let data = self
            .template_data
            .as_ref()
            .ok_or_else(|| rejected(PageError::MissingTemplateData))?;
        let total_days = data.daily_itinerary_count();
        if total_days == 0 {
            return Err(rejected(PageError::NoItineraryDays));
        }

        let mut generated = Vec::with_capacity(total_days);
        for day in 0..total_days {
            let mut page = self.generate(&TemplateKey::Daily, &data.with("currentDayIndex", day))?;
            page.name = format!("Day {}", day + 1);
            page.day_index = Some(day);
            generated.push(page);
        }
        let range = self.append_and_select(generated)?;
        log::debug!("added {total_days} daily pages at {range:?}");
        Ok(range)
    }

    /// Append a memo page showing `content` and select it.
    pub fn add_memo_page(&mut self, content: MemoPageContent) -> Result<usize, PageError> {
        self.require_style().map_err(rejected)?;
        let settings = self
            .memo_settings()
            .ok_or_else(|| rejected(PageError::MissingTemplateData))?;
        let memo_index = self.pages.iter().filter(|p| p.template_key.is_memo()).count();

        let mut data = self.template_data.clone().unwrap_or_default();
        data.set("memoSettings", serde_json::to_value(&settings)?);
        data.set("currentMemoPageIndex", memo_index);
        data.set("memoPageContent", serde_json::to_value(&content)?);

        let mut page = self.generate(&TemplateKey::Memo, &data)?;
        page.name = if content.is_weather_page {
            "Weather & emergency info".to_string()
        } else {
            format!("Travel tips {}", memo_index + 1)
        };
        page.memo_page_content = Some(content);
        self.append_and_select(vec![page]).map(|range| range.start)
    }

    /// Insert a copy of `pages[index]` right after it and select the copy.
    ///
    /// The copy gets a fresh id, a "(copy)" name, the source's scene (the
    /// live scene when duplicating the selected page), and the source's day
    /// index. Unstamped daily pages are stamped first so no page changes
    /// its day.
    pub fn duplicate_page(&mut self, index: usize) -> Result<usize, PageError> {
        self.check_index(index)?;
        let previous = self.current;
        self.leave_current_page();

        let source = &self.pages[index];
        let day_index = derive_day_index(&self.pages, index);
        let mut copy = source.clone();
        copy.id = PageId::mint(source.template_key.as_str());
        copy.name = format!("{} {}", source.name, self.config.copy_suffix);
        copy.day_index = day_index;

        let unstamped: Vec<Option<usize>> = self.pages.iter().map(|p| p.day_index).collect();
        let stamped = backfill_day_indices(&mut self.pages);
        if stamped > 0 {
            log::debug!("stamped day index on {stamped} daily pages");
        }

        let target = index + 1;
        self.pages.insert(target, copy);
        if let Err(err) = self.enter_page(target) {
            self.pages.remove(target);
            for (page, day_index) in self.pages.iter_mut().zip(unstamped) {
                page.day_index = day_index;
            }
            self.reopen_after_failure(previous);
            return Err(rejected(err));
        }
        log::debug!("duplicated page {index} as {}", self.pages[target].id);
        Ok(target)
    }

    // ─── Removal and ordering ────────────────────────────────────────────

    /// Remove `pages[index]` and return it. The cover cannot be deleted.
    ///
    /// Deleting the selected page opens its predecessor. Deleting a page
    /// before the selection only shifts the index. If the predecessor fails
    /// to load, the page is put back and stays selected.
    pub fn delete_page(&mut self, index: usize) -> Result<Page, PageError> {
        self.check_index(index)?;
        if index == 0 {
            return Err(rejected(PageError::ProtectedCover));
        }
        self.end_preview();

        let removed = self.pages.remove(index);
        if index == self.current {
            self.edit_generation += 1;
            self.history.suspend();
            if let Err(err) = self.enter_page(index - 1) {
                self.pages.insert(index, removed);
                self.reopen_after_failure(index);
                return Err(rejected(err));
            }
        } else if index < self.current {
            self.current -= 1;
        }

        self.history.forget(removed.id);
        log::debug!("deleted page {index} ({})", removed.id);
        Ok(removed)
    }

    /// Move the page at `from` to position `to`.
    ///
    /// The selection follows the selected page. Neither index may be 0.
    /// Unstamped daily pages are stamped first so no page changes its day.
    pub fn reorder_pages(&mut self, from: usize, to: usize) -> Result<(), PageError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from == 0 || to == 0 {
            return Err(rejected(PageError::ProtectedCover));
        }
        if from == to {
            return Ok(());
        }
        self.end_preview();

        let stamped = backfill_day_indices(&mut self.pages);
        if stamped > 0 {
            log::debug!("stamped day index on {stamped} daily pages");
        }
        let page = self.pages.remove(from);
        self.pages.insert(to, page);

        let current = self.current;
        if current == from {
            self.current = to;
        } else if from < current && to >= current {
            self.current -= 1;
        } else if from > current && to <= current {
            self.current += 1;
        }
        log::debug!("moved page {from} -> {to}, selection {current} -> {}", self.current);
        Ok(())
    }

    // ─── Editing ─────────────────────────────────────────────────────────

    /// Apply an undoable edit to the live scene.
    pub fn edit<R>(&mut self, f: impl FnOnce(&mut B) -> R) -> R {
        self.end_preview();
        self.history.checkpoint(self.bridge.export_scene());
        let out = f(&mut self.bridge);
        self.bridge.render();
        out
    }

    /// Start a gesture (drag, resize): edits until [`end_edit`](Self::end_edit)
    /// undo as one step.
    pub fn begin_edit(&mut self) {
        self.end_preview();
        self.history.begin_batch(self.bridge.export_scene());
    }

    pub fn end_edit(&mut self) {
        self.history.end_batch(&self.bridge.export_scene());
    }

    /// Undo the last edit on the selected page. `Ok(false)` if there is
    /// nothing to undo.
    pub fn undo(&mut self) -> Result<bool, PageError> {
        self.end_preview();
        let Some(previous) = self.history.undo(self.bridge.export_scene()) else {
            return Ok(false);
        };
        if let Err(err) = self.bridge.load_scene(&previous) {
            self.history.redo(previous);
            return Err(rejected(err.into()));
        }
        self.bridge.render();
        Ok(true)
    }

    pub fn redo(&mut self) -> Result<bool, PageError> {
        self.end_preview();
        let Some(next) = self.history.redo(self.bridge.export_scene()) else {
            return Ok(false);
        };
        if let Err(err) = self.bridge.load_scene(&next) {
            self.history.undo(next);
            return Err(rejected(err.into()));
        }
        self.bridge.render();
        Ok(true)
    }

    /// Flush the live scene into the selected page and hand out the pages
    /// for persistence.
    pub fn pages_for_save(&mut self) -> &[Page] {
        if let Some(page) = self.pages.get_mut(self.current) {
            page.fabric_data = Some(self.bridge.export_scene());
        }
        &self.pages
    }

    // ─── Internals ───────────────────────────────────────────────────────

    pub(crate) fn check_index(&self, index: usize) -> Result<(), PageError> {
        if index < self.pages.len() {
            Ok(())
        } else {
            Err(rejected(PageError::IndexOutOfRange {
                index,
                len: self.pages.len(),
            }))
        }
    }

    fn require_style(&self) -> Result<&StyleSeries, PageError> {
        self.style.as_ref().ok_or(PageError::MissingStyle)
    }

    /// Generate a page for `key` from the current style.
    pub(crate) fn generate(&self, key: &TemplateKey, data: &TemplateData) -> Result<Page, PageError> {
        let style = self.require_style().map_err(rejected)?;
        let template_id = style
            .template_for(key)
            .ok_or_else(|| rejected(PageError::UnknownTemplate(key.to_string())))?;
        let mut page = self
            .generator
            .generate(template_id, data)
            .ok_or_else(|| rejected(PageError::TemplateFailed(template_id.to_string())))?;
        page.template_key = key.clone();
        log::trace!("generated page {} from template {template_id}", page.id);
        Ok(page)
    }

    fn blank_page(&self) -> Page {
        let mut page = Page::new(
            PageId::mint(TemplateKey::Blank.as_str()),
            self.config.blank_page_name.clone(),
            TemplateKey::Blank,
            self.config.canvas_width,
            self.config.canvas_height,
        );
        page.background_color = Color::from_hex(&self.config.background_color).unwrap_or(Color::WHITE);
        page
    }

    /// Append `new_pages` and open the first of them.
    ///
    /// Generators are deterministic, so a batch can repeat ids already in
    /// the document or earlier in the batch. Those pages get a minted id.
    fn append_and_select(&mut self, new_pages: Vec<Page>) -> Result<Range<usize>, PageError> {
        let previous = self.current;
        let start = self.pages.len();
        self.leave_current_page();
        for mut page in new_pages {
            if self.pages.iter().any(|p| p.id == page.id) {
                let taken = page.id;
                page.id = PageId::mint(page.template_key.as_str());
                log::debug!("generated id {taken} already in use, minted {}", page.id);
            }
            self.pages.push(page);
        }
        let range = start..self.pages.len();
        if range.is_empty() {
            self.reopen_after_failure(previous);
            return Ok(range);
        }
        if let Err(err) = self.enter_page(start) {
            self.pages.truncate(start);
            self.reopen_after_failure(previous);
            return Err(rejected(err));
        }
        log::debug!("appended {} page(s), selected {start}", range.len());
        Ok(range)
    }

    /// Flush the live scene into the selected page and detach its history.
    pub(crate) fn leave_current_page(&mut self) {
        self.end_preview();
        self.edit_generation += 1;
        self.history.suspend();
        let Some(page) = self.pages.get_mut(self.current) else {
            return;
        };
        page.fabric_data = Some(self.bridge.export_scene());
        log::trace!("flushed scene into page {}", page.id);
    }

    /// Make `pages[index]` the selected page and load it into the scene.
    ///
    /// A structurally valid snapshot is loaded with its retained history;
    /// otherwise the scene is rebuilt from `elements` with fresh history.
    pub(crate) fn enter_page(&mut self, index: usize) -> Result<(), PageError> {
        let page = self.pages.get(index).ok_or(PageError::IndexOutOfRange {
            index,
            len: self.pages.len(),
        })?;
        let restored = match page.valid_snapshot() {
            Some(snapshot) => load_snapshot(&mut self.bridge, page, snapshot),
            None => false,
        };
        if restored {
            self.history.restore(page.id);
        } else {
            self.bridge.load_page(page)?;
            self.history.init(page.id);
        }
        self.bridge.set_background(page.background_color);
        self.bridge.render();
        self.current = index;
        Ok(())
    }

    /// Put the selection back on `previous` after a failed switch. The
    /// live scene still shows that page.
    fn reopen_after_failure(&mut self, previous: usize) {
        self.current = previous;
        if let Some(page) = self.pages.get(previous) {
            self.history.restore(page.id);
        }
    }
}

/// Load a stored snapshot, falling back to `elements` when the surface
/// rejects it.
fn load_snapshot<B: SceneBridge>(bridge: &mut B, page: &Page, snapshot: &SceneSnapshot) -> bool {
    match bridge.load_scene(snapshot) {
        Ok(()) => true,
        Err(err) => {
            log::warn!("page {}: stored scene rejected, rebuilding from elements: {err}", page.id);
            false
        }
    }
}
