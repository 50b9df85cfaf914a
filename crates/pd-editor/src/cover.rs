//! Cover and daily-cover image editing.
//!
//! Both flows are two-step. `open_*` hands the UI the stored image and its
//! [`ImagePositionSettings`] plus an [`EditToken`]; `finalize_*` crops the
//! chosen image into the slot and writes the choice back to the template
//! data. A token is only honoured while it is the newest session and the
//! page it was opened on is still selected, so a late finalize cannot
//! overwrite newer state.

use crate::bridge::{SceneBridge, TemplateGenerator};
use crate::pages::{PageError, PageManager};
use pd_core::fit::{decode_image, fit_image_element};
use pd_core::image::DynamicImage;
use pd_core::{Element, ElementBase, FitError, ImagePositionSettings, Page, PageId, TemplateData};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ImageEditError {
    /// A newer session was opened or the selected page changed.
    #[error("image edit session is stale")]
    StaleEdit,

    #[error("the selected page is not a daily page")]
    NotDailyPage,

    #[error("no page is selected")]
    NoPage,

    #[error(transparent)]
    Fit(#[from] FitError),

    #[error(transparent)]
    Page(#[from] PageError),
}

/// Identifies one image edit session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EditToken {
    generation: u64,
    page: PageId,
}

impl EditToken {
    pub fn page(&self) -> PageId {
        self.page
    }
}

/// What the position editor opens with.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEditSession {
    pub token: EditToken,
    /// Currently stored image source, if any.
    pub src: Option<String>,
    /// Stored position, or the centred default.
    pub position: ImagePositionSettings,
    /// Itinerary day, for daily cover sessions.
    pub day: Option<usize>,
}

impl<B: SceneBridge, G: TemplateGenerator> PageManager<B, G> {
    // ─── Document cover ──────────────────────────────────────────────────

    pub fn open_cover_position(&mut self) -> Result<ImageEditSession, ImageEditError> {
        let token = self.next_edit_token()?;
        let data = self.template_data.as_ref();
        Ok(ImageEditSession {
            token,
            src: data.and_then(TemplateData::cover_image).map(str::to_string),
            position: data.and_then(TemplateData::cover_image_position).unwrap_or_default(),
            day: None,
        })
    }

    /// Crop `bytes` into the cover slot of the selected page.
    ///
    /// The slot is the first element named in `cover_slot_names`. Without
    /// one, the page is regenerated from its template with the new cover
    /// in the template data. `src` is what gets stored as `coverImage`.
    pub fn finalize_cover_image(
        &mut self,
        token: EditToken,
        src: &str,
        bytes: &[u8],
        settings: ImagePositionSettings,
    ) -> Result<(), ImageEditError> {
        self.check_token(token)?;
        let settings = settings.validated()?;
        let image = decode_or_log(bytes, src)?;
        self.end_preview();

        let mut data = self.template_data.clone().unwrap_or_default();
        data.set_cover_image(src, settings);

        let slot = self
            .config
            .cover_slot_names
            .iter()
            .find_map(|name| self.bridge.find_by_name(name));
        match slot {
            Some(index) => {
                let Some(existing) = self.bridge.object(index) else {
                    return Err(ImageEditError::NoPage);
                };
                let element = fit_image_element(existing.base(), &image, settings)?;
                self.replace_scene_object(index, Element::Image(element));
            }
            None => self.regenerate_current_page(&data)?,
        }

        self.template_data = Some(data);
        self.edit_generation += 1;
        log::debug!("cover image applied at ({}, {}) x{}", settings.x, settings.y, settings.scale);
        Ok(())
    }

    // ─── Daily cover ─────────────────────────────────────────────────────

    /// Open the daily cover editor for the selected daily page.
    pub fn open_daily_cover_position(&mut self) -> Result<ImageEditSession, ImageEditError> {
        let day = self.current_day_index().ok_or(ImageEditError::NotDailyPage)?;
        let token = self.next_edit_token()?;
        let data = self.template_data.as_ref();
        Ok(ImageEditSession {
            token,
            src: data.and_then(|d| d.daily_cover_image(day)).map(str::to_string),
            position: data.and_then(|d| d.daily_cover_position(day)).unwrap_or_default(),
            day: Some(day),
        })
    }

    /// Crop `bytes` into the daily cover band of the selected daily page.
    ///
    /// The band spans the page width and `daily_cover_height_ratio` of its
    /// height. An existing "daily cover" element is replaced in place;
    /// otherwise the image is added at the page origin.
    pub fn finalize_daily_cover_image(
        &mut self,
        token: EditToken,
        src: &str,
        bytes: &[u8],
        settings: ImagePositionSettings,
    ) -> Result<(), ImageEditError> {
        let page = self.check_token(token)?;
        let day = self.current_day_index().ok_or(ImageEditError::NotDailyPage)?;
        let (width, height) = (page.width, self.config.daily_cover_height(page.height));
        let settings = settings.validated()?;
        let image = decode_or_log(bytes, src)?;
        self.end_preview();

        let slot_name = &self.config.daily_cover_slot_name;
        match self.bridge.find_by_name(slot_name) {
            Some(index) => {
                let Some(existing) = self.bridge.object(index) else {
                    return Err(ImageEditError::NoPage);
                };
                let mut base = existing.base().clone();
                base.width = width;
                base.height = height;
                let element = fit_image_element(&base, &image, settings)?;
                self.replace_scene_object(index, Element::Image(element));
            }
            None => {
                let mut base = ElementBase::new(
                    format!("el-daily-cover-d{}", day + 1),
                    slot_name.clone(),
                    0.0,
                    0.0,
                    width,
                    height,
                );
                base.opacity = self.config.daily_cover_opacity;
                let element = fit_image_element(&base, &image, settings)?;
                self.history.checkpoint(self.bridge.export_scene());
                self.bridge.add(Element::Image(element));
                self.bridge.render();
            }
        }

        self.template_data
            .get_or_insert_with(TemplateData::new)
            .set_daily_cover(day, src, settings);
        self.edit_generation += 1;
        log::debug!("daily cover applied to day {}", day + 1);
        Ok(())
    }

    // ─── Internals ───────────────────────────────────────────────────────

    fn next_edit_token(&mut self) -> Result<EditToken, ImageEditError> {
        let page = self.current_page().ok_or(ImageEditError::NoPage)?.id;
        self.edit_generation += 1;
        Ok(EditToken {
            generation: self.edit_generation,
            page,
        })
    }

    fn check_token(&self, token: EditToken) -> Result<&Page, ImageEditError> {
        let page = self.current_page().ok_or(ImageEditError::NoPage)?;
        if token.generation != self.edit_generation || token.page != page.id {
            log::warn!("discarding stale image edit for page {}", token.page);
            return Err(ImageEditError::StaleEdit);
        }
        Ok(page)
    }

    /// Swap the scene object at `index` keeping its z-order. Undoable.
    fn replace_scene_object(&mut self, index: usize, element: Element) {
        self.history.checkpoint(self.bridge.export_scene());
        self.bridge.remove(index);
        self.bridge.insert_at(index, element);
        self.bridge.render();
    }

    /// Rebuild the selected page from its template with `data`, keeping
    /// its id and name. Undoable.
    fn regenerate_current_page(&mut self, data: &TemplateData) -> Result<(), PageError> {
        let current = self.current;
        let key = self.pages[current].template_key.clone();
        let mut fresh = self.generate(&key, data)?;

        let page = &mut self.pages[current];
        fresh.id = page.id;
        fresh.name = page.name.clone();
        fresh.day_index = page.day_index;
        fresh.memo_page_content = page.memo_page_content.take();
        fresh.fabric_data = None;

        let before = self.bridge.export_scene();
        if let Err(err) = self.bridge.load_page(&fresh) {
            page.memo_page_content = fresh.memo_page_content;
            return Err(err.into());
        }
        self.history.checkpoint(before);
        *page = fresh;
        self.bridge.render();
        log::debug!("regenerated page {} for new cover", page.id);
        Ok(())
    }
}

fn decode_or_log(bytes: &[u8], src: &str) -> Result<DynamicImage, FitError> {
    decode_image(bytes).inspect_err(|err| log::error!("failed to load image {src}: {err}"))
}
