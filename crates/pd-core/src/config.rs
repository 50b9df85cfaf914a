//! Engine configuration.
//!
//! Hosts usually pass a partial JSON object; every missing field falls back
//! to the A5 brochure defaults below.

use serde::Deserialize;

/// Configuration for the page engine and cover-image flows.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Width of freshly inserted blank pages, in canvas units. Default: **559**.
    pub canvas_width: f32,

    /// Height of freshly inserted blank pages. Default: **794**.
    pub canvas_height: f32,

    /// Background of blank pages. Default: **#FFFFFF**.
    pub background_color: String,

    /// Undo steps retained per page; the oldest are dropped. Default: **50**.
    pub history_depth: usize,

    /// Daily cover slot height as a fraction of the page height. Default: **0.42**.
    pub daily_cover_height_ratio: f32,

    /// Element names that identify the document cover slot, tried in order.
    pub cover_slot_names: Vec<String>,

    /// Element name of the per-day itinerary cover slot.
    pub daily_cover_slot_name: String,

    /// Opacity of a daily cover inserted where no slot existed. Default: **0.85**.
    pub daily_cover_opacity: f32,

    /// Display name of blank pages.
    pub blank_page_name: String,

    /// Appended to the name of duplicated pages.
    pub copy_suffix: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            canvas_width: 559.0,
            canvas_height: 794.0,
            background_color: "#FFFFFF".into(),
            history_depth: 50,
            daily_cover_height_ratio: 0.42,
            cover_slot_names: vec!["cover image".into(), "cover background".into()],
            daily_cover_slot_name: "daily cover".into(),
            daily_cover_opacity: 0.85,
            blank_page_name: "Blank page".into(),
            copy_suffix: "(copy)".into(),
        }
    }
}

impl EngineConfig {
    /// Height of the daily cover slot for a page of the given height.
    pub fn daily_cover_height(&self, page_height: f32) -> f32 {
        (page_height * self.daily_cover_height_ratio).floor()
    }
}
