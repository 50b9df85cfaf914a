pub mod config;
pub mod days;
pub mod error;
pub mod fit;
pub mod id;
pub mod memo;
pub mod model;

pub use config::EngineConfig;
pub use days::{backfill_day_indices, derive_day_index};
pub use error::FitError;
pub use fit::{CoverFit, compute_cover_fit, fit_image_element, render_cover_crop};
pub use id::PageId;
pub use memo::{CountryCode, MemoPageContent, MemoSettings, memo_settings_for, used_memo_item_ids};
pub use model::*;

// Re-export the image crate so downstream crates share one decoder version.
pub use image;
