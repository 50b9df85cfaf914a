//! Integration tests: cover and daily-cover image edit sessions (pd-editor).
//!
//! Images are generated in memory and PNG-encoded, so the decode, crop
//! and re-encode path runs end to end without touching the network.

use pd_core::image::{ImageFormat, Rgba, RgbaImage};
use pd_core::{Element, EngineConfig, FitError, ImagePositionSettings, Page, PageId, StyleSeries, TemplateData, TemplateKey};
use pd_editor::{ImageEditError, MemoryScene, PageError, PageManager, SceneBridge};
use pretty_assertions::assert_eq;
use std::io::Cursor;

type Editor = PageManager<MemoryScene, fn(&str, &TemplateData) -> Option<Page>>;

fn generate(template_id: &str, _data: &TemplateData) -> Option<Page> {
    (template_id == "kyoto-toc").then(|| {
        Page::new(PageId::intern("toc-generated"), "Generated", TemplateKey::Toc, 559.0, 794.0)
    })
}

fn make_editor() -> Editor {
    let _ = env_logger::builder().is_test(true).try_init();
    let pages: Vec<Page> = serde_json::from_str(include_str!("fixtures/kyoto_pages.json")).unwrap();
    let mut editor: Editor = PageManager::new(
        MemoryScene::new(559.0, 794.0),
        generate as fn(&str, &TemplateData) -> Option<Page>,
        EngineConfig::default(),
    );
    editor.load_document(pages).unwrap();
    editor.set_style(StyleSeries {
        id: "kyoto".into(),
        name: "Kyoto Autumn".into(),
        templates: [(TemplateKey::Toc, "kyoto-toc".to_string())].into_iter().collect(),
    });
    editor.set_template_data(serde_json::from_str(include_str!("fixtures/kyoto_trip.json")).unwrap());
    editor
}

/// A 640x480 PNG: top half orange, bottom half teal.
fn photo() -> Vec<u8> {
    let img = RgbaImage::from_fn(640, 480, |_, y| {
        if y < 240 {
            Rgba([240, 140, 40, 255])
        } else {
            Rgba([20, 150, 140, 255])
        }
    });
    let mut png = Vec::new();
    img.write_to(&mut Cursor::new(&mut png), ImageFormat::Png).unwrap();
    png
}

fn image_at(editor: &Editor, name: &str) -> (usize, pd_core::ImageElement) {
    let index = editor.bridge().find_by_name(name).unwrap();
    match editor.bridge().object(index) {
        Some(Element::Image(img)) => (index, img.clone()),
        other => panic!("expected image at {index}, got {other:?}"),
    }
}

const NEW_SRC: &str = "https://cdn.example.com/kyoto/kiyomizu.jpg";

// ─── Document cover ──────────────────────────────────────────────────────

#[test]
fn open_cover_reports_stored_image() {
    let mut editor = make_editor();
    let session = editor.open_cover_position().unwrap();
    assert_eq!(session.src.as_deref(), Some("https://cdn.example.com/kyoto/arashiyama.jpg"));
    assert_eq!(session.position, ImagePositionSettings::default());
    assert_eq!(session.day, None);
}

#[test]
fn cover_replaced_in_place() {
    let mut editor = make_editor();
    let count = editor.bridge().objects.len();
    let (index_before, _) = image_at(&editor, "cover image");

    let settings = ImagePositionSettings { x: 20.0, y: 80.0, scale: 1.25 };
    let session = editor.open_cover_position().unwrap();
    editor.finalize_cover_image(session.token, NEW_SRC, &photo(), settings).unwrap();

    let (index, img) = image_at(&editor, "cover image");
    assert_eq!(index, index_before, "z-order preserved");
    assert_eq!(editor.bridge().objects.len(), count);
    assert_eq!(img.base.id, "el-cover-image");
    assert_eq!((img.base.width, img.base.height), (559.0, 420.0));
    assert_eq!(img.base.opacity, 0.9);
    assert!(img.src.starts_with("data:image/png;base64,"));
    assert_eq!(img.position, Some(settings));

    let data = editor.template_data().unwrap();
    assert_eq!(data.cover_image(), Some(NEW_SRC));
    assert_eq!(data.cover_image_position(), Some(settings));

    let reopened = editor.open_cover_position().unwrap();
    assert_eq!(reopened.position, settings);
}

#[test]
fn cover_replacement_can_be_undone() {
    let mut editor = make_editor();
    let (_, original) = image_at(&editor, "cover image");
    let session = editor.open_cover_position().unwrap();
    editor
        .finalize_cover_image(session.token, NEW_SRC, &photo(), ImagePositionSettings::default())
        .unwrap();

    assert!(editor.undo().unwrap());
    let (_, restored) = image_at(&editor, "cover image");
    assert_eq!(restored, original);
}

#[test]
fn cover_without_slot_regenerates_page() {
    let mut editor = make_editor();
    editor.select_page(1).unwrap();
    let session = editor.open_cover_position().unwrap();
    editor
        .finalize_cover_image(session.token, NEW_SRC, &photo(), ImagePositionSettings::default())
        .unwrap();

    let page = editor.current_page().unwrap();
    assert_eq!(page.id.as_str(), "toc-kyoto");
    assert_eq!(page.name, "Contents");
    assert!(page.elements.is_empty());
    assert!(editor.bridge().objects.is_empty());
    assert_eq!(editor.template_data().unwrap().cover_image(), Some(NEW_SRC));
}

#[test]
fn decode_failure_changes_nothing() {
    let mut editor = make_editor();
    let scene = editor.bridge().export_scene();
    let data = editor.template_data().cloned();

    let session = editor.open_cover_position().unwrap();
    let err = editor
        .finalize_cover_image(session.token, NEW_SRC, b"<html>404</html>", ImagePositionSettings::default())
        .unwrap_err();

    assert!(matches!(err, ImageEditError::Fit(FitError::Image(_))));
    assert_eq!(editor.bridge().export_scene(), scene);
    assert_eq!(editor.template_data().cloned(), data);
    assert!(!editor.history().can_undo());
}

#[test]
fn invalid_position_is_rejected() {
    let mut editor = make_editor();
    let session = editor.open_cover_position().unwrap();
    let err = editor
        .finalize_cover_image(session.token, NEW_SRC, &photo(), ImagePositionSettings { x: 50.0, y: 50.0, scale: 0.0 })
        .unwrap_err();
    assert!(matches!(err, ImageEditError::Fit(FitError::InvalidPosition { .. })));
}

// ─── Stale sessions ──────────────────────────────────────────────────────

#[test]
fn newer_session_invalidates_older() {
    let mut editor = make_editor();
    let first = editor.open_cover_position().unwrap();
    let second = editor.open_cover_position().unwrap();

    let stale = editor.finalize_cover_image(first.token, NEW_SRC, &photo(), ImagePositionSettings::default());
    assert!(matches!(stale, Err(ImageEditError::StaleEdit)));
    editor
        .finalize_cover_image(second.token, NEW_SRC, &photo(), ImagePositionSettings::default())
        .unwrap();
}

#[test]
fn page_switch_invalidates_session() {
    let mut editor = make_editor();
    let session = editor.open_cover_position().unwrap();
    editor.select_page(1).unwrap();
    editor.select_page(0).unwrap();

    let stale = editor.finalize_cover_image(session.token, NEW_SRC, &photo(), ImagePositionSettings::default());
    assert!(matches!(stale, Err(ImageEditError::StaleEdit)));
    assert_eq!(
        editor.template_data().unwrap().cover_image(),
        Some("https://cdn.example.com/kyoto/arashiyama.jpg")
    );
}

#[test]
fn session_is_single_use() {
    let mut editor = make_editor();
    let session = editor.open_cover_position().unwrap();
    editor
        .finalize_cover_image(session.token, NEW_SRC, &photo(), ImagePositionSettings::default())
        .unwrap();
    let again = editor.finalize_cover_image(session.token, NEW_SRC, &photo(), ImagePositionSettings::default());
    assert!(matches!(again, Err(ImageEditError::StaleEdit)));
}

// ─── Daily cover ─────────────────────────────────────────────────────────

#[test]
fn daily_cover_needs_daily_page() {
    let mut editor = make_editor();
    assert!(matches!(editor.open_daily_cover_position(), Err(ImageEditError::NotDailyPage)));
}

#[test]
fn daily_cover_replaces_named_slot() {
    let mut editor = make_editor();
    editor.select_page(2).unwrap();
    let session = editor.open_daily_cover_position().unwrap();
    assert_eq!(session.day, Some(0));
    assert_eq!(session.src.as_deref(), Some("https://cdn.example.com/kyoto/fushimi.jpg"));

    let settings = ImagePositionSettings { x: 50.0, y: 0.0, scale: 1.0 };
    editor.finalize_daily_cover_image(session.token, NEW_SRC, &photo(), settings).unwrap();

    let (index, img) = image_at(&editor, "daily cover");
    assert_eq!(index, 0);
    assert_eq!(editor.bridge().objects.len(), 2);
    assert_eq!((img.base.width, img.base.height), (559.0, 333.0));
    assert_eq!(img.base.id, "el-daily-cover-d1");

    let data = editor.template_data().unwrap();
    assert_eq!(data.daily_cover_image(0), Some(NEW_SRC));
    assert_eq!(data.daily_cover_position(0), Some(settings));
    assert_eq!(editor.open_daily_cover_position().unwrap().position, settings);
}

#[test]
fn daily_cover_added_when_slot_missing() {
    let mut editor = make_editor();
    editor.select_page(3).unwrap();
    let session = editor.open_daily_cover_position().unwrap();
    assert_eq!(session.day, Some(1));
    assert_eq!(session.src, None);

    editor
        .finalize_daily_cover_image(session.token, NEW_SRC, &photo(), ImagePositionSettings::default())
        .unwrap();

    let objects = &editor.bridge().objects;
    assert_eq!(objects.len(), 2);
    let Element::Image(img) = &objects[1] else {
        panic!("daily cover should be on top");
    };
    assert_eq!(img.base.id, "el-daily-cover-d2");
    assert_eq!(img.base.name, "daily cover");
    assert_eq!((img.base.x, img.base.y), (0.0, 0.0));
    assert_eq!(img.base.opacity, 0.85);

    let data = editor.template_data().unwrap();
    assert_eq!(data.daily_cover_image(1), Some(NEW_SRC));
    assert_eq!(data.get("dailyDetails").unwrap()[1]["dayNumber"], serde_json::json!(2));
}

#[test]
fn daily_cover_rejects_cover_token_after_switch() {
    let mut editor = make_editor();
    let cover = editor.open_cover_position().unwrap();
    editor.select_page(2).unwrap();
    let result = editor.finalize_daily_cover_image(cover.token, NEW_SRC, &photo(), ImagePositionSettings::default());
    assert!(matches!(result, Err(ImageEditError::StaleEdit)));
}

#[test]
fn missing_template_surfaces_as_page_error() {
    let mut editor = make_editor();
    editor.select_page(4).unwrap();
    let session = editor.open_cover_position().unwrap();
    let err = editor
        .finalize_cover_image(session.token, NEW_SRC, &photo(), ImagePositionSettings::default())
        .unwrap_err();
    assert!(matches!(err, ImageEditError::Page(PageError::UnknownTemplate(ref key)) if key == "memo"));
}
