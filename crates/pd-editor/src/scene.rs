//! In-memory scene surface.
//!
//! `MemoryScene` is a retained list of typed elements that implements
//! [`SceneBridge`]. It backs headless hosts (batch generation, previews on
//! the server) and the test suite. Snapshots it produces look like:
//!
//! ```json
//! { "version": "pd-scene/1", "width": 559, "height": 794,
//!   "background": "#FFFFFF", "objects": [ { "type": "text", ... } ] }
//! ```

use crate::bridge::{BridgeError, SceneBridge};
use pd_core::{Color, Element, Page, SceneSnapshot};
use serde_json::{Value, json};

pub const SNAPSHOT_VERSION: &str = "pd-scene/1";

/// A retained scene: objects in z-order (later = on top).
#[derive(Debug, Clone)]
pub struct MemoryScene {
    pub objects: Vec<Element>,
    pub width: f32,
    pub height: f32,
    pub background: Color,
    renders: usize,
    loads: usize,
}

impl MemoryScene {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            objects: Vec::new(),
            width,
            height,
            background: Color::WHITE,
            renders: 0,
            loads: 0,
        }
    }

    /// Number of `load_scene`/`load_page` calls so far.
    pub fn load_count(&self) -> usize {
        self.loads
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn find_by_id(&self, id: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.id() == id)
    }

    /// Apply a user edit. Returns `false` when the edit targets nothing.
    pub fn apply(&mut self, edit: SceneEdit) -> bool {
        match edit {
            SceneEdit::Move { id, dx, dy } => {
                let Some(idx) = self.find_by_id(&id) else { return false };
                let base = self.objects[idx].base_mut();
                base.x += dx;
                base.y += dy;
            }
            SceneEdit::Resize { id, width, height } => {
                let Some(idx) = self.find_by_id(&id) else { return false };
                let base = self.objects[idx].base_mut();
                base.width = width;
                base.height = height;
            }
            SceneEdit::SetText { id, content } => {
                let Some(idx) = self.find_by_id(&id) else { return false };
                match &mut self.objects[idx] {
                    Element::Text(text) => text.content = content,
                    Element::Shape(_) | Element::Image(_) => return false,
                }
            }
            SceneEdit::SetOpacity { id, opacity } => {
                let Some(idx) = self.find_by_id(&id) else { return false };
                self.objects[idx].base_mut().opacity = opacity.clamp(0.0, 1.0);
            }
            SceneEdit::Add { element } => self.objects.push(*element),
            SceneEdit::Remove { id } => {
                let Some(idx) = self.find_by_id(&id) else { return false };
                self.objects.remove(idx);
            }
            SceneEdit::Restack { id, index } => {
                let Some(idx) = self.find_by_id(&id) else { return false };
                let element = self.objects.remove(idx);
                let index = index.min(self.objects.len());
                self.objects.insert(index, element);
            }
        }
        true
    }
}

impl SceneBridge for MemoryScene {
    fn export_scene(&self) -> SceneSnapshot {
        let objects: Vec<Value> = self
            .objects
            .iter()
            .filter_map(|o| {
                serde_json::to_value(o)
                    .inspect_err(|err| log::warn!("object {} left out of snapshot: {err}", o.id()))
                    .ok()
            })
            .collect();
        SceneSnapshot::new(json!({
            "version": SNAPSHOT_VERSION,
            "width": self.width,
            "height": self.height,
            "background": self.background.to_hex(),
            "objects": objects,
        }))
    }

    fn load_scene(&mut self, snapshot: &SceneSnapshot) -> Result<(), BridgeError> {
        let raw = snapshot
            .objects()
            .ok_or_else(|| BridgeError::MalformedSnapshot("missing `objects` array".into()))?;
        let objects = raw
            .iter()
            .enumerate()
            .map(|(i, v)| {
                serde_json::from_value::<Element>(v.clone())
                    .map_err(|e| BridgeError::MalformedSnapshot(format!("object {i}: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let value = snapshot.as_value();
        if let Some(w) = value.get("width").and_then(Value::as_f64) {
            self.width = w as f32;
        }
        if let Some(h) = value.get("height").and_then(Value::as_f64) {
            self.height = h as f32;
        }
        if let Some(bg) = value.get("background").and_then(Value::as_str).and_then(Color::from_hex) {
            self.background = bg;
        }
        self.objects = objects;
        self.loads += 1;
        log::trace!("scene: loaded snapshot with {} objects", self.objects.len());
        Ok(())
    }

    fn load_page(&mut self, page: &Page) -> Result<(), BridgeError> {
        self.objects = page.elements.clone();
        self.width = page.width;
        self.height = page.height;
        self.background = page.background_color;
        self.loads += 1;
        log::trace!("scene: rebuilt page {} from {} elements", page.id, page.elements.len());
        Ok(())
    }

    fn find_by_name(&self, name: &str) -> Option<usize> {
        self.objects.iter().position(|o| o.name() == name)
    }

    fn object(&self, index: usize) -> Option<&Element> {
        self.objects.get(index)
    }

    fn remove(&mut self, index: usize) -> Option<Element> {
        (index < self.objects.len()).then(|| self.objects.remove(index))
    }

    fn insert_at(&mut self, index: usize, element: Element) {
        let index = index.min(self.objects.len());
        self.objects.insert(index, element);
    }

    fn add(&mut self, element: Element) {
        self.objects.push(element);
    }

    fn set_background(&mut self, color: Color) {
        self.background = color;
    }

    fn render(&mut self) {
        self.renders += 1;
    }
}

/// A user edit on the live scene.
#[derive(Debug, Clone)]
pub enum SceneEdit {
    Move {
        id: String,
        dx: f32,
        dy: f32,
    },
    Resize {
        id: String,
        width: f32,
        height: f32,
    },
    SetText {
        id: String,
        content: String,
    },
    SetOpacity {
        id: String,
        opacity: f32,
    },
    Add {
        element: Box<Element>,
    },
    Remove {
        id: String,
    },
    /// Move an object to a z-index (bring forward / send backward).
    Restack {
        id: String,
        index: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use pd_core::{ElementBase, PageId, ShapeElement, ShapeVariant, TemplateKey, TextAlign, TextElement};
    use pretty_assertions::assert_eq;

    fn text(id: &str, content: &str) -> Element {
        Element::Text(TextElement {
            base: ElementBase::new(id, id, 10.0, 10.0, 100.0, 20.0),
            content: content.into(),
            font: Default::default(),
            color: Color::BLACK,
            align: TextAlign::Left,
        })
    }

    fn rect(id: &str) -> Element {
        Element::Shape(ShapeElement {
            base: ElementBase::new(id, id, 0.0, 0.0, 50.0, 50.0),
            variant: ShapeVariant::Rectangle,
            fill: Some(Color::from_hex("#C8A165").unwrap()),
            stroke: None,
            stroke_width: 0.0,
            corner_radius: 4.0,
        })
    }

    #[test]
    fn export_load_roundtrip() {
        let mut scene = MemoryScene::new(559.0, 794.0);
        scene.add(rect("bg"));
        scene.add(text("title", "Kyoto"));
        let snap = scene.export_scene();
        assert!(snap.is_valid());

        let mut other = MemoryScene::new(1.0, 1.0);
        other.load_scene(&snap).unwrap();
        assert_eq!(other.objects, scene.objects);
        assert_eq!(other.width, 559.0);
        assert_eq!(other.load_count(), 1);
    }

    #[test]
    fn export_keeps_every_object() {
        let mut scene = MemoryScene::new(559.0, 794.0);
        let mut drifting = rect("drifting");
        drifting.base_mut().x = f32::NAN;
        scene.add(drifting);
        scene.add(text("title", "Kyoto"));
        let snap = scene.export_scene();
        let ids: Vec<_> = snap
            .objects()
            .unwrap()
            .iter()
            .map(|o| o["id"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(ids, vec!["drifting", "title"]);
    }

    #[test]
    fn malformed_snapshot_is_rejected_untouched() {
        let mut scene = MemoryScene::new(10.0, 10.0);
        scene.add(rect("keep"));
        let bad = SceneSnapshot::new(json!({ "objects": [ { "type": "video" } ] }));
        assert!(matches!(scene.load_scene(&bad), Err(BridgeError::MalformedSnapshot(_))));
        assert_eq!(scene.objects.len(), 1);
        assert_eq!(scene.load_count(), 0);
    }

    #[test]
    fn load_page_uses_elements() {
        let mut page = Page::new(PageId::intern("p1"), "p1", TemplateKey::Blank, 300.0, 200.0);
        page.elements = vec![rect("a"), text("b", "hi")];
        let mut scene = MemoryScene::new(1.0, 1.0);
        scene.load_page(&page).unwrap();
        assert_eq!(scene.objects.len(), 2);
        assert_eq!((scene.width, scene.height), (300.0, 200.0));
    }

    #[test]
    fn edits_and_restack() {
        let mut scene = MemoryScene::new(10.0, 10.0);
        scene.add(rect("a"));
        scene.add(text("b", "x"));
        assert!(scene.apply(SceneEdit::Move { id: "a".into(), dx: 5.0, dy: -2.0 }));
        assert_eq!(scene.objects[0].base().x, 5.0);
        assert!(!scene.apply(SceneEdit::SetText { id: "a".into(), content: "no".into() }));
        assert!(scene.apply(SceneEdit::Restack { id: "a".into(), index: 9 }));
        assert_eq!(scene.objects[1].id(), "a");
        assert!(!scene.apply(SceneEdit::Remove { id: "zzz".into() }));
    }

    #[test]
    fn insert_at_clamps_and_remove_checks_bounds() {
        let mut scene = MemoryScene::new(10.0, 10.0);
        scene.insert_at(5, rect("a"));
        scene.insert_at(0, rect("b"));
        assert_eq!(scene.objects[0].id(), "b");
        assert!(scene.remove(7).is_none());
        assert_eq!(scene.remove(1).map(|e| e.id().to_string()), Some("a".into()));
    }
}
