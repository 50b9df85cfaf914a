//! Seams to the two external collaborators: the rendering surface and the
//! template generator.
//!
//! The engine never draws. It exports and imports serialized scenes, rebuilds
//! a scene from a page's elements, and issues a handful of object commands
//! (find by name, remove, insert at z-index, add, render).

use pd_core::{Color, Element, Page, SceneSnapshot, TemplateData};
use thiserror::Error;

/// Errors reported by a scene surface.
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The snapshot is not a loadable scene.
    #[error("malformed scene snapshot: {0}")]
    MalformedSnapshot(String),

    /// The surface refused to load a page.
    #[error("failed to load page {page}: {reason}")]
    PageLoad { page: String, reason: String },
}

/// The live, editable scene of the currently open page.
pub trait SceneBridge {
    /// Serialize the current scene.
    fn export_scene(&self) -> SceneSnapshot;

    /// Replace the scene contents with a snapshot.
    fn load_scene(&mut self, snapshot: &SceneSnapshot) -> Result<(), BridgeError>;

    /// Rebuild the scene purely from `page.elements` (no snapshot).
    fn load_page(&mut self, page: &Page) -> Result<(), BridgeError>;

    /// Z-index of the first object whose name matches.
    fn find_by_name(&self, name: &str) -> Option<usize>;

    /// The object at a z-index.
    fn object(&self, index: usize) -> Option<&Element>;

    /// Remove and return the object at a z-index.
    fn remove(&mut self, index: usize) -> Option<Element>;

    /// Insert an object at a z-index (clamped to the top).
    fn insert_at(&mut self, index: usize, element: Element);

    /// Add an object on top of the stack.
    fn add(&mut self, element: Element);

    /// Set the page background of the live scene.
    fn set_background(&mut self, color: Color);

    /// Request a repaint.
    fn render(&mut self);
}

/// Produces a page's initial content from a template id and a data bag.
///
/// Must be deterministic for given inputs. `None` means the template id is
/// unknown to the generator.
pub trait TemplateGenerator {
    fn generate(&self, template_id: &str, data: &TemplateData) -> Option<Page>;
}

impl<F> TemplateGenerator for F
where
    F: Fn(&str, &TemplateData) -> Option<Page>,
{
    fn generate(&self, template_id: &str, data: &TemplateData) -> Option<Page> {
        self(template_id, data)
    }
}
