pub mod bridge;
pub mod cover;
pub mod history;
pub mod pages;
pub mod scene;
pub mod spread;

pub use bridge::{BridgeError, SceneBridge, TemplateGenerator};
pub use cover::{EditToken, ImageEditError, ImageEditSession};
pub use history::PageHistory;
pub use pages::{PageError, PageManager};
pub use scene::{MemoryScene, SceneEdit};
pub use spread::{Spread, SpreadView, ViewMode};
