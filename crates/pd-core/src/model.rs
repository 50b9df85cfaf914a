//! Page model for PD documents.
//!
//! A document is an ordered list of pages. Each page carries its template
//! provenance, its element list (z-order = list order), and optionally the
//! last serialized scene the user left it in. Element kinds are a closed
//! sum type so every consumer handles text, shapes and images exhaustively.

use crate::error::FitError;
use crate::id::PageId;
use crate::memo::MemoPageContent;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

// ─── Colors ──────────────────────────────────────────────────────────────

/// RGBA color. Stored as 4 × f32 [0.0, 1.0], serialized as a hex string.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

fn hex_val(c: u8) -> Option<u8> {
    match c {
        b'0'..=b'9' => Some(c - b'0'),
        b'a'..=b'f' => Some(c - b'a' + 10),
        b'A'..=b'F' => Some(c - b'A' + 10),
        _ => None,
    }
}

impl Color {
    pub const WHITE: Color = Color::rgba(1.0, 1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgba(0.0, 0.0, 0.0, 1.0);

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA`; the `#` is optional.
    pub fn from_hex(hex: &str) -> Option<Self> {
        let hex = hex.strip_prefix('#').unwrap_or(hex);
        let bytes = hex.as_bytes();
        let channel = |i: usize| Some((hex_val(bytes[i])? << 4 | hex_val(bytes[i + 1])?) as f32 / 255.0);

        match bytes.len() {
            3 => {
                let short = |i: usize| Some((hex_val(bytes[i])? * 17) as f32 / 255.0);
                Some(Self::rgba(short(0)?, short(1)?, short(2)?, 1.0))
            }
            6 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, 1.0)),
            8 => Some(Self::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
            _ => None,
        }
    }

    /// Emit as `#RRGGBB`, or `#RRGGBBAA` when not fully opaque.
    pub fn to_hex(&self) -> String {
        let [r, g, b, a] = [self.r, self.g, self.b, self.a].map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }
}

impl Serialize for Color {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Color::from_hex(&s).ok_or_else(|| serde::de::Error::custom(format!("invalid color `{s}`")))
    }
}

// ─── Template keys ───────────────────────────────────────────────────────

/// Which template family produced a page. Drives which derived fields apply
/// (`dayIndex` for daily pages, `memoPageContent` for memo pages).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum TemplateKey {
    Blank,
    Cover,
    Toc,
    Daily,
    Itinerary,
    Memo,
    Hotel,
    Vehicle,
    Table,
    Other(String),
}

impl TemplateKey {
    pub fn as_str(&self) -> &str {
        match self {
            TemplateKey::Blank => "blank",
            TemplateKey::Cover => "cover",
            TemplateKey::Toc => "toc",
            TemplateKey::Daily => "daily",
            TemplateKey::Itinerary => "itinerary",
            TemplateKey::Memo => "memo",
            TemplateKey::Hotel => "hotel",
            TemplateKey::Vehicle => "vehicle",
            TemplateKey::Table => "table",
            TemplateKey::Other(s) => s,
        }
    }

    pub fn is_daily(&self) -> bool {
        matches!(self, TemplateKey::Daily)
    }

    pub fn is_memo(&self) -> bool {
        matches!(self, TemplateKey::Memo)
    }
}

impl From<&str> for TemplateKey {
    fn from(s: &str) -> Self {
        match s {
            "blank" => TemplateKey::Blank,
            "cover" => TemplateKey::Cover,
            "toc" => TemplateKey::Toc,
            "daily" => TemplateKey::Daily,
            "itinerary" => TemplateKey::Itinerary,
            "memo" => TemplateKey::Memo,
            "hotel" => TemplateKey::Hotel,
            "vehicle" => TemplateKey::Vehicle,
            "table" => TemplateKey::Table,
            other => TemplateKey::Other(other.to_string()),
        }
    }
}

impl From<String> for TemplateKey {
    fn from(s: String) -> Self {
        TemplateKey::from(s.as_str())
    }
}

impl From<TemplateKey> for String {
    fn from(key: TemplateKey) -> Self {
        key.as_str().to_string()
    }
}

impl fmt::Display for TemplateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─── Elements ────────────────────────────────────────────────────────────

fn default_opacity() -> f32 {
    1.0
}

fn default_visible() -> bool {
    true
}

/// Geometry and identity shared by every element kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementBase {
    pub id: String,
    /// Identity label. Template slots are located by this name.
    #[serde(default)]
    pub name: String,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    #[serde(default)]
    pub rotation: f32,
    #[serde(default = "default_opacity")]
    pub opacity: f32,
    #[serde(default)]
    pub locked: bool,
    #[serde(default = "default_visible")]
    pub visible: bool,
}

impl ElementBase {
    pub fn new(id: impl Into<String>, name: impl Into<String>, x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            x,
            y,
            width,
            height,
            rotation: 0.0,
            opacity: 1.0,
            locked: false,
            visible: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FontSpec {
    pub family: String,
    pub weight: u16, // 100..900
    pub size: f32,
}

impl Default for FontSpec {
    fn default() -> Self {
        Self {
            family: "Noto Sans TC".into(),
            weight: 400,
            size: 14.0,
        }
    }
}

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextElement {
    #[serde(flatten)]
    pub base: ElementBase,
    pub content: String,
    #[serde(default)]
    pub font: FontSpec,
    pub color: Color,
    #[serde(default)]
    pub align: TextAlign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeVariant {
    #[default]
    Rectangle,
    Circle,
    Ellipse,
    Line,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShapeElement {
    #[serde(flatten)]
    pub base: ElementBase,
    #[serde(default)]
    pub variant: ShapeVariant,
    #[serde(default)]
    pub fill: Option<Color>,
    #[serde(default)]
    pub stroke: Option<Color>,
    #[serde(default)]
    pub stroke_width: f32,
    #[serde(default)]
    pub corner_radius: f32,
}

/// How an image source maps onto its element box.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectFit {
    #[default]
    Cover,
    Contain,
    /// The source already matches the box (pre-cropped rasters).
    Fill,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageElement {
    #[serde(flatten)]
    pub base: ElementBase,
    pub src: String,
    #[serde(default)]
    pub object_fit: ObjectFit,
    /// Crop anchor the raster was produced with, kept for re-editing.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<ImagePositionSettings>,
}

/// A visual element on a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Text(TextElement),
    Shape(ShapeElement),
    Image(ImageElement),
}

impl Element {
    pub fn base(&self) -> &ElementBase {
        match self {
            Element::Text(t) => &t.base,
            Element::Shape(s) => &s.base,
            Element::Image(i) => &i.base,
        }
    }

    pub fn base_mut(&mut self) -> &mut ElementBase {
        match self {
            Element::Text(t) => &mut t.base,
            Element::Shape(s) => &mut s.base,
            Element::Image(i) => &mut i.base,
        }
    }

    pub fn id(&self) -> &str {
        &self.base().id
    }

    pub fn name(&self) -> &str {
        &self.base().name
    }

    /// Short kind label, matching the serialized `type` tag.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Element::Text(_) => "text",
            Element::Shape(_) => "shape",
            Element::Image(_) => "image",
        }
    }
}

// ─── Scene snapshots ─────────────────────────────────────────────────────

/// A serialized copy of a scene, produced and consumed by the scene bridge.
///
/// Opaque to the engine except for one structural check: a usable snapshot
/// is a JSON object with an `objects` array.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SceneSnapshot(pub Value);

impl SceneSnapshot {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// True when the snapshot can be loaded back into a scene.
    pub fn is_valid(&self) -> bool {
        self.objects().is_some()
    }

    pub fn objects(&self) -> Option<&Vec<Value>> {
        self.0.get("objects").and_then(Value::as_array)
    }

    pub fn as_value(&self) -> &Value {
        &self.0
    }
}

// ─── Image position ──────────────────────────────────────────────────────

/// Normalized crop anchor for cover-fit images.
///
/// `x`/`y` are percentages along each axis' free travel after cover-fit;
/// `scale` multiplies the computed cover scale.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImagePositionSettings {
    pub x: f64,
    pub y: f64,
    pub scale: f64,
}

impl Default for ImagePositionSettings {
    fn default() -> Self {
        Self {
            x: 50.0,
            y: 50.0,
            scale: 1.0,
        }
    }
}

impl ImagePositionSettings {
    /// Clamp the anchor into `[0, 100]` and reject unusable scales.
    pub fn validated(self) -> Result<Self, FitError> {
        if !self.x.is_finite() || !self.y.is_finite() || !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(FitError::InvalidPosition {
                x: self.x,
                y: self.y,
                scale: self.scale,
            });
        }
        Ok(Self {
            x: self.x.clamp(0.0, 100.0),
            y: self.y.clamp(0.0, 100.0),
            scale: self.scale,
        })
    }
}

// ─── Template data ───────────────────────────────────────────────────────

/// Caller-supplied data bag threaded unchanged into the template generator.
///
/// Only the fields the engine itself reads have typed accessors; everything
/// else passes through untouched.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TemplateData(pub Map<String, Value>);

impl TemplateData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    pub fn set(&mut self, key: &str, value: impl Into<Value>) {
        self.0.insert(key.to_string(), value.into());
    }

    /// A copy of this bag with one field overridden.
    pub fn with(&self, key: &str, value: impl Into<Value>) -> Self {
        let mut copy = self.clone();
        copy.set(key, value);
        copy
    }

    /// Number of itinerary days (`dailyItineraries.length`).
    pub fn daily_itinerary_count(&self) -> usize {
        self.get("dailyItineraries")
            .and_then(Value::as_array)
            .map_or(0, Vec::len)
    }

    pub fn destination(&self) -> Option<&str> {
        self.get("destination").and_then(Value::as_str)
    }

    pub fn country_code(&self) -> Option<&str> {
        self.get("countryCode")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    pub fn cover_image(&self) -> Option<&str> {
        self.get("coverImage").and_then(Value::as_str)
    }

    pub fn cover_image_position(&self) -> Option<ImagePositionSettings> {
        self.get("coverImagePosition")
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set_cover_image(&mut self, src: &str, position: ImagePositionSettings) {
        self.set("coverImage", src);
        self.set("coverImagePosition", position_value(position));
    }

    /// `dailyDetails[day].coverImage`.
    pub fn daily_cover_image(&self, day: usize) -> Option<&str> {
        self.daily_detail(day)
            .and_then(|d| d.get("coverImage"))
            .and_then(Value::as_str)
    }

    /// `dailyDetails[day].coverImagePosition`.
    pub fn daily_cover_position(&self, day: usize) -> Option<ImagePositionSettings> {
        self.daily_detail(day)
            .and_then(|d| d.get("coverImagePosition"))
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    /// Store a day's cover image, growing `dailyDetails` as needed.
    pub fn set_daily_cover(&mut self, day: usize, src: &str, position: ImagePositionSettings) {
        let details = self
            .0
            .entry("dailyDetails")
            .or_insert_with(|| Value::Array(Vec::new()));
        if !details.is_array() {
            *details = Value::Array(Vec::new());
        }
        let Value::Array(days) = details else { return };
        while days.len() <= day {
            let day_number = days.len() + 1;
            days.push(serde_json::json!({ "dayNumber": day_number }));
        }
        if !days[day].is_object() {
            days[day] = serde_json::json!({ "dayNumber": day + 1 });
        }
        if let Value::Object(entry) = &mut days[day] {
            entry.insert("coverImage".into(), Value::String(src.to_string()));
            entry.insert("coverImagePosition".into(), position_value(position));
        }
    }

    fn daily_detail(&self, day: usize) -> Option<&Map<String, Value>> {
        self.get("dailyDetails")
            .and_then(Value::as_array)
            .and_then(|days| days.get(day))
            .and_then(Value::as_object)
    }
}

fn position_value(position: ImagePositionSettings) -> Value {
    serde_json::json!({ "x": position.x, "y": position.y, "scale": position.scale })
}

// ─── Style series ────────────────────────────────────────────────────────

/// A visual style family and the template id it uses for each page kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleSeries {
    pub id: String,
    pub name: String,
    pub templates: HashMap<TemplateKey, String>,
}

impl StyleSeries {
    pub fn template_for(&self, key: &TemplateKey) -> Option<&str> {
        self.templates.get(key).map(String::as_str).filter(|id| !id.is_empty())
    }
}

// ─── Pages ───────────────────────────────────────────────────────────────

/// One unit of the designed document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub id: PageId,
    pub name: String,
    pub template_key: TemplateKey,
    pub width: f32,
    pub height: f32,
    pub background_color: Color,
    #[serde(default)]
    pub elements: Vec<Element>,
    /// Last-known serialized scene; absent until the page was left once.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fabric_data: Option<SceneSnapshot>,
    /// Itinerary day rendered by a daily page. Authoritative once stamped.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day_index: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memo_page_content: Option<MemoPageContent>,
}

impl Page {
    pub fn new(id: PageId, name: impl Into<String>, template_key: TemplateKey, width: f32, height: f32) -> Self {
        Self {
            id,
            name: name.into(),
            template_key,
            width,
            height,
            background_color: Color::WHITE,
            elements: Vec::new(),
            fabric_data: None,
            day_index: None,
            memo_page_content: None,
        }
    }

    /// The stored snapshot, if it is structurally loadable.
    pub fn valid_snapshot(&self) -> Option<&SceneSnapshot> {
        self.fabric_data.as_ref().filter(|s| s.is_valid())
    }

    pub fn find_element(&self, name: &str) -> Option<&Element> {
        self.elements.iter().find(|e| e.name() == name)
    }
}
