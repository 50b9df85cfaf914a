//! Travel memo content: destination presets and page splitting.
//!
//! Memo pages show up to [`ITEMS_PER_PAGE`] tips each, plus one optional
//! weather/emergency page when any season or info entry is enabled.

use crate::model::Page;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::collections::HashSet;

/// Tips rendered on one memo page.
pub const ITEMS_PER_PAGE: usize = 4;

// ─── Types ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoCategory {
    Etiquette,
    Flight,
    Transport,
    Payment,
    Health,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoItem {
    pub id: String,
    pub category: MemoCategory,
    pub icon: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_zh: Option<String>,
    pub content: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeasonInfo {
    pub season: String,
    pub months: String,
    pub description: String,
    pub enabled: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoInfoItem {
    pub id: String,
    pub title: String,
    pub content: String,
    pub enabled: bool,
}

/// The full memo configuration for a destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoSettings {
    pub title: String,
    pub subtitle: String,
    pub header_icon: String,
    pub footer_text: String,
    pub items: Vec<MemoItem>,
    #[serde(default)]
    pub seasons: Vec<SeasonInfo>,
    #[serde(default)]
    pub info_items: Vec<MemoInfoItem>,
}

impl MemoSettings {
    fn enabled_items(&self) -> impl Iterator<Item = &MemoItem> {
        self.items.iter().filter(|i| i.enabled)
    }

    fn has_weather_page(&self) -> bool {
        self.seasons.iter().any(|s| s.enabled) || self.info_items.iter().any(|i| i.enabled)
    }
}

/// What one memo page shows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoPageContent {
    #[serde(default)]
    pub items: SmallVec<[MemoItem; ITEMS_PER_PAGE]>,
    #[serde(default)]
    pub is_weather_page: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub seasons: Vec<SeasonInfo>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub info_items: Vec<MemoInfoItem>,
}

// ─── Destinations ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CountryCode {
    JP,
    TH,
    KR,
    VN,
    CN,
    TW,
    GU,
    #[serde(rename = "OTHER")]
    Other,
}

impl CountryCode {
    /// Resolve an ISO code (`JP`), or a Chinese or English country name
    /// contained anywhere in free text (`"Tokyo, Japan"`, `"日本關西"`).
    pub fn from_name(name_or_code: &str) -> Self {
        let trimmed = name_or_code.trim();
        match trimmed.to_uppercase().as_str() {
            "JP" => return CountryCode::JP,
            "TH" => return CountryCode::TH,
            "KR" => return CountryCode::KR,
            "VN" => return CountryCode::VN,
            "CN" => return CountryCode::CN,
            "TW" => return CountryCode::TW,
            "GU" => return CountryCode::GU,
            _ => {}
        }

        let input = trimmed.to_lowercase();
        let table: [(&[&str], CountryCode); 7] = [
            (&["日本", "japan"], CountryCode::JP),
            (&["泰國", "泰国", "thailand"], CountryCode::TH),
            (&["韓國", "韩国", "korea"], CountryCode::KR),
            (&["越南", "vietnam"], CountryCode::VN),
            (&["中國", "中国", "china"], CountryCode::CN),
            (&["台灣", "台湾", "taiwan"], CountryCode::TW),
            (&["關島", "关岛", "guam"], CountryCode::GU),
        ];
        table
            .iter()
            .find(|(needles, _)| needles.iter().any(|n| input.contains(n)))
            .map_or(CountryCode::Other, |(_, code)| *code)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CountryCode::JP => "Japan",
            CountryCode::TH => "Thailand",
            CountryCode::KR => "Korea",
            CountryCode::VN => "Vietnam",
            CountryCode::CN => "China",
            CountryCode::TW => "Taiwan",
            CountryCode::GU => "Guam",
            CountryCode::Other => "Other",
        }
    }
}

// ─── Presets ─────────────────────────────────────────────────────────────

fn item(id: &str, category: MemoCategory, icon: &str, title: &str, content: &str) -> MemoItem {
    MemoItem {
        id: id.into(),
        category,
        icon: icon.into(),
        title: title.into(),
        title_zh: None,
        content: content.into(),
        enabled: true,
    }
}

fn season(season: &str, months: &str, description: &str) -> SeasonInfo {
    SeasonInfo {
        season: season.into(),
        months: months.into(),
        description: description.into(),
        enabled: true,
    }
}

fn info(id: &str, title: &str, content: &str) -> MemoInfoItem {
    MemoInfoItem {
        id: id.into(),
        title: title.into(),
        content: content.into(),
        enabled: true,
    }
}

fn flight_items(prefix: &str) -> [MemoItem; 2] {
    use MemoCategory::Flight;
    [
        item(
            &format!("{prefix}-flight-1"),
            Flight,
            "schedule",
            "Airport arrival",
            "Arrive at the airport 2-3 hours before departure to clear check-in and security.",
        ),
        item(
            &format!("{prefix}-flight-2"),
            Flight,
            "water_drop",
            "Cabin liquids",
            "Liquids in carry-on luggage are limited to 100ml per container, packed in one resealable 1L bag.",
        ),
    ]
}

fn japan() -> MemoSettings {
    use MemoCategory::*;
    let mut items = vec![
        item("jp-etiquette-1", Etiquette, "volume_off", "Quiet on trains", "Keep phones on silent and avoid calls on trains."),
        item("jp-etiquette-2", Etiquette, "footprint", "Shoes off indoors", "Remove shoes at entrances, tatami rooms and fitting rooms."),
        item("jp-etiquette-3", Etiquette, "delete_outline", "Carry your rubbish", "Public bins are rare; bring a bag and dispose of rubbish at the hotel."),
        item("jp-payment-1", Payment, "payments", "Cash still matters", "Smaller shops and shrines may be cash only; carry some yen."),
    ];
    items.extend(flight_items("jp"));
    MemoSettings {
        title: "Japan travel tips".into(),
        subtitle: "Travel Tips".into(),
        header_icon: "local_florist".into(),
        footer_text: "Notes for the road".into(),
        items,
        seasons: vec![
            season("Spring", "3-5", "Mild, cherry blossoms late March to early April."),
            season("Summer", "6-8", "Hot and humid, rainy season in June."),
            season("Autumn", "9-11", "Cool and dry, autumn leaves in November."),
            season("Winter", "12-2", "Cold, snow in the north and mountains."),
        ],
        info_items: vec![
            info("jp-info-police", "Police", "110"),
            info("jp-info-ambulance", "Fire / Ambulance", "119"),
        ],
    }
}

fn thailand() -> MemoSettings {
    use MemoCategory::*;
    let mut items = vec![
        item("th-etiquette-1", Etiquette, "temple_buddhist", "Temple dress code", "Cover shoulders and knees when visiting temples."),
        item("th-etiquette-2", Etiquette, "front_hand", "Respect the monarchy", "Never make negative remarks about the royal family."),
        item("th-health-1", Health, "water_bottle", "Bottled water", "Drink bottled water only and avoid ice of unknown origin."),
    ];
    items.extend(flight_items("th"));
    MemoSettings {
        title: "Thailand travel tips".into(),
        subtitle: "Travel Tips".into(),
        header_icon: "sunny".into(),
        footer_text: "Notes for the road".into(),
        items,
        seasons: vec![
            season("Cool season", "11-2", "Dry and pleasant, the best time to visit."),
            season("Hot season", "3-5", "Very hot, stay hydrated."),
            season("Rainy season", "6-10", "Afternoon downpours."),
        ],
        info_items: vec![info("th-info-tourist-police", "Tourist police", "1155")],
    }
}

fn korea() -> MemoSettings {
    use MemoCategory::*;
    let mut items = vec![
        item("kr-etiquette-1", Etiquette, "elderly", "Priority seats", "Leave priority seats on the subway for the elderly."),
        item("kr-transport-1", Transport, "credit_card", "Transit card", "A T-money card works on subways, buses and in convenience stores."),
        item("kr-payment-1", Payment, "receipt_long", "No tipping", "Tipping is not customary in restaurants or taxis."),
    ];
    items.extend(flight_items("kr"));
    MemoSettings {
        title: "Korea travel tips".into(),
        subtitle: "Travel Tips".into(),
        header_icon: "local_florist".into(),
        footer_text: "Notes for the road".into(),
        items,
        seasons: vec![
            season("Spring", "4-5", "Mild with cherry blossoms."),
            season("Winter", "12-2", "Very cold and dry, dress in layers."),
        ],
        info_items: vec![info("kr-info-emergency", "Emergency", "112 / 119")],
    }
}

fn vietnam() -> MemoSettings {
    use MemoCategory::*;
    let mut items = vec![
        item("vn-transport-1", Transport, "two_wheeler", "Crossing the street", "Walk at a steady pace; motorbikes will flow around you."),
        item("vn-payment-1", Payment, "payments", "Count your notes", "Dong notes look alike; check denominations before paying."),
    ];
    items.extend(flight_items("vn"));
    MemoSettings {
        title: "Vietnam travel tips".into(),
        subtitle: "Travel Tips".into(),
        header_icon: "sunny".into(),
        footer_text: "Notes for the road".into(),
        items,
        seasons: vec![season("Dry season", "12-4", "Comfortable in the south, cool in the north.")],
        info_items: vec![info("vn-info-emergency", "Police / Ambulance", "113 / 115")],
    }
}

fn general() -> MemoSettings {
    let mut items = vec![item(
        "default-health-1",
        MemoCategory::Health,
        "medication",
        "Personal medicine",
        "Bring enough personal medication for the whole trip, in original packaging.",
    )];
    items.extend(flight_items("default"));
    MemoSettings {
        title: "Travel tips".into(),
        subtitle: "Travel Tips".into(),
        header_icon: "flight".into(),
        footer_text: "Notes for the road".into(),
        items,
        seasons: Vec::new(),
        info_items: Vec::new(),
    }
}

/// Owned memo preset for a destination.
pub fn memo_settings_for(code: CountryCode) -> MemoSettings {
    match code {
        CountryCode::JP => japan(),
        CountryCode::TH => thailand(),
        CountryCode::KR => korea(),
        CountryCode::VN => vietnam(),
        _ => general(),
    }
}

// ─── Page splitting ──────────────────────────────────────────────────────

/// Number of memo pages needed for the enabled content.
pub fn memo_page_count(settings: &MemoSettings) -> usize {
    let item_pages = settings.enabled_items().count().div_ceil(ITEMS_PER_PAGE);
    item_pages + usize::from(settings.has_weather_page())
}

/// Content of the memo page at `page_index`.
///
/// Item pages come first; the page after them is the weather page when one
/// exists. Indices past the end yield an empty, non-weather page.
pub fn memo_items_for_page(settings: &MemoSettings, page_index: usize) -> MemoPageContent {
    let item_pages = settings.enabled_items().count().div_ceil(ITEMS_PER_PAGE);
    if page_index < item_pages {
        return MemoPageContent {
            items: settings
                .enabled_items()
                .skip(page_index * ITEMS_PER_PAGE)
                .take(ITEMS_PER_PAGE)
                .cloned()
                .collect(),
            ..Default::default()
        };
    }
    if page_index == item_pages && settings.has_weather_page() {
        return MemoPageContent {
            items: SmallVec::new(),
            is_weather_page: true,
            seasons: settings.seasons.iter().filter(|s| s.enabled).cloned().collect(),
            info_items: settings.info_items.iter().filter(|i| i.enabled).cloned().collect(),
        };
    }
    MemoPageContent::default()
}

/// Ids of every memo item already placed on some page, first-seen order,
/// without duplicates.
pub fn used_memo_item_ids(pages: &[Page]) -> Vec<String> {
    let mut seen = HashSet::new();
    pages
        .iter()
        .filter_map(|p| p.memo_page_content.as_ref())
        .flat_map(|c| c.items.iter())
        .filter(|item| !item.id.is_empty() && seen.insert(item.id.as_str()))
        .map(|item| item.id.clone())
        .collect()
}
