//! Room catalog: list filtering, free-text search and pagination.
//!
//! `RoomListParams` is what arrives on the query string. It is parsed leniently
//! into a `RoomQuery` (unknown values simply drop the filter) which
//! `RoomCatalog` turns into SQL.

use anyhow::Result;
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};
use thiserror::Error;
use tracing::{debug, instrument};

use crate::db::{self, NewRoom, Pool};
use crate::model::{fold_search_text, Amenity, Feature, Room, Tag};

pub const PAGE_SIZE: u32 = 6;
pub const MAX_TAGS: usize = 2;
pub const MAX_AMENITIES: usize = 2;

/// Search keywords that select a feature flag when they occur inside a term.
pub const FEATURE_KEYWORDS: &[(&str, Feature)] = &[
    ("ocean", Feature::Tag(Tag::OceanView)),
    ("garden", Feature::Tag(Tag::GardenView)),
    ("city", Feature::Tag(Tag::CityView)),
    ("mountain", Feature::Tag(Tag::MountainView)),
    ("pool", Feature::Tag(Tag::PoolView)),
    ("popular", Feature::Tag(Tag::Popular)),
    ("business", Feature::Tag(Tag::Business)),
    ("family", Feature::Tag(Tag::FamilyFriendly)),
    ("friendly", Feature::Tag(Tag::FamilyFriendly)),
    ("romantic", Feature::Tag(Tag::Romantic)),
    ("premium", Feature::Tag(Tag::Premium)),
    ("luxury", Feature::Tag(Tag::Luxury)),
    ("wifi", Feature::Amenity(Amenity::Wifi)),
    ("tv", Feature::Amenity(Amenity::Tv)),
    ("television", Feature::Amenity(Amenity::Tv)),
    ("workspace", Feature::Amenity(Amenity::Workspace)),
    ("work", Feature::Amenity(Amenity::Workspace)),
    ("desk", Feature::Amenity(Amenity::Workspace)),
    ("kitchen", Feature::Amenity(Amenity::Kitchen)),
    ("mini", Feature::Amenity(Amenity::Kitchen)),
    ("game", Feature::Amenity(Amenity::GameConsole)),
    ("console", Feature::Amenity(Amenity::GameConsole)),
    ("parking", Feature::Amenity(Amenity::Parking)),
    ("jacuzzi", Feature::Amenity(Amenity::Jacuzzi)),
    ("coffee", Feature::Amenity(Amenity::CoffeeMachine)),
    ("machine", Feature::Amenity(Amenity::CoffeeMachine)),
    ("king", Feature::Amenity(Amenity::KingBed)),
    ("bed", Feature::Amenity(Amenity::KingBed)),
    ("safe", Feature::Amenity(Amenity::Safe)),
    ("secure", Feature::Amenity(Amenity::Safe)),
    ("phone", Feature::Amenity(Amenity::BusinessPhone)),
];

#[derive(Debug, Clone, Copy)]
pub struct SearchKeywords {
    entries: &'static [(&'static str, Feature)],
}

impl Default for SearchKeywords {
    fn default() -> Self {
        Self::new(FEATURE_KEYWORDS)
    }
}

impl SearchKeywords {
    pub fn new(entries: &'static [(&'static str, Feature)]) -> Self {
        Self { entries }
    }

    /// Features whose keyword is a substring of `term` (case-insensitive), without repeats.
    pub fn features_for(&self, term: &str) -> Vec<Feature> {
        let term = term.to_lowercase();
        let mut out: Vec<Feature> = Vec::new();
        for (keyword, feature) in self.entries {
            if term.contains(keyword) && !out.contains(feature) {
                out.push(*feature);
            }
        }
        out
    }
}

/// Raw query-string parameters of the room listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoomListParams {
    pub search: Option<String>,
    pub price_range: Option<String>,
    pub guest_capacity: Option<String>,
    pub view_type: Option<String>,
    pub sort_by: Option<String>,
    pub offset: Option<String>,
    pub lang: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PriceRange {
    /// 100..=200
    Low,
    /// (200, 350]
    Medium,
    /// above 350
    High,
}

impl PriceRange {
    pub fn parse(s: &str) -> Option<PriceRange> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Some(PriceRange::Low),
            "medium" => Some(PriceRange::Medium),
            "high" => Some(PriceRange::High),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuestCapacity {
    UpToTwo,
    ThreeToFour,
    FiveOrMore,
}

impl GuestCapacity {
    pub fn parse(s: &str) -> Option<GuestCapacity> {
        match s.trim().parse::<i64>().ok()? {
            2 => Some(GuestCapacity::UpToTwo),
            4 => Some(GuestCapacity::ThreeToFour),
            5 => Some(GuestCapacity::FiveOrMore),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewType {
    Ocean,
    City,
    Garden,
}

impl ViewType {
    /// Accepts `ocean` as well as the form value `Ocean_View`.
    pub fn parse(s: &str) -> Option<ViewType> {
        let s = s.trim().to_ascii_lowercase();
        match s.strip_suffix("_view").unwrap_or(&s) {
            "ocean" => Some(ViewType::Ocean),
            "city" => Some(ViewType::City),
            "garden" => Some(ViewType::Garden),
            _ => None,
        }
    }

    pub fn tag(&self) -> Tag {
        match self {
            ViewType::Ocean => Tag::OceanView,
            ViewType::City => Tag::CityView,
            ViewType::Garden => Tag::GardenView,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortBy {
    PriceLow,
    PriceHigh,
    RoomSize,
}

impl SortBy {
    pub fn parse(s: &str) -> Option<SortBy> {
        match s.trim() {
            "price_low" => Some(SortBy::PriceLow),
            "price_high" => Some(SortBy::PriceHigh),
            "room_size" => Some(SortBy::RoomSize),
            _ => None,
        }
    }

    fn order_clause(&self) -> &'static str {
        match self {
            SortBy::PriceLow => " ORDER BY price_cents ASC, id ASC",
            SortBy::PriceHigh => " ORDER BY price_cents DESC, id ASC",
            SortBy::RoomSize => " ORDER BY capacity DESC, id ASC",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoomQuery {
    pub terms: Vec<String>,
    pub price_range: Option<PriceRange>,
    pub guest_capacity: Option<GuestCapacity>,
    pub view_type: Option<ViewType>,
    pub sort_by: Option<SortBy>,
    pub offset: u32,
}

impl RoomQuery {
    pub fn from_params(params: &RoomListParams) -> Self {
        Self {
            terms: params
                .search
                .as_deref()
                .map(|s| s.split_whitespace().map(str::to_string).collect())
                .unwrap_or_default(),
            price_range: params.price_range.as_deref().and_then(PriceRange::parse),
            guest_capacity: params
                .guest_capacity
                .as_deref()
                .and_then(GuestCapacity::parse),
            view_type: params.view_type.as_deref().and_then(ViewType::parse),
            sort_by: params.sort_by.as_deref().and_then(SortBy::parse),
            offset: params
                .offset
                .as_deref()
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct RoomPage {
    pub rooms: Vec<Room>,
    pub total: i64,
    pub has_more: bool,
    pub next_offset: u32,
}

#[derive(Debug, Clone)]
pub struct RoomCatalog {
    pool: Pool,
    keywords: SearchKeywords,
    page_size: u32,
}

impl RoomCatalog {
    pub fn new(pool: Pool) -> Self {
        Self::with_settings(pool, SearchKeywords::default(), PAGE_SIZE)
    }

    pub fn with_settings(pool: Pool, keywords: SearchKeywords, page_size: u32) -> Self {
        Self {
            pool,
            keywords,
            page_size,
        }
    }

    pub fn page_size(&self) -> u32 {
        self.page_size
    }

    #[instrument(skip_all, fields(offset = query.offset, terms = query.terms.len()))]
    pub async fn list(&self, query: &RoomQuery) -> Result<RoomPage> {
        let mut count_qb = QueryBuilder::<Sqlite>::new("SELECT COUNT(*) FROM rooms");
        self.push_filters(&mut count_qb, query);
        let total = count_qb
            .build_query_scalar::<i64>()
            .fetch_one(&self.pool)
            .await?;

        let mut qb = QueryBuilder::<Sqlite>::new(format!("SELECT {} FROM rooms", db::ROOM_COLUMNS));
        self.push_filters(&mut qb, query);
        qb.push(
            query
                .sort_by
                .map(|s| s.order_clause())
                .unwrap_or(" ORDER BY id ASC"),
        );
        qb.push(" LIMIT ")
            .push_bind(i64::from(self.page_size))
            .push(" OFFSET ")
            .push_bind(i64::from(query.offset));

        let rows = qb.build().fetch_all(&self.pool).await?;
        let rooms = rows
            .iter()
            .map(db::room_from_row)
            .collect::<Result<Vec<_>>>()?;

        let next_offset = query.offset.saturating_add(self.page_size);
        debug!(total, returned = rooms.len(), "room listing");
        Ok(RoomPage {
            rooms,
            total,
            has_more: total > i64::from(next_offset),
            next_offset,
        })
    }

    fn push_filters(&self, qb: &mut QueryBuilder<'_, Sqlite>, query: &RoomQuery) {
        qb.push(" WHERE 1 = 1");

        if !query.terms.is_empty() {
            qb.push(" AND (");
            for (i, term) in query.terms.iter().enumerate() {
                if i > 0 {
                    qb.push(" OR ");
                }
                let needle = fold_search_text(term);
                qb.push("instr(name_folded, ")
                    .push_bind(needle.clone())
                    .push(") > 0 OR instr(description_folded, ")
                    .push_bind(needle)
                    .push(") > 0");
                for feature in self.keywords.features_for(term) {
                    qb.push(" OR ").push(feature.column()).push(" = 1");
                }
            }
            qb.push(")");
        }

        match query.price_range {
            Some(PriceRange::Low) => {
                qb.push(" AND price_cents >= 10000 AND price_cents <= 20000");
            }
            Some(PriceRange::Medium) => {
                qb.push(" AND price_cents > 20000 AND price_cents <= 35000");
            }
            Some(PriceRange::High) => {
                qb.push(" AND price_cents > 35000");
            }
            None => {}
        }

        match query.guest_capacity {
            Some(GuestCapacity::UpToTwo) => {
                qb.push(" AND capacity <= 2");
            }
            Some(GuestCapacity::ThreeToFour) => {
                qb.push(" AND capacity >= 3 AND capacity <= 4");
            }
            Some(GuestCapacity::FiveOrMore) => {
                qb.push(" AND capacity >= 5");
            }
            None => {}
        }

        if let Some(view) = query.view_type {
            qb.push(" AND ").push(view.tag().column()).push(" = 1");
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomRuleError {
    #[error("room name must be non-empty")]
    EmptyName,
    #[error("room {0}: a maximum of 2 tags may be selected")]
    TooManyTags(String),
    #[error("room {0}: a maximum of 2 amenities may be selected")]
    TooManyAmenities(String),
    #[error("room {0}: price must not be negative")]
    NegativePrice(String),
    #[error("room {0}: capacity must be at least 1")]
    NoCapacity(String),
}

/// Editorial rules applied before a room is written.
pub fn validate_room(room: &NewRoom) -> Result<(), RoomRuleError> {
    let name = room.name.trim();
    if name.is_empty() {
        return Err(RoomRuleError::EmptyName);
    }
    if distinct_count(&room.tags) > MAX_TAGS {
        return Err(RoomRuleError::TooManyTags(name.to_string()));
    }
    if distinct_count(&room.amenities) > MAX_AMENITIES {
        return Err(RoomRuleError::TooManyAmenities(name.to_string()));
    }
    if room.price.is_sign_negative() {
        return Err(RoomRuleError::NegativePrice(name.to_string()));
    }
    if room.capacity < 1 {
        return Err(RoomRuleError::NoCapacity(name.to_string()));
    }
    Ok(())
}

fn distinct_count<T: PartialEq>(items: &[T]) -> usize {
    items
        .iter()
        .enumerate()
        .filter(|(i, item)| !items[..*i].contains(item))
        .count()
}

/// Validate and store a room; the base description defaults to the English text.
#[instrument(skip_all, fields(name = %room.name))]
pub async fn import_room(pool: &Pool, mut room: NewRoom) -> Result<i64> {
    validate_room(&room)?;
    if room.description.trim().is_empty() {
        room.description = room.descriptions.en.clone();
    }
    db::insert_room(pool, &room).await
}
