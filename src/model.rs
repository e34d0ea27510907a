use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// View/style badges a room can carry.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    OceanView,
    GardenView,
    CityView,
    MountainView,
    PoolView,
    Popular,
    Business,
    FamilyFriendly,
    Romantic,
    Premium,
    Luxury,
}

impl Tag {
    pub const ALL: [Tag; 11] = [
        Tag::OceanView,
        Tag::GardenView,
        Tag::CityView,
        Tag::MountainView,
        Tag::PoolView,
        Tag::Popular,
        Tag::Business,
        Tag::FamilyFriendly,
        Tag::Romantic,
        Tag::Premium,
        Tag::Luxury,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Tag::OceanView => "tag_ocean_view",
            Tag::GardenView => "tag_garden_view",
            Tag::CityView => "tag_city_view",
            Tag::MountainView => "tag_mountain_view",
            Tag::PoolView => "tag_pool_view",
            Tag::Popular => "tag_popular",
            Tag::Business => "tag_business",
            Tag::FamilyFriendly => "tag_family_friendly",
            Tag::Romantic => "tag_romantic",
            Tag::Premium => "tag_premium",
            Tag::Luxury => "tag_luxury",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Tag::OceanView => "Ocean View",
            Tag::GardenView => "Garden View",
            Tag::CityView => "City View",
            Tag::MountainView => "Mountain View",
            Tag::PoolView => "Pool View",
            Tag::Popular => "Popular",
            Tag::Business => "Business",
            Tag::FamilyFriendly => "Family Friendly",
            Tag::Romantic => "Romantic",
            Tag::Premium => "Premium",
            Tag::Luxury => "Luxury",
        }
    }
}

/// In-room amenity flags.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Amenity {
    Wifi,
    Tv,
    Workspace,
    Kitchen,
    GameConsole,
    Parking,
    Jacuzzi,
    CoffeeMachine,
    KingBed,
    Safe,
    BusinessPhone,
}

impl Amenity {
    pub const ALL: [Amenity; 11] = [
        Amenity::Wifi,
        Amenity::Tv,
        Amenity::Workspace,
        Amenity::Kitchen,
        Amenity::GameConsole,
        Amenity::Parking,
        Amenity::Jacuzzi,
        Amenity::CoffeeMachine,
        Amenity::KingBed,
        Amenity::Safe,
        Amenity::BusinessPhone,
    ];

    pub fn column(&self) -> &'static str {
        match self {
            Amenity::Wifi => "has_wifi",
            Amenity::Tv => "has_tv",
            Amenity::Workspace => "has_workspace",
            Amenity::Kitchen => "has_kitchen",
            Amenity::GameConsole => "has_game_console",
            Amenity::Parking => "has_parking",
            Amenity::Jacuzzi => "has_jacuzzi",
            Amenity::CoffeeMachine => "has_coffeemachine",
            Amenity::KingBed => "has_kingsize_bed",
            Amenity::Safe => "has_secure",
            Amenity::BusinessPhone => "has_businessphone",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Amenity::Wifi => "Free WiFi",
            Amenity::Tv => "Smart TV",
            Amenity::Workspace => "Workspace",
            Amenity::Kitchen => "Mini Kitchen",
            Amenity::GameConsole => "Game Console",
            Amenity::Parking => "Parking",
            Amenity::Jacuzzi => "Jacuzzi",
            Amenity::CoffeeMachine => "Coffee Machine",
            Amenity::KingBed => "King Bed",
            Amenity::Safe => "In-room Safe",
            Amenity::BusinessPhone => "Business Phone",
        }
    }
}

/// A boolean catalog attribute that can be searched for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feature {
    Tag(Tag),
    Amenity(Amenity),
}

impl Feature {
    pub fn column(&self) -> &'static str {
        match self {
            Feature::Tag(t) => t.column(),
            Feature::Amenity(a) => a.column(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Id,
    Ja,
    Fr,
    De,
    Es,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::En,
        Language::Id,
        Language::Ja,
        Language::Fr,
        Language::De,
        Language::Es,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            Language::En => "en",
            Language::Id => "id",
            Language::Ja => "ja",
            Language::Fr => "fr",
            Language::De => "de",
            Language::Es => "es",
        }
    }

    /// Parse a language tag such as `fr` or `fr-CA`; only the primary subtag counts.
    pub fn parse_tag(tag: &str) -> Option<Language> {
        let primary = tag.trim().split(['-', '_']).next()?.to_ascii_lowercase();
        Language::ALL.into_iter().find(|l| l.code() == primary)
    }
}

/// Per-language room descriptions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct LocalizedText {
    pub en: String,
    pub id: String,
    pub ja: String,
    pub fr: String,
    pub de: String,
    pub es: String,
}

impl LocalizedText {
    pub fn field(&self, lang: Language) -> &str {
        match lang {
            Language::En => &self.en,
            Language::Id => &self.id,
            Language::Ja => &self.ja,
            Language::Fr => &self.fr,
            Language::De => &self.de,
            Language::Es => &self.es,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Room {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub descriptions: LocalizedText,
    pub image: Option<String>,
    pub price: Decimal,
    pub capacity: i64,
    pub tags: Vec<Tag>,
    pub amenities: Vec<Amenity>,
}

impl Room {
    /// Requested language, then English, then the base description, then empty.
    pub fn localized_description(&self, lang: Language) -> &str {
        [
            self.descriptions.field(lang),
            self.descriptions.en.as_str(),
            self.description.as_str(),
        ]
        .into_iter()
        .find(|s| !s.is_empty())
        .unwrap_or("")
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }

    pub fn has_amenity(&self, amenity: Amenity) -> bool {
        self.amenities.contains(&amenity)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum AccommodationType {
    Deluxe,
    Standard,
    Romantic,
    Family,
    Executive,
    Premium,
}

impl AccommodationType {
    pub const ALL: [AccommodationType; 6] = [
        AccommodationType::Deluxe,
        AccommodationType::Standard,
        AccommodationType::Romantic,
        AccommodationType::Family,
        AccommodationType::Executive,
        AccommodationType::Premium,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccommodationType::Deluxe => "Deluxe",
            AccommodationType::Standard => "Standard",
            AccommodationType::Romantic => "Romantic",
            AccommodationType::Family => "Family",
            AccommodationType::Executive => "Executive",
            AccommodationType::Premium => "Premium",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            AccommodationType::Deluxe => "Deluxe Ocean Suite",
            AccommodationType::Standard => "Standard City Room",
            AccommodationType::Romantic => "Romantic Honeymoon Suite",
            AccommodationType::Family => "Family Garden Room",
            AccommodationType::Executive => "Executive Business Suite",
            AccommodationType::Premium => "Premium Ocean View",
        }
    }

    pub fn parse(s: &str) -> Option<AccommodationType> {
        AccommodationType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Success,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Success => "success",
            PaymentStatus::Failed => "failed",
            PaymentStatus::Cancelled => "cancelled",
        }
    }

    pub fn parse_status(s: &str) -> Option<PaymentStatus> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "success" => Some(PaymentStatus::Success),
            "failed" => Some(PaymentStatus::Failed),
            "cancelled" => Some(PaymentStatus::Cancelled),
            _ => None,
        }
    }
}

/// Where a booking sits in the payment flow, derived from status and token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingStage {
    AwaitingGateway,
    SessionAttached,
    Reconciled(PaymentStatus),
}

#[derive(Debug, Clone, Serialize)]
pub struct Booking {
    pub id: i64,
    pub arrival_date: NaiveDate,
    pub departure_date: NaiveDate,
    pub guest_count: i64,
    pub room_count: i64,
    pub accommodation_type: AccommodationType,
    pub additional_notes: Option<String>,
    pub primary_guest: String,
    pub contact_email: String,
    pub contact_phone: String,
    pub order_id: String,
    pub amount: Decimal,
    pub payment_status: PaymentStatus,
    pub snap_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    pub fn stage(&self) -> BookingStage {
        match (self.payment_status, &self.snap_token) {
            (PaymentStatus::Pending, None) => BookingStage::AwaitingGateway,
            (PaymentStatus::Pending, Some(_)) => BookingStage::SessionAttached,
            (status, _) => BookingStage::Reconciled(status),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ContactMessage {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub subject: String,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

pub fn cents_to_decimal(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Rounds to two places; `None` when the value does not fit in i64 cents.
pub fn decimal_to_cents(value: Decimal) -> Option<i64> {
    value
        .round_dp(2)
        .checked_mul(Decimal::ONE_HUNDRED)
        .and_then(|cents| cents.to_i64())
}

/// Case folding used for stored search text and search terms alike.
pub fn fold_search_text(s: &str) -> String {
    s.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn room_with(descriptions: LocalizedText, base: &str) -> Room {
        Room {
            id: 1,
            name: "Deluxe Ocean Suite".into(),
            description: base.into(),
            descriptions,
            image: None,
            price: Decimal::new(28900, 2),
            capacity: 2,
            tags: vec![],
            amenities: vec![],
        }
    }

    #[test]
    fn description_falls_back_to_english_then_base() {
        let text = LocalizedText {
            en: "Sea breeze".into(),
            fr: "Brise marine".into(),
            ..Default::default()
        };
        let room = room_with(text, "base");
        assert_eq!(room.localized_description(Language::Fr), "Brise marine");
        assert_eq!(room.localized_description(Language::Ja), "Sea breeze");

        let room = room_with(LocalizedText::default(), "base");
        assert_eq!(room.localized_description(Language::De), "base");

        let room = room_with(LocalizedText::default(), "");
        assert_eq!(room.localized_description(Language::Es), "");
    }

    #[test]
    fn language_tag_uses_primary_subtag() {
        assert_eq!(Language::parse_tag("fr-CA"), Some(Language::Fr));
        assert_eq!(Language::parse_tag(" JA "), Some(Language::Ja));
        assert_eq!(Language::parse_tag("pt-BR"), None);
    }

    #[test]
    fn cents_conversion_rounds_to_two_places() {
        assert_eq!(decimal_to_cents(Decimal::from_str("774.00").unwrap()), Some(77400));
        assert_eq!(decimal_to_cents(Decimal::from_str("0.125").unwrap()), Some(12));
        assert_eq!(cents_to_decimal(12900).to_string(), "129.00");
    }

    #[test]
    fn search_folding_handles_non_ascii() {
        assert_eq!(fold_search_text("Suite ÉMERAUDE"), "suite émeraude");
        assert_eq!(fold_search_text("Émeraude"), fold_search_text("émeraude"));
    }

    #[test]
    fn accommodation_parse_is_exact() {
        assert_eq!(
            AccommodationType::parse("Standard"),
            Some(AccommodationType::Standard)
        );
        assert_eq!(AccommodationType::parse("standard"), None);
        assert_eq!(AccommodationType::parse(""), None);
    }
}
