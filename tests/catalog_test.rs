use lonergarden::catalog::{
    import_room, RoomCatalog, RoomListParams, RoomQuery, SearchKeywords, PAGE_SIZE,
};
use lonergarden::db::{self, NewRoom};
use lonergarden::model::{Amenity, LocalizedText, Tag};
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePoolOptions;

async fn setup_pool() -> sqlx::SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();
    pool
}

fn room(name: &str, price_cents: i64, capacity: i64) -> NewRoom {
    NewRoom {
        name: name.to_string(),
        description: String::new(),
        descriptions: LocalizedText::default(),
        image: None,
        price: Decimal::new(price_cents, 2),
        capacity,
        tags: vec![],
        amenities: vec![],
    }
}

async fn seed(pool: &sqlx::SqlitePool, rooms: Vec<NewRoom>) {
    for r in rooms {
        db::insert_room(pool, &r).await.unwrap();
    }
}

fn query(pairs: &[(&str, &str)]) -> RoomQuery {
    let mut p = RoomListParams::default();
    for (k, v) in pairs {
        let v = Some(v.to_string());
        match *k {
            "search" => p.search = v,
            "price_range" => p.price_range = v,
            "guest_capacity" => p.guest_capacity = v,
            "view_type" => p.view_type = v,
            "sort_by" => p.sort_by = v,
            "offset" => p.offset = v,
            other => panic!("unknown param {other}"),
        }
    }
    RoomQuery::from_params(&p)
}

fn names(page: &lonergarden::catalog::RoomPage) -> Vec<&str> {
    page.rooms.iter().map(|r| r.name.as_str()).collect()
}

#[tokio::test]
async fn medium_price_range_is_half_open() {
    let pool = setup_pool().await;
    seed(
        &pool,
        vec![
            room("Exactly 200", 20000, 2),
            room("Just above 200", 20001, 2),
            room("Exactly 350", 35000, 2),
            room("Above 350", 35001, 2),
        ],
    )
    .await;
    let catalog = RoomCatalog::new(pool);

    let page = catalog.list(&query(&[("price_range", "medium")])).await.unwrap();
    assert_eq!(names(&page), vec!["Just above 200", "Exactly 350"]);

    let page = catalog.list(&query(&[("price_range", "low")])).await.unwrap();
    assert_eq!(names(&page), vec!["Exactly 200"]);

    let page = catalog.list(&query(&[("price_range", "high")])).await.unwrap();
    assert_eq!(names(&page), vec!["Above 350"]);

    // Unknown values are ignored rather than rejected.
    let page = catalog.list(&query(&[("price_range", "cheap")])).await.unwrap();
    assert_eq!(page.total, 4);
}

#[tokio::test]
async fn guest_capacity_buckets() {
    let pool = setup_pool().await;
    seed(
        &pool,
        vec![
            room("Single", 10000, 1),
            room("Double", 10000, 2),
            room("Triple", 10000, 3),
            room("Quad", 10000, 4),
            room("Family", 10000, 5),
            room("Villa", 10000, 8),
        ],
    )
    .await;
    let catalog = RoomCatalog::new(pool);

    let two = catalog.list(&query(&[("guest_capacity", "2")])).await.unwrap();
    assert_eq!(names(&two), vec!["Single", "Double"]);

    let four = catalog.list(&query(&[("guest_capacity", "4")])).await.unwrap();
    assert_eq!(names(&four), vec!["Triple", "Quad"]);

    let five = catalog.list(&query(&[("guest_capacity", "5")])).await.unwrap();
    assert_eq!(names(&five), vec!["Family", "Villa"]);

    let ignored = catalog.list(&query(&[("guest_capacity", "3")])).await.unwrap();
    assert_eq!(ignored.total, 6);
    let ignored = catalog.list(&query(&[("guest_capacity", "lots")])).await.unwrap();
    assert_eq!(ignored.total, 6);
}

#[tokio::test]
async fn search_matches_text_or_feature_flag() {
    let pool = setup_pool().await;
    let mut by_text = room("Quiet Room", 10000, 2);
    by_text.description = "Fast WiFi included".into();
    let mut by_flag = room("Garden Loft", 10000, 2);
    by_flag.amenities = vec![Amenity::Wifi];
    let mut by_name = room("Wifi Lounge Suite", 10000, 2);
    by_name.tags = vec![Tag::Business];
    let plain = room("Basic Room", 10000, 2);
    seed(&pool, vec![by_text, by_flag, by_name, plain]).await;
    let catalog = RoomCatalog::new(pool);

    let page = catalog.list(&query(&[("search", "wifi")])).await.unwrap();
    assert_eq!(names(&page), vec!["Quiet Room", "Garden Loft", "Wifi Lounge Suite"]);

    // Terms are OR-combined and results are not duplicated.
    let page = catalog
        .list(&query(&[("search", "WIFI business")]))
        .await
        .unwrap();
    assert_eq!(page.total, 3);
    assert_eq!(page.rooms.len(), 3);

    // Keywords match inside longer terms: "garden-view" carries "garden".
    let page = catalog.list(&query(&[("search", "garden-view")])).await.unwrap();
    assert_eq!(page.total, 0, "no room has the garden view flag");
}

#[tokio::test]
async fn search_folds_non_ascii_case() {
    let pool = setup_pool().await;
    let mut suite = room("Suite Émeraude", 42000, 2);
    suite.description = "Vue sur le jardin, CAFÉ offert".into();
    seed(&pool, vec![suite, room("Basic Room", 10000, 2)]).await;
    let catalog = RoomCatalog::new(pool);

    for term in ["Émeraude", "émeraude", "ÉMERAUDE", "café"] {
        let page = catalog.list(&query(&[("search", term)])).await.unwrap();
        assert_eq!(names(&page), vec!["Suite Émeraude"], "term {term}");
    }
}

#[tokio::test]
async fn view_type_uses_tag_flag() {
    let pool = setup_pool().await;
    let mut ocean = room("Sea Breeze", 30000, 2);
    ocean.tags = vec![Tag::OceanView];
    let mut city = room("Skyline", 30000, 2);
    city.tags = vec![Tag::CityView, Tag::Business];
    seed(&pool, vec![ocean, city]).await;
    let catalog = RoomCatalog::new(pool);

    let page = catalog.list(&query(&[("view_type", "ocean")])).await.unwrap();
    assert_eq!(names(&page), vec!["Sea Breeze"]);
    let page = catalog.list(&query(&[("view_type", "City_View")])).await.unwrap();
    assert_eq!(names(&page), vec!["Skyline"]);
}

#[tokio::test]
async fn pagination_of_ten_rooms() {
    let pool = setup_pool().await;
    seed(
        &pool,
        (1..=10).map(|i| room(&format!("Room {i:02}"), 15000, 2)).collect(),
    )
    .await;
    let catalog = RoomCatalog::new(pool);
    assert_eq!(catalog.page_size(), PAGE_SIZE);

    let first = catalog.list(&query(&[])).await.unwrap();
    assert_eq!(first.rooms.len(), 6);
    assert!(first.has_more);
    assert_eq!(first.next_offset, 6);
    assert_eq!(first.total, 10);

    let second = catalog.list(&query(&[("offset", "6")])).await.unwrap();
    assert_eq!(second.rooms.len(), 4);
    assert!(!second.has_more);
    assert_eq!(names(&second)[0], "Room 07");

    let beyond = catalog.list(&query(&[("offset", "60")])).await.unwrap();
    assert!(beyond.rooms.is_empty());
    assert!(!beyond.has_more);

    let malformed = catalog.list(&query(&[("offset", "abc")])).await.unwrap();
    assert_eq!(names(&malformed), names(&first));
}

#[tokio::test]
async fn sorting_is_stable_on_ties() {
    let pool = setup_pool().await;
    seed(
        &pool,
        vec![
            room("A", 20000, 2),
            room("B", 10000, 4),
            room("C", 20000, 4),
            room("D", 10000, 2),
        ],
    )
    .await;
    let catalog = RoomCatalog::new(pool);

    let asc = catalog.list(&query(&[("sort_by", "price_low")])).await.unwrap();
    assert_eq!(names(&asc), vec!["B", "D", "A", "C"]);
    let desc = catalog.list(&query(&[("sort_by", "price_high")])).await.unwrap();
    assert_eq!(names(&desc), vec!["A", "C", "B", "D"]);
    let size = catalog.list(&query(&[("sort_by", "room_size")])).await.unwrap();
    assert_eq!(names(&size), vec!["B", "C", "A", "D"]);
    let none = catalog.list(&query(&[("sort_by", "random")])).await.unwrap();
    assert_eq!(names(&none), vec!["A", "B", "C", "D"]);
}

#[tokio::test]
async fn injected_page_size_and_keywords() {
    let pool = setup_pool().await;
    let mut spa = room("Spa Room", 10000, 2);
    spa.amenities = vec![Amenity::Jacuzzi];
    seed(
        &pool,
        vec![spa, room("Other 1", 10000, 2), room("Other 2", 10000, 2)],
    )
    .await;

    static ONLY_TUB: &[(&str, lonergarden::model::Feature)] = &[(
        "tub",
        lonergarden::model::Feature::Amenity(Amenity::Jacuzzi),
    )];
    let catalog = RoomCatalog::with_settings(pool, SearchKeywords::new(ONLY_TUB), 2);

    let page = catalog.list(&query(&[("search", "hottub")])).await.unwrap();
    assert_eq!(names(&page), vec!["Spa Room"]);
    let page = catalog.list(&query(&[("search", "jacuzzi")])).await.unwrap();
    assert!(page.rooms.is_empty());

    let page = catalog.list(&query(&[])).await.unwrap();
    assert_eq!(page.rooms.len(), 2);
    assert!(page.has_more);
    assert_eq!(page.next_offset, 2);
}

#[tokio::test]
async fn import_applies_editorial_rules() {
    let pool = setup_pool().await;

    let mut crowded = room("Crowded", 10000, 2);
    crowded.tags = vec![Tag::Popular, Tag::Luxury, Tag::Romantic];
    let err = import_room(&pool, crowded).await.unwrap_err();
    assert!(err.to_string().contains("Crowded"));
    assert_eq!(db::count_rooms(&pool).await.unwrap(), 0);

    let mut localized = room("Lagoon", 25900, 2);
    localized.descriptions.en = "Overlooks the lagoon".into();
    localized.descriptions.id = "Menghadap laguna".into();
    import_room(&pool, localized).await.unwrap();

    let page = RoomCatalog::new(pool).list(&query(&[])).await.unwrap();
    assert_eq!(page.rooms[0].description, "Overlooks the lagoon");
    assert_eq!(page.rooms[0].price, Decimal::new(25900, 2));
}
