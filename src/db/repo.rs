use super::model::{NewBooking, NewContactMessage, NewRoom};
use crate::model::{
    cents_to_decimal, decimal_to_cents, fold_search_text, AccommodationType, Amenity, Booking,
    LocalizedText, PaymentStatus, Room, Tag,
};
use anyhow::{anyhow, Context, Result};
use chrono::NaiveDateTime;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteQueryResult, SqliteRow};
use sqlx::{QueryBuilder, Row, Sqlite, SqlitePool};
use std::time::Duration;
use tracing::{instrument, warn};

pub type Pool = SqlitePool;

/// Columns selected for every room read, in `room_from_row` order.
pub const ROOM_COLUMNS: &str = "id, name, description, description_en, description_id, \
    description_ja, description_fr, description_de, description_es, image, price_cents, capacity, \
    tag_ocean_view, tag_garden_view, tag_city_view, tag_mountain_view, tag_pool_view, \
    tag_popular, tag_business, tag_family_friendly, tag_romantic, tag_premium, tag_luxury, \
    has_wifi, has_tv, has_workspace, has_kitchen, has_game_console, has_parking, has_jacuzzi, \
    has_coffeemachine, has_kingsize_bed, has_secure, has_businessphone";

const BOOKING_COLUMNS: &str = "id, arrival_date, departure_date, guest_count, room_count, \
    accommodation_type, additional_notes, primary_guest, contact_email, contact_phone, order_id, \
    amount_cents, payment_status, snap_token, created_at, updated_at";

const BUSY_RETRIES: u32 = 5;

pub async fn init_pool(database_url: &str) -> Result<Pool> {
    let normalized = prepare_sqlite_url(database_url);
    let pool = SqlitePool::connect(&normalized).await?;
    // Enable WAL and stricter durability.
    sqlx::query("PRAGMA journal_mode=WAL;")
        .execute(&pool)
        .await?;
    sqlx::query("PRAGMA synchronous=FULL;")
        .execute(&pool)
        .await?;
    Ok(pool)
}

/// If using a file-backed SQLite URL, expand a leading `~/` and ensure the parent
/// directory exists. Leaves in-memory URLs untouched. Always asks sqlx to create
/// the database file when missing.
fn prepare_sqlite_url(url: &str) -> String {
    if !url.starts_with("sqlite:") || url.starts_with("sqlite::memory") {
        return url.to_string();
    }

    let rest = &url["sqlite:".len()..];
    let path_with_query = rest.strip_prefix("//").unwrap_or(rest);
    let (path_part, query_part) = match path_with_query.split_once('?') {
        Some((p, q)) => (p, Some(q)),
        None => (path_with_query, None),
    };
    if path_part.is_empty() {
        return url.to_string();
    }

    let expanded_path = match (path_part.strip_prefix("~/"), std::env::var("HOME")) {
        (Some(rest), Ok(home)) => format!("{}/{}", home.trim_end_matches('/'), rest),
        _ => path_part.to_string(),
    };

    if let Some(parent) = std::path::Path::new(&expanded_path).parent() {
        if !parent.as_os_str().is_empty() {
            let _ = std::fs::create_dir_all(parent);
        }
    }

    let query = match query_part {
        Some(q) if q.contains("mode=") => q.to_string(),
        Some(q) => format!("{q}&mode=rwc"),
        None => "mode=rwc".to_string(),
    };
    format!("sqlite://{expanded_path}?{query}")
}

pub async fn run_migrations(pool: &Pool) -> Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

fn is_busy(err: &sqlx::Error) -> bool {
    let sqlx::Error::Database(db_err) = err else {
        return false;
    };
    // Extended result codes keep the primary code in the low byte.
    db_err
        .code()
        .and_then(|c| c.parse::<i32>().ok())
        .map(|code| matches!(code & 0xff, 5 | 6))
        .unwrap_or(false)
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

/// Run a single-statement write, retrying while SQLite reports BUSY/LOCKED.
async fn execute_retrying<'q, F>(pool: &Pool, build: F) -> Result<SqliteQueryResult, sqlx::Error>
where
    F: Fn() -> Query<'q, Sqlite, SqliteArguments<'q>>,
{
    let mut attempt = 0;
    loop {
        match build().execute(pool).await {
            Err(err) if is_busy(&err) && attempt < BUSY_RETRIES => {
                attempt += 1;
                warn!(attempt, "database busy; retrying write");
                tokio::time::sleep(Duration::from_millis(20 * u64::from(attempt))).await;
            }
            res => return res,
        }
    }
}

#[instrument(skip_all)]
pub async fn insert_room(pool: &Pool, room: &NewRoom) -> Result<i64> {
    let price_cents = decimal_to_cents(room.price)
        .ok_or_else(|| anyhow!("price of room {} is out of range", room.name))?;

    let mut qb = QueryBuilder::<Sqlite>::new(
        "INSERT INTO rooms (name, description, description_en, description_id, description_ja, \
         description_fr, description_de, description_es, image, price_cents, capacity, \
         name_folded, description_folded",
    );
    for tag in Tag::ALL {
        qb.push(", ").push(tag.column());
    }
    for amenity in Amenity::ALL {
        qb.push(", ").push(amenity.column());
    }
    qb.push(") VALUES (");
    {
        let d = &room.descriptions;
        let mut values = qb.separated(", ");
        values.push_bind(room.name.clone());
        values.push_bind(room.description.clone());
        for text in [&d.en, &d.id, &d.ja, &d.fr, &d.de, &d.es] {
            values.push_bind(text.clone());
        }
        values.push_bind(room.image.clone());
        values.push_bind(price_cents);
        values.push_bind(room.capacity);
        values.push_bind(fold_search_text(&room.name));
        values.push_bind(fold_search_text(&room.description));
        for tag in Tag::ALL {
            values.push_bind(room.tags.contains(&tag));
        }
        for amenity in Amenity::ALL {
            values.push_bind(room.amenities.contains(&amenity));
        }
        values.push_unseparated(")");
    }
    qb.push(" RETURNING id");

    let rec = qb
        .build()
        .fetch_one(pool)
        .await
        .with_context(|| format!("failed to insert room {}", room.name))?;
    Ok(rec.get("id"))
}

/// Map a row selected with [`ROOM_COLUMNS`] into a `Room`.
pub fn room_from_row(row: &SqliteRow) -> Result<Room> {
    let mut tags = Vec::new();
    for tag in Tag::ALL {
        if row.try_get::<bool, _>(tag.column())? {
            tags.push(tag);
        }
    }
    let mut amenities = Vec::new();
    for amenity in Amenity::ALL {
        if row.try_get::<bool, _>(amenity.column())? {
            amenities.push(amenity);
        }
    }

    Ok(Room {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        descriptions: LocalizedText {
            en: row.try_get("description_en")?,
            id: row.try_get("description_id")?,
            ja: row.try_get("description_ja")?,
            fr: row.try_get("description_fr")?,
            de: row.try_get("description_de")?,
            es: row.try_get("description_es")?,
        },
        image: row.try_get("image")?,
        price: cents_to_decimal(row.try_get("price_cents")?),
        capacity: row.try_get("capacity")?,
        tags,
        amenities,
    })
}

#[instrument(skip_all)]
pub async fn count_rooms(pool: &Pool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM rooms")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

/// Insert a pending booking. Returns `None` when the order id is already taken.
#[instrument(skip_all, fields(order_id = %booking.order_id))]
pub async fn insert_booking(pool: &Pool, booking: &NewBooking) -> Result<Option<i64>> {
    let res = sqlx::query(
        "INSERT INTO bookings (arrival_date, departure_date, guest_count, room_count, \
         accommodation_type, additional_notes, primary_guest, contact_email, contact_phone, \
         order_id, amount_cents, payment_status) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?) RETURNING id",
    )
    .bind(booking.arrival_date)
    .bind(booking.departure_date)
    .bind(booking.guest_count)
    .bind(booking.room_count)
    .bind(booking.accommodation_type.as_str())
    .bind(booking.additional_notes.as_deref())
    .bind(&booking.primary_guest)
    .bind(&booking.contact_email)
    .bind(&booking.contact_phone)
    .bind(&booking.order_id)
    .bind(booking.amount_cents)
    .bind(PaymentStatus::Pending.as_str())
    .fetch_one(pool)
    .await;

    match res {
        Ok(row) => Ok(Some(row.get("id"))),
        Err(err) if is_unique_violation(&err) => Ok(None),
        Err(err) => Err(err).context("failed to insert booking"),
    }
}

/// Store the gateway session token. Touches only the token column.
#[instrument(skip_all)]
pub async fn attach_session_token(pool: &Pool, booking_id: i64, token: &str) -> Result<()> {
    let res = execute_retrying(pool, || {
        sqlx::query(
            "UPDATE bookings SET snap_token = ?, updated_at = CURRENT_TIMESTAMP WHERE id = ?",
        )
        .bind(token)
        .bind(booking_id)
    })
    .await
    .context("failed to persist session token")?;
    if res.rows_affected() == 0 {
        return Err(anyhow!("booking {} not found", booking_id));
    }
    Ok(())
}

/// Overwrite the payment status of the booking with `order_id`.
/// Returns false when no such booking exists.
#[instrument(skip_all, fields(order_id = %order_id, status = status.as_str()))]
pub async fn update_payment_status(
    pool: &Pool,
    order_id: &str,
    status: PaymentStatus,
) -> Result<bool> {
    let res = execute_retrying(pool, || {
        sqlx::query(
            "UPDATE bookings SET payment_status = ?, updated_at = CURRENT_TIMESTAMP \
             WHERE order_id = ?",
        )
        .bind(status.as_str())
        .bind(order_id)
    })
    .await
    .context("failed to update payment status")?;
    Ok(res.rows_affected() > 0)
}

fn booking_from_row(row: &SqliteRow) -> Result<Booking> {
    let kind: String = row.try_get("accommodation_type")?;
    let accommodation_type = AccommodationType::parse(&kind)
        .ok_or_else(|| anyhow!("booking has unknown accommodation type {}", kind))?;
    let status: String = row.try_get("payment_status")?;
    let payment_status = PaymentStatus::parse_status(&status)
        .ok_or_else(|| anyhow!("booking has unknown payment status {}", status))?;

    Ok(Booking {
        id: row.try_get("id")?,
        arrival_date: row.try_get("arrival_date")?,
        departure_date: row.try_get("departure_date")?,
        guest_count: row.try_get("guest_count")?,
        room_count: row.try_get("room_count")?,
        accommodation_type,
        additional_notes: row.try_get("additional_notes")?,
        primary_guest: row.try_get("primary_guest")?,
        contact_email: row.try_get("contact_email")?,
        contact_phone: row.try_get("contact_phone")?,
        order_id: row.try_get("order_id")?,
        amount: cents_to_decimal(row.try_get("amount_cents")?),
        payment_status,
        snap_token: row.try_get("snap_token")?,
        created_at: row.try_get::<NaiveDateTime, _>("created_at")?.and_utc(),
        updated_at: row.try_get::<NaiveDateTime, _>("updated_at")?.and_utc(),
    })
}

#[instrument(skip_all)]
pub async fn find_booking_by_order_id(pool: &Pool, order_id: &str) -> Result<Option<Booking>> {
    let row = sqlx::query(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings WHERE order_id = ?"
    ))
    .bind(order_id)
    .fetch_optional(pool)
    .await?;
    row.as_ref().map(booking_from_row).transpose()
}

#[instrument(skip_all)]
pub async fn count_bookings(pool: &Pool) -> Result<i64> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM bookings")
        .fetch_one(pool)
        .await?;
    Ok(count)
}

#[instrument(skip_all)]
pub async fn insert_contact_message(pool: &Pool, msg: &NewContactMessage) -> Result<i64> {
    let rec = sqlx::query(
        "INSERT INTO contact_messages (name, email, subject, message) VALUES (?, ?, ?, ?) RETURNING id",
    )
    .bind(&msg.name)
    .bind(&msg.email)
    .bind(&msg.subject)
    .bind(&msg.message)
    .fetch_one(pool)
    .await
    .context("failed to store contact message")?;
    Ok(rec.get("id"))
}
