//! HTML for the dynamic pages. Static pages come from the templates directory.

use rust_decimal::Decimal;

use crate::booking::BookingReceipt;
use crate::catalog::{RoomListParams, RoomPage};
use crate::contact::ContactForm;
use crate::model::{AccommodationType, Language, Room};
use crate::pricing::RateTable;
use crate::validate::ValidationErrors;

const SNAP_JS_SANDBOX: &str = "https://app.sandbox.midtrans.com/snap/snap.js";
const SNAP_JS_PRODUCTION: &str = "https://app.midtrans.com/snap/snap.js";

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

fn money(value: Decimal) -> String {
    format!("${:.2}", value.round_dp(2))
}

pub fn layout(title: &str, lang: Language, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"{}\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{} | Lonergarden Hotel</title>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        lang.code(),
        escape_html(title),
        body
    )
}

fn room_card(room: &Room, lang: Language) -> String {
    let image = room
        .image
        .as_deref()
        .map(|src| {
            format!(
                "<img src=\"{}\" alt=\"{}\" loading=\"lazy\">",
                escape_html(src),
                escape_html(&room.name)
            )
        })
        .unwrap_or_default();
    let tags: String = room
        .tags
        .iter()
        .map(|t| format!("<span class=\"badge\">{}</span>", t.label()))
        .collect();
    let amenities: String = room
        .amenities
        .iter()
        .map(|a| format!("<li>{}</li>", a.label()))
        .collect();
    format!(
        "<article class=\"room-card\" data-room-id=\"{id}\">\n{image}\n\
         <div class=\"badges\">{tags}</div>\n<h3>{name}</h3>\n<p>{desc}</p>\n\
         <ul class=\"amenities\">{amenities}</ul>\n\
         <p class=\"room-meta\"><span class=\"price\">{price} / night</span> \
         <span class=\"capacity\">Up to {capacity} guests</span></p>\n</article>",
        id = room.id,
        name = escape_html(&room.name),
        desc = escape_html(room.localized_description(lang)),
        price = money(room.price),
        capacity = room.capacity,
    )
}

/// Room cards only; also the payload of the load-more request.
pub fn rooms_grid(rooms: &[Room], lang: Language) -> String {
    rooms
        .iter()
        .map(|room| room_card(room, lang))
        .collect::<Vec<_>>()
        .join("\n")
}

fn selected(current: Option<&str>, value: &str) -> &'static str {
    if current == Some(value) {
        " selected"
    } else {
        ""
    }
}

fn options(current: Option<&str>, choices: &[(&str, &str)]) -> String {
    choices
        .iter()
        .map(|(value, label)| {
            format!(
                "<option value=\"{value}\"{}>{label}</option>",
                selected(current, value)
            )
        })
        .collect()
}

pub fn rooms_page(page: &RoomPage, params: &RoomListParams, lang: Language) -> String {
    let search = escape_html(params.search.as_deref().unwrap_or_default());
    let price = options(
        params.price_range.as_deref(),
        &[
            ("", "Any price"),
            ("low", "$100 - $200"),
            ("medium", "$200 - $350"),
            ("high", "$350+"),
        ],
    );
    let guests = options(
        params.guest_capacity.as_deref(),
        &[("", "Any size"), ("2", "1-2 guests"), ("4", "3-4 guests"), ("5", "5+ guests")],
    );
    let view = options(
        params.view_type.as_deref(),
        &[
            ("", "Any view"),
            ("ocean", "Ocean view"),
            ("city", "City view"),
            ("garden", "Garden view"),
        ],
    );
    let sort = options(
        params.sort_by.as_deref(),
        &[
            ("", "Recommended"),
            ("price_low", "Price: low to high"),
            ("price_high", "Price: high to low"),
            ("room_size", "Largest first"),
        ],
    );
    let more = if page.has_more {
        format!(
            "<button id=\"load-more\" data-next-offset=\"{}\">Load more rooms</button>",
            page.next_offset
        )
    } else {
        String::new()
    };
    let body = format!(
        "<main class=\"rooms\">\n<h1>Our Rooms</h1>\n\
         <form id=\"room-filters\" method=\"get\" action=\"/rooms/\">\n\
         <input type=\"search\" name=\"search\" value=\"{search}\" placeholder=\"Search rooms\">\n\
         <select name=\"price_range\">{price}</select>\n\
         <select name=\"guest_capacity\">{guests}</select>\n\
         <select name=\"view_type\">{view}</select>\n\
         <select name=\"sort_by\">{sort}</select>\n\
         <input type=\"hidden\" name=\"lang\" value=\"{lang}\">\n\
         <button type=\"submit\">Filter</button>\n</form>\n\
         <p class=\"result-count\">{total} rooms found</p>\n\
         <section id=\"rooms-grid\">\n{grid}\n</section>\n{more}\n</main>",
        lang = lang.code(),
        total = page.total,
        grid = rooms_grid(&page.rooms, lang),
    );
    layout("Rooms", lang, &body)
}

pub fn booking_page(error: Option<&str>, rates: &RateTable) -> String {
    let flash = error
        .filter(|e| !e.is_empty())
        .map(|e| format!("<div class=\"alert alert-error\" role=\"alert\">{}</div>\n", escape_html(e)))
        .unwrap_or_default();
    let choices: String = AccommodationType::ALL
        .into_iter()
        .filter_map(|kind| {
            rates.nightly_rate(kind).map(|rate| {
                format!(
                    "<option value=\"{}\">{} ({} / night)</option>",
                    kind.as_str(),
                    kind.display_name(),
                    money(rate)
                )
            })
        })
        .collect();
    let body = format!(
        "<main class=\"booking\">\n<h1>Book Your Stay</h1>\n{flash}\
         <form id=\"booking-form\" method=\"post\" action=\"/booking/\">\n\
         <label>Arrival <input type=\"date\" name=\"arrival_date\" required></label>\n\
         <label>Departure <input type=\"date\" name=\"departure_date\" required></label>\n\
         <label>Guests <input type=\"number\" name=\"guest_count\" min=\"1\" value=\"1\" required></label>\n\
         <label>Rooms <input type=\"number\" name=\"room_count\" min=\"1\" value=\"1\" required></label>\n\
         <label>Accommodation <select name=\"accommodation_type\" required>\
         <option value=\"\">Select accommodation</option>{choices}</select></label>\n\
         <label>Name <input type=\"text\" name=\"primary_guest\" maxlength=\"100\" required></label>\n\
         <label>Email <input type=\"email\" name=\"contact_email\" required></label>\n\
         <label>Phone <input type=\"tel\" name=\"contact_phone\" maxlength=\"20\" required></label>\n\
         <label>Notes <textarea name=\"additional_notes\"></textarea></label>\n\
         <button type=\"submit\">Continue to payment</button>\n</form>\n</main>"
    );
    layout("Booking", Language::En, &body)
}

pub fn payment_page(receipt: &BookingReceipt, client_key: &str, is_production: bool) -> String {
    let snap_js = if is_production {
        SNAP_JS_PRODUCTION
    } else {
        SNAP_JS_SANDBOX
    };
    let fallback = receipt
        .redirect_url
        .as_deref()
        .map(|url| {
            format!(
                "<p class=\"pay-fallback\">Payment window not opening? \
                 <a href=\"{}\">Continue on the payment page</a>.</p>\n",
                escape_html(url)
            )
        })
        .unwrap_or_default();
    let body = format!(
        "<main class=\"payment\">\n<h1>Complete Your Payment</h1>\n\
         <p>Order <strong>{order}</strong>: {nights} night(s), {rooms} room(s) of {kind}.</p>\n\
         <p class=\"total\">Total: {total}</p>\n\
         <button id=\"pay-button\" data-snap-token=\"{token}\">Pay now</button>\n{fallback}\
         <script src=\"{snap_js}\" data-client-key=\"{client_key}\"></script>\n\
         <script>document.getElementById('pay-button').addEventListener('click', function () {{ \
         window.snap.pay(this.dataset.snapToken); }});</script>\n</main>",
        order = escape_html(&receipt.order_id),
        nights = receipt.quote.nights,
        rooms = receipt.quote.room_count,
        kind = receipt.quote.accommodation.display_name(),
        total = money(receipt.total()),
        token = escape_html(&receipt.snap_token),
        client_key = escape_html(client_key),
    );
    layout("Payment", Language::En, &body)
}

pub fn payment_finish_page() -> String {
    layout(
        "Payment received",
        Language::En,
        "<main class=\"payment-finish\">\n<h1>Thank you!</h1>\n\
         <p>Your payment is being processed. A confirmation will follow once it settles.</p>\n\
         <a href=\"/\">Back to home</a>\n</main>",
    )
}

pub const CONTACT_SENT_MESSAGE: &str = "Your message has been sent. Thank you!";

pub fn contact_page(form: &ContactForm, errors: Option<&ValidationErrors>, sent: bool) -> String {
    let flash = if sent {
        format!("<div class=\"alert alert-success\" role=\"status\">{CONTACT_SENT_MESSAGE}</div>\n")
    } else {
        String::new()
    };
    let field_error = |field: &str| {
        errors
            .and_then(|e| e.get(field))
            .map(|msg| format!("<span class=\"field-error\">{}</span>", escape_html(msg)))
            .unwrap_or_default()
    };
    let value = |v: &Option<String>| escape_html(v.as_deref().unwrap_or_default());
    let body = format!(
        "<main class=\"contact\">\n<h1>Contact Us</h1>\n<div id=\"contact-form-wrapper\">\n{flash}\
         <form method=\"post\" action=\"/contact/\">\n\
         <label>Name <input type=\"text\" name=\"name\" maxlength=\"100\" value=\"{name}\"></label>{name_err}\n\
         <label>Email <input type=\"email\" name=\"email\" value=\"{email}\"></label>{email_err}\n\
         <label>Subject <input type=\"text\" name=\"subject\" maxlength=\"100\" value=\"{subject}\"></label>{subject_err}\n\
         <label>Message <textarea name=\"message\">{message}</textarea></label>{message_err}\n\
         <button type=\"submit\">Send message</button>\n</form>\n</div>\n</main>",
        name = value(&form.name),
        email = value(&form.email),
        subject = value(&form.subject),
        message = value(&form.message),
        name_err = field_error("name"),
        email_err = field_error("email"),
        subject_err = field_error("subject"),
        message_err = field_error("message"),
    );
    layout("Contact", Language::En, &body)
}

pub fn not_found_page() -> String {
    layout(
        "Page not found",
        Language::En,
        "<main class=\"not-found\">\n<h1>404</h1>\n<p>The page you are looking for does not exist.</p>\n\
         <a href=\"/\">Back to home</a>\n</main>",
    )
}
