use async_trait::async_trait;
use lonergarden::booking::{BookingError, BookingForm, BookingService, LINE_ITEM_ID};
use lonergarden::db;
use lonergarden::gateway::{GatewayError, PaymentGateway, PaymentSession, SessionRequest};
use lonergarden::model::{AccommodationType, BookingStage, PaymentStatus};
use lonergarden::pricing::{PricingError, RateTable};
use rust_decimal::Decimal;
use sqlx::sqlite::SqlitePoolOptions;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

async fn setup_pool() -> sqlx::SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .unwrap();
    db::run_migrations(&pool).await.unwrap();
    pool
}

/// Records every session request and replays scripted outcomes.
#[derive(Default)]
struct RecordingGateway {
    requests: Mutex<Vec<SessionRequest>>,
    outcomes: Mutex<VecDeque<Result<PaymentSession, GatewayError>>>,
}

impl RecordingGateway {
    fn succeeding(token: &str) -> Arc<Self> {
        let gw = Self::default();
        gw.outcomes.lock().unwrap().push_back(Ok(PaymentSession {
            token: token.to_string(),
            redirect_url: Some(format!("https://pay.example/{token}")),
        }));
        Arc::new(gw)
    }

    fn failing(err: GatewayError) -> Arc<Self> {
        let gw = Self::default();
        gw.outcomes.lock().unwrap().push_back(Err(err));
        Arc::new(gw)
    }

    fn requests(&self) -> Vec<SessionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn create_session(
        &self,
        request: &SessionRequest,
    ) -> Result<PaymentSession, GatewayError> {
        self.requests.lock().unwrap().push(request.clone());
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(Err(GatewayError::MissingToken))
    }
}

fn form() -> BookingForm {
    BookingForm {
        arrival_date: Some("2025-06-10".into()),
        departure_date: Some("2025-06-13".into()),
        guest_count: Some("3".into()),
        room_count: Some("2".into()),
        accommodation_type: Some("Standard".into()),
        additional_notes: Some("Ground floor please".into()),
        primary_guest: Some("Ayu Lestari".into()),
        contact_email: Some("ayu@example.com".into()),
        contact_phone: Some("+62 811 0000".into()),
    }
}

fn service(pool: &sqlx::SqlitePool, gateway: Arc<RecordingGateway>) -> BookingService {
    BookingService::new(
        pool.clone(),
        RateTable::default(),
        gateway,
        "http://localhost:8000/payment/finish/".into(),
    )
}

#[tokio::test]
async fn successful_submission_attaches_token() {
    let pool = setup_pool().await;
    let gateway = RecordingGateway::succeeding("snap-123");
    let receipt = service(&pool, gateway.clone()).submit(&form()).await.unwrap();

    assert_eq!(receipt.snap_token, "snap-123");
    assert_eq!(receipt.total(), Decimal::new(77400, 2));
    assert!(receipt.order_id.starts_with("BOOK-"));

    let requests = gateway.requests();
    assert_eq!(requests.len(), 1);
    let req = &requests[0];
    assert_eq!(req.order_id, receipt.order_id);
    assert_eq!(req.gross_amount, Decimal::new(77400, 2));
    assert_eq!(req.item.id, LINE_ITEM_ID);
    assert_eq!(req.item.name, "Standard Room");
    assert_eq!(req.item.price, Decimal::new(38700, 2));
    assert_eq!(req.item.quantity, 2);
    assert_eq!(req.item.price * Decimal::from(req.item.quantity), req.gross_amount);
    assert_eq!(req.customer.first_name, "Ayu Lestari");
    assert_eq!(req.notes.as_deref(), Some("Ground floor please"));
    assert_eq!(req.finish_url, "http://localhost:8000/payment/finish/");

    let stored = db::find_booking_by_order_id(&pool, &receipt.order_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.payment_status, PaymentStatus::Pending);
    assert_eq!(stored.snap_token.as_deref(), Some("snap-123"));
    assert_eq!(stored.stage(), BookingStage::SessionAttached);
    assert_eq!(stored.amount, Decimal::new(77400, 2));
    assert_eq!(stored.accommodation_type, AccommodationType::Standard);
    assert_eq!(stored.guest_count, 3);
}

#[tokio::test]
async fn gateway_failure_keeps_pending_row() {
    let pool = setup_pool().await;
    let gateway = RecordingGateway::failing(GatewayError::Api {
        status: 503,
        body: "unavailable".into(),
    });
    let err = service(&pool, gateway.clone()).submit(&form()).await.unwrap_err();

    assert!(matches!(err, BookingError::Gateway(GatewayError::Api { status: 503, .. })));
    assert!(err.is_retryable());

    let order_id = gateway.requests()[0].order_id.clone();
    let stored = db::find_booking_by_order_id(&pool, &order_id)
        .await
        .unwrap()
        .expect("pending booking kept");
    assert_eq!(stored.payment_status, PaymentStatus::Pending);
    assert!(stored.snap_token.is_none());
    assert_eq!(stored.stage(), BookingStage::AwaitingGateway);
}

#[tokio::test]
async fn invalid_stays_create_no_booking() {
    let pool = setup_pool().await;
    let gateway = RecordingGateway::succeeding("unused");
    let svc = service(&pool, gateway.clone());

    let same_day = BookingForm {
        departure_date: Some("2025-06-10".into()),
        ..form()
    };
    assert!(matches!(
        svc.submit(&same_day).await,
        Err(BookingError::InvalidInput(PricingError::DepartureNotAfterArrival))
    ));

    let bad_date = BookingForm {
        arrival_date: Some("June 10".into()),
        ..form()
    };
    assert!(matches!(
        svc.submit(&bad_date).await,
        Err(BookingError::InvalidInput(PricingError::InvalidDate))
    ));

    let no_type = BookingForm {
        accommodation_type: None,
        ..form()
    };
    let err = svc.submit(&no_type).await.unwrap_err();
    assert_eq!(err.user_message(), "Please select an accommodation type");
    assert!(!err.is_retryable());

    let bad_email = BookingForm {
        contact_email: Some("ayu-at-example".into()),
        ..form()
    };
    match svc.submit(&bad_email).await {
        Err(BookingError::Validation(errors)) => assert!(errors.get("contact_email").is_some()),
        other => panic!("expected validation error, got {other:?}"),
    }

    assert_eq!(db::count_bookings(&pool).await.unwrap(), 0);
    assert!(gateway.requests().is_empty());
}

#[tokio::test]
async fn order_id_collision_is_regenerated() {
    let pool = setup_pool().await;
    let first = service(&pool, RecordingGateway::succeeding("tok-a"))
        .with_order_ids(|| "BOOK-aaaaaaaaaa".to_string())
        .submit(&form())
        .await
        .unwrap();
    assert_eq!(first.order_id, "BOOK-aaaaaaaaaa");

    let ids = Arc::new(Mutex::new(VecDeque::from([
        "BOOK-aaaaaaaaaa".to_string(),
        "BOOK-bbbbbbbbbb".to_string(),
    ])));
    let source = ids.clone();
    let second = service(&pool, RecordingGateway::succeeding("tok-b"))
        .with_order_ids(move || source.lock().unwrap().pop_front().unwrap_or_default())
        .submit(&form())
        .await
        .unwrap();
    assert_eq!(second.order_id, "BOOK-bbbbbbbbbb");
    assert_eq!(db::count_bookings(&pool).await.unwrap(), 2);
}

#[tokio::test]
async fn exhausted_order_ids_are_retryable() {
    let pool = setup_pool().await;
    service(&pool, RecordingGateway::succeeding("tok-a"))
        .with_order_ids(|| "BOOK-fixedfixed".to_string())
        .submit(&form())
        .await
        .unwrap();

    let gateway = RecordingGateway::succeeding("tok-b");
    let err = service(&pool, gateway.clone())
        .with_order_ids(|| "BOOK-fixedfixed".to_string())
        .submit(&form())
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Storage(_)));
    assert!(err.is_retryable());
    assert!(gateway.requests().is_empty());
    assert_eq!(db::count_bookings(&pool).await.unwrap(), 1);
}
