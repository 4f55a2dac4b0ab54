use std::sync::Arc;

use axum::{
    extract::State,
    middleware,
    routing::{get, post},
    Extension, Json, Router,
};
use tracing::{error, info, warn};

use audit_cell::{create_audit_router, AuditService};
use auth_cell::{
    create_auth_router, HttpCredentialVerifier, RateLimiter, SessionManager, SessionPolicy,
};
use booking_cell::{
    create_booking_router, BookingHandlers, BookingPolicy, BookingScreeningService,
    RolePermissionService,
};
use gateway_cell::{
    create_gateway_router, security_gateway_middleware, GatewayContext, InputValidator,
    RoutePolicy, SecurityGateway,
};
use payment_cell::{
    create_payment_router, CardValidationService, PaymentFraudService, PaymentHandlers,
    PaymentPolicy,
};
use privacy_cell::{
    create_privacy_router, ConsentLedgerService, DataProtectionService, PrivacyHandlers,
    RetentionPolicy,
};
use shared_config::AppConfig;
use shared_crypto::CryptoService;
use shared_models::{AppError, AuthenticatedUser};
use shared_store::Store;
use upload_cell::{create_upload_router, UploadGuardService, UploadPolicy};

#[derive(Clone)]
struct AdminState {
    store: Store,
    audit: Arc<AuditService>,
}

/// Sweeps expired security state and flushes the audit buffer. Keeps the
/// in-memory backend bounded under sustained unique-key load.
async fn cleanup_security_data(
    State(state): State<AdminState>,
    user: Option<Extension<AuthenticatedUser>>,
) -> Result<Json<serde_json::Value>, AppError> {
    let Extension(user) = user.ok_or_else(|| AppError::Authentication("no session".to_string()))?;
    if !user.is_admin() {
        return Err(AppError::Forbidden("admin role required".to_string()));
    }

    let swept = state
        .store
        .sweep_expired()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;
    state
        .audit
        .flush_buffer()
        .await
        .map_err(|e| AppError::Internal(e.to_string()))?;

    info!("admin {} triggered security data cleanup", user.user_id);
    Ok(Json(serde_json::json!({ "swept_entries": swept })))
}

pub async fn create_router(config: Arc<AppConfig>) -> Router {
    // Shared state store: redis when configured, process-local otherwise.
    let store = match config.redis_url.as_deref() {
        Some(url) => match Store::redis(url).await {
            Ok(store) => store,
            Err(e) => {
                error!(error = %e, "redis unavailable, falling back to in-memory store");
                Store::memory()
            }
        },
        None => {
            warn!("REDIS_URL not set, security state is process-local");
            Store::memory()
        }
    };

    let crypto = match CryptoService::from_base64_key(&config.encryption_master_key) {
        Ok(crypto) => Arc::new(crypto),
        Err(e) => {
            warn!(error = %e, "invalid or missing master key, generating an ephemeral one");
            Arc::new(CryptoService::new(&CryptoService::generate_master_key()))
        }
    };

    let audit = Arc::new(AuditService::new(config.audit_flush_threshold));
    let verifier = Arc::new(HttpCredentialVerifier::new(&config));
    let sessions = Arc::new(SessionManager::new(
        store.clone(),
        crypto.clone(),
        verifier,
        audit.clone(),
        SessionPolicy::default(),
    ));

    let validator = Arc::new(InputValidator::new());
    let gateway = Arc::new(SecurityGateway::new(
        sessions.clone(),
        RateLimiter::new(store.clone()),
        validator.clone(),
        audit.clone(),
    ));

    let payment_policy = PaymentPolicy::default();
    let cards = Arc::new(CardValidationService::new(payment_policy.clone()));
    let payment_handlers = PaymentHandlers {
        cards: cards.clone(),
        fraud: Arc::new(PaymentFraudService::new(
            store.clone(),
            cards,
            crypto.clone(),
            audit.clone(),
            payment_policy,
        )),
    };

    let booking_handlers = BookingHandlers {
        screening: Arc::new(BookingScreeningService::new(
            store.clone(),
            audit.clone(),
            BookingPolicy::default(),
        )),
        permissions: Arc::new(RolePermissionService::new()),
    };

    let upload_guard = Arc::new(UploadGuardService::new(
        store.clone(),
        crypto.clone(),
        audit.clone(),
        UploadPolicy::default(),
    ));

    let consent = Arc::new(ConsentLedgerService::new(store.clone(), audit.clone()));
    let privacy_handlers = PrivacyHandlers {
        consent: consent.clone(),
        protection: Arc::new(DataProtectionService::new(
            consent,
            crypto.clone(),
            store.clone(),
            audit.clone(),
            RetentionPolicy::default(),
        )),
    };

    let public_gate = |router: Router| {
        router.layer(middleware::from_fn_with_state(
            GatewayContext::new(gateway.clone(), RoutePolicy::public()),
            security_gateway_middleware,
        ))
    };
    let authenticated_gate = |router: Router| {
        router.layer(middleware::from_fn_with_state(
            GatewayContext::new(gateway.clone(), RoutePolicy::authenticated()),
            security_gateway_middleware,
        ))
    };

    Router::new()
        .route("/", get(|| async { "Solmara Stays security API is running" }))
        .nest("/auth", public_gate(create_auth_router(sessions)))
        .nest("/security", public_gate(create_gateway_router(validator)))
        .nest(
            "/payments",
            authenticated_gate(create_payment_router(payment_handlers)),
        )
        .nest(
            "/bookings",
            authenticated_gate(create_booking_router(booking_handlers)),
        )
        .nest(
            "/uploads",
            authenticated_gate(create_upload_router(upload_guard)),
        )
        .nest(
            "/privacy",
            authenticated_gate(create_privacy_router(privacy_handlers)),
        )
        .nest("/audit", authenticated_gate(create_audit_router(audit.clone())))
        .merge(authenticated_gate(
            Router::new()
                .route("/admin/cleanup", post(cleanup_security_data))
                .with_state(AdminState { store, audit }),
        ))
}
