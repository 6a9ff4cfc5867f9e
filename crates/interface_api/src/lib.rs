//! HTTP API Layer
//!
//! REST surface for the ledger and reconciliation core using Axum.
//!
//! # Architecture
//!
//! - **Handlers**: thin request handlers, one module per resource
//! - **DTOs**: validated request bodies and response shapes
//! - **Middleware**: request ids and request logging
//! - **Error Handling**: domain errors mapped to consistent JSON responses
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::postgres(pool, config);
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;

use std::sync::Arc;

use axum::{
    http::HeaderName,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use sqlx::PgPool;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use core_kernel::HealthCheckable;
use domain_billing::{BillingPort, InvoiceLifecycleService, LedgerService, PaymentApplicationService};
use domain_inventory::{InventoryPort, ReconciliationService};
use infra_db::{PostgresBillingAdapter, PostgresInventoryAdapter};

use crate::config::ApiConfig;
use crate::handlers::{health, ledger, payments, reconciliation, reports};
use crate::middleware::{request_logging, REQUEST_ID_HEADER};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub ledgers: LedgerService,
    pub payments: PaymentApplicationService,
    pub invoices: InvoiceLifecycleService,
    pub reconciliations: ReconciliationService,
    /// Adapters probed by the readiness endpoint
    pub health: Vec<Arc<dyn HealthCheckable>>,
}

impl AppState {
    /// Wires the services onto the given ports
    pub fn new(
        config: ApiConfig,
        billing: Arc<dyn BillingPort>,
        inventory: Arc<dyn InventoryPort>,
    ) -> Self {
        Self {
            config,
            ledgers: LedgerService::new(billing.clone()),
            payments: PaymentApplicationService::new(billing.clone()),
            invoices: InvoiceLifecycleService::new(billing),
            reconciliations: ReconciliationService::new(inventory),
            health: Vec::new(),
        }
    }

    /// Adds an adapter to the readiness probe
    pub fn with_health_check(mut self, adapter: Arc<dyn HealthCheckable>) -> Self {
        self.health.push(adapter);
        self
    }

    /// State backed by the PostgreSQL adapters
    pub fn postgres(pool: PgPool, config: ApiConfig) -> Self {
        let billing = Arc::new(PostgresBillingAdapter::new(pool.clone()));
        let inventory = Arc::new(PostgresInventoryAdapter::new(pool));
        Self::new(config, billing.clone(), inventory.clone())
            .with_health_check(billing)
            .with_health_check(inventory)
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let public_routes = Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check));

    let ledger_routes = Router::new().route("/:kind/:party_id", get(ledger::get_ledger));

    let invoice_routes = Router::new()
        .route("/:id/payments", post(payments::apply_payment))
        .route("/:id/transitions", post(payments::transition_invoice));

    let reconciliation_routes = Router::new()
        .route("/", post(reconciliation::start_session))
        .route("/:id", get(reconciliation::get_session))
        .route("/:id/counts", put(reconciliation::record_counts))
        .route("/:id/finalize", post(reconciliation::finalize));

    let report_routes = Router::new()
        .route("/aging", get(reports::aging_report))
        .route("/collection-metrics", get(reports::collection_metrics));

    let api_routes = Router::new()
        .nest("/ledgers", ledger_routes)
        .nest("/invoices", invoice_routes)
        .nest("/reconciliations", reconciliation_routes)
        .nest("/reports", report_routes);

    Router::new()
        .merge(public_routes)
        .nest("/api/v1", api_routes)
        .layer(axum_middleware::from_fn(request_logging))
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
