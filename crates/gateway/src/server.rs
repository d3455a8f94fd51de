use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        extract::State,
        response::{IntoResponse, Json},
        routing::{get, post},
    },
    rolemap_config::RolemapConfig,
    tower_http::{
        cors::{Any, CorsLayer},
        trace::TraceLayer,
    },
    tracing::{info, warn},
};

use crate::{auth, contacts, state::AppState};

// ── Router ───────────────────────────────────────────────────────────────────

const HEALTH: &str = "/health";
const AUTH_URL: &str = "/api/auth-url";
const AUTH_STATUS: &str = "/api/auth-status";
const CONTACTS_WITH_ROLES: &str = "/api/contacts-with-roles";
const POPULATE_CONTACTS: &str = "/api/populate-contacts";
const CREATE_PROPERTY: &str = "/api/create-project-role-property";
const ASSIGN_ROLES: &str = "/api/assign-roles";
const INITIALIZE: &str = "/api/initialize";

/// Routes mounted regardless of configuration. The OAuth callback may not
/// reuse any of them.
pub(crate) const FIXED_ROUTES: &[&str] = &[
    HEALTH,
    AUTH_URL,
    AUTH_STATUS,
    CONTACTS_WITH_ROLES,
    POPULATE_CONTACTS,
    CREATE_PROPERTY,
    ASSIGN_ROLES,
    INITIALIZE,
];

/// Build the router (shared between production startup and tests).
pub fn build_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route(HEALTH, get(health_handler))
        .route(AUTH_URL, get(auth::auth_url_handler))
        .route(AUTH_STATUS, get(auth::auth_status_handler))
        .route(&state.callback_path, get(auth::oauth_callback_handler))
        .route(CONTACTS_WITH_ROLES, get(contacts::contacts_with_roles_handler))
        .route(POPULATE_CONTACTS, post(contacts::populate_contacts_handler))
        .route(CREATE_PROPERTY, post(contacts::create_property_handler))
        .route(ASSIGN_ROLES, post(contacts::assign_roles_handler))
        .route(INITIALIZE, post(contacts::initialize_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

// ── Server startup ───────────────────────────────────────────────────────────

/// Start the HTTP server and run until it fails.
pub async fn start_server(config: RolemapConfig) -> anyhow::Result<()> {
    if !config.oauth.has_client_credentials() {
        warn!(
            "HUBSPOT_CLIENT_ID and/or HUBSPOT_CLIENT_SECRET are not set; authorization will fail"
        );
    }

    let state = AppState::from_config(&config)?;
    let app = build_app(Arc::clone(&state));

    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port).parse()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Startup banner.
    let lines = [
        format!("rolemap v{}", state.version),
        format!("listening on {addr}"),
        format!("oauth callback: {}", config.server.redirect_uri()),
        format!("frontend: {}", state.frontend_origin),
    ];
    let width = lines.iter().map(|l| l.len()).max().unwrap_or(0) + 4;
    info!("┌{}┐", "─".repeat(width));
    for line in &lines {
        info!("│  {:<w$}│", line, w = width - 2);
    }
    info!("└{}┘", "─".repeat(width));
    info!("register the oauth callback URL in the HubSpot app settings");

    axum::serve(listener, app).await?;
    Ok(())
}

// ── Handlers ─────────────────────────────────────────────────────────────────

async fn health_handler(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "version": state.version,
    }))
}
