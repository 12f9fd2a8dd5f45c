/// Application state and router builder
///
/// # Example
///
/// ```no_run
/// use maison_api::{app::{build_app, AppState}, config::Config};
/// use maison_shared::db::pool::create_pool;
///
/// # async fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// let pool = create_pool(config.pool_config()).await?;
/// let app = build_app(AppState::new(pool, config));
/// # Ok(())
/// # }
/// ```

use crate::{config::Config, middleware::security::SecurityHeadersLayer, routes};
use axum::{
    routing::{get, post},
    Router,
};
use maison_shared::invitation::{store::InvitationStore, store::PgInvitationStore, InvitationService};
use sqlx::PgPool;
use std::sync::Arc;
use tower::Layer;
use tower_http::{
    normalize_path::{NormalizePath, NormalizePathLayer},
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

/// Shared application state
///
/// Cloned for each request handler via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Arc<Config>,
    pub invitations: InvitationService,
}

impl AppState {
    /// State backed by PostgreSQL for everything, invitations included
    pub fn new(db: PgPool, config: Config) -> Self {
        let store = Arc::new(PgInvitationStore::new(db.clone()));
        Self::with_invitation_store(db, config, store)
    }

    pub fn with_invitation_store(db: PgPool, config: Config, store: Arc<dyn InvitationStore>) -> Self {
        Self {
            db,
            config: Arc::new(config),
            invitations: InvitationService::new(store),
        }
    }

    pub fn session_secret(&self) -> &str {
        &self.config.session.secret
    }
}

/// Builds the router with all routes and middleware
///
/// # Routes
///
/// ```text
/// GET  /health                     public
/// GET  /accounts/login             public
/// POST /accounts/login             public
/// POST /logout
/// GET  /inscription                public
/// POST /inscription                public
/// GET  /rejoindre                  public
/// POST /rejoindre                  public
///
/// GET  /foyers
/// GET  /foyer/:id
/// POST /creer-foyer
/// POST /foyer/:id/supprimer
/// POST /foyer/:id/inviter          (alias POST /invitation/:id)
/// POST /ajouter-piece
/// POST /ajouter-animal
/// POST /ajouter-dispositif
/// POST /dispositif/:id/basculer
///
/// GET  /utilisateurs
/// POST /membre/:id/role
/// POST /supprimer-membre/:id
///
/// GET  /taches
/// POST /ajouter-tache
/// POST /tache/:id/supprimer
/// POST /tache/:id/assigner
/// POST /terminer-tache/:id
/// GET  /tache/:id/historique
/// POST /tache/:id/recurrence
///
/// GET  /inventaire
/// POST /ajouter-inventaire
/// GET  /budget
/// POST /definir-budget
/// POST /ajouter-depense
///
/// GET  /courses
/// POST /ajouter-liste
/// POST /liste/:id/ajouter-article
/// POST /liste/:id/acheter
/// ```
///
/// Authentication is enforced per handler by the
/// [`CurrentMember`](crate::extract::CurrentMember) extractor.
pub fn build_router(state: AppState) -> Router {
    let account_routes = Router::new()
        .route("/health", get(routes::health::health_check))
        .route("/accounts/login", get(routes::auth::login_page).post(routes::auth::login))
        .route("/logout", post(routes::auth::logout))
        .route("/inscription", get(routes::auth::signup_page).post(routes::auth::signup))
        .route(
            "/rejoindre",
            get(routes::invitations::join_page).post(routes::invitations::redeem),
        );

    let household_routes = Router::new()
        .route("/foyers", get(routes::households::list_households))
        .route("/foyer/:id", get(routes::households::household_detail))
        .route("/creer-foyer", post(routes::households::create_household))
        .route("/foyer/:id/supprimer", post(routes::households::delete_household))
        .route("/foyer/:id/inviter", post(routes::invitations::issue))
        .route("/invitation/:id", post(routes::invitations::issue))
        .route("/ajouter-piece", post(routes::households::add_room))
        .route("/ajouter-animal", post(routes::households::add_pet))
        .route("/ajouter-dispositif", post(routes::households::add_device))
        .route("/dispositif/:id/basculer", post(routes::households::toggle_device));

    let member_routes = Router::new()
        .route("/utilisateurs", get(routes::members::list_members))
        .route("/membre/:id/role", post(routes::members::change_role))
        .route("/supprimer-membre/:id", post(routes::members::remove_member));

    let task_routes = Router::new()
        .route("/taches", get(routes::tasks::list_tasks))
        .route("/ajouter-tache", post(routes::tasks::add_task))
        .route("/tache/:id/supprimer", post(routes::tasks::delete_task))
        .route("/tache/:id/assigner", post(routes::tasks::assign_task))
        .route("/terminer-tache/:id", post(routes::tasks::complete_task))
        .route("/tache/:id/historique", get(routes::tasks::task_history))
        .route("/tache/:id/recurrence", post(routes::tasks::set_recurrence));

    let resource_routes = Router::new()
        .route("/inventaire", get(routes::inventory::list_inventory))
        .route("/ajouter-inventaire", post(routes::inventory::add_item))
        .route("/budget", get(routes::budget::show_budget))
        .route("/definir-budget", post(routes::budget::set_budget))
        .route("/ajouter-depense", post(routes::budget::record_expense))
        .route("/courses", get(routes::shopping::list_shopping))
        .route("/ajouter-liste", post(routes::shopping::add_list))
        .route("/liste/:id/ajouter-article", post(routes::shopping::add_list_item))
        .route("/liste/:id/acheter", post(routes::shopping::mark_bought));

    let production = state.config.api.production;

    Router::new()
        .merge(account_routes)
        .merge(household_routes)
        .merge(member_routes)
        .merge(task_routes)
        .merge(resource_routes)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(SecurityHeadersLayer::new(production))
        .with_state(state)
}

/// The router behind trailing-slash normalisation (`/taches/` serves `/taches`)
///
/// Path normalisation has to wrap the router rather than be one of its
/// layers, since routing happens before router layers run.
pub fn build_app(state: AppState) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(build_router(state))
}
