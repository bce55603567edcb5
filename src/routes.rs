use std::sync::Arc;

use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{Scope, middleware::from_fn, web};
use anyhow::{Result, anyhow};
use sqlx::MySqlPool;

use crate::{
    api::{crud, health},
    auth::{handlers, jwt::TokenService, middleware::auth_middleware, password::CredentialHasher},
    config::Config,
    error::{json_error_handler, path_error_handler},
    model::{ENTITIES, schema::EntitySchema},
};

type Limiter = Arc<Governor<PeerIpKeyExtractor, NoOpMiddleware>>;

/// Per-IP limiters. Built once so every worker shares the same quota.
#[derive(Clone)]
pub struct RateLimiters {
    login: Limiter,
    register: Limiter,
    protected: Limiter,
}

impl RateLimiters {
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self {
            login: Arc::new(build_limiter(config.rate_login_per_min)?),
            register: Arc::new(build_limiter(config.rate_register_per_min)?),
            protected: Arc::new(build_limiter(config.rate_protected_per_min)?),
        })
    }
}

fn build_limiter(requests_per_min: u32) -> Result<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = 60_000 / requests_per_min as u64;
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .ok_or_else(|| anyhow!("invalid rate limit: {requests_per_min} per minute"))?;
    Ok(Governor::new(&cfg))
}

/// Everything a worker's `App` needs, shared across workers.
#[derive(Clone)]
pub struct AppState {
    pub pool: web::Data<MySqlPool>,
    pub config: web::Data<Config>,
    pub tokens: web::Data<TokenService>,
    pub hasher: web::Data<CredentialHasher>,
    pub limiters: RateLimiters,
}

impl AppState {
    pub fn new(pool: MySqlPool, config: Config) -> Result<Self> {
        let hasher = CredentialHasher::new(
            config.argon2_memory_kib,
            config.argon2_iterations,
            config.argon2_parallelism,
        )
        .map_err(|e| anyhow!("invalid argon2 parameters: {e}"))?;
        let tokens = TokenService::new(
            &config.jwt_secret,
            std::time::Duration::from_secs(config.access_token_ttl),
        );

        Ok(Self {
            limiters: RateLimiters::from_config(&config)?,
            pool: web::Data::new(pool),
            config: web::Data::new(config),
            tokens: web::Data::new(tokens),
            hasher: web::Data::new(hasher),
        })
    }
}

pub fn configure(cfg: &mut web::ServiceConfig, state: &AppState) {
    let limiters = &state.limiters;

    cfg.app_data(state.pool.clone())
        .app_data(state.config.clone())
        .app_data(state.tokens.clone())
        .app_data(state.hasher.clone())
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler));

    // Public routes
    cfg.service(web::resource("/health").route(web::get().to(health::health)))
        .service(
            web::resource("/login")
                .wrap(limiters.login.clone())
                .route(web::post().to(handlers::login)),
        )
        .service(
            web::resource("/register")
                .wrap(limiters.register.clone())
                .route(web::post().to(handlers::register)),
        );

    // Protected routes
    cfg.service(
        web::scope(&state.config.api_prefix)
            .wrap(from_fn(auth_middleware)) // authentication
            .wrap(limiters.protected.clone()) // rate limiting
            .service(web::resource("/me").route(web::get().to(handlers::me)))
            .configure(|scope| {
                for schema in ENTITIES {
                    scope.service(entity_scope(*schema));
                }
            }),
    );
}

/// `/{entity}` and `/{entity}/{id}` for one schema.
fn entity_scope(schema: &'static EntitySchema) -> Scope {
    web::scope(schema.path)
        .app_data(web::Data::new(schema))
        .service(
            web::resource("")
                .route(web::get().to(crud::list))
                .route(web::post().to(crud::create)),
        )
        .service(
            web::resource("/{id}")
                .route(web::get().to(crud::get))
                .route(web::patch().to(crud::patch))
                .route(web::put().to(crud::replace))
                .route(web::delete().to(crud::delete)),
        )
}
