//! Session recipe: construction, overrides, and one-shot initialisation.
//!
//! A [`SessionRecipe`] bundles the validated configuration, the token
//! codec, and the (possibly overridden) operation set. It is owned by
//! whoever builds it; [`RecipeSlot`] gives an application a single place
//! to initialise it exactly once and fetch it afterwards.

use std::sync::{Arc, OnceLock};

use chrono::{DateTime, Utc};
use tracing::info;

use sessionward_core::config::{SessionConfig, TokenConfig};
use sessionward_core::error::{AppError, ErrorKind};
use sessionward_core::events::TracingEventSink;
use sessionward_core::traits::{Clock, SessionEventSink, SystemClock};

use crate::codec::TokenCodec;
use crate::csrf::AntiCsrfGuard;
use crate::session::{SessionManager, SessionOperations};
use crate::store::SessionStore;

/// Identifier of this recipe.
pub const RECIPE_ID: &str = "session";

/// Stable id of the refresh endpoint.
pub const REFRESH_API_ID: &str = "/session/refresh";
/// Stable id of the signout endpoint.
pub const SIGNOUT_API_ID: &str = "/signout";

/// Request header carrying the anti-CSRF token (and response header issuing it).
pub const ANTI_CSRF_HEADER: &str = "anti-csrf";
/// Request header whose presence satisfies custom-header anti-CSRF.
pub const RID_HEADER: &str = "rid";
/// Request header selecting cookie or header transport.
pub const AUTH_MODE_HEADER: &str = "st-auth-mode";
/// Response header carrying the client-readable token summary.
pub const FRONT_TOKEN_HEADER: &str = "front-token";
/// Response header carrying the access token in header mode.
pub const ACCESS_TOKEN_HEADER: &str = "st-access-token";
/// Response header carrying the refresh token in header mode.
pub const REFRESH_TOKEN_HEADER: &str = "st-refresh-token";

/// One endpoint this recipe serves.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiHandled {
    /// HTTP method, lowercase.
    pub method: &'static str,
    /// Path including the API base path.
    pub path: String,
    /// Stable endpoint id.
    pub id: &'static str,
    /// Whether configuration turned the endpoint off.
    pub disabled: bool,
}

type OperationsOverride =
    Box<dyn FnOnce(Arc<dyn SessionOperations>) -> Arc<dyn SessionOperations> + Send>;

/// Builds a [`SessionRecipe`].
pub struct SessionRecipeBuilder {
    token_config: TokenConfig,
    session_config: SessionConfig,
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn SessionEventSink>,
    operations_override: Option<OperationsOverride>,
}

impl std::fmt::Debug for SessionRecipeBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecipeBuilder")
            .field("token_config", &self.token_config)
            .field("session_config", &self.session_config)
            .field("store", &self.store)
            .field("overridden", &self.operations_override.is_some())
            .finish()
    }
}

impl SessionRecipeBuilder {
    /// Starts a builder over `store` with the system clock and tracing events.
    pub fn new(
        token_config: TokenConfig,
        session_config: SessionConfig,
        store: Arc<dyn SessionStore>,
    ) -> Self {
        Self {
            token_config,
            session_config,
            store,
            clock: Arc::new(SystemClock),
            events: Arc::new(TracingEventSink),
            operations_override: None,
        }
    }

    /// Uses `clock` for every expiry decision.
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Sends lifecycle events to `events`.
    pub fn event_sink(mut self, events: Arc<dyn SessionEventSink>) -> Self {
        self.events = events;
        self
    }

    /// Wraps the default operation set. `f` receives the original and
    /// returns its replacement.
    pub fn override_operations<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Arc<dyn SessionOperations>) -> Arc<dyn SessionOperations> + Send + 'static,
    {
        self.operations_override = Some(Box::new(f));
        self
    }

    /// Validates configuration and assembles the recipe.
    pub fn build(self) -> Result<SessionRecipe, AppError> {
        self.token_config.validate()?;
        self.session_config.validate()?;

        let codec = Arc::new(TokenCodec::new(&self.token_config, self.clock.clone())?);
        let manager: Arc<dyn SessionOperations> = Arc::new(SessionManager::new(
            self.store,
            codec.clone(),
            self.clock.clone(),
            self.events,
            &self.token_config,
            &self.session_config,
        )?);
        let operations = match self.operations_override {
            Some(f) => f(manager),
            None => manager,
        };

        Ok(SessionRecipe {
            anti_csrf: AntiCsrfGuard::new(self.session_config.anti_csrf),
            token_config: self.token_config,
            session_config: self.session_config,
            codec,
            clock: self.clock,
            operations,
        })
    }
}

/// A fully assembled session recipe.
pub struct SessionRecipe {
    token_config: TokenConfig,
    session_config: SessionConfig,
    anti_csrf: AntiCsrfGuard,
    codec: Arc<TokenCodec>,
    clock: Arc<dyn Clock>,
    operations: Arc<dyn SessionOperations>,
}

impl std::fmt::Debug for SessionRecipe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionRecipe")
            .field("session_config", &self.session_config)
            .field("anti_csrf", &self.anti_csrf.mode())
            .finish()
    }
}

impl SessionRecipe {
    /// The operation set, overrides applied.
    pub fn operations(&self) -> Arc<dyn SessionOperations> {
        self.operations.clone()
    }

    /// The token codec, for signing-key rotation.
    pub fn codec(&self) -> &Arc<TokenCodec> {
        &self.codec
    }

    /// Current time on the recipe's clock.
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Anti-CSRF policy.
    pub fn anti_csrf(&self) -> AntiCsrfGuard {
        self.anti_csrf
    }

    /// Session transport configuration.
    pub fn session_config(&self) -> &SessionConfig {
        &self.session_config
    }

    /// Token lifetime configuration.
    pub fn token_config(&self) -> &TokenConfig {
        &self.token_config
    }

    /// Endpoints this recipe serves, disabled ones included.
    pub fn apis_handled(&self) -> Vec<ApiHandled> {
        vec![
            ApiHandled {
                method: "post",
                path: self.session_config.full_refresh_path(),
                id: REFRESH_API_ID,
                disabled: self.session_config.disable_refresh_api,
            },
            ApiHandled {
                method: "post",
                path: self.session_config.full_signout_path(),
                id: SIGNOUT_API_ID,
                disabled: self.session_config.disable_signout_api,
            },
        ]
    }

    /// Request headers browsers must be allowed to send cross-origin.
    pub fn cors_allowed_headers() -> &'static [&'static str] {
        &[ANTI_CSRF_HEADER, RID_HEADER, "authorization", AUTH_MODE_HEADER]
    }

    /// Response headers browsers must be allowed to read cross-origin.
    pub fn cors_exposed_headers() -> &'static [&'static str] {
        &[
            FRONT_TOKEN_HEADER,
            ANTI_CSRF_HEADER,
            ACCESS_TOKEN_HEADER,
            REFRESH_TOKEN_HEADER,
        ]
    }
}

/// Holds at most one recipe for the lifetime of the slot.
#[derive(Debug, Default)]
pub struct RecipeSlot {
    cell: OnceLock<Arc<SessionRecipe>>,
}

impl RecipeSlot {
    /// An empty slot.
    pub const fn new() -> Self {
        Self {
            cell: OnceLock::new(),
        }
    }

    /// Builds and stores the recipe. Fails if one is already stored.
    pub fn init(&self, builder: SessionRecipeBuilder) -> Result<Arc<SessionRecipe>, AppError> {
        if self.cell.get().is_some() {
            return Err(already_initialised());
        }
        let recipe = Arc::new(builder.build()?);
        self.cell
            .set(recipe.clone())
            .map_err(|_| already_initialised())?;
        info!(recipe = RECIPE_ID, "Recipe initialised");
        Ok(recipe)
    }

    /// Returns the stored recipe.
    pub fn get(&self) -> Result<Arc<SessionRecipe>, AppError> {
        self.cell.get().cloned().ok_or_else(|| {
            AppError::new(
                ErrorKind::NotInitialised,
                "Session recipe has not been initialised",
            )
        })
    }
}

fn already_initialised() -> AppError {
    AppError::new(
        ErrorKind::AlreadyInitialised,
        "Session recipe has already been initialised",
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sessionward_core::traits::ManualClock;

    use crate::store::MemorySessionStore;

    fn builder() -> SessionRecipeBuilder {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(MemorySessionStore::new(Duration::hours(1), clock.clone()));
        SessionRecipeBuilder::new(TokenConfig::default(), SessionConfig::default(), store)
            .clock(clock)
    }

    #[test]
    fn test_slot_initialises_once() {
        let slot = RecipeSlot::new();
        assert!(slot.get().unwrap_err().is(ErrorKind::NotInitialised));

        slot.init(builder()).unwrap();
        assert!(slot.get().is_ok());

        let err = slot.init(builder()).unwrap_err();
        assert!(err.is(ErrorKind::AlreadyInitialised));
        assert_eq!(err.message, "Session recipe has already been initialised");
    }

    #[test]
    fn test_invalid_config_rejected_at_build() {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(MemorySessionStore::new(Duration::hours(1), clock));
        let session = SessionConfig {
            refresh_path: "no-slash".into(),
            ..SessionConfig::default()
        };
        let err = SessionRecipeBuilder::new(TokenConfig::default(), session, store)
            .build()
            .unwrap_err();
        assert!(err.is(ErrorKind::Configuration));
    }

    #[test]
    fn test_out_of_range_lifetimes_rejected_at_build() {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(MemorySessionStore::new(Duration::hours(1), clock));
        let token = TokenConfig {
            access_token_ttl_seconds: 1_000_000_000_000_000,
            refresh_token_ttl_minutes: 100_000_000_000_000,
            ..TokenConfig::default()
        };
        let err = SessionRecipeBuilder::new(token, SessionConfig::default(), store)
            .build()
            .unwrap_err();
        assert!(err.is(ErrorKind::Configuration));
    }

    #[test]
    fn test_apis_handled_reflects_config() {
        let clock = Arc::new(ManualClock::starting_now());
        let store = Arc::new(MemorySessionStore::new(Duration::hours(1), clock));
        let session = SessionConfig {
            disable_signout_api: true,
            ..SessionConfig::default()
        };
        let recipe = SessionRecipeBuilder::new(TokenConfig::default(), session, store)
            .build()
            .unwrap();

        let apis = recipe.apis_handled();
        assert_eq!(apis[0].path, "/auth/session/refresh");
        assert!(!apis[0].disabled);
        assert_eq!(apis[1].id, SIGNOUT_API_ID);
        assert!(apis[1].disabled);
    }

    #[test]
    fn test_cors_headers() {
        assert!(SessionRecipe::cors_allowed_headers().contains(&"anti-csrf"));
        assert!(SessionRecipe::cors_exposed_headers().contains(&"front-token"));
    }
}
