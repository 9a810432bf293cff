//! Application state shared across all handlers and middleware.

use std::sync::Arc;

use sessionward_auth::SessionRecipe;

use crate::apis::{DefaultSessionApis, SessionApis};

/// Shared state threaded through every route.
#[derive(Clone)]
pub struct ApiState {
    /// The initialised session recipe.
    pub recipe: Arc<SessionRecipe>,
    /// Endpoint logic, overrides applied.
    pub apis: Arc<dyn SessionApis>,
}

impl std::fmt::Debug for ApiState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiState")
            .field("recipe", &self.recipe)
            .finish_non_exhaustive()
    }
}

impl ApiState {
    /// State with the default endpoint logic.
    pub fn new(recipe: Arc<SessionRecipe>) -> Self {
        let apis = Arc::new(DefaultSessionApis::new(&recipe));
        Self { recipe, apis }
    }

    /// Wraps the endpoint logic. `f` receives the current implementation
    /// and returns its replacement.
    pub fn override_apis<F>(mut self, f: F) -> Self
    where
        F: FnOnce(Arc<dyn SessionApis>) -> Arc<dyn SessionApis>,
    {
        self.apis = f(self.apis);
        self
    }
}
