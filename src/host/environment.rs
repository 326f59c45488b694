//! # Ambient environment inputs.
//!
//! [`HostEnvironment`] is the seam through which the normalizer reads the build version,
//! environment name, current URL, route and user agent. It is queried on **every** report,
//! never cached, so two reports created moments apart can carry different routes.
//!
//! [`SessionEnvironment`] is the provided implementation: interior-mutable so the embedding
//! application can update the location as the user navigates.

use std::env;
use std::sync::{PoisonError, RwLock};

/// Environment name that enables console emission.
pub const DEVELOPMENT: &str = "development";
/// Environment name that tightens the default severity threshold on initialize.
pub const PRODUCTION: &str = "production";

/// Source of ambient metadata stamped onto each report.
///
/// Every method may return `None`; the normalizer substitutes its defaults.
pub trait HostEnvironment: Send + Sync + 'static {
    fn build_version(&self) -> Option<String>;

    /// Environment name, e.g. `"development"` or `"production"`.
    fn environment_name(&self) -> Option<String>;

    fn current_url(&self) -> Option<String>;

    fn current_route(&self) -> Option<String>;

    fn user_agent(&self) -> Option<String>;

    /// True when running in the development environment.
    fn is_development(&self) -> bool {
        self.environment_name().as_deref() == Some(DEVELOPMENT)
    }

    /// True when running in the production environment.
    fn is_production(&self) -> bool {
        self.environment_name().as_deref() == Some(PRODUCTION)
    }
}

#[derive(Debug, Clone, Default)]
struct SessionState {
    build_version: Option<String>,
    environment: Option<String>,
    url: Option<String>,
    route: Option<String>,
    user_agent: Option<String>,
}

/// Mutable, thread-safe [`HostEnvironment`].
///
/// ## Example
/// ```rust
/// use faultwatch::{HostEnvironment, SessionEnvironment};
///
/// let env = SessionEnvironment::new()
///     .with_build_version("1.2.3")
///     .with_environment("production");
/// env.navigate("https://example.org/blog", "/blog");
///
/// assert!(env.is_production());
/// assert_eq!(env.current_route().as_deref(), Some("/blog"));
/// ```
#[derive(Debug, Default)]
pub struct SessionEnvironment {
    state: RwLock<SessionState>,
}

impl SessionEnvironment {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reads `FAULTWATCH_BUILD_VERSION`, `FAULTWATCH_ENV` and `FAULTWATCH_USER_AGENT`.
    ///
    /// Unset or empty variables stay unset.
    pub fn from_env() -> Self {
        let read = |key: &str| env::var(key).ok().filter(|v| !v.is_empty());
        Self {
            state: RwLock::new(SessionState {
                build_version: read("FAULTWATCH_BUILD_VERSION"),
                environment: read("FAULTWATCH_ENV"),
                user_agent: read("FAULTWATCH_USER_AGENT"),
                url: None,
                route: None,
            }),
        }
    }

    pub fn with_build_version(self, version: impl Into<String>) -> Self {
        self.write(|s| s.build_version = Some(version.into()));
        self
    }

    pub fn with_environment(self, name: impl Into<String>) -> Self {
        self.write(|s| s.environment = Some(name.into()));
        self
    }

    pub fn with_user_agent(self, user_agent: impl Into<String>) -> Self {
        self.write(|s| s.user_agent = Some(user_agent.into()));
        self
    }

    /// Records the current location.
    pub fn navigate(&self, url: impl Into<String>, route: impl Into<String>) {
        let (url, route) = (url.into(), route.into());
        self.write(|s| {
            s.url = Some(url);
            s.route = Some(route);
        });
    }

    /// Switches the environment name at runtime.
    pub fn set_environment(&self, name: impl Into<String>) {
        let name = name.into();
        self.write(|s| s.environment = Some(name));
    }

    fn write(&self, f: impl FnOnce(&mut SessionState)) {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut state);
    }

    fn read<T>(&self, f: impl FnOnce(&SessionState) -> T) -> T {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        f(&state)
    }
}

impl HostEnvironment for SessionEnvironment {
    fn build_version(&self) -> Option<String> {
        self.read(|s| s.build_version.clone())
    }

    fn environment_name(&self) -> Option<String> {
        self.read(|s| s.environment.clone())
    }

    fn current_url(&self) -> Option<String> {
        self.read(|s| s.url.clone())
    }

    fn current_route(&self) -> Option<String> {
        self.read(|s| s.route.clone())
    }

    fn user_agent(&self) -> Option<String> {
        self.read(|s| s.user_agent.clone())
    }
}
