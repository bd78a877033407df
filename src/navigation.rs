//! Screen routes and the navigation seam.

/// The two screens of the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Entry screen; runs identity resolution on mount.
    Bootstrap,
    /// Phone + location registration form.
    Register,
}

impl Route {
    pub fn path(self) -> &'static str {
        match self {
            Self::Bootstrap => "/",
            Self::Register => "/register",
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.path())
    }
}

/// Moves the UI between routes.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);
}
