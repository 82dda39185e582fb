//! Pages of the marketplace and the session guard in front of private ones

use std::fmt;

use crate::auth::SessionState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    Listing(String),
    Login,
    Register,
    Dashboard,
    NewListing,
}

/// What to do when a route is requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteDecision {
    Render,

    /// The session is still loading; show nothing yet
    Wait,

    Redirect(Route),
}

impl Route {
    /// Match a path such as `/car/42`; query strings and a trailing slash are ignored
    pub fn parse(path: &str) -> Option<Route> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Route::Home),
            ["car", id] => Some(Route::Listing(id.to_string())),
            ["login"] => Some(Route::Login),
            ["register"] => Some(Route::Register),
            ["dashboard"] => Some(Route::Dashboard),
            ["dashboard", "new"] => Some(Route::NewListing),
            _ => None,
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Home => "/".to_string(),
            Route::Listing(id) => format!("/car/{}", id),
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Dashboard => "/dashboard".to_string(),
            Route::NewListing => "/dashboard/new".to_string(),
        }
    }

    pub fn requires_session(&self) -> bool {
        matches!(self, Route::Dashboard | Route::NewListing)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path())
    }
}

pub fn guard(route: &Route, state: &SessionState) -> RouteDecision {
    if !route.requires_session() {
        return RouteDecision::Render;
    }

    match state {
        SessionState::Loading => RouteDecision::Wait,
        SessionState::Unauthenticated => RouteDecision::Redirect(Route::Login),
        SessionState::Authenticated(_) => RouteDecision::Render,
    }
}

/// Target of the account link in the header, hidden while loading
pub fn account_link(state: &SessionState) -> Option<Route> {
    match state {
        SessionState::Loading => None,
        SessionState::Unauthenticated => Some(Route::Login),
        SessionState::Authenticated(_) => Some(Route::Dashboard),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{Session, SessionUser};

    fn authenticated() -> SessionState {
        SessionState::Authenticated(Session {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_at: None,
            user: SessionUser {
                id: "u1".to_string(),
                name: "Ana".to_string(),
            },
        })
    }

    #[test]
    fn parses_every_page() {
        assert_eq!(Route::parse("/"), Some(Route::Home));
        assert_eq!(Route::parse(""), Some(Route::Home));
        assert_eq!(Route::parse("/car/abc"), Some(Route::Listing("abc".to_string())));
        assert_eq!(Route::parse("/login"), Some(Route::Login));
        assert_eq!(Route::parse("/register/"), Some(Route::Register));
        assert_eq!(Route::parse("/dashboard?tab=1"), Some(Route::Dashboard));
        assert_eq!(Route::parse("/dashboard/new"), Some(Route::NewListing));
        assert_eq!(Route::parse("/car"), None);
        assert_eq!(Route::parse("/dashboard/edit"), None);
    }

    #[test]
    fn path_parses_back() {
        for route in [
            Route::Home,
            Route::Listing("42".to_string()),
            Route::Login,
            Route::Register,
            Route::Dashboard,
            Route::NewListing,
        ] {
            assert_eq!(Route::parse(&route.path()), Some(route));
        }
    }

    #[test]
    fn private_pages_wait_then_redirect() {
        let route = Route::NewListing;
        assert_eq!(guard(&route, &SessionState::Loading), RouteDecision::Wait);
        assert_eq!(
            guard(&route, &SessionState::Unauthenticated),
            RouteDecision::Redirect(Route::Login)
        );
        assert_eq!(guard(&route, &authenticated()), RouteDecision::Render);
    }

    #[test]
    fn public_pages_always_render() {
        let route = Route::Listing("1".to_string());
        assert_eq!(guard(&route, &SessionState::Loading), RouteDecision::Render);
        assert_eq!(guard(&Route::Home, &SessionState::Unauthenticated), RouteDecision::Render);
    }

    #[test]
    fn account_link_follows_session() {
        assert_eq!(account_link(&SessionState::Loading), None);
        assert_eq!(account_link(&SessionState::Unauthenticated), Some(Route::Login));
        assert_eq!(account_link(&authenticated()), Some(Route::Dashboard));
    }
}
