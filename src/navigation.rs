use std::sync::Mutex;

/// Client-side views the control plane can redirect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Home,
    Admin,
    Maintenance,
}

impl Route {
    pub fn path(&self) -> &'static str {
        match self {
            Route::Login => "/login",
            Route::Home => "/",
            Route::Admin => "/admin",
            Route::Maintenance => "/maintenance",
        }
    }
}

/// The UI layer's router, seen from the control plane.
///
/// Guards and pipeline stages only ever ask where the user currently is and
/// redirect them somewhere else; rendering is entirely out of scope.
pub trait Navigator: Send + Sync {
    /// The route currently displayed.
    fn current(&self) -> Route;

    /// Perform a client-side navigation to the given route.
    fn navigate(&self, route: Route);
}

/// A navigator that records every redirect. Used by tests and by embedders
/// that drive their own router from the recorded transitions.
pub struct RecordingNavigator {
    current: Mutex<Route>,
    visits: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn new(start: Route) -> Self {
        Self {
            current: Mutex::new(start),
            visits: Mutex::new(Vec::new()),
        }
    }

    /// Move to a route without recording it as a control-plane redirect,
    /// as if the user navigated on their own.
    pub fn set_current(&self, route: Route) {
        *self.current.lock().unwrap() = route;
    }

    /// Every redirect performed through [`Navigator::navigate`], in order.
    pub fn visits(&self) -> Vec<Route> {
        self.visits.lock().unwrap().clone()
    }
}

impl Navigator for RecordingNavigator {
    fn current(&self) -> Route {
        *self.current.lock().unwrap()
    }

    fn navigate(&self, route: Route) {
        *self.current.lock().unwrap() = route;
        self.visits.lock().unwrap().push(route);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_paths_match_the_client_router() {
        assert_eq!(Route::Login.path(), "/login");
        assert_eq!(Route::Home.path(), "/");
        assert_eq!(Route::Admin.path(), "/admin");
        assert_eq!(Route::Maintenance.path(), "/maintenance");
    }

    #[test]
    fn navigate_updates_current_and_records() {
        let nav = RecordingNavigator::new(Route::Home);
        assert_eq!(nav.current(), Route::Home);

        nav.navigate(Route::Login);
        assert_eq!(nav.current(), Route::Login);
        assert_eq!(nav.visits(), vec![Route::Login]);

        nav.set_current(Route::Home);
        assert_eq!(nav.visits(), vec![Route::Login]);
    }
}
