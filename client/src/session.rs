use tokio::sync::watch;
use tracing::info;

pub const LOGIN_ROUTE: &str = "/login";
pub const REGISTER_ROUTE: &str = "/register";
pub const BOTS_ROUTE: &str = "/bots";
pub const STATS_ROUTE: &str = "/stats";

/// Dashboard views. Everything but the auth views needs a stored session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Login,
    Register,
    Bots,
    Stats,
}

impl View {
    pub fn route(self) -> &'static str {
        match self {
            View::Login => LOGIN_ROUTE,
            View::Register => REGISTER_ROUTE,
            View::Bots => BOTS_ROUTE,
            View::Stats => STATS_ROUTE,
        }
    }

    pub fn is_protected(self) -> bool {
        !is_auth_route(self.route())
    }
}

/// Current view of the front end, and the way to leave it.
pub trait Navigator: Send + Sync {
    fn current_route(&self) -> String;

    fn navigate(&self, route: &str);

    /// Send the user to the login view unless they are already on an
    /// auth view. Returns whether navigation happened.
    fn redirect_to_login(&self) -> bool {
        if is_auth_route(&self.current_route()) {
            return false;
        }
        info!("Session expired, redirecting to {LOGIN_ROUTE}");
        self.navigate(LOGIN_ROUTE);
        true
    }
}

pub fn is_auth_route(route: &str) -> bool {
    route.contains(LOGIN_ROUTE) || route.contains(REGISTER_ROUTE)
}

/// Navigator that publishes route changes on a watch channel
pub struct RouteWatch {
    tx: watch::Sender<String>,
}

impl RouteWatch {
    pub fn new(initial: &str) -> Self {
        let (tx, _) = watch::channel(initial.to_string());
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.tx.subscribe()
    }
}

impl Default for RouteWatch {
    fn default() -> Self {
        Self::new("/")
    }
}

impl Navigator for RouteWatch {
    fn current_route(&self) -> String {
        self.tx.borrow().clone()
    }

    fn navigate(&self, route: &str) {
        self.tx.send_replace(route.to_string());
    }
}
