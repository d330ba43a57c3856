/// Paths that belong to the sign-in flow itself.
const AUTH_PAGES: &[&str] = &["/login", "/signup", "/callback", "/error"];

pub const HOME_PATH: &str = "/";
pub const LOGIN_PATH: &str = "/login";

/// Where the user currently is: a path plus its query string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub path: String,
    pub query: String,
}

impl Location {
    /// Splits `"/tasks?redirect=/x"` into path and query.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        let (path, query) = raw.split_once('?').unwrap_or((raw, ""));
        let path = if path.is_empty() { HOME_PATH } else { path };
        Self {
            path: path.to_string(),
            query: query.to_string(),
        }
    }

    /// Path and query as one string, the way it would be navigated back to.
    pub fn current(&self) -> String {
        if self.query.is_empty() {
            self.path.clone()
        } else {
            format!("{}?{}", self.path, self.query)
        }
    }

    /// Non-empty `redirect` query parameter, if any, percent-decoded.
    pub fn redirect_target(&self) -> Option<String> {
        let pairs: Vec<(String, String)> = serde_urlencoded::from_str(&self.query).ok()?;
        pairs
            .into_iter()
            .find(|(key, _)| key == "redirect")
            .map(|(_, value)| value)
            .filter(|value| !value.is_empty())
    }

    pub fn is_auth_page(&self) -> bool {
        AUTH_PAGES.iter().any(|page| self.path.contains(page))
    }
}

/// Where to go once the identity provider has answered.
///
/// | signed in | auth page | redirect | target          |
/// |-----------|-----------|----------|-----------------|
/// | yes       | any       | yes      | redirect target |
/// | yes       | no        | no       | current path    |
/// | yes       | yes       | no       | `/`             |
/// | no        | no        | any      | `/login`        |
/// | no        | yes       | any      | current path    |
pub fn resolve_navigation(location: &Location, signed_in: bool) -> String {
    match (signed_in, location.is_auth_page(), location.redirect_target()) {
        (true, _, Some(target)) => target,
        (true, false, None) => location.current(),
        (true, true, None) => HOME_PATH.to_string(),
        (false, false, _) => LOGIN_PATH.to_string(),
        (false, true, _) => location.current(),
    }
}
