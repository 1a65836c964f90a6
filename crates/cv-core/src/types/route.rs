//! Route types: HTTP methods, actions, and declared routes.

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;

use super::location::SourceLocation;

/// An HTTP method a route responds to.
///
/// # Examples
///
/// ```
/// use cv_core::HttpMethod;
///
/// assert_eq!(HttpMethod::parse("post"), Some(HttpMethod::Post));
/// assert_eq!(HttpMethod::Delete.as_str(), "DELETE");
/// assert_eq!(HttpMethod::RESOURCE_SET.len(), 5);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// `GET`
    Get,
    /// `POST`
    Post,
    /// `PUT`
    Put,
    /// `PATCH`
    Patch,
    /// `DELETE`
    Delete,
    /// `OPTIONS`
    Options,
    /// `HEAD`
    Head,
}

impl HttpMethod {
    /// Methods registered by a resource declaration.
    pub const RESOURCE_SET: [Self; 5] = [Self::Get, Self::Post, Self::Put, Self::Patch, Self::Delete];

    /// Methods registered by an `any` declaration.
    pub const ALL: [Self; 7] = [
        Self::Get,
        Self::Post,
        Self::Put,
        Self::Patch,
        Self::Delete,
        Self::Options,
        Self::Head,
    ];

    /// Parses a method name, ignoring case.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "get" => Some(Self::Get),
            "post" => Some(Self::Post),
            "put" => Some(Self::Put),
            "patch" => Some(Self::Patch),
            "delete" => Some(Self::Delete),
            "options" => Some(Self::Options),
            "head" => Some(Self::Head),
            _ => None,
        }
    }

    /// Returns the canonical upper-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The flavour of a resource declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// `resource(...)`: full set of actions including form pages.
    Web,
    /// `apiResource(...)`: actions without `create`/`edit`.
    Api,
}

impl ResourceKind {
    /// The controller actions a resource declaration wires up.
    ///
    /// # Examples
    ///
    /// ```
    /// use cv_core::ResourceKind;
    ///
    /// assert!(ResourceKind::Web.actions().contains(&"edit"));
    /// assert!(!ResourceKind::Api.actions().contains(&"edit"));
    /// ```
    #[must_use]
    pub const fn actions(self) -> &'static [&'static str] {
        match self {
            Self::Web => &["index", "create", "store", "show", "edit", "update", "destroy"],
            Self::Api => &["index", "store", "show", "update", "destroy"],
        }
    }
}

/// What a route dispatches to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RouteAction {
    /// A controller, optionally with a specific method.
    Controller {
        /// Controller identifier with namespace and `::class` stripped.
        controller: String,
        /// Controller method, absent for resource declarations.
        method: Option<String>,
    },
    /// An inline closure; opaque, no controller binding.
    Closure,
}

/// A `{name}` or `{name?}` placeholder in a URI pattern.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RouteParameter {
    /// Placeholder name.
    pub name: String,
    /// Whether the placeholder carries a `?`.
    pub optional: bool,
}

/// A declared route.
///
/// Every route belongs to exactly one source file; a file's routes are
/// replaced together when the file is re-parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// HTTP methods the route responds to.
    pub methods: SmallVec<[HttpMethod; 5]>,

    /// URI pattern with any group prefix applied.
    pub uri: String,

    /// Route name from a `->name(...)` call.
    pub name: Option<String>,

    /// Dispatch target.
    pub action: Option<RouteAction>,

    /// Middleware inherited from groups plus any declared inline.
    pub middleware: SmallVec<[String; 4]>,

    /// Set when the route came from a resource declaration.
    pub resource: Option<ResourceKind>,

    /// File that declares the route.
    pub file: Utf8PathBuf,

    /// Position of the declaration.
    pub location: SourceLocation,
}

impl Route {
    /// Returns the bound controller, if any.
    #[must_use]
    pub fn controller(&self) -> Option<&str> {
        match &self.action {
            Some(RouteAction::Controller { controller, .. }) => Some(controller),
            _ => None,
        }
    }

    /// Returns the bound controller method, if any.
    #[must_use]
    pub fn method_name(&self) -> Option<&str> {
        match &self.action {
            Some(RouteAction::Controller { method, .. }) => method.as_deref(),
            _ => None,
        }
    }

    /// Returns `true` if the route dispatches to a closure.
    #[must_use]
    pub fn is_closure(&self) -> bool {
        matches!(self.action, Some(RouteAction::Closure))
    }

    /// Returns `true` if the route responds to `method`.
    #[must_use]
    pub fn responds_to(&self, method: HttpMethod) -> bool {
        self.methods.contains(&method)
    }

    /// Lists the URI placeholders in order.
    ///
    /// # Examples
    ///
    /// ```
    /// use cv_core::{Route, SourceLocation};
    ///
    /// let route = Route {
    ///     methods: Default::default(),
    ///     uri: "posts/{post}/comments/{comment?}".to_owned(),
    ///     name: None,
    ///     action: None,
    ///     middleware: Default::default(),
    ///     resource: None,
    ///     file: "routes/web.php".into(),
    ///     location: SourceLocation::default(),
    /// };
    /// let params = route.parameters();
    /// assert_eq!(params.len(), 2);
    /// assert!(params[1].optional);
    /// ```
    #[must_use]
    pub fn parameters(&self) -> Vec<RouteParameter> {
        let mut params = Vec::new();
        let mut rest = self.uri.as_str();
        while let Some(open) = rest.find('{') {
            let Some(close) = rest[open..].find('}') else {
                break;
            };
            let inner = &rest[open + 1..open + close];
            let (name, optional) = match inner.strip_suffix('?') {
                Some(name) => (name, true),
                None => (inner, false),
            };
            if !name.is_empty() {
                params.push(RouteParameter {
                    name: name.to_owned(),
                    optional,
                });
            }
            rest = &rest[open + close + 1..];
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use smallvec::smallvec;

    fn route(uri: &str, action: Option<RouteAction>) -> Route {
        Route {
            methods: smallvec![HttpMethod::Get],
            uri: uri.to_owned(),
            name: None,
            action,
            middleware: SmallVec::new(),
            resource: None,
            file: Utf8PathBuf::from("routes/web.php"),
            location: SourceLocation::new(1, 0),
        }
    }

    #[test]
    fn test_http_method_parse() {
        assert_eq!(HttpMethod::parse("GET"), Some(HttpMethod::Get));
        assert_eq!(HttpMethod::parse("Patch"), Some(HttpMethod::Patch));
        assert_eq!(HttpMethod::parse("resource"), None);
    }

    #[test]
    fn test_http_method_serialization() {
        assert_eq!(serde_json::to_string(&HttpMethod::Get).unwrap(), r#""GET""#);
    }

    #[test]
    fn test_route_controller_accessors() {
        let r = route(
            "users",
            Some(RouteAction::Controller {
                controller: "UserController".to_owned(),
                method: Some("index".to_owned()),
            }),
        );
        assert_eq!(r.controller(), Some("UserController"));
        assert_eq!(r.method_name(), Some("index"));
        assert!(!r.is_closure());
        assert!(r.responds_to(HttpMethod::Get));
        assert!(!r.responds_to(HttpMethod::Post));
    }

    #[test]
    fn test_route_closure() {
        let r = route("/", Some(RouteAction::Closure));
        assert!(r.is_closure());
        assert_eq!(r.controller(), None);
    }

    #[test]
    fn test_route_parameters() {
        let r = route("users/{user}/posts/{post?}", None);
        let params = r.parameters();
        assert_eq!(params[0].name, "user");
        assert!(!params[0].optional);
        assert_eq!(params[1].name, "post");
        assert!(params[1].optional);
    }

    #[test]
    fn test_route_parameters_unterminated() {
        let r = route("users/{user", None);
        assert!(r.parameters().is_empty());
    }
}
