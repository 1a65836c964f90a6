//! Route declaration extraction.
//!
//! Route files are scanned line by line. A line declares a route when it holds
//! a `Route::<verb>(...)` call; the action is recognized from four shapes, in
//! this order:
//!
//! | Shape | Example | Action |
//! |-------|---------|--------|
//! | quoted string | `'UserController@index'` | controller + method |
//! | array | `[UserController::class, 'index']` | controller + method |
//! | resource | `Route::resource('photos', PhotoController::class)` | controller, every resource action |
//! | closure | `function () { ... }` / `fn () => ...` | [`RouteAction::Closure`] |
//!
//! Group blocks (`Route::prefix('admin')->group(function () {`) push a context
//! holding the accumulated URI prefix, middleware, and name prefix. Brace depth
//! is tracked per line, so closing `});` pops exactly the block it closes; once
//! the outermost group closes the context is empty again.

use camino::Utf8Path;
use cv_core::{HttpMethod, ResourceKind, Route, RouteAction, SourceLocation};
use smallvec::{SmallVec, smallvec};

use crate::patterns;
use crate::text::{is_comment_line, normalize_class_ref, quoted_strings};

/// Maximum distance, in lines, between a route and a detached `->name(...)`.
pub const NAME_WINDOW: usize = 2;

/// Extracts every route declared in a route file.
///
/// Never fails: lines that match no recognized shape yield nothing.
///
/// # Examples
///
/// ```
/// use cv_extract::routes::extract_routes;
/// use cv_core::HttpMethod;
/// use camino::Utf8Path;
///
/// let source = r#"
/// Route::prefix('admin')->middleware('auth')->group(function () {
///     Route::get('/users', 'UserController@index');
/// });
/// Route::resource('photos', PhotoController::class);
/// "#;
///
/// let routes = extract_routes(source, Utf8Path::new("routes/web.php"));
/// assert_eq!(routes[0].uri, "admin/users");
/// assert_eq!(routes[0].middleware.as_slice(), ["auth"]);
/// assert_eq!(routes[1].uri, "photos/{id?}");
/// assert_eq!(routes[1].methods.as_slice(), HttpMethod::RESOURCE_SET);
/// ```
#[must_use]
pub fn extract_routes(content: &str, file: &Utf8Path) -> Vec<Route> {
    let mut extractor = RouteExtractor::new(file);
    for (index, line) in content.lines().enumerate() {
        extractor.line(index + 1, line);
    }
    extractor.routes
}

/// Joins a group prefix and a URI, collapsing repeated separators.
///
/// An empty prefix leaves the URI unchanged.
///
/// # Examples
///
/// ```
/// use cv_extract::routes::join_uri;
///
/// assert_eq!(join_uri("admin", "/users"), "admin/users");
/// assert_eq!(join_uri("/api/", "/v1"), "/api/v1");
/// assert_eq!(join_uri("", "/users"), "/users");
/// ```
#[must_use]
pub fn join_uri(prefix: &str, uri: &str) -> String {
    if prefix.is_empty() {
        return uri.to_owned();
    }
    collapse_separators(&format!("{prefix}/{uri}"))
}

fn collapse_separators(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        if c == '/' && out.ends_with('/') {
            continue;
        }
        out.push(c);
    }
    out
}

/// Accumulated attributes of the enclosing group blocks.
#[derive(Debug, Clone, Default)]
struct GroupContext {
    prefix: String,
    middleware: SmallVec<[String; 4]>,
    name_prefix: String,
}

#[derive(Debug)]
enum Frame {
    Group(GroupContext),
    /// Any other brace block; `route` is set for multi-line closure routes.
    Block { route: Option<usize> },
}

struct RouteExtractor<'a> {
    file: &'a Utf8Path,
    stack: Vec<Frame>,
    routes: Vec<Route>,
    last_route_line: Option<usize>,
}

impl<'a> RouteExtractor<'a> {
    fn new(file: &'a Utf8Path) -> Self {
        Self {
            file,
            stack: Vec::new(),
            routes: Vec::new(),
            last_route_line: None,
        }
    }

    fn context(&self) -> Option<&GroupContext> {
        self.stack.iter().rev().find_map(|frame| match frame {
            Frame::Group(ctx) => Some(ctx),
            Frame::Block { .. } => None,
        })
    }

    fn line(&mut self, line_no: usize, line: &str) {
        if line.trim().is_empty() || is_comment_line(line) {
            return;
        }

        let opens = line.matches('{').count();
        let closes = line.matches('}').count();

        if let Some(caps) = patterns::ROUTE_VERB.captures(line) {
            let declared = self.declare(line_no, line, &caps);
            if opens > closes {
                self.stack.push(Frame::Block { route: declared });
                self.push_blocks(opens - closes - 1);
            }
            return;
        }

        if line.contains("Route::") && patterns::GROUP_OPEN.is_match(line) {
            if opens > closes {
                let ctx = self.group_context(line);
                self.stack.push(Frame::Group(ctx));
                self.push_blocks(opens - closes - 1);
            }
            return;
        }

        let mut owner = None;
        for _ in opens..closes {
            match self.stack.pop() {
                Some(Frame::Block { route: Some(index) }) if owner.is_none() => owner = Some(index),
                Some(_) => {}
                None => break,
            }
        }
        if opens > closes {
            self.push_blocks(opens - closes);
        }

        let target = owner.or_else(|| {
            self.last_route_line
                .filter(|&last| line_no - last <= NAME_WINDOW)
                .map(|_| self.routes.len() - 1)
        });
        if let Some(index) = target {
            self.attach_trailing(index, line);
        }
    }

    fn push_blocks(&mut self, count: usize) {
        for _ in 0..count {
            self.stack.push(Frame::Block { route: None });
        }
    }

    /// Applies a detached `->name(...)` or `->middleware(...)` to a route.
    fn attach_trailing(&mut self, index: usize, line: &str) {
        let name_prefix = self
            .context()
            .map(|ctx| ctx.name_prefix.clone())
            .unwrap_or_default();
        let Some(route) = self.routes.get_mut(index) else {
            return;
        };
        if let Some(caps) = patterns::NAME_CALL.captures(line) {
            route.name = Some(format!("{name_prefix}{}", &caps[1]));
        }
        for caps in patterns::MIDDLEWARE_CALL.captures_iter(line) {
            push_unique(&mut route.middleware, quoted_strings(&caps[1]));
        }
    }

    fn group_context(&self, line: &str) -> GroupContext {
        let mut ctx = self.context().cloned().unwrap_or_default();

        let prefix = patterns::PREFIX_CALL
            .captures(line)
            .or_else(|| patterns::PREFIX_KEY.captures(line));
        if let Some(caps) = prefix {
            ctx.prefix = if ctx.prefix.is_empty() {
                caps[1].to_owned()
            } else {
                join_uri(&ctx.prefix, &caps[1])
            };
        }

        for caps in patterns::MIDDLEWARE_CALL
            .captures_iter(line)
            .chain(patterns::MIDDLEWARE_KEY.captures_iter(line))
        {
            push_unique(&mut ctx.middleware, quoted_strings(&caps[1]));
        }

        let name = patterns::NAME_CALL
            .captures(line)
            .or_else(|| patterns::AS_KEY.captures(line));
        if let Some(caps) = name {
            ctx.name_prefix.push_str(&caps[1]);
        }

        ctx
    }

    /// Records the route declared on `line`, returning its index.
    fn declare(&mut self, line_no: usize, line: &str, caps: &regex::Captures<'_>) -> Option<usize> {
        let whole = caps.get(0)?;
        let verb = caps.get(1)?.as_str();
        let mut args = &line[whole.end()..];

        let resource = match verb {
            "resource" => Some(ResourceKind::Web),
            "apiResource" => Some(ResourceKind::Api),
            _ => None,
        };

        let methods: SmallVec<[HttpMethod; 5]> = match verb {
            "match" => {
                let list = patterns::LEADING_LIST.captures(args)?;
                let methods = quoted_strings(&list[1])
                    .iter()
                    .filter_map(|m| HttpMethod::parse(m))
                    .collect();
                args = &args[list.get(0)?.end()..];
                methods
            }
            "any" => HttpMethod::ALL.into_iter().collect(),
            "resource" | "apiResource" => HttpMethod::RESOURCE_SET.into_iter().collect(),
            other => smallvec![HttpMethod::parse(other)?],
        };

        let uri_caps = patterns::LEADING_QUOTED.captures(args)?;
        let raw_uri = uri_caps.get(1).or_else(|| uri_caps.get(2))?.as_str();
        let after = &args[uri_caps.get(0)?.end()..];

        let ctx = self.context().cloned().unwrap_or_default();
        let (uri, action) = match resource {
            Some(_) => {
                let base = join_uri(&ctx.prefix, raw_uri);
                let controller = patterns::ARG_CLASS_REF
                    .captures(after)
                    .or_else(|| patterns::ARG_QUOTED_CLASS.captures(after))
                    .map(|c| RouteAction::Controller {
                        controller: normalize_class_ref(&c[1]),
                        method: None,
                    });
                (collapse_separators(&format!("{base}/{{id?}}")), controller)
            }
            None => (join_uri(&ctx.prefix, raw_uri), parse_action(after)),
        };

        let mut middleware = ctx.middleware.clone();
        for caps in patterns::MIDDLEWARE_CALL
            .captures_iter(line)
            .chain(patterns::MIDDLEWARE_KEY.captures_iter(after))
        {
            push_unique(&mut middleware, quoted_strings(&caps[1]));
        }

        let name = patterns::NAME_CALL
            .captures(after)
            .or_else(|| patterns::AS_KEY.captures(after))
            .map(|c| format!("{}{}", ctx.name_prefix, &c[1]));

        self.routes.push(Route {
            methods,
            uri,
            name,
            action,
            middleware,
            resource,
            file: self.file.to_owned(),
            location: SourceLocation::new(
                u32::try_from(line_no).unwrap_or(u32::MAX),
                u32::try_from(whole.start()).unwrap_or(u32::MAX),
            ),
        });
        self.last_route_line = Some(line_no);
        Some(self.routes.len() - 1)
    }
}

/// Recognizes the action arguments that follow a route's URI.
fn parse_action(after: &str) -> Option<RouteAction> {
    if let Some(caps) = patterns::ACTION_AT.captures(after) {
        return Some(RouteAction::Controller {
            controller: normalize_class_ref(&caps[1]),
            method: Some(caps[2].to_owned()),
        });
    }
    if let Some(caps) = patterns::ACTION_ARRAY.captures(after) {
        return Some(RouteAction::Controller {
            controller: normalize_class_ref(&caps[1]),
            method: Some(caps[2].to_owned()),
        });
    }
    if let Some(caps) = patterns::ARG_CLASS_REF.captures(after) {
        return Some(RouteAction::Controller {
            controller: normalize_class_ref(&caps[1]),
            method: Some("__invoke".to_owned()),
        });
    }
    if patterns::CLOSURE.is_match(after) {
        return Some(RouteAction::Closure);
    }
    None
}

fn push_unique(target: &mut SmallVec<[String; 4]>, items: Vec<String>) {
    for item in items {
        if !target.contains(&item) {
            target.push(item);
        }
    }
}
