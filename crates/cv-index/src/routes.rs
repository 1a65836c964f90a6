//! The route table and controller binding resolution.
//!
//! Controller identifiers are written inconsistently across a project
//! (`User`, `UserController`, with or without a namespace), so each route is
//! indexed under several candidate keys and lookups try the same candidates
//! in the same order, returning the first non-empty match.

use camino::{Utf8Path, Utf8PathBuf};
use cv_core::{FxHashMap, Route};
use smallvec::SmallVec;

const CONTROLLER_SUFFIX: &str = "Controller";

/// Generates the lookup keys for a controller action, in precedence order.
///
/// For controller `C` and method `m` the keys are `C@m`, `CController@m`,
/// `S@m` and `SController@m`, where `S` is `C` without a trailing
/// `Controller`. Duplicates are dropped, keeping the first occurrence.
///
/// # Examples
///
/// ```
/// use cv_index::routes::candidate_keys;
///
/// let keys = candidate_keys("PhotoController", "show");
/// assert_eq!(
///     keys.as_slice(),
///     ["PhotoController@show", "PhotoControllerController@show", "Photo@show"]
/// );
///
/// let keys = candidate_keys("Photo", "show");
/// assert_eq!(keys.as_slice(), ["Photo@show", "PhotoController@show"]);
/// ```
#[must_use]
pub fn candidate_keys(controller: &str, method: &str) -> SmallVec<[String; 4]> {
    let stripped = controller
        .strip_suffix(CONTROLLER_SUFFIX)
        .unwrap_or(controller);
    let all = [
        format!("{controller}@{method}"),
        format!("{controller}{CONTROLLER_SUFFIX}@{method}"),
        format!("{stripped}@{method}"),
        format!("{stripped}{CONTROLLER_SUFFIX}@{method}"),
    ];

    let mut keys = SmallVec::new();
    for key in all {
        if !keys.contains(&key) {
            keys.push(key);
        }
    }
    keys
}

/// An immutable table of every route in the project.
///
/// Routes are stored in file order, then declaration order.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    by_file: FxHashMap<Utf8PathBuf, Vec<usize>>,
    by_action: FxHashMap<String, Vec<usize>>,
    by_name: FxHashMap<String, usize>,
}

impl RouteTable {
    /// Builds a table from extracted routes.
    ///
    /// When two routes share a name, the later declaration wins, matching
    /// the framework's registration order.
    #[must_use]
    pub fn from_routes(routes: Vec<Route>) -> Self {
        let mut table = Self {
            routes,
            ..Self::default()
        };

        for (index, route) in table.routes.iter().enumerate() {
            table
                .by_file
                .entry(route.file.clone())
                .or_default()
                .push(index);

            if let Some(name) = &route.name {
                table.by_name.insert(name.clone(), index);
            }

            let Some(controller) = route.controller() else {
                continue;
            };
            let methods: Vec<&str> = match (route.method_name(), route.resource) {
                (Some(method), _) => vec![method],
                (None, Some(kind)) => kind.actions().to_vec(),
                (None, None) => Vec::new(),
            };
            for method in methods {
                for key in candidate_keys(controller, method) {
                    let bucket = table.by_action.entry(key).or_default();
                    if !bucket.contains(&index) {
                        bucket.push(index);
                    }
                }
            }
        }
        table
    }

    /// Returns a new table with every route of `file` replaced by `routes`.
    #[must_use]
    pub fn replacing_file(&self, file: &Utf8Path, routes: Vec<Route>) -> Self {
        let mut kept: Vec<Route> = self
            .routes
            .iter()
            .filter(|r| r.file != file)
            .cloned()
            .collect();
        kept.extend(routes);
        kept.sort_by(|a, b| a.file.cmp(&b.file).then(a.location.cmp(&b.location)));
        Self::from_routes(kept)
    }

    /// Routes bound to `controller@method`, first matching candidate key wins.
    ///
    /// Resource routes answer for every action of their resource kind.
    #[must_use]
    pub fn routes_for_action(&self, controller: &str, method: &str) -> Vec<&Route> {
        candidate_keys(controller, method)
            .iter()
            .find_map(|key| self.by_action.get(key).filter(|hits| !hits.is_empty()))
            .map(|hits| self.resolve(hits))
            .unwrap_or_default()
    }

    /// Looks up a route by its exact name.
    #[must_use]
    pub fn by_name(&self, name: &str) -> Option<&Route> {
        self.by_name.get(name).and_then(|&i| self.routes.get(i))
    }

    /// Route names starting with `prefix`, sorted.
    #[must_use]
    pub fn names_with_prefix(&self, prefix: &str) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .by_name
            .keys()
            .map(String::as_str)
            .filter(|name| name.starts_with(prefix))
            .collect();
        names.sort_unstable();
        names
    }

    /// Routes whose URI starts with `prefix`.
    #[must_use]
    pub fn uri_with_prefix(&self, prefix: &str) -> Vec<&Route> {
        self.routes
            .iter()
            .filter(|r| r.uri.starts_with(prefix))
            .collect()
    }

    /// Routes declared in `file`, in declaration order.
    #[must_use]
    pub fn for_file(&self, file: &Utf8Path) -> Vec<&Route> {
        self.by_file
            .get(file)
            .map(|hits| self.resolve(hits))
            .unwrap_or_default()
    }

    /// Every route.
    #[inline]
    #[must_use]
    pub fn all(&self) -> &[Route] {
        &self.routes
    }

    /// Number of routes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if there are no routes.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Number of files that declare at least one route.
    #[must_use]
    pub fn file_count(&self) -> usize {
        self.by_file.len()
    }

    fn resolve(&self, indices: &[usize]) -> Vec<&Route> {
        indices.iter().filter_map(|&i| self.routes.get(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cv_core::HttpMethod;
    use cv_extract::routes::extract_routes;

    const WEB: &str = r"<?php

use App\Http\Controllers\PhotoController;
use App\Http\Controllers\UserController;

Route::get('/', function () {
    return view('welcome');
});

Route::resource('photos', PhotoController::class);
Route::get('/users/{user}', [UserController::class, 'show'])->name('users.show');
Route::get('/legacy', 'Admin\LegacyController@index')->name('legacy.index');
Route::post('/users', 'User@store');
";

    fn table() -> RouteTable {
        RouteTable::from_routes(extract_routes(WEB, Utf8Path::new("routes/web.php")))
    }

    #[test]
    fn test_candidate_key_order() {
        let keys = candidate_keys("UserController", "index");
        assert_eq!(keys[0], "UserController@index");
        assert_eq!(keys[1], "UserControllerController@index");
        assert_eq!(keys[2], "User@index");
        assert_eq!(keys.len(), 3);
    }

    #[test]
    fn test_resource_routes_resolve_for_each_action() {
        let table = table();
        let hits = table.routes_for_action("PhotoController", "show");
        assert_eq!(hits.len(), 1);
        assert!(hits[0].uri.ends_with("/{id?}"));
        assert_eq!(hits[0].methods.as_slice(), HttpMethod::RESOURCE_SET);
        assert_eq!(table.routes_for_action("Photo", "destroy").len(), 1);
    }

    #[test]
    fn test_lookup_tolerates_suffix_differences() {
        let table = table();
        assert_eq!(table.routes_for_action("User", "show").len(), 1);
        assert_eq!(table.routes_for_action("UserController", "store").len(), 1);
        assert_eq!(table.routes_for_action("LegacyController", "index").len(), 1);
        assert!(table.routes_for_action("UserController", "destroy").is_empty());
    }

    #[test]
    fn test_first_non_empty_candidate_wins() {
        let routes = [
            "Route::get('/a', [UserController::class, 'index']);",
            "Route::get('/b', [User::class, 'index']);",
        ]
        .join("\n");
        let table = RouteTable::from_routes(extract_routes(&routes, Utf8Path::new("routes/web.php")));

        assert_eq!(table.routes_for_action("User", "index").len(), 2);

        // Only `/a` is indexed under the first candidate; `/b` would match a later one.
        let hits = table.routes_for_action("UserControllerController", "index");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].uri, "/a");
    }

    #[test]
    fn test_names_and_prefixes() {
        let table = table();
        assert_eq!(table.by_name("users.show").map(|r| r.uri.as_str()), Some("/users/{user}"));
        assert_eq!(table.names_with_prefix("users."), vec!["users.show"]);
        assert_eq!(table.names_with_prefix(""), vec!["legacy.index", "users.show"]);
        assert_eq!(table.uri_with_prefix("/users").len(), 2);
        assert_eq!(table.len(), 5);
        assert!(table.all()[0].is_closure());
    }

    #[test]
    fn test_replacing_file_swaps_only_that_file() {
        let table = table();
        let api = extract_routes(
            "Route::get('/api/ping', [PingController::class, 'show']);",
            Utf8Path::new("routes/api.php"),
        );
        let table = table.replacing_file(Utf8Path::new("routes/api.php"), api);
        assert_eq!(table.len(), 6);
        assert_eq!(table.file_count(), 2);

        let table = table.replacing_file(Utf8Path::new("routes/web.php"), Vec::new());
        assert_eq!(table.len(), 1);
        assert_eq!(table.for_file(Utf8Path::new("routes/api.php")).len(), 1);
        assert!(table.for_file(Utf8Path::new("routes/web.php")).is_empty());
    }
}
