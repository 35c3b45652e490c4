//! Translates an incoming id (possibly a local prefix, or one whose first
//! token names a routed peer) into a concrete (store, resolved id) pair, and
//! resolves `external:<peer>:<id>` dependency placeholders for display.

use std::path::Path;

use beads_core::filter::IssueFilter;
use beads_core::issue::{Issue, IssueBuilder};
use beads_storage::{SqliteStore, Storage};

use crate::error::RouterError;
use crate::route::RouteTable;

/// Prefix marking a dependency's `depends_on_id` as an external reference
/// rather than a local issue id.
pub const EXTERNAL_PREFIX: &str = "external:";

/// Result of `resolve_and_get_issue_with_routing`: the store that owns the
/// resolved issue (possibly a peer, opened on demand), the resolved id, and
/// whether routing to a peer occurred. Callers that receive `routed = true`
/// own the peer `SqliteStore` and should drop it (closing the connection)
/// once finished.
pub struct RoutedIssue {
    pub store: Option<SqliteStore>,
    pub resolved_id: String,
    pub issue: Issue,
    pub routed: bool,
}

impl RoutedIssue {
    /// Releases the peer store, if one was opened. A no-op for local
    /// resolutions.
    pub fn close(self) {
        drop(self.store);
    }
}

/// An external dependency, resolved or left as an "unresolved" placeholder.
pub struct ResolvedExternalDep {
    pub depends_on_id: String,
    pub issue: Issue,
}

pub struct Router {
    routes: RouteTable,
}

impl Router {
    pub fn new(routes: RouteTable) -> Self {
        Self { routes }
    }

    pub fn load(workspace_root: impl AsRef<Path>) -> Result<Self, RouterError> {
        Ok(Self::new(RouteTable::load(workspace_root)?))
    }

    /// Matches `id_like` unambiguously against the local store.
    ///
    /// An exact id match always wins even when longer ids share the same
    /// prefix. Otherwise, more than one candidate is an ambiguous-prefix
    /// error; zero candidates is not-found.
    pub fn resolve_partial_id(
        &self,
        store: &dyn Storage,
        id_like: &str,
    ) -> Result<String, RouterError> {
        if id_like.is_empty() {
            return Err(RouterError::InvalidInput);
        }

        let filter = IssueFilter {
            id_prefix: Some(id_like.to_string()),
            ..Default::default()
        };
        let mut candidates = store.search_issues("", &filter)?;
        candidates.sort_by(|a, b| a.id.cmp(&b.id));

        if let Some(exact) = candidates.iter().find(|i| i.id == id_like) {
            return Ok(exact.id.clone());
        }

        match candidates.len() {
            0 => Err(RouterError::NotFound(id_like.to_string())),
            1 => Ok(candidates.remove(0).id),
            _ => Err(RouterError::Ambiguous {
                prefix: id_like.to_string(),
                candidates: candidates.into_iter().map(|i| i.id).collect(),
            }),
        }
    }

    /// Resolves `id_like` locally first; if not found, consults the route
    /// table for a peer whose prefix matches the id's first hyphen-delimited
    /// token and opens that peer's store on demand.
    pub fn resolve_and_get_issue_with_routing(
        &self,
        store: &dyn Storage,
        id_like: &str,
    ) -> Result<RoutedIssue, RouterError> {
        match self.resolve_partial_id(store, id_like) {
            Ok(resolved_id) => {
                let issue = store.get_issue(&resolved_id)?;
                Ok(RoutedIssue {
                    store: None,
                    resolved_id,
                    issue,
                    routed: false,
                })
            }
            Err(RouterError::NotFound(_)) => {
                let route = self
                    .routes
                    .find_for_id(id_like)
                    .ok_or_else(|| RouterError::NotFound(id_like.to_string()))?;
                let peer_path = self.routes.resolve_path(route);
                let peer_store = SqliteStore::open(&peer_path).map_err(RouterError::Storage)?;

                let resolved_id = self.resolve_partial_id(&peer_store, id_like)?;
                let issue = peer_store.get_issue(&resolved_id)?;
                Ok(RoutedIssue {
                    store: Some(peer_store),
                    resolved_id,
                    issue,
                    routed: true,
                })
            }
            Err(e) => Err(e),
        }
    }

    /// Resolves an issue's `external:<peer>:<id>` dependency placeholders
    /// into display records. Returns an empty vec (not an error) when the
    /// issue has no external refs, and when a route is missing or the peer
    /// lookup fails, returns an "unresolved" placeholder rather than
    /// dropping the dependency.
    pub fn resolve_external_deps_via_routing(
        &self,
        store: &dyn Storage,
        issue_id: &str,
    ) -> Result<Vec<ResolvedExternalDep>, RouterError> {
        let records = store.get_dependency_records(issue_id)?;
        let external: Vec<&str> = records
            .iter()
            .map(|d| d.depends_on_id.as_str())
            .filter(|id| id.starts_with(EXTERNAL_PREFIX))
            .collect();

        if external.is_empty() {
            return Ok(Vec::new());
        }

        let mut resolved = Vec::with_capacity(external.len());
        for depends_on_id in external {
            resolved.push(self.resolve_one_external(depends_on_id));
        }
        Ok(resolved)
    }

    fn resolve_one_external(&self, depends_on_id: &str) -> ResolvedExternalDep {
        let placeholder = || ResolvedExternalDep {
            depends_on_id: depends_on_id.to_string(),
            issue: IssueBuilder::new(format!("{depends_on_id} (unresolved)"))
                .id(depends_on_id)
                .build(),
        };

        let Some(rest) = depends_on_id.strip_prefix(EXTERNAL_PREFIX) else {
            return placeholder();
        };
        let Some((peer, local_id)) = rest.split_once(':') else {
            return placeholder();
        };

        let Some(route) = self.routes.find_for_id(peer) else {
            return placeholder();
        };
        let peer_path = self.routes.resolve_path(route);

        let resolved = SqliteStore::open(&peer_path)
            .ok()
            .and_then(|peer_store| peer_store.get_issue(local_id).ok());

        match resolved {
            Some(issue) => ResolvedExternalDep {
                depends_on_id: depends_on_id.to_string(),
                issue,
            },
            None => placeholder(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use beads_core::issue::IssueBuilder;
    use std::io::Write;

    fn store_with(ids: &[&str]) -> SqliteStore {
        let store = SqliteStore::open_in_memory().unwrap();
        for id in ids {
            let issue = IssueBuilder::new(format!("Issue {id}")).id(*id).build();
            store.create_issue(&issue, "alice").unwrap();
        }
        store
    }

    #[test]
    fn resolves_exact_id_even_with_longer_prefix_siblings() {
        let store = store_with(&["bd-abc", "bd-abc1"]);
        let router = Router::new(RouteTable::default());
        let resolved = router.resolve_partial_id(&store, "bd-abc").unwrap();
        assert_eq!(resolved, "bd-abc");
    }

    #[test]
    fn resolves_unambiguous_prefix() {
        let store = store_with(&["bd-abcdef"]);
        let router = Router::new(RouteTable::default());
        let resolved = router.resolve_partial_id(&store, "bd-abc").unwrap();
        assert_eq!(resolved, "bd-abcdef");
    }

    #[test]
    fn ambiguous_prefix_returns_candidates() {
        let store = store_with(&["bd-abc111", "bd-abc222"]);
        let router = Router::new(RouteTable::default());
        let err = router.resolve_partial_id(&store, "bd-abc").unwrap_err();
        match err {
            RouterError::Ambiguous { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("expected Ambiguous, got {other:?}"),
        }
    }

    #[test]
    fn empty_id_is_invalid_input() {
        let store = store_with(&[]);
        let router = Router::new(RouteTable::default());
        assert!(matches!(
            router.resolve_partial_id(&store, ""),
            Err(RouterError::InvalidInput)
        ));
    }

    #[test]
    fn not_found_message_contains_stable_substring() {
        let store = store_with(&[]);
        let router = Router::new(RouteTable::default());
        let err = router.resolve_partial_id(&store, "bd-nope").unwrap_err();
        assert!(err.to_string().contains("no issue found matching"));
    }

    #[test]
    fn no_external_deps_returns_empty_vec() {
        let store = store_with(&["bd-local1"]);
        let router = Router::new(RouteTable::default());
        let deps = router
            .resolve_external_deps_via_routing(&store, "bd-local1")
            .unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn unresolvable_external_dep_yields_placeholder() {
        use beads_core::dependency::Dependency;
        use beads_core::enums::DependencyType;

        let store = store_with(&["hq-local1"]);
        store
            .add_dependency(
                &Dependency {
                    issue_id: "hq-local1".into(),
                    depends_on_id: "external:rig:gt-x".into(),
                    dep_type: DependencyType::Blocks,
                    created_at: chrono::Utc::now(),
                    created_by: "alice".into(),
                    metadata: String::new(),
                },
                "alice",
            )
            .unwrap();

        let router = Router::new(RouteTable::default());
        let deps = router
            .resolve_external_deps_via_routing(&store, "hq-local1")
            .unwrap();
        assert_eq!(deps.len(), 1);
        assert!(deps[0].issue.title.contains("unresolved"));
    }

    #[test]
    fn resolves_external_dep_through_route() {
        use beads_core::dependency::Dependency;
        use beads_core::enums::DependencyType;

        let dir = tempfile::tempdir().unwrap();
        let peer_path = dir.path().join("peer.db");
        let peer_store = SqliteStore::open(&peer_path).unwrap();
        let remote_issue = IssueBuilder::new("Remote issue").id("gt-x").build();
        peer_store.create_issue(&remote_issue, "bob").unwrap();
        drop(peer_store);

        let routes_path = dir.path().join("routes.jsonl");
        let mut f = std::fs::File::create(&routes_path).unwrap();
        writeln!(f, r#"{{"prefix":"rig","path":"peer.db"}}"#).unwrap();
        drop(f);

        let store = store_with(&["hq-local1"]);
        store
            .add_dependency(
                &Dependency {
                    issue_id: "hq-local1".into(),
                    depends_on_id: "external:rig:gt-x".into(),
                    dep_type: DependencyType::Blocks,
                    created_at: chrono::Utc::now(),
                    created_by: "alice".into(),
                    metadata: String::new(),
                },
                "alice",
            )
            .unwrap();

        let router = Router::load(dir.path()).unwrap();
        let deps = router
            .resolve_external_deps_via_routing(&store, "hq-local1")
            .unwrap();
        assert_eq!(deps.len(), 1);
        assert_eq!(deps[0].issue.title, "Remote issue");
    }
}
