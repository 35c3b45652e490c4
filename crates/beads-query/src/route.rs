//! Route table: maps an id-prefix to the filesystem path of a peer store.

use std::fs;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::RouterError;

/// One entry of `routes.jsonl`: `{prefix, path}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Route {
    pub prefix: String,
    pub path: PathBuf,
}

/// The set of routes known to a workspace, plus the root they were
/// resolved relative to.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: Vec<Route>,
    workspace_root: PathBuf,
}

impl RouteTable {
    /// Loads `routes.jsonl` from `workspace_root`. A missing file yields an
    /// empty table, matching the "no routes configured" steady state.
    pub fn load(workspace_root: impl AsRef<Path>) -> Result<Self, RouterError> {
        let workspace_root = workspace_root.as_ref().to_path_buf();
        let routes_path = workspace_root.join("routes.jsonl");

        let file = match fs::File::open(&routes_path) {
            Ok(f) => f,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Ok(Self {
                    routes: Vec::new(),
                    workspace_root,
                });
            }
            Err(e) => return Err(RouterError::Io(format!("{}: {e}", routes_path.display()))),
        };

        let mut routes = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line.map_err(|e| RouterError::Io(e.to_string()))?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<Route>(trimmed) {
                Ok(route) => routes.push(route),
                Err(e) => {
                    tracing::warn!(error = %e, line = %trimmed, "skipping malformed route entry");
                }
            }
        }

        Ok(Self {
            routes,
            workspace_root,
        })
    }

    /// Finds the route whose prefix matches the first hyphen-delimited token
    /// of `id_like`, if any.
    pub fn find_for_id(&self, id_like: &str) -> Option<&Route> {
        let token = id_like.split('-').next().unwrap_or(id_like);
        self.routes.iter().find(|r| r.prefix == token)
    }

    /// Resolves a route's path relative to the workspace root.
    pub fn resolve_path(&self, route: &Route) -> PathBuf {
        if route.path.is_absolute() {
            route.path.clone()
        } else {
            self.workspace_root.join(&route.path)
        }
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }
}
