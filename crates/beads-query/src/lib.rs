//! Cross-repository id resolution and external-dependency routing.

mod error;
mod route;
mod router;

pub use error::RouterError;
pub use route::{Route, RouteTable};
pub use router::{RoutedIssue, Router, ResolvedExternalDep, EXTERNAL_PREFIX};
