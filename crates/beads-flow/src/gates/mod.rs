pub mod block_with_context;
pub mod claim_next;
pub mod close_safe;
pub mod create_discovered;
pub mod intake;
pub mod land;
pub mod resume;

pub use block_with_context::{block_with_context, BlockArgs};
pub use claim_next::claim_next;
pub use close_safe::{close_safe, CloseSafeArgs};
pub use create_discovered::{create_discovered, CreateDiscoveredArgs};
pub use intake::{intake_audit, intake_map_sync, IntakeMap, MapSyncArgs};
pub use land::{land, LandArgs};
pub use resume::{resume, FreshnessCounters};
