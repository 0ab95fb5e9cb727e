pub mod lifting;
pub mod reachability;

pub use lifting::LiftingEngine;
pub use reachability::ReachabilityRules;
