// Escape/lifting engine
//
// Hexagonal Architecture:
// - application: Lifting protocol (register promotion, heap flush, reset),
//   auxiliary ReachLH/CFilter reachability rules

pub mod application;

pub use application::{LiftingEngine, ReachabilityRules};
