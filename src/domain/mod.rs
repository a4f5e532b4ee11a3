pub mod ball;
pub mod ledger;
pub mod physics;
pub mod platform;
pub mod scheduler;
