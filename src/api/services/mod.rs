pub mod certificates;
pub mod entitlement;
pub mod progress;
