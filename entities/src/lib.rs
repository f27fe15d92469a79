pub mod courses;
pub mod payments;
pub mod progress;
pub mod users;
