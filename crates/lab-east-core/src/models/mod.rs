//! Domain models for the LAB-east records system.

mod ids;
mod patient;
mod stored;
mod test_result;
mod user;

pub use ids::*;
pub use patient::*;
pub use test_result::*;
pub use user::*;
