//! Core SMTP types.

mod mechanism;
mod reply;

pub use mechanism::{AuthSelection, MECHANISMS, Mechanism, MechanismSet};
pub use reply::{Reply, ReplyCode};
