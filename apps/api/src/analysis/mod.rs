//! Resume analysis tasks: profile extraction, criteria screening, skill
//! matching and the final recommendation, each backed by a deterministic
//! fallback.

pub mod criteria;
pub mod fallback;
pub mod lang;
pub mod profile;
pub mod recommend;
pub mod skills;
