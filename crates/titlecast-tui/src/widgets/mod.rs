//! Small reusable rendering helpers.

pub mod platform_badge;
