//! Subscription tests against an in-process fake middleware.
//!
//! | File | Covers |
//! |------|--------|
//! | `lifecycle` | creation, disposal, reclamation |
//! | `take` | message delivery and introspection |
//! | `node` | registry, executor wake-ups, shutdown |

pub mod lifecycle;
pub mod take;
