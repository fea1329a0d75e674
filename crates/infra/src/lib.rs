//! Infrastructure layer: identity provider, sessions, user directory.

pub mod backend;
pub mod directory;
pub mod identity;
pub mod resolver;
pub mod session;

pub use backend::{Backend, global, init_global};
pub use resolver::{PrincipalResolver, ResolveError};
