pub use crate::error::{Error, MgResult};
pub use crate::types::{RequestCtx, UserId};

pub use tracing::{debug, debug_span, error, error_span, info, info_span, warn, warn_span};

// vim: ts=4
