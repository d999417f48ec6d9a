pub use mailgate_types::prelude::*;

// vim: ts=4
