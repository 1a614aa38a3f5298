//! Purpose: Define the stable public Rust API boundary for stubwire.
//! Exports: Definition parsing, settings binding, and header codec types.
//! Role: Public, additive-only surface; hides internal parsing modules.
//! Invariants: This module is the only public path to parsing primitives.
//! Invariants: Internal modules remain private and are not directly exposed.

pub use crate::core::bind::{SettingsTarget, Slot, bind};
pub use crate::core::error::{Error, ErrorKind};
pub use crate::core::headers::{HeaderField, HeaderFields};
pub use crate::core::pipeline::{BODY_MARKER, Flow, ParseContext, parse, parse_str, run_line};
pub use crate::core::settings::StubSettings;
