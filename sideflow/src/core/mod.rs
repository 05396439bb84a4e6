//! Core domain model types for sideflow.
//!
//! This module contains the fundamental types used throughout the engine:
//! - Side identities and side selection filters
//! - Task phases and derived task states
//! - Diagnostic entries with their severity

mod diagnostic;
mod side;
mod status;

pub use diagnostic::{Diagnostic, Severity};
pub use side::{SideFilter, SideId};
pub use status::{TaskPhase, TaskState};
