//! Windows PE architecture detection library.
//!
//! This library tells native x86/x64/ARM/ARM64 binaries apart from .NET
//! assemblies and their AnyCPU variants, resolving bare names through the
//! search path and following package-manager shims one hop.

pub mod error;
pub mod fs;
pub mod inspector;
pub mod pe;
pub mod resolver;
pub mod shim;

pub use error::{Error, Result};
pub use inspector::{inspect, Report};
pub use pe::Architecture;
