//! Vitalsynth - On-device synthesis and transformation engine for portable
//! biometric datasets
//!
//! Vitalsynth produces deterministic, seed-reproducible health data: full
//! multi-day bundles drawn from stress presets, pattern-based transformations
//! of existing bundles onto new date ranges, and a live heart-rate/HRV stream
//! shaped by circadian rhythm and scenario profiles.
//!
//! ## Modules
//!
//! - **Generation**: Synthesize bundles from stress presets under a
//!   manipulation policy ([`generate`])
//! - **Transformation**: Re-date and perturb existing bundles with statistical
//!   patterns ([`transform`])
//! - **Streaming**: Emit live vitals ticks with rate and session caps
//!   ([`stream`])
//! - **Exchange**: Bundle documents, store records, and length-prefixed
//!   packets ([`document`], [`store`], [`packet`])

pub mod circadian;
pub mod document;
pub mod error;
pub mod generate;
pub mod packet;
pub mod pattern;
pub mod presets;
pub mod remap;
pub mod rng;
pub mod scenario;
pub mod store;
pub mod stream;
pub mod transform;
pub mod types;

// FFI bindings for C interop (always available for cdylib/staticlib builds)
pub mod ffi;

pub use error::EngineError;
pub use generate::{generate, GenerationRequest, ManipulationPolicy};
pub use pattern::PatternKind;
pub use presets::{PresetRanges, StressPreset};
pub use transform::{transform, transpose_to_now};

// Document exports
pub use document::{decode, encode, DOCUMENT_VERSION};
pub use types::Bundle;

// Streaming exports
pub use scenario::StreamScenario;
pub use stream::{StreamEngine, StreamSnapshot, TickOutcome, VitalsPoint};

/// Vitalsynth version embedded in exchange surfaces
pub const VITALSYNTH_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name recorded in sample provenance
pub const PRODUCER_NAME: &str = "vitalsynth";
