//! Contract Engine - deterministic contract assembly
//!
//! Turns a (jurisdiction, contract type, parameters, options) request into a
//! finished markdown contract:
//!
//! - **Variation selection**: explicit option, scaffold default, preference
//!   tags, then first-defined wording
//! - **Placeholder substitution**: one bracket convention per library,
//!   missing values flagged in the text and in the result
//! - **Compliance**: input and output phases, driven by the jurisdiction's
//!   rule profile
//! - **Exhibits and disclaimer**: triggered exhibits after the body, the
//!   disclaimer last and verbatim
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    DocumentAssembler                     │
//! │                                                          │
//! │  ┌──────────┐  ┌───────────┐  ┌──────────┐  ┌────────┐  │
//! │  │ Selector │──│ Tokenizer │──│ Renderer │──│ Polish │  │
//! │  └──────────┘  └───────────┘  └──────────┘  └────────┘  │
//! │        ▲                           │                     │
//! │  ┌─────┴──────┐            ┌───────▼───────┐             │
//! │  │ PackLoader │            │  Compliance   │             │
//! │  └────────────┘            └───────────────┘             │
//! └──────────────────────────────────────────────────────────┘
//! ```

pub mod assembler;
pub mod compliance;
pub mod config;
pub mod exhibits;
pub mod render;
pub mod selection;
pub mod substitution;
pub mod types;

// Re-export main types
pub use assembler::DocumentAssembler;
pub use compliance::{ComplianceRule, ComplianceValidator, Phase, Violation};
pub use config::EngineConfig;
pub use selection::{select_variation, VariationResolver, VariationSelector};
pub use substitution::{substitute, Tokenizer};
pub use types::*;
