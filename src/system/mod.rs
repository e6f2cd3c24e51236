//! # System Interaction Layer
//!
//! The boundary between the engine and the operating system.
//!
//! ## Modules
//!
//! - **`executor`**: spawns the wrapped tool from a `TranslatedCommand`, either
//!   streaming to the terminal or capturing its output, and reports the exit code
//!   exactly as the tool returned it.

pub mod executor;
