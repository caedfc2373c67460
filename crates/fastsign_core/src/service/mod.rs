//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store calls into sign-in level APIs.
//! - Keep CLI and other front ends decoupled from storage details.

pub mod sign_in;
