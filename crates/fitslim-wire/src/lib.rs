// crates/fitslim-wire/src/lib.rs
// ============================================================================
// Module: FitSlim Wire Library
// Description: Slim message framing and list encoding.
// Purpose: Carry instruction and result trees across a byte stream.
// Dependencies: fitslim-core, thiserror, tokio
// ============================================================================

//! ## Overview
//! Two layers make up the Slim wire format. [`framing`] moves whole messages
//! over blocking or async streams, and [`codec`] turns a message payload into
//! a [`fitslim_core::Tree`] and back. Both layers report failures as
//! [`CodecError`], which converts into a malformed-instruction
//! [`fitslim_core::SlimError`].

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod codec;
pub mod error;
pub mod framing;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use codec::decode;
pub use codec::encode;
pub use error::CodecError;
pub use framing::BYE;
pub use framing::DEFAULT_PROTOCOL_VERSION;
pub use framing::greeting;
pub use framing::read_frame;
pub use framing::read_frame_async;
pub use framing::write_frame;
pub use framing::write_frame_async;
