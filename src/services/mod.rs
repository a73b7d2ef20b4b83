//! Domain services used by HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own validation and orchestration over the card store
//! and the image pipeline so route handlers can stay focused on protocol
//! translation.

pub mod card;
pub mod sticker;
