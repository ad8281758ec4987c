//! Pipeline stages for document extraction and enrichment.
//!
//! Each submodule implements exactly one transformation step.
//! Keeping stages separate makes each independently testable and lets us
//! swap a capability backend without touching the other stages.
//!
//! ## Data Flow
//!
//! ```text
//! input ──▶ classify ──▶ strategy ──▶ extract ──▶ enrich ──▶ normalize
//! (bytes)   (kind)       (cascade)    (text)      (model)    (result)
//! ```
//!
//! 1. [`input`]: turn a URL, data URI or buffer into bytes
//! 2. [`classify`]: declared type, extension, then magic bytes
//! 3. [`strategy`]: kind → ordered extraction cascade
//! 4. [`extract`]: run the cascade, first non-empty text wins; [`html`]
//!    handles markup locally
//! 5. [`enrich`]: one model call for summary and tags, parsed by
//!    [`response`]'s layered parser
//! 6. [`normalize`]: fold everything into a `PipelineResult`
//!
//! [`render`] and [`encode`] serve the vision backend: rasterise PDF pages
//! and wrap images for a multimodal request.

pub mod classify;
pub mod encode;
pub mod enrich;
pub mod extract;
pub mod html;
pub mod input;
pub mod normalize;
pub mod render;
pub mod response;
pub mod strategy;
