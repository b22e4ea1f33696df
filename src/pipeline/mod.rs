//! Pipeline stages for document field extraction.
//!
//! Each submodule implements exactly one transformation step. Keeping stages
//! separate makes each independently testable and lets us swap an
//! implementation (e.g. a different OCR engine) without touching the others.
//!
//! ## Data Flow
//!
//! ```text
//! text ──▶ fields ──▶ normalize
//! (OCR/PDF) (LLM)     (defaulting)
//! ```
//!
//! 1. [`text`]      turns raw document bytes into plain text; OCR runs in
//!    `spawn_blocking` because tesseract is a blocking subprocess
//! 2. [`fields`]    turns plain text into a loosely structured field mapping via
//!    one LLM call with defensive response recovery; the only stage with
//!    network I/O
//! 3. [`normalize`] folds the partial mapping into the canonical record with every
//!    field populated; pure, total, no I/O
//!
//! Stages run strictly in order within one request; stage N consumes stage
//! N−1's output, so nothing is pipelined or speculative.

pub mod fields;
pub mod normalize;
pub mod text;
