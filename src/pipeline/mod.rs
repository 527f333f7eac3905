//! Pipeline stages.
//!
//! The paragraph engine is four pure stages over borrowed lines; ingestion
//! and annotation are the async glue on either side of it.
//!
//! ## Data Flow
//!
//! ```text
//! ingest ──▶ normalize ──▶ noise ──▶ registry ──▶ assemble ──▶ annotate
//! (path/URL)  (cleanup)   (filter)  (numbers)   (paragraphs)  (LLM, optional)
//!                  └──────── classify (every line-level decision) ───┘
//! ```
//!
//! 1. [`ingest`]: read a file, URL or upload; PDF text via pdfium
//! 2. [`normalize`]: line endings and invisible characters; final paragraph form
//! 3. [`classify`]: the closed [`classify::LineKind`] of a line
//! 4. [`noise`]: drop footnote blocks and page furniture
//! 5. [`registry`]: which numbers are paragraph starts
//! 6. [`assemble`]: rebuild one paragraph
//! 7. [`annotate`]: keyword annotation with retry/backoff; the only stage
//!    that calls an LLM

pub mod annotate;
pub mod assemble;
pub mod classify;
pub mod ingest;
pub mod noise;
pub mod normalize;
pub mod registry;
