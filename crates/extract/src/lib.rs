//! Field extraction from raw events.
//!
//! `extract` is the first stage of the pipeline: it turns a raw
//! accessibility snapshot or notification into a `FieldSet` of candidate
//! strings by applying the compiled rule table. It is a total, pure
//! function: unrecognized input produces an empty set, never an error.

mod extractor;
mod fieldset;

pub use extractor::Extractor;
pub use fieldset::FieldSet;
