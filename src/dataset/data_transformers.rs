//! Conversions from the per-PDF word annotation files to the formats the
//! detector and the OCR tooling consume.

pub mod invoice_annotations;
pub mod ocr_json;
