//! Captcha challenge handling
//!
//! The portal gates its session/token protocol behind an arithmetic image
//! captcha. This module fetches challenge images, hands them to an injected
//! text-recognition capability, and evaluates the recognized expression,
//! retrying with fresh challenges up to a fixed ceiling.

mod ocr;
mod solver;

pub use ocr::{CommandRecognizer, TextRecognizer};
pub use solver::{eval_expression, CaptchaSolver};
