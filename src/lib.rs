// Library exports for famsort
pub mod aligner;
pub mod assemble;
pub mod classify;
pub mod confirm;
pub mod error;
pub mod family_index;
pub mod hits;
pub mod pipeline;
pub mod seqio;
