// Data models for hand tracking, classification, and the output transcript

pub mod hand;
pub mod prediction;
pub mod transcript;
