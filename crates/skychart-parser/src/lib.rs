pub mod normalization;
pub mod position_parser;

pub use normalization::{canonical_planet, canonical_sign};
pub use position_parser::{LineMatch, PositionParser};
