// Pipeline processing: cleaning, identity, linkage, validation and scoring

pub mod analytics;
pub mod conflation;
pub mod identity;
pub mod normalize;
pub mod quality_gate;
pub mod relational;
pub mod sustainability;
