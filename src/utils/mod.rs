pub mod aggregation;
pub mod clock;
