// Presentation layer - Output of published snapshots
pub mod sink;
