pub mod generate;
pub mod partition;
pub mod scan;
