pub mod charges;
pub mod generate;
pub mod grid;
