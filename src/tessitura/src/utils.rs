mod csv;
pub use csv::*;
