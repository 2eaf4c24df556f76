pub mod lookup;

pub use lookup::{CountryLookup, Dns};
