//! Product directory.
//!
//! Holds product identity, quantities and warehouse address. Every engine in the
//! workspace reads and writes stock through the `ProductDirectory` trait.

pub mod directory;
pub mod product;

pub use directory::{ProductCatalog, ProductDirectory};
pub use product::{AbcCurve, NewProduct, Product, ProductPatch};
