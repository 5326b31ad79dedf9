mod brand;
mod product;
mod validate;

pub use brand::*;
pub use product::*;
pub use validate::parse_iso_date;
