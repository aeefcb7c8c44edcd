pub mod lifecycle;
pub mod stats;
pub mod taxonomy;
pub mod validation;

pub use lifecycle::{apply_transition, Closure};
pub use taxonomy::{contains_path, resolve_children, TaxonomyChildren};
pub use validation::{check_taxonomy, validate_form};
