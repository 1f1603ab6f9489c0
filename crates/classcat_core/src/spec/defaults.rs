//! Built-in canonical catalog shipped with the crate.

use super::CanonicalSpec;
use once_cell::sync::Lazy;

static DEFAULT_CATALOG: Lazy<CanonicalSpec> = Lazy::new(|| {
    CanonicalSpec::from_json_str(include_str!("default_catalog.json"))
        .expect("embedded default catalog is valid")
});

/// Returns the built-in catalog, parsed once per process.
pub fn default_catalog() -> &'static CanonicalSpec {
    &DEFAULT_CATALOG
}
