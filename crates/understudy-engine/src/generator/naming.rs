//! Type name allocation for generated doubles

use once_cell::sync::Lazy;
use rand::Rng;
use regex::Regex;
use understudy_types::{TypeRegistry, NAMESPACE_SEPARATOR};

use crate::error::DoubleError;

static IDENTIFIER: Lazy<Option<Regex>> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").ok());

/// Whether `name` is a single identifier segment
pub fn is_valid_identifier(name: &str) -> bool {
    IDENTIFIER.as_ref().is_some_and(|re| re.is_match(name))
}

/// Whether `name` is a (possibly namespaced) type name
pub fn is_valid_type_name(name: &str) -> bool {
    name.split(NAMESPACE_SEPARATOR).all(is_valid_identifier)
}

/// Eight lowercase hex digits
fn random_suffix() -> String {
    format!("{:08x}", rand::thread_rng().gen::<u32>())
}

/// Pick the name of a new double type
///
/// A caller-supplied name is used as is when it is valid and free.
/// Otherwise names of the form `<prefix><simple_name>_<8 hex>` are drawn
/// until one is neither active nor loadable.
pub fn allocate(
    registry: &TypeRegistry,
    prefix: &str,
    simple_name: &str,
    requested: Option<&str>,
) -> Result<String, DoubleError> {
    if let Some(name) = requested {
        if !is_valid_type_name(name) {
            return Err(DoubleError::structural(
                name,
                "requested class name is not a valid type name",
            ));
        }
        if registry.is_taken(name) {
            return Err(DoubleError::NameConflict {
                name: name.to_string(),
            });
        }
        return Ok(name.to_string());
    }

    Ok(draw(registry, &format!("{}{}", prefix, simple_name)))
}

/// Name of the synthetic interface combining `simple_names` (already sorted)
pub fn intersection_name(registry: &TypeRegistry, prefix: &str, simple_names: &[&str]) -> String {
    draw(registry, &format!("{}{}", prefix, simple_names.join("_")))
}

fn draw(registry: &TypeRegistry, stem: &str) -> String {
    loop {
        let candidate = format!("{}_{}", stem, random_suffix());
        if !registry.is_taken(&candidate) {
            return candidate;
        }
    }
}
