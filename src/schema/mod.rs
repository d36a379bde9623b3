//! Field descriptors and parameter groups
//!
//! A [`FieldDescriptor`] declares one named, typed, defaulted value together
//! with its description, optional choice set and [`Mutability`]. A
//! [`GroupSchema`] is an ordered table of descriptors; a [`ParameterGroup`]
//! is that table populated with values.
//!
//! # Example
//!
//! ```
//! use neox_args::schema::{FieldDescriptor, GroupSchema, ParameterGroup};
//! use serde_json::{json, Map};
//!
//! let schema = GroupSchema::new(
//!     "model",
//!     vec![
//!         FieldDescriptor::integer("num_layers").required().doc("Number of transformer layers."),
//!         FieldDescriptor::choice("norm", &["layernorm", "rmsnorm", "scalenorm"])
//!             .default("layernorm")
//!             .doc("Normalization layer to use."),
//!     ],
//! )?;
//!
//! let mut overrides = Map::new();
//! overrides.insert("num_layers".into(), json!(12));
//! let group = ParameterGroup::construct(schema, &overrides)?;
//! assert_eq!(group.get("norm"), Some(&json!("layernorm")));
//! # Ok::<(), neox_args::Error>(())
//! ```

mod field;
mod group;
mod value;

#[cfg(test)]
mod tests;

pub use field::{Bounds, FieldDescriptor, Mutability, Presence};
pub use group::{GroupSchema, ParameterGroup};
pub use value::{display_value, ElementType, ValueType};

pub(crate) use group::suggest;
