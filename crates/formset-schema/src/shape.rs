//! Error shape derivation.
//!
//! The shape marks which schema positions are branch nodes (objects, or
//! arrays of objects) so [`formset_core::map_errors`] can tell whether an
//! issue belongs in a node's `_errors` list or in a leaf's message list.

use formset_core::{ErrorShape, Path, Segment};

use crate::error::SchemaError;
use crate::node::{Schema, TypeTag};
use crate::resolve::{resolve_node, schema_info, SchemaInfo};

/// Derive the error shape of a schema.
///
/// Array item schemas and union branches are folded into one shape, later
/// branches overriding earlier keys; a node's own properties are folded in
/// last. Arrays of scalars and scalar unions collapse to an empty shape, so
/// index-keyed issues under them are leaves.
pub fn error_shape(schema: &Schema) -> Result<ErrorShape, SchemaError> {
    let path = Path::root();
    let info = schema_info(schema, false, &path)?;
    Ok(shape_of(&info, &path)?.unwrap_or_default())
}

fn shape_of(info: &SchemaInfo, path: &Path) -> Result<Option<ErrorShape>, SchemaError> {
    let mut output: Option<ErrorShape> = None;
    let folded = info.array.is_some() || info.union.is_some();

    if folded {
        let items = info.array.as_deref().unwrap_or_default();
        let branches = info.union.as_deref().unwrap_or_default();
        if !items.is_empty() {
            output = Some(ErrorShape::new());
        }
        for node in items.iter().chain(branches) {
            if let Some(next) = shape_of(&resolve_node(node, false), path)? {
                let shape = output.get_or_insert_with(ErrorShape::new);
                for (key, child) in next.children() {
                    shape.insert(key, child.clone());
                }
            }
        }
    }

    if let Some(properties) = &info.properties {
        let mut shape = output.take().unwrap_or_default();
        for (key, property) in properties {
            let child = path.child(Segment::key(key.as_str()));
            let property = schema_info(property, false, &child)?;
            if let Some(nested) = shape_of(&property, &child)? {
                shape.insert(key.as_str(), nested);
            }
        }
        return Ok(Some(shape));
    }

    if folded {
        return Ok(output);
    }
    Ok((info.has_type(&TypeTag::Array) || info.has_type(&TypeTag::Object)).then(ErrorShape::new))
}
