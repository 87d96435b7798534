// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Resolved, immutable per-type serialization metadata.

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use super::meta::{ArrayKind, FieldSpec, MetaKind, StructMeta, TypeMeta};
use super::registry::TypeRegistry;
use super::value::FieldKind;
use super::{DescriptorError, DescriptorResult};

/// The read/write strategy chosen for a type, exactly one per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Element-wise encode with a length prefix.
    Array(ArrayKind),
    /// Length-prefixed UTF-8 text.
    Text,
    /// A value denoting a registered type, encoded as its name.
    TypeValue,
    /// Enumerated value, encoded as its symbolic variant name.
    EnumValue,
    /// Compiled fast path supplied by the type; tried before structural.
    Fast,
    /// Externally defined write/read pair.
    Custom,
    /// Default per-category field walk.
    Structural,
    /// Writing or reading this type must fail.
    NotSerializable,
}

/// Cached descriptor of one record type.
///
/// Created on first encounter, never mutated, never dropped; the field
/// ordering is a pure function of the declared fields and is identical on
/// writer and reader.
pub struct TypeDescriptor {
    pub name: &'static str,
    pub type_id: TypeId,
    pub meta: &'static TypeMeta,
    pub strategy: Strategy,
    /// This level's fields in wire order: category-partitioned, then
    /// alphabetical within each category (unless declared verbatim).
    pub fields: Vec<&'static FieldSpec>,
    /// Field count per category bucket.
    pub counts: [usize; FieldKind::COUNT],
    /// 1 when the base type is absent or not serializable, else
    /// `parent.level + 1`.
    pub level: u32,
    pub parent: Option<Arc<TypeDescriptor>>,
}

impl TypeDescriptor {
    /// Declared struct metadata, when this type is a struct.
    pub fn struct_meta(&self) -> Option<&'static StructMeta> {
        match &self.meta.kind {
            MetaKind::Struct(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn build(
        meta: &'static TypeMeta,
        registry: &TypeRegistry,
        visiting: &mut Vec<TypeId>,
    ) -> DescriptorResult<TypeDescriptor> {
        let type_id = meta.id();
        let mut descriptor = TypeDescriptor {
            name: meta.name,
            type_id,
            meta,
            strategy: Strategy::NotSerializable,
            fields: Vec::new(),
            counts: [0; FieldKind::COUNT],
            level: 1,
            parent: None,
        };

        match &meta.kind {
            MetaKind::Array(kind) => descriptor.strategy = Strategy::Array(*kind),
            MetaKind::Text => descriptor.strategy = Strategy::Text,
            MetaKind::TypeValue => descriptor.strategy = Strategy::TypeValue,
            MetaKind::Enum(_) => descriptor.strategy = Strategy::EnumValue,
            MetaKind::Opaque => descriptor.strategy = Strategy::NotSerializable,
            MetaKind::Struct(s) => {
                descriptor.fields = Self::ordered_fields(meta, s)?;
                for field in &descriptor.fields {
                    descriptor.counts[field.kind.rank()] += 1;
                }

                if let Some(base) = &s.base {
                    let parent = registry.describe_inner((base.meta)(), visiting)?;
                    if parent.strategy != Strategy::NotSerializable {
                        descriptor.level = parent.level + 1;
                        descriptor.parent = Some(parent);
                    }
                }

                descriptor.strategy = if s.fast.is_some() {
                    Strategy::Fast
                } else if s.custom.is_some() {
                    Strategy::Custom
                } else if s.instantiate.is_some() {
                    Strategy::Structural
                } else {
                    Strategy::NotSerializable
                };
            }
        }

        Ok(descriptor)
    }

    /// Apply the declared override verbatim, or filter transients, sort
    /// alphabetically and stably re-partition into the nine-category order.
    fn ordered_fields(
        meta: &'static TypeMeta,
        s: &'static StructMeta,
    ) -> DescriptorResult<Vec<&'static FieldSpec>> {
        let mut seen = HashSet::new();
        for field in s.fields {
            if !seen.insert(field.name) {
                return Err(DescriptorError::Introspection {
                    name: meta.name.to_string(),
                    reason: format!("duplicate field name {}", field.name),
                });
            }
        }

        if s.explicit_order {
            return Ok(s.fields.iter().collect());
        }

        let mut fields: Vec<&'static FieldSpec> =
            s.fields.iter().filter(|f| !f.transient).collect();
        fields.sort_by(|a, b| a.name.cmp(b.name));
        // Stable: alphabetical order survives within each bucket.
        fields.sort_by_key(|f| f.kind.rank());
        Ok(fields)
    }
}

/// Descriptor chain from the level-1 root down to `desc` itself.
pub(crate) fn level_chain(desc: &Arc<TypeDescriptor>) -> Vec<Arc<TypeDescriptor>> {
    let mut chain = Vec::with_capacity(desc.level as usize);
    let mut cursor = Some(Arc::clone(desc));
    while let Some(d) = cursor {
        cursor = d.parent.clone();
        chain.push(d);
    }
    chain.reverse();
    chain
}

/// Descriptor at `level` within the chain of `concrete`.
pub(crate) fn level_descriptor(
    concrete: &Arc<TypeDescriptor>,
    level: u32,
) -> Option<Arc<TypeDescriptor>> {
    let mut d = Arc::clone(concrete);
    while d.level > level {
        let parent = d.parent.clone()?;
        d = parent;
    }
    (d.level == level).then_some(d)
}

/// Narrow a view of a concrete object to its embedded base at `level`.
pub(crate) fn project_view<'a>(
    mut view: &'a dyn super::meta::Portable,
    concrete: &Arc<TypeDescriptor>,
    level: u32,
) -> Option<&'a dyn super::meta::Portable> {
    let mut d = concrete;
    while d.level > level {
        let base = d.struct_meta()?.base.as_ref()?;
        view = (base.project)(view);
        d = d.parent.as_ref()?;
    }
    (d.level == level).then_some(view)
}

/// Mutable counterpart of [`project_view`].
pub(crate) fn project_view_mut<'a>(
    mut view: &'a mut dyn super::meta::Portable,
    concrete: &Arc<TypeDescriptor>,
    level: u32,
) -> Option<&'a mut dyn super::meta::Portable> {
    let mut d = concrete;
    while d.level > level {
        let base = d.struct_meta()?.base.as_ref()?;
        view = (base.project_mut)(view);
        d = d.parent.as_ref()?;
    }
    (d.level == level).then_some(view)
}

// Manual Debug: `meta` holds fn pointers that do not derive usefully.
impl fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("strategy", &self.strategy)
            .field("level", &self.level)
            .field("fields", &self.fields.len())
            .finish()
    }
}
