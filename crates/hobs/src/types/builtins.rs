// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Builtin wrapper types.
//!
//! The eight primitive array kinds are pre-seeded into every stream's type
//! dictionary at indices 1 through 8 and never carry a wire name. `Text`,
//! `TypeValue` and `RefArray` are registered like user types and get
//! dictionary entries on first use.

use std::any::Any;

use super::meta::{type_id_of, ArrayKind, MetaKind, ObjRef, Portable, TypeMeta};

/// Generate one primitive-array wrapper plus its static metadata.
macro_rules! impl_prim_array {
    ($ty:ident, $meta:ident, $elem:ty, $kind:ident, $name:expr) => {
        pub struct $ty(pub Vec<$elem>);

        static $meta: TypeMeta = TypeMeta {
            name: $name,
            type_id: type_id_of::<$ty>,
            kind: MetaKind::Array(ArrayKind::$kind),
        };

        impl Portable for $ty {
            fn meta(&self) -> &'static TypeMeta {
                &$meta
            }
            fn as_any(&self) -> &dyn Any {
                self
            }
            fn as_any_mut(&mut self) -> &mut dyn Any {
                self
            }
        }
    };
}

impl_prim_array!(BoolArray, BOOL_ARRAY_META, bool, Bool, "hobs::BoolArray");
impl_prim_array!(I8Array, I8_ARRAY_META, i8, I8, "hobs::I8Array");
impl_prim_array!(I16Array, I16_ARRAY_META, i16, I16, "hobs::I16Array");
impl_prim_array!(CharArray, CHAR_ARRAY_META, u16, Char, "hobs::CharArray");
impl_prim_array!(I32Array, I32_ARRAY_META, i32, I32, "hobs::I32Array");
impl_prim_array!(I64Array, I64_ARRAY_META, i64, I64, "hobs::I64Array");
impl_prim_array!(F32Array, F32_ARRAY_META, f32, F32, "hobs::F32Array");
impl_prim_array!(F64Array, F64_ARRAY_META, f64, F64, "hobs::F64Array");

/// String payload, length-prefixed UTF-8 on the wire.
pub struct Text(pub String);

static TEXT_META: TypeMeta = TypeMeta {
    name: "hobs::Text",
    type_id: type_id_of::<Text>,
    kind: MetaKind::Text,
};

impl Portable for Text {
    fn meta(&self) -> &'static TypeMeta {
        &TEXT_META
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// A value denoting a registered type; travels as the type's wire name and
/// is validated against the registry on read.
pub struct TypeValue(pub String);

static TYPE_VALUE_META: TypeMeta = TypeMeta {
    name: "hobs::TypeValue",
    type_id: type_id_of::<TypeValue>,
    kind: MetaKind::TypeValue,
};

impl Portable for TypeValue {
    fn meta(&self) -> &'static TypeMeta {
        &TYPE_VALUE_META
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Array of references, element-wise encoded; elements share handles with
/// the rest of the graph.
pub struct RefArray(pub Vec<Option<ObjRef>>);

static REF_ARRAY_META: TypeMeta = TypeMeta {
    name: "hobs::RefArray",
    type_id: type_id_of::<RefArray>,
    kind: MetaKind::Array(ArrayKind::Ref),
};

impl Portable for RefArray {
    fn meta(&self) -> &'static TypeMeta {
        &REF_ARRAY_META
    }
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// The eight pre-seeded array kinds, in type-dictionary index order 1..=8.
pub fn seeded_array_metas() -> [&'static TypeMeta; 8] {
    [
        &BOOL_ARRAY_META,
        &I8_ARRAY_META,
        &I16_ARRAY_META,
        &CHAR_ARRAY_META,
        &I32_ARRAY_META,
        &I64_ARRAY_META,
        &F32_ARRAY_META,
        &F64_ARRAY_META,
    ]
}

/// Everything the registry pre-loads.
pub(crate) fn builtin_metas() -> impl Iterator<Item = &'static TypeMeta> {
    seeded_array_metas()
        .into_iter()
        .chain([&TEXT_META, &TYPE_VALUE_META, &REF_ARRAY_META])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_seed_order_is_stable() {
        let names: Vec<&str> = seeded_array_metas().iter().map(|m| m.name).collect();
        assert_eq!(
            names,
            [
                "hobs::BoolArray",
                "hobs::I8Array",
                "hobs::I16Array",
                "hobs::CharArray",
                "hobs::I32Array",
                "hobs::I64Array",
                "hobs::F32Array",
                "hobs::F64Array",
            ]
        );
    }

    #[test]
    fn test_builtin_names_are_unique() {
        let mut seen = std::collections::HashSet::new();
        for meta in builtin_metas() {
            assert!(seen.insert(meta.name), "duplicate builtin {}", meta.name);
        }
        assert_eq!(seen.len(), 11);
    }

    #[test]
    fn test_wrapper_meta_links_back() {
        let text = Text("hello".to_string());
        assert_eq!(text.meta().name, "hobs::Text");
        let arr = I32Array(vec![1, 2, 3]);
        assert!(matches!(arr.meta().kind, MetaKind::Array(ArrayKind::I32)));
    }
}
