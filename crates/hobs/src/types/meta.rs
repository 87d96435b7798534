// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Declared type metadata.
//!
//! Rust has no runtime reflection, so a participating type publishes a
//! `&'static TypeMeta` describing its declared fields, optional embedded
//! base type, hooks, and capabilities. The registry turns this raw
//! metadata into an immutable [`super::TypeDescriptor`].

use std::any::{Any, TypeId};
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::codec::{CodecResult, GraphRead, GraphWrite};

use super::value::{FieldKind, Value};

/// Object side of a participating type.
///
/// Everything placed in a graph is an `ObjRef`; `meta()` links the object
/// back to its declared metadata and `as_any` enables downcasts in
/// accessors and strategy code.
pub trait Portable: Any {
    fn meta(&self) -> &'static TypeMeta;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Shared, identity-carrying reference to a graph object.
pub type ObjRef = Rc<RefCell<dyn Portable>>;

/// Downcast a borrowed object to its concrete type.
pub fn downcast<T: Portable>(obj: &dyn Portable) -> Option<&T> {
    obj.as_any().downcast_ref::<T>()
}

pub fn downcast_mut<T: Portable>(obj: &mut dyn Portable) -> Option<&mut T> {
    obj.as_any_mut().downcast_mut::<T>()
}

/// `TypeId` provider usable in static metadata (`type_id: type_id_of::<T>`).
pub fn type_id_of<T: 'static>() -> TypeId {
    TypeId::of::<T>()
}

/// A field accessor refused a get or set.
#[derive(Debug, Clone)]
pub struct FieldAccessError {
    pub reason: String,
}

impl FieldAccessError {
    pub fn new(reason: impl Into<String>) -> Self {
        FieldAccessError {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FieldAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field access refused: {}", self.reason)
    }
}

impl std::error::Error for FieldAccessError {}

/// One declared field: name, category, flags, and accessors.
///
/// Accessors receive the object at the declaring level (after base
/// projection) and downcast internally. `set` must accept writes even for
/// `immutable` fields; that flag only records how the field is declared.
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Excluded from serialization (and from the descriptor).
    pub transient: bool,
    /// Declared immutable; assigned through the same accessor on read.
    pub immutable: bool,
    pub get: fn(&dyn Portable) -> Result<Value, FieldAccessError>,
    pub set: fn(&mut dyn Portable, Value) -> Result<(), FieldAccessError>,
}

/// Embedded base type standing in for inheritance.
///
/// `project`/`project_mut` narrow a view of the declaring type to its
/// embedded base so the base's own accessors apply.
pub struct BaseSpec {
    pub meta: fn() -> &'static TypeMeta,
    pub project: for<'a> fn(&'a dyn Portable) -> &'a dyn Portable,
    pub project_mut: for<'a> fn(&'a mut dyn Portable) -> &'a mut dyn Portable,
}

/// Externally defined write/read pair taking full control of the payload.
///
/// The read side receives a freshly instantiated object already registered
/// in the object table, so cyclic back-references into it resolve.
pub struct CustomCodec {
    pub write: fn(&dyn Portable, &mut dyn GraphWrite) -> CodecResult<()>,
    pub read: fn(&ObjRef, &mut dyn GraphRead) -> CodecResult<()>,
}

/// Compiled fast path: same contract as [`CustomCodec`], tried before the
/// structural strategy when present.
pub struct FastCodec {
    pub write: fn(&dyn Portable, &mut dyn GraphWrite) -> CodecResult<()>,
    pub read: fn(&ObjRef, &mut dyn GraphRead) -> CodecResult<()>,
}

/// Declared metadata of a structurally serializable record type.
pub struct StructMeta {
    pub fields: &'static [FieldSpec],
    /// Use `fields` verbatim instead of filtering and sorting.
    pub explicit_order: bool,
    pub base: Option<BaseSpec>,
    /// Construct an instance without running its normal initialization.
    pub instantiate: Option<fn() -> ObjRef>,
    /// Runs instead of the default field walk for this level on write;
    /// must call `write_default_fields` exactly once.
    pub write_hook: Option<fn(&dyn Portable, &mut dyn GraphWrite) -> CodecResult<()>>,
    /// Read-side counterpart of `write_hook`; must call
    /// `read_default_fields` exactly once.
    pub read_hook: Option<fn(&ObjRef, &mut dyn GraphRead) -> CodecResult<()>>,
    /// Substitute a different object before a handle is minted.
    pub write_replace: Option<fn(&dyn Portable) -> ObjRef>,
    /// Substitute the reconstructed object after all fields are read.
    pub read_resolve: Option<fn(&ObjRef) -> ObjRef>,
    pub custom: Option<CustomCodec>,
    pub fast: Option<FastCodec>,
}

impl StructMeta {
    /// All-default struct metadata, for struct-update declarations.
    pub const EMPTY: StructMeta = StructMeta {
        fields: &[],
        explicit_order: false,
        base: None,
        instantiate: None,
        write_hook: None,
        read_hook: None,
        write_replace: None,
        read_resolve: None,
        custom: None,
        fast: None,
    };
}

/// Declared metadata of an enumerated type, serialized by symbolic name.
pub struct EnumMeta {
    pub variants: &'static [&'static str],
    pub name_of: fn(&dyn Portable) -> &'static str,
    pub from_name: fn(&str) -> Option<ObjRef>,
}

/// Element category of an array type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayKind {
    Bool,
    I8,
    I16,
    Char,
    I32,
    I64,
    F32,
    F64,
    Ref,
}

/// What a type is, as declared.
pub enum MetaKind {
    Struct(StructMeta),
    Enum(EnumMeta),
    Array(ArrayKind),
    Text,
    TypeValue,
    /// Participates in graphs but cannot be serialized; writing it fails.
    Opaque,
}

/// Static metadata published by a participating type.
pub struct TypeMeta {
    /// Fully-qualified name, the wire identity of the type.
    pub name: &'static str,
    pub type_id: fn() -> TypeId,
    pub kind: MetaKind,
}

impl TypeMeta {
    pub fn id(&self) -> TypeId {
        (self.type_id)()
    }
}
