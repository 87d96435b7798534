// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Shared test types exercising every strategy of the codec.

#![allow(dead_code)] // not every test binary touches every fixture

use std::any::Any;
use std::cell::RefCell;
use std::rc::Rc;

use hobs::{
    downcast, downcast_mut, type_id_of, BaseSpec, CodecResult, CustomCodec, EnumMeta, FastCodec,
    FieldAccessError, FieldKind, FieldSpec, GraphRead, GraphWrite, MetaKind, ObjRef, Portable,
    StructMeta, Text, TypeMeta, TypeRegistry, Value,
};

macro_rules! impl_portable {
    ($ty:ident, $meta:ident) => {
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

fn require<T: Portable>(o: &dyn Portable) -> Result<&T, FieldAccessError> {
    downcast::<T>(o).ok_or_else(|| FieldAccessError::new("unexpected concrete type"))
}

fn require_mut<T: Portable>(o: &mut dyn Portable) -> Result<&mut T, FieldAccessError> {
    downcast_mut::<T>(o).ok_or_else(|| FieldAccessError::new("unexpected concrete type"))
}

fn category_error() -> FieldAccessError {
    FieldAccessError::new("value of the wrong category")
}

// ========================================================================
// Node - structural strategy, reference field, cycles
// ========================================================================

#[derive(Default)]
pub struct Node {
    pub id: i32,
    pub next: Option<ObjRef>,
}

fn node_get_id(o: &dyn Portable) -> Result<Value, FieldAccessError> {
    Ok(Value::I32(require::<Node>(o)?.id))
}

fn node_set_id(o: &mut dyn Portable, v: Value) -> Result<(), FieldAccessError> {
    match v {
        Value::I32(x) => {
            require_mut::<Node>(o)?.id = x;
            Ok(())
        }
        _ => Err(category_error()),
    }
}

fn node_get_next(o: &dyn Portable) -> Result<Value, FieldAccessError> {
    Ok(Value::Ref(require::<Node>(o)?.next.clone()))
}

fn node_set_next(o: &mut dyn Portable, v: Value) -> Result<(), FieldAccessError> {
    match v {
        Value::Ref(r) => {
            require_mut::<Node>(o)?.next = r;
            Ok(())
        }
        _ => Err(category_error()),
    }
}

static NODE_FIELDS: [FieldSpec; 2] = [
    FieldSpec {
        name: "id",
        kind: FieldKind::I32,
        transient: false,
        immutable: false,
        get: node_get_id,
        set: node_set_id,
    },
    FieldSpec {
        name: "next",
        kind: FieldKind::Ref,
        transient: false,
        immutable: false,
        get: node_get_next,
        set: node_set_next,
    },
];

fn new_node() -> ObjRef {
    Rc::new(RefCell::new(Node::default()))
}

pub static NODE_META: TypeMeta = TypeMeta {
    name: "demo::Node",
    type_id: type_id_of::<Node>,
    kind: MetaKind::Struct(StructMeta {
        fields: &NODE_FIELDS,
        instantiate: Some(new_node),
        ..StructMeta::EMPTY
    }),
};

impl_portable!(Node, NODE_META);

pub fn node(id: i32) -> Rc<RefCell<Node>> {
    Rc::new(RefCell::new(Node { id, next: None }))
}

pub fn as_obj(n: &Rc<RefCell<Node>>) -> ObjRef {
    n.clone()
}

// ========================================================================
// Blob - one field of every category, scrambled declaration order
// ========================================================================

#[derive(Default)]
pub struct Blob {
    pub alpha: f64,
    pub beta: f64,
    pub big: i64,
    pub ratio: f32,
    pub count: i32,
    pub small: i16,
    pub wide: u16,
    pub tiny: i8,
    pub flag: bool,
    pub label: Option<ObjRef>,
    pub cache: i32,
}

macro_rules! blob_accessors {
    ($get:ident, $set:ident, $field:ident, $variant:ident) => {
        fn $get(o: &dyn Portable) -> Result<Value, FieldAccessError> {
            Ok(Value::$variant(require::<Blob>(o)?.$field))
        }
        fn $set(o: &mut dyn Portable, v: Value) -> Result<(), FieldAccessError> {
            match v {
                Value::$variant(x) => {
                    require_mut::<Blob>(o)?.$field = x;
                    Ok(())
                }
                _ => Err(category_error()),
            }
        }
    };
}

blob_accessors!(blob_get_alpha, blob_set_alpha, alpha, F64);
blob_accessors!(blob_get_beta, blob_set_beta, beta, F64);
blob_accessors!(blob_get_big, blob_set_big, big, I64);
blob_accessors!(blob_get_ratio, blob_set_ratio, ratio, F32);
blob_accessors!(blob_get_count, blob_set_count, count, I32);
blob_accessors!(blob_get_small, blob_set_small, small, I16);
blob_accessors!(blob_get_wide, blob_set_wide, wide, Char);
blob_accessors!(blob_get_tiny, blob_set_tiny, tiny, I8);
blob_accessors!(blob_get_flag, blob_set_flag, flag, Bool);
blob_accessors!(blob_get_cache, blob_set_cache, cache, I32);

fn blob_get_label(o: &dyn Portable) -> Result<Value, FieldAccessError> {
    Ok(Value::Ref(require::<Blob>(o)?.label.clone()))
}

fn blob_set_label(o: &mut dyn Portable, v: Value) -> Result<(), FieldAccessError> {
    match v {
        Value::Ref(r) => {
            require_mut::<Blob>(o)?.label = r;
            Ok(())
        }
        _ => Err(category_error()),
    }
}

macro_rules! field {
    ($name:expr, $kind:ident, $get:ident, $set:ident) => {
        FieldSpec {
            name: $name,
            kind: FieldKind::$kind,
            transient: false,
            immutable: false,
            get: $get,
            set: $set,
        }
    };
}

// Deliberately scrambled: the registry must impose the canonical order.
static BLOB_FIELDS: [FieldSpec; 11] = [
    field!("label", Ref, blob_get_label, blob_set_label),
    field!("flag", Bool, blob_get_flag, blob_set_flag),
    FieldSpec {
        name: "cache",
        kind: FieldKind::I32,
        transient: true,
        immutable: false,
        get: blob_get_cache,
        set: blob_set_cache,
    },
    field!("beta", F64, blob_get_beta, blob_set_beta),
    field!("count", I32, blob_get_count, blob_set_count),
    field!("tiny", I8, blob_get_tiny, blob_set_tiny),
    field!("alpha", F64, blob_get_alpha, blob_set_alpha),
    field!("wide", Char, blob_get_wide, blob_set_wide),
    field!("big", I64, blob_get_big, blob_set_big),
    field!("small", I16, blob_get_small, blob_set_small),
    field!("ratio", F32, blob_get_ratio, blob_set_ratio),
];

fn new_blob() -> ObjRef {
    Rc::new(RefCell::new(Blob::default()))
}

pub static BLOB_META: TypeMeta = TypeMeta {
    name: "demo::Blob",
    type_id: type_id_of::<Blob>,
    kind: MetaKind::Struct(StructMeta {
        fields: &BLOB_FIELDS,
        instantiate: Some(new_blob),
        ..StructMeta::EMPTY
    }),
};

impl_portable!(Blob, BLOB_META);

// ========================================================================
// BasePart / Derived - embedded base standing in for inheritance
// ========================================================================

#[derive(Default)]
pub struct BasePart {
    pub serial: i64,
}

fn base_get_serial(o: &dyn Portable) -> Result<Value, FieldAccessError> {
    Ok(Value::I64(require::<BasePart>(o)?.serial))
}

fn base_set_serial(o: &mut dyn Portable, v: Value) -> Result<(), FieldAccessError> {
    match v {
        Value::I64(x) => {
            require_mut::<BasePart>(o)?.serial = x;
            Ok(())
        }
        _ => Err(category_error()),
    }
}

static BASE_FIELDS: [FieldSpec; 1] = [field!("serial", I64, base_get_serial, base_set_serial)];

fn new_base() -> ObjRef {
    Rc::new(RefCell::new(BasePart::default()))
}

pub static BASE_META: TypeMeta = TypeMeta {
    name: "demo::BasePart",
    type_id: type_id_of::<BasePart>,
    kind: MetaKind::Struct(StructMeta {
        fields: &BASE_FIELDS,
        instantiate: Some(new_base),
        ..StructMeta::EMPTY
    }),
};

impl_portable!(BasePart, BASE_META);

#[derive(Default)]
pub struct Derived {
    pub base: BasePart,
    pub extra: i32,
}

fn derived_get_extra(o: &dyn Portable) -> Result<Value, FieldAccessError> {
    Ok(Value::I32(require::<Derived>(o)?.extra))
}

fn derived_set_extra(o: &mut dyn Portable, v: Value) -> Result<(), FieldAccessError> {
    match v {
        Value::I32(x) => {
            require_mut::<Derived>(o)?.extra = x;
            Ok(())
        }
        _ => Err(category_error()),
    }
}

static DERIVED_FIELDS: [FieldSpec; 1] =
    [field!("extra", I32, derived_get_extra, derived_set_extra)];

fn derived_base_meta() -> &'static TypeMeta {
    &BASE_META
}

fn derived_project(o: &dyn Portable) -> &dyn Portable {
    let derived = downcast::<Derived>(o).expect("projection applied to a non-Derived");
    &derived.base
}

fn derived_project_mut(o: &mut dyn Portable) -> &mut dyn Portable {
    let derived = downcast_mut::<Derived>(o).expect("projection applied to a non-Derived");
    &mut derived.base
}

fn new_derived() -> ObjRef {
    Rc::new(RefCell::new(Derived::default()))
}

pub static DERIVED_META: TypeMeta = TypeMeta {
    name: "demo::Derived",
    type_id: type_id_of::<Derived>,
    kind: MetaKind::Struct(StructMeta {
        fields: &DERIVED_FIELDS,
        base: Some(BaseSpec {
            meta: derived_base_meta,
            project: derived_project,
            project_mut: derived_project_mut,
        }),
        instantiate: Some(new_derived),
        ..StructMeta::EMPTY
    }),
};

impl_portable!(Derived, DERIVED_META);

// ========================================================================
// Color - enumerated-value strategy
// ========================================================================

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum Color {
    Red,
    Green,
    Blue,
}

static COLOR_VARIANTS: [&str; 3] = ["Red", "Green", "Blue"];

fn color_name(o: &dyn Portable) -> &'static str {
    match downcast::<Color>(o).expect("enum accessor on a non-Color") {
        Color::Red => "Red",
        Color::Green => "Green",
        Color::Blue => "Blue",
    }
}

fn color_from_name(name: &str) -> Option<ObjRef> {
    let color = match name {
        "Red" => Color::Red,
        "Green" => Color::Green,
        "Blue" => Color::Blue,
        _ => return None,
    };
    Some(Rc::new(RefCell::new(color)))
}

pub static COLOR_META: TypeMeta = TypeMeta {
    name: "demo::Color",
    type_id: type_id_of::<Color>,
    kind: MetaKind::Enum(EnumMeta {
        variants: &COLOR_VARIANTS,
        name_of: color_name,
        from_name: color_from_name,
    }),
};

impl_portable!(Color, COLOR_META);

// ========================================================================
// Point - externally defined codec
// ========================================================================

#[derive(Default)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

fn point_write(o: &dyn Portable, w: &mut dyn GraphWrite) -> CodecResult<()> {
    let p = downcast::<Point>(o).expect("custom write on a non-Point");
    w.write_f64(p.x)?;
    w.write_f64(p.y)
}

fn point_read(obj: &ObjRef, r: &mut dyn GraphRead) -> CodecResult<()> {
    let x = r.read_f64()?;
    let y = r.read_f64()?;
    let mut guard = obj.borrow_mut();
    let p = downcast_mut::<Point>(&mut *guard).expect("custom read on a non-Point");
    p.x = x;
    p.y = y;
    Ok(())
}

fn new_point() -> ObjRef {
    Rc::new(RefCell::new(Point::default()))
}

pub static POINT_META: TypeMeta = TypeMeta {
    name: "demo::Point",
    type_id: type_id_of::<Point>,
    kind: MetaKind::Struct(StructMeta {
        instantiate: Some(new_point),
        custom: Some(CustomCodec {
            write: point_write,
            read: point_read,
        }),
        ..StructMeta::EMPTY
    }),
};

impl_portable!(Point, POINT_META);

// ========================================================================
// Fasted - compiled fast path capability
// ========================================================================

#[derive(Default)]
pub struct Fasted {
    pub n: i64,
}

fn fasted_write(o: &dyn Portable, w: &mut dyn GraphWrite) -> CodecResult<()> {
    w.write_i64(downcast::<Fasted>(o).expect("fast write on a non-Fasted").n)
}

fn fasted_read(obj: &ObjRef, r: &mut dyn GraphRead) -> CodecResult<()> {
    let n = r.read_i64()?;
    let mut guard = obj.borrow_mut();
    downcast_mut::<Fasted>(&mut *guard)
        .expect("fast read on a non-Fasted")
        .n = n;
    Ok(())
}

fn new_fasted() -> ObjRef {
    Rc::new(RefCell::new(Fasted::default()))
}

pub static FASTED_META: TypeMeta = TypeMeta {
    name: "demo::Fasted",
    type_id: type_id_of::<Fasted>,
    kind: MetaKind::Struct(StructMeta {
        instantiate: Some(new_fasted),
        fast: Some(FastCodec {
            write: fasted_write,
            read: fasted_read,
        }),
        ..StructMeta::EMPTY
    }),
};

impl_portable!(Fasted, FASTED_META);

// ========================================================================
// Stamped - write/read hooks around the default field walk
// ========================================================================

pub const STAMP_LEAD: i32 = 0x5EA1;
pub const STAMP_TAIL: i32 = 0x1A5E;

#[derive(Default)]
pub struct Stamped {
    pub payload: i32,
}

fn stamped_get_payload(o: &dyn Portable) -> Result<Value, FieldAccessError> {
    Ok(Value::I32(require::<Stamped>(o)?.payload))
}

fn stamped_set_payload(o: &mut dyn Portable, v: Value) -> Result<(), FieldAccessError> {
    match v {
        Value::I32(x) => {
            require_mut::<Stamped>(o)?.payload = x;
            Ok(())
        }
        _ => Err(category_error()),
    }
}

static STAMPED_FIELDS: [FieldSpec; 1] =
    [field!("payload", I32, stamped_get_payload, stamped_set_payload)];

fn stamped_write_hook(_o: &dyn Portable, w: &mut dyn GraphWrite) -> CodecResult<()> {
    w.write_i32(STAMP_LEAD)?;
    w.write_default_fields()?;
    w.write_i32(STAMP_TAIL)
}

fn stamped_read_hook(_obj: &ObjRef, r: &mut dyn GraphRead) -> CodecResult<()> {
    assert_eq!(r.read_i32()?, STAMP_LEAD, "lead stamp missing");
    r.read_default_fields()?;
    assert_eq!(r.read_i32()?, STAMP_TAIL, "tail stamp missing");
    Ok(())
}

fn new_stamped() -> ObjRef {
    Rc::new(RefCell::new(Stamped::default()))
}

pub static STAMPED_META: TypeMeta = TypeMeta {
    name: "demo::Stamped",
    type_id: type_id_of::<Stamped>,
    kind: MetaKind::Struct(StructMeta {
        fields: &STAMPED_FIELDS,
        instantiate: Some(new_stamped),
        write_hook: Some(stamped_write_hook),
        read_hook: Some(stamped_read_hook),
        ..StructMeta::EMPTY
    }),
};

impl_portable!(Stamped, STAMPED_META);

// ========================================================================
// Aliased - write substitution; Norm - read substitution
// ========================================================================

#[derive(Default)]
pub struct Aliased {
    pub tag: i32,
}

fn aliased_get_tag(o: &dyn Portable) -> Result<Value, FieldAccessError> {
    Ok(Value::I32(require::<Aliased>(o)?.tag))
}

fn aliased_set_tag(o: &mut dyn Portable, v: Value) -> Result<(), FieldAccessError> {
    match v {
        Value::I32(x) => {
            require_mut::<Aliased>(o)?.tag = x;
            Ok(())
        }
        _ => Err(category_error()),
    }
}

static ALIASED_FIELDS: [FieldSpec; 1] = [field!("tag", I32, aliased_get_tag, aliased_set_tag)];

fn aliased_replace(o: &dyn Portable) -> ObjRef {
    let aliased = downcast::<Aliased>(o).expect("replace on a non-Aliased");
    Rc::new(RefCell::new(Text(format!("alias:{}", aliased.tag))))
}

fn new_aliased() -> ObjRef {
    Rc::new(RefCell::new(Aliased::default()))
}

pub static ALIASED_META: TypeMeta = TypeMeta {
    name: "demo::Aliased",
    type_id: type_id_of::<Aliased>,
    kind: MetaKind::Struct(StructMeta {
        fields: &ALIASED_FIELDS,
        instantiate: Some(new_aliased),
        write_replace: Some(aliased_replace),
        ..StructMeta::EMPTY
    }),
};

impl_portable!(Aliased, ALIASED_META);

#[derive(Default)]
pub struct Norm {
    pub v: i32,
}

fn norm_get_v(o: &dyn Portable) -> Result<Value, FieldAccessError> {
    Ok(Value::I32(require::<Norm>(o)?.v))
}

fn norm_set_v(o: &mut dyn Portable, v: Value) -> Result<(), FieldAccessError> {
    match v {
        Value::I32(x) => {
            require_mut::<Norm>(o)?.v = x;
            Ok(())
        }
        _ => Err(category_error()),
    }
}

static NORM_FIELDS: [FieldSpec; 1] = [field!("v", I32, norm_get_v, norm_set_v)];

fn norm_resolve(obj: &ObjRef) -> ObjRef {
    let v = {
        let guard = obj.borrow();
        downcast::<Norm>(&*guard).expect("resolve on a non-Norm").v
    };
    Rc::new(RefCell::new(Norm { v: v + 1000 }))
}

fn new_norm() -> ObjRef {
    Rc::new(RefCell::new(Norm::default()))
}

pub static NORM_META: TypeMeta = TypeMeta {
    name: "demo::Norm",
    type_id: type_id_of::<Norm>,
    kind: MetaKind::Struct(StructMeta {
        fields: &NORM_FIELDS,
        instantiate: Some(new_norm),
        read_resolve: Some(norm_resolve),
        ..StructMeta::EMPTY
    }),
};

impl_portable!(Norm, NORM_META);

// ========================================================================
// RawHandle - declared opaque, must refuse to serialize
// ========================================================================

#[derive(Default)]
pub struct RawHandle {
    pub fd: i32,
}

pub static RAW_HANDLE_META: TypeMeta = TypeMeta {
    name: "demo::RawHandle",
    type_id: type_id_of::<RawHandle>,
    kind: MetaKind::Opaque,
};

impl_portable!(RawHandle, RAW_HANDLE_META);

/// Register every fixture type.
pub fn register_all(registry: &TypeRegistry) {
    for meta in [
        &NODE_META,
        &BLOB_META,
        &BASE_META,
        &DERIVED_META,
        &COLOR_META,
        &POINT_META,
        &FASTED_META,
        &STAMPED_META,
        &ALIASED_META,
        &NORM_META,
        &RAW_HANDLE_META,
    ] {
        registry.register(meta).expect("fixture registration");
    }
}
