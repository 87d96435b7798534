// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Write side of the graph protocol.

use std::io::Write;
use std::sync::Arc;

use crate::channel::ChannelWriter;
use crate::handles::{type_tag, IdentityTable, CLEAR_HANDLE, CONTROL_HANDLES, NUL_HANDLE, RESET_HANDLE};
use crate::types::descriptor::{level_chain, level_descriptor, project_view};
use crate::types::{
    downcast, ArrayKind, BoolArray, CharArray, F32Array, F64Array, FieldSpec, I16Array, I32Array,
    I64Array, I8Array, MetaKind, ObjRef, RefArray, Strategy, Text, TypeDescriptor, TypeRegistry,
    TypeValue, Value,
};

use super::stream::{CodecCounters, TypeDict};
use super::{CodecError, CodecResult, GraphWrite};

/// Generate a length-prefixed raw array write method.
macro_rules! impl_codec_write_array {
    ($name:ident, $elem:ty, $chan:ident) => {
        pub fn $name(&mut self, values: &[$elem]) -> CodecResult<()> {
            self.emit_len(values.len())?;
            self.chan.$chan(values)?;
            Ok(())
        }
    };
}

/// Write one primitive-array wrapper payload: length prefix, then elements.
macro_rules! write_array_payload {
    ($self:ident, $view:ident, $wrap:ty, $chan:ident) => {{
        let array = downcast::<$wrap>($view).ok_or_else(|| CodecError::Corrupt {
            reason: "array strategy on a non-array value".to_string(),
        })?;
        $self.emit_len(array.0.len())?;
        $self.chan.$chan(&array.0)?;
        Ok(())
    }};
}

/// Write side of one stream: channel + identity table + type dictionary.
///
/// Used by exactly one logical sender at a time; not internally
/// synchronized.
pub struct GraphWriter<W: Write> {
    chan: ChannelWriter<W>,
    registry: Arc<TypeRegistry>,
    table: IdentityTable,
    dict: TypeDict,
    next_handle: i32,
    current: Vec<(ObjRef, u32)>,
    counters: CodecCounters,
}

impl<W: Write> GraphWriter<W> {
    pub fn new(registry: Arc<TypeRegistry>, sink: W) -> CodecResult<Self> {
        Self::with_channel(registry, ChannelWriter::new(sink))
    }

    /// Writer over a pre-configured channel (byte order, buffer capacity).
    pub fn with_channel(registry: Arc<TypeRegistry>, chan: ChannelWriter<W>) -> CodecResult<Self> {
        let dict = TypeDict::seeded(&registry)?;
        Ok(GraphWriter {
            chan,
            registry,
            table: IdentityTable::new(),
            dict,
            next_handle: CONTROL_HANDLES,
            current: Vec::new(),
            counters: CodecCounters::default(),
        })
    }

    /// Serialize one reference: null sentinel, back-reference, or a fresh
    /// handle with type tag and payload.
    pub fn write_object(&mut self, r: Option<&ObjRef>) -> CodecResult<()> {
        self.write_ref_inner(r, true)
    }

    /// Serialize one reference that must never be back-referenced: no
    /// identity is recorded, a later write of the same object is treated
    /// as new.
    pub fn write_object_unshared(&mut self, r: Option<&ObjRef>) -> CodecResult<()> {
        self.write_ref_inner(r, false)
    }

    /// Emit the reset control code and clear the object table; previously
    /// introduced types keep their dictionary indices.
    pub fn reset(&mut self) -> CodecResult<()> {
        self.chan.write_i32(RESET_HANDLE)?;
        self.table.clear();
        self.next_handle = CONTROL_HANDLES;
        self.counters.resets += 1;
        log::debug!("[codec] writer reset");
        Ok(())
    }

    /// Emit the clear control code: object table and type dictionary both
    /// start over; type names will be retransmitted.
    pub fn clear(&mut self) -> CodecResult<()> {
        self.chan.write_i32(CLEAR_HANDLE)?;
        self.table.clear();
        self.dict.reseed(&self.registry)?;
        self.next_handle = CONTROL_HANDLES;
        self.counters.resets += 1;
        log::debug!("[codec] writer clear");
        Ok(())
    }

    pub fn flush(&mut self) -> CodecResult<()> {
        self.chan.flush()?;
        Ok(())
    }

    pub fn counters(&self) -> CodecCounters {
        self.counters
    }

    /// Logical bytes produced on the channel.
    pub fn bytes_written(&self) -> u64 {
        self.chan.bytes_written()
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    /// Flush and return the underlying sink.
    pub fn into_inner(self) -> CodecResult<W> {
        Ok(self.chan.into_inner()?)
    }

    impl_codec_write_array!(write_array_bool, bool, write_bool_array);
    impl_codec_write_array!(write_array_i8, i8, write_i8_array);
    impl_codec_write_array!(write_array_i16, i16, write_i16_array);
    impl_codec_write_array!(write_array_char, u16, write_char_array);
    impl_codec_write_array!(write_array_i32, i32, write_i32_array);
    impl_codec_write_array!(write_array_i64, i64, write_i64_array);
    impl_codec_write_array!(write_array_f32, f32, write_f32_array);
    impl_codec_write_array!(write_array_f64, f64, write_f64_array);

    fn write_ref_inner(&mut self, r: Option<&ObjRef>, shared: bool) -> CodecResult<()> {
        let Some(obj) = r else {
            self.chan.write_i32(NUL_HANDLE)?;
            return Ok(());
        };

        if shared {
            if let Some(handle) = self.table.find(obj) {
                self.chan.write_i32(handle)?;
                self.counters.back_refs += 1;
                return Ok(());
            }
        }

        // Write substitution happens before a handle is minted.
        let mut target = obj.clone();
        let meta = { target.borrow().meta() };
        if let MetaKind::Struct(s) = &meta.kind {
            if let Some(replace) = s.write_replace {
                target = {
                    let guard = target.borrow();
                    replace(&*guard)
                };
            }
        }

        let descriptor = {
            let guard = target.borrow();
            self.registry.describe_value(&*guard)?
        };
        if descriptor.strategy == Strategy::NotSerializable {
            return Err(CodecError::NotSerializable {
                name: descriptor.name.to_string(),
            });
        }

        let handle = self.next_handle;
        self.next_handle += 1;
        if shared {
            // The original object owns the handle; a replaced payload still
            // back-references through the original's identity.
            self.table.insert(obj, handle);
        }

        match self.dict.find(descriptor.type_id) {
            Some(index) => self.chan.write_i32(type_tag(index))?,
            None => {
                let index = self.dict.append(Arc::clone(&descriptor));
                self.chan.write_i32(type_tag(index))?;
                self.emit_str(descriptor.name)?;
                self.counters.types_introduced += 1;
                log::debug!("[codec] introduced type {} at index {}", descriptor.name, index);
            }
        }

        self.counters.objects += 1;
        self.dispatch_write(&target, &descriptor)
    }

    fn dispatch_write(&mut self, target: &ObjRef, descriptor: &Arc<TypeDescriptor>) -> CodecResult<()> {
        match descriptor.strategy {
            Strategy::Array(kind) => self.write_array_object(target, kind),
            Strategy::Text => {
                let guard = target.borrow();
                let text = downcast::<Text>(&*guard).ok_or_else(|| CodecError::Corrupt {
                    reason: "text strategy on a non-text value".to_string(),
                })?;
                self.emit_str(&text.0)
            }
            Strategy::TypeValue => {
                let guard = target.borrow();
                let value = downcast::<TypeValue>(&*guard).ok_or_else(|| CodecError::Corrupt {
                    reason: "type-value strategy on a non-type value".to_string(),
                })?;
                self.emit_str(&value.0)
            }
            Strategy::EnumValue => {
                let MetaKind::Enum(em) = &descriptor.meta.kind else {
                    return Err(CodecError::Corrupt {
                        reason: "enum strategy without enum metadata".to_string(),
                    });
                };
                let name = {
                    let guard = target.borrow();
                    (em.name_of)(&*guard)
                };
                self.emit_str(name)
            }
            Strategy::Fast | Strategy::Custom => {
                let s = descriptor.struct_meta().ok_or_else(|| CodecError::Corrupt {
                    reason: "struct strategy without struct metadata".to_string(),
                })?;
                let write_fn = match descriptor.strategy {
                    Strategy::Fast => s.fast.as_ref().map(|f| f.write),
                    _ => s.custom.as_ref().map(|c| c.write),
                };
                let write_fn = write_fn.ok_or_else(|| CodecError::Corrupt {
                    reason: "strategy capability missing".to_string(),
                })?;
                self.current.push((target.clone(), descriptor.level));
                let result = {
                    let guard = target.borrow();
                    write_fn(&*guard, self)
                };
                self.current.pop();
                result
            }
            Strategy::Structural => self.write_structural(target, descriptor),
            Strategy::NotSerializable => Err(CodecError::NotSerializable {
                name: descriptor.name.to_string(),
            }),
        }
    }

    fn write_array_object(&mut self, target: &ObjRef, kind: ArrayKind) -> CodecResult<()> {
        match kind {
            ArrayKind::Ref => {
                let elements: Vec<Option<ObjRef>> = {
                    let guard = target.borrow();
                    let array = downcast::<RefArray>(&*guard).ok_or_else(|| CodecError::Corrupt {
                        reason: "array strategy on a non-array value".to_string(),
                    })?;
                    array.0.clone()
                };
                self.emit_len(elements.len())?;
                for element in &elements {
                    self.write_ref_inner(element.as_ref(), true)?;
                }
                Ok(())
            }
            ArrayKind::Bool => {
                let guard = target.borrow();
                let view = &*guard;
                write_array_payload!(self, view, BoolArray, write_bool_array)
            }
            ArrayKind::I8 => {
                let guard = target.borrow();
                let view = &*guard;
                write_array_payload!(self, view, I8Array, write_i8_array)
            }
            ArrayKind::I16 => {
                let guard = target.borrow();
                let view = &*guard;
                write_array_payload!(self, view, I16Array, write_i16_array)
            }
            ArrayKind::Char => {
                let guard = target.borrow();
                let view = &*guard;
                write_array_payload!(self, view, CharArray, write_char_array)
            }
            ArrayKind::I32 => {
                let guard = target.borrow();
                let view = &*guard;
                write_array_payload!(self, view, I32Array, write_i32_array)
            }
            ArrayKind::I64 => {
                let guard = target.borrow();
                let view = &*guard;
                write_array_payload!(self, view, I64Array, write_i64_array)
            }
            ArrayKind::F32 => {
                let guard = target.borrow();
                let view = &*guard;
                write_array_payload!(self, view, F32Array, write_f32_array)
            }
            ArrayKind::F64 => {
                let guard = target.borrow();
                let view = &*guard;
                write_array_payload!(self, view, F64Array, write_f64_array)
            }
        }
    }

    /// Default field walk: one pass per inheritance level, root first.
    fn write_structural(&mut self, target: &ObjRef, descriptor: &Arc<TypeDescriptor>) -> CodecResult<()> {
        for level_desc in level_chain(descriptor) {
            self.current.push((target.clone(), level_desc.level));
            let hook = level_desc.struct_meta().and_then(|s| s.write_hook);
            let result = match hook {
                Some(hook) => {
                    let guard = target.borrow();
                    hook(&*guard, self)
                }
                None => self.write_level_fields(target, &level_desc, descriptor),
            };
            self.current.pop();
            result?;
        }
        Ok(())
    }

    fn write_level_fields(
        &mut self,
        target: &ObjRef,
        level_desc: &Arc<TypeDescriptor>,
        concrete: &Arc<TypeDescriptor>,
    ) -> CodecResult<()> {
        let guard = target.borrow();
        let view = project_view(&*guard, concrete, level_desc.level).ok_or_else(|| {
            CodecError::Corrupt {
                reason: "inconsistent level chain".to_string(),
            }
        })?;
        for &field in &level_desc.fields {
            let value = (field.get)(view).map_err(|e| field_access(level_desc, field, e.reason))?;
            if value.kind() != field.kind {
                return Err(field_access(
                    level_desc,
                    field,
                    "accessor returned a value of the wrong category".to_string(),
                ));
            }
            self.write_value(value)?;
        }
        Ok(())
    }

    fn write_value(&mut self, value: Value) -> CodecResult<()> {
        match value {
            Value::F64(v) => self.chan.write_f64(v)?,
            Value::I64(v) => self.chan.write_i64(v)?,
            Value::F32(v) => self.chan.write_f32(v)?,
            Value::I32(v) => self.chan.write_i32(v)?,
            Value::I16(v) => self.chan.write_i16(v)?,
            Value::Char(v) => self.chan.write_char(v)?,
            Value::I8(v) => self.chan.write_i8(v)?,
            Value::Bool(v) => self.chan.write_bool(v)?,
            Value::Ref(r) => self.write_ref_inner(r.as_ref(), true)?,
        }
        Ok(())
    }

    fn emit_len(&mut self, len: usize) -> CodecResult<()> {
        let len = i32::try_from(len).map_err(|_| CodecError::Corrupt {
            reason: "length exceeds wire range".to_string(),
        })?;
        self.chan.write_i32(len)?;
        Ok(())
    }

    fn emit_str(&mut self, s: &str) -> CodecResult<()> {
        self.emit_len(s.len())?;
        self.chan.write_bytes(s.as_bytes())?;
        Ok(())
    }
}

fn field_access(desc: &Arc<TypeDescriptor>, field: &FieldSpec, reason: String) -> CodecError {
    CodecError::FieldAccess {
        type_name: desc.name.to_string(),
        field: field.name.to_string(),
        reason,
    }
}

impl<W: Write> GraphWrite for GraphWriter<W> {
    fn write_ref(&mut self, r: Option<&ObjRef>) -> CodecResult<()> {
        self.write_ref_inner(r, true)
    }

    fn write_ref_unshared(&mut self, r: Option<&ObjRef>) -> CodecResult<()> {
        self.write_ref_inner(r, false)
    }

    /// Encode the current level's fields of the object being written.
    fn write_default_fields(&mut self) -> CodecResult<()> {
        let (obj, level) = self.current.last().cloned().ok_or_else(|| CodecError::Corrupt {
            reason: "no object is currently being written".to_string(),
        })?;
        let concrete = {
            let guard = obj.borrow();
            self.registry.describe_value(&*guard)?
        };
        let level_desc = level_descriptor(&concrete, level).ok_or_else(|| CodecError::Corrupt {
            reason: "current level not in descriptor chain".to_string(),
        })?;
        self.write_level_fields(&obj, &level_desc, &concrete)
    }

    fn current(&self) -> Option<(ObjRef, u32)> {
        self.current.last().cloned()
    }

    fn write_bool(&mut self, v: bool) -> CodecResult<()> {
        Ok(self.chan.write_bool(v)?)
    }

    fn write_i8(&mut self, v: i8) -> CodecResult<()> {
        Ok(self.chan.write_i8(v)?)
    }

    fn write_i16(&mut self, v: i16) -> CodecResult<()> {
        Ok(self.chan.write_i16(v)?)
    }

    fn write_char(&mut self, v: u16) -> CodecResult<()> {
        Ok(self.chan.write_char(v)?)
    }

    fn write_i32(&mut self, v: i32) -> CodecResult<()> {
        Ok(self.chan.write_i32(v)?)
    }

    fn write_i64(&mut self, v: i64) -> CodecResult<()> {
        Ok(self.chan.write_i64(v)?)
    }

    fn write_f32(&mut self, v: f32) -> CodecResult<()> {
        Ok(self.chan.write_f32(v)?)
    }

    fn write_f64(&mut self, v: f64) -> CodecResult<()> {
        Ok(self.chan.write_f64(v)?)
    }

    fn write_str(&mut self, s: &str) -> CodecResult<()> {
        self.emit_str(s)
    }

    fn write_bytes(&mut self, data: &[u8]) -> CodecResult<()> {
        Ok(self.chan.write_bytes(data)?)
    }
}
