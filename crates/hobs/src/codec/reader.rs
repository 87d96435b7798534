// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read side of the graph protocol.
//!
//! Mirrors the write side token for token. A freshly introduced object is
//! registered in the object table *before* its descendants are read, so a
//! later field in the same graph can back-reference the object still under
//! construction; that is what preserves cycles on read.

use std::cell::RefCell;
use std::io::Read;
use std::rc::Rc;
use std::sync::Arc;

use crate::channel::ChannelReader;
use crate::config;
use crate::handles::{is_type_tag, tag_index, CLEAR_HANDLE, CONTROL_HANDLES, NUL_HANDLE, RESET_HANDLE};
use crate::types::descriptor::{level_chain, level_descriptor, project_view_mut};
use crate::types::{
    downcast_mut, ArrayKind, BoolArray, CharArray, F32Array, F64Array, FieldKind, FieldSpec,
    I16Array, I32Array, I64Array, I8Array, MetaKind, ObjRef, RefArray, Strategy, Text,
    TypeDescriptor, TypeRegistry, TypeValue, Value,
};

use super::stream::{CodecCounters, ObjectTable, TypeDict};
use super::{CodecError, CodecResult, GraphRead};

/// Generate a length-validated raw array read method.
macro_rules! impl_codec_read_array {
    ($name:ident, $elem:ty, $chan:ident) => {
        pub fn $name(&mut self, out: &mut [$elem]) -> CodecResult<()> {
            let received = self.chan.read_i32()?;
            if received as i64 != out.len() as i64 {
                return Err(CodecError::LengthMismatch {
                    declared: out.len(),
                    received: received as i64,
                });
            }
            self.chan.$chan(out)?;
            Ok(())
        }
    };
}

/// Read one primitive-array payload: construct zeroed, register the
/// placeholder, then fill in place.
macro_rules! read_array_payload {
    ($self:ident, $handle:ident, $len:ident, $wrap:ident, $chan:ident, $zero:expr) => {{
        let obj: ObjRef = Rc::new(RefCell::new($wrap(vec![$zero; $len])));
        $self.table.set($handle, obj.clone());
        {
            let mut guard = obj.borrow_mut();
            let array = downcast_mut::<$wrap>(&mut *guard).ok_or_else(|| CodecError::Corrupt {
                reason: "array strategy on a non-array value".to_string(),
            })?;
            $self.chan.$chan(&mut array.0)?;
        }
        Ok(obj)
    }};
}

/// Read side of one stream: channel + object table + type dictionary.
pub struct GraphReader<R: Read> {
    chan: ChannelReader<R>,
    registry: Arc<TypeRegistry>,
    table: ObjectTable,
    dict: TypeDict,
    next_handle: i32,
    current: Vec<(ObjRef, u32)>,
    counters: CodecCounters,
}

impl<R: Read> GraphReader<R> {
    pub fn new(registry: Arc<TypeRegistry>, source: R) -> CodecResult<Self> {
        Self::with_channel(registry, ChannelReader::new(source))
    }

    /// Reader over a pre-configured channel (byte order, buffer capacity).
    pub fn with_channel(registry: Arc<TypeRegistry>, chan: ChannelReader<R>) -> CodecResult<Self> {
        let dict = TypeDict::seeded(&registry)?;
        Ok(GraphReader {
            chan,
            registry,
            table: ObjectTable::new(),
            dict,
            next_handle: CONTROL_HANDLES,
            current: Vec::new(),
            counters: CodecCounters::default(),
        })
    }

    /// Reconstruct one reference from the stream.
    pub fn read_object(&mut self) -> CodecResult<Option<ObjRef>> {
        self.read_ref_inner(true)
    }

    /// Reconstruct one reference and invalidate its handle immediately: a
    /// later back-reference to it is protocol corruption.
    pub fn read_object_unshared(&mut self) -> CodecResult<Option<ObjRef>> {
        self.read_ref_inner(false)
    }

    pub fn counters(&self) -> CodecCounters {
        self.counters
    }

    /// Logical bytes consumed from the channel.
    pub fn bytes_consumed(&self) -> u64 {
        self.chan.bytes_consumed()
    }

    pub fn registry(&self) -> &Arc<TypeRegistry> {
        &self.registry
    }

    pub fn into_inner(self) -> R {
        self.chan.into_inner()
    }

    impl_codec_read_array!(read_array_bool, bool, read_bool_array);
    impl_codec_read_array!(read_array_i8, i8, read_i8_array);
    impl_codec_read_array!(read_array_i16, i16, read_i16_array);
    impl_codec_read_array!(read_array_char, u16, read_char_array);
    impl_codec_read_array!(read_array_i32, i32, read_i32_array);
    impl_codec_read_array!(read_array_i64, i64, read_i64_array);
    impl_codec_read_array!(read_array_f32, f32, read_f32_array);
    impl_codec_read_array!(read_array_f64, f64, read_f64_array);

    /// Next handle value, consuming reset/clear control codes in place.
    fn read_handle(&mut self) -> CodecResult<i32> {
        loop {
            let handle = self.chan.read_i32()?;
            match handle {
                RESET_HANDLE => {
                    self.table.clear();
                    self.next_handle = CONTROL_HANDLES;
                    self.counters.resets += 1;
                    log::debug!("[codec] reader reset");
                }
                CLEAR_HANDLE => {
                    self.table.clear();
                    self.dict.reseed(&self.registry)?;
                    self.next_handle = CONTROL_HANDLES;
                    self.counters.resets += 1;
                    log::debug!("[codec] reader clear");
                }
                _ => return Ok(handle),
            }
        }
    }

    fn read_ref_inner(&mut self, shared: bool) -> CodecResult<Option<ObjRef>> {
        let handle = self.read_handle()?;
        if handle == NUL_HANDLE {
            return Ok(None);
        }

        if !is_type_tag(handle) {
            if handle < CONTROL_HANDLES {
                return Err(CodecError::Corrupt {
                    reason: format!("invalid handle value {}", handle),
                });
            }
            let obj = self
                .table
                .get(handle)
                .ok_or(CodecError::BadBackReference { handle })?;
            self.counters.back_refs += 1;
            if !shared {
                self.table.invalidate(handle);
            }
            return Ok(Some(obj));
        }

        let index = tag_index(handle);
        let descriptor = self.resolve_type(index)?;

        let minted = self.next_handle;
        self.next_handle += 1;
        self.counters.objects += 1;

        let obj = self.read_payload(&descriptor, minted)?;

        // Read substitution: the substituted object owns the handle slot.
        let obj = match descriptor.struct_meta().and_then(|s| s.read_resolve) {
            Some(resolve) => {
                let replacement = resolve(&obj);
                self.table.set(minted, replacement.clone());
                replacement
            }
            None => obj,
        };

        if !shared {
            self.table.invalidate(minted);
        }
        Ok(Some(obj))
    }

    /// Resolve a received type index against the stream dictionary,
    /// extending it exactly when the next sequential index arrives.
    fn resolve_type(&mut self, index: i32) -> CodecResult<Arc<TypeDescriptor>> {
        let expected = self.dict.next_index();
        if index == expected {
            let name = self.read_text()?;
            let descriptor = self.registry.lookup_name(&name)?;
            self.dict.append(Arc::clone(&descriptor));
            self.counters.types_introduced += 1;
            log::debug!("[codec] resolved type {} at index {}", name, index);
            return Ok(descriptor);
        }
        if index > 0 && index < expected {
            return self.dict.get(index).ok_or_else(|| CodecError::Corrupt {
                reason: "reserved type index 0".to_string(),
            });
        }
        Err(CodecError::TypeOutOfSequence { index, expected })
    }

    fn read_payload(&mut self, descriptor: &Arc<TypeDescriptor>, handle: i32) -> CodecResult<ObjRef> {
        match descriptor.strategy {
            Strategy::Array(kind) => self.read_array_object(kind, handle),
            Strategy::Text => {
                let s = self.read_text()?;
                let obj: ObjRef = Rc::new(RefCell::new(Text(s)));
                self.table.set(handle, obj.clone());
                Ok(obj)
            }
            Strategy::TypeValue => {
                let name = self.read_text()?;
                // The denoted type must resolve on this side too.
                self.registry.lookup_name(&name)?;
                let obj: ObjRef = Rc::new(RefCell::new(TypeValue(name)));
                self.table.set(handle, obj.clone());
                Ok(obj)
            }
            Strategy::EnumValue => {
                let MetaKind::Enum(em) = &descriptor.meta.kind else {
                    return Err(CodecError::Corrupt {
                        reason: "enum strategy without enum metadata".to_string(),
                    });
                };
                let name = self.read_text()?;
                let obj = (em.from_name)(&name).ok_or_else(|| CodecError::Corrupt {
                    reason: format!("unknown variant {} of {}", name, descriptor.name),
                })?;
                self.table.set(handle, obj.clone());
                Ok(obj)
            }
            Strategy::Fast | Strategy::Custom => {
                let s = descriptor.struct_meta().ok_or_else(|| CodecError::Corrupt {
                    reason: "struct strategy without struct metadata".to_string(),
                })?;
                let instantiate = s.instantiate.ok_or_else(|| CodecError::NotSerializable {
                    name: descriptor.name.to_string(),
                })?;
                let read_fn = match descriptor.strategy {
                    Strategy::Fast => s.fast.as_ref().map(|f| f.read),
                    _ => s.custom.as_ref().map(|c| c.read),
                };
                let read_fn = read_fn.ok_or_else(|| CodecError::Corrupt {
                    reason: "strategy capability missing".to_string(),
                })?;
                let obj = instantiate();
                self.table.set(handle, obj.clone());
                self.current.push((obj.clone(), descriptor.level));
                let result = read_fn(&obj, self);
                self.current.pop();
                result?;
                Ok(obj)
            }
            Strategy::Structural => {
                let s = descriptor.struct_meta().ok_or_else(|| CodecError::Corrupt {
                    reason: "struct strategy without struct metadata".to_string(),
                })?;
                let instantiate = s.instantiate.ok_or_else(|| CodecError::NotSerializable {
                    name: descriptor.name.to_string(),
                })?;
                let obj = instantiate();
                // Placeholder registration before any descendant is read.
                self.table.set(handle, obj.clone());
                for level_desc in level_chain(descriptor) {
                    self.current.push((obj.clone(), level_desc.level));
                    let hook = level_desc.struct_meta().and_then(|m| m.read_hook);
                    let result = match hook {
                        Some(hook) => hook(&obj, self),
                        None => self.read_level_fields(&obj, &level_desc, descriptor),
                    };
                    self.current.pop();
                    result?;
                }
                Ok(obj)
            }
            Strategy::NotSerializable => Err(CodecError::NotSerializable {
                name: descriptor.name.to_string(),
            }),
        }
    }

    fn read_array_object(&mut self, kind: ArrayKind, handle: i32) -> CodecResult<ObjRef> {
        let len = self.read_len()?;
        match kind {
            ArrayKind::Bool => read_array_payload!(self, handle, len, BoolArray, read_bool_array, false),
            ArrayKind::I8 => read_array_payload!(self, handle, len, I8Array, read_i8_array, 0i8),
            ArrayKind::I16 => read_array_payload!(self, handle, len, I16Array, read_i16_array, 0i16),
            ArrayKind::Char => read_array_payload!(self, handle, len, CharArray, read_char_array, 0u16),
            ArrayKind::I32 => read_array_payload!(self, handle, len, I32Array, read_i32_array, 0i32),
            ArrayKind::I64 => read_array_payload!(self, handle, len, I64Array, read_i64_array, 0i64),
            ArrayKind::F32 => read_array_payload!(self, handle, len, F32Array, read_f32_array, 0f32),
            ArrayKind::F64 => read_array_payload!(self, handle, len, F64Array, read_f64_array, 0f64),
            ArrayKind::Ref => {
                let obj: ObjRef = Rc::new(RefCell::new(RefArray(vec![None; len])));
                self.table.set(handle, obj.clone());
                for slot in 0..len {
                    // No borrow is held across the recursion; an element may
                    // back-reference this very array.
                    let element = self.read_ref_inner(true)?;
                    let mut guard = obj.borrow_mut();
                    let array =
                        downcast_mut::<RefArray>(&mut *guard).ok_or_else(|| CodecError::Corrupt {
                            reason: "array strategy on a non-array value".to_string(),
                        })?;
                    array.0[slot] = element;
                }
                Ok(obj)
            }
        }
    }

    /// Consume one level's fields in exactly the descriptor's order.
    ///
    /// The mutable borrow is scoped per field: a reference field recurses
    /// arbitrarily deep (and may back-reference the object under
    /// construction), so no borrow may be held across it.
    fn read_level_fields(
        &mut self,
        obj: &ObjRef,
        level_desc: &Arc<TypeDescriptor>,
        concrete: &Arc<TypeDescriptor>,
    ) -> CodecResult<()> {
        for &field in &level_desc.fields {
            let value = if field.kind.is_primitive() {
                read_prim(&mut self.chan, field.kind)?
            } else {
                Value::Ref(self.read_ref_inner(true)?)
            };
            let mut guard = obj.borrow_mut();
            let view = project_view_mut(&mut *guard, concrete, level_desc.level).ok_or_else(|| {
                CodecError::Corrupt {
                    reason: "inconsistent level chain".to_string(),
                }
            })?;
            (field.set)(&mut *view, value)
                .map_err(|e| field_access(level_desc, field, assign_reason(field, e)))?;
        }
        Ok(())
    }

    fn read_len(&mut self) -> CodecResult<usize> {
        let len = self.chan.read_i32()?;
        if len < 0 {
            return Err(CodecError::Corrupt {
                reason: format!("negative length {}", len),
            });
        }
        Ok(len as usize)
    }

    fn read_text(&mut self) -> CodecResult<String> {
        let len = self.read_len()?;
        if len > config::MAX_TEXT_BYTES {
            return Err(CodecError::Corrupt {
                reason: format!("text length {} out of range", len),
            });
        }
        let mut buf = vec![0u8; len];
        self.chan.read_bytes(&mut buf)?;
        String::from_utf8(buf).map_err(|_| CodecError::Corrupt {
            reason: "invalid utf-8 in text".to_string(),
        })
    }
}

/// Read one primitive of the given category off the channel.
fn read_prim<R: Read>(chan: &mut ChannelReader<R>, kind: FieldKind) -> CodecResult<Value> {
    Ok(match kind {
        FieldKind::F64 => Value::F64(chan.read_f64()?),
        FieldKind::I64 => Value::I64(chan.read_i64()?),
        FieldKind::F32 => Value::F32(chan.read_f32()?),
        FieldKind::I32 => Value::I32(chan.read_i32()?),
        FieldKind::I16 => Value::I16(chan.read_i16()?),
        FieldKind::Char => Value::Char(chan.read_char()?),
        FieldKind::I8 => Value::I8(chan.read_i8()?),
        FieldKind::Bool => Value::Bool(chan.read_bool()?),
        FieldKind::Ref => {
            return Err(CodecError::Corrupt {
                reason: "reference category in primitive pass".to_string(),
            })
        }
    })
}

/// Assignment failures on declared-immutable fields carry that context.
fn assign_reason(field: &FieldSpec, err: crate::types::FieldAccessError) -> String {
    if field.immutable {
        format!("{} (field is declared immutable)", err.reason)
    } else {
        err.reason
    }
}

fn field_access(desc: &Arc<TypeDescriptor>, field: &FieldSpec, reason: String) -> CodecError {
    CodecError::FieldAccess {
        type_name: desc.name.to_string(),
        field: field.name.to_string(),
        reason,
    }
}

impl<R: Read> GraphRead for GraphReader<R> {
    fn read_ref(&mut self) -> CodecResult<Option<ObjRef>> {
        self.read_ref_inner(true)
    }

    fn read_ref_unshared(&mut self) -> CodecResult<Option<ObjRef>> {
        self.read_ref_inner(false)
    }

    /// Decode the current level's fields of the object being read.
    fn read_default_fields(&mut self) -> CodecResult<()> {
        let (obj, level) = self.current.last().cloned().ok_or_else(|| CodecError::Corrupt {
            reason: "no object is currently being read".to_string(),
        })?;
        let concrete = {
            let guard = obj.borrow();
            self.registry.describe_value(&*guard)?
        };
        let level_desc = level_descriptor(&concrete, level).ok_or_else(|| CodecError::Corrupt {
            reason: "current level not in descriptor chain".to_string(),
        })?;
        self.read_level_fields(&obj, &level_desc, &concrete)
    }

    fn current(&self) -> Option<(ObjRef, u32)> {
        self.current.last().cloned()
    }

    fn read_bool(&mut self) -> CodecResult<bool> {
        Ok(self.chan.read_bool()?)
    }

    fn read_i8(&mut self) -> CodecResult<i8> {
        Ok(self.chan.read_i8()?)
    }

    fn read_i16(&mut self) -> CodecResult<i16> {
        Ok(self.chan.read_i16()?)
    }

    fn read_char(&mut self) -> CodecResult<u16> {
        Ok(self.chan.read_char()?)
    }

    fn read_i32(&mut self) -> CodecResult<i32> {
        Ok(self.chan.read_i32()?)
    }

    fn read_i64(&mut self) -> CodecResult<i64> {
        Ok(self.chan.read_i64()?)
    }

    fn read_f32(&mut self) -> CodecResult<f32> {
        Ok(self.chan.read_f32()?)
    }

    fn read_f64(&mut self) -> CodecResult<f64> {
        Ok(self.chan.read_f64()?)
    }

    fn read_str(&mut self) -> CodecResult<String> {
        self.read_text()
    }

    fn read_bytes(&mut self, out: &mut [u8]) -> CodecResult<()> {
        Ok(self.chan.read_bytes(out)?)
    }
}
