//! Hprof snapshot reader.
//!
//! Reads a JVM hprof file into id-keyed tables and answers [`HeapGraph`]
//! queries from memory. The reader covers exactly what path discovery
//! consumes: strings, load-class records, and heap-dump segments with their
//! root, class, instance and array subrecords (both the standard and the
//! Android root families). Stack traces, allocation sites and other
//! record types are skipped over by length.
//!
//! Instance field data is kept as raw byte spans into the file buffer and
//! decoded on demand against the class's resolved field layout, walking the
//! superclass chain. All record framing is validated while parsing, so a
//! span that parsed successfully can always be decoded later.

mod reader;
mod records;

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::error::SnapshotError;
use crate::graph::{
    FieldRef, GcRoot, HeapGraph, HeapNode, ObjectId, RootKind, SnapshotInfo,
};
use crate::names::normalize_class_name;
use reader::Cursor;
use records::{
    BasicType, SUB_CLASS_DUMP, SUB_HEAP_DUMP_INFO, SUB_INSTANCE_DUMP,
    SUB_OBJECT_ARRAY_DUMP, SUB_PRIMITIVE_ARRAY_DUMP,
    SUB_PRIMITIVE_ARRAY_NODATA, SUB_ROOT_JAVA_FRAME, SUB_ROOT_JNI_GLOBAL,
    SUB_ROOT_JNI_LOCAL, SUB_ROOT_JNI_MONITOR, SUB_ROOT_NATIVE_STACK,
    SUB_ROOT_THREAD_BLOCK, SUB_ROOT_THREAD_OBJECT, TAG_HEAP_DUMP,
    TAG_HEAP_DUMP_END, TAG_HEAP_DUMP_SEGMENT, TAG_LOAD_CLASS, TAG_STRING,
    root_kind_for,
};

/// A class definition resolved from a `CLASS_DUMP` subrecord.
#[derive(Debug)]
struct ClassDef {
    /// Normalized class name (`java.lang.String`, `int[]`, ...).
    name: String,
    /// Superclass object id, 0 at the top of the hierarchy.
    super_id: u64,
    /// Static reference fields with their resolved values.
    statics: Vec<(String, Option<ObjectId>)>,
    /// All declared instance fields, in declaration order. Primitive slots
    /// are kept because they participate in the byte layout.
    fields: Vec<FieldDef>,
}

#[derive(Debug)]
struct FieldDef {
    name: String,
    ty: BasicType,
}

#[derive(Debug)]
enum ObjectRec {
    Instance {
        class_id: u64,
        data_offset: usize,
        data_len: u32,
    },
    ObjectArray {
        class_id: u64,
        elements: Box<[u64]>,
    },
    PrimitiveArray(BasicType),
}

/// A heap snapshot backed by an hprof file.
#[derive(Debug)]
pub struct HprofSnapshot {
    buf: Vec<u8>,
    id_size: u32,
    info: SnapshotInfo,
    classes: HashMap<u64, ClassDef>,
    objects: HashMap<u64, ObjectRec>,
    /// Instance ids in file order; this is the target scan order.
    instance_order: Vec<u64>,
    roots: Vec<GcRoot>,
}

/// Parse-time accumulation, before string ids are resolved to names.
#[derive(Default)]
struct RawTables {
    strings: HashMap<u64, String>,
    /// class object id -> name string id, from LOAD_CLASS records.
    class_names: HashMap<u64, u64>,
    raw_classes: Vec<RawClass>,
    instances: Vec<(u64, u64, usize, u32)>,
    arrays: Vec<(u64, u64, Box<[u64]>)>,
    primitives: Vec<(u64, BasicType)>,
    roots: Vec<GcRoot>,
}

struct RawClass {
    id: u64,
    super_id: u64,
    /// (name string id, value) for object-typed statics only.
    statics: Vec<(u64, Option<ObjectId>)>,
    /// (name string id, basic type) for every declared field.
    fields: Vec<(u64, BasicType)>,
}

impl HprofSnapshot {
    /// Opens and fully parses an hprof file.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError`] on I/O failure, on an unrecognizable
    /// header, or on any record that cannot be framed or decoded. There is
    /// no partial-parse mode: a snapshot either loads or is corrupt.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let path = path.as_ref();
        let buf = fs::read(path)?;
        let file_size = buf.len() as u64;

        let mut cur = Cursor::new(&buf);
        let format_version = cur.read_nul_terminated(64)?.to_string();
        if !format_version.starts_with("JAVA PROFILE") {
            return Err(SnapshotError::bad_header(format!(
                "unexpected version string {format_version:?}"
            )));
        }
        let id_size = cur.read_u32()?;
        if id_size != 4 && id_size != 8 {
            return Err(SnapshotError::unsupported_id_size(id_size));
        }
        let timestamp_ms = cur.read_u64()?;

        let mut raw = RawTables::default();
        parse_records(&mut cur, id_size, &mut raw)?;

        let snapshot = Self::from_raw(raw, buf, id_size, SnapshotInfo {
            path: path.canonicalize().unwrap_or_else(|_| path.to_path_buf()),
            file_size,
            timestamp_ms,
            format_version,
            id_size,
            ..SnapshotInfo::default()
        });
        info!(
            classes = snapshot.info.class_count,
            instances = snapshot.info.instance_count,
            object_arrays = snapshot.info.object_array_count,
            primitive_arrays = snapshot.info.primitive_array_count,
            roots = snapshot.info.root_count,
            "hprof.loaded"
        );
        Ok(snapshot)
    }

    fn from_raw(
        raw: RawTables,
        buf: Vec<u8>,
        id_size: u32,
        mut info: SnapshotInfo,
    ) -> Self {
        let name_of = |tables: &RawTables, class_id: u64| -> String {
            tables
                .class_names
                .get(&class_id)
                .and_then(|name_id| tables.strings.get(name_id))
                .map(|raw_name| normalize_class_name(raw_name))
                .unwrap_or_else(|| format!("class@0x{class_id:x}"))
        };
        let field_name = |tables: &RawTables, name_id: u64| -> String {
            tables
                .strings
                .get(&name_id)
                .cloned()
                .unwrap_or_else(|| "?".to_string())
        };

        let mut classes = HashMap::with_capacity(raw.raw_classes.len());
        for rc in &raw.raw_classes {
            let def = ClassDef {
                name: name_of(&raw, rc.id),
                super_id: rc.super_id,
                statics: rc
                    .statics
                    .iter()
                    .map(|(name_id, value)| (field_name(&raw, *name_id), *value))
                    .collect(),
                fields: rc
                    .fields
                    .iter()
                    .map(|(name_id, ty)| FieldDef {
                        name: field_name(&raw, *name_id),
                        ty: *ty,
                    })
                    .collect(),
            };
            classes.insert(rc.id, def);
        }

        let mut objects = HashMap::with_capacity(
            raw.instances.len() + raw.arrays.len() + raw.primitives.len(),
        );
        let mut instance_order = Vec::with_capacity(raw.instances.len());
        for (id, class_id, data_offset, data_len) in raw.instances {
            instance_order.push(id);
            objects.insert(id, ObjectRec::Instance {
                class_id,
                data_offset,
                data_len,
            });
        }
        for (id, class_id, elements) in raw.arrays {
            objects.insert(id, ObjectRec::ObjectArray { class_id, elements });
        }
        for (id, ty) in raw.primitives {
            objects.insert(id, ObjectRec::PrimitiveArray(ty));
        }

        info.class_count = classes.len() as u64;
        info.instance_count = instance_order.len() as u64;
        info.object_array_count = objects
            .values()
            .filter(|o| matches!(o, ObjectRec::ObjectArray { .. }))
            .count() as u64;
        info.primitive_array_count = objects
            .values()
            .filter(|o| matches!(o, ObjectRec::PrimitiveArray(_)))
            .count() as u64;
        info.root_count = raw.roots.len() as u64;

        Self {
            buf,
            id_size,
            info,
            classes,
            objects,
            instance_order,
            roots: raw.roots,
        }
    }

    fn class_name(&self, class_id: u64) -> &str {
        self.classes
            .get(&class_id)
            .map(|def| def.name.as_str())
            .unwrap_or("?")
    }
}

impl HeapGraph for HprofSnapshot {
    fn info(&self) -> &SnapshotInfo {
        &self.info
    }

    fn instance_ids(&self) -> Box<dyn Iterator<Item = ObjectId> + '_> {
        Box::new(self.instance_order.iter().map(|&id| ObjectId(id)))
    }

    fn gc_roots(&self) -> &[GcRoot] {
        &self.roots
    }

    fn contains(&self, id: ObjectId) -> bool {
        self.objects.contains_key(&id.0) || self.classes.contains_key(&id.0)
    }

    fn resolve(&self, id: ObjectId) -> Option<HeapNode<'_>> {
        if let Some(def) = self.classes.get(&id.0) {
            return Some(HeapNode::ClassObject {
                class_name: &def.name,
                statics: def
                    .statics
                    .iter()
                    .map(|(name, value)| FieldRef { name, value: *value })
                    .collect(),
            });
        }
        Some(match self.objects.get(&id.0)? {
            ObjectRec::Instance {
                class_id,
                data_offset,
                data_len,
            } => {
                let data = &self.buf
                    [*data_offset..*data_offset + *data_len as usize];
                let mut cur = Cursor::new(data);
                let mut ancestry = Vec::new();
                let mut fields = Vec::new();
                let mut cid = *class_id;
                'chain: while cid != 0 {
                    let Some(def) = self.classes.get(&cid) else { break };
                    ancestry.push(def.name.as_str());
                    for field in &def.fields {
                        if field.ty == BasicType::Object {
                            let Ok(value) = cur.read_id(self.id_size) else {
                                break 'chain;
                            };
                            fields.push(FieldRef {
                                name: &field.name,
                                value: (value != 0).then_some(ObjectId(value)),
                            });
                        } else if cur.skip(field.ty.size(self.id_size)).is_err()
                        {
                            break 'chain;
                        }
                    }
                    cid = def.super_id;
                }
                HeapNode::Instance {
                    class_name: self.class_name(*class_id),
                    ancestry,
                    fields,
                }
            }
            ObjectRec::ObjectArray { class_id, elements } => {
                HeapNode::ObjectArray {
                    class_name: self.class_name(*class_id),
                    elements: elements.iter().map(|&e| ObjectId(e)).collect(),
                }
            }
            ObjectRec::PrimitiveArray(_) => HeapNode::PrimitiveArray,
        })
    }

    fn class_name_of(&self, id: ObjectId) -> Option<&str> {
        if let Some(def) = self.classes.get(&id.0) {
            return Some(&def.name);
        }
        Some(match self.objects.get(&id.0)? {
            ObjectRec::Instance { class_id, .. }
            | ObjectRec::ObjectArray { class_id, .. } => {
                self.class_name(*class_id)
            }
            ObjectRec::PrimitiveArray(ty) => primitive_array_name(*ty),
        })
    }
}

fn primitive_array_name(ty: BasicType) -> &'static str {
    match ty {
        BasicType::Boolean => "boolean[]",
        BasicType::Char => "char[]",
        BasicType::Float => "float[]",
        BasicType::Double => "double[]",
        BasicType::Byte => "byte[]",
        BasicType::Short => "short[]",
        BasicType::Int => "int[]",
        BasicType::Long => "long[]",
        // Object arrays never take this path.
        BasicType::Object => "java.lang.Object[]",
    }
}

/// Top-level record loop.
fn parse_records(
    cur: &mut Cursor<'_>,
    id_size: u32,
    raw: &mut RawTables,
) -> Result<(), SnapshotError> {
    while cur.remaining() > 0 {
        if cur.remaining() < 9 {
            debug!(trailing = cur.remaining(), "ignoring trailing bytes");
            return Ok(());
        }
        let tag = cur.read_u8()?;
        let _time = cur.read_u32()?;
        let len = cur.read_u32()? as usize;
        let body_end = cur
            .pos()
            .checked_add(len)
            .ok_or_else(|| SnapshotError::truncated(cur.pos()))?;
        match tag {
            TAG_STRING => {
                if len < id_size as usize {
                    return Err(SnapshotError::bad_value(cur.pos(), "string record"));
                }
                let id = cur.read_id(id_size)?;
                let bytes = cur.take(len - id_size as usize)?;
                raw.strings
                    .insert(id, String::from_utf8_lossy(bytes).into_owned());
            }
            TAG_LOAD_CLASS => {
                let _serial = cur.read_u32()?;
                let class_id = cur.read_id(id_size)?;
                let _stack_serial = cur.read_u32()?;
                let name_id = cur.read_id(id_size)?;
                raw.class_names.insert(class_id, name_id);
            }
            TAG_HEAP_DUMP | TAG_HEAP_DUMP_SEGMENT => {
                parse_heap_dump(cur, body_end, id_size, raw)?;
            }
            TAG_HEAP_DUMP_END => {
                cur.skip(len)?;
            }
            other => {
                // Stack frames, traces, allocation sites, control records:
                // framed by length, so they can be skipped wholesale.
                debug!(tag = other, len, "skipping record");
                cur.skip(len)?;
            }
        }
        if cur.pos() != body_end {
            return Err(SnapshotError::truncated(cur.pos()));
        }
    }
    Ok(())
}

/// Subrecord loop inside one HEAP_DUMP / HEAP_DUMP_SEGMENT record.
fn parse_heap_dump(
    cur: &mut Cursor<'_>,
    end: usize,
    id_size: u32,
    raw: &mut RawTables,
) -> Result<(), SnapshotError> {
    while cur.pos() < end {
        let at = cur.pos();
        let tag = cur.read_u8()?;
        if let Some(kind) = root_kind_for(tag) {
            let object_id = cur.read_id(id_size)?;
            // Root payloads past the object id vary by tag.
            match tag {
                SUB_ROOT_JNI_GLOBAL => cur.skip(id_size as usize)?,
                SUB_ROOT_JNI_LOCAL
                | SUB_ROOT_JAVA_FRAME
                | SUB_ROOT_THREAD_OBJECT
                | SUB_ROOT_JNI_MONITOR => cur.skip(8)?,
                SUB_ROOT_NATIVE_STACK | SUB_ROOT_THREAD_BLOCK => cur.skip(4)?,
                _ => {}
            }
            raw.roots.push(GcRoot {
                kind,
                object_id: ObjectId(object_id),
            });
            continue;
        }
        match tag {
            SUB_CLASS_DUMP => parse_class_dump(cur, id_size, raw)?,
            SUB_INSTANCE_DUMP => {
                let id = cur.read_id(id_size)?;
                let _stack_serial = cur.read_u32()?;
                let class_id = cur.read_id(id_size)?;
                let data_len = cur.read_u32()?;
                let data_offset = cur.pos();
                cur.skip(data_len as usize)?;
                raw.instances.push((id, class_id, data_offset, data_len));
            }
            SUB_OBJECT_ARRAY_DUMP => {
                let id = cur.read_id(id_size)?;
                let _stack_serial = cur.read_u32()?;
                let count = cur.read_u32()?;
                let class_id = cur.read_id(id_size)?;
                let mut elements = Vec::with_capacity(count as usize);
                for _ in 0..count {
                    elements.push(cur.read_id(id_size)?);
                }
                raw.arrays.push((id, class_id, elements.into_boxed_slice()));
            }
            SUB_PRIMITIVE_ARRAY_DUMP => {
                let id = cur.read_id(id_size)?;
                let _stack_serial = cur.read_u32()?;
                let count = cur.read_u32()?;
                let ty = BasicType::from_tag(cur.read_u8()?, cur.pos())?;
                cur.skip(count as usize * ty.size(id_size))?;
                raw.primitives.push((id, ty));
            }
            SUB_PRIMITIVE_ARRAY_NODATA => {
                let id = cur.read_id(id_size)?;
                let _stack_serial = cur.read_u32()?;
                let _count = cur.read_u32()?;
                let ty = BasicType::from_tag(cur.read_u8()?, cur.pos())?;
                raw.primitives.push((id, ty));
            }
            SUB_HEAP_DUMP_INFO => {
                let _heap_id = cur.read_u32()?;
                cur.skip(id_size as usize)?;
            }
            other => {
                return Err(SnapshotError::unknown_subrecord(other, at));
            }
        }
    }
    Ok(())
}

fn parse_class_dump(
    cur: &mut Cursor<'_>,
    id_size: u32,
    raw: &mut RawTables,
) -> Result<(), SnapshotError> {
    let id = cur.read_id(id_size)?;
    let _stack_serial = cur.read_u32()?;
    let super_id = cur.read_id(id_size)?;
    // Loader, signers, protection domain, two reserved slots.
    cur.skip(5 * id_size as usize)?;
    let _instance_size = cur.read_u32()?;

    let constant_count = cur.read_u16()?;
    for _ in 0..constant_count {
        let _pool_index = cur.read_u16()?;
        let ty = BasicType::from_tag(cur.read_u8()?, cur.pos())?;
        cur.skip(ty.size(id_size))?;
    }

    let static_count = cur.read_u16()?;
    let mut statics = Vec::new();
    for _ in 0..static_count {
        let name_id = cur.read_id(id_size)?;
        let ty = BasicType::from_tag(cur.read_u8()?, cur.pos())?;
        if ty == BasicType::Object {
            let value = cur.read_id(id_size)?;
            statics.push((name_id, (value != 0).then_some(ObjectId(value))));
        } else {
            cur.skip(ty.size(id_size))?;
        }
    }

    let field_count = cur.read_u16()?;
    let mut fields = Vec::with_capacity(field_count as usize);
    for _ in 0..field_count {
        let name_id = cur.read_id(id_size)?;
        let ty = BasicType::from_tag(cur.read_u8()?, cur.pos())?;
        fields.push((name_id, ty));
    }

    raw.raw_classes.push(RawClass {
        id,
        super_id,
        statics,
        fields,
    });
    Ok(())
}
