//! Hprof record and subrecord tags, plus the basic value types.
//!
//! Tags cover the standard JVM set and the Android (ART) extensions that
//! carry the extra root kinds.

use crate::error::SnapshotError;
use crate::graph::RootKind;

// Top-level record tags.
pub(crate) const TAG_STRING: u8 = 0x01;
pub(crate) const TAG_LOAD_CLASS: u8 = 0x02;
pub(crate) const TAG_HEAP_DUMP: u8 = 0x0c;
pub(crate) const TAG_HEAP_DUMP_SEGMENT: u8 = 0x1c;
pub(crate) const TAG_HEAP_DUMP_END: u8 = 0x2c;

// Heap dump subrecord tags: standard roots.
pub(crate) const SUB_ROOT_UNKNOWN: u8 = 0xff;
pub(crate) const SUB_ROOT_JNI_GLOBAL: u8 = 0x01;
pub(crate) const SUB_ROOT_JNI_LOCAL: u8 = 0x02;
pub(crate) const SUB_ROOT_JAVA_FRAME: u8 = 0x03;
pub(crate) const SUB_ROOT_NATIVE_STACK: u8 = 0x04;
pub(crate) const SUB_ROOT_STICKY_CLASS: u8 = 0x05;
pub(crate) const SUB_ROOT_THREAD_BLOCK: u8 = 0x06;
pub(crate) const SUB_ROOT_MONITOR_USED: u8 = 0x07;
pub(crate) const SUB_ROOT_THREAD_OBJECT: u8 = 0x08;

// Heap dump subrecord tags: Android root extensions.
pub(crate) const SUB_ROOT_INTERNED_STRING: u8 = 0x89;
pub(crate) const SUB_ROOT_FINALIZING: u8 = 0x8a;
pub(crate) const SUB_ROOT_DEBUGGER: u8 = 0x8b;
pub(crate) const SUB_ROOT_REFERENCE_CLEANUP: u8 = 0x8c;
pub(crate) const SUB_ROOT_VM_INTERNAL: u8 = 0x8d;
pub(crate) const SUB_ROOT_JNI_MONITOR: u8 = 0x8e;
pub(crate) const SUB_ROOT_UNREACHABLE: u8 = 0x90;

// Heap dump subrecord tags: object payloads.
pub(crate) const SUB_CLASS_DUMP: u8 = 0x20;
pub(crate) const SUB_INSTANCE_DUMP: u8 = 0x21;
pub(crate) const SUB_OBJECT_ARRAY_DUMP: u8 = 0x22;
pub(crate) const SUB_PRIMITIVE_ARRAY_DUMP: u8 = 0x23;

// Android bookkeeping subrecords.
pub(crate) const SUB_HEAP_DUMP_INFO: u8 = 0xfe;
pub(crate) const SUB_PRIMITIVE_ARRAY_NODATA: u8 = 0xab;

/// Maps a root subrecord tag to its kind, if it is a root tag at all.
pub(crate) fn root_kind_for(tag: u8) -> Option<RootKind> {
    Some(match tag {
        SUB_ROOT_JNI_GLOBAL => RootKind::JniGlobal,
        SUB_ROOT_JNI_LOCAL => RootKind::JniLocal,
        SUB_ROOT_JAVA_FRAME => RootKind::JavaFrame,
        SUB_ROOT_NATIVE_STACK => RootKind::NativeStack,
        SUB_ROOT_STICKY_CLASS => RootKind::StickyClass,
        SUB_ROOT_THREAD_BLOCK => RootKind::ThreadBlock,
        SUB_ROOT_MONITOR_USED => RootKind::MonitorUsed,
        SUB_ROOT_THREAD_OBJECT => RootKind::ThreadObject,
        SUB_ROOT_INTERNED_STRING => RootKind::InternedString,
        SUB_ROOT_FINALIZING => RootKind::Finalizing,
        SUB_ROOT_DEBUGGER => RootKind::Debugger,
        SUB_ROOT_REFERENCE_CLEANUP => RootKind::ReferenceCleanup,
        SUB_ROOT_VM_INTERNAL => RootKind::VmInternal,
        SUB_ROOT_JNI_MONITOR => RootKind::JniMonitor,
        SUB_ROOT_UNREACHABLE => RootKind::Unreachable,
        SUB_ROOT_UNKNOWN => RootKind::Unknown,
        _ => return None,
    })
}

/// The hprof "basic type" of a field or array element.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BasicType {
    Object,
    Boolean,
    Char,
    Float,
    Double,
    Byte,
    Short,
    Int,
    Long,
}

impl BasicType {
    pub(crate) fn from_tag(
        tag: u8,
        offset: usize,
    ) -> Result<Self, SnapshotError> {
        Ok(match tag {
            2 => BasicType::Object,
            4 => BasicType::Boolean,
            5 => BasicType::Char,
            6 => BasicType::Float,
            7 => BasicType::Double,
            8 => BasicType::Byte,
            9 => BasicType::Short,
            10 => BasicType::Int,
            11 => BasicType::Long,
            _ => return Err(SnapshotError::bad_value(offset, "basic type tag")),
        })
    }

    /// Encoded size in bytes; object values use the snapshot's id width.
    pub(crate) fn size(self, id_size: u32) -> usize {
        match self {
            BasicType::Object => id_size as usize,
            BasicType::Boolean | BasicType::Byte => 1,
            BasicType::Char | BasicType::Short => 2,
            BasicType::Float | BasicType::Int => 4,
            BasicType::Double | BasicType::Long => 8,
        }
    }
}
