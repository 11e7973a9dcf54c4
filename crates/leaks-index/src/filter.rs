//! Leaf classification.
//!
//! Some objects can never explain a leak: strings, boxed primitives and
//! primitive arrays carry no interesting inbound path, and objects behind a
//! weak-reference hierarchy do not keep their referents alive. The sweep
//! excludes the former as index children and both as parents.
//!
//! All matching is on the simple (unqualified) class name after
//! normalization, so shaded copies of the JDK classes count too.

use leaks_snapshot::{HeapGraph, HeapNode, ObjectId, simple_name};

/// Instance classes excluded both as index children and as parents.
const LEAF_INSTANCE_CLASSES: [&str; 9] = [
    "String",
    "Byte",
    "Short",
    "Integer",
    "Long",
    "Float",
    "Double",
    "Boolean",
    "Character",
];

/// Array classes excluded as parents (their elements are never swept).
const LEAF_ARRAY_CLASSES: [&str; 1] = ["String[]"];

/// Reference-machinery classes: anything with one of these in its ancestry
/// is excluded as a parent, because the outgoing reference is not strong.
const WEAK_REFERENCE_CLASSES: [&str; 5] = [
    "WeakReference",
    "SoftReference",
    "PhantomReference",
    "FinalizerReference",
    "Cleaner",
];

/// Whether instances of `class_name` are leaves (String, boxed primitives).
pub fn is_leaf_instance_class(class_name: &str) -> bool {
    LEAF_INSTANCE_CLASSES.contains(&simple_name(class_name))
}

/// Whether `class_name` is a leaf array class (`String[]`).
pub fn is_leaf_array_class(class_name: &str) -> bool {
    LEAF_ARRAY_CLASSES.contains(&simple_name(class_name))
}

/// Whether an ancestry chain passes through the weak-reference machinery.
pub fn is_weak_reference<'a>(
    ancestry: impl IntoIterator<Item = &'a str>,
) -> bool {
    ancestry
        .into_iter()
        .any(|name| WEAK_REFERENCE_CLASSES.contains(&simple_name(name)))
}

/// Whether the object behind `id` carries no interesting inbound path and
/// must not become an index child.
///
/// Covers primitive arrays, leaf instance classes and leaf array classes.
/// Dangling ids are not leaves; the builder drops them separately.
pub fn is_leaf_child(graph: &dyn HeapGraph, id: ObjectId) -> bool {
    match graph.resolve(id) {
        Some(HeapNode::PrimitiveArray) => true,
        Some(HeapNode::Instance { class_name, .. }) => {
            is_leaf_instance_class(class_name)
        }
        Some(HeapNode::ObjectArray { class_name, .. }) => {
            is_leaf_array_class(class_name)
        }
        Some(HeapNode::ClassObject { .. }) | None => false,
    }
}

#[cfg(test)]
mod tests {
    use leaks_snapshot::MemoryGraph;

    use super::*;

    #[test]
    fn boxed_primitives_and_string_are_leaf_instances() {
        assert!(is_leaf_instance_class("java.lang.String"));
        assert!(is_leaf_instance_class("java.lang.Integer"));
        assert!(is_leaf_instance_class("java.lang.Character"));
        assert!(!is_leaf_instance_class("java.lang.Object"));
        assert!(!is_leaf_instance_class("com.app.StringHolder"));
    }

    #[test]
    fn string_array_is_the_only_leaf_array() {
        assert!(is_leaf_array_class("java.lang.String[]"));
        assert!(!is_leaf_array_class("java.lang.Object[]"));
        assert!(!is_leaf_array_class("java.lang.String"));
    }

    #[test]
    fn weak_reference_hierarchy_matches_anywhere_in_ancestry() {
        assert!(is_weak_reference(vec![
            "com.app.CacheEntry",
            "java.lang.ref.SoftReference",
            "java.lang.ref.Reference",
        ]));
        assert!(is_weak_reference(vec!["sun.misc.Cleaner"]));
        assert!(!is_weak_reference(vec![
            "com.app.CacheEntry",
            "java.lang.Object"
        ]));
    }

    #[test]
    fn leaf_children_cover_all_three_shapes() {
        let mut b = MemoryGraph::builder();
        b.instance(1, "java.lang.String", &[]);
        b.instance(2, "com.app.Node", &[]);
        b.object_array(3, "java.lang.String[]", &[1]);
        b.object_array(4, "java.lang.Object[]", &[2]);
        b.primitive_array(5);
        b.class_object(6, "com.app.Node", &[]);
        let g = b.build();

        assert!(is_leaf_child(&g, ObjectId(1)));
        assert!(!is_leaf_child(&g, ObjectId(2)));
        assert!(is_leaf_child(&g, ObjectId(3)));
        assert!(!is_leaf_child(&g, ObjectId(4)));
        assert!(is_leaf_child(&g, ObjectId(5)));
        assert!(!is_leaf_child(&g, ObjectId(6)));
        // Dangling ids are handled by the existence check, not here.
        assert!(!is_leaf_child(&g, ObjectId(99)));
    }
}
