//! Class name normalization.
//!
//! Hprof stores class names in JNI binary form (`java/lang/String`,
//! `[Ljava/lang/Object;`, `[[I`). Everything downstream works on Java
//! source form, so names are normalized exactly once, when the snapshot
//! is opened.

/// Converts a JNI binary class name to Java source form.
///
/// `java/lang/String` becomes `java.lang.String`, `[Ljava/lang/Object;`
/// becomes `java.lang.Object[]`, `[[I` becomes `int[][]`. Names already in
/// source form pass through unchanged.
pub fn normalize_class_name(raw: &str) -> String {
    let dims = raw.bytes().take_while(|&b| b == b'[').count();
    if dims == 0 {
        return raw.replace('/', ".");
    }
    let elem = &raw[dims..];
    let base = match elem.as_bytes().first() {
        Some(b'L') => {
            elem[1..].strip_suffix(';').unwrap_or(&elem[1..]).replace('/', ".")
        }
        Some(b'Z') if elem.len() == 1 => "boolean".to_string(),
        Some(b'B') if elem.len() == 1 => "byte".to_string(),
        Some(b'C') if elem.len() == 1 => "char".to_string(),
        Some(b'S') if elem.len() == 1 => "short".to_string(),
        Some(b'I') if elem.len() == 1 => "int".to_string(),
        Some(b'J') if elem.len() == 1 => "long".to_string(),
        Some(b'F') if elem.len() == 1 => "float".to_string(),
        Some(b'D') if elem.len() == 1 => "double".to_string(),
        // Some dumps already write `java.lang.Object[]` style names with a
        // leading bracket stripped; treat anything else as a plain name.
        _ => elem.replace('/', "."),
    };
    let mut name = base;
    for _ in 0..dims {
        name.push_str("[]");
    }
    name
}

/// The unqualified tail of a normalized class name.
///
/// `java.lang.String` yields `String`; `java.lang.String[]` yields
/// `String[]`, so array leaf classes can be matched on the simple form too.
pub fn simple_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_binary_names_get_dots() {
        assert_eq!(normalize_class_name("java/lang/String"), "java.lang.String");
        assert_eq!(normalize_class_name("Leaked"), "Leaked");
    }

    #[test]
    fn reference_arrays_render_with_brackets() {
        assert_eq!(
            normalize_class_name("[Ljava/lang/String;"),
            "java.lang.String[]"
        );
        assert_eq!(
            normalize_class_name("[[Ljava/lang/Object;"),
            "java.lang.Object[][]"
        );
    }

    #[test]
    fn primitive_arrays_render_with_element_type() {
        assert_eq!(normalize_class_name("[I"), "int[]");
        assert_eq!(normalize_class_name("[[B"), "byte[][]");
        assert_eq!(normalize_class_name("[Z"), "boolean[]");
    }

    #[test]
    fn already_normalized_names_pass_through() {
        assert_eq!(normalize_class_name("java.lang.String"), "java.lang.String");
    }

    #[test]
    fn simple_name_keeps_array_suffix() {
        assert_eq!(simple_name("java.lang.String"), "String");
        assert_eq!(simple_name("java.lang.String[]"), "String[]");
        assert_eq!(simple_name("TopLevel"), "TopLevel");
    }
}
