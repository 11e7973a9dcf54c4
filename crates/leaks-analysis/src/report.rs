//! Report rendering.
//!
//! The report goes to stdout and nothing else does; all diagnostics go to
//! stderr through tracing. Header lines carry snapshot metadata, then one
//! section per group in sorted order, then the dependent groups.

use std::io::{self, Write};

use chrono::{Local, LocalResult, TimeZone};
use itertools::Itertools;
use leaks_snapshot::{ObjectId, SnapshotInfo};

use crate::edges::PathStep;
use crate::group::{DependentGroup, PathGroup};

pub(crate) fn render_report(
    out: &mut dyn Write,
    info: &SnapshotInfo,
    groups: &[PathGroup],
    dependents: &[DependentGroup],
) -> io::Result<()> {
    writeln!(out, "# leaks-collector {}", env!("CARGO_PKG_VERSION"))?;
    writeln!(out, "# File: {}", info.path.display())?;
    writeln!(
        out,
        "# Size: {:.1} MB",
        info.file_size as f64 / (1024.0 * 1024.0)
    )?;
    writeln!(
        out,
        "# Heap dump timestamp: {}",
        format_timestamp(info.timestamp_ms)
    )?;
    writeln!(out, "# Hprof version: {}", info.format_version)?;
    writeln!(out, "# JVM pointer size: {}-bit", info.id_size * 8)?;
    writeln!(
        out,
        "# Objects: {} ({} classes, {} instances, {} object arrays, {} primitive arrays)",
        info.object_count(),
        info.class_count,
        info.instance_count,
        info.object_array_count,
        info.primitive_array_count,
    )?;
    writeln!(out, "# GC roots: {}", info.root_count)?;

    for group in groups {
        writeln!(out)?;
        writeln!(out, "# {}", group_title(target_class(group), &group.targets))?;
        writeln!(
            out,
            "{}",
            group.exemplar.iter().map(PathStep::rendered).join(" -> ")
        )?;
    }

    for dependent in dependents {
        writeln!(out)?;
        writeln!(
            out,
            "# {} — held by a path above",
            group_title(&dependent.class, &dependent.targets)
        )?;
    }

    Ok(())
}

/// `Class@id` for a single instance, `Class (N instances)` otherwise.
fn group_title(class: &str, targets: &[ObjectId]) -> String {
    match targets {
        [single] => format!("{class}@{single}"),
        many => format!("{class} ({} instances)", many.len()),
    }
}

/// The group's class is the terminal step of its exemplar.
fn target_class(group: &PathGroup) -> &str {
    match group.exemplar.last() {
        Some(PathStep::Target { class, .. }) => class,
        _ => "?",
    }
}

fn format_timestamp(timestamp_ms: u64) -> String {
    match Local.timestamp_millis_opt(timestamp_ms as i64) {
        LocalResult::Single(dt) => dt.format("%Y-%m-%d %H:%M:%S %Z").to_string(),
        _ => "unknown".to_string(),
    }
}
