//! Output file format: header, one block per emitted
//! group, footer. Formatting is pure string-building; the only shared
//! mutable state it touches is the `Mutex`-guarded writer itself.

use std::io::Write;
use std::sync::Mutex;

use crate::index::Index;

/// One emitted group: its member coordinates plus the centroid and
/// max-member-distance already computed by [`crate::enumerate`].
pub struct Group<'a> {
    pub members: &'a [(i32, i32)],
    pub centroid: (f64, f64),
    pub max_dist: f64,
}

impl<'a> Group<'a> {
    pub fn format(&self) -> String {
        let mut s = String::new();
        s.push_str(&format!("Group of {}:\n", self.members.len()));
        for &(x, z) in self.members {
            s.push_str(&format!("  ({}, {})\n", x, z));
        }
        let spawn_dist = (self.centroid.0 * self.centroid.0 + self.centroid.1 * self.centroid.1).sqrt();
        s.push_str(&format!("  Center: ({:.1}, {:.1})\n", self.centroid.0, self.centroid.1));
        s.push_str(&format!("  Max distance from center: {:.1} blocks\n", self.max_dist));
        s.push_str(&format!("  Distance from spawn: {:.1} blocks\n\n", spawn_dist));
        s
    }
}

/// Serialized writer around the output file: every group emission
/// takes the lock, formats, writes, and releases — group density is
/// low relative to candidate work, so one shared lock is an
/// acceptable bottleneck.
pub struct ReportWriter<W: Write> {
    inner: Mutex<W>,
}

impl<W: Write> ReportWriter<W> {
    pub fn new(inner: W) -> Self {
        ReportWriter { inner: Mutex::new(inner) }
    }

    pub fn write_header(&self, radius: i64, input_path: &str, structure_count: u64) -> std::io::Result<()> {
        let mut guard = self.inner.lock().expect("report writer mutex poisoned");
        writeln!(guard, "Structure groups within {} block radius", radius)?;
        writeln!(guard, "Input: {}", input_path)?;
        writeln!(guard, "Structures: {}\n", structure_count)
    }

    pub fn emit_group(&self, index: &Index, member_indices: &[u32], centroid: (f64, f64), max_dist: f64) -> std::io::Result<()> {
        let coords: Vec<(i32, i32)> = member_indices.iter().map(|&i| index.coords(i as usize)).collect();
        let group = Group { members: &coords, centroid, max_dist };
        let mut guard = self.inner.lock().expect("report writer mutex poisoned");
        guard.write_all(group.format().as_bytes())
    }

    pub fn write_summary(&self, groups_of_3: u64, groups_of_4: u64) -> std::io::Result<()> {
        let mut guard = self.inner.lock().expect("report writer mutex poisoned");
        writeln!(guard, "\n=== Summary ===")?;
        writeln!(guard, "Groups of 3: {}", groups_of_3)?;
        writeln!(guard, "Groups of 4: {}", groups_of_4)
    }

    pub fn flush(&self) -> std::io::Result<()> {
        self.inner.lock().expect("report writer mutex poisoned").flush()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_group_with_one_decimal_fields() {
        let group = Group {
            members: &[(0, 0), (2, 0), (1, 1)],
            centroid: (1.0, 0.333_333),
            max_dist: 1.054_093,
        };
        let text = group.format();
        assert!(text.starts_with("Group of 3:\n"));
        assert!(text.contains("  (0, 0)\n"));
        assert!(text.contains("Center: (1.0, 0.3)\n"));
        assert!(text.contains("Max distance from center: 1.1 blocks\n"));
        assert!(text.contains("Distance from spawn:"));
    }

    #[test]
    fn header_and_summary_round_trip_through_buffer() {
        let writer = ReportWriter::new(Vec::new());
        writer.write_header(128, "points.txt", 42).unwrap();
        writer.write_summary(3, 1).unwrap();
        let buf = writer.inner.into_inner().unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert!(text.starts_with("Structure groups within 128 block radius\n"));
        assert!(text.contains("Input: points.txt\n"));
        assert!(text.contains("Structures: 42\n"));
        assert!(text.contains("Groups of 3: 3\n"));
        assert!(text.contains("Groups of 4: 1\n"));
    }
}
