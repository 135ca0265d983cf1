//! LDIF content-record writer.

use std::io::{self, Write};

use acct_model::DirectoryEntry;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::encoding::{Base64Policy, LdifValue};

/// Default maximum line length before folding.
pub const DEFAULT_LINE_WIDTH: usize = 76;

/// Writes directory entries as LDIF content records.
///
/// Each record is a `dn:` line followed by one line per attribute value;
/// records are separated by a blank line. Long lines are folded with a
/// single leading space on each continuation.
#[derive(Debug)]
pub struct LdifWriter<W: Write> {
    out: W,
    policy: Base64Policy,
    line_width: usize,
    records: usize,
}

impl<W: Write> LdifWriter<W> {
    /// Creates a writer with the default policy and line width.
    pub fn new(out: W) -> Self {
        Self {
            out,
            policy: Base64Policy::default(),
            line_width: DEFAULT_LINE_WIDTH,
            records: 0,
        }
    }

    /// Replaces the base64 policy.
    #[must_use]
    pub fn with_policy(mut self, policy: Base64Policy) -> Self {
        self.policy = policy;
        self
    }

    /// Sets the folding width. Zero disables folding.
    #[must_use]
    pub const fn with_line_width(mut self, width: usize) -> Self {
        self.line_width = width;
        self
    }

    /// Number of records written so far.
    #[must_use]
    pub const fn records_written(&self) -> usize {
        self.records
    }

    /// Writes one entry. Text attributes come first, then binary ones,
    /// each group in attribute-name order.
    pub fn write_entry(&mut self, entry: &DirectoryEntry) -> io::Result<()> {
        if self.records > 0 {
            self.out.write_all(b"\n")?;
        }
        self.write_value("dn", LdifValue::Text(&entry.dn))?;
        for (name, values) in &entry.attributes {
            for value in values {
                self.write_value(name, LdifValue::Text(value))?;
            }
        }
        for (name, values) in &entry.binary_attributes {
            for value in values {
                self.write_value(name, LdifValue::Bytes(value))?;
            }
        }
        self.records += 1;
        Ok(())
    }

    /// Writes every entry in order.
    pub fn write_all<'e>(
        &mut self,
        entries: impl IntoIterator<Item = &'e DirectoryEntry>,
    ) -> io::Result<()> {
        for entry in entries {
            self.write_entry(entry)?;
        }
        Ok(())
    }

    /// Flushes and returns the underlying writer.
    pub fn into_inner(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }

    fn write_value(&mut self, name: &str, value: LdifValue<'_>) -> io::Result<()> {
        let line = if self.policy.needs_base64(name, value) {
            format!("{name}:: {}", STANDARD.encode(value.as_bytes()))
        } else {
            // Only `dn` and safe values reach here, and those are UTF-8.
            format!("{name}: {}", String::from_utf8_lossy(value.as_bytes()))
        };
        for segment in fold(&line, self.line_width) {
            self.out.write_all(segment.as_bytes())?;
            self.out.write_all(b"\n")?;
        }
        Ok(())
    }
}

/// Splits a logical line into physical lines of at most `width` characters,
/// continuation lines carrying a leading space.
fn fold(line: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = line.chars().collect();
    if width < 2 || chars.len() <= width {
        return vec![line.to_string()];
    }
    let mut lines = vec![chars[..width].iter().collect::<String>()];
    for chunk in chars[width..].chunks(width - 1) {
        let mut continuation = String::with_capacity(width);
        continuation.push(' ');
        continuation.extend(chunk);
        lines.push(continuation);
    }
    lines
}

/// Renders entries to an LDIF string.
pub fn to_ldif_string(entries: &[DirectoryEntry], policy: &Base64Policy) -> io::Result<String> {
    let mut writer = LdifWriter::new(Vec::new()).with_policy(policy.clone());
    writer.write_all(entries)?;
    let out = writer.into_inner()?;
    String::from_utf8(out).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
}
