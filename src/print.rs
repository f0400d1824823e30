//! Renderings of records for the screen and for hard copy.
//!
//! The result list shows a [`CompactCard`] per record; printing uses a
//! [`PrintDocument`] made of one [`PrintBlock`] per record. The two are built
//! by separate functions and never mixed: the terminal only draws cards and
//! the print sinks only receive documents.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use time::macros::format_description;
use time::OffsetDateTime;

use crate::config::{CommandExec, PrintConfig};
use crate::record::Record;

/// Caption language for cards, the detail modal and printouts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelSet {
    English,
    Marathi,
}

impl FromStr for LabelSet {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "english" | "en" => Ok(LabelSet::English),
            "marathi" | "mr" => Ok(LabelSet::Marathi),
            _ => bail!("expected \"english\" or \"marathi\", got \"{}\"", s),
        }
    }
}

impl LabelSet {

    pub fn name(self) -> &'static str {
        match self {
            LabelSet::English => "Name",
            LabelSet::Marathi => "नाव",
        }
    }

    pub fn house(self) -> &'static str {
        match self {
            LabelSet::English => "House No",
            LabelSet::Marathi => "घर क्रमांक",
        }
    }

    pub fn relation_type(self) -> &'static str {
        match self {
            LabelSet::English => "Relation",
            LabelSet::Marathi => "नाते प्रकार",
        }
    }

    pub fn relation_name(self) -> &'static str {
        match self {
            LabelSet::English => "Relative Name",
            LabelSet::Marathi => "नाते",
        }
    }

    pub fn age(self) -> &'static str {
        match self {
            LabelSet::English => "Age",
            LabelSet::Marathi => "वय",
        }
    }

    pub fn gender(self) -> &'static str {
        match self {
            LabelSet::English => "Gender",
            LabelSet::Marathi => "लिंग",
        }
    }

    pub fn id(self) -> &'static str {
        "EPIC"
    }

    pub fn serial(self) -> &'static str {
        match self {
            LabelSet::English => "Serial No",
            LabelSet::Marathi => "अनुक्रमांक",
        }
    }

    pub fn source_page(self) -> &'static str {
        match self {
            LabelSet::English => "Source Page",
            LabelSet::Marathi => "पान",
        }
    }
}

/// Label/value pair shown in the detail modal and in printouts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: &'static str,
    pub value: String,
}

impl Field {
    fn new(label: &'static str, value: impl Into<String>) -> Self {
        Self {
            label,
            value: value.into(),
        }
    }
}

/// What a result row shows on screen: the name plus house number and age.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompactCard {
    pub title: String,
    pub subtitle: String,
}

pub fn compact_card(record: &Record, labels: LabelSet) -> CompactCard {
    CompactCard {
        title: record.full_name.clone(),
        subtitle: format!(
            "{}: {} • {}: {}",
            labels.house(),
            record.house_no,
            labels.age(),
            record.age
        ),
    }
}

/// Fields of the detail modal; the name is its title.
pub fn detail_fields(record: &Record, labels: LabelSet) -> Vec<Field> {
    let mut fields = vec![
        Field::new(labels.house(), &record.house_no),
        Field::new(labels.relation_name(), &record.relation_name),
        Field::new(labels.relation_type(), &record.relation_type),
        Field::new(labels.age(), record.age.to_string()),
        Field::new(labels.gender(), &record.gender),
        Field::new(labels.id(), &record.id),
        Field::new(labels.serial(), record.serial_no.to_string()),
    ];
    if let Some(page) = record.source_page {
        fields.push(Field::new(labels.source_page(), page.to_string()));
    }
    fields
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintBlock {
    pub fields: Vec<Field>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintDocument {
    pub title: String,
    pub blocks: Vec<PrintBlock>,
}

impl PrintDocument {
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Plain text for a printer: title, then one block per record separated
    /// by blank lines, labels padded to a common width.
    pub fn to_text(&self) -> String {
        let label_width = self
            .blocks
            .iter()
            .flat_map(|block| block.fields.iter())
            .map(|field| field.label.chars().count())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        out.push_str(&self.title);
        out.push('\n');
        for block in &self.blocks {
            out.push('\n');
            for field in &block.fields {
                let pad = label_width - field.label.chars().count();
                out.push_str(field.label);
                out.push(':');
                out.push_str(&" ".repeat(pad + 1));
                out.push_str(&field.value);
                out.push('\n');
            }
        }
        out
    }
}

/// Every field of every record, in the order given.
pub fn render_print_view<'r, I>(records: I, labels: LabelSet) -> PrintDocument
where
    I: IntoIterator<Item = &'r Record>,
{
    let blocks: Vec<PrintBlock> = records
        .into_iter()
        .map(|record| {
            let mut fields = vec![
                Field::new(labels.name(), &record.full_name),
                Field::new(labels.house(), &record.house_no),
                Field::new(labels.relation_type(), &record.relation_type),
                Field::new(labels.relation_name(), &record.relation_name),
                Field::new(labels.age(), record.age.to_string()),
                Field::new(labels.gender(), &record.gender),
                Field::new(labels.id(), &record.id),
                Field::new(labels.serial(), record.serial_no.to_string()),
            ];
            if let Some(page) = record.source_page {
                fields.push(Field::new(labels.source_page(), page.to_string()));
            }
            PrintBlock { fields }
        })
        .collect();

    let title = match labels {
        LabelSet::English => format!("Voter List ({} records)", blocks.len()),
        LabelSet::Marathi => format!("मतदार यादी ({} नोंदी)", blocks.len()),
    };

    PrintDocument { title, blocks }
}

// =============================================================================
// Print sinks
// =============================================================================

/// Destination that turns a document into hard copy.
pub trait PrintSink {
    /// Short human-readable destination, for status messages.
    fn describe(&self) -> String;

    fn print(&self, document: &PrintDocument) -> Result<()>;
}

/// Pipes the document into a program such as `lp`.
pub struct CommandSink {
    command: CommandExec,
}

impl CommandSink {
    pub fn new(command: CommandExec) -> Self {
        Self { command }
    }
}

impl PrintSink for CommandSink {
    fn describe(&self) -> String {
        format!("`{}`", self.command.program)
    }

    fn print(&self, document: &PrintDocument) -> Result<()> {
        let mut child = Command::new(&self.command.program)
            .args(&self.command.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .with_context(|| format!("failed to spawn `{}`", self.command.program))?;

        // The child is reaped even when it stops reading early.
        let written = match child.stdin.take() {
            Some(mut stdin) => stdin.write_all(document.to_text().as_bytes()),
            None => Ok(()),
        };

        let output = child
            .wait_with_output()
            .with_context(|| format!("failed to wait for `{}`", self.command.program))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            match stderr.trim() {
                "" => bail!("`{}` exited with {}", self.command.program, output.status),
                msg => bail!("`{}` exited with {}: {}", self.command.program, output.status, msg),
            }
        }

        written.with_context(|| format!("failed to send document to `{}`", self.command.program))
    }
}

/// Writes the document to a file, creating parent directories.
pub struct FileSink {
    path: PathBuf,
}

impl FileSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl PrintSink for FileSink {
    fn describe(&self) -> String {
        self.path.display().to_string()
    }

    fn print(&self, document: &PrintDocument) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        fs::write(&self.path, document.to_text())
            .with_context(|| format!("failed to write {}", self.path.display()))
    }
}

/// Sink for the configured destination: the command if any, then the output
/// file, then a timestamped file under `data_dir/print`.
pub fn sink_for(config: &PrintConfig, data_dir: &Path) -> Box<dyn PrintSink> {
    if let Some(command) = &config.command {
        return Box::new(CommandSink::new(command.clone()));
    }
    if let Some(output) = &config.output {
        return Box::new(FileSink::new(output.clone()));
    }
    Box::new(FileSink::new(default_output_path(data_dir, OffsetDateTime::now_utc())))
}

fn default_output_path(data_dir: &Path, now: OffsetDateTime) -> PathBuf {
    let format = format_description!("[year][month][day]-[hour][minute][second]");
    let stamp = now
        .format(&format)
        .unwrap_or_else(|_| now.unix_timestamp().to_string());
    data_dir.join("print").join(format!("results-{stamp}.txt"))
}
