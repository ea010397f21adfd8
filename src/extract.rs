//! File text extraction.
//!
//! [`FileExtractor`] implements [`TextExtractor`] for the file types ragbase
//! indexes. Each file type maps to an ordered chain of strategies; the first
//! strategy that produces non-blank text wins:
//!
//! | Strategy | Applies to |
//! |----------|------------|
//! | `plain-text` | text and source-code extensions (lossy UTF-8) |
//! | `pdf` | `.pdf` via `pdf-extract` |
//! | `ooxml` | `.docx`, `.pptx`, `.xlsx` via `zip` + `quick-xml` |
//! | `external-tool` | `pdftotext`, `pandoc`, `tesseract` when enabled |
//! | `raw-bytes` | printable runs from any non-image file |

use std::io::Read;
use std::path::Path;
use std::process::Command;

use ragbase_core::{ExtractError, TextExtractor};
use tracing::debug;

use crate::config::ExtractionConfig;

/// Plain-text and source-code extensions.
pub const TEXT_EXTENSIONS: &[&str] = &[
    "txt", "md", "markdown", "html", "htm", "json", "csv", "log", "xml", "yaml", "yml", "go",
    "py", "js", "ts", "java", "c", "cpp", "h", "rb", "php", "rs", "swift", "kt",
];

/// Office and document formats.
pub const DOCUMENT_EXTENSIONS: &[&str] = &["pdf", "docx", "pptx", "xlsx", "doc", "rtf", "odt"];

/// Image formats, extracted by OCR only.
pub const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "tif", "tiff"];

/// Maximum sheets to process in an xlsx.
const XLSX_MAX_SHEETS: usize = 100;
/// Maximum cells to process per sheet.
const XLSX_MAX_CELLS_PER_SHEET: usize = 100_000;
/// Maximum decompressed bytes to read from a single ZIP entry.
const MAX_XML_ENTRY_BYTES: u64 = 50 * 1024 * 1024;
/// Shortest printable run kept by the raw-bytes strategy.
const MIN_PRINTABLE_RUN: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Strategy {
    PlainText,
    Pdf,
    Ooxml,
    ExternalTool,
    RawBytes,
}

impl Strategy {
    fn name(self) -> &'static str {
        match self {
            Strategy::PlainText => "plain-text",
            Strategy::Pdf => "pdf",
            Strategy::Ooxml => "ooxml",
            Strategy::ExternalTool => "external-tool",
            Strategy::RawBytes => "raw-bytes",
        }
    }
}

/// Extension-driven text extractor with a fallback chain.
#[derive(Debug, Clone)]
pub struct FileExtractor {
    external_tools: bool,
    max_file_bytes: u64,
}

impl FileExtractor {
    pub fn new(config: &ExtractionConfig) -> Self {
        Self {
            external_tools: config.external_tools,
            max_file_bytes: config.max_file_bytes,
        }
    }

    fn strategies(&self, ext: &str) -> Vec<Strategy> {
        let mut chain = match ext {
            "pdf" => vec![Strategy::Pdf, Strategy::ExternalTool, Strategy::RawBytes],
            "docx" | "pptx" | "xlsx" => {
                vec![Strategy::Ooxml, Strategy::ExternalTool, Strategy::RawBytes]
            }
            "doc" | "rtf" | "odt" => vec![Strategy::ExternalTool, Strategy::RawBytes],
            e if IMAGE_EXTENSIONS.contains(&e) => vec![Strategy::ExternalTool],
            _ => vec![Strategy::PlainText],
        };
        if !self.external_tools {
            chain.retain(|s| *s != Strategy::ExternalTool);
        }
        chain
    }

    fn run(
        &self,
        strategy: Strategy,
        path: &Path,
        ext: &str,
        bytes: &[u8],
    ) -> Result<String, ExtractError> {
        match strategy {
            Strategy::PlainText => Ok(String::from_utf8_lossy(bytes).into_owned()),
            Strategy::Pdf => extract_pdf(bytes),
            Strategy::Ooxml => extract_ooxml(bytes, ext),
            Strategy::ExternalTool => run_external_tool(path, ext),
            Strategy::RawBytes => Ok(printable_runs(bytes)),
        }
    }
}

impl TextExtractor for FileExtractor {
    fn supports(&self, path: &Path) -> bool {
        extension_of(path).is_some_and(|ext| is_supported_extension(&ext))
    }

    fn extract(&self, path: &Path) -> Result<String, ExtractError> {
        let ext = extension_of(path)
            .filter(|ext| is_supported_extension(ext))
            .ok_or_else(|| ExtractError::Unsupported(path.display().to_string()))?;

        let size = std::fs::metadata(path)?.len();
        if size > self.max_file_bytes {
            return Err(ExtractError::TooLarge {
                size,
                limit: self.max_file_bytes,
            });
        }
        let bytes = std::fs::read(path)?;

        let mut last_err = None;
        for strategy in self.strategies(&ext) {
            match self.run(strategy, path, &ext, &bytes) {
                Ok(text) if !text.trim().is_empty() => {
                    debug!("extracted {} with {}", path.display(), strategy.name());
                    return Ok(text);
                }
                Ok(_) => debug!("{} produced no text for {}", strategy.name(), path.display()),
                Err(e) => {
                    debug!("{} failed for {}: {}", strategy.name(), path.display(), e);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or(ExtractError::NoText))
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension().map(|e| e.to_string_lossy().to_lowercase())
}

pub fn is_supported_extension(ext: &str) -> bool {
    TEXT_EXTENSIONS.contains(&ext)
        || DOCUMENT_EXTENSIONS.contains(&ext)
        || IMAGE_EXTENSIONS.contains(&ext)
}

fn extract_pdf(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed inputs.
    std::panic::catch_unwind(|| pdf_extract::extract_text_from_mem(bytes))
        .map_err(|_| ExtractError::Pdf("parser panicked".to_string()))?
        .map_err(|e| ExtractError::Pdf(e.to_string()))
}

fn run_external_tool(path: &Path, ext: &str) -> Result<String, ExtractError> {
    let mut command = match ext {
        "pdf" => {
            let mut c = Command::new("pdftotext");
            c.arg("-layout").arg(path).arg("-");
            c
        }
        e if IMAGE_EXTENSIONS.contains(&e) => {
            let mut c = Command::new("tesseract");
            c.arg(path).arg("stdout");
            c
        }
        _ => {
            let mut c = Command::new("pandoc");
            c.arg("-t").arg("plain").arg(path);
            c
        }
    };
    let tool = command.get_program().to_string_lossy().to_string();

    let output = command.output().map_err(|e| ExtractError::Tool {
        tool: tool.clone(),
        message: if e.kind() == std::io::ErrorKind::NotFound {
            "not installed".to_string()
        } else {
            e.to_string()
        },
    })?;
    if !output.status.success() {
        return Err(ExtractError::Tool {
            tool,
            message: String::from_utf8_lossy(&output.stderr).trim().to_string(),
        });
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

/// Printable ASCII runs of at least [`MIN_PRINTABLE_RUN`] bytes, one per line.
fn printable_runs(bytes: &[u8]) -> String {
    let mut runs = Vec::new();
    let mut current = String::new();
    for &b in bytes {
        if b == b' ' || b == b'\t' || b.is_ascii_graphic() {
            current.push(b as char);
        } else {
            if current.trim().len() >= MIN_PRINTABLE_RUN {
                runs.push(current.trim().to_string());
            }
            current.clear();
        }
    }
    if current.trim().len() >= MIN_PRINTABLE_RUN {
        runs.push(current.trim().to_string());
    }
    runs.join("\n")
}

type Archive<'a> = zip::ZipArchive<std::io::Cursor<&'a [u8]>>;

fn extract_ooxml(bytes: &[u8], ext: &str) -> Result<String, ExtractError> {
    let mut archive = zip::ZipArchive::new(std::io::Cursor::new(bytes))
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    match ext {
        "docx" => extract_docx(&mut archive),
        "pptx" => extract_pptx(&mut archive),
        "xlsx" => extract_xlsx(&mut archive),
        other => Err(ExtractError::Unsupported(other.to_string())),
    }
}

fn read_zip_entry_bounded(
    archive: &mut Archive<'_>,
    name: &str,
    max_bytes: u64,
) -> Result<Vec<u8>, ExtractError> {
    let entry = archive
        .by_name(name)
        .map_err(|e| ExtractError::Ooxml(format!("{}: {}", name, e)))?;
    let mut out = Vec::new();
    entry
        .take(max_bytes)
        .read_to_end(&mut out)
        .map_err(|e| ExtractError::Ooxml(e.to_string()))?;
    if out.len() as u64 >= max_bytes {
        return Err(ExtractError::Ooxml(format!(
            "ZIP entry {} exceeds size limit ({} bytes)",
            name, max_bytes
        )));
    }
    Ok(out)
}

fn extract_docx(archive: &mut Archive<'_>) -> Result<String, ExtractError> {
    let xml = read_zip_entry_bounded(archive, "word/document.xml", MAX_XML_ENTRY_BYTES)?;
    text_runs(&xml)
}

fn extract_pptx(archive: &mut Archive<'_>) -> Result<String, ExtractError> {
    let slides = numbered_entries(archive, "ppt/slides/slide");
    let mut out = String::new();
    for name in slides {
        let xml = read_zip_entry_bounded(archive, &name, MAX_XML_ENTRY_BYTES)?;
        let text = text_runs(&xml)?;
        if !out.is_empty() && !text.is_empty() {
            out.push('\n');
        }
        out.push_str(&text);
    }
    Ok(out)
}

/// Text of every `<t>` element (`w:t` in Word, `a:t` in slides), one line
/// per paragraph.
fn text_runs(xml: &[u8]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut out = String::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(false);
    let mut buf = Vec::new();
    let mut in_t = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"t" => in_t = true,
            Ok(Event::Text(te)) if in_t => {
                out.push_str(te.unescape().unwrap_or_default().as_ref());
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_t = false,
                b"p" if !out.is_empty() && !out.ends_with('\n') => out.push('\n'),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out.trim_end().to_string())
}

fn extract_xlsx(archive: &mut Archive<'_>) -> Result<String, ExtractError> {
    let shared_strings = read_shared_strings(archive)?;
    let sheets = numbered_entries(archive, "xl/worksheets/sheet");
    let mut out = String::new();
    for name in sheets.into_iter().take(XLSX_MAX_SHEETS) {
        let sheet_xml = read_zip_entry_bounded(archive, &name, MAX_XML_ENTRY_BYTES)?;
        let cells = sheet_cells(&sheet_xml, &shared_strings)?;
        if !out.is_empty() && !cells.is_empty() {
            out.push('\n');
        }
        out.push_str(&cells);
    }
    Ok(out)
}

/// Entries named `<prefix><n>.xml`, ordered by `n`.
fn numbered_entries(archive: &Archive<'_>, prefix: &str) -> Vec<String> {
    let mut names: Vec<String> = archive
        .file_names()
        .filter(|n| n.starts_with(prefix) && n.ends_with(".xml"))
        .map(|s| s.to_string())
        .collect();
    names.sort_by_key(|name| {
        name.trim_start_matches(prefix)
            .trim_end_matches(".xml")
            .parse::<u32>()
            .unwrap_or(u32::MAX)
    });
    names
}

fn read_shared_strings(archive: &mut Archive<'_>) -> Result<Vec<String>, ExtractError> {
    use quick_xml::events::Event;

    // Workbooks with only numeric cells have no shared string table.
    if archive.index_for_name("xl/sharedStrings.xml").is_none() {
        return Ok(Vec::new());
    }
    let xml = read_zip_entry_bounded(archive, "xl/sharedStrings.xml", MAX_XML_ENTRY_BYTES)?;
    let mut strings = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml.as_slice());
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut current: Option<String> = None;
    let mut in_t = false;
    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"si" => current = Some(String::new()),
                b"t" => in_t = true,
                _ => {}
            },
            Ok(Event::Text(te)) if in_t => {
                if let Some(s) = current.as_mut() {
                    s.push_str(te.unescape().unwrap_or_default().as_ref());
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"t" => in_t = false,
                b"si" => strings.extend(current.take()),
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(strings)
}

fn sheet_cells(xml: &[u8], shared_strings: &[String]) -> Result<String, ExtractError> {
    use quick_xml::events::Event;

    let mut cells: Vec<String> = Vec::new();
    let mut reader = quick_xml::Reader::from_reader(xml);
    reader.config_mut().trim_text(true);
    let mut buf = Vec::new();
    let mut in_v = false;
    let mut shared = false;
    loop {
        if cells.len() >= XLSX_MAX_CELLS_PER_SHEET {
            break;
        }
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => match e.local_name().as_ref() {
                b"c" => {
                    shared = e.attributes().any(|a| {
                        a.as_ref()
                            .map(|a| a.key.as_ref() == b"t" && a.value.as_ref() == b"s")
                            .unwrap_or(false)
                    });
                }
                b"v" => in_v = true,
                _ => {}
            },
            Ok(Event::Text(te)) if in_v => {
                let v = te.unescape().unwrap_or_default();
                let v = v.trim();
                if shared {
                    if let Some(s) = v.parse::<usize>().ok().and_then(|i| shared_strings.get(i)) {
                        cells.push(s.clone());
                    }
                } else if !v.is_empty() {
                    cells.push(v.to_string());
                }
            }
            Ok(Event::End(e)) => match e.local_name().as_ref() {
                b"v" => in_v = false,
                b"c" => shared = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(ExtractError::Ooxml(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(cells.join(" "))
}
