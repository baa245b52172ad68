use lopdf::Object;
use quick_xml::events::Event;
use quick_xml::Reader;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("ZIP error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("XML error: {0}")]
    Xml(String),

    #[error("{0} is not valid UTF-8 text")]
    Utf8(PathBuf),
}

pub type Result<T> = std::result::Result<T, IngestError>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "format", rename_all = "lowercase")]
pub enum DocumentMetadata {
    /// Entries of the trailer `Info` dictionary (Title, Author, ...).
    Pdf { info: BTreeMap<String, String> },
    Docx { paragraphs: usize },
    Text,
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestedDocument {
    pub path: PathBuf,
    pub text: String,
    pub metadata: DocumentMetadata,
}

impl IngestedDocument {
    /// File name without directories, used as a display title.
    pub fn title(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

const DIR_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "txt", "md"];

/// Extract text and metadata from a file, picking the reader by extension.
pub fn ingest<P: AsRef<Path>>(path: P) -> Result<IngestedDocument> {
    let path = path.as_ref();
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
        .unwrap_or_default();

    let (text, metadata) = match ext.as_str() {
        "pdf" => {
            let bytes = fs::read(path)?;
            let text = pdf_extract::extract_text_from_mem(&bytes).map_err(|e| IngestError::Pdf(e.to_string()))?;
            (text, DocumentMetadata::Pdf { info: pdf_info(&bytes)? })
        }
        "doc" | "docx" => {
            let paragraphs = read_docx_paragraphs(path)?;
            let count = paragraphs.len();
            (paragraphs.join("\n"), DocumentMetadata::Docx { paragraphs: count })
        }
        _ => (read_text(path)?, DocumentMetadata::Text),
    };
    tracing::debug!(path = %path.display(), chars = text.len(), "extracted document");
    Ok(IngestedDocument { path: path.to_path_buf(), text, metadata })
}

/// Ingest every supported file below `dir` in path order. Files that fail to
/// extract are logged and skipped.
pub fn load_dir<P: AsRef<Path>>(dir: P) -> Result<Vec<IngestedDocument>> {
    let dir = dir.as_ref();
    if !dir.is_dir() {
        return Err(IngestError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            format!("{} is not a directory", dir.display()),
        )));
    }
    let mut files: Vec<PathBuf> = Vec::new();
    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        let p = entry.path();
        if p.is_file() {
            if let Some(ext) = p.extension().and_then(|s| s.to_str()) {
                if DIR_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()) {
                    files.push(p.to_path_buf());
                }
            }
        }
    }
    files.sort();

    let mut docs = Vec::with_capacity(files.len());
    for file in files {
        match ingest(&file) {
            Ok(doc) => docs.push(doc),
            Err(err) => tracing::warn!(path = %file.display(), error = %err, "skipping document"),
        }
    }
    tracing::info!(dir = %dir.display(), num_docs = docs.len(), "loaded documents");
    Ok(docs)
}

/// Document information dictionary of a PDF. Files without one give an empty map.
pub fn pdf_info(bytes: &[u8]) -> Result<BTreeMap<String, String>> {
    let doc = lopdf::Document::load_mem(bytes).map_err(|e| IngestError::Pdf(e.to_string()))?;
    let info = match doc.trailer.get(b"Info") {
        Ok(Object::Reference(id)) => doc.get_object(*id).and_then(Object::as_dict).ok(),
        Ok(obj) => obj.as_dict().ok(),
        Err(_) => None,
    };
    let Some(info) = info else { return Ok(BTreeMap::new()) };

    let mut out = BTreeMap::new();
    for (key, value) in info.iter() {
        let value = match value {
            Object::Reference(id) => doc.get_object(*id).ok(),
            other => Some(other),
        };
        let text = match value {
            Some(Object::String(raw, _)) => decode_text_string(raw),
            Some(Object::Name(name)) => String::from_utf8_lossy(name).into_owned(),
            Some(Object::Integer(i)) => i.to_string(),
            Some(Object::Boolean(b)) => b.to_string(),
            _ => continue,
        };
        out.insert(String::from_utf8_lossy(key).into_owned(), text);
    }
    Ok(out)
}

// PDF text strings are UTF-16BE behind a byte order mark, otherwise single-byte.
fn decode_text_string(raw: &[u8]) -> String {
    match raw {
        [0xFE, 0xFF, rest @ ..] => {
            let units: Vec<u16> = rest.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
            String::from_utf16_lossy(&units)
        }
        _ => raw.iter().map(|&b| b as char).collect(),
    }
}

fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path)?;
    String::from_utf8(bytes).map_err(|_| IngestError::Utf8(path.to_path_buf()))
}

/// Paragraph texts of a Word document's main body (`word/document.xml`).
fn read_docx_paragraphs(path: &Path) -> Result<Vec<String>> {
    let mut archive = zip::ZipArchive::new(File::open(path)?)?;
    let mut xml = String::new();
    archive.by_name("word/document.xml")?.read_to_string(&mut xml)?;
    parse_document_xml(&xml)
}

fn parse_document_xml(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    let mut paragraphs: Vec<String> = Vec::new();
    // Indices of open paragraphs; text boxes nest a paragraph inside another.
    let mut open: Vec<usize> = Vec::new();
    let mut in_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => match e.name().as_ref() {
                b"w:p" => {
                    open.push(paragraphs.len());
                    paragraphs.push(String::new());
                }
                b"w:t" => in_text = true,
                _ => {}
            },
            Ok(Event::Empty(e)) => match e.name().as_ref() {
                b"w:p" => paragraphs.push(String::new()),
                b"w:tab" => push_text(&mut paragraphs, &open, "\t"),
                b"w:br" | b"w:cr" => push_text(&mut paragraphs, &open, "\n"),
                _ => {}
            },
            Ok(Event::Text(t)) if in_text => {
                let text = t.unescape().map_err(|e| IngestError::Xml(e.to_string()))?;
                push_text(&mut paragraphs, &open, &text);
            }
            Ok(Event::End(e)) => match e.name().as_ref() {
                b"w:p" => {
                    open.pop();
                }
                b"w:t" => in_text = false,
                _ => {}
            },
            Ok(Event::Eof) => break,
            Err(e) => return Err(IngestError::Xml(format!("at position {}: {e}", reader.buffer_position()))),
            _ => {}
        }
    }
    Ok(paragraphs)
}

fn push_text(paragraphs: &mut [String], open: &[usize], text: &str) {
    if let Some(&i) = open.last() {
        paragraphs[i].push_str(text);
    }
}
