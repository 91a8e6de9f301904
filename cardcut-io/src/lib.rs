use std::fs;
use std::path::Path;

use cardcut_core::cut::CutDocument;
use thiserror::Error;

mod reader;
mod writer;

pub use writer::{COORDINATE_PRECISION, DxfWriter};

#[derive(Debug, Error)]
pub enum IoError {
    #[error("unsupported cut file content: {0}")]
    UnsupportedFeature(String),
    #[error("failed to read cut file {path:?}: {source}")]
    ReadError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write cut file {path:?}: {source}")]
    WriteError {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed cut file: {0}")]
    InvalidDocument(String),
}

pub trait DocumentLoader {
    fn load(&self, path: &Path) -> Result<CutDocument, IoError>;
}

pub trait DocumentSaver {
    fn save(&self, document: &CutDocument, path: &Path) -> Result<(), IoError>;
}

/// DXF 读写入口：写出切割机可识别的最小 DXF，读回时仅解析 LWPOLYLINE / LINE。
pub struct DxfFacade {
    writer: DxfWriter,
}

impl DxfFacade {
    pub fn new() -> Self {
        Self {
            writer: DxfWriter::new(),
        }
    }

    /// 直接从内存中的 DXF 文本解析切割文档。
    pub fn parse_str(&self, source: &str) -> Result<CutDocument, IoError> {
        reader::read_cut_document(source)
    }

    #[inline]
    pub fn to_dxf_string(&self, document: &CutDocument) -> String {
        self.writer.write_string(document)
    }
}

impl Default for DxfFacade {
    fn default() -> Self {
        Self::new()
    }
}

impl DocumentLoader for DxfFacade {
    fn load(&self, path: &Path) -> Result<CutDocument, IoError> {
        let data = fs::read_to_string(path).map_err(|source| IoError::ReadError {
            path: path.to_path_buf(),
            source,
        })?;
        self.parse_str(&data)
    }
}

impl DocumentSaver for DxfFacade {
    fn save(&self, document: &CutDocument, path: &Path) -> Result<(), IoError> {
        fs::write(path, self.to_dxf_string(document)).map_err(|source| IoError::WriteError {
            path: path.to_path_buf(),
            source,
        })
    }
}
