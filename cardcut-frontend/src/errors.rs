use std::path::PathBuf;

use cardcut_engine::errors::LayoutError;
use cardcut_io::IoError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FrontendError {
    #[error("读取牌表 {path:?} 失败: {source}")]
    DecklistIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("解析牌表 {path:?} 失败: {source}")]
    DecklistParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("牌表第 {index} 条记录 `{id}` 的数量为 0")]
    ZeroQuantity { index: usize, id: String },
    #[error(transparent)]
    Layout(#[from] LayoutError),
    #[error(transparent)]
    Io(#[from] IoError),
    #[error("写出文件 {path:?} 失败: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("序列化排版结果失败: {0}")]
    Serialize(#[source] serde_json::Error),
    #[error("输出失败: {0}")]
    Output(#[from] std::io::Error),
}
