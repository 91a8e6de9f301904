use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::errors::ConfigurationError;

/// 纸张尺寸（排版单位，300 DPI 像素）及其支持的卡牌网格。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaperProfile {
    pub width: i32,
    pub height: i32,
    pub grids: BTreeMap<String, GridSpec>,
}

/// 卡牌尺寸（排版单位）与圆角半径（毫米）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CardTypeProfile {
    pub width: i32,
    pub height: i32,
    pub corner_radius_mm: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridSpec {
    pub rows: u32,
    pub cols: u32,
}

impl GridSpec {
    #[inline]
    pub fn new(rows: u32, cols: u32) -> Self {
        Self { rows, cols }
    }

    #[inline]
    pub fn cell_count(self) -> usize {
        self.rows as usize * self.cols as usize
    }
}

/// 一次排版所需的全部目录数据：纸张、卡型与网格。
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLayout {
    pub paper_key: String,
    pub card_type_key: String,
    pub paper_width: i32,
    pub paper_height: i32,
    pub card: CardTypeProfile,
    pub grid: GridSpec,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutCatalog {
    papers: BTreeMap<String, PaperProfile>,
    card_types: BTreeMap<String, CardTypeProfile>,
}

static BUILTIN_CATALOG: Lazy<LayoutCatalog> = Lazy::new(LayoutCatalog::builtin);

/// 进程内共享的内置目录，首次访问时构建，此后只读。
pub fn builtin_catalog() -> &'static LayoutCatalog {
    &BUILTIN_CATALOG
}

impl LayoutCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// 内置的纸张与卡型：letter / a4，mtg / mtg_double。
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        catalog.insert_card_type(
            "mtg",
            CardTypeProfile {
                width: 743,
                height: 1038,
                corner_radius_mm: 3.175,
            },
        );
        catalog.insert_card_type(
            "mtg_double",
            CardTypeProfile {
                width: 1487,
                height: 1038,
                corner_radius_mm: 3.175,
            },
        );

        for (key, width, height) in [("letter", 3300, 2550), ("a4", 3508, 2480)] {
            let mut grids = BTreeMap::new();
            grids.insert("mtg".to_string(), GridSpec::new(2, 4));
            grids.insert("mtg_double".to_string(), GridSpec::new(2, 2));
            catalog.insert_paper(
                key,
                PaperProfile {
                    width,
                    height,
                    grids,
                },
            );
        }
        catalog
    }

    pub fn insert_paper(&mut self, key: impl Into<String>, profile: PaperProfile) {
        self.papers.insert(key.into(), profile);
    }

    pub fn insert_card_type(&mut self, key: impl Into<String>, profile: CardTypeProfile) {
        self.card_types.insert(key.into(), profile);
    }

    pub fn paper(&self, key: &str) -> Result<&PaperProfile, ConfigurationError> {
        self.papers
            .get(key)
            .ok_or_else(|| ConfigurationError::UnsupportedPaperSize(key.to_string()))
    }

    /// 查询卡型；目录中不存在的卡型对任何纸张都不受支持。
    pub fn card_type(&self, key: &str) -> Option<&CardTypeProfile> {
        self.card_types.get(key)
    }

    pub fn grid(
        &self,
        paper_key: &str,
        card_type_key: &str,
    ) -> Result<GridSpec, ConfigurationError> {
        let paper = self.paper(paper_key)?;
        paper
            .grids
            .get(card_type_key)
            .copied()
            .ok_or_else(|| ConfigurationError::UnsupportedCardSize {
                card_type: card_type_key.to_string(),
                paper: paper_key.to_string(),
            })
    }

    pub fn resolve(
        &self,
        paper_key: &str,
        card_type_key: &str,
    ) -> Result<ResolvedLayout, ConfigurationError> {
        let paper = self.paper(paper_key)?;
        let grid = self.grid(paper_key, card_type_key)?;
        let card = self
            .card_type(card_type_key)
            .copied()
            .ok_or_else(|| ConfigurationError::UnsupportedCardSize {
                card_type: card_type_key.to_string(),
                paper: paper_key.to_string(),
            })?;
        Ok(ResolvedLayout {
            paper_key: paper_key.to_string(),
            card_type_key: card_type_key.to_string(),
            paper_width: paper.width,
            paper_height: paper.height,
            card,
            grid,
        })
    }

    pub fn paper_keys(&self) -> impl Iterator<Item = &str> {
        self.papers.keys().map(String::as_str)
    }

    pub fn card_type_keys(&self) -> impl Iterator<Item = &str> {
        self.card_types.keys().map(String::as_str)
    }
}
