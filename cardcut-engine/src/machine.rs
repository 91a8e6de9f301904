use std::collections::BTreeSet;

use cardcut_core::cut::{CutDocument, page_cut_document};
use cardcut_core::deck::Decklist;
use cardcut_core::layout::{LayoutPage, LayoutResult};
use cardcut_core::units::{inches_to_px, mm_to_px};
use cardcut_io::DxfFacade;
use serde::Serialize;
use tracing::info;

use crate::catalog::LayoutCatalog;
use crate::errors::{ConfigurationError, LayoutError};
use crate::packer::{PlacementConstraint, SensorSafeCorner, layout_decklist};
use crate::render::{PixelPoint, PixelRect};

/// 定位标记距纸边的内缩、边长与线宽（英寸）。
const MARK_MARGIN_IN: f64 = 0.25;
const MARK_LENGTH_IN: f64 = 0.375;
const MARK_THICKNESS_IN: f64 = 0.020;

const CUT_PREVIEW_COLOR: &str = "#FF00FF";
const GUIDE_COLOR: &str = "#000000";
const OVERLAY_LINE_WIDTH: f64 = 1.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LayoutOptions {
    pub avoid_registration_marks: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum MarkShape {
    FilledRect { rect: PixelRect },
    Stroke { path: Vec<PixelPoint>, thickness: f64 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OverlayShape {
    RoundedRect { rect: PixelRect, radius: f64 },
    GuideLine { from: PixelPoint, to: PixelPoint },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Overlay {
    pub shape: OverlayShape,
    pub color: &'static str,
    pub line_width: f64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CutFile {
    pub bytes: Vec<u8>,
    pub extension: &'static str,
    pub mime_type: &'static str,
}

/// 切割设备的能力集合：出血、排版约束、定位标记、覆盖层与切割文件。
pub trait CuttingMachine: Send + Sync {
    fn id(&self) -> &'static str;
    fn name(&self) -> &'static str;
    fn bleed_mm(&self) -> f64;

    fn supports_registration_marks(&self) -> bool {
        false
    }

    fn placement_constraint(&self, _options: LayoutOptions) -> Option<&dyn PlacementConstraint> {
        None
    }

    fn registration_marks(&self, _paper_width: i32, _paper_height: i32) -> Vec<MarkShape> {
        Vec::new()
    }

    fn overlays(
        &self,
        page: &LayoutPage,
        paper_width: i32,
        paper_height: i32,
        corner_radius_mm: f64,
    ) -> Vec<Overlay>;

    /// 覆盖层是否随页面一起打印（否则仅用于预览）。
    fn prints_overlays(&self) -> bool;

    fn cut_file_extension(&self) -> &'static str;

    fn generate_cut_file(
        &self,
        layout: &LayoutResult,
        catalog: &LayoutCatalog,
    ) -> Result<CutFile, LayoutError>;

    fn calculate_layout(
        &self,
        catalog: &LayoutCatalog,
        decklist: &Decklist,
        paper_key: &str,
        card_type_key: &str,
        options: LayoutOptions,
    ) -> Result<LayoutResult, ConfigurationError> {
        layout_decklist(
            catalog,
            decklist,
            paper_key,
            card_type_key,
            self.placement_constraint(options),
        )
    }
}

/// 带光学定位标记的刀式切割机，输出 DXF 切割路径。
#[derive(Debug, Clone, Copy, Default)]
pub struct PrecisionCutter;

impl CuttingMachine for PrecisionCutter {
    fn id(&self) -> &'static str {
        "silhouette"
    }

    fn name(&self) -> &'static str {
        "Silhouette Cameo (Type 1 Marks)"
    }

    fn bleed_mm(&self) -> f64 {
        0.5
    }

    fn supports_registration_marks(&self) -> bool {
        true
    }

    fn placement_constraint(&self, options: LayoutOptions) -> Option<&dyn PlacementConstraint> {
        if options.avoid_registration_marks {
            Some(&SensorSafeCorner)
        } else {
            None
        }
    }

    fn registration_marks(&self, paper_width: i32, paper_height: i32) -> Vec<MarkShape> {
        let margin = inches_to_px(MARK_MARGIN_IN);
        let length = inches_to_px(MARK_LENGTH_IN);
        let thickness = inches_to_px(MARK_THICKNESS_IN);
        let half = thickness / 2.0;

        // 右上角 L 形：拐角在 (W - margin, margin)，向左、向下延伸
        let tr_x = f64::from(paper_width) - margin;
        let tr_y = margin;
        // 左下角 L 形：拐角在 (margin, H - margin)，向上、向右延伸
        let bl_x = margin;
        let bl_y = f64::from(paper_height) - margin;

        vec![
            MarkShape::FilledRect {
                rect: PixelRect::new(margin, margin, length, length),
            },
            MarkShape::Stroke {
                path: vec![
                    PixelPoint::new(tr_x - length, tr_y + half),
                    PixelPoint::new(tr_x - half, tr_y + half),
                    PixelPoint::new(tr_x - half, tr_y + length),
                ],
                thickness,
            },
            MarkShape::Stroke {
                path: vec![
                    PixelPoint::new(bl_x + half, bl_y - length),
                    PixelPoint::new(bl_x + half, bl_y - half),
                    PixelPoint::new(bl_x + length, bl_y - half),
                ],
                thickness,
            },
        ]
    }

    fn overlays(
        &self,
        page: &LayoutPage,
        _paper_width: i32,
        _paper_height: i32,
        corner_radius_mm: f64,
    ) -> Vec<Overlay> {
        let radius = mm_to_px(corner_radius_mm);
        page.items
            .iter()
            .map(|item| Overlay {
                shape: OverlayShape::RoundedRect {
                    rect: PixelRect::new(
                        f64::from(item.x),
                        f64::from(item.y),
                        f64::from(item.width),
                        f64::from(item.height),
                    ),
                    radius,
                },
                color: CUT_PREVIEW_COLOR,
                line_width: OVERLAY_LINE_WIDTH,
            })
            .collect()
    }

    fn prints_overlays(&self) -> bool {
        false
    }

    fn cut_file_extension(&self) -> &'static str {
        "dxf"
    }

    /// 只导出第一页；没有页面时输出 ENTITIES 为空的合法 DXF。
    fn generate_cut_file(
        &self,
        layout: &LayoutResult,
        catalog: &LayoutCatalog,
    ) -> Result<CutFile, LayoutError> {
        let document = match layout.first_page() {
            Some(page) => {
                let card = catalog.card_type(&layout.card_type).ok_or_else(|| {
                    ConfigurationError::UnsupportedCardSize {
                        card_type: layout.card_type.clone(),
                        paper: format!("{}x{}", layout.paper_width, layout.paper_height),
                    }
                })?;
                page_cut_document(
                    page,
                    layout.paper_width,
                    layout.paper_height,
                    card.corner_radius_mm,
                )?
            }
            None => CutDocument::new(),
        };
        let text = DxfFacade::new().to_dxf_string(&document);
        info!(
            machine = self.id(),
            outlines = document.polylines().count(),
            bytes = text.len(),
            "已生成切割文件"
        );
        Ok(CutFile {
            bytes: text.into_bytes(),
            extension: self.cut_file_extension(),
            mime_type: "application/dxf",
        })
    }
}

/// 手工裁切：不使用定位标记，打印整页裁切参考线。
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualCutter;

pub const HAND_CUT_NOTE: &str = "Hand cut: Just print the PDF.";

impl CuttingMachine for ManualCutter {
    fn id(&self) -> &'static str {
        "hand"
    }

    fn name(&self) -> &'static str {
        "Hand Cut (Guides)"
    }

    fn bleed_mm(&self) -> f64 {
        0.5
    }

    /// 每个不同的卡片上下边 y 画一条横线，每个不同的左右边 x 画一条竖线；横线在前，各组升序。
    fn overlays(
        &self,
        page: &LayoutPage,
        paper_width: i32,
        paper_height: i32,
        _corner_radius_mm: f64,
    ) -> Vec<Overlay> {
        let mut xs = BTreeSet::new();
        let mut ys = BTreeSet::new();
        for item in &page.items {
            xs.insert(item.x);
            xs.insert(item.right());
            ys.insert(item.y);
            ys.insert(item.bottom());
        }

        let width = f64::from(paper_width);
        let height = f64::from(paper_height);
        let horizontal = ys.into_iter().map(|y| {
            let y = f64::from(y);
            (PixelPoint::new(0.0, y), PixelPoint::new(width, y))
        });
        let vertical = xs.into_iter().map(|x| {
            let x = f64::from(x);
            (PixelPoint::new(x, 0.0), PixelPoint::new(x, height))
        });

        horizontal
            .chain(vertical)
            .map(|(from, to)| Overlay {
                shape: OverlayShape::GuideLine { from, to },
                color: GUIDE_COLOR,
                line_width: OVERLAY_LINE_WIDTH,
            })
            .collect()
    }

    fn prints_overlays(&self) -> bool {
        true
    }

    fn cut_file_extension(&self) -> &'static str {
        "txt"
    }

    fn generate_cut_file(
        &self,
        _layout: &LayoutResult,
        _catalog: &LayoutCatalog,
    ) -> Result<CutFile, LayoutError> {
        Ok(CutFile {
            bytes: HAND_CUT_NOTE.as_bytes().to_vec(),
            extension: self.cut_file_extension(),
            mime_type: "text/plain",
        })
    }
}
