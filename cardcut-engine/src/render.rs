//! 供外部渲染器使用的页面绘制计划（预览与打印）。

use cardcut_core::deck::CardIndex;
use cardcut_core::layout::{LayoutPage, LayoutResult};
use cardcut_core::units::{bleed_px, mm_to_px};
use serde::Serialize;

use crate::machine::{CuttingMachine, MarkShape, Overlay};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RenderTarget {
    Preview,
    Print,
}

/// 页面坐标系中的点（排版单位，左上原点，Y 向下）。
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelPoint {
    pub x: f64,
    pub y: f64,
}

impl PixelPoint {
    #[inline]
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl PixelRect {
    #[inline]
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 四周各向外扩 `amount`。
    pub fn expand(self, amount: f64) -> Self {
        Self {
            x: self.x - amount,
            y: self.y - amount,
            width: self.width + 2.0 * amount,
            height: self.height + 2.0 * amount,
        }
    }
}

/// 单张卡的绘制框：裁切框、出血框与裁剪圆角。
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardFrame {
    pub card: CardIndex,
    pub card_id: String,
    pub cut: PixelRect,
    pub bleed: PixelRect,
    pub clip_radius: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PagePlan {
    pub page_number: u32,
    pub paper_width: i32,
    pub paper_height: i32,
    pub registration_marks: Vec<MarkShape>,
    pub frames: Vec<CardFrame>,
    pub overlays: Vec<Overlay>,
}

/// 生成单页绘制计划。打印目标只包含会被打印的覆盖层。
pub fn plan_page(
    machine: &dyn CuttingMachine,
    layout: &LayoutResult,
    page: &LayoutPage,
    corner_radius_mm: f64,
    target: RenderTarget,
) -> PagePlan {
    let bleed = f64::from(bleed_px(machine.bleed_mm()));
    let clip_radius = mm_to_px(corner_radius_mm);

    let frames = page
        .items
        .iter()
        .map(|item| {
            let cut = PixelRect::new(
                f64::from(item.x),
                f64::from(item.y),
                f64::from(item.width),
                f64::from(item.height),
            );
            CardFrame {
                card: item.card,
                card_id: item.card_id.clone(),
                cut,
                bleed: cut.expand(bleed),
                clip_radius,
            }
        })
        .collect();

    let include_overlays = match target {
        RenderTarget::Preview => true,
        RenderTarget::Print => machine.prints_overlays(),
    };
    let overlays = if include_overlays {
        machine.overlays(page, layout.paper_width, layout.paper_height, corner_radius_mm)
    } else {
        Vec::new()
    };

    PagePlan {
        page_number: page.page_number,
        paper_width: layout.paper_width,
        paper_height: layout.paper_height,
        registration_marks: machine.registration_marks(layout.paper_width, layout.paper_height),
        frames,
        overlays,
    }
}
