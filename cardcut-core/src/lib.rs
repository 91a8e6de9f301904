pub mod geometry {
    use glam::DVec2;
    use serde::{Deserialize, Serialize};

    /// 二维点，内部以 `glam::DVec2` 表示，物理坐标单位为毫米。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Point2(pub DVec2);

    impl Point2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }

        #[inline]
        pub fn from_vec(vec: DVec2) -> Self {
            Self(vec)
        }

        #[inline]
        pub fn x(self) -> f64 {
            self.0.x
        }

        #[inline]
        pub fn y(self) -> f64 {
            self.0.y
        }

        #[inline]
        pub fn translate(self, offset: Vector2) -> Self {
            Self(self.0 + offset.0)
        }

        #[inline]
        pub fn distance(self, other: Point2) -> f64 {
            self.0.distance(other.0)
        }

        #[inline]
        pub fn as_vec2(self) -> DVec2 {
            self.0
        }
    }

    /// 二维向量。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Vector2(pub DVec2);

    impl Vector2 {
        #[inline]
        pub fn new(x: f64, y: f64) -> Self {
            Self(DVec2::new(x, y))
        }
    }

    /// 轴对齐边界框，用于估算切割文档范围。
    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct Bounds2D {
        min: Point2,
        max: Point2,
    }

    impl Bounds2D {
        #[inline]
        pub fn empty() -> Self {
            Self {
                min: Point2::new(f64::INFINITY, f64::INFINITY),
                max: Point2::new(f64::NEG_INFINITY, f64::NEG_INFINITY),
            }
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.min.x() > self.max.x() || self.min.y() > self.max.y()
        }

        #[inline]
        pub fn min(&self) -> Point2 {
            self.min
        }

        #[inline]
        pub fn max(&self) -> Point2 {
            self.max
        }

        #[inline]
        pub fn width(&self) -> f64 {
            self.max.x() - self.min.x()
        }

        #[inline]
        pub fn height(&self) -> f64 {
            self.max.y() - self.min.y()
        }

        pub fn include_point(&mut self, point: Point2) {
            if self.is_empty() {
                self.min = point;
                self.max = point;
                return;
            }
            let min_vec = self.min.as_vec2().min(point.as_vec2());
            let max_vec = self.max.as_vec2().max(point.as_vec2());
            self.min = Point2::from_vec(min_vec);
            self.max = Point2::from_vec(max_vec);
        }

        pub fn include_bounds(&mut self, other: &Bounds2D) {
            if other.is_empty() {
                return;
            }
            self.include_point(other.min);
            self.include_point(other.max);
        }
    }
}

/// 打印分辨率与单位换算。排版坐标统一使用 300 DPI 像素（排版单位）。
pub mod units {
    pub const PRINT_DPI: f64 = 300.0;
    pub const MM_PER_INCH: f64 = 25.4;

    #[inline]
    pub fn px_to_mm(px: f64) -> f64 {
        px * (MM_PER_INCH / PRINT_DPI)
    }

    #[inline]
    pub fn mm_to_px(mm: f64) -> f64 {
        mm / MM_PER_INCH * PRINT_DPI
    }

    #[inline]
    pub fn inches_to_px(inches: f64) -> f64 {
        inches * PRINT_DPI
    }

    /// 出血宽度取整到整像素。
    #[inline]
    pub fn bleed_px(bleed_mm: f64) -> i32 {
        mm_to_px(bleed_mm).round() as i32
    }

}

pub mod deck {
    use serde::{Deserialize, Serialize};

    /// 卡牌在牌表中的下标。同一张卡的多份实例共享同一下标。
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct CardIndex(usize);

    impl CardIndex {
        #[inline]
        pub fn new(raw: usize) -> Self {
            Self(raw)
        }

        #[inline]
        pub fn get(self) -> usize {
            self.0
        }
    }

    /// 牌表中的一条记录（已由外部解析器解析为确定的卡牌）。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct DeckCard {
        pub id: String,
        pub name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub set: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub collector_number: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub image_url: Option<String>,
        pub width_mm: f64,
        pub height_mm: f64,
        #[serde(default = "DeckCard::default_quantity")]
        pub quantity: u32,
    }

    impl DeckCard {
        pub fn new(
            id: impl Into<String>,
            name: impl Into<String>,
            width_mm: f64,
            height_mm: f64,
            quantity: u32,
        ) -> Self {
            Self {
                id: id.into(),
                name: name.into(),
                set: None,
                collector_number: None,
                image_url: None,
                width_mm,
                height_mm,
                quantity,
            }
        }

        fn default_quantity() -> u32 {
            1
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Decklist {
        #[serde(default = "Decklist::default_game")]
        pub game: String,
        #[serde(default)]
        pub cards: Vec<DeckCard>,
    }

    impl Default for Decklist {
        fn default() -> Self {
            Self::new(Self::default_game())
        }
    }

    /// 单张实体卡，`copy` 为同一记录内的第几份（从 0 开始）。
    #[derive(Debug, Clone, PartialEq)]
    pub struct CardInstance {
        pub card: CardIndex,
        pub copy: u32,
        pub card_id: String,
        pub width_mm: f64,
        pub height_mm: f64,
    }

    impl Decklist {
        pub fn new(game: impl Into<String>) -> Self {
            Self {
                game: game.into(),
                cards: Vec::new(),
            }
        }

        fn default_game() -> String {
            "mtg".to_string()
        }

        pub fn push(&mut self, card: DeckCard) -> CardIndex {
            self.cards.push(card);
            CardIndex(self.cards.len() - 1)
        }

        #[inline]
        pub fn card(&self, index: CardIndex) -> Option<&DeckCard> {
            self.cards.get(index.0)
        }

        #[inline]
        pub fn is_empty(&self) -> bool {
            self.cards.is_empty()
        }

        pub fn total_quantity(&self) -> usize {
            self.cards.iter().map(|card| card.quantity as usize).sum()
        }

        /// 按数量展开为逐张实例，保持牌表顺序。
        pub fn expand(&self) -> Vec<CardInstance> {
            let mut instances = Vec::with_capacity(self.total_quantity());
            for (index, card) in self.cards.iter().enumerate() {
                for copy in 0..card.quantity {
                    instances.push(CardInstance {
                        card: CardIndex(index),
                        copy,
                        card_id: card.id.clone(),
                        width_mm: card.width_mm,
                        height_mm: card.height_mm,
                    });
                }
            }
            instances
        }
    }

}

pub mod layout {
    use serde::{Deserialize, Serialize};

    use crate::deck::CardIndex;

    /// 页面上已定位的一张卡，坐标为排版单位（左上原点，Y 向下）。
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct PlacedItem {
        pub card: CardIndex,
        pub copy: u32,
        pub card_id: String,
        pub x: i32,
        pub y: i32,
        pub width: i32,
        pub height: i32,
        pub rotation: i32,
    }

    impl PlacedItem {
        #[inline]
        pub fn right(&self) -> i32 {
            self.x + self.width
        }

        #[inline]
        pub fn bottom(&self) -> i32 {
            self.y + self.height
        }
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LayoutPage {
        pub page_number: u32,
        pub items: Vec<PlacedItem>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct LayoutResult {
        pub pages: Vec<LayoutPage>,
        pub total_cards: usize,
        pub paper_width: i32,
        pub paper_height: i32,
        pub card_type: String,
    }

    impl LayoutResult {
        #[inline]
        pub fn is_empty(&self) -> bool {
            self.pages.is_empty()
        }

        pub fn placed_count(&self) -> usize {
            self.pages.iter().map(|page| page.items.len()).sum()
        }

        #[inline]
        pub fn first_page(&self) -> Option<&LayoutPage> {
            self.pages.first()
        }
    }
}

/// 切割几何：坐标变换、圆角矩形路径与切割文档。
pub mod cut {
    use std::collections::BTreeMap;
    use std::f64::consts::{FRAC_PI_2, PI, TAU};

    use glam::DVec2;
    use serde::{Deserialize, Serialize};
    use thiserror::Error;

    use crate::geometry::{Bounds2D, Point2, Vector2};
    use crate::layout::{LayoutPage, PlacedItem};
    use crate::units::px_to_mm;

    pub const CUT_LAYER: &str = "CutLines";

    /// tan(22.5°)，顺时针 90° 圆弧的 bulge 值，硬件端按此字面值识别。
    pub const QUARTER_ARC_CW_BULGE: f64 = -0.41421356;

    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum GeometryError {
        #[error("corner radius {0} mm is negative")]
        NegativeCornerRadius(f64),
        #[error("corner radius {radius} mm exceeds half of the shorter card side ({limit} mm)")]
        CornerRadiusTooLarge { radius: f64, limit: f64 },
    }

    /// 排版空间（左上原点、Y 向下、像素）到物理空间（纸张中心原点、Y 向上、毫米）的变换。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct PageTransform {
        center_x_px: f64,
        center_y_px: f64,
    }

    impl PageTransform {
        pub fn new(paper_width_px: i32, paper_height_px: i32) -> Self {
            Self {
                center_x_px: f64::from(paper_width_px) / 2.0,
                center_y_px: f64::from(paper_height_px) / 2.0,
            }
        }

        /// 每个坐标都直接由像素值换算，避免累积误差。
        #[inline]
        pub fn to_physical(&self, x_px: f64, y_px: f64) -> Point2 {
            Point2::new(
                px_to_mm(x_px - self.center_x_px),
                px_to_mm(self.center_y_px - y_px),
            )
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    pub struct Layer {
        pub name: String,
        pub is_visible: bool,
    }

    impl Layer {
        #[inline]
        pub fn new(name: impl Into<String>) -> Self {
            Self {
                name: name.into(),
                is_visible: true,
            }
        }
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    pub struct EntityId(u64);

    impl EntityId {
        #[inline]
        pub fn get(self) -> u64 {
            self.0
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub enum CutEntity {
        Line(Line),
        Polyline(Polyline),
    }

    impl CutEntity {
        #[inline]
        pub fn layer_name(&self) -> &str {
            match self {
                CutEntity::Line(line) => &line.layer,
                CutEntity::Polyline(polyline) => &polyline.layer,
            }
        }

        pub fn bounds(&self) -> Option<Bounds2D> {
            match self {
                CutEntity::Line(line) => {
                    let mut bounds = Bounds2D::empty();
                    bounds.include_point(line.start);
                    bounds.include_point(line.end);
                    Some(bounds)
                }
                CutEntity::Polyline(polyline) => polyline.bounds(),
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Line {
        pub start: Point2,
        pub end: Point2,
        pub layer: String,
    }

    #[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
    pub struct PolylineVertex {
        pub position: Point2,
        pub bulge: f64,
    }

    impl PolylineVertex {
        #[inline]
        pub fn new(position: Point2) -> Self {
            Self {
                position,
                bulge: 0.0,
            }
        }

        #[inline]
        pub fn with_bulge(position: Point2, bulge: f64) -> Self {
            Self { position, bulge }
        }

        #[inline]
        pub fn is_arc_start(&self) -> bool {
            self.bulge.abs() > 1e-12
        }
    }

    /// 轻量多段线。顶点上的 bulge 描述从该顶点到下一顶点的圆弧段。
    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    pub struct Polyline {
        pub vertices: Vec<PolylineVertex>,
        pub is_closed: bool,
        pub layer: String,
    }

    impl Polyline {
        pub fn arc_count(&self) -> usize {
            self.segments()
                .filter(|(start, _)| start.is_arc_start())
                .count()
        }

        /// 依次返回 (起点, 终点) 顶点对，闭合时包含末点到首点的一段。
        pub fn segments(&self) -> impl Iterator<Item = (PolylineVertex, PolylineVertex)> + '_ {
            let count = self.vertices.len();
            let segment_count = match (count, self.is_closed) {
                (0 | 1, _) => 0,
                (n, true) => n,
                (n, false) => n - 1,
            };
            (0..segment_count).map(move |i| (self.vertices[i], self.vertices[(i + 1) % count]))
        }

        /// 将圆弧段按 `arc_steps` 份离散化，返回首尾相接的采样点序列。
        pub fn flatten(&self, arc_steps: usize) -> Vec<Point2> {
            let steps = arc_steps.max(1);
            let mut points = Vec::new();
            if let Some(first) = self.vertices.first() {
                points.push(first.position);
            }
            for (start, end) in self.segments() {
                match bulge_arc(start.position, end.position, start.bulge) {
                    Some(arc) => {
                        for i in 1..=steps {
                            let t = i as f64 / steps as f64;
                            points.push(arc.point_at(arc.start_angle + arc.sweep * t));
                        }
                    }
                    None => points.push(end.position),
                }
            }
            points
        }

        pub fn bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            for vertex in &self.vertices {
                bounds.include_point(vertex.position);
            }
            for (start, end) in self.segments() {
                if let Some(arc) = bulge_arc(start.position, end.position, start.bulge) {
                    arc.include_in(&mut bounds);
                }
            }
            if bounds.is_empty() { None } else { Some(bounds) }
        }
    }

    /// 由 bulge 还原出的圆弧；`sweep` 为带符号扫角，负值表示顺时针。
    #[derive(Debug, Clone, Copy, PartialEq)]
    pub struct BulgeArc {
        pub center: Point2,
        pub radius: f64,
        pub start_angle: f64,
        pub sweep: f64,
    }

    impl BulgeArc {
        #[inline]
        pub fn point_at(&self, angle: f64) -> Point2 {
            let offset = Vector2::new(self.radius * angle.cos(), self.radius * angle.sin());
            self.center.translate(offset)
        }

        fn include_in(&self, bounds: &mut Bounds2D) {
            let (start, end) = if self.sweep >= 0.0 {
                (self.start_angle, self.start_angle + self.sweep)
            } else {
                (self.start_angle + self.sweep, self.start_angle)
            };
            bounds.include_point(self.point_at(start));
            bounds.include_point(self.point_at(end));

            const QUADRANTS: [f64; 4] = [0.0, FRAC_PI_2, PI, FRAC_PI_2 * 3.0];
            for base in QUADRANTS {
                let mut candidate = base;
                while candidate < start {
                    candidate += TAU;
                }
                while candidate - TAU >= start {
                    candidate -= TAU;
                }
                if candidate <= end {
                    bounds.include_point(self.point_at(candidate));
                }
            }
        }
    }

    /// 按 DXF 约定解析 bulge：扫角为 `4·atan(bulge)`，正值逆时针。
    /// bulge 近似为 0 或弦长退化时返回 `None`（按直线处理）。
    pub fn bulge_arc(start: Point2, end: Point2, bulge: f64) -> Option<BulgeArc> {
        if bulge.abs() <= 1e-12 {
            return None;
        }
        let start_vec = start.as_vec2();
        let end_vec = end.as_vec2();
        let chord = end_vec - start_vec;
        let chord_len = chord.length();
        if chord_len <= f64::EPSILON {
            return None;
        }

        let sweep = 4.0 * bulge.atan();
        let half_sin = (sweep / 2.0).sin();
        if half_sin.abs() <= 1e-12 {
            return None;
        }
        let radius = chord_len / (2.0 * half_sin.abs());

        let midpoint = (start_vec + end_vec) * 0.5;
        let left = DVec2::new(-chord.y, chord.x) / chord_len;
        // 弦中点到圆心的带符号距离：(c/2)·cot(θ/2) = (c/2)·(1-b²)/(2b)
        let offset = chord_len / 2.0 * (1.0 - bulge * bulge) / (2.0 * bulge);
        let center_vec = midpoint + left * offset;

        let start_dir = start_vec - center_vec;
        Some(BulgeArc {
            center: Point2::from_vec(center_vec),
            radius,
            start_angle: start_dir.y.atan2(start_dir.x),
            sweep,
        })
    }

    /// 生成圆角矩形的 8 个顶点（顺时针，自上边左侧内缩点开始），圆弧顶点带 bulge。
    pub fn rounded_rect_vertices(
        left: f64,
        top: f64,
        width_mm: f64,
        height_mm: f64,
        radius_mm: f64,
    ) -> Result<[PolylineVertex; 8], GeometryError> {
        if radius_mm < 0.0 {
            return Err(GeometryError::NegativeCornerRadius(radius_mm));
        }
        let limit = width_mm.min(height_mm) / 2.0;
        if radius_mm > limit {
            return Err(GeometryError::CornerRadiusTooLarge {
                radius: radius_mm,
                limit,
            });
        }

        let r = radius_mm;
        let right = left + width_mm;
        let bottom = top - height_mm;
        let arc = QUARTER_ARC_CW_BULGE;

        Ok([
            PolylineVertex::new(Point2::new(left + r, top)),
            PolylineVertex::with_bulge(Point2::new(right - r, top), arc),
            PolylineVertex::new(Point2::new(right, top - r)),
            PolylineVertex::with_bulge(Point2::new(right, bottom + r), arc),
            PolylineVertex::new(Point2::new(right - r, bottom)),
            PolylineVertex::with_bulge(Point2::new(left + r, bottom), arc),
            PolylineVertex::new(Point2::new(left, bottom + r)),
            PolylineVertex::with_bulge(Point2::new(left, top - r), arc),
        ])
    }

    /// 将排版中的一张卡转换为物理坐标下的闭合圆角轮廓。
    pub fn card_outline(
        transform: &PageTransform,
        item: &PlacedItem,
        radius_mm: f64,
        layer: &str,
    ) -> Result<Polyline, GeometryError> {
        let top_left = transform.to_physical(f64::from(item.x), f64::from(item.y));
        let width_mm = px_to_mm(f64::from(item.width));
        let height_mm = px_to_mm(f64::from(item.height));
        let vertices =
            rounded_rect_vertices(top_left.x(), top_left.y(), width_mm, height_mm, radius_mm)?;
        Ok(Polyline {
            vertices: vertices.to_vec(),
            is_closed: true,
            layer: layer.to_string(),
        })
    }

    /// 构建单页切割文档：每张卡一条闭合圆角多段线，统一放在 `CutLines` 图层。
    pub fn page_cut_document(
        page: &LayoutPage,
        paper_width_px: i32,
        paper_height_px: i32,
        radius_mm: f64,
    ) -> Result<CutDocument, GeometryError> {
        let transform = PageTransform::new(paper_width_px, paper_height_px);
        let mut document = CutDocument::new();
        document.ensure_layer(CUT_LAYER);
        for item in &page.items {
            let outline = card_outline(&transform, item, radius_mm, CUT_LAYER)?;
            document.add_entity(CutEntity::Polyline(outline));
        }
        Ok(document)
    }

    #[derive(Debug, Default, Clone, Serialize, Deserialize)]
    pub struct CutDocument {
        layers: BTreeMap<String, Layer>,
        entities: Vec<(EntityId, CutEntity)>,
        next_entity_id: u64,
    }

    impl CutDocument {
        pub fn new() -> Self {
            let mut doc = Self::default();
            doc.ensure_layer("0");
            doc
        }

        pub fn ensure_layer(&mut self, name: impl AsRef<str>) {
            let key = name.as_ref();
            self.layers
                .entry(key.to_string())
                .or_insert_with(|| Layer::new(key));
        }

        pub fn add_line(
            &mut self,
            start: Point2,
            end: Point2,
            layer: impl Into<String>,
        ) -> EntityId {
            let layer = layer.into();
            self.add_entity(CutEntity::Line(Line { start, end, layer }))
        }

        pub fn add_polyline<I>(
            &mut self,
            vertices: I,
            is_closed: bool,
            layer: impl Into<String>,
        ) -> EntityId
        where
            I: IntoIterator<Item = PolylineVertex>,
        {
            let layer = layer.into();
            self.add_entity(CutEntity::Polyline(Polyline {
                vertices: vertices.into_iter().collect(),
                is_closed,
                layer,
            }))
        }

        pub fn add_entity(&mut self, entity: CutEntity) -> EntityId {
            self.ensure_layer(entity.layer_name());
            let id = self.next_id();
            self.entities.push((id, entity));
            id
        }

        #[inline]
        pub fn layers(&self) -> impl Iterator<Item = &Layer> {
            self.layers.values()
        }

        #[inline]
        pub fn entities(&self) -> impl Iterator<Item = &(EntityId, CutEntity)> {
            self.entities.iter()
        }

        pub fn polylines(&self) -> impl Iterator<Item = &Polyline> {
            self.entities.iter().filter_map(|(_, entity)| match entity {
                CutEntity::Polyline(polyline) => Some(polyline),
                CutEntity::Line(_) => None,
            })
        }

        #[inline]
        pub fn entity(&self, id: EntityId) -> Option<&CutEntity> {
            self.entities
                .iter()
                .find_map(|(entity_id, entity)| (*entity_id == id).then_some(entity))
        }

        pub fn bounds(&self) -> Option<Bounds2D> {
            let mut bounds = Bounds2D::empty();
            let mut has = false;
            for (_, entity) in &self.entities {
                if let Some(entity_bounds) = entity.bounds() {
                    bounds.include_bounds(&entity_bounds);
                    has = true;
                }
            }
            if has { Some(bounds) } else { None }
        }

        #[inline]
        fn next_id(&mut self) -> EntityId {
            let id = self.next_entity_id;
            self.next_entity_id += 1;
            EntityId(id)
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;
        use crate::deck::CardIndex;

        fn item(x: i32, y: i32, width: i32, height: i32) -> PlacedItem {
            PlacedItem {
                card: CardIndex::new(0),
                copy: 0,
                card_id: "card".to_string(),
                x,
                y,
                width,
                height,
                rotation: 0,
            }
        }

        #[test]
        fn transform_centres_origin_and_flips_y() {
            let transform = PageTransform::new(3300, 2550);
            let centre = transform.to_physical(1650.0, 1275.0);
            assert_eq!(centre.x(), 0.0);
            assert_eq!(centre.y(), 0.0);

            let top_left = transform.to_physical(0.0, 0.0);
            assert!((top_left.x() + 139.7).abs() < 1e-9);
            assert!((top_left.y() - 107.95).abs() < 1e-9);

            let bottom_right = transform.to_physical(3300.0, 2550.0);
            assert!((bottom_right.x() - 139.7).abs() < 1e-9);
            assert!((bottom_right.y() + 107.95).abs() < 1e-9);
        }

        #[test]
        fn rounded_rect_has_eight_clockwise_vertices() {
            let vertices = rounded_rect_vertices(0.0, 0.0, 63.0, 88.0, 3.0).unwrap();
            let expected = [
                (3.0, 0.0, 0.0),
                (60.0, 0.0, QUARTER_ARC_CW_BULGE),
                (63.0, -3.0, 0.0),
                (63.0, -85.0, QUARTER_ARC_CW_BULGE),
                (60.0, -88.0, 0.0),
                (3.0, -88.0, QUARTER_ARC_CW_BULGE),
                (0.0, -85.0, 0.0),
                (0.0, -3.0, QUARTER_ARC_CW_BULGE),
            ];
            for (vertex, (x, y, bulge)) in vertices.iter().zip(expected) {
                assert!((vertex.position.x() - x).abs() < 1e-12);
                assert!((vertex.position.y() - y).abs() < 1e-12);
                assert_eq!(vertex.bulge, bulge);
            }
        }

        #[test]
        fn oversize_or_negative_radius_is_rejected() {
            let err = rounded_rect_vertices(0.0, 0.0, 10.0, 20.0, 5.5).unwrap_err();
            assert_eq!(
                err,
                GeometryError::CornerRadiusTooLarge {
                    radius: 5.5,
                    limit: 5.0
                }
            );
            assert!(rounded_rect_vertices(0.0, 0.0, 10.0, 20.0, 5.0).is_ok());
            assert!(matches!(
                rounded_rect_vertices(0.0, 0.0, 10.0, 20.0, -1.0),
                Err(GeometryError::NegativeCornerRadius(_))
            ));
        }

        #[test]
        fn bulge_arcs_expand_onto_true_corner_circles() {
            let radius = 3.175;
            let polyline = Polyline {
                vertices: rounded_rect_vertices(-31.5, 44.0, 63.0, 88.0, radius)
                    .unwrap()
                    .to_vec(),
                is_closed: true,
                layer: CUT_LAYER.to_string(),
            };
            assert_eq!(polyline.arc_count(), 4);

            let corners = [
                Point2::new(31.5 - radius, 44.0 - radius),
                Point2::new(31.5 - radius, -44.0 + radius),
                Point2::new(-31.5 + radius, -44.0 + radius),
                Point2::new(-31.5 + radius, 44.0 - radius),
            ];
            for ((start, end), corner) in polyline
                .segments()
                .filter(|(start, _)| start.is_arc_start())
                .zip(corners)
            {
                let arc = bulge_arc(start.position, end.position, start.bulge).unwrap();
                assert!(arc.center.distance(corner) < 1e-6);
                assert!((arc.radius - radius).abs() < 1e-6);
                assert!((arc.sweep + FRAC_PI_2).abs() < 1e-6);
                for i in 0..=16 {
                    let sample = arc.point_at(arc.start_angle + arc.sweep * i as f64 / 16.0);
                    assert!((sample.distance(corner) - radius).abs() < 1e-6);
                }
            }

            let flattened = polyline.flatten(8);
            assert_eq!(flattened.len(), 1 + 4 * 8 + 4);
            let last = flattened.last().unwrap();
            assert!(last.distance(polyline.vertices[0].position) < 1e-9);
        }

        #[test]
        fn polyline_bounds_follow_arc_extents() {
            let polyline = Polyline {
                vertices: rounded_rect_vertices(-10.0, 5.0, 20.0, 10.0, 2.0)
                    .unwrap()
                    .to_vec(),
                is_closed: true,
                layer: CUT_LAYER.to_string(),
            };
            let bounds = polyline.bounds().unwrap();
            assert!((bounds.min().x() + 10.0).abs() < 1e-6);
            assert!((bounds.min().y() + 5.0).abs() < 1e-6);
            assert!((bounds.max().x() - 10.0).abs() < 1e-6);
            assert!((bounds.max().y() - 5.0).abs() < 1e-6);

            let semicircle = Polyline {
                vertices: vec![
                    PolylineVertex::with_bulge(Point2::new(0.0, 0.0), 1.0),
                    PolylineVertex::new(Point2::new(10.0, 0.0)),
                ],
                is_closed: false,
                layer: "0".to_string(),
            };
            let bounds = semicircle.bounds().unwrap();
            assert!((bounds.min().y() + 5.0).abs() < 1e-9);
            assert!(bounds.max().y().abs() < 1e-9);
        }

        #[test]
        fn page_document_places_every_card_on_cut_layer() {
            let page = LayoutPage {
                page_number: 1,
                items: vec![item(146, 231, 743, 1038), item(901, 231, 743, 1038)],
            };
            let document = page_cut_document(&page, 3300, 2550, 3.175).unwrap();
            assert_eq!(document.polylines().count(), 2);
            assert!(document.polylines().all(|p| p.layer == CUT_LAYER && p.is_closed));
            let layers: Vec<&str> = document.layers().map(|l| l.name.as_str()).collect();
            assert_eq!(layers, ["0", CUT_LAYER]);

            let first = document.polylines().next().unwrap();
            let left = px_to_mm(146.0 - 1650.0);
            let top = px_to_mm(1275.0 - 231.0);
            assert_eq!(first.vertices[0].position.x(), left + 3.175);
            assert_eq!(first.vertices[0].position.y(), top);
            assert_eq!(first.vertices[2].position.x(), left + px_to_mm(743.0));

            let bounds = document.bounds().unwrap();
            assert!((bounds.width() - px_to_mm(743.0 * 2.0 + 12.0)).abs() < 1e-6);
        }

        #[test]
        fn document_lines_extend_bounds() {
            let mut document = CutDocument::new();
            let id = document.add_line(Point2::new(-1.0, 2.0), Point2::new(4.0, -3.0), "GUIDE");
            match document.entity(id) {
                Some(CutEntity::Line(line)) => assert_eq!(line.layer, "GUIDE"),
                other => panic!("unexpected entity lookup result: {other:?}"),
            }
            let bounds = document.bounds().unwrap();
            assert_eq!(bounds.min(), Point2::new(-1.0, -3.0));
            assert_eq!(bounds.max(), Point2::new(4.0, 2.0));
            assert_eq!(document.polylines().count(), 0);
        }
    }
}
