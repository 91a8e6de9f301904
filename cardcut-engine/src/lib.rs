pub mod catalog;
pub mod machine;
pub mod registry;
pub mod render;
pub mod service;

pub mod errors {
    use cardcut_core::cut::GeometryError;
    use thiserror::Error;

    #[derive(Debug, Clone, PartialEq, Eq, Error)]
    pub enum ConfigurationError {
        #[error("unsupported paper size: {0}")]
        UnsupportedPaperSize(String),
        #[error("unsupported card size {card_type} for paper {paper}")]
        UnsupportedCardSize { card_type: String, paper: String },
        #[error("unknown cutting machine: {0}")]
        UnknownMachine(String),
        #[error("unknown game: {0}")]
        UnknownGame(String),
        #[error("placement constraint leaves no usable cell in a {rows}x{cols} grid")]
        NoUsableCells { rows: u32, cols: u32 },
    }

    #[derive(Debug, Clone, PartialEq, Error)]
    pub enum LayoutError {
        #[error(transparent)]
        Configuration(#[from] ConfigurationError),
        #[error(transparent)]
        Geometry(#[from] GeometryError),
    }
}

pub mod packer {
    use cardcut_core::deck::{CardInstance, Decklist};
    use cardcut_core::layout::{LayoutPage, LayoutResult, PlacedItem};
    use tracing::{debug, info};

    use crate::catalog::{CardTypeProfile, GridSpec, LayoutCatalog, ResolvedLayout};
    use crate::errors::ConfigurationError;

    /// 相邻卡牌之间的间距（排版单位，约 1 mm）。
    pub const CARD_GAP_PX: i32 = 12;

    /// 标记网格中不可用的单元格，对每一页的判定完全相同。
    pub trait PlacementConstraint: Send + Sync {
        fn is_blocked(&self, row: u32, col: u32, grid: GridSpec) -> bool;
    }

    /// 空出最后一行第一列，避免卡牌压住左下角的定位标记。
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SensorSafeCorner;

    impl PlacementConstraint for SensorSafeCorner {
        fn is_blocked(&self, row: u32, col: u32, grid: GridSpec) -> bool {
            grid.rows > 0 && row == grid.rows - 1 && col == 0
        }
    }

    pub fn usable_cells(grid: GridSpec, constraint: Option<&dyn PlacementConstraint>) -> usize {
        let Some(constraint) = constraint else {
            return grid.cell_count();
        };
        (0..grid.rows)
            .flat_map(|row| (0..grid.cols).map(move |col| (row, col)))
            .filter(|&(row, col)| !constraint.is_blocked(row, col, grid))
            .count()
    }

    /// 网格整体居中后的左上角坐标，向下取整（负数同样向负无穷取整）。
    pub fn grid_origin(
        grid: GridSpec,
        card: &CardTypeProfile,
        paper_width: i32,
        paper_height: i32,
    ) -> (i32, i32) {
        let cols = grid.cols as i32;
        let rows = grid.rows as i32;
        let grid_width = cols * card.width + (cols - 1).max(0) * CARD_GAP_PX;
        let grid_height = rows * card.height + (rows - 1).max(0) * CARD_GAP_PX;
        (
            (paper_width - grid_width).div_euclid(2),
            (paper_height - grid_height).div_euclid(2),
        )
    }

    /// 按行优先顺序把实例依次放入网格，放满一页后换页。
    pub fn pack(
        instances: &[CardInstance],
        layout: &ResolvedLayout,
        constraint: Option<&dyn PlacementConstraint>,
    ) -> Result<LayoutResult, ConfigurationError> {
        let grid = layout.grid;
        let card = layout.card;
        let mut pages = Vec::new();

        if !instances.is_empty() {
            let per_page = usable_cells(grid, constraint);
            if per_page == 0 {
                return Err(ConfigurationError::NoUsableCells {
                    rows: grid.rows,
                    cols: grid.cols,
                });
            }

            let (start_x, start_y) =
                grid_origin(grid, &card, layout.paper_width, layout.paper_height);
            let mut remaining = instances.iter().peekable();

            while remaining.peek().is_some() {
                let mut items = Vec::with_capacity(per_page);
                'cells: for row in 0..grid.rows {
                    for col in 0..grid.cols {
                        if constraint.is_some_and(|c| c.is_blocked(row, col, grid)) {
                            continue;
                        }
                        let Some(instance) = remaining.next() else {
                            break 'cells;
                        };
                        items.push(PlacedItem {
                            card: instance.card,
                            copy: instance.copy,
                            card_id: instance.card_id.clone(),
                            x: start_x + col as i32 * (card.width + CARD_GAP_PX),
                            y: start_y + row as i32 * (card.height + CARD_GAP_PX),
                            width: card.width,
                            height: card.height,
                            rotation: 0,
                        });
                    }
                }

                let page_number = pages.len() as u32 + 1;
                debug!(page = page_number, items = items.len(), "已排版一页");
                pages.push(LayoutPage { page_number, items });
            }
        }

        Ok(LayoutResult {
            pages,
            total_cards: instances.len(),
            paper_width: layout.paper_width,
            paper_height: layout.paper_height,
            card_type: layout.card_type_key.clone(),
        })
    }

    /// 解析目录、展开牌表并排版。
    pub fn layout_decklist(
        catalog: &LayoutCatalog,
        decklist: &Decklist,
        paper_key: &str,
        card_type_key: &str,
        constraint: Option<&dyn PlacementConstraint>,
    ) -> Result<LayoutResult, ConfigurationError> {
        let resolved = catalog.resolve(paper_key, card_type_key)?;
        let instances = decklist.expand();
        let result = pack(&instances, &resolved, constraint)?;
        info!(
            paper = paper_key,
            card_type = card_type_key,
            cards = result.total_cards,
            pages = result.pages.len(),
            "排版完成"
        );
        Ok(result)
    }

}
