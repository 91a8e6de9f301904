use cardcut_core::deck::Decklist;
use cardcut_core::layout::LayoutResult;
use tracing::debug;

use crate::catalog::{LayoutCatalog, builtin_catalog};
use crate::errors::{ConfigurationError, LayoutError};
use crate::machine::{CutFile, LayoutOptions};
use crate::registry::{GameRegistry, MachineRegistry, default_machines};
use crate::render::{PagePlan, RenderTarget, plan_page};

#[derive(Debug, Clone, Copy)]
pub struct LayoutRequest<'a> {
    pub machine_id: &'a str,
    pub decklist: &'a Decklist,
    pub paper: &'a str,
    pub sensor_safe: bool,
    /// 为空时使用牌表所属游戏的默认卡型。
    pub card_type: Option<&'a str>,
}

/// 面向调用方的排版入口：解析设备与游戏，转交给设备完成排版与切割文件。
pub struct LayoutService<'r> {
    machines: &'r MachineRegistry,
    catalog: &'r LayoutCatalog,
    games: GameRegistry,
}

impl LayoutService<'static> {
    pub fn with_defaults() -> Self {
        Self::new(default_machines(), builtin_catalog())
    }
}

impl<'r> LayoutService<'r> {
    pub fn new(machines: &'r MachineRegistry, catalog: &'r LayoutCatalog) -> Self {
        Self {
            machines,
            catalog,
            games: GameRegistry::new(),
        }
    }

    #[inline]
    pub fn machines(&self) -> &MachineRegistry {
        self.machines
    }

    #[inline]
    pub fn catalog(&self) -> &LayoutCatalog {
        self.catalog
    }

    #[inline]
    pub fn games(&self) -> &GameRegistry {
        &self.games
    }

    pub fn calculate_layout(
        &self,
        request: &LayoutRequest<'_>,
    ) -> Result<LayoutResult, LayoutError> {
        let machine = self.machines.get(request.machine_id)?;
        let game = self.games.get(&request.decklist.game)?;
        let card_type = request.card_type.unwrap_or(&game.default_card_type);
        // 只有支持定位标记的设备才需要避让
        let options = LayoutOptions {
            avoid_registration_marks: request.sensor_safe && machine.supports_registration_marks(),
        };
        debug!(
            machine = machine.id(),
            game = %game.id,
            paper = request.paper,
            card_type,
            sensor_safe = options.avoid_registration_marks,
            "开始排版"
        );
        let layout = machine.calculate_layout(
            self.catalog,
            request.decklist,
            request.paper,
            card_type,
            options,
        )?;
        Ok(layout)
    }

    pub fn generate_cut_file(
        &self,
        machine_id: &str,
        layout: &LayoutResult,
    ) -> Result<CutFile, LayoutError> {
        let machine = self.machines.get(machine_id)?;
        machine.generate_cut_file(layout, self.catalog)
    }

    /// 为第 `page_index` 页（从 0 开始）生成绘制计划，页码越界时返回 `None`。
    pub fn render_plan(
        &self,
        machine_id: &str,
        layout: &LayoutResult,
        page_index: usize,
        target: RenderTarget,
    ) -> Result<Option<PagePlan>, LayoutError> {
        let machine = self.machines.get(machine_id)?;
        let Some(page) = layout.pages.get(page_index) else {
            return Ok(None);
        };
        let radius = self
            .catalog
            .card_type(&layout.card_type)
            .map(|card| card.corner_radius_mm)
            .ok_or_else(|| ConfigurationError::UnsupportedCardSize {
                card_type: layout.card_type.clone(),
                paper: format!("{}x{}", layout.paper_width, layout.paper_height),
            })?;
        Ok(Some(plan_page(machine, layout, page, radius, target)))
    }
}

#[cfg(test)]
mod tests {
    use cardcut_core::deck::DeckCard;

    use super::*;

    fn decklist(game: &str, quantity: u32) -> Decklist {
        let mut deck = Decklist::new(game);
        deck.push(DeckCard::new("opt", "Opt", 63.0, 88.0, quantity));
        deck
    }

    fn request<'a>(
        machine_id: &'a str,
        decklist: &'a Decklist,
        sensor_safe: bool,
    ) -> LayoutRequest<'a> {
        LayoutRequest {
            machine_id,
            decklist,
            paper: "letter",
            sensor_safe,
            card_type: None,
        }
    }

    #[test]
    fn sensor_safe_is_only_forwarded_to_marked_machines() {
        let service = LayoutService::with_defaults();
        let deck = decklist("mtg", 10);

        let silhouette = service.calculate_layout(&request("silhouette", &deck, true)).unwrap();
        let sizes: Vec<_> = silhouette.pages.iter().map(|p| p.items.len()).collect();
        assert_eq!(sizes, [7, 3]);

        let hand = service.calculate_layout(&request("hand", &deck, true)).unwrap();
        let sizes: Vec<_> = hand.pages.iter().map(|p| p.items.len()).collect();
        assert_eq!(sizes, [8, 2]);
    }

    #[test]
    fn card_type_defaults_to_game_profile() {
        let service = LayoutService::with_defaults();
        let deck = decklist("mtg", 3);
        let layout = service.calculate_layout(&request("silhouette", &deck, false)).unwrap();
        assert_eq!(layout.card_type, "mtg");

        let mut explicit = request("silhouette", &deck, false);
        explicit.card_type = Some("mtg_double");
        let layout = service.calculate_layout(&explicit).unwrap();
        assert_eq!(layout.card_type, "mtg_double");
        assert_eq!(layout.pages[0].items[0].width, 1487);
    }

    #[test]
    fn unknown_machine_and_game_are_rejected() {
        let service = LayoutService::with_defaults();
        let deck = decklist("mtg", 1);
        let err = service.calculate_layout(&request("laser", &deck, false)).unwrap_err();
        assert_eq!(
            err,
            LayoutError::Configuration(ConfigurationError::UnknownMachine("laser".into()))
        );

        let other = decklist("yugioh", 1);
        let err = service.calculate_layout(&request("hand", &other, false)).unwrap_err();
        assert_eq!(
            err,
            LayoutError::Configuration(ConfigurationError::UnknownGame("yugioh".into()))
        );
    }

    #[test]
    fn cut_file_and_render_plan_use_the_chosen_machine() {
        let service = LayoutService::with_defaults();
        let deck = decklist("mtg", 2);
        let layout = service.calculate_layout(&request("silhouette", &deck, false)).unwrap();

        let dxf = service.generate_cut_file("silhouette", &layout).unwrap();
        assert_eq!(dxf.extension, "dxf");
        let text = service.generate_cut_file("hand", &layout).unwrap();
        assert_eq!(text.extension, "txt");

        let plan = service
            .render_plan("silhouette", &layout, 0, RenderTarget::Preview)
            .unwrap()
            .expect("first page exists");
        assert_eq!(plan.page_number, 1);
        assert_eq!(plan.frames.len(), 2);
        let missing = service.render_plan("silhouette", &layout, 5, RenderTarget::Print);
        assert!(missing.unwrap().is_none());
    }

    #[test]
    fn empty_decklist_is_a_successful_empty_layout() {
        let service = LayoutService::with_defaults();
        let deck = Decklist::new("mtg");
        let layout = service.calculate_layout(&request("silhouette", &deck, true)).unwrap();
        assert!(layout.is_empty());
        assert_eq!(layout.total_cards, 0);
    }
}
