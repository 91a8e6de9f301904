use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::Serialize;

use crate::errors::ConfigurationError;
use crate::machine::{CuttingMachine, ManualCutter, PrecisionCutter};

/// 按 id 注册的切割设备，构建完成后只读。
pub struct MachineRegistry {
    machines: BTreeMap<&'static str, Box<dyn CuttingMachine>>,
}

impl MachineRegistry {
    pub fn new() -> Self {
        let mut registry = Self::empty();
        registry.register(PrecisionCutter);
        registry.register(ManualCutter);
        registry
    }

    pub fn empty() -> Self {
        Self {
            machines: BTreeMap::new(),
        }
    }

    pub fn register<M: CuttingMachine + 'static>(&mut self, machine: M) {
        self.machines.insert(machine.id(), Box::new(machine));
    }

    pub fn get(&self, id: &str) -> Result<&dyn CuttingMachine, ConfigurationError> {
        self.machines
            .get(id)
            .map(|machine| &**machine)
            .ok_or_else(|| ConfigurationError::UnknownMachine(id.to_string()))
    }

    /// 按 id 升序返回全部设备。
    pub fn machines(&self) -> impl Iterator<Item = &dyn CuttingMachine> {
        self.machines.values().map(|machine| &**machine)
    }

    pub fn available_machines(&self) -> impl Iterator<Item = &&'static str> {
        self.machines.keys()
    }
}

impl Default for MachineRegistry {
    fn default() -> Self {
        Self::new()
    }
}

static DEFAULT_MACHINES: Lazy<MachineRegistry> = Lazy::new(MachineRegistry::new);

/// 进程内共享的默认设备表，首次访问时初始化。
pub fn default_machines() -> &'static MachineRegistry {
    &DEFAULT_MACHINES
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameProfile {
    pub id: String,
    pub name: String,
    pub default_card_type: String,
}

pub struct GameRegistry {
    games: BTreeMap<String, GameProfile>,
}

impl GameRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            games: BTreeMap::new(),
        };
        registry.register(GameProfile {
            id: "mtg".to_string(),
            name: "Magic: The Gathering".to_string(),
            default_card_type: "mtg".to_string(),
        });
        registry
    }

    pub fn register(&mut self, profile: GameProfile) {
        self.games.insert(profile.id.clone(), profile);
    }

    pub fn get(&self, id: &str) -> Result<&GameProfile, ConfigurationError> {
        self.games
            .get(id)
            .ok_or_else(|| ConfigurationError::UnknownGame(id.to_string()))
    }

    pub fn games(&self) -> impl Iterator<Item = &GameProfile> {
        self.games.values()
    }
}

impl Default for GameRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_lists_machines_by_id() {
        let ids: Vec<_> = default_machines().machines().map(|m| m.id()).collect();
        assert_eq!(ids, ["hand", "silhouette"]);

        let silhouette = default_machines().get("silhouette").unwrap();
        assert_eq!(silhouette.name(), "Silhouette Cameo (Type 1 Marks)");
        assert!(silhouette.supports_registration_marks());
        assert_eq!(silhouette.cut_file_extension(), "dxf");

        let hand = default_machines().get("hand").unwrap();
        assert!(!hand.supports_registration_marks());
        assert_eq!(hand.bleed_mm(), 0.5);

        // 多次访问得到同一实例
        assert!(std::ptr::eq(default_machines(), default_machines()));
    }

    #[test]
    fn unknown_ids_are_configuration_errors() {
        let err = MachineRegistry::new().get("cricut").err().unwrap();
        assert_eq!(err, ConfigurationError::UnknownMachine("cricut".into()));

        let games = GameRegistry::new();
        assert_eq!(games.get("mtg").unwrap().default_card_type, "mtg");
        assert_eq!(
            games.get("pokemon").unwrap_err(),
            ConfigurationError::UnknownGame("pokemon".into())
        );
    }

    #[test]
    fn custom_registrations_replace_by_id() {
        let mut registry = MachineRegistry::empty();
        assert_eq!(registry.machines().count(), 0);
        registry.register(ManualCutter);
        registry.register(ManualCutter);
        let ids: Vec<_> = registry.available_machines().copied().collect();
        assert_eq!(ids, ["hand"]);
    }
}
