//! The player's party and its progression between battles.

use crate::components::{Health, Stats};
use crate::config::CharacterTemplate;
use crate::ecs::{Entity, EntityManager};
use log::{debug, info};

pub const MAX_PARTY_SIZE: usize = 4;

/// Stat growth per level gained.
pub const LEVEL_UP_GROWTH: f32 = 1.1;

/// Experience needed to go from `level` to `level + 1`.
///
/// # Examples
///
/// ```
/// use emberfall::game::experience_to_next;
///
/// assert_eq!(experience_to_next(1), 100);
/// assert_eq!(experience_to_next(4), 400);
/// ```
pub fn experience_to_next(level: u32) -> u32 {
    100u32.saturating_mul(level.max(1))
}

/// One persistent party member. Lives across battles; the entity that
/// represents it in the world is spawned and despawned as needed.
#[derive(Debug, Clone, PartialEq)]
pub struct PartyMember {
    pub name: String,
    pub template_id: String,
    pub level: u32,
    /// Experience toward the next level
    pub experience: u32,
    pub max_health: i32,
    pub current_health: i32,
    pub stats: Stats,
    /// The entity currently representing this member, if any
    pub entity: Option<Entity>,
}

impl PartyMember {
    pub fn from_template(
        name: impl Into<String>,
        template_id: impl Into<String>,
        template: &CharacterTemplate,
    ) -> Self {
        Self {
            name: name.into(),
            template_id: template_id.into(),
            level: template.stats.level.max(1),
            experience: 0,
            max_health: template.max_health,
            current_health: template.max_health,
            stats: template.stats.clone(),
            entity: None,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.current_health > 0
    }

    fn level_up(&mut self) {
        let grow = |value: i32| ((value as f32) * LEVEL_UP_GROWTH).round() as i32;
        self.level += 1;
        self.stats.level = self.level;
        self.stats.attack_power = grow(self.stats.attack_power);
        self.stats.defense = grow(self.stats.defense);

        let new_max = grow(self.max_health);
        if self.is_alive() {
            self.current_health += new_max - self.max_health;
        }
        self.max_health = new_max;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartyManager {
    members: Vec<PartyMember>,
}

impl PartyManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a member and returns its slot, or `None` when the party is full.
    pub fn add_member(&mut self, member: PartyMember) -> Option<usize> {
        if self.members.len() >= MAX_PARTY_SIZE {
            return None;
        }
        self.members.push(member);
        Some(self.members.len() - 1)
    }

    pub fn members(&self) -> &[PartyMember] {
        &self.members
    }

    pub fn member(&self, slot: usize) -> Option<&PartyMember> {
        self.members.get(slot)
    }

    pub fn member_mut(&mut self, slot: usize) -> Option<&mut PartyMember> {
        self.members.get_mut(slot)
    }

    /// The member the player controls while exploring.
    pub fn leader(&self) -> Option<&PartyMember> {
        self.members.first()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn clear(&mut self) {
        self.members.clear();
    }

    /// Slot of the member represented by `entity`.
    pub fn slot_of(&self, entity: Entity) -> Option<usize> {
        self.members
            .iter()
            .position(|member| member.entity == Some(entity))
    }

    /// Whether every member is down. An empty party counts as wiped.
    pub fn is_wiped(&self) -> bool {
        self.members.iter().all(|member| !member.is_alive())
    }

    /// Gives `experience` to every living member. Returns `(slot, level)`
    /// for each level gained.
    pub fn award_experience(&mut self, experience: u32) -> Vec<(usize, u32)> {
        let mut level_ups = Vec::new();
        for (slot, member) in self.members.iter_mut().enumerate() {
            if !member.is_alive() {
                continue;
            }
            member.experience = member.experience.saturating_add(experience);
            while member.experience >= experience_to_next(member.level) {
                member.experience -= experience_to_next(member.level);
                member.level_up();
                info!("{} reached level {}", member.name, member.level);
                level_ups.push((slot, member.level));
            }
        }
        level_ups
    }

    /// Copies current health back from each member's entity.
    pub fn sync_from_world(&mut self, world: &EntityManager) {
        for member in &mut self.members {
            let Some(entity) = member.entity else {
                continue;
            };
            if let Some(health) = world.get_component::<Health>(entity) {
                member.current_health = health.current;
            }
        }
    }

    /// Forgets every entity handle, for when the world is cleared.
    pub fn detach_entities(&mut self) {
        for member in &mut self.members {
            member.entity = None;
        }
    }

    /// Brings every downed member back with `health` hit points. Returns
    /// the revived slots.
    pub fn revive_fallen(&mut self, health: i32) -> Vec<usize> {
        let mut revived = Vec::new();
        for (slot, member) in self.members.iter_mut().enumerate() {
            if member.is_alive() {
                continue;
            }
            member.current_health = health.clamp(1, member.max_health.max(1));
            debug!("{} is back on their feet", member.name);
            revived.push(slot);
        }
        revived
    }

    /// Restores every member to full health.
    pub fn heal_all(&mut self) {
        for member in &mut self.members {
            member.current_health = member.max_health;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TemplateLibrary;

    fn warrior() -> PartyMember {
        let library = TemplateLibrary::builtin();
        PartyMember::from_template("Ash", "warrior", library.get("warrior").unwrap())
    }

    #[test]
    fn test_party_size_is_capped() {
        let mut party = PartyManager::new();
        for _ in 0..MAX_PARTY_SIZE {
            assert!(party.add_member(warrior()).is_some());
        }
        assert!(party.add_member(warrior()).is_none());
    }

    #[test]
    fn test_experience_levels_up_with_growth() {
        let mut party = PartyManager::new();
        party.add_member(warrior());

        // 100 for level 2, 200 more for level 3, 50 left over
        let ups = party.award_experience(350);
        assert_eq!(ups, vec![(0, 2), (0, 3)]);

        let member = party.member(0).unwrap();
        assert_eq!(member.level, 3);
        assert_eq!(member.experience, 50);
        // 16 -> 18 -> 20 attack, 120 -> 132 -> 145 health
        assert_eq!(member.stats.attack_power, 20);
        assert_eq!(member.max_health, 145);
        assert_eq!(member.current_health, 145);
    }

    #[test]
    fn test_fallen_members_get_no_experience() {
        let mut party = PartyManager::new();
        party.add_member(warrior());
        party.add_member(warrior());
        party.member_mut(1).unwrap().current_health = 0;

        party.award_experience(100);
        assert_eq!(party.member(0).unwrap().level, 2);
        assert_eq!(party.member(1).unwrap().level, 1);
        assert!(!party.is_wiped());
    }

    #[test]
    fn test_revive_fallen_only_touches_downed_members() {
        let mut party = PartyManager::new();
        party.add_member(warrior());
        party.add_member(warrior());
        party.member_mut(0).unwrap().current_health = 0;
        party.member_mut(1).unwrap().current_health = 40;

        assert_eq!(party.revive_fallen(1), vec![0]);
        assert_eq!(party.member(0).unwrap().current_health, 1);
        assert_eq!(party.member(1).unwrap().current_health, 40);
        assert!(party.revive_fallen(1).is_empty());
    }

    #[test]
    fn test_sync_from_world() {
        let mut world = EntityManager::new();
        let mut party = PartyManager::new();
        party.add_member(warrior());
        let e = world.create_entity();
        let mut health = Health::new(120);
        health.current = 33;
        world.add_component(e, health);
        party.member_mut(0).unwrap().entity = Some(e);

        party.sync_from_world(&world);
        assert_eq!(party.member(0).unwrap().current_health, 33);
        assert_eq!(party.slot_of(e), Some(0));
    }
}
