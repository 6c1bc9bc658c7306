//! The combat phase machine.
//!
//! ```text
//! BattleStart -> TurnStart -> ActionSelect (party) -> ActionExecute -> TurnEnd
//!                    ^      \-> ActionExecute (enemy) -^               |
//!                    \------------------- next turn -------------------/
//! TurnEnd -> BattleEnd (one side wiped out) -> TransitionOut
//! ActionExecute -> BattleEnd (successful flee)
//! ```

use crate::combat::{
    roll_turn_order, CombatConfig, CombatOutcome, CombatParticipant, CombatReport, DamageRoll,
    Rewards, Team, AttackRoll,
};
use crate::components::{apply_health_delta, Abilities, Health, OnHitEffect, Stats, StatusEffects};
use crate::ecs::{Entity, EntityManager};
use crate::{GameError, GameResult};
use log::{debug, info};
use rand::Rng;

/// Messages kept in the battle log.
const MAX_LOG_LINES: usize = 64;

/// Status effect time that passes on each of an actor's turns.
pub const SECONDS_PER_TURN: f32 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatPhase {
    BattleStart,
    TurnStart,
    /// Waiting for the party member on turn to pick an action
    ActionSelect,
    ActionExecute,
    TurnEnd,
    BattleEnd,
    /// The battle is over and the owning state should leave
    TransitionOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatAction {
    Attack { target: Entity },
    /// Doubles defense until the actor's next turn
    Defend,
    /// Uses ability `index` from the actor's [`Abilities`]
    Ability { index: usize, target: Entity },
    Flee,
}

/// Runs one battle at a time.
///
/// # Examples
///
/// ```
/// use emberfall::combat::{CombatConfig, CombatEngine, CombatPhase};
/// use emberfall::{EntityManager, Health};
/// use rand::rngs::StdRng;
/// use rand::SeedableRng;
///
/// let mut world = EntityManager::new();
/// let hero = world.create_entity();
/// world.add_component(hero, Health::new(30));
/// let slime = world.create_entity();
/// world.add_component(slime, Health::new(5));
///
/// let mut rng = StdRng::seed_from_u64(1);
/// let mut engine = CombatEngine::new(CombatConfig::instant());
/// engine.initialize_combat(&world, &[hero], &[slime], &mut rng).unwrap();
/// assert_eq!(engine.phase(), CombatPhase::BattleStart);
/// ```
#[derive(Debug, Clone)]
pub struct CombatEngine {
    config: CombatConfig,
    participants: Vec<CombatParticipant>,
    /// Indices into `participants`, best roll first
    turn_order: Vec<usize>,
    turn_index: usize,
    round: u32,
    phase: CombatPhase,
    phase_timer: f32,
    pending: Option<CombatAction>,
    outcome: Option<CombatOutcome>,
    rewards: Rewards,
    log: Vec<String>,
}

impl CombatEngine {
    pub fn new(config: CombatConfig) -> Self {
        Self {
            config,
            participants: Vec::new(),
            turn_order: Vec::new(),
            turn_index: 0,
            round: 0,
            phase: CombatPhase::TransitionOut,
            phase_timer: 0.0,
            pending: None,
            outcome: None,
            rewards: Rewards::default(),
            log: Vec::new(),
        }
    }

    /// Starts a battle between `players` and `enemies`.
    ///
    /// Entities without [`Health`] or already dead are left out. Fails with
    /// [`GameError::InvalidState`] unless both sides have a living combatant.
    pub fn initialize_combat(
        &mut self,
        world: &EntityManager,
        players: &[Entity],
        enemies: &[Entity],
        rng: &mut impl Rng,
    ) -> GameResult<()> {
        *self = Self::new(self.config.clone());

        let sides = players
            .iter()
            .map(|&entity| (entity, Team::Player))
            .chain(enemies.iter().map(|&entity| (entity, Team::Enemy)));
        for (entity, team) in sides {
            match CombatParticipant::from_world(world, entity, team) {
                Some(participant) if participant.is_alive() => self.participants.push(participant),
                _ => debug!("{} cannot fight, leaving it out", entity),
            }
        }

        if !self.side_alive(Team::Player) || !self.side_alive(Team::Enemy) {
            self.phase = CombatPhase::TransitionOut;
            return Err(GameError::InvalidState(
                "combat needs a living combatant on each side".to_string(),
            ));
        }

        let foes = self.living(Team::Enemy).len();
        info!(
            "Battle started: {} party members vs {} enemies",
            self.living(Team::Player).len(),
            foes
        );
        self.push_log(format!("{} foes appear!", foes));
        self.start_round(rng);
        self.set_phase(CombatPhase::BattleStart);
        Ok(())
    }

    /// Advances the phase machine by `dt` seconds. At most one phase change
    /// happens per call.
    pub fn update(&mut self, dt: f32, world: &mut EntityManager, rng: &mut impl Rng) {
        self.phase_timer += dt;
        match self.phase {
            CombatPhase::BattleStart => {
                if self.phase_timer >= self.config.phase_delay {
                    self.set_phase(CombatPhase::TurnStart);
                }
            }
            CombatPhase::TurnStart => self.begin_turn(world, rng),
            CombatPhase::ActionSelect => {}
            CombatPhase::ActionExecute => {
                if self.phase_timer >= self.config.action_delay {
                    self.execute_pending(world, rng);
                }
            }
            CombatPhase::TurnEnd => self.end_turn(world),
            CombatPhase::BattleEnd => {
                if self.phase_timer >= self.config.phase_delay {
                    self.set_phase(CombatPhase::TransitionOut);
                }
            }
            CombatPhase::TransitionOut => {}
        }
    }

    /// Chooses the action for the party member on turn.
    ///
    /// Only valid during [`CombatPhase::ActionSelect`]. Attack and ability
    /// targets must be living opponents, and the ability must be usable.
    pub fn select_action(&mut self, action: CombatAction, world: &EntityManager) -> GameResult<()> {
        if self.phase != CombatPhase::ActionSelect {
            return Err(GameError::InvalidState(format!(
                "cannot select an action during {:?}",
                self.phase
            )));
        }
        let actor = self
            .current_actor()
            .map(|actor| (actor.entity, actor.team))
            .ok_or_else(|| GameError::InvalidState("no combatant is on turn".to_string()))?;

        match action {
            CombatAction::Attack { target } => self.require_living_opponent(actor.1, target)?,
            CombatAction::Ability { index, target } => {
                self.require_living_opponent(actor.1, target)?;
                let usable = world
                    .get_component::<Abilities>(actor.0)
                    .map(|abilities| abilities.can_use(index))
                    .unwrap_or(false);
                if !usable {
                    return Err(GameError::InvalidAction(format!(
                        "ability {} is not ready",
                        index
                    )));
                }
            }
            CombatAction::Defend | CombatAction::Flee => {}
        }

        self.pending = Some(action);
        self.set_phase(CombatPhase::ActionExecute);
        Ok(())
    }

    pub fn phase(&self) -> CombatPhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn config(&self) -> &CombatConfig {
        &self.config
    }

    pub fn participants(&self) -> &[CombatParticipant] {
        &self.participants
    }

    pub fn participant(&self, entity: Entity) -> Option<&CombatParticipant> {
        self.participants.iter().find(|p| p.entity == entity)
    }

    /// This round's order, best roll first. Includes combatants who died
    /// during the round.
    pub fn turn_order(&self) -> impl Iterator<Item = &CombatParticipant> {
        self.turn_order.iter().map(|&index| &self.participants[index])
    }

    pub fn current_actor(&self) -> Option<&CombatParticipant> {
        self.turn_order
            .get(self.turn_index)
            .map(|&index| &self.participants[index])
    }

    /// Living members of `team` in participant order.
    pub fn living(&self, team: Team) -> Vec<Entity> {
        self.participants
            .iter()
            .filter(|p| p.team == team && p.is_alive())
            .map(|p| p.entity)
            .collect()
    }

    pub fn log(&self) -> &[String] {
        &self.log
    }

    pub fn outcome(&self) -> Option<CombatOutcome> {
        self.outcome
    }

    pub fn rewards(&self) -> Rewards {
        self.rewards
    }

    pub fn is_finished(&self) -> bool {
        self.phase == CombatPhase::TransitionOut
    }

    /// Summary of a finished battle.
    pub fn report(&self) -> Option<CombatReport> {
        let outcome = self.outcome?;
        Some(CombatReport {
            outcome,
            rewards: self.rewards,
            defeated_enemies: self
                .participants
                .iter()
                .filter(|p| p.team == Team::Enemy && !p.is_alive())
                .map(|p| p.entity)
                .collect(),
            party_health: self
                .participants
                .iter()
                .filter(|p| p.team == Team::Player)
                .map(|p| (p.entity, p.health))
                .collect(),
            rounds: self.round,
        })
    }

    fn set_phase(&mut self, phase: CombatPhase) {
        if self.phase != phase {
            debug!("combat phase {:?} -> {:?}", self.phase, phase);
        }
        self.phase = phase;
        self.phase_timer = 0.0;
    }

    fn push_log(&mut self, line: String) {
        debug!("combat: {}", line);
        self.log.push(line);
        if self.log.len() > MAX_LOG_LINES {
            let excess = self.log.len() - MAX_LOG_LINES;
            self.log.drain(..excess);
        }
    }

    fn side_alive(&self, team: Team) -> bool {
        self.participants
            .iter()
            .any(|p| p.team == team && p.is_alive())
    }

    fn index_of(&self, entity: Entity) -> Option<usize> {
        self.participants.iter().position(|p| p.entity == entity)
    }

    fn require_living_opponent(&self, team: Team, target: Entity) -> GameResult<()> {
        match self.participant(target) {
            Some(p) if p.team == team.opponent() && p.is_alive() => Ok(()),
            Some(_) => Err(GameError::InvalidAction(format!(
                "{} is not a living opponent",
                target
            ))),
            None => Err(GameError::InvalidAction(format!(
                "{} is not in this battle",
                target
            ))),
        }
    }

    fn start_round(&mut self, rng: &mut impl Rng) {
        self.round += 1;
        self.turn_order = roll_turn_order(&mut self.participants, rng);
        self.turn_index = 0;
        debug!("round {} order: {:?}", self.round, self.turn_order);
    }

    /// Index of the next living participant on turn, starting new rounds as
    /// needed.
    fn next_actor(&mut self, world: &EntityManager, rng: &mut impl Rng) -> Option<usize> {
        // Two full passes are enough to find anyone still standing
        let mut budget = self.participants.len() * 2 + 2;
        while budget > 0 {
            budget -= 1;
            if self.turn_index >= self.turn_order.len() {
                self.start_round(rng);
                if self.turn_order.is_empty() {
                    return None;
                }
            }
            let index = self.turn_order[self.turn_index];
            self.participants[index].refresh(world);
            if self.participants[index].is_alive() {
                return Some(index);
            }
            self.turn_index += 1;
        }
        None
    }

    fn begin_turn(&mut self, world: &mut EntityManager, rng: &mut impl Rng) {
        if self.check_battle_over(world) {
            return;
        }
        let Some(index) = self.next_actor(world, rng) else {
            self.check_battle_over(world);
            return;
        };

        self.participants[index].defending = false;
        let (entity, team) = (self.participants[index].entity, self.participants[index].team);
        if let Some(abilities) = world.get_component_mut::<Abilities>(entity) {
            abilities.tick_cooldowns();
        }

        let stunned = world
            .get_component::<StatusEffects>(entity)
            .map(|effects| effects.is_stunned())
            .unwrap_or(false);
        self.tick_status(world, index);
        if stunned {
            let name = self.participants[index].name.clone();
            self.push_log(format!("{} is stunned and loses the turn.", name));
            self.set_phase(CombatPhase::TurnEnd);
            return;
        }
        if !self.participants[index].is_alive() {
            self.set_phase(CombatPhase::TurnEnd);
            return;
        }

        match team {
            Team::Player => self.set_phase(CombatPhase::ActionSelect),
            Team::Enemy => {
                self.pending = self.choose_enemy_action();
                let next = if self.pending.is_some() {
                    CombatPhase::ActionExecute
                } else {
                    CombatPhase::TurnEnd
                };
                self.set_phase(next);
            }
        }
    }

    /// Runs the actor's status effects down by one turn.
    fn tick_status(&mut self, world: &mut EntityManager, index: usize) {
        let entity = self.participants[index].entity;
        let Some(effects) = world.get_component_mut::<StatusEffects>(entity) else {
            return;
        };
        let delta = effects.advance(SECONDS_PER_TURN);
        if delta == 0 {
            return;
        }
        if let Some(health) = world.get_component_mut::<Health>(entity) {
            apply_health_delta(health, delta);
        }
        self.participants[index].refresh(world);

        let name = self.participants[index].name.clone();
        if delta < 0 {
            self.push_log(format!("{} suffers {} poison damage.", name, -delta));
            if !self.participants[index].is_alive() {
                self.push_log(format!("{} is defeated!", name));
            }
        } else {
            self.push_log(format!("{} regenerates {} health.", name, delta));
        }
    }

    fn inflict(&mut self, world: &mut EntityManager, target: Entity, effect: OnHitEffect) {
        let Some(target_index) = self.index_of(target) else {
            return;
        };
        if !self.participants[target_index].is_alive() {
            return;
        }
        match world.get_component_mut::<StatusEffects>(target) {
            Some(effects) => effects.apply(effect.to_effect()),
            None => {
                let mut effects = StatusEffects::default();
                effects.apply(effect.to_effect());
                world.add_component(target, effects);
            }
        }
        let name = self.participants[target_index].name.clone();
        debug!("{} gains {:?} for {}s", name, effect.kind, effect.duration);
        self.push_log(format!("{} is afflicted with {:?}.", name, effect.kind));
    }

    /// Enemies attack the living party member with the least health.
    fn choose_enemy_action(&self) -> Option<CombatAction> {
        self.participants
            .iter()
            .filter(|p| p.team == Team::Player && p.is_alive())
            .min_by_key(|p| p.health)
            .map(|target| CombatAction::Attack {
                target: target.entity,
            })
    }

    fn execute_pending(&mut self, world: &mut EntityManager, rng: &mut impl Rng) {
        let (Some(action), Some(&actor)) = (self.pending.take(), self.turn_order.get(self.turn_index))
        else {
            self.set_phase(CombatPhase::TurnEnd);
            return;
        };
        let actor_name = self.participants[actor].name.clone();
        let actor_entity = self.participants[actor].entity;

        match action {
            CombatAction::Attack { target } => {
                self.resolve_attack(world, rng, actor, target, 1.0, None);
            }
            CombatAction::Ability { index, target } => {
                let used = world
                    .get_component_mut::<Abilities>(actor_entity)
                    .and_then(|abilities| abilities.use_ability(index));
                match used {
                    Some(ability) => {
                        let landed = self.resolve_attack(
                            world,
                            rng,
                            actor,
                            target,
                            ability.power_multiplier,
                            Some(ability.name.as_str()),
                        );
                        if let (true, Some(effect)) = (landed, ability.on_hit) {
                            self.inflict(world, target, effect);
                        }
                    }
                    None => self.push_log(format!("{} fumbles the ability.", actor_name)),
                }
            }
            CombatAction::Defend => {
                self.participants[actor].defending = true;
                self.push_log(format!("{} braces for impact.", actor_name));
            }
            CombatAction::Flee => {
                if rng.gen::<f32>() < self.config.flee_success_rate {
                    self.push_log(format!("{} leads the party away!", actor_name));
                    self.finish(CombatOutcome::Fled, world);
                    return;
                }
                self.push_log(format!("{} could not escape!", actor_name));
            }
        }

        self.set_phase(CombatPhase::TurnEnd);
    }

    fn resolve_attack(
        &mut self,
        world: &mut EntityManager,
        rng: &mut impl Rng,
        actor: usize,
        target: Entity,
        power_multiplier: f32,
        ability: Option<&str>,
    ) -> bool {
        let attacker_name = self.participants[actor].name.clone();
        let Some(target_index) = self.index_of(target) else {
            self.push_log(format!("{} swings at nothing.", attacker_name));
            return false;
        };
        let target_name = self.participants[target_index].name.clone();

        let attacker_stats = stats_of(world, self.participants[actor].entity);
        let target_stats = stats_of(world, target);
        let mut defense = target_stats.defense;
        if self.participants[target_index].defending {
            defense *= 2;
        }

        let roll = DamageRoll {
            attack_power: attacker_stats.attack_power,
            defense,
            accuracy: attacker_stats.accuracy,
            power_multiplier,
            variance: self.config.damage_variance,
            crit_chance: attacker_stats.crit_chance,
            crit_multiplier: self.config.crit_multiplier,
        }
        .roll(rng);

        let verb = ability.map(|name| format!("uses {} on", name));
        let verb = verb.as_deref().unwrap_or("attacks");
        match roll {
            AttackRoll::Miss => {
                self.push_log(format!("{} {} {} but misses.", attacker_name, verb, target_name));
                false
            }
            AttackRoll::Hit { damage, critical } => {
                let dealt = world
                    .get_component_mut::<Health>(target)
                    .map(|health| health.apply_damage(damage))
                    .unwrap_or(0);
                self.participants[target_index].refresh(world);

                let crit = if critical { " Critical hit!" } else { "" };
                self.push_log(format!(
                    "{} {} {} for {} damage.{}",
                    attacker_name, verb, target_name, dealt, crit
                ));
                if !self.participants[target_index].is_alive() {
                    self.push_log(format!("{} is defeated!", target_name));
                }
                true
            }
        }
    }

    fn end_turn(&mut self, world: &EntityManager) {
        for participant in &mut self.participants {
            participant.refresh(world);
        }
        if self.check_battle_over(world) {
            return;
        }
        self.turn_index += 1;
        self.set_phase(CombatPhase::TurnStart);
    }

    /// Ends the battle if either side has been wiped out.
    fn check_battle_over(&mut self, world: &EntityManager) -> bool {
        let outcome = if !self.side_alive(Team::Enemy) {
            CombatOutcome::Victory
        } else if !self.side_alive(Team::Player) {
            CombatOutcome::Defeat
        } else {
            return false;
        };
        self.finish(outcome, world);
        true
    }

    fn finish(&mut self, outcome: CombatOutcome, world: &EntityManager) {
        if outcome == CombatOutcome::Victory {
            let levels: Vec<u32> = self
                .participants
                .iter()
                .filter(|p| p.team == Team::Enemy)
                .map(|p| stats_of(world, p.entity).level)
                .collect();
            self.rewards = Rewards::for_defeated(&levels);
            self.push_log(format!(
                "Victory! Gained {} experience and {} points.",
                self.rewards.experience, self.rewards.score
            ));
        } else if outcome == CombatOutcome::Defeat {
            self.push_log("The party has fallen...".to_string());
        }

        info!("Battle ended after {} rounds: {:?}", self.round, outcome);
        self.outcome = Some(outcome);
        self.pending = None;
        self.set_phase(CombatPhase::BattleEnd);
    }
}

fn stats_of(world: &EntityManager, entity: Entity) -> Stats {
    world
        .get_component::<Stats>(entity)
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::EXPERIENCE_PER_ENEMY_LEVEL;
    use crate::components::{Ability, Name, StatusEffect, StatusKind};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn fighter(world: &mut EntityManager, name: &str, hp: i32, stats: Stats) -> Entity {
        let e = world.create_entity();
        world.add_component(e, Name(name.to_string()));
        world.add_component(e, Health::new(hp));
        world.add_component(e, stats);
        e
    }

    fn sure_hit(attack_power: i32, initiative: i32) -> Stats {
        Stats {
            attack_power,
            defense: 0,
            accuracy: 100.0,
            initiative,
            crit_chance: 0.0,
            ..Stats::default()
        }
    }

    fn no_variance() -> CombatConfig {
        CombatConfig {
            damage_variance: 0.0,
            ..CombatConfig::instant()
        }
    }

    /// Updates until `phase` or the battle is over.
    fn run_until(
        engine: &mut CombatEngine,
        world: &mut EntityManager,
        rng: &mut StdRng,
        phase: CombatPhase,
    ) {
        for _ in 0..200 {
            if engine.phase() == phase || engine.is_finished() {
                return;
            }
            engine.update(0.1, world, rng);
        }
        panic!("combat stuck in {:?}", engine.phase());
    }

    #[test]
    fn test_requires_both_sides() {
        let mut world = EntityManager::new();
        let hero = fighter(&mut world, "Hero", 10, Stats::default());
        let mut rng = StdRng::seed_from_u64(0);
        let mut engine = CombatEngine::new(CombatConfig::instant());

        let result = engine.initialize_combat(&world, &[hero], &[], &mut rng);
        assert!(matches!(result, Err(GameError::InvalidState(_))));
    }

    #[test]
    fn test_victory_grants_rewards() {
        let mut world = EntityManager::new();
        let hero = fighter(&mut world, "Hero", 100, sure_hit(50, 200));
        let slime = fighter(&mut world, "Slime", 10, sure_hit(1, 1));
        let mut rng = StdRng::seed_from_u64(42);
        let mut engine = CombatEngine::new(no_variance());
        engine
            .initialize_combat(&world, &[hero], &[slime], &mut rng)
            .unwrap();

        run_until(&mut engine, &mut world, &mut rng, CombatPhase::ActionSelect);
        assert_eq!(engine.current_actor().map(|a| a.entity), Some(hero));
        engine
            .select_action(CombatAction::Attack { target: slime }, &world)
            .unwrap();
        run_until(&mut engine, &mut world, &mut rng, CombatPhase::TransitionOut);

        assert_eq!(engine.outcome(), Some(CombatOutcome::Victory));
        assert_eq!(engine.rewards().experience, EXPERIENCE_PER_ENEMY_LEVEL);
        let report = engine.report().unwrap();
        assert_eq!(report.defeated_enemies, vec![slime]);
        assert_eq!(report.party_health, vec![(hero, 100)]);
        assert!(world.get_component::<Health>(slime).unwrap().is_dead());
    }

    #[test]
    fn test_defeat_has_no_rewards() {
        let mut world = EntityManager::new();
        let hero = fighter(&mut world, "Hero", 5, sure_hit(1, 1));
        let ogre = fighter(&mut world, "Ogre", 100, sure_hit(50, 200));
        let mut rng = StdRng::seed_from_u64(3);
        let mut engine = CombatEngine::new(no_variance());
        engine
            .initialize_combat(&world, &[hero], &[ogre], &mut rng)
            .unwrap();

        run_until(&mut engine, &mut world, &mut rng, CombatPhase::TransitionOut);
        assert_eq!(engine.outcome(), Some(CombatOutcome::Defeat));
        assert_eq!(engine.rewards(), Rewards::default());
    }

    #[test]
    fn test_successful_flee_ends_battle() {
        let mut world = EntityManager::new();
        let hero = fighter(&mut world, "Hero", 100, sure_hit(1, 200));
        let ogre = fighter(&mut world, "Ogre", 100, sure_hit(1, 1));
        let mut rng = StdRng::seed_from_u64(8);
        let config = CombatConfig {
            flee_success_rate: 1.0,
            ..no_variance()
        };
        let mut engine = CombatEngine::new(config);
        engine
            .initialize_combat(&world, &[hero], &[ogre], &mut rng)
            .unwrap();

        run_until(&mut engine, &mut world, &mut rng, CombatPhase::ActionSelect);
        engine.select_action(CombatAction::Flee, &world).unwrap();
        run_until(&mut engine, &mut world, &mut rng, CombatPhase::TransitionOut);

        assert_eq!(engine.outcome(), Some(CombatOutcome::Fled));
        assert_eq!(engine.rewards(), Rewards::default());
        assert!(engine.report().unwrap().defeated_enemies.is_empty());
    }

    #[test]
    fn test_select_action_validation() {
        let mut world = EntityManager::new();
        let hero = fighter(&mut world, "Hero", 100, sure_hit(1, 200));
        let ally = fighter(&mut world, "Ally", 100, sure_hit(1, 1));
        let ogre = fighter(&mut world, "Ogre", 100, sure_hit(1, 1));
        let mut rng = StdRng::seed_from_u64(8);
        let mut engine = CombatEngine::new(no_variance());
        engine
            .initialize_combat(&world, &[hero, ally], &[ogre], &mut rng)
            .unwrap();

        assert!(matches!(
            engine.select_action(CombatAction::Defend, &world),
            Err(GameError::InvalidState(_))
        ));

        run_until(&mut engine, &mut world, &mut rng, CombatPhase::ActionSelect);
        assert!(matches!(
            engine.select_action(CombatAction::Attack { target: ally }, &world),
            Err(GameError::InvalidAction(_))
        ));
        assert!(matches!(
            engine.select_action(CombatAction::Ability { index: 0, target: ogre }, &world),
            Err(GameError::InvalidAction(_))
        ));
        assert_eq!(engine.phase(), CombatPhase::ActionSelect);
    }

    #[test]
    fn test_ability_spends_mana_and_hits_harder() {
        let mut world = EntityManager::new();
        let hero = fighter(&mut world, "Hero", 100, sure_hit(20, 200));
        world.add_component(
            hero,
            Abilities::new(vec![Ability::new("Fireball", 2.0, 10, 2)], 10, 0.0),
        );
        let golem = fighter(&mut world, "Golem", 100, sure_hit(1, 1));
        let mut rng = StdRng::seed_from_u64(5);
        let mut engine = CombatEngine::new(no_variance());
        engine
            .initialize_combat(&world, &[hero], &[golem], &mut rng)
            .unwrap();

        run_until(&mut engine, &mut world, &mut rng, CombatPhase::ActionSelect);
        engine
            .select_action(CombatAction::Ability { index: 0, target: golem }, &world)
            .unwrap();
        run_until(&mut engine, &mut world, &mut rng, CombatPhase::TurnEnd);

        assert_eq!(world.get_component::<Health>(golem).unwrap().current, 60);
        let abilities = world.get_component::<Abilities>(hero).unwrap();
        assert_eq!(abilities.mana, 0);
        assert!(!abilities.can_use(0));
    }

    #[test]
    fn test_defend_halves_incoming_damage() {
        let mut world = EntityManager::new();
        let hero_stats = Stats {
            defense: 10,
            ..sure_hit(1, 200)
        };
        let hero = fighter(&mut world, "Hero", 100, hero_stats);
        let ogre = fighter(&mut world, "Ogre", 100, sure_hit(30, 1));
        let mut rng = StdRng::seed_from_u64(12);
        let mut engine = CombatEngine::new(no_variance());
        engine
            .initialize_combat(&world, &[hero], &[ogre], &mut rng)
            .unwrap();

        run_until(&mut engine, &mut world, &mut rng, CombatPhase::ActionSelect);
        engine.select_action(CombatAction::Defend, &world).unwrap();
        run_until(&mut engine, &mut world, &mut rng, CombatPhase::ActionSelect);

        // 30 attack against a doubled 10 defense
        assert_eq!(world.get_component::<Health>(hero).unwrap().current, 90);
        assert!(!engine.participant(hero).unwrap().defending);
    }

    #[test]
    fn test_enemy_targets_weakest_party_member() {
        let mut world = EntityManager::new();
        let tank = fighter(&mut world, "Tank", 100, sure_hit(1, 1));
        let mage = fighter(&mut world, "Mage", 40, sure_hit(1, 1));
        let wolf = fighter(&mut world, "Wolf", 100, sure_hit(5, 500));
        let mut rng = StdRng::seed_from_u64(21);
        let mut engine = CombatEngine::new(no_variance());
        engine
            .initialize_combat(&world, &[tank, mage], &[wolf], &mut rng)
            .unwrap();

        run_until(&mut engine, &mut world, &mut rng, CombatPhase::ActionSelect);
        assert_eq!(world.get_component::<Health>(tank).unwrap().current, 100);
        assert_eq!(world.get_component::<Health>(mage).unwrap().current, 35);
    }

    #[test]
    fn test_stunned_actor_loses_turn() {
        let mut world = EntityManager::new();
        let hero = fighter(&mut world, "Hero", 100, sure_hit(1, 1));
        let wolf = fighter(&mut world, "Wolf", 100, sure_hit(5, 500));
        let mut effects = StatusEffects::default();
        effects.apply(StatusEffect::new(StatusKind::Stun, 1.0, 10.0));
        world.add_component(wolf, effects);
        let mut rng = StdRng::seed_from_u64(2);
        let mut engine = CombatEngine::new(no_variance());
        engine
            .initialize_combat(&world, &[hero], &[wolf], &mut rng)
            .unwrap();

        run_until(&mut engine, &mut world, &mut rng, CombatPhase::ActionSelect);
        assert_eq!(world.get_component::<Health>(hero).unwrap().current, 100);
        assert!(engine.log().iter().any(|line| line.contains("stunned")));
    }

    #[test]
    fn test_short_stun_wears_off_mid_battle() {
        let mut world = EntityManager::new();
        let hero = fighter(&mut world, "Hero", 100, sure_hit(1, 200));
        let mut effects = StatusEffects::default();
        effects.apply(StatusEffect::new(StatusKind::Stun, 1.0, 0.5));
        world.add_component(hero, effects);
        let ogre = fighter(&mut world, "Ogre", 100, sure_hit(5, 1));
        let mut rng = StdRng::seed_from_u64(8);
        let mut engine = CombatEngine::new(no_variance());
        engine
            .initialize_combat(&world, &[hero], &[ogre], &mut rng)
            .unwrap();

        run_until(&mut engine, &mut world, &mut rng, CombatPhase::ActionSelect);
        assert_eq!(engine.phase(), CombatPhase::ActionSelect);
        assert_eq!(engine.current_actor().map(|p| p.entity), Some(hero));
        assert!(world.get_component::<Health>(hero).unwrap().current < 100);
        assert!(!world.get_component::<StatusEffects>(hero).unwrap().is_stunned());
        assert!(engine.log().iter().any(|line| line.contains("Hero is stunned")));
    }

    #[test]
    fn test_ability_on_hit_effect_stuns_target() {
        let mut world = EntityManager::new();
        let hero = fighter(&mut world, "Hero", 100, sure_hit(5, 200));
        let lance = Ability::new("Frost Lance", 1.0, 0, 0).with_effect(StatusKind::Stun, 1.0, 1.0);
        world.add_component(hero, Abilities::new(vec![lance], 0, 0.0));
        let ogre = fighter(&mut world, "Ogre", 100, sure_hit(30, 1));
        let mut rng = StdRng::seed_from_u64(9);
        let mut engine = CombatEngine::new(no_variance());
        engine
            .initialize_combat(&world, &[hero], &[ogre], &mut rng)
            .unwrap();

        run_until(&mut engine, &mut world, &mut rng, CombatPhase::ActionSelect);
        engine
            .select_action(CombatAction::Ability { index: 0, target: ogre }, &world)
            .unwrap();
        run_until(&mut engine, &mut world, &mut rng, CombatPhase::TurnEnd);
        assert!(world.get_component::<StatusEffects>(ogre).unwrap().is_stunned());

        // The ogre spends its turn stunned and the stun runs out
        run_until(&mut engine, &mut world, &mut rng, CombatPhase::ActionSelect);
        assert_eq!(world.get_component::<Health>(hero).unwrap().current, 100);
        assert!(!world.get_component::<StatusEffects>(ogre).unwrap().is_stunned());
        assert!(engine.log().iter().any(|line| line.contains("Ogre is afflicted")));
        assert!(engine.log().iter().any(|line| line.contains("Ogre is stunned")));
    }

    #[test]
    fn test_poison_ticks_once_per_turn() {
        let mut world = EntityManager::new();
        let hero = fighter(&mut world, "Hero", 100, sure_hit(1, 200));
        let mut effects = StatusEffects::default();
        effects.apply(StatusEffect::new(StatusKind::Poison, 4.0, 2.0));
        world.add_component(hero, effects);
        let slime = fighter(&mut world, "Slime", 100, sure_hit(1, 1));
        let mut rng = StdRng::seed_from_u64(10);
        let mut engine = CombatEngine::new(no_variance());
        engine
            .initialize_combat(&world, &[hero], &[slime], &mut rng)
            .unwrap();

        run_until(&mut engine, &mut world, &mut rng, CombatPhase::ActionSelect);
        assert_eq!(world.get_component::<Health>(hero).unwrap().current, 96);
        assert!(engine.log().iter().any(|line| line.contains("poison damage")));
    }
}
