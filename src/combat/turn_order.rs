//! Initiative rolls and turn ordering.

use crate::combat::CombatParticipant;
use rand::Rng;

/// Lower bound of the initiative jitter multiplier.
pub const INITIATIVE_JITTER_MIN: f32 = 0.8;
/// Upper bound of the initiative jitter multiplier.
pub const INITIATIVE_JITTER_MAX: f32 = 1.2;

/// Re-rolls every living participant's initiative and returns their indices,
/// highest roll first.
///
/// Called at the start of every round, so the order changes from round to
/// round. The sort is stable: equal rolls keep participant order.
pub fn roll_turn_order(participants: &mut [CombatParticipant], rng: &mut impl Rng) -> Vec<usize> {
    for participant in participants.iter_mut() {
        let jitter = rng.gen_range(INITIATIVE_JITTER_MIN..INITIATIVE_JITTER_MAX);
        participant.rolled_initiative = participant.initiative * jitter;
    }

    let mut order: Vec<usize> = participants
        .iter()
        .enumerate()
        .filter(|(_, participant)| participant.is_alive())
        .map(|(index, _)| index)
        .collect();
    order.sort_by(|&a, &b| {
        participants[b]
            .rolled_initiative
            .total_cmp(&participants[a].rolled_initiative)
    });
    order
}
