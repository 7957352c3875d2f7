use std::collections::VecDeque;

use rand::Rng;
use resupply_core::collaborators::{DecisionChannel, DecisionPrompt, EncounterSystem};
use resupply_core::dice::roll_2d6;
use resupply_core::procurement::AvailabilityProcurement;
use resupply_core::{
    perform_resupply, resolve_interception, Campaign, Collaborators, Contract, ConvoyRef,
    EventEnvelope, FocusAllocation, InterceptionOutcome, MoraleLevel, Money,
    PendingInterception, ResupplyContent, ResupplyMode, ResupplyOutcome, ResupplyRequest,
    Valuation,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

// ---------------------------------------------------------------------------
// Decision sources
// ---------------------------------------------------------------------------

/// Answers every prompt without a player:
/// 1. Commit player convoys when asked (configurable).
/// 2. Accept itineraries and smuggler offers up to the spending limit.
/// 3. Keep the configured focus, or whatever the operation proposes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AutoDecisions {
    #[serde(default = "default_true")]
    pub use_player_convoy: bool,
    #[serde(default)]
    pub focus: Option<FocusAllocation>,
    /// Itineraries and offers above this price are declined.
    #[serde(default)]
    pub spending_limit: Option<Money>,
}

fn default_true() -> bool {
    true
}

impl Default for AutoDecisions {
    fn default() -> Self {
        Self {
            use_player_convoy: true,
            focus: None,
            spending_limit: None,
        }
    }
}

impl AutoDecisions {
    pub fn new() -> Self {
        Self::default()
    }

    fn affordable(&self, price: Money) -> bool {
        self.spending_limit.map_or(true, |limit| price <= limit)
    }
}

impl DecisionChannel for AutoDecisions {
    fn ask_yes_no(&mut self, prompt: &DecisionPrompt) -> bool {
        let answer = match prompt {
            DecisionPrompt::UsePlayerConvoy { mandatory, .. } => {
                *mandatory || self.use_player_convoy
            }
            DecisionPrompt::ConfirmItinerary { price, .. }
            | DecisionPrompt::SmugglerOffer { price, .. } => self.affordable(*price),
        };
        debug!(?prompt, answer, "auto decision");
        answer
    }

    fn ask_focus_allocation(&mut self, current: &FocusAllocation) -> FocusAllocation {
        self.focus.unwrap_or(*current)
    }
}

/// Replays a fixed list of answers, recording each prompt it was shown.
///
/// Running out of answers is a scripting error and panics.
#[derive(Debug, Clone, Default)]
pub struct ScriptedDecisions {
    answers: VecDeque<bool>,
    focus: VecDeque<FocusAllocation>,
    seen: Vec<DecisionPrompt>,
}

impl ScriptedDecisions {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: answers.into_iter().collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_focus(mut self, focus: FocusAllocation) -> Self {
        self.focus.push_back(focus);
        self
    }

    pub fn seen(&self) -> &[DecisionPrompt] {
        &self.seen
    }

    pub fn remaining(&self) -> usize {
        self.answers.len()
    }
}

impl DecisionChannel for ScriptedDecisions {
    fn ask_yes_no(&mut self, prompt: &DecisionPrompt) -> bool {
        self.seen.push(prompt.clone());
        let Some(answer) = self.answers.pop_front() else {
            panic!("scripted decisions ran out of answers at {prompt:?}");
        };
        answer
    }

    fn ask_focus_allocation(&mut self, current: &FocusAllocation) -> FocusAllocation {
        self.focus.pop_front().unwrap_or(*current)
    }
}

// ---------------------------------------------------------------------------
// Interception resolution
// ---------------------------------------------------------------------------

/// Decides who wins an interception scenario.
pub trait InterceptionResolver {
    fn decide(
        &mut self,
        campaign: &Campaign,
        pending: &PendingInterception,
        rng: &mut impl Rng,
    ) -> bool;
}

/// Auto-resolves scenarios: 2d6 plus the convoy's strength against 7 plus
/// the enemy's morale offset from stalemate.
#[derive(Debug, Clone, Copy, Default)]
pub struct AutoBattleResolver;

/// Escort bonus for the employer's own convoys.
const NPC_ESCORT_STRENGTH: i32 = 1;
/// Cap on the bonus a player convoy gets from its unit count.
const MAX_CONVOY_STRENGTH: i32 = 3;
const BATTLE_TARGET: i32 = 7;

#[allow(clippy::cast_possible_wrap, clippy::cast_possible_truncation)]
pub fn convoy_strength(campaign: &Campaign, convoy: &ConvoyRef) -> i32 {
    match convoy {
        ConvoyRef::Npc => NPC_ESCORT_STRENGTH,
        ConvoyRef::Player(force) => {
            (campaign.force_units(force).len() as i32).min(MAX_CONVOY_STRENGTH)
        }
    }
}

#[allow(clippy::cast_possible_wrap)]
pub fn morale_offset(morale: MoraleLevel) -> i32 {
    morale.ordinal() as i32 - MoraleLevel::Stalemate.ordinal() as i32
}

impl InterceptionResolver for AutoBattleResolver {
    #[allow(clippy::cast_possible_wrap)]
    fn decide(
        &mut self,
        campaign: &Campaign,
        pending: &PendingInterception,
        rng: &mut impl Rng,
    ) -> bool {
        let morale = campaign
            .contract(&pending.contract_id)
            .map_or(MoraleLevel::Stalemate, |contract| contract.morale);
        let roll = roll_2d6(rng) as i32;
        let strength = convoy_strength(campaign, &pending.convoy);
        let target = BATTLE_TARGET + morale_offset(morale);
        let victory = roll + strength >= target;
        debug!(
            scenario = %pending.scenario.id,
            roll,
            strength,
            target,
            victory,
            "interception auto-resolved"
        );
        victory
    }
}

/// Settles every pending interception in order.
pub fn settle_interceptions(
    resolver: &mut impl InterceptionResolver,
    campaign: &mut Campaign,
    pending: Vec<PendingInterception>,
    content: &ResupplyContent,
    rng: &mut impl Rng,
) -> Vec<(InterceptionOutcome, Vec<EventEnvelope>)> {
    pending
        .into_iter()
        .map(|pending| {
            let victory = resolver.decide(campaign, &pending, rng);
            info!(scenario = %pending.scenario.id, victory, "scenario settled");
            resolve_interception(campaign, pending, victory, content, rng)
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// What one resupply on one day came to.
#[derive(Debug, Clone)]
pub struct DayReport {
    pub day: u64,
    pub mode: ResupplyMode,
    pub outcome: ResupplyOutcome,
    pub items: usize,
    pub valuation: Valuation,
    pub interceptions: Vec<InterceptionOutcome>,
    pub events: Vec<EventEnvelope>,
}

/// Runs every active contract's resupplies on a fixed day interval, with
/// the contract-end drop on each contract's last day.
#[derive(Debug, Clone)]
pub struct ResupplyScheduler {
    interval: u64,
    drop_count: u32,
    pub decisions: AutoDecisions,
    pub resolver: AutoBattleResolver,
}

impl ResupplyScheduler {
    pub fn new(interval: u64, drop_count: u32) -> Self {
        assert!(interval > 0, "resupply interval must be at least one day");
        Self {
            interval,
            drop_count,
            decisions: AutoDecisions::new(),
            resolver: AutoBattleResolver,
        }
    }

    /// The mode due for `contract` on `day`, if any.
    pub fn due(&self, contract: &Contract, day: u64) -> Option<ResupplyMode> {
        if day < contract.start_day || day > contract.end_day {
            return None;
        }
        if day == contract.end_day {
            return Some(ResupplyMode::ContractEnd);
        }
        let elapsed = day - contract.start_day;
        (elapsed > 0 && elapsed % self.interval == 0).then_some(ResupplyMode::Normal)
    }

    /// Moves the campaign one day on and performs whatever falls due.
    pub fn advance_day(
        &mut self,
        campaign: &mut Campaign,
        content: &ResupplyContent,
        encounters: &mut impl EncounterSystem,
        rng: &mut impl Rng,
    ) -> Vec<DayReport> {
        campaign.day += 1;
        let due: Vec<(Contract, ResupplyMode)> = campaign
            .contracts
            .iter()
            .filter_map(|contract| {
                self.due(contract, campaign.day)
                    .map(|mode| (contract.clone(), mode))
            })
            .collect();
        due.into_iter()
            .map(|(contract, mode)| {
                self.resupply(campaign, &contract, mode, content, encounters, rng)
            })
            .collect()
    }

    fn resupply(
        &mut self,
        campaign: &mut Campaign,
        contract: &Contract,
        mode: ResupplyMode,
        content: &ResupplyContent,
        encounters: &mut impl EncounterSystem,
        rng: &mut impl Rng,
    ) -> DayReport {
        let report = perform_resupply(
            campaign,
            contract,
            ResupplyRequest {
                mode,
                drop_count: self.drop_count,
            },
            content,
            Collaborators {
                procurement: &AvailabilityProcurement::new(content),
                encounters,
                decisions: &mut self.decisions,
            },
            rng,
        );
        let mut events = report.events;
        let mut interceptions = Vec::new();
        for (outcome, settled) in
            settle_interceptions(&mut self.resolver, campaign, report.pending, content, rng)
        {
            interceptions.push(outcome);
            events.extend(settled);
        }
        DayReport {
            day: campaign.day,
            mode,
            outcome: report.outcome,
            items: report.operation.contents().len(),
            valuation: report.operation.valuation(),
            interceptions,
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use resupply_core::collaborators::ScenarioHandle;
    use resupply_core::test_fixtures::{base_campaign, base_content};
    use resupply_core::{ContractId, ForceId, ScenarioId, TrackId};

    fn itinerary(price: i64) -> DecisionPrompt {
        DecisionPrompt::ConfirmItinerary {
            items: 3,
            mass: 10.0,
            price: Money(price),
            player_convoy: false,
        }
    }

    fn pending(convoy: ConvoyRef) -> PendingInterception {
        PendingInterception {
            scenario: ScenarioHandle {
                id: ScenarioId("scn_0001".to_string()),
                template: "Convoy Ambush (Ground)".to_string(),
                track: TrackId("track_north".to_string()),
                force: None,
            },
            convoy,
            contract_id: ContractId("contract_1".to_string()),
            loot: vec![],
            charge: Money::ZERO,
        }
    }

    #[test]
    fn test_auto_decisions_respect_spending_limit() {
        let mut decisions = AutoDecisions {
            spending_limit: Some(Money(50_000)),
            ..AutoDecisions::new()
        };
        assert!(decisions.ask_yes_no(&itinerary(50_000)));
        assert!(!decisions.ask_yes_no(&itinerary(50_001)));
        assert!(!decisions.ask_yes_no(&DecisionPrompt::SmugglerOffer {
            items: 1,
            price: Money(90_000),
        }));
    }

    #[test]
    fn test_auto_decisions_always_accept_mandated_convoy() {
        let mut decisions = AutoDecisions {
            use_player_convoy: false,
            ..AutoDecisions::new()
        };
        let optional = DecisionPrompt::UsePlayerConvoy {
            mandatory: false,
            capacity: 40.0,
            target_mass: 10,
        };
        let mandated = DecisionPrompt::UsePlayerConvoy {
            mandatory: true,
            capacity: 40.0,
            target_mass: 10,
        };
        assert!(!decisions.ask_yes_no(&optional));
        assert!(decisions.ask_yes_no(&mandated));
    }

    #[test]
    fn test_auto_focus_override() {
        let ammo_heavy = FocusAllocation {
            general: 0.2,
            armor: 0.2,
            ammo: 0.6,
        };
        let mut decisions = AutoDecisions {
            focus: Some(ammo_heavy),
            ..AutoDecisions::new()
        };
        assert_eq!(
            decisions.ask_focus_allocation(&FocusAllocation::default()),
            ammo_heavy
        );
        assert_eq!(
            AutoDecisions::new().ask_focus_allocation(&FocusAllocation::default()),
            FocusAllocation::default()
        );
    }

    #[test]
    fn test_scripted_decisions_replay_in_order() {
        let mut decisions = ScriptedDecisions::new([true, false]);
        assert!(decisions.ask_yes_no(&itinerary(1)));
        assert!(!decisions.ask_yes_no(&itinerary(2)));
        assert_eq!(decisions.seen().len(), 2);
        assert_eq!(decisions.remaining(), 0);
    }

    #[test]
    #[should_panic(expected = "ran out of answers")]
    fn test_scripted_decisions_panic_when_exhausted() {
        let mut decisions = ScriptedDecisions::default();
        decisions.ask_yes_no(&itinerary(1));
    }

    #[test]
    fn test_convoy_strength_caps_at_three() {
        let content = base_content();
        let campaign = base_campaign(&content);
        let convoy = ConvoyRef::Player(ForceId("force_convoy".to_string()));
        assert_eq!(convoy_strength(&campaign, &convoy), 2);
        let lance = ConvoyRef::Player(ForceId("force_lance".to_string()));
        assert_eq!(convoy_strength(&campaign, &lance), 3);
        assert_eq!(convoy_strength(&campaign, &ConvoyRef::Npc), 1);
    }

    #[test]
    fn test_morale_shifts_the_target() {
        assert_eq!(morale_offset(MoraleLevel::Routed), -3);
        assert_eq!(morale_offset(MoraleLevel::Stalemate), 0);
        assert_eq!(morale_offset(MoraleLevel::Overwhelming), 3);
    }

    #[test]
    fn test_routed_enemy_always_loses() {
        let content = base_content();
        let mut campaign = base_campaign(&content);
        campaign.contracts[0].morale = MoraleLevel::Routed;
        let mut resolver = AutoBattleResolver;
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        // Target 4. Two trucks add 2, so even snake eyes wins.
        let player = pending(ConvoyRef::Player(ForceId("force_convoy".to_string())));
        for _ in 0..50 {
            assert!(resolver.decide(&campaign, &player, &mut rng));
        }
    }

    #[test]
    fn test_schedule_runs_on_interval_and_contract_end() {
        let scheduler = ResupplyScheduler::new(30, 1);
        let mut contract = resupply_core::test_fixtures::base_contract();
        contract.start_day = 10;
        contract.end_day = 100;
        assert_eq!(scheduler.due(&contract, 5), None);
        assert_eq!(scheduler.due(&contract, 10), None);
        assert_eq!(scheduler.due(&contract, 40), Some(ResupplyMode::Normal));
        assert_eq!(scheduler.due(&contract, 41), None);
        assert_eq!(scheduler.due(&contract, 100), Some(ResupplyMode::ContractEnd));
        assert_eq!(scheduler.due(&contract, 130), None);
    }

    #[test]
    #[should_panic(expected = "at least one day")]
    fn test_zero_interval_panics() {
        ResupplyScheduler::new(0, 1);
    }

    #[test]
    fn test_settled_defeat_loses_the_convoy() {
        let content = base_content();
        let mut campaign = base_campaign(&content);
        campaign.contracts[0].morale = MoraleLevel::Overwhelming;

        struct AlwaysLose;
        impl InterceptionResolver for AlwaysLose {
            fn decide(
                &mut self,
                _campaign: &Campaign,
                _pending: &PendingInterception,
                _rng: &mut impl Rng,
            ) -> bool {
                false
            }
        }

        let force = ForceId("force_convoy".to_string());
        let results = settle_interceptions(
            &mut AlwaysLose,
            &mut campaign,
            vec![pending(ConvoyRef::Player(force.clone()))],
            &content,
            &mut ChaCha8Rng::seed_from_u64(1),
        );
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].0, InterceptionOutcome::Abandoned);
        assert!(campaign.force_units(&force).is_empty());
    }
}
