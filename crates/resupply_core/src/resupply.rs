//! The resupply operation state machine.
//!
//! An operation is sized from the campaign and contract, then walked through
//! convoy choice, focus selection, content generation, itinerary confirmation
//! and transit. Interceptions come back as pending scenarios which the caller
//! settles later with [`resolve_interception`].

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::collaborators::{
    DecisionChannel, DecisionPrompt, DeliverySink, EncounterSystem, ProcurementFilter,
    ScenarioHandle,
};
use crate::convoy::{assign_contents, cargo_mass, ConvoyCapacity};
use crate::delivery::DeliveryBatch;
use crate::pool::build_pools;
use crate::selector::{category_budgets, select_contents};
use crate::transit::{
    interception_chance, pick_narrative_event, roll_crew_fates, roll_transit, smuggler_swindled,
    ConvoyKind, CrewFate, TransitRoll,
};
use crate::valuation::{adjusted_value, base_value, is_friendly_resupply, value_contents, Valuation};
use crate::{
    emit, Campaign, Constants, Contract, ContractId, ConvoyRef, EventEnvelope, FocusAllocation,
    ForceId, InterceptionOutcome, Money, Part, PersonnelStatus, ResupplyContent, ResupplyEvent,
    ResupplyMode, ResupplyStage, SkillLevel,
};

// ---------------------------------------------------------------------------
// Sizing
// ---------------------------------------------------------------------------

/// Tonnage a contract owes the force per resupply.
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn calculate_target_mass(campaign: &Campaign, contract: &Contract, constants: &Constants) -> u32 {
    assert!(
        contract.resupply_scale.is_finite() && contract.resupply_scale >= 0.0,
        "contract '{}' has invalid resupply scale {}",
        contract.id,
        contract.resupply_scale,
    );
    let allowance: f64 = campaign
        .combat_units()
        .iter()
        .map(|unit| {
            constants
                .weight_class_allowance
                .get(&unit.weight_class)
                .copied()
                .unwrap_or(0.0)
        })
        .sum();
    (allowance * contract.resupply_scale).round() as u32
}

/// Smugglers deal with whoever is in charge; everyone else with logistics.
pub fn negotiation_skill(campaign: &Campaign, contract: &Contract) -> SkillLevel {
    let negotiator = if contract.contract_type.uses_smugglers() {
        campaign.ranking_officer()
    } else {
        campaign.best_negotiator()
    };
    negotiator.map_or(SkillLevel::None, |person| person.negotiation)
}

// ---------------------------------------------------------------------------
// Operation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResupplyRequest {
    pub mode: ResupplyMode,
    pub drop_count: u32,
}

/// One resupply, from sizing to transit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResupplyOperation {
    contract_id: ContractId,
    mode: ResupplyMode,
    stage: ResupplyStage,
    drop_count: u32,
    target_mass: u32,
    target_mass_player_convoy: u32,
    focus: FocusAllocation,
    negotiation_skill: SkillLevel,
    player_convoy_mandatory: bool,
    use_player_convoy: bool,
    convoy_capacity: ConvoyCapacity,
    friendly: bool,
    contents: Vec<Part>,
    valuation: Valuation,
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
impl ResupplyOperation {
    pub fn new(
        campaign: &Campaign,
        contract: &Contract,
        request: ResupplyRequest,
        content: &ResupplyContent,
    ) -> Self {
        let mode = if request.mode == ResupplyMode::Normal
            && contract.contract_type.uses_smugglers()
        {
            ResupplyMode::Smuggler
        } else {
            request.mode
        };
        let target_mass = calculate_target_mass(campaign, contract, &content.constants);
        let convoy_capacity = ConvoyCapacity::from_forces(campaign);
        let capacity_tons = convoy_capacity.total().floor().max(0.0) as u32;
        let player_convoy_mandatory =
            mode.allows_player_choices() && contract.command_rights.mandates_player_convoy();
        let friendly = content
            .faction(&contract.employer)
            .is_some_and(|employer| is_friendly_resupply(&campaign.faction, employer));

        Self {
            contract_id: contract.id.clone(),
            mode,
            stage: ResupplyStage::Init,
            drop_count: request.drop_count,
            target_mass,
            target_mass_player_convoy: target_mass.min(capacity_tons),
            focus: content.constants.default_focus,
            negotiation_skill: negotiation_skill(campaign, contract),
            player_convoy_mandatory,
            use_player_convoy: player_convoy_mandatory,
            convoy_capacity,
            friendly,
            contents: Vec::new(),
            valuation: Valuation::default(),
        }
    }

    pub fn contract_id(&self) -> &ContractId {
        &self.contract_id
    }

    pub fn mode(&self) -> ResupplyMode {
        self.mode
    }

    pub fn stage(&self) -> ResupplyStage {
        self.stage
    }

    pub fn target_mass(&self) -> u32 {
        self.target_mass
    }

    pub fn target_mass_player_convoy(&self) -> u32 {
        self.target_mass_player_convoy
    }

    pub fn focus(&self) -> FocusAllocation {
        self.focus
    }

    pub fn negotiation_skill(&self) -> SkillLevel {
        self.negotiation_skill
    }

    pub fn uses_player_convoy(&self) -> bool {
        self.use_player_convoy
    }

    pub fn convoy_capacity(&self) -> &ConvoyCapacity {
        &self.convoy_capacity
    }

    pub fn contents(&self) -> &[Part] {
        &self.contents
    }

    pub fn valuation(&self) -> Valuation {
        self.valuation
    }

    /// Panics on negative fractions or a split above 1.0.
    pub fn set_focus(&mut self, focus: FocusAllocation) {
        focus.assert_valid();
        self.focus = focus;
    }

    /// A mandated player convoy cannot be switched off.
    pub fn set_use_player_convoy(&mut self, use_it: bool) {
        self.use_player_convoy = use_it || self.player_convoy_mandatory;
    }

    /// Mass the selector may spend, capped by convoy capacity when the
    /// player is hauling.
    pub fn budget_mass(&self) -> u32 {
        if self.use_player_convoy {
            self.target_mass_player_convoy
        } else {
            self.target_mass
        }
    }

    pub fn category_budgets(&self) -> [f64; 3] {
        category_budgets(self.budget_mass(), &self.focus)
    }

    /// Builds fresh pools and runs selection once per planned drop.
    pub fn generate_contents(
        &mut self,
        campaign: &Campaign,
        content: &ResupplyContent,
        procurement: &impl ProcurementFilter,
        log: &mut Vec<ResupplyEvent>,
        rng: &mut impl Rng,
    ) {
        let budgets = self.category_budgets();
        for drop in 1..=self.drop_count {
            let mut pools = build_pools(
                campaign,
                content,
                procurement,
                self.negotiation_skill,
                campaign.year,
                &campaign.faction,
                rng,
            );
            let selection = select_contents(
                &mut pools,
                &budgets,
                self.negotiation_skill,
                &content.constants,
                rng,
            );
            for part in &selection.declined {
                log.push(ResupplyEvent::HighValueDeclined {
                    part: part.name.clone(),
                    value: part.value,
                });
            }
            log.push(ResupplyEvent::DropGenerated {
                drop,
                items: selection.granted.len(),
                mass: cargo_mass(&selection.granted, content.constants.batch_size),
            });
            self.contents.extend(selection.granted);
        }
    }

    /// Values the accumulated contents against the contract's morale.
    pub fn value(&mut self, contract: &Contract) -> Valuation {
        self.valuation = value_contents(&self.contents, self.mode, contract.morale, self.friendly);
        self.valuation
    }

    /// Price of one load, charged when it is delivered. Smuggler goods are
    /// paid for up front.
    pub fn load_charge(&self, load: &[Part], contract: &Contract) -> Money {
        match self.mode {
            ResupplyMode::Normal | ResupplyMode::ContractEnd => {
                adjusted_value(base_value(load), self.mode, contract.morale, self.friendly)
            }
            ResupplyMode::Loot | ResupplyMode::Smuggler => Money::ZERO,
        }
    }

    fn enter(&mut self, stage: ResupplyStage, log: &mut Vec<ResupplyEvent>) {
        self.stage = stage;
        info!(contract = %self.contract_id, mode = ?self.mode, ?stage, "resupply stage");
        log.push(ResupplyEvent::StageEntered { stage });
    }
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    NoDrops,
    NoTargetMass,
    NoContents,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AbortReason {
    ConvoyDeclined,
    NoConvoyCapacity,
    ItineraryDeclined,
    OfferDeclined,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvoyResult {
    pub convoy: ConvoyRef,
    pub outcome: InterceptionOutcome,
    pub items: usize,
    pub convoy_mass: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ResupplyOutcome {
    Skipped(SkipReason),
    Aborted(AbortReason),
    Completed {
        convoys: Vec<ConvoyResult>,
        undeliverable: usize,
    },
}

/// An intercepted load waiting on its scenario.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingInterception {
    pub scenario: ScenarioHandle,
    pub convoy: ConvoyRef,
    pub contract_id: ContractId,
    pub loot: Vec<Part>,
    pub charge: Money,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResupplyReport {
    pub outcome: ResupplyOutcome,
    pub operation: ResupplyOperation,
    pub pending: Vec<PendingInterception>,
    pub events: Vec<EventEnvelope>,
}

/// Everything outside the campaign that an operation talks to.
pub struct Collaborators<'a, P, E, D> {
    pub procurement: &'a P,
    pub encounters: &'a mut E,
    pub decisions: &'a mut D,
}

type Stage = Result<(), ResupplyOutcome>;

fn skip(reason: SkipReason, log: &mut Vec<ResupplyEvent>) -> ResupplyOutcome {
    info!(?reason, "resupply skipped");
    log.push(ResupplyEvent::Skipped {
        reason: format!("{reason:?}"),
    });
    ResupplyOutcome::Skipped(reason)
}

fn abort(reason: AbortReason, log: &mut Vec<ResupplyEvent>) -> ResupplyOutcome {
    info!(?reason, "resupply aborted");
    log.push(ResupplyEvent::Aborted {
        reason: format!("{reason:?}"),
    });
    ResupplyOutcome::Aborted(reason)
}

// ---------------------------------------------------------------------------
// Stages
// ---------------------------------------------------------------------------

fn init_stage(op: &mut ResupplyOperation, log: &mut Vec<ResupplyEvent>) -> Stage {
    op.enter(ResupplyStage::Init, log);
    if op.drop_count == 0 {
        return Err(skip(SkipReason::NoDrops, log));
    }
    if op.target_mass == 0 {
        return Err(skip(SkipReason::NoTargetMass, log));
    }
    Ok(())
}

fn choose_convoy_and_focus(
    op: &mut ResupplyOperation,
    decisions: &mut impl DecisionChannel,
    log: &mut Vec<ResupplyEvent>,
) -> Stage {
    if !op.mode.allows_player_choices() {
        return Ok(());
    }

    op.enter(ResupplyStage::ConvoyChoice, log);
    if op.player_convoy_mandatory || !op.convoy_capacity.is_empty() {
        let prompt = DecisionPrompt::UsePlayerConvoy {
            mandatory: op.player_convoy_mandatory,
            capacity: op.convoy_capacity.total(),
            target_mass: op.target_mass,
        };
        let accepted = decisions.ask_yes_no(&prompt);
        if op.player_convoy_mandatory && !accepted {
            return Err(abort(AbortReason::ConvoyDeclined, log));
        }
        op.set_use_player_convoy(accepted);
    }
    if op.use_player_convoy && op.convoy_capacity.is_empty() {
        return Err(abort(AbortReason::NoConvoyCapacity, log));
    }

    op.enter(ResupplyStage::FocusSelection, log);
    let focus = decisions.ask_focus_allocation(&op.focus);
    op.set_focus(focus);
    Ok(())
}

fn generate_stage(
    op: &mut ResupplyOperation,
    campaign: &Campaign,
    contract: &Contract,
    content: &ResupplyContent,
    procurement: &impl ProcurementFilter,
    log: &mut Vec<ResupplyEvent>,
    rng: &mut impl Rng,
) -> Stage {
    op.enter(ResupplyStage::ContentGeneration, log);
    op.generate_contents(campaign, content, procurement, log, rng);
    if op.contents.is_empty() {
        return Err(skip(SkipReason::NoContents, log));
    }
    let valuation = op.value(contract);
    log.push(ResupplyEvent::ContentsValued {
        base: valuation.base,
        adjusted: valuation.adjusted,
    });
    Ok(())
}

fn confirm_stage(
    op: &mut ResupplyOperation,
    campaign: &mut Campaign,
    content: &ResupplyContent,
    decisions: &mut impl DecisionChannel,
    log: &mut Vec<ResupplyEvent>,
) -> Stage {
    let prompt = match op.mode {
        ResupplyMode::Loot | ResupplyMode::ContractEnd => return Ok(()),
        ResupplyMode::Smuggler => DecisionPrompt::SmugglerOffer {
            items: op.contents.len(),
            price: op.valuation.adjusted,
        },
        ResupplyMode::Normal => DecisionPrompt::ConfirmItinerary {
            items: op.contents.len(),
            mass: cargo_mass(&op.contents, content.constants.batch_size),
            price: op.valuation.adjusted,
            player_convoy: op.use_player_convoy,
        },
    };

    op.enter(ResupplyStage::ItineraryConfirmation, log);
    if !decisions.ask_yes_no(&prompt) {
        let reason = if op.mode == ResupplyMode::Smuggler {
            AbortReason::OfferDeclined
        } else {
            AbortReason::ItineraryDeclined
        };
        return Err(abort(reason, log));
    }
    if op.mode == ResupplyMode::Smuggler && op.valuation.adjusted > Money::ZERO {
        campaign.debit(op.valuation.adjusted, "smuggler purchase");
    }
    Ok(())
}

/// Transit-stage state shared by every load of one operation.
struct Transit<'a, E> {
    op: &'a ResupplyOperation,
    contract: &'a Contract,
    constants: &'a Constants,
    encounters: &'a mut E,
    log: &'a mut Vec<ResupplyEvent>,
    pending: Vec<PendingInterception>,
}

impl<E: EncounterSystem> Transit<'_, E> {
    /// Delivers a load and reports `arrived`, or `Abandoned` when the batch
    /// was rejected and nothing reached the inventory.
    fn deliver(
        &mut self,
        campaign: &mut Campaign,
        convoy: &ConvoyRef,
        load: &[Part],
        arrived: InterceptionOutcome,
    ) -> InterceptionOutcome {
        let charge = self.op.load_charge(load, self.contract);
        let delivered = deliver_load(campaign, convoy, load, charge, self.constants, self.log);
        delivered_or_lost(delivered, arrived)
    }

    fn run_load(
        &mut self,
        campaign: &mut Campaign,
        convoy: ConvoyRef,
        kind: ConvoyKind,
        convoy_mass: f64,
        load: Vec<Part>,
        rng: &mut impl Rng,
    ) -> ConvoyResult {
        let chance = interception_chance(self.contract.morale, convoy_mass, self.constants);
        self.log.push(ResupplyEvent::ConvoyDispatched {
            convoy: convoy.clone(),
            items: load.len(),
            convoy_mass,
            interception_chance: chance,
        });
        let items = load.len();
        let outcome = match roll_transit(kind, chance, self.constants, rng) {
            TransitRoll::Clear => {
                self.deliver(campaign, &convoy, &load, InterceptionOutcome::Delivered)
            }
            TransitRoll::Flavor => {
                let event = pick_narrative_event(rng);
                info!(convoy = %convoy, ?event, "narrative event on the road");
                self.log.push(ResupplyEvent::NarrativeEvent {
                    convoy: convoy.clone(),
                    kind: event,
                });
                self.deliver(campaign, &convoy, &load, InterceptionOutcome::NarrativeEvent)
            }
            TransitRoll::Ambush => self.ambush(campaign, &convoy, kind, load, rng),
        };
        ConvoyResult {
            convoy,
            outcome,
            items,
            convoy_mass,
        }
    }

    fn ambush(
        &mut self,
        campaign: &mut Campaign,
        convoy: &ConvoyRef,
        kind: ConvoyKind,
        load: Vec<Part>,
        rng: &mut impl Rng,
    ) -> InterceptionOutcome {
        let force = match convoy {
            ConvoyRef::Player(force) => Some(force),
            ConvoyRef::Npc => None,
        };
        match request_interception(self.contract, kind, force, self.constants, self.encounters, rng)
        {
            Ok(scenario) => {
                info!(convoy = %convoy, scenario = %scenario.id, "convoy intercepted");
                self.log.push(ResupplyEvent::Intercepted {
                    convoy: convoy.clone(),
                    scenario: scenario.id.clone(),
                });
                let charge = self.op.load_charge(&load, self.contract);
                self.pending.push(PendingInterception {
                    scenario,
                    convoy: convoy.clone(),
                    contract_id: self.contract.id.clone(),
                    loot: load,
                    charge,
                });
                InterceptionOutcome::Intercepted
            }
            Err(reason) => {
                warn!(convoy = %convoy, %reason, "interception unavailable, delivering directly");
                self.log.push(ResupplyEvent::InterceptionFallback {
                    convoy: convoy.clone(),
                    reason,
                });
                self.deliver(campaign, convoy, &load, InterceptionOutcome::Delivered)
            }
        }
    }
}

/// Picks a track that can host a deployment and asks for a scenario there.
pub fn request_interception(
    contract: &Contract,
    kind: ConvoyKind,
    force: Option<&ForceId>,
    constants: &Constants,
    encounters: &mut impl EncounterSystem,
    rng: &mut impl Rng,
) -> Result<ScenarioHandle, String> {
    let tracks: Vec<_> = contract
        .tracks
        .iter()
        .filter(|track| track.deployment_locations > 0)
        .collect();
    let Some(track) = tracks.choose(rng) else {
        return Err(format!(
            "contract '{}' has no track with a deployment location",
            contract.id
        ));
    };
    let template = kind.scenario_template(constants);
    encounters
        .generate_interception(contract, track, template, force)
        .ok_or_else(|| format!("scenario template '{template}' unavailable on track '{}'", track.id))
}

fn deliver_load(
    campaign: &mut Campaign,
    convoy: &ConvoyRef,
    load: &[Part],
    charge: Money,
    constants: &Constants,
    log: &mut Vec<ResupplyEvent>,
) -> bool {
    match DeliveryBatch::prepare(load, constants.batch_size, charge) {
        Ok(batch) => {
            let items = batch.commit(campaign, &format!("resupply via {convoy}"));
            log.push(ResupplyEvent::Delivered {
                convoy: convoy.clone(),
                items,
                charged: charge,
            });
            true
        }
        Err(fault) => {
            warn!(convoy = %convoy, %fault, "delivery rejected, nothing added");
            log.push(ResupplyEvent::DeliveryFailed {
                convoy: convoy.clone(),
                reason: fault.to_string(),
            });
            false
        }
    }
}

/// A rejected batch never reaches the inventory, so its convoy counts as lost.
fn delivered_or_lost(delivered: bool, arrived: InterceptionOutcome) -> InterceptionOutcome {
    if delivered {
        arrived
    } else {
        InterceptionOutcome::Abandoned
    }
}

fn convoy_kind(campaign: &Campaign, force: &ForceId) -> ConvoyKind {
    if campaign.force_is_ground(force) {
        ConvoyKind::PlayerGround
    } else {
        ConvoyKind::PlayerAir
    }
}

fn transit_stage<E: EncounterSystem>(
    op: &mut ResupplyOperation,
    campaign: &mut Campaign,
    contract: &Contract,
    content: &ResupplyContent,
    encounters: &mut E,
    log: &mut Vec<ResupplyEvent>,
    rng: &mut impl Rng,
) -> (ResupplyOutcome, Vec<PendingInterception>) {
    op.enter(ResupplyStage::Transit, log);
    let constants = &content.constants;
    let contents = op.contents.clone();
    let mut transit = Transit {
        op,
        contract,
        constants,
        encounters,
        log,
        pending: Vec::new(),
    };

    let mut convoys = Vec::new();
    let mut undeliverable = 0;
    match transit.op.mode {
        ResupplyMode::Loot => {
            let outcome = transit.deliver(
                campaign,
                &ConvoyRef::Npc,
                &contents,
                InterceptionOutcome::Delivered,
            );
            convoys.push(ConvoyResult {
                convoy: ConvoyRef::Npc,
                outcome,
                items: contents.len(),
                convoy_mass: 0.0,
            });
        }
        ResupplyMode::Smuggler => {
            convoys.push(smuggler_run(&mut transit, campaign, &contents, rng));
        }
        ResupplyMode::Normal | ResupplyMode::ContractEnd if transit.op.use_player_convoy => {
            let plan = assign_contents(
                &contents,
                &transit.op.convoy_capacity,
                constants.batch_size,
                rng,
            );
            for load in plan.loads {
                let kind = convoy_kind(campaign, &load.force);
                let mass = campaign.force_mass(&load.force);
                let convoy = ConvoyRef::Player(load.force);
                convoys.push(transit.run_load(campaign, convoy, kind, mass, load.contents, rng));
            }
            undeliverable = plan.undeliverable.len();
            if undeliverable > 0 {
                warn!(items = undeliverable, "convoys full, contents left behind");
                transit.log.push(ResupplyEvent::Undeliverable {
                    items: undeliverable,
                });
            }
        }
        ResupplyMode::Normal | ResupplyMode::ContractEnd => {
            let mass = f64::from(transit.op.target_mass) * constants.npc_convoy_mass_multiplier;
            let npc = ConvoyRef::Npc;
            convoys.push(transit.run_load(campaign, npc, ConvoyKind::Npc, mass, contents, rng));
        }
    }

    let pending = transit.pending;
    (
        ResupplyOutcome::Completed {
            convoys,
            undeliverable,
        },
        pending,
    )
}

fn smuggler_run<E: EncounterSystem>(
    transit: &mut Transit<'_, E>,
    campaign: &mut Campaign,
    contents: &[Part],
    rng: &mut impl Rng,
) -> ConvoyResult {
    let outcome = if smuggler_swindled(transit.contract.morale, rng) {
        let lost_value = transit.op.valuation.adjusted;
        warn!(lost = %lost_value, "smugglers vanished with the goods");
        transit.log.push(ResupplyEvent::Swindled { lost_value });
        InterceptionOutcome::Abandoned
    } else {
        transit.deliver(campaign, &ConvoyRef::Npc, contents, InterceptionOutcome::Delivered)
    };
    ConvoyResult {
        convoy: ConvoyRef::Npc,
        outcome,
        items: contents.len(),
        convoy_mass: 0.0,
    }
}

#[allow(clippy::too_many_arguments)]
fn run_stages(
    op: &mut ResupplyOperation,
    campaign: &mut Campaign,
    contract: &Contract,
    content: &ResupplyContent,
    procurement: &impl ProcurementFilter,
    decisions: &mut impl DecisionChannel,
    log: &mut Vec<ResupplyEvent>,
    rng: &mut impl Rng,
) -> Stage {
    init_stage(op, log)?;
    choose_convoy_and_focus(op, decisions, log)?;
    generate_stage(op, campaign, contract, content, procurement, log, rng)?;
    confirm_stage(op, campaign, content, decisions, log)
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Runs one resupply against `campaign` for `contract`.
pub fn perform_resupply<P, E, D>(
    campaign: &mut Campaign,
    contract: &Contract,
    request: ResupplyRequest,
    content: &ResupplyContent,
    collaborators: Collaborators<'_, P, E, D>,
    rng: &mut impl Rng,
) -> ResupplyReport
where
    P: ProcurementFilter,
    E: EncounterSystem,
    D: DecisionChannel,
{
    let Collaborators {
        procurement,
        encounters,
        decisions,
    } = collaborators;
    let mut op = ResupplyOperation::new(campaign, contract, request, content);
    let mut log = Vec::new();

    let staged = run_stages(
        &mut op,
        campaign,
        contract,
        content,
        procurement,
        decisions,
        &mut log,
        rng,
    );
    let (outcome, pending) = match staged {
        Ok(()) => transit_stage(&mut op, campaign, contract, content, encounters, &mut log, rng),
        Err(outcome) => (outcome, Vec::new()),
    };
    op.enter(ResupplyStage::Finished, &mut log);
    info!(contract = %contract.id, ?outcome, pending = pending.len(), "resupply finished");

    let events = log
        .into_iter()
        .map(|event| emit(&mut campaign.counters, campaign.day, event))
        .collect();
    ResupplyReport {
        outcome,
        operation: op,
        pending,
        events,
    }
}

/// Settles an intercepted load once its scenario is decided.
///
/// Victory delivers the loot and charges for it; defeat loses it, and a
/// player convoy is abandoned along with its crew.
pub fn resolve_interception(
    campaign: &mut Campaign,
    pending: PendingInterception,
    victory: bool,
    content: &ResupplyContent,
    rng: &mut impl Rng,
) -> (InterceptionOutcome, Vec<EventEnvelope>) {
    let mut log = Vec::new();
    let outcome = if victory {
        info!(scenario = %pending.scenario.id, convoy = %pending.convoy, "interception repelled");
        let delivered = deliver_load(
            campaign,
            &pending.convoy,
            &pending.loot,
            pending.charge,
            &content.constants,
            &mut log,
        );
        delivered_or_lost(delivered, InterceptionOutcome::Delivered)
    } else {
        let abandoned = match &pending.convoy {
            ConvoyRef::Player(force) => abandon_convoy(campaign, force, &content.constants, rng),
            ConvoyRef::Npc => AbandonedConvoy::default(),
        };
        info!(
            scenario = %pending.scenario.id,
            convoy = %pending.convoy,
            lost = pending.loot.len(),
            "interception lost"
        );
        log.push(ResupplyEvent::ConvoyAbandoned {
            convoy: pending.convoy.clone(),
            units_lost: abandoned.units_lost,
            captured: abandoned.captured,
            killed: abandoned.killed,
        });
        InterceptionOutcome::Abandoned
    };
    let events = log
        .into_iter()
        .map(|event| emit(&mut campaign.counters, campaign.day, event))
        .collect();
    (outcome, events)
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbandonedConvoy {
    pub units_lost: usize,
    pub captured: usize,
    pub killed: usize,
}

/// Every crew member rolls 2d6 for capture or death, then the force's
/// units leave the roster.
pub fn abandon_convoy(
    campaign: &mut Campaign,
    force: &ForceId,
    constants: &Constants,
    rng: &mut impl Rng,
) -> AbandonedConvoy {
    let mut unit_ids: Vec<_> = campaign
        .force_units(force)
        .iter()
        .map(|unit| unit.id.clone())
        .collect();
    unit_ids.sort();

    let mut result = AbandonedConvoy::default();
    for unit_id in unit_ids {
        let Some(unit) = campaign.remove_unit(&unit_id) else {
            continue;
        };
        for (person, fate) in roll_crew_fates(&unit.crew, constants, rng) {
            let status = match fate {
                CrewFate::Captured => {
                    result.captured += 1;
                    PersonnelStatus::PrisonerOfWar
                }
                CrewFate::KilledInAction => {
                    result.killed += 1;
                    PersonnelStatus::KilledInAction
                }
            };
            campaign.set_person_status(&person, status);
        }
        result.units_lost += 1;
    }
    warn!(
        force = %force,
        units = result.units_lost,
        captured = result.captured,
        killed = result.killed,
        "convoy abandoned"
    );
    result
}
