use super::*;
use crate::collaborators::{
    DecisionChannel, DecisionPrompt, EncounterSystem, ScenarioHandle, UnitGenerator,
};
use crate::procurement::PassThroughProcurement;
use crate::test_fixtures::{base_campaign, base_content, make_rng, unit_from_template};
use rand::Rng;
use std::collections::VecDeque;

mod pools;
mod selection;

// --- Shared test helpers ------------------------------------------------

/// Answers yes/no prompts from a queue (yes once it runs dry) and records
/// every prompt it saw.
#[derive(Default)]
struct Scripted {
    answers: VecDeque<bool>,
    focus: Option<FocusAllocation>,
    prompts: Vec<DecisionPrompt>,
}

impl Scripted {
    fn answering(answers: &[bool]) -> Self {
        Self {
            answers: answers.iter().copied().collect(),
            ..Self::default()
        }
    }
}

impl DecisionChannel for Scripted {
    fn ask_yes_no(&mut self, prompt: &DecisionPrompt) -> bool {
        self.prompts.push(prompt.clone());
        self.answers.pop_front().unwrap_or(true)
    }

    fn ask_focus_allocation(&mut self, current: &FocusAllocation) -> FocusAllocation {
        self.focus.unwrap_or(*current)
    }
}

/// Hands out numbered scenarios, or refuses every request.
struct Encounters {
    available: bool,
    requests: Vec<(TrackId, String)>,
}

impl Encounters {
    fn available() -> Self {
        Self {
            available: true,
            requests: Vec::new(),
        }
    }

    fn unavailable() -> Self {
        Self {
            available: false,
            requests: Vec::new(),
        }
    }
}

impl EncounterSystem for Encounters {
    fn generate_interception(
        &mut self,
        _contract: &Contract,
        track: &StrategicTrack,
        template: &str,
        force: Option<&ForceId>,
    ) -> Option<ScenarioHandle> {
        self.requests.push((track.id.clone(), template.to_string()));
        if !self.available {
            return None;
        }
        Some(ScenarioHandle {
            id: ScenarioId(format!("scn_{:04}", self.requests.len())),
            template: template.to_string(),
            track: track.id.clone(),
            force: force.cloned(),
        })
    }
}

/// Builds units from the first fixture template of the requested class.
struct FixtureGenerator {
    content: ResupplyContent,
    issued: u32,
}

impl UnitGenerator for FixtureGenerator {
    fn generate_unit(
        &mut self,
        _faction: &FactionId,
        weight_class: WeightClass,
        _year: u32,
        _rng: &mut impl Rng,
    ) -> Option<Unit> {
        let template = self
            .content
            .unit_templates
            .iter()
            .find(|t| t.weight_class == weight_class && t.unit_type == UnitType::Mek)?;
        self.issued += 1;
        let id = format!("cache_unit_{}", self.issued);
        Some(unit_from_template(&self.content, &template.id.0, &id, &[]))
    }
}

fn run(
    campaign: &mut Campaign,
    contract: &Contract,
    request: ResupplyRequest,
    content: &ResupplyContent,
    decisions: &mut Scripted,
    encounters: &mut Encounters,
) -> ResupplyReport {
    run_with_rng(
        campaign,
        contract,
        request,
        content,
        decisions,
        encounters,
        &mut make_rng(),
    )
}

fn run_with_rng(
    campaign: &mut Campaign,
    contract: &Contract,
    request: ResupplyRequest,
    content: &ResupplyContent,
    decisions: &mut Scripted,
    encounters: &mut Encounters,
    rng: &mut impl Rng,
) -> ResupplyReport {
    perform_resupply(
        campaign,
        contract,
        request,
        content,
        Collaborators {
            procurement: &PassThroughProcurement,
            encounters,
            decisions,
        },
        rng,
    )
}

fn normal(drop_count: u32) -> ResupplyRequest {
    ResupplyRequest {
        mode: ResupplyMode::Normal,
        drop_count,
    }
}

fn inventory_size(campaign: &Campaign) -> usize {
    campaign.inventory.len()
}
