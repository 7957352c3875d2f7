//! Integration test: a contract's worth of monthly resupplies, with
//! interceptions fought out and the contract-end drop at the close.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use resupply_core::collaborators::{
    DecisionChannel, DecisionPrompt, EncounterSystem, ScenarioHandle,
};
use resupply_core::procurement::AvailabilityProcurement;
use resupply_core::test_fixtures::{base_campaign, base_content};
use resupply_core::*;

struct AlwaysYes;

impl DecisionChannel for AlwaysYes {
    fn ask_yes_no(&mut self, _prompt: &DecisionPrompt) -> bool {
        true
    }

    fn ask_focus_allocation(&mut self, current: &FocusAllocation) -> FocusAllocation {
        *current
    }
}

#[derive(Default)]
struct NumberedScenarios {
    issued: usize,
}

impl EncounterSystem for NumberedScenarios {
    fn generate_interception(
        &mut self,
        _contract: &Contract,
        track: &StrategicTrack,
        template: &str,
        force: Option<&ForceId>,
    ) -> Option<ScenarioHandle> {
        self.issued += 1;
        Some(ScenarioHandle {
            id: ScenarioId(format!("scn_{:04}", self.issued)),
            template: template.to_string(),
            track: track.id.clone(),
            force: force.cloned(),
        })
    }
}

#[test]
fn contract_of_resupplies() {
    let content = base_content();
    let mut campaign = base_campaign(&content);
    let mut contract = campaign.contracts[0].clone();
    contract.morale = MoraleLevel::Advancing;
    let procurement = AvailabilityProcurement::new(&content);
    let mut encounters = NumberedScenarios::default();
    let mut decisions = AlwaysYes;
    let mut rng = ChaCha8Rng::seed_from_u64(7);

    let mut last_funds = campaign.funds;
    let mut last_event = 0;
    let mut completed = 0;
    for month in 0..6u64 {
        campaign.day = month * 30;
        let mode = if month == 5 {
            ResupplyMode::ContractEnd
        } else {
            ResupplyMode::Normal
        };
        let report = perform_resupply(
            &mut campaign,
            &contract,
            ResupplyRequest {
                mode,
                drop_count: 1,
            },
            &content,
            Collaborators {
                procurement: &procurement,
                encounters: &mut encounters,
                decisions: &mut decisions,
            },
            &mut rng,
        );
        if matches!(report.outcome, ResupplyOutcome::Completed { .. }) {
            completed += 1;
        }

        // Every pending scenario is settled; the player wins in even months.
        for pending in report.pending {
            let victory = month % 2 == 0;
            let (outcome, _) =
                resolve_interception(&mut campaign, pending, victory, &content, &mut rng);
            let expected = if victory {
                InterceptionOutcome::Delivered
            } else {
                InterceptionOutcome::Abandoned
            };
            assert_eq!(outcome, expected);
        }

        // A mercenary force never profits from a resupply.
        assert!(campaign.funds <= last_funds, "month {month}: funds grew");
        last_funds = campaign.funds;
        assert!(campaign.counters.next_event_id > last_event);
        last_event = campaign.counters.next_event_id;
    }

    assert!(completed > 0);
    let json = serde_json::to_string(&campaign).unwrap();
    let restored: Campaign = serde_json::from_str(&json).unwrap();
    assert_eq!(restored.funds, campaign.funds);
    assert_eq!(restored.inventory, campaign.inventory);
}

#[test]
fn same_seed_same_campaign() {
    let content = base_content();
    let run = |seed: u64| {
        let mut campaign = base_campaign(&content);
        let contract = campaign.contracts[0].clone();
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        perform_resupply(
            &mut campaign,
            &contract,
            ResupplyRequest {
                mode: ResupplyMode::Normal,
                drop_count: 3,
            },
            &content,
            Collaborators {
                procurement: &AvailabilityProcurement::new(&content),
                encounters: &mut NumberedScenarios::default(),
                decisions: &mut AlwaysYes,
            },
            &mut rng,
        );
        serde_json::to_string(&campaign.inventory).unwrap()
    };
    assert_eq!(run(11), run(11));
}
