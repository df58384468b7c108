//! Property tests: arbitrary record/delete sequences against `StockLedger`
//! on an in-memory SQLite database.

use proptest::prelude::*;
use tokio::runtime::Runtime;

use textileops_core::{DomainError, MovementId, Money, Units};
use textileops_infra::inventory::ItemRepository;
use textileops_infra::{connect, DbConfig, StockLedger, StoreError};
use textileops_inventory::{MovementType, NegativeStockPolicy, NewItem, RecordMovement};

#[derive(Debug, Clone)]
enum Op {
    Record(MovementType, i64),
    /// Delete the n-th movement ever recorded (modulo), live or already gone.
    Delete(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (any::<bool>(), 1i64..500_000).prop_map(|(inward, milli)| {
            let kind = if inward { MovementType::Inward } else { MovementType::Outward };
            Op::Record(kind, milli)
        }),
        (0usize..32).prop_map(Op::Delete),
    ]
}

fn runtime() -> Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

/// What one step observed, compared against the model after the run.
#[derive(Debug)]
struct Step {
    quantity: Units,
    consistent: bool,
}

/// Apply `ops` and return the stored quantity after each step, alongside
/// the quantity a plain running sum predicts.
async fn run(
    policy: NegativeStockPolicy,
    opening_milli: i64,
    ops: Vec<Op>,
) -> Result<Vec<(Step, Units)>, String> {
    let pool = connect(&DbConfig::in_memory()).await.map_err(|e| e.to_string())?;
    let items = ItemRepository::new(pool.clone());
    let ledger = StockLedger::new(pool, policy);
    let item = items
        .create(NewItem {
            code: "FAB-P".to_string(),
            name: "Poplin".to_string(),
            item_type: "Fabric".to_string(),
            unit: "m".to_string(),
            opening_quantity: Units::from_milli(opening_milli),
            unit_cost: Money::from_minor(9_000),
            description: None,
        })
        .await
        .map_err(|e| e.to_string())?;

    let mut expected = Units::from_milli(opening_milli);
    let mut recorded: Vec<(MovementId, Units)> = Vec::new();
    let mut live: Vec<MovementId> = Vec::new();
    let mut steps = Vec::new();

    for op in ops {
        match op {
            Op::Record(kind, milli) => {
                let cmd = RecordMovement::parse(
                    item.id.get(),
                    kind.as_str(),
                    "2024-07-01",
                    Units::from_milli(milli),
                    None,
                    None,
                )
                .map_err(|e| e.to_string())?;
                let delta = cmd.signed_delta();
                match ledger.record(cmd).await {
                    Ok(done) => {
                        expected = expected + delta;
                        recorded.push((done.movement.id, delta));
                        live.push(done.movement.id);
                    }
                    Err(StoreError::Domain(DomainError::InsufficientStock { .. }))
                        if policy == NegativeStockPolicy::Reject => {}
                    Err(other) => return Err(format!("record failed: {other}")),
                }
            }
            Op::Delete(n) if !recorded.is_empty() => {
                let (id, delta) = recorded[n % recorded.len()];
                match ledger.delete(id).await {
                    Ok(_) => {
                        expected = expected - delta;
                        live.retain(|m| *m != id);
                    }
                    Err(StoreError::Domain(DomainError::NotFound("movement")))
                        if !live.contains(&id) => {}
                    Err(StoreError::Domain(DomainError::InsufficientStock { .. }))
                        if policy == NegativeStockPolicy::Reject => {}
                    Err(other) => return Err(format!("delete of {id} failed: {other}")),
                }
            }
            Op::Delete(_) => {}
        }

        let reconciliation = ledger.reconcile(item.id).await.map_err(|e| e.to_string())?;
        steps.push((
            Step {
                quantity: reconciliation.actual_quantity,
                consistent: reconciliation.consistent,
            },
            expected,
        ));
    }
    Ok(steps)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 48,
        ..ProptestConfig::default()
    })]

    /// At every step the stored quantity equals the opening quantity plus the
    /// signed sum of the movements that currently exist.
    #[test]
    fn stored_quantity_tracks_the_surviving_movements(
        opening in 0i64..1_000_000,
        ops in prop::collection::vec(op(), 0..40)
    ) {
        let steps = runtime()
            .block_on(run(NegativeStockPolicy::Allow, opening, ops))
            .map_err(TestCaseError::fail)?;
        for (step, expected) in steps {
            prop_assert_eq!(step.quantity, expected);
            prop_assert!(step.consistent);
        }
    }

    /// Under the rejecting policy stock never goes below zero, and refused
    /// operations leave no trace.
    #[test]
    fn rejecting_policy_never_overdraws(
        opening in 0i64..200_000,
        ops in prop::collection::vec(op(), 0..40)
    ) {
        let steps = runtime()
            .block_on(run(NegativeStockPolicy::Reject, opening, ops))
            .map_err(TestCaseError::fail)?;
        for (step, expected) in steps {
            prop_assert_eq!(step.quantity, expected);
            prop_assert!(!step.quantity.is_negative());
            prop_assert!(step.consistent);
        }
    }
}
