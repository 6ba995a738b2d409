//! Scripted requests exercising each workflow outcome.

use std::time::Duration;

use domain::{Channel, LineItem, Money, OrderRequest};
use saga::{ExecutionOptions, WorkflowError, cancellation};
use serde::Serialize;

use crate::world::{SandboxCoordinator, World};

const ADDRESS: &str = "12 Harbour Rd, Portsmouth, UK";

/// What one scripted request ended as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScenarioOutcome {
    pub scenario: &'static str,
    pub outcome: String,
    pub detail: String,
}

impl ScenarioOutcome {
    fn from_result(
        scenario: &'static str,
        result: Result<saga::OrderConfirmation, WorkflowError>,
    ) -> Self {
        match result {
            Ok(confirmation) => Self {
                scenario,
                outcome: "committed".to_string(),
                detail: format!(
                    "{} preset, {} reservation(s), total {}",
                    confirmation.preset.as_str(),
                    confirmation.reservations.len(),
                    confirmation.total
                ),
            },
            Err(WorkflowError::Rejected(rejection)) => Self {
                scenario,
                outcome: "rejected".to_string(),
                detail: rejection.reasons.join("; "),
            },
            Err(WorkflowError::InvalidRequest(e)) => Self {
                scenario,
                outcome: "invalid_request".to_string(),
                detail: e.to_string(),
            },
            Err(WorkflowError::Execution { kind, message }) => Self {
                scenario,
                outcome: kind.as_str().to_string(),
                detail: message,
            },
            Err(e @ WorkflowError::Fatal { .. }) => Self {
                scenario,
                outcome: "fatal".to_string(),
                detail: e.to_string(),
            },
        }
    }
}

fn line(resource: &str, quantity: u32, dollars: i64) -> LineItem {
    LineItem::new(resource, resource.trim_start_matches("sku-"), quantity, Money::from_dollars(dollars))
}

/// Runs every scenario in order against `world`. Later scenarios see the
/// stock earlier ones consumed.
pub async fn run_all(coordinator: &SandboxCoordinator, world: &World) -> Vec<ScenarioOutcome> {
    let mut outcomes = Vec::new();

    let request = OrderRequest::for_customer(world.regular)
        .with_line(line("sku-widget", 2, 15))
        .with_line(line("sku-gadget", 1, 40))
        .ship_to(ADDRESS);
    outcomes.push(ScenarioOutcome::from_result(
        "standard_order",
        coordinator.execute(request).await,
    ));

    let request = OrderRequest::for_guest("sam@example.com")
        .with_line(line("sku-gizmo", 1, 30))
        .ship_to(ADDRESS);
    outcomes.push(ScenarioOutcome::from_result(
        "guest_checkout",
        coordinator.execute(request).await,
    ));

    let request = OrderRequest::for_customer(world.closed)
        .with_line(line("sku-widget", 1, 15))
        .ship_to(ADDRESS);
    outcomes.push(ScenarioOutcome::from_result(
        "closed_account",
        coordinator.execute(request).await,
    ));

    let request = OrderRequest::for_customer(world.newcomer)
        .with_line(line("sku-gizmo", 2, 900))
        .ship_to(ADDRESS);
    outcomes.push(ScenarioOutcome::from_result(
        "high_value_new_account",
        coordinator.execute(request).await,
    ));

    let request = OrderRequest::for_customer(world.regular)
        .with_line(line("sku-widget", 1, 15))
        .via_channel(Channel::Internal);
    outcomes.push(ScenarioOutcome::from_result(
        "internal_transfer",
        coordinator.execute(request).await,
    ));

    // The fact snapshot still reports the original gadget stock
    let request = OrderRequest::for_customer(world.regular)
        .with_line(line("sku-widget", 1, 15))
        .with_line(line("sku-gadget", 5, 40))
        .ship_to(ADDRESS);
    outcomes.push(ScenarioOutcome::from_result(
        "oversold_gadget",
        coordinator.execute(request).await,
    ));

    world.repository.set_fail_on_commit(true);
    let request = OrderRequest::for_customer(world.regular)
        .with_line(line("sku-widget", 1, 15))
        .with_line(line("sku-gizmo", 1, 30))
        .ship_to(ADDRESS);
    outcomes.push(ScenarioOutcome::from_result(
        "store_outage",
        coordinator.execute(request).await,
    ));
    world.repository.set_fail_on_commit(false);

    let (handle, signal) = cancellation();
    handle.cancel();
    let request = OrderRequest::for_customer(world.regular)
        .with_line(line("sku-widget", 1, 15))
        .ship_to(ADDRESS);
    outcomes.push(ScenarioOutcome::from_result(
        "caller_cancelled",
        coordinator
            .execute_with(request, ExecutionOptions::new().with_cancel(signal))
            .await,
    ));

    world.facts.set_latency(Duration::from_millis(50));
    let request = OrderRequest::for_customer(world.regular)
        .with_line(line("sku-widget", 1, 15))
        .ship_to(ADDRESS);
    outcomes.push(ScenarioOutcome::from_result(
        "slow_fact_source",
        coordinator
            .execute_with(
                request,
                ExecutionOptions::new().with_timeout(Duration::from_millis(10)),
            )
            .await,
    ));

    outcomes
}
