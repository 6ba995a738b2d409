//! Workflow coordinator: validate, then reserve and persist with compensation.

use chrono::Utc;
use domain::{Channel, CustomerId, Money, Order, OrderId, OrderRequest, RunId};
use policy::{Context, PolicyReport, PolicySet, PresetName};
use serde::Serialize;

use crate::cancel::ExecutionOptions;
use crate::config::WorkflowConfig;
use crate::error::{ExecutionErrorKind, Rejection, Result, WorkflowError};
use crate::events::WorkflowEvent;
use crate::run::{Compensation, StepKind, WorkflowRun};
use crate::services::{
    EventPublisher, FactError, FactResolver, OrderRecord, OrderRepository, ReservationCoordinator,
    ReservationId,
};
use crate::state::WorkflowState;

/// Summary of a committed order, returned to the caller.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OrderConfirmation {
    pub order_id: OrderId,
    pub run_id: RunId,
    pub customer_id: Option<CustomerId>,
    pub total: Money,
    pub line_count: usize,
    pub reservations: Vec<ReservationId>,
    pub preset: PresetName,
    pub confidence_score: u8,
    pub state_history: Vec<WorkflowState>,
}

/// Picks the policy preset for a request.
///
/// Guest beats internal, internal beats high-value; a total strictly above
/// `high_value_threshold` is high-value. Expects a request that passed
/// [`OrderRequest::validate`].
pub fn select_preset(request: &OrderRequest, high_value_threshold: Money) -> PresetName {
    if request.is_guest() {
        PresetName::Guest
    } else if request.channel == Channel::Internal {
        PresetName::Internal
    } else if request.total() > high_value_threshold {
        PresetName::HighValue
    } else {
        PresetName::Standard
    }
}

/// Drives one order request through policy validation and the
/// reserve → persist → commit steps.
///
/// Validation happens strictly before any side effect: a rejected request
/// reserves and stores nothing. Once executing, every reservation pushes a
/// release onto the run's undo stack; any later failure, cancellation or
/// missed deadline releases them in reverse order.
pub struct WorkflowCoordinator<F, R, P, M>
where
    F: FactResolver,
    R: ReservationCoordinator,
    P: OrderRepository,
    M: EventPublisher,
{
    config: WorkflowConfig,
    policies: PolicySet,
    facts: F,
    reservations: R,
    repository: P,
    publisher: M,
}

impl<F, R, P, M> WorkflowCoordinator<F, R, P, M>
where
    F: FactResolver,
    R: ReservationCoordinator,
    P: OrderRepository,
    M: EventPublisher,
{
    /// Creates a new workflow coordinator.
    pub fn new(
        config: WorkflowConfig,
        policies: PolicySet,
        facts: F,
        reservations: R,
        repository: P,
        publisher: M,
    ) -> Self {
        Self {
            config,
            policies,
            facts,
            reservations,
            repository,
            publisher,
        }
    }

    /// Returns the workflow configuration.
    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    /// Executes the workflow without a caller-supplied cancel signal.
    pub async fn execute(&self, request: OrderRequest) -> Result<OrderConfirmation> {
        self.execute_with(request, ExecutionOptions::new()).await
    }

    /// Executes the workflow, stopping at the next step boundary once
    /// `options` is cancelled or its deadline passes.
    pub async fn execute_with(
        &self,
        request: OrderRequest,
        options: ExecutionOptions,
    ) -> Result<OrderConfirmation> {
        self.execute_run(request, options).await.1
    }

    /// Like [`execute_with`](Self::execute_with), but also hands back the
    /// finished run so callers can inspect its state history.
    #[tracing::instrument(skip(self, request, options), fields(request_id = %request.request_id))]
    pub async fn execute_run(
        &self,
        request: OrderRequest,
        options: ExecutionOptions,
    ) -> (WorkflowRun, Result<OrderConfirmation>) {
        metrics::counter!("workflow_executions_total").increment(1);
        let started = std::time::Instant::now();
        let options = options.or_timeout(self.config.default_deadline);

        let mut run = WorkflowRun::start(request.request_id);
        let result = self.drive(&mut run, request, &options).await;

        let duration = started.elapsed().as_secs_f64();
        metrics::histogram!("workflow_duration_seconds").record(duration);
        match &result {
            Ok(confirmation) => {
                tracing::info!(run_id = %run.id(), order_id = %confirmation.order_id, duration, "workflow committed");
            }
            Err(e) => {
                tracing::warn!(run_id = %run.id(), state = %run.state(), disposition = ?e.disposition(), error = %e, "workflow did not commit");
            }
        }
        (run, result)
    }

    async fn drive(
        &self,
        run: &mut WorkflowRun,
        request: OrderRequest,
        options: &ExecutionOptions,
    ) -> Result<OrderConfirmation> {
        run.advance(WorkflowState::Validating);

        if let Err(e) = request.validate() {
            run.advance(WorkflowState::Failed);
            metrics::counter!("workflow_invalid_total").increment(1);
            tracing::info!(run_id = %run.id(), error = %e, "request is malformed");
            return Err(e.into());
        }

        let preset = select_preset(&request, self.config.high_value_threshold);
        let context = match self.build_context(request, options).await {
            Ok(context) => context,
            Err(e) => {
                run.advance(WorkflowState::Failed);
                metrics::counter!("workflow_failed_total").increment(1);
                return Err(e);
            }
        };

        let report = self.policies.get(preset).run(&context);
        if !report.passed {
            return Err(self.reject(run, preset, report).await);
        }

        run.advance(WorkflowState::Executing);
        let order = match self
            .execute_steps(run, &context, preset, report.confidence_score, options)
            .await
        {
            Ok(order) => order,
            Err(cause) => return Err(self.unwind(run, cause).await),
        };

        Ok(self.complete(run, &order, preset, &report).await)
    }

    /// Resolves every fact the policy may need. Lookups run concurrently and
    /// race the cancel signal; none of them has side effects.
    async fn build_context(
        &self,
        request: OrderRequest,
        options: &ExecutionOptions,
    ) -> Result<Context> {
        checkpoint(options)?;

        let resources = request.resource_ids();
        let customer = async {
            match request.customer_id {
                Some(id) => self.facts.customer(id).await.map(Some),
                None => Ok(None),
            }
        };
        let shipping = async {
            match request.shipping_address.as_deref() {
                Some(address) => self.facts.shipping(address).await.map(Some),
                None => Ok(None),
            }
        };
        let inventory = self.facts.inventory(&resources);

        let (customer, inventory, shipping) = options
            .guard(async { tokio::try_join!(customer, inventory, shipping) })
            .await
            .map_err(interrupted)?
            .map_err(fact_failure)?;

        let mut builder = Context::builder(request).inventory(inventory);
        if let Some(customer) = customer {
            builder = builder.customer(customer);
        }
        if let Some(shipping) = shipping {
            builder = builder.shipping(shipping);
        }
        Ok(builder.build())
    }

    async fn reject(
        &self,
        run: &mut WorkflowRun,
        preset: PresetName,
        report: PolicyReport,
    ) -> WorkflowError {
        run.advance(WorkflowState::Rejected);
        metrics::counter!("workflow_rejected_total", "preset" => preset.as_str()).increment(1);
        tracing::info!(
            run_id = %run.id(),
            preset = preset.as_str(),
            confidence_score = report.confidence_score,
            critical_failure = report.critical_failure,
            reasons = ?report.reasons,
            "request rejected by policy"
        );

        let event = WorkflowEvent::order_rejected(
            run.id(),
            run.request_id(),
            preset,
            report.reasons.clone(),
            report.confidence_score,
        );
        self.publish(&event).await;

        WorkflowError::Rejected(Box::new(Rejection::new(run.request_id(), preset, report)))
    }

    /// Places the order, reserves each line in request order and persists.
    /// Returns once the order is durable; nothing after this is undone.
    async fn execute_steps(
        &self,
        run: &mut WorkflowRun,
        context: &Context,
        preset: PresetName,
        confidence_score: u8,
        options: &ExecutionOptions,
    ) -> Result<Order> {
        let order = Order::place(context.request(), Utc::now())?;
        run.record(StepKind::PlaceOrder, Compensation::Nothing);

        for line in order.lines() {
            checkpoint(options)?;
            let step = StepKind::Reserve(line.resource_id.clone());
            tracing::info!(run_id = %run.id(), %step, quantity = line.quantity, "workflow step started");

            let reservation = self
                .reservations
                .reserve(&line.resource_id, line.quantity, order.id())
                .await
                .map_err(|e| WorkflowError::execution(ExecutionErrorKind::ResourceUnavailable, e.to_string()))?;

            tracing::info!(run_id = %run.id(), %step, reservation_id = %reservation.id, "workflow step completed");
            run.record(step, Compensation::ReleaseReservation(reservation.id));
        }

        checkpoint(options)?;
        let record = OrderRecord {
            order: order.clone(),
            reservations: run.reservation_ids(),
            preset,
            confidence_score,
            run_id: run.id(),
            committed_at: Utc::now(),
        };
        self.repository
            .commit(record)
            .await
            .map_err(|e| WorkflowError::execution(ExecutionErrorKind::PersistenceFailure, e.to_string()))?;
        run.record(StepKind::Persist, Compensation::Nothing);

        Ok(order)
    }

    /// Commits reservations and announces the order. Failures here are
    /// logged and counted only: the order is already durable.
    async fn complete(
        &self,
        run: &mut WorkflowRun,
        order: &Order,
        preset: PresetName,
        report: &PolicyReport,
    ) -> OrderConfirmation {
        let reservations = run.reservation_ids();
        for id in &reservations {
            if let Err(e) = self.reservations.commit(id).await {
                metrics::counter!("reservation_commit_failures_total").increment(1);
                tracing::error!(run_id = %run.id(), reservation_id = %id, error = %e, "reservation commit failed after persistence");
            }
        }
        run.seal();
        run.advance(WorkflowState::Committed);
        metrics::counter!("workflow_committed_total", "preset" => preset.as_str()).increment(1);

        let event = WorkflowEvent::order_completed(
            run.id(),
            order.id(),
            order.customer_id(),
            order.total(),
            reservations.clone(),
        );
        self.publish(&event).await;

        OrderConfirmation {
            order_id: order.id(),
            run_id: run.id(),
            customer_id: order.customer_id(),
            total: order.total(),
            line_count: order.line_count(),
            reservations,
            preset,
            confidence_score: report.confidence_score,
            state_history: run.history().to_vec(),
        }
    }

    /// Runs compensations most recent first. Every compensation is
    /// attempted even after one fails.
    #[tracing::instrument(skip(self, run, cause), fields(run_id = %run.id()))]
    async fn unwind(&self, run: &mut WorkflowRun, cause: WorkflowError) -> WorkflowError {
        run.advance(WorkflowState::Compensating);
        tracing::warn!(error = %cause, "compensation started");

        let mut released = Vec::new();
        let mut failures = Vec::new();
        for completed in run.take_compensations() {
            match completed.compensation {
                Compensation::ReleaseReservation(id) => match self.reservations.release(&id).await {
                    Ok(()) => {
                        tracing::info!(step = %completed.step, reservation_id = %id, "compensation step completed");
                        released.push(id);
                    }
                    Err(e) => {
                        tracing::error!(step = %completed.step, reservation_id = %id, error = %e, "compensation step failed");
                        failures.push(format!("release {id}: {e}"));
                    }
                },
                Compensation::Nothing => {}
            }
        }

        if !failures.is_empty() {
            run.advance(WorkflowState::Failed);
            metrics::counter!("workflow_failed_total").increment(1);
            tracing::error!(failures = failures.len(), "compensation incomplete, operator action required");
            return WorkflowError::Fatal {
                run_id: run.id(),
                cause: Box::new(cause),
                compensation_failures: failures,
            };
        }

        run.advance(WorkflowState::RolledBack);
        metrics::counter!("workflow_rolled_back_total").increment(1);
        if let Some(kind) = cause.execution_kind() {
            let event = WorkflowEvent::order_rolled_back(
                run.id(),
                run.request_id(),
                kind,
                cause.to_string(),
                released,
            );
            self.publish(&event).await;
        }
        cause
    }

    async fn publish(&self, event: &WorkflowEvent) {
        if let Err(e) = self.publisher.publish(event).await {
            metrics::counter!("event_publish_failures_total").increment(1);
            tracing::warn!(event_type = event.event_type(), order_id = %event.order_id(), error = %e, "event publish failed");
        }
    }
}

/// Fails with the interruption, if any, at a step boundary.
fn checkpoint(options: &ExecutionOptions) -> Result<()> {
    match options.interruption() {
        Some(kind) => Err(interrupted(kind)),
        None => Ok(()),
    }
}

fn interrupted(kind: ExecutionErrorKind) -> WorkflowError {
    let message = match kind {
        ExecutionErrorKind::TimedOut => "deadline exceeded",
        _ => "cancelled by caller",
    };
    WorkflowError::execution(kind, message)
}

fn fact_failure(error: FactError) -> WorkflowError {
    let kind = match error {
        FactError::NotFound(_) => ExecutionErrorKind::FactsNotFound,
        FactError::Unavailable(_) => ExecutionErrorKind::FactsUnavailable,
    };
    WorkflowError::execution(kind, error.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use domain::{LineItem, ResourceId};

    fn request(customer: bool, dollars: i64) -> OrderRequest {
        let request = if customer {
            OrderRequest::for_customer(CustomerId::new())
        } else {
            OrderRequest::for_guest("guest@example.com")
        };
        request.with_line(LineItem::new(
            ResourceId::new("sku-1"),
            "Widget",
            1,
            Money::from_dollars(dollars),
        ))
    }

    #[test]
    fn selects_standard_at_threshold() {
        let threshold = Money::from_dollars(1_000);
        assert_eq!(
            select_preset(&request(true, 1_000), threshold),
            PresetName::Standard
        );
        assert_eq!(
            select_preset(&request(true, 1_001), threshold),
            PresetName::HighValue
        );
    }

    #[test]
    fn guest_beats_high_value() {
        let threshold = Money::from_dollars(10);
        assert_eq!(
            select_preset(&request(false, 5_000), threshold),
            PresetName::Guest
        );
    }

    #[test]
    fn internal_channel_beats_high_value() {
        let threshold = Money::from_dollars(10);
        let internal = request(true, 5_000).via_channel(Channel::Internal);
        assert_eq!(select_preset(&internal, threshold), PresetName::Internal);
    }

    #[test]
    fn fact_errors_map_to_kinds() {
        assert_eq!(
            fact_failure(FactError::NotFound("customer".into())).execution_kind(),
            Some(ExecutionErrorKind::FactsNotFound)
        );
        assert_eq!(
            fact_failure(FactError::Unavailable("down".into())).execution_kind(),
            Some(ExecutionErrorKind::FactsUnavailable)
        );
    }
}
