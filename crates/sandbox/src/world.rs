//! A seeded in-memory world and the coordinator wired to it.

use std::path::Path;

use domain::{CustomerId, Money};
use policy::{CustomerFacts, CustomerStatus, PolicySet, PresetCatalog, RuleRegistry};
use saga::{
    InMemoryEventPublisher, InMemoryFactResolver, InMemoryOrderRepository,
    InMemoryReservationCoordinator, WorkflowCoordinator,
};

use crate::config::Config;
use crate::error::{Result, SandboxError};

pub type SandboxCoordinator = WorkflowCoordinator<
    InMemoryFactResolver,
    InMemoryReservationCoordinator,
    InMemoryOrderRepository,
    InMemoryEventPublisher,
>;

/// Resources stocked at start, with their unit count.
pub const STOCK: &[(&str, u32)] = &[("sku-widget", 20), ("sku-gadget", 5), ("sku-gizmo", 8)];

/// Handles on every collaborator, shared with the coordinator.
#[derive(Debug, Clone)]
pub struct World {
    pub facts: InMemoryFactResolver,
    pub pool: InMemoryReservationCoordinator,
    pub repository: InMemoryOrderRepository,
    pub publisher: InMemoryEventPublisher,
    pub regular: CustomerId,
    pub closed: CustomerId,
    pub newcomer: CustomerId,
}

impl World {
    /// Three customers, the resources in [`STOCK`], one undeliverable address.
    pub fn seeded() -> Self {
        let facts = InMemoryFactResolver::new();
        let pool = InMemoryReservationCoordinator::new();

        for (resource, units) in STOCK {
            pool.stock(*resource, *units);
            facts.stock(*resource, *units);
        }

        let regular = CustomerId::new();
        let closed = CustomerId::new();
        let newcomer = CustomerId::new();
        facts.add_customer(CustomerFacts::active(regular, Money::from_dollars(10_000)));
        facts.add_customer(CustomerFacts {
            status: CustomerStatus::Closed,
            ..CustomerFacts::active(closed, Money::from_dollars(10_000))
        });
        facts.add_customer(CustomerFacts {
            account_age_days: 3,
            ..CustomerFacts::active(newcomer, Money::from_dollars(10_000))
        });
        facts.mark_undeliverable("Nowhere");

        Self {
            facts,
            pool,
            repository: InMemoryOrderRepository::new(),
            publisher: InMemoryEventPublisher::new(),
            regular,
            closed,
            newcomer,
        }
    }
}

/// Built-in presets, overridden by the configured catalog file if any.
pub fn load_catalog(path: Option<&Path>) -> Result<PresetCatalog> {
    let Some(path) = path else {
        return Ok(PresetCatalog::builtin());
    };
    let json = std::fs::read_to_string(path).map_err(|source| SandboxError::CatalogFile {
        path: path.to_path_buf(),
        source,
    })?;
    let catalog = PresetCatalog::from_json(&json)?;
    tracing::info!(path = %path.display(), "loaded preset catalog");
    Ok(catalog)
}

/// Resolves the policies and wires a coordinator to `world`.
pub fn create_coordinator(config: &Config, world: &World) -> Result<SandboxCoordinator> {
    let catalog = load_catalog(config.preset_catalog.as_deref())?;
    let registry = RuleRegistry::with_builtin_rules(&config.rules);
    let policies = PolicySet::resolve(&catalog, &registry)?;

    Ok(WorkflowCoordinator::new(
        config.workflow.clone(),
        policies,
        world.facts.clone(),
        world.pool.clone(),
        world.repository.clone(),
        world.publisher.clone(),
    ))
}
