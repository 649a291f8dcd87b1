pub mod cycle_counts;
pub mod ledger;
pub mod locations;
pub mod ownership;
pub mod picking;
pub mod reconciliation;

pub use cycle_counts::CycleCountService;
pub use ledger::LedgerService;
pub use locations::LocationService;
pub use ownership::OwnershipService;
pub use picking::PickService;
pub use reconciliation::ReconciliationService;
