//! Investigation assistant pipeline over the insurance fraud knowledge
//! graph: question classification, schema context, two-stage planning,
//! query execution with single repair, result enrichment, visualization
//! assembly, and narrative synthesis.

pub mod classifier;
pub mod context;
pub mod enrichment;
pub mod executor;
pub mod orchestrator;
pub mod planner;
pub mod prompts;
pub mod session;
pub mod synthesis;
pub mod visualization;

pub use orchestrator::run_turn;
pub use session::Session;
