//! Wizard navigation: step graphs, session answers and the engine that walks them.

pub mod engine;
pub mod flows;
pub mod graph;
pub mod session;
pub mod state;

pub use engine::{OptionActivation, Transition, WizardEngine, WizardEvent, WizardSnapshot};
pub use graph::{Step, StepContent, StepGraph, StepKind, WizardOption};
pub use session::{SessionData, SessionValue};
pub use state::NavigationState;
