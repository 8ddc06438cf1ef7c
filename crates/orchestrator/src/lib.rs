//! Reasoning loop for the Berlin logistics agent.
//!
//! This crate provides the [`Orchestrator`] type which answers a free-text
//! query by alternating between a [`Brain`](brain_core::Brain) that decides
//! the next step and the tool executor that carries it out.
//!
//! # Architecture
//!
//! ```text
//! Query
//!   ↓
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      ORCHESTRATOR                           │
//! │                                                             │
//! │  Thinking   → brain sees query + trace, picks a call or     │
//! │               answers                                       │
//! │      ↓                                                      │
//! │  Acting     → executor validates and runs the call          │
//! │               (timeout, retries)                            │
//! │      ↓                                                      │
//! │  Observing  → result is appended to the trace               │
//! │      ↓                                                      │
//! │  back to Thinking, until Done or Failed                     │
//! │  (call cap, every call failed, cancellation)                │
//! └─────────────────────────────────────────────────────────────┘
//!   ↓
//! PII-masked answer
//! ```
//!
//! The default brain is [`PlanBrain`]: the [`Router`] turns the query into a
//! [`RoutingPlan`] and the brain works through it, recovering from the
//! failures it knows how to fix.
//!
//! # Example
//!
//! ```rust,ignore
//! use orchestrator::{AgentConfig, AppContext, Orchestrator};
//!
//! let config = AgentConfig::from_env()?;
//! let context = AppContext::load(&config)?;
//! let orchestrator = Orchestrator::from_context(&context);
//!
//! let answer = orchestrator
//!     .run("Predict a bike delivery of 3 km in rain with heavy traffic")
//!     .await;
//! println!("{}", answer);
//! ```

mod actions;
mod config;
mod context;
mod error;
mod formatting;
mod orchestrator;
mod planner;
mod router;

pub use actions::{Coordinates, PlanAction, RoutingPlan};
pub use config::AgentConfig;
pub use context::AppContext;
pub use error::OrchestratorError;
pub use formatting::{compose_answer, unable_to_complete};
pub use orchestrator::{AgentResponse, LoopLimits, Orchestrator, Outcome, HELP_TEXT};
pub use planner::{PlanBrain, MAX_CALLS_PER_STEP};
pub use router::{Router, Slots};

// Re-export the cancellation token used by `run_cancellable`
pub use tokio_util::sync::CancellationToken;
