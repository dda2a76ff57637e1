//! # scitree-tree
//!
//! Expands a science goal into a four-level tree:
//! Science Goal → Science Objective → Physical Parameter → Astronomical Observable.
//!
//! Every non-terminal node is grounded by retrieval; its children come from
//! one generation call whose `{…}` entries are parsed strictly. Siblings are
//! built concurrently, failures stay local to their branch, and the whole
//! run can be cancelled or bounded by a timeout.

pub mod cancel;
pub mod engine;
pub mod export;
pub mod mode;
pub mod node;
pub mod prompt;

pub use cancel::CancellationToken;
pub use engine::{
    BranchFailure, Expansion, ExpansionReport, ExpansionRequest, FailureKind, TreeConfig,
    TreeEngine,
};
pub use export::TreeRecord;
pub use mode::Mode;
pub use node::TreeNode;
pub use prompt::DEFAULT_BACKGROUND;
