//! Production stages and the rules for moving an order through them.
//!
//! Stages form a fixed total order:
//! `design < printing < fusing < stitching < shipping`.
//! An order is *pending at* stage N when every stage before N is done and
//! N itself is not.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::errors::{AppError, AppResult};

/// One step of the production line.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Design,
    Printing,
    Fusing,
    Stitching,
    Shipping,
}

impl Stage {
    /// Every stage in production order.
    pub const ALL: [Stage; 5] = [
        Stage::Design,
        Stage::Printing,
        Stage::Fusing,
        Stage::Stitching,
        Stage::Shipping,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Design => "design",
            Stage::Printing => "printing",
            Stage::Fusing => "fusing",
            Stage::Stitching => "stitching",
            Stage::Shipping => "shipping",
        }
    }

    /// Position in the production sequence (design = 0).
    pub fn position(self) -> usize {
        self as usize
    }

    /// Stages that come strictly before this one.
    pub fn predecessors(self) -> &'static [Stage] {
        &Self::ALL[..self.position()]
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Stage {
    type Err = AppError;

    /// Only the five known names are accepted; anything else is rejected
    /// before it can reach the store.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s)
            .ok_or_else(|| AppError::validation(format!("Unknown stage '{}'", s)))
    }
}

/// Completion flags for the five stages.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct StageFlags {
    pub design_done: bool,
    pub printing_done: bool,
    pub fusing_done: bool,
    pub stitching_done: bool,
    pub shipping_done: bool,
}

impl StageFlags {
    pub fn is_done(&self, stage: Stage) -> bool {
        match stage {
            Stage::Design => self.design_done,
            Stage::Printing => self.printing_done,
            Stage::Fusing => self.fusing_done,
            Stage::Stitching => self.stitching_done,
            Stage::Shipping => self.shipping_done,
        }
    }

    pub fn mark_done(&mut self, stage: Stage) {
        match stage {
            Stage::Design => self.design_done = true,
            Stage::Printing => self.printing_done = true,
            Stage::Fusing => self.fusing_done = true,
            Stage::Stitching => self.stitching_done = true,
            Stage::Shipping => self.shipping_done = true,
        }
    }

    /// First stage in sequence whose flag is still false.
    ///
    /// A later flag set out of order never makes an earlier stage count as
    /// done: `{design: false, printing: true}` is pending at design.
    pub fn pending_stage(&self) -> Option<Stage> {
        Stage::ALL.into_iter().find(|stage| !self.is_done(*stage))
    }

    pub fn is_pending_at(&self, stage: Stage) -> bool {
        self.pending_stage() == Some(stage)
    }

    pub fn is_complete(&self) -> bool {
        self.pending_stage().is_none()
    }

    /// Earliest stage before `stage` that is not yet done.
    pub fn first_unfinished_before(&self, stage: Stage) -> Option<Stage> {
        stage
            .predecessors()
            .iter()
            .copied()
            .find(|prior| !self.is_done(*prior))
    }
}

/// Whether advancing a stage requires all earlier stages to be done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StageAdvancePolicy {
    /// Any recognized stage may be marked done at any time.
    #[default]
    Unconditional,
    /// A stage may only be marked done once every earlier stage is done.
    Sequential,
}

impl StageAdvancePolicy {
    /// Check that `stage` may be marked done on an order with `flags`.
    pub fn check(self, flags: &StageFlags, stage: Stage) -> AppResult<()> {
        match self {
            StageAdvancePolicy::Unconditional => Ok(()),
            StageAdvancePolicy::Sequential => match flags.first_unfinished_before(stage) {
                Some(prior) => Err(AppError::validation(format!(
                    "Cannot complete {} before {} is done",
                    stage, prior
                ))),
                None => Ok(()),
            },
        }
    }
}

impl FromStr for StageAdvancePolicy {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "unconditional" => Ok(StageAdvancePolicy::Unconditional),
            "sequential" => Ok(StageAdvancePolicy::Sequential),
            other => Err(AppError::validation(format!(
                "Unknown stage advance policy '{}'",
                other
            ))),
        }
    }
}
