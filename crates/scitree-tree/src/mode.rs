//! Tree levels. Each non-terminal level has one instruction template.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Level of a node in the science tree, from broadest to most concrete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    ScienceGoal,
    ScienceObjective,
    PhysicalParameter,
    AstronomicalObservable,
}

impl Mode {
    pub const ALL: [Mode; 4] = [
        Mode::ScienceGoal,
        Mode::ScienceObjective,
        Mode::PhysicalParameter,
        Mode::AstronomicalObservable,
    ];

    /// Number of levels in a complete tree.
    pub const LEVELS: usize = Self::ALL.len();

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::ScienceGoal => "Science Goal",
            Self::ScienceObjective => "Science Objective",
            Self::PhysicalParameter => "Physical Parameter",
            Self::AstronomicalObservable => "Astronomical Observable",
        }
    }

    /// Zero-based depth of this level.
    #[must_use]
    pub fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The level children of this level are generated at.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    #[must_use]
    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }

    /// Instructions asking for exactly `n` children, or `None` for the
    /// terminal level.
    #[must_use]
    pub fn template(self, n: usize) -> Option<String> {
        let text = match self {
            Self::ScienceGoal => format!(
                "Given the following over-arching science goal and related astrophysics papers, \
                 brainstorm exactly {n} focused science objectives that contribute towards the science goal.\n\
                 Be concise. Return each science objective on a separate line, enclosed in curly braces."
            ),
            Self::ScienceObjective => format!(
                "Given the following science objective and related astrophysics research papers, \
                 identify exactly {n} astrophysical parameters that would help answer the science objective.\n\
                 Be detailed and specific (ex. type of astrophysical systems). \
                 Return each astrophysical parameter on a separate line, enclosed in curly braces."
            ),
            Self::PhysicalParameter => format!(
                "Given the following astrophysical parameter and related research papers, \
                 identify exactly {n} concrete observables that would help measure the physical parameter.\n\
                 Ensure the observables are directly related to potential telescope observations.\n\
                 Be concise and specific (ex. wavelength band, resolution, precision, types of observation targets, etc.). \
                 Be as quantitative as possible, but make sure numbers are derived from the research papers. \
                 Return each observable on a separate line, enclosed in curly braces."
            ),
            Self::AstronomicalObservable => return None,
        };
        Some(text)
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
