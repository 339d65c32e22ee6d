use std::error::Error;
use std::fmt::{self, Display};

use serde::Deserialize;

/// How classes with an undefined parent are removed from the class table.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentCheck {
    /// A single sweep: only classes whose direct parent is undefined are removed.
    ///
    /// Their descendants survive with an ancestor chain that stops at the removed class,
    /// so members inherited from above it (including those of `Object`) are not found.
    DirectOnly,
    /// Sweeps are repeated until one removes nothing, so whole subtrees below an undefined
    /// ancestor are removed.
    Fixpoint,
}

impl Default for ParentCheck {
    fn default() -> Self {
        Self::Fixpoint
    }
}

/// Where the method of a static dispatch `e@T.m(...)` is looked up.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StaticDispatchLookup {
    /// Only the methods declared in `T` itself are visible.
    TargetOnly,
    /// `T` and its ancestors are searched, nearest first.
    WalkAncestors,
}

impl Default for StaticDispatchLookup {
    fn default() -> Self {
        Self::WalkAncestors
    }
}

#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub parent_check: ParentCheck,
    pub static_dispatch: StaticDispatchLookup,
    /// Reject `Main.main` declared with parameters.
    pub require_parameterless_main: bool,
    /// The maximum nesting depth of an expression tree.
    pub max_expr_depth: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            parent_check: Default::default(),
            static_dispatch: Default::default(),
            require_parameterless_main: true,
            max_expr_depth: 1024,
        }
    }
}

impl AnalysisConfig {
    /// Parses the config from its RON representation, e.g.:
    ///
    /// ```text
    /// (parent_check: DirectOnly, max_expr_depth: 256)
    /// ```
    ///
    /// Omitted fields take their default values.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text).map_err(ConfigError::Parse)?;

        if config.max_expr_depth == 0 {
            return Err(ConfigError::ZeroDepthLimit);
        }

        Ok(config)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Parse(ron::error::SpannedError),
    ZeroDepthLimit,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "could not parse the analysis config: {}", err),
            Self::ZeroDepthLimit => write!(f, "`max_expr_depth` must be positive"),
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::ZeroDepthLimit => None,
        }
    }
}
