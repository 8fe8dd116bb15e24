//! Filter enums for list commands

use clap::ValueEnum;

use crate::entities::BladeStatus;

/// Lifecycle filter for `blade list`
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum StatusFilter {
    /// Blades that still accept sharpenings
    Open,
    /// Blades that received their terminal sharpening
    Terminal,
    /// Every blade - default
    #[default]
    All,
}

impl StatusFilter {
    pub fn matches(&self, status: BladeStatus) -> bool {
        match self {
            StatusFilter::Open => status == BladeStatus::Available,
            StatusFilter::Terminal => status == BladeStatus::Terminal,
            StatusFilter::All => true,
        }
    }
}

/// Active-flag filter for blade types and users
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq, Eq)]
pub enum ActiveFilter {
    Active,
    Inactive,
    #[default]
    All,
}

impl ActiveFilter {
    pub fn matches(&self, active: bool) -> bool {
        match self {
            ActiveFilter::Active => active,
            ActiveFilter::Inactive => !active,
            ActiveFilter::All => true,
        }
    }
}
