//! Entity type definitions

pub mod blade;
pub mod blade_type;
pub mod branch;
pub mod sharpening;
pub mod user;

pub use blade::{Blade, BladeStatus};
pub use blade_type::BladeType;
pub use branch::Branch;
pub use sharpening::{SharpeningEvent, SharpeningKind};
pub use user::{Role, User};
