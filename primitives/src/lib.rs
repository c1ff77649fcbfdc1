#![cfg_attr(not(feature = "std"), no_std)]

pub mod assets;
pub mod ecosystem;
pub mod scripts;

pub use assets::*;
pub use ecosystem::*;
pub use scripts::*;
