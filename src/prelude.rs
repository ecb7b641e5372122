//! Stdecomp prelude.
//!
//! This module contains the most used types, type aliases, traits and
//! functions that you can import easily as a group.
//!

#[doc(no_inline)]
pub use crate::error::{Error, Result};

#[doc(no_inline)]
pub use crate::traits::*;

#[doc(no_inline)]
pub use crate::param_guard::ParamGuard;

#[doc(no_inline)]
pub use crate::Float;

#[doc(no_inline)]
pub use crate::stack::{linearize, reshape, StackShape};

#[doc(no_inline)]
pub use crate::masks::{extract_masks, Foreground, MaskParams};

#[doc(no_inline)]
pub use crate::traces::{derive_traces, derive_traces_with, EmptyMaskPolicy};

#[doc(no_inline)]
pub use crate::ordering::{order_by_skewness, skewness, skewness_order};
