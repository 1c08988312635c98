// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # Aliases
//!
//! Small semantic aliases used across view layouts and the task registry.

/// Stable numeric identifier the runtime's scheduler uses to look up a task.
pub type TaskId = u32;

/// Per-dimension step between consecutive elements, in elements.
///
/// Signed, so reversed views are representable. A stride of `0` marks a
/// broadcast dimension.
pub type Stride = isize;

/// Element offset into a borrowed buffer.
pub type Offset = usize;
