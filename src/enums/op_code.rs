// Copyright Peter Bower 2025. All Rights Reserved.
// Licensed under MIT License.

//! # Operation Codes
//!
//! The closed, versioned set of elementwise binary operations.
//!
//! Codes are stable: the runtime passes them across process boundaries as a
//! plain `Int32` scalar, so existing values never change and new operations
//! only ever append.

use std::fmt;

use crate::enums::error::BinaryOpError;

/// Binary operation selector.
#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BinaryOpCode {
    Add = 1,
    Subtract = 2,
    Multiply = 3,
    Divide = 4,
    FloorDivide = 5,
    Mod = 6,
    Fmod = 7,
    Power = 8,
    Maximum = 9,
    Minimum = 10,
    Equal = 11,
    NotEqual = 12,
    Less = 13,
    LessEqual = 14,
    Greater = 15,
    GreaterEqual = 16,
    LogicalAnd = 17,
    LogicalOr = 18,
    LogicalXor = 19,
    BitwiseAnd = 20,
    BitwiseOr = 21,
    BitwiseXor = 22,
    LeftShift = 23,
    RightShift = 24,
    Arctan2 = 25,
    Hypot = 26,
    Copysign = 27,
    Gcd = 28,
    Lcm = 29,
    IsClose = 30,
}

impl BinaryOpCode {
    pub const ALL: [BinaryOpCode; 30] = [
        BinaryOpCode::Add,
        BinaryOpCode::Subtract,
        BinaryOpCode::Multiply,
        BinaryOpCode::Divide,
        BinaryOpCode::FloorDivide,
        BinaryOpCode::Mod,
        BinaryOpCode::Fmod,
        BinaryOpCode::Power,
        BinaryOpCode::Maximum,
        BinaryOpCode::Minimum,
        BinaryOpCode::Equal,
        BinaryOpCode::NotEqual,
        BinaryOpCode::Less,
        BinaryOpCode::LessEqual,
        BinaryOpCode::Greater,
        BinaryOpCode::GreaterEqual,
        BinaryOpCode::LogicalAnd,
        BinaryOpCode::LogicalOr,
        BinaryOpCode::LogicalXor,
        BinaryOpCode::BitwiseAnd,
        BinaryOpCode::BitwiseOr,
        BinaryOpCode::BitwiseXor,
        BinaryOpCode::LeftShift,
        BinaryOpCode::RightShift,
        BinaryOpCode::Arctan2,
        BinaryOpCode::Hypot,
        BinaryOpCode::Copysign,
        BinaryOpCode::Gcd,
        BinaryOpCode::Lcm,
        BinaryOpCode::IsClose,
    ];

    /// Stable wire code.
    #[inline]
    pub const fn code(self) -> i32 {
        self as i32
    }

    /// Looks up a wire code.
    ///
    /// Accepts any integer width so a malformed scalar is still reported as
    /// the code it carried.
    pub fn from_code(code: i64) -> Result<BinaryOpCode, BinaryOpError> {
        Self::ALL
            .iter()
            .copied()
            .find(|op| op.code() as i64 == code)
            .ok_or(BinaryOpError::UnsupportedOperation { code })
    }

    /// Snake-case name, also used in device kernel names.
    pub const fn name(self) -> &'static str {
        match self {
            BinaryOpCode::Add => "add",
            BinaryOpCode::Subtract => "subtract",
            BinaryOpCode::Multiply => "multiply",
            BinaryOpCode::Divide => "divide",
            BinaryOpCode::FloorDivide => "floor_divide",
            BinaryOpCode::Mod => "mod",
            BinaryOpCode::Fmod => "fmod",
            BinaryOpCode::Power => "power",
            BinaryOpCode::Maximum => "maximum",
            BinaryOpCode::Minimum => "minimum",
            BinaryOpCode::Equal => "equal",
            BinaryOpCode::NotEqual => "not_equal",
            BinaryOpCode::Less => "less",
            BinaryOpCode::LessEqual => "less_equal",
            BinaryOpCode::Greater => "greater",
            BinaryOpCode::GreaterEqual => "greater_equal",
            BinaryOpCode::LogicalAnd => "logical_and",
            BinaryOpCode::LogicalOr => "logical_or",
            BinaryOpCode::LogicalXor => "logical_xor",
            BinaryOpCode::BitwiseAnd => "bitwise_and",
            BinaryOpCode::BitwiseOr => "bitwise_or",
            BinaryOpCode::BitwiseXor => "bitwise_xor",
            BinaryOpCode::LeftShift => "left_shift",
            BinaryOpCode::RightShift => "right_shift",
            BinaryOpCode::Arctan2 => "arctan2",
            BinaryOpCode::Hypot => "hypot",
            BinaryOpCode::Copysign => "copysign",
            BinaryOpCode::Gcd => "gcd",
            BinaryOpCode::Lcm => "lcm",
            BinaryOpCode::IsClose => "isclose",
        }
    }
}

impl TryFrom<i32> for BinaryOpCode {
    type Error = BinaryOpError;

    fn try_from(code: i32) -> Result<Self, Self::Error> {
        BinaryOpCode::from_code(code as i64)
    }
}

impl fmt::Display for BinaryOpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
