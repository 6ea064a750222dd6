use crate::foundation::core::{FieldExprId, SlotId};
use crate::foundation::math::{max_nan, min_nan};

/// One node of a program's field expression table.
///
/// Children are referenced by [`FieldExprId`], so shared subexpressions are written once.
/// An expression yields `components` values per element; scalar operands broadcast against
/// wider ones.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum FieldExprIR {
    /// Same scalar for every element.
    Const {
        /// Value.
        value: f64,
    },
    /// Broadcast a signal slot (number, vec2 or color).
    Signal {
        /// Source slot.
        slot: SlotId,
    },
    /// Element index `i`.
    Index,
    /// `i / (n - 1)`, or 0 for single-element domains.
    Normalized,
    /// Deterministic per-element value in `[0, 1)`.
    Random {
        /// Stream seed.
        seed: u64,
    },
    /// Component-wise unary function.
    Unary {
        /// Function.
        fun: UnaryFn,
        /// Operand.
        arg: FieldExprId,
    },
    /// Component-wise binary function with scalar broadcast.
    Binary {
        /// Function.
        fun: BinaryFn,
        /// Left operand.
        a: FieldExprId,
        /// Right operand.
        b: FieldExprId,
    },
    /// Pack two scalar fields.
    Vec2 {
        /// X.
        x: FieldExprId,
        /// Y.
        y: FieldExprId,
    },
    /// Pack three scalar fields.
    Vec3 {
        /// X.
        x: FieldExprId,
        /// Y.
        y: FieldExprId,
        /// Z.
        z: FieldExprId,
    },
    /// Pack four scalar fields.
    Color {
        /// Red.
        r: FieldExprId,
        /// Green.
        g: FieldExprId,
        /// Blue.
        b: FieldExprId,
        /// Alpha.
        a: FieldExprId,
    },
    /// `radius * (cos 2πθ, sin 2πθ)` with `angle` in turns.
    Polar {
        /// Radius.
        radius: FieldExprId,
        /// Angle in turns.
        angle: FieldExprId,
    },
}

/// Unary field function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnaryFn {
    /// `-x`.
    Neg,
    /// `|x|`.
    Abs,
    /// `sin x`.
    Sin,
    /// `cos x`.
    Cos,
    /// `√x`.
    Sqrt,
    /// `x - floor(x)`.
    Fract,
}

impl UnaryFn {
    /// Apply to one component.
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Self::Neg => -x,
            Self::Abs => x.abs(),
            Self::Sin => x.sin(),
            Self::Cos => x.cos(),
            Self::Sqrt => x.sqrt(),
            Self::Fract => x - x.floor(),
        }
    }
}

/// Binary field function.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BinaryFn {
    /// `a + b`.
    Add,
    /// `a - b`.
    Sub,
    /// `a * b`.
    Mul,
    /// `a / b`.
    Div,
    /// `min(a, b)`.
    Min,
    /// `max(a, b)`.
    Max,
    /// `a ^ b`.
    Pow,
}

impl BinaryFn {
    /// Apply to one component pair.
    pub fn apply(self, a: f64, b: f64) -> f64 {
        match self {
            Self::Add => a + b,
            Self::Sub => a - b,
            Self::Mul => a * b,
            Self::Div => a / b,
            Self::Min => min_nan(a, b),
            Self::Max => max_nan(a, b),
            Self::Pow => a.powf(b),
        }
    }
}
