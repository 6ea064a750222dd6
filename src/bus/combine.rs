use crate::foundation::core::{BusId, ConstId, Rgba, SlotId, Vec2};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::{max_nan, min_nan};
use crate::ir::program::{ConstValue, lookup_constant};
use crate::store::value::ObjectValue;
use crate::store::values::ValueStore;

/// How enabled publisher values are reduced to one bus value.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CombineMode {
    /// Component-wise sum.
    #[default]
    Sum,
    /// Component-wise arithmetic mean.
    Average,
    /// Component-wise minimum.
    Min,
    /// Component-wise maximum.
    Max,
    /// Value of the final publisher in stored order (highest sort key).
    Last,
    /// Component-wise product.
    Product,
}

/// Value a bus takes when no publisher is enabled.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SilentValue {
    /// All components zero.
    Zero,
    /// Type default: `0`, the zero vector, or opaque black.
    #[default]
    Default,
    /// A constant from the program pool.
    Constant {
        /// Constant id.
        id: ConstId,
    },
}

/// Value type carried by a bus.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BusValueType {
    /// Scalar read from a numeric slot.
    #[default]
    Number,
    /// 2D vector read from an object slot.
    Vec2,
    /// Color read from an object slot.
    Color,
}

/// Static configuration of a bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BusSpec {
    /// Bus id.
    pub id: BusId,
    /// Carried value type.
    #[serde(default)]
    pub value_type: BusValueType,
    /// Reduction.
    #[serde(default)]
    pub combine: CombineMode,
    /// Silent policy.
    #[serde(default)]
    pub silent: SilentValue,
}

/// Per-publisher adjustment applied before combination.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PublisherTransform {
    /// Multiply every component.
    Scale {
        /// Factor.
        factor: f64,
    },
    /// Add to every component.
    Offset {
        /// Addend.
        amount: f64,
    },
    /// Clamp every component to `[min, max]`.
    Clamp {
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// Negate every component.
    Negate,
}

impl PublisherTransform {
    /// Apply to one component.
    pub fn apply(self, v: f64) -> f64 {
        match self {
            Self::Scale { factor } => v * factor,
            Self::Offset { amount } => v + amount,
            Self::Clamp { min, max } => min_nan(max_nan(v, min), max),
            Self::Negate => -v,
        }
    }
}

/// A source slot feeding a bus.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Publisher {
    /// Compiler-assigned id; tie-break for equal sort keys.
    pub id: u32,
    /// Target bus.
    pub bus: BusId,
    /// Source slot.
    pub source: SlotId,
    /// Primary ordering key.
    #[serde(default)]
    pub sort_key: i32,
    /// Disabled publishers are skipped.
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// Adjustments applied in order; empty is the identity.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub transforms: Vec<PublisherTransform>,
}

fn default_enabled() -> bool {
    true
}

/// A combined bus value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BusValue {
    /// Scalar.
    Number(f64),
    /// 2D vector.
    Vec2(Vec2),
    /// Color.
    Color(Rgba),
}

impl BusValue {
    /// Type default: `0`, the zero vector, or opaque black.
    pub fn type_default(ty: BusValueType) -> Self {
        match ty {
            BusValueType::Number => Self::Number(0.0),
            BusValueType::Vec2 => Self::Vec2(Vec2::ZERO),
            BusValueType::Color => Self::Color(Rgba::BLACK),
        }
    }

    /// All components zero.
    pub fn zero(ty: BusValueType) -> Self {
        match ty {
            BusValueType::Number => Self::Number(0.0),
            BusValueType::Vec2 => Self::Vec2(Vec2::ZERO),
            BusValueType::Color => Self::Color(Rgba::TRANSPARENT),
        }
    }

    /// Carried value type.
    pub fn value_type(&self) -> BusValueType {
        match self {
            Self::Number(_) => BusValueType::Number,
            Self::Vec2(_) => BusValueType::Vec2,
            Self::Color(_) => BusValueType::Color,
        }
    }

    fn map(self, f: impl Fn(f64) -> f64) -> Self {
        self.zip(self, |a, _| f(a))
    }

    fn zip(self, other: Self, f: impl Fn(f64, f64) -> f64) -> Self {
        let g = |a: f32, b: f32| f(f64::from(a), f64::from(b)) as f32;
        match (self, other) {
            (Self::Number(a), Self::Number(b)) => Self::Number(f(a, b)),
            (Self::Vec2(a), Self::Vec2(b)) => Self::Vec2(Vec2::new(f(a.x, b.x), f(a.y, b.y))),
            (Self::Color(a), Self::Color(b)) => Self::Color(Rgba::new(
                g(a.r, b.r),
                g(a.g, b.g),
                g(a.b, b.b),
                g(a.a, b.a),
            )),
            // Buses are homogeneous; a mixed pair keeps the left operand.
            (a, _) => a,
        }
    }

    /// Payload for the destination slot.
    pub fn to_object(self) -> Option<ObjectValue> {
        match self {
            Self::Number(_) => None,
            Self::Vec2(v) => Some(ObjectValue::Vec2(v)),
            Self::Color(c) => Some(ObjectValue::Color(c)),
        }
    }
}

/// Resolve the silent value of `spec`; an invalid or mistyped constant is a contract violation.
pub fn resolve_silent(spec: &BusSpec, constants: &[ConstValue]) -> ReelResult<BusValue> {
    let ty = spec.value_type;
    match spec.silent {
        SilentValue::Zero => Ok(BusValue::zero(ty)),
        SilentValue::Default => Ok(BusValue::type_default(ty)),
        SilentValue::Constant { id } => {
            let c = lookup_constant(constants, id)?;
            let v = match (ty, c) {
                (BusValueType::Number, c) => c.as_f64().map(BusValue::Number),
                (BusValueType::Vec2, ConstValue::Vec2([x, y])) => {
                    Some(BusValue::Vec2(Vec2::new(*x, *y)))
                }
                (BusValueType::Color, ConstValue::Color(rgba)) => {
                    Some(BusValue::Color(Rgba::from_array(*rgba)))
                }
                _ => None,
            };
            v.ok_or_else(|| {
                ReelError::contract(format!(
                    "bus {} silent constant {} does not match value type {ty:?}",
                    spec.id.0, id.0
                ))
            })
        }
    }
}

/// Reduce `values` (already in publisher order) with `mode`; empty input yields `silent`.
pub fn combine(values: &[BusValue], mode: CombineMode, silent: BusValue) -> BusValue {
    let Some((&first, rest)) = values.split_first() else {
        return silent;
    };
    match mode {
        CombineMode::Last => values[values.len() - 1],
        CombineMode::Sum => rest.iter().fold(first, |acc, &v| acc.zip(v, |a, b| a + b)),
        CombineMode::Product => rest.iter().fold(first, |acc, &v| acc.zip(v, |a, b| a * b)),
        CombineMode::Min => rest.iter().fold(first, |acc, &v| acc.zip(v, min_nan)),
        CombineMode::Max => rest.iter().fold(first, |acc, &v| acc.zip(v, max_nan)),
        CombineMode::Average => {
            let n = values.len() as f64;
            rest.iter()
                .fold(first, |acc, &v| acc.zip(v, |a, b| a + b))
                .map(|s| s / n)
        }
    }
}

/// Apply a publisher's transform chain in order.
pub fn apply_transforms(value: BusValue, transforms: &[PublisherTransform]) -> BusValue {
    transforms
        .iter()
        .fold(value, |v, t| v.map(|c| t.apply(c)))
}

pub(crate) fn debug_assert_sorted(publishers: &[Publisher]) {
    debug_assert!(
        publishers
            .windows(2)
            .all(|w| (w[0].sort_key, w[0].id) <= (w[1].sort_key, w[1].id)),
        "publishers must be pre-sorted by (sort_key, id)"
    );
}

/// Read every enabled publisher of `spec` and combine them.
pub(crate) fn eval_bus(
    spec: &BusSpec,
    publishers: &[Publisher],
    values: &ValueStore,
    constants: &[ConstValue],
) -> ReelResult<BusValue> {
    debug_assert_sorted(publishers);
    let silent = resolve_silent(spec, constants)?;

    let mut inputs = Vec::with_capacity(publishers.len());
    for p in publishers.iter().filter(|p| p.enabled) {
        let raw = read_publisher(spec, p, values)?;
        inputs.push(apply_transforms(raw, &p.transforms));
    }
    Ok(combine(&inputs, spec.combine, silent))
}

fn read_publisher(spec: &BusSpec, p: &Publisher, values: &ValueStore) -> ReelResult<BusValue> {
    if spec.value_type == BusValueType::Number {
        return Ok(BusValue::Number(values.read_f64(p.source)?));
    }
    match (spec.value_type, values.read_object(p.source)?) {
        (BusValueType::Vec2, Some(ObjectValue::Vec2(v))) => Ok(BusValue::Vec2(*v)),
        (BusValueType::Color, Some(ObjectValue::Color(c))) => Ok(BusValue::Color(*c)),
        (ty, other) => Err(ReelError::contract(format!(
            "publisher {} on bus {} expected {ty:?} in slot {}, found {}",
            p.id,
            spec.id.0,
            p.source.0,
            other.map_or("nothing", ObjectValue::kind_name)
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/bus/combine.rs"]
mod tests;
