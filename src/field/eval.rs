use std::f64::consts::TAU;

use crate::field::expr::FieldExprIR;
use crate::foundation::core::{FieldExprId, SlotId};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::hash01;
use crate::ir::program::StorageClass;
use crate::store::value::ObjectValue;
use crate::store::values::ValueStore;

const MAX_DEPTH: usize = 64;

/// Interleaved per-element values of an evaluated expression.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Lanes {
    pub(crate) components: usize,
    pub(crate) data: Vec<f64>,
}

impl Lanes {
    fn splat(count: usize, v: &[f64]) -> Self {
        let mut data = Vec::with_capacity(count * v.len());
        for _ in 0..count {
            data.extend_from_slice(v);
        }
        Self {
            components: v.len(),
            data,
        }
    }

    fn per_element(count: usize, f: impl Fn(usize) -> f64) -> Self {
        Self {
            components: 1,
            data: (0..count).map(f).collect(),
        }
    }

    fn at(&self, i: usize, k: usize) -> f64 {
        // Scalars broadcast across components.
        if self.components == 1 {
            self.data[i]
        } else {
            self.data[i * self.components + k]
        }
    }
}

/// Evaluates field expressions over a domain, reading signals from the value store.
pub(crate) struct FieldEvaluator<'a> {
    fields: &'a [FieldExprIR],
    values: &'a ValueStore,
    count: usize,
}

impl<'a> FieldEvaluator<'a> {
    pub(crate) fn new(fields: &'a [FieldExprIR], values: &'a ValueStore, count: usize) -> Self {
        Self {
            fields,
            values,
            count,
        }
    }

    pub(crate) fn eval(&self, id: FieldExprId) -> ReelResult<Lanes> {
        self.eval_at(id, 0)
    }

    fn eval_at(&self, id: FieldExprId, depth: usize) -> ReelResult<Lanes> {
        if depth > MAX_DEPTH {
            return Err(ReelError::evaluation(format!(
                "field expression {} nests deeper than {MAX_DEPTH}",
                id.0
            )));
        }
        let expr = self
            .fields
            .get(id.0 as usize)
            .ok_or_else(|| ReelError::contract(format!("unknown field expression {}", id.0)))?;
        let n = self.count;
        let sub = |c: FieldExprId| self.eval_at(c, depth + 1);

        Ok(match *expr {
            FieldExprIR::Const { value } => Lanes::splat(n, &[value]),
            FieldExprIR::Signal { slot } => {
                let v = self.signal(slot)?;
                Lanes::splat(n, &v)
            }
            FieldExprIR::Index => Lanes::per_element(n, |i| i as f64),
            FieldExprIR::Normalized => {
                let denom = n.saturating_sub(1).max(1) as f64;
                Lanes::per_element(n, |i| i as f64 / denom)
            }
            FieldExprIR::Random { seed } => Lanes::per_element(n, |i| hash01(seed, i as u64)),
            FieldExprIR::Unary { fun, arg } => {
                let mut l = sub(arg)?;
                l.data.iter_mut().for_each(|x| *x = fun.apply(*x));
                l
            }
            FieldExprIR::Binary { fun, a, b } => {
                let (a, b) = (sub(a)?, sub(b)?);
                let components = match (a.components, b.components) {
                    (x, y) if x == y => x,
                    (1, y) => y,
                    (x, 1) => x,
                    (x, y) => {
                        return Err(ReelError::materialize(format!(
                            "field expression {}: cannot combine {x} and {y} components",
                            id.0
                        )));
                    }
                };
                let mut data = Vec::with_capacity(n * components);
                for i in 0..n {
                    for k in 0..components {
                        data.push(fun.apply(a.at(i, k), b.at(i, k)));
                    }
                }
                Lanes { components, data }
            }
            FieldExprIR::Vec2 { x, y } => self.pack(id, &[x, y], depth)?,
            FieldExprIR::Vec3 { x, y, z } => self.pack(id, &[x, y, z], depth)?,
            FieldExprIR::Color { r, g, b, a } => self.pack(id, &[r, g, b, a], depth)?,
            FieldExprIR::Polar { radius, angle } => {
                let (r, a) = (self.scalar(id, radius, depth)?, self.scalar(id, angle, depth)?);
                let mut data = Vec::with_capacity(n * 2);
                for i in 0..n {
                    let (s, c) = (TAU * a.data[i]).sin_cos();
                    data.push(r.data[i] * c);
                    data.push(r.data[i] * s);
                }
                Lanes {
                    components: 2,
                    data,
                }
            }
        })
    }

    fn scalar(&self, parent: FieldExprId, id: FieldExprId, depth: usize) -> ReelResult<Lanes> {
        let l = self.eval_at(id, depth + 1)?;
        if l.components != 1 {
            return Err(ReelError::materialize(format!(
                "field expression {}: operand {} must be scalar, has {} components",
                parent.0, id.0, l.components
            )));
        }
        Ok(l)
    }

    fn pack(&self, parent: FieldExprId, parts: &[FieldExprId], depth: usize) -> ReelResult<Lanes> {
        let lanes = parts
            .iter()
            .map(|&p| self.scalar(parent, p, depth))
            .collect::<ReelResult<Vec<_>>>()?;
        let components = lanes.len();
        let mut data = Vec::with_capacity(self.count * components);
        for i in 0..self.count {
            data.extend(lanes.iter().map(|l| l.data[i]));
        }
        Ok(Lanes { components, data })
    }

    fn signal(&self, slot: SlotId) -> ReelResult<Vec<f64>> {
        if self.values.storage_of(slot)? != StorageClass::Object {
            return Ok(vec![self.values.read_f64(slot)?]);
        }
        match self.values.read_object(slot)? {
            Some(ObjectValue::Vec2(v)) => Ok(vec![v.x, v.y]),
            Some(ObjectValue::Color(c)) => Ok(c.to_array().iter().map(|&x| f64::from(x)).collect()),
            other => Err(ReelError::materialize(format!(
                "slot {} cannot be broadcast into a field (holds {})",
                slot.0,
                other.map_or("nothing", ObjectValue::kind_name)
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/field/eval.rs"]
mod tests;
