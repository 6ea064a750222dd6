use crate::bus::events::BusEvent;
use crate::foundation::core::{Rgba, SlotId, StateCellIdx, Vec2};
use crate::foundation::error::{ReelError, ReelResult};
use crate::foundation::math::{max_nan, min_nan};
use crate::ir::program::CompiledProgramIR;
use crate::ir::step::{NodeEvalStep, NodeOp};
use crate::store::state::StateBuffer;
use crate::store::value::ObjectValue;
use crate::store::values::ValueStore;
use crate::time::resolver::EffectiveTime;

/// Longest integration step for springs; larger frame deltas are subdivided.
const SPRING_MAX_STEP_SECS: f64 = 1.0 / 120.0;
/// Substep budget per frame; longer gaps only simulate the first
/// `SPRING_MAX_SUBSTEPS * SPRING_MAX_STEP_SECS` seconds.
const SPRING_MAX_SUBSTEPS: f64 = 1024.0;

/// Evaluate one operator, writing its outputs and updating its state cells.
pub(crate) fn eval_node(
    step: &NodeEvalStep,
    program: &CompiledProgramIR,
    values: &mut ValueStore,
    state: &mut StateBuffer,
    time: &EffectiveTime,
) -> ReelResult<()> {
    let node = Node {
        step,
        values: &*values,
    };
    let out = node.output(0)?;
    let dt = time.playback_dt_secs();

    match step.op {
        NodeOp::Const { id } => {
            let c = program.constant(id)?;
            match c.as_f64() {
                Some(v) => values.write_number(out, v),
                None => match c.to_object() {
                    Some(obj) => values.write_object(out, obj),
                    None => Err(ReelError::contract(format!("constant {} has no slot form", id.0))),
                },
            }
        }
        NodeOp::Add => binary(values, step, |a, b| a + b),
        NodeOp::Sub => binary(values, step, |a, b| a - b),
        NodeOp::Mul => binary(values, step, |a, b| a * b),
        NodeOp::Div => binary(values, step, |a, b| a / b),
        NodeOp::Min => binary(values, step, min_nan),
        NodeOp::Max => binary(values, step, max_nan),
        NodeOp::Sin => unary(values, step, f64::sin),
        NodeOp::Cos => unary(values, step, f64::cos),
        NodeOp::Abs => unary(values, step, f64::abs),
        NodeOp::Oscillator { wave } => unary(values, step, |p| wave.sample(p)),
        NodeOp::Ease { ease } => unary(values, step, |t| ease.apply(t)),
        NodeOp::Clamp => {
            let [x, lo, hi] = node.numbers::<3>()?;
            values.write_number(out, min_nan(max_nan(x, lo), hi))
        }
        NodeOp::Lerp => {
            let [a, b, t] = node.numbers::<3>()?;
            values.write_number(out, a + (b - a) * t)
        }
        NodeOp::FieldRef { field } => {
            program.field(field)?;
            values.write_object(out, ObjectValue::Field(field))
        }
        NodeOp::ColorRgba => {
            let [r, g, b, a] = node.numbers::<4>()?;
            let c = Rgba::new(r as f32, g as f32, b as f32, a as f32);
            values.write_object(out, ObjectValue::Color(c))
        }
        NodeOp::Vec2 => {
            let [x, y] = node.numbers::<2>()?;
            values.write_object(out, ObjectValue::Vec2(Vec2::new(x, y)))
        }
        NodeOp::Domain { count } => values.write_number(out, f64::from(count)),
        NodeOp::EmitOnTrigger => {
            let fired = node.number(0)? != 0.0;
            let value = node.optional_number(1)?.unwrap_or(1.0);
            let events: Vec<BusEvent> = if fired {
                vec![BusEvent {
                    t_ms: time.t_model_ms,
                    value,
                }]
            } else {
                Vec::new()
            };
            values.write_object(out, ObjectValue::Events(events.into()))
        }
        NodeOp::Integrate => {
            let x = node.number(0)?;
            let acc = cell(state, step, 0)?;
            *acc += x * dt;
            let v = *acc;
            values.write_number(out, v)
        }
        NodeOp::Smooth { rate } => {
            let x = node.number(0)?;
            let y = cell(state, step, 0)?;
            if time.is_scrub {
                *y = x;
            } else {
                *y += (x - *y) * (1.0 - (-rate.max(0.0) * dt).exp());
            }
            let v = *y;
            values.write_number(out, v)
        }
        NodeOp::Delay => {
            let x = node.number(0)?;
            let prev = cell(state, step, 0)?;
            let v = std::mem::replace(prev, x);
            values.write_number(out, v)
        }
        NodeOp::SampleHold => {
            let [x, trigger] = node.numbers::<2>()?;
            let held = cell(state, step, 0)?;
            if trigger != 0.0 {
                *held = x;
            }
            let v = *held;
            values.write_number(out, v)
        }
        NodeOp::Counter => {
            let trigger = node.number(0)? != 0.0;
            let reset = node.optional_number(1)?.is_some_and(|r| r != 0.0);
            let count = cell(state, step, 0)?;
            if reset {
                *count = 0.0;
            }
            if trigger {
                *count += 1.0;
            }
            let v = *count;
            values.write_number(out, v)
        }
        NodeOp::Spring { stiffness, damping } => {
            let target = node.number(0)?;
            let mut pos = *cell(state, step, 0)?;
            let mut vel = *cell(state, step, 1)?;
            if time.is_scrub {
                pos = target;
                vel = 0.0;
            } else if dt > 0.0 {
                let steps = (dt / SPRING_MAX_STEP_SECS).ceil().clamp(1.0, SPRING_MAX_SUBSTEPS);
                let h = (dt / steps).min(SPRING_MAX_STEP_SECS);
                for _ in 0..steps as u32 {
                    let a = stiffness * (target - pos) - damping * vel;
                    vel += a * h;
                    pos += vel * h;
                }
            }
            *cell(state, step, 0)? = pos;
            *cell(state, step, 1)? = vel;
            values.write_number(out, pos)
        }
    }
}

struct Node<'a> {
    step: &'a NodeEvalStep,
    values: &'a ValueStore,
}

impl Node<'_> {
    fn input(&self, i: usize) -> ReelResult<SlotId> {
        self.step.inputs.get(i).copied().ok_or_else(|| {
            ReelError::contract(format!(
                "node {} ({:?}) is missing input {i}",
                self.step.node_id, self.step.op
            ))
        })
    }

    fn output(&self, i: usize) -> ReelResult<SlotId> {
        self.step.outputs.get(i).copied().ok_or_else(|| {
            ReelError::contract(format!("node {} is missing output {i}", self.step.node_id))
        })
    }

    fn number(&self, i: usize) -> ReelResult<f64> {
        self.values.read_f64(self.input(i)?)
    }

    fn optional_number(&self, i: usize) -> ReelResult<Option<f64>> {
        match self.step.inputs.get(i) {
            Some(&slot) => Ok(Some(self.values.read_f64(slot)?)),
            None => Ok(None),
        }
    }

    fn numbers<const N: usize>(&self) -> ReelResult<[f64; N]> {
        let mut out = [0.0; N];
        for (i, v) in out.iter_mut().enumerate() {
            *v = self.number(i)?;
        }
        Ok(out)
    }
}

fn unary(values: &mut ValueStore, step: &NodeEvalStep, f: impl Fn(f64) -> f64) -> ReelResult<()> {
    let node = Node {
        step,
        values: &*values,
    };
    let (x, out) = (node.number(0)?, node.output(0)?);
    values.write_number(out, f(x))
}

fn binary(
    values: &mut ValueStore,
    step: &NodeEvalStep,
    f: impl Fn(f64, f64) -> f64,
) -> ReelResult<()> {
    let node = Node {
        step,
        values: &*values,
    };
    let ([a, b], out) = (node.numbers::<2>()?, node.output(0)?);
    values.write_number(out, f(a, b))
}

fn cell<'s>(state: &'s mut StateBuffer, step: &NodeEvalStep, i: usize) -> ReelResult<&'s mut f64> {
    let idx: StateCellIdx = step.state.get(i).copied().ok_or_else(|| {
        ReelError::contract(format!(
            "node {} ({:?}) is missing state cell {i}",
            step.node_id, step.op
        ))
    })?;
    let lanes = state.f64_mut(idx)?;
    lanes.first_mut().ok_or_else(|| {
        ReelError::contract(format!("state cell {} of node {} is empty", idx.0, step.node_id))
    })
}

#[cfg(test)]
#[path = "../../tests/unit/exec/nodes.rs"]
mod tests;
