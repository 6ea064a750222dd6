use std::sync::Arc;

use crate::bus::combine::{BusValue, eval_bus};
use crate::bus::events::eval_event_bus;
use crate::exec::nodes::eval_node;
use crate::exec::probe::{ProbeRecord, ProbeValue};
use crate::exec::runtime::{FrameStats, RuntimeState};
use crate::foundation::core::SlotId;
use crate::foundation::error::{ReelError, ReelResult};
use crate::frame::assemble::assemble_frame;
use crate::frame::validate::validate_frame;
use crate::ir::frame::RenderFrameIR;
use crate::ir::program::CompiledProgramIR;
use crate::ir::step::{Step, TimeDeriveStep};
use crate::materialize::buffers::FieldBuffer;
use crate::materialize::color::materialize_color;
use crate::materialize::field::materialize_field;
use crate::materialize::geometry::{instances_from_positions, layout_positions};
use crate::materialize::path::materialize_path;
use crate::materialize::read_domain;
use crate::store::value::ObjectValue;
use crate::store::values::ValueStore;
use crate::time::resolver::{EffectiveTime, TimeMode, resolve_time_with_threshold};

/// Execute one playback frame at absolute time `t_abs_ms`.
pub fn execute_frame(
    program: &CompiledProgramIR,
    runtime: &mut RuntimeState,
    t_abs_ms: f64,
) -> ReelResult<Arc<RenderFrameIR>> {
    execute_frame_with_mode(program, runtime, t_abs_ms, TimeMode::Playback)
}

/// Execute one frame.
///
/// Runs, in order and without skipping: the lifecycle reset (new frame id, cleared value
/// store, emptied frame cache), time resolution, every scheduled step in stored order, and
/// extraction plus validation of the render output. Any error aborts the frame.
#[tracing::instrument(skip(program, runtime), fields(frame_id = runtime.frame_id + 1))]
pub fn execute_frame_with_mode(
    program: &CompiledProgramIR,
    runtime: &mut RuntimeState,
    t_abs_ms: f64,
    mode: TimeMode,
) -> ReelResult<Arc<RenderFrameIR>> {
    if !t_abs_ms.is_finite() {
        return Err(ReelError::contract(format!("t_abs_ms must be finite, got {t_abs_ms}")));
    }
    if runtime.values.len() != program.slot_meta.len() {
        return Err(ReelError::contract(format!(
            "runtime has {} slots but the program declares {}",
            runtime.values.len(),
            program.slot_meta.len()
        )));
    }

    runtime.frame_id += 1;
    let frame_id = runtime.frame_id;
    runtime.values.clear(frame_id);
    runtime.frame_cache.begin_frame(frame_id);
    let mesh_before = (runtime.mesh_store.hits(), runtime.mesh_store.misses());

    let time = resolve_time_with_threshold(
        t_abs_ms,
        &program.time_model,
        Some(&mut runtime.time_state),
        mode,
        runtime.opts.scrub_threshold_ms,
    );
    runtime.effective_time = time;

    let mut buffer_non_finite = 0u64;
    for (i, step) in program.schedule.steps.iter().enumerate() {
        execute_step(program, runtime, step, &time, &mut buffer_non_finite).inspect_err(|e| {
            tracing::debug!(step = i, kind = step.kind_name(), error = %e, "step failed");
        })?;
    }

    let out = program.render_output()?;
    let frame = match runtime.values.read_object(out)? {
        Some(ObjectValue::Frame(f)) => f.clone(),
        other => {
            return Err(ReelError::contract(format!(
                "render output slot {} holds {}, expected a render frame",
                out.0,
                other.map_or("nothing", ObjectValue::kind_name)
            )));
        }
    };
    validate_frame(&frame)?;

    finish_frame(runtime, program.schedule.steps.len(), mesh_before, buffer_non_finite);
    Ok(frame)
}

fn finish_frame(
    runtime: &mut RuntimeState,
    steps: usize,
    mesh_before: (u64, u64),
    buffer_non_finite: u64,
) {
    let tally = runtime.values.non_finite();
    let non_finite = tally.nan + tally.inf + buffer_non_finite;
    runtime.stats = FrameStats {
        frame_id: runtime.frame_id,
        steps_executed: steps as u32,
        field_cache_hits: runtime.frame_cache.hits(),
        field_cache_misses: runtime.frame_cache.misses(),
        mesh_cache_hits: runtime.mesh_store.hits() - mesh_before.0,
        mesh_cache_misses: runtime.mesh_store.misses() - mesh_before.1,
        non_finite,
    };

    let health = &mut runtime.numeric;
    health.nan_count += tally.nan;
    health.inf_count += tally.inf;
    health.buffer_non_finite += buffer_non_finite;
    health.last_frame_non_finite = non_finite > 0;
    if non_finite > 0 {
        health.frames_with_non_finite += 1;
        if runtime.opts.warn_on_non_finite {
            tracing::warn!(
                frame_id = runtime.frame_id,
                nan = tally.nan,
                inf = tally.inf,
                buffer_components = buffer_non_finite,
                "frame produced non-finite values"
            );
        }
    }
}

fn execute_step(
    program: &CompiledProgramIR,
    rt: &mut RuntimeState,
    step: &Step,
    time: &EffectiveTime,
    buffer_non_finite: &mut u64,
) -> ReelResult<()> {
    match step {
        Step::TimeDerive(s) => write_time(&mut rt.values, s, time),
        Step::NodeEval(s) => eval_node(s, program, &mut rt.values, &mut rt.state, time),
        Step::BusEval(s) => {
            let v = eval_bus(&s.bus, &s.publishers, &rt.values, &program.constants)?;
            match v {
                BusValue::Number(x) => rt.values.write_number(s.out, x),
                BusValue::Vec2(v) => rt.values.write_object(s.out, ObjectValue::Vec2(v)),
                BusValue::Color(c) => rt.values.write_object(s.out, ObjectValue::Color(c)),
            }
        }
        Step::EventBusEval(s) => {
            let events = eval_event_bus(&s.publishers, &rt.values)?;
            rt.values.write_object(s.out, ObjectValue::Events(events))
        }
        Step::Materialize(s) => {
            let misses = rt.frame_cache.misses();
            let buf = materialize_field(
                s.field,
                s.domain,
                s.format,
                &program.fields,
                &rt.values,
                &mut rt.frame_cache,
            )?;
            // Cached buffers were tallied when first built.
            if rt.frame_cache.misses() > misses {
                *buffer_non_finite += u64::from(buf.non_finite);
            }
            rt.values.write_object(s.out, ObjectValue::FieldBuffer(buf))
        }
        Step::MaterializeColor(s) => {
            let ch = materialize_color(
                s.domain,
                s.source,
                &program.fields,
                &rt.values,
                &mut rt.frame_cache,
            )?;
            rt.values.write_object(s.out, ObjectValue::ColorBuffer(ch))
        }
        Step::MaterializePath(s) => {
            let paths = materialize_path(s.source, s.domain, &rt.values)?;
            rt.values.write_object(s.out, ObjectValue::Paths(paths))
        }
        Step::MaterializeMesh(s) => {
            let mesh = rt.mesh_store.get_or_build(&s.recipe)?;
            rt.values.write_object(s.out, ObjectValue::Mesh(mesh))
        }
        Step::MaterializeTestGeometry(s) => {
            let count = read_domain(&rt.values, s.domain)?;
            let buf = Arc::new(layout_positions(&s.layout, count));
            *buffer_non_finite += u64::from(buf.non_finite);
            rt.values.write_object(s.out, ObjectValue::FieldBuffer(buf))
        }
        Step::CameraEval(s) => {
            let azimuth = match s.azimuth {
                Some(slot) => rt.values.read_f64(slot)?,
                None => s.camera.azimuth,
            };
            let elevation = match s.elevation {
                Some(slot) => rt.values.read_f64(slot)?,
                None => s.camera.elevation,
            };
            let cam = s.camera.evaluate(azimuth, elevation)?;
            rt.values.write_object(s.out, ObjectValue::Camera(Arc::new(cam)))
        }
        Step::MaterializeInstances3D(s) => {
            let count = read_domain(&rt.values, s.domain)?;
            let positions = field_buffer(&rt.values, s.positions)?;
            if positions.count != count {
                return Err(ReelError::materialize(format!(
                    "instance positions hold {} elements, domain has {count}",
                    positions.count
                )));
            }
            let scale = match s.scale {
                Some(slot) => rt.values.read_f64(slot)?,
                None => 1.0,
            };
            let inst = instances_from_positions(&positions, scale)?;
            rt.values
                .write_object(s.out, ObjectValue::Instances3D(Arc::new(inst)))
        }
        Step::RenderAssemble(s) => {
            let frame = assemble_frame(s.clear, &s.passes, &rt.values)?;
            rt.values
                .write_object(s.out, ObjectValue::Frame(Arc::new(frame)))
        }
        Step::DebugProbe(s) => {
            let Some(sink) = rt.probe.as_mut() else {
                return Ok(());
            };
            sink.record(ProbeRecord {
                frame_id: rt.frame_id,
                probe: s.probe,
                t_model_ms: time.t_model_ms,
                values: s
                    .slots
                    .iter()
                    .map(|&slot| (slot, ProbeValue::capture(&rt.values, slot)))
                    .collect(),
            });
            Ok(())
        }
    }
}

fn write_time(values: &mut ValueStore, s: &TimeDeriveStep, t: &EffectiveTime) -> ReelResult<()> {
    let numbers = [
        (s.t_abs, t.t_abs_ms),
        (s.t_model, t.t_model_ms),
        (s.delta, t.delta_ms),
        (s.phase, t.phase01.unwrap_or(0.0)),
        (s.progress, t.progress01.unwrap_or(0.0)),
        (s.wrap_count, t.wrap_count as f64),
    ];
    for (slot, v) in numbers {
        if let Some(slot) = slot {
            values.write_number(slot, v)?;
        }
    }
    let flags = [
        (s.wrap_event, t.wrap_event),
        (s.bounce_event, t.bounce_event),
        (s.is_scrub, t.is_scrub),
    ];
    for (slot, v) in flags {
        if let Some(slot) = slot {
            values.write_bool(slot, v)?;
        }
    }
    Ok(())
}

fn field_buffer(values: &ValueStore, slot: SlotId) -> ReelResult<Arc<FieldBuffer>> {
    match values.read_object(slot)? {
        Some(ObjectValue::FieldBuffer(b)) => Ok(b.clone()),
        other => Err(ReelError::materialize(format!(
            "slot {} holds {}, expected a field buffer",
            slot.0,
            other.map_or("nothing", ObjectValue::kind_name)
        ))),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/exec/executor.rs"]
mod tests;
