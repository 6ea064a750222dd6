use crate::foundation::error::{ReelError, ReelResult};

/// Default forward jump (ms) above which a sample is treated as a seek.
pub const DEFAULT_SCRUB_THRESHOLD_MS: f64 = 1000.0;

/// Time-domain model of a compiled program.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TimeModel {
    /// Bounded timeline `[0, duration_ms]`.
    Finite {
        /// Timeline length in milliseconds.
        duration_ms: f64,
    },
    /// Repeating timeline of length `period_ms`.
    Cyclic {
        /// Cycle length in milliseconds.
        period_ms: f64,
        /// Loop or ping-pong playback.
        #[serde(default)]
        mode: CyclicMode,
    },
    /// Unbounded timeline; model time equals absolute time.
    Infinite,
}

impl TimeModel {
    /// Reject non-positive or non-finite lengths.
    pub fn validate(&self) -> ReelResult<()> {
        let len = match *self {
            Self::Finite { duration_ms } => duration_ms,
            Self::Cyclic { period_ms, .. } => period_ms,
            Self::Infinite => return Ok(()),
        };
        if !(len.is_finite() && len > 0.0) {
            return Err(ReelError::contract(format!(
                "time model length must be finite and > 0, got {len}"
            )));
        }
        Ok(())
    }
}

/// Traversal rule for [`TimeModel::Cyclic`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CyclicMode {
    /// `0 → P`, then jump back to `0`.
    #[default]
    Loop,
    /// `0 → P → 0 → P ...`.
    PingPong,
}

/// How the host is driving time for this sample.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMode {
    /// Regular monotonic playback.
    #[default]
    Playback,
    /// The user is seeking; cyclic events are suppressed.
    Scrub,
}

/// Time bookkeeping carried from one frame to the next.
///
/// This is the only mutable per-frame state that lives outside the state buffer.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TimeState {
    /// Model time of the previous sample, if any.
    pub prev_t_model_ms: Option<f64>,
    /// Absolute time of the previous sample, if any.
    pub prev_t_abs_ms: Option<f64>,
    /// Number of wrap/bounce events observed so far.
    pub wrap_count: u64,
    /// Delta between the two most recent samples.
    pub last_delta_ms: f64,
}

/// Derived time signals for one frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize)]
pub struct EffectiveTime {
    /// Host-provided absolute time.
    pub t_abs_ms: f64,
    /// Time inside the model's domain.
    pub t_model_ms: f64,
    /// `t_abs_ms - prev_t_abs_ms` (0 on the first sample).
    pub delta_ms: f64,
    /// Cyclic phase (`[0, 1)` for loops, `[0, 1]` for ping-pong); `None` for non-cyclic models.
    pub phase01: Option<f64>,
    /// Finite progress in `[0, 1]`; `None` for non-finite models.
    pub progress01: Option<f64>,
    /// A loop completed (or a ping-pong reversed) on this sample.
    pub wrap_event: bool,
    /// A ping-pong reversal happened on this sample.
    pub bounce_event: bool,
    /// Running count of wrap/bounce events.
    pub wrap_count: u64,
    /// Whole cycles elapsed (`floor(t_abs / P)`) for cyclic models.
    pub cycle_count: Option<i64>,
    /// Ping-pong is currently traversing backwards.
    pub reversed: bool,
    /// This sample was classified as a seek.
    pub is_scrub: bool,
}

impl EffectiveTime {
    /// Seconds elapsed since the previous sample, or 0 while seeking or moving backwards.
    ///
    /// Stateful integrators use this so a seek never injects a huge timestep.
    pub fn playback_dt_secs(&self) -> f64 {
        if self.is_scrub || self.delta_ms <= 0.0 {
            0.0
        } else {
            self.delta_ms / 1000.0
        }
    }
}

/// Resolve `t_abs_ms` against `model`, updating `state` in place when provided.
///
/// Without a `state`, the sample is treated as the first one: no delta and no events.
pub fn resolve_time(
    t_abs_ms: f64,
    model: &TimeModel,
    state: Option<&mut TimeState>,
    mode: TimeMode,
) -> EffectiveTime {
    resolve_time_with_threshold(t_abs_ms, model, state, mode, DEFAULT_SCRUB_THRESHOLD_MS)
}

/// [`resolve_time`] with an explicit scrub threshold.
pub fn resolve_time_with_threshold(
    t_abs_ms: f64,
    model: &TimeModel,
    state: Option<&mut TimeState>,
    mode: TimeMode,
    scrub_threshold_ms: f64,
) -> EffectiveTime {
    let mut scratch = TimeState::default();
    let state = state.unwrap_or(&mut scratch);

    let delta_ms = state.prev_t_abs_ms.map_or(0.0, |prev| t_abs_ms - prev);
    let is_scrub =
        mode == TimeMode::Scrub || delta_ms < 0.0 || delta_ms.abs() > scrub_threshold_ms;

    let mut out = EffectiveTime {
        t_abs_ms,
        t_model_ms: t_abs_ms,
        delta_ms,
        is_scrub,
        ..EffectiveTime::default()
    };

    match *model {
        TimeModel::Finite { duration_ms } => {
            let t = t_abs_ms.clamp(0.0, duration_ms.max(0.0));
            out.t_model_ms = t;
            out.progress01 = Some(if duration_ms > 0.0 { t / duration_ms } else { 0.0 });
        }
        TimeModel::Cyclic { period_ms, mode } if period_ms > 0.0 => {
            let local = ((t_abs_ms % period_ms) + period_ms) % period_ms;
            let cycle = (t_abs_ms / period_ms).floor() as i64;
            out.cycle_count = Some(cycle);
            match mode {
                CyclicMode::Loop => {
                    out.t_model_ms = local;
                    out.wrap_event = !is_scrub
                        && state.prev_t_model_ms.is_some_and(|prev| local < prev);
                }
                CyclicMode::PingPong => {
                    let reversed = cycle.rem_euclid(2) == 1;
                    out.reversed = reversed;
                    out.t_model_ms = if reversed { period_ms - local } else { local };
                    let prev_cycle = state
                        .prev_t_abs_ms
                        .map(|prev| (prev / period_ms).floor() as i64);
                    out.bounce_event = !is_scrub && prev_cycle.is_some_and(|pc| pc != cycle);
                    out.wrap_event = out.bounce_event;
                }
            }
            // Ping-pong reaches `period` exactly at a reversal, so its phase spans [0, 1].
            out.phase01 = Some((out.t_model_ms / period_ms).clamp(0.0, 1.0));
        }
        TimeModel::Cyclic { .. } => {
            // Degenerate period; validated away before execution, kept total for direct callers.
            out.t_model_ms = 0.0;
            out.phase01 = Some(0.0);
            out.cycle_count = Some(0);
        }
        TimeModel::Infinite => {}
    }

    if out.wrap_event {
        state.wrap_count += 1;
    }
    state.prev_t_model_ms = Some(out.t_model_ms);
    state.prev_t_abs_ms = Some(t_abs_ms);
    state.last_delta_ms = delta_ms;
    out.wrap_count = state.wrap_count;
    out
}

#[cfg(test)]
#[path = "../../tests/unit/time/resolver.rs"]
mod tests;
