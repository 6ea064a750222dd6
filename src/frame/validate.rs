use crate::foundation::error::{ReelError, ReelResult};
use crate::ir::frame::{ClearMode, RENDER_FRAME_VERSION, RenderFrameIR, RenderPassIR};
use crate::materialize::buffers::{BufferFormat, FieldBuffer, PathBuffers, path_op};

/// Check that `frame` is well formed for a rendering backend.
///
/// A failure means the program produced a malformed output; the frame must not be presented.
pub fn validate_frame(frame: &RenderFrameIR) -> ReelResult<()> {
    if frame.version != RENDER_FRAME_VERSION {
        return Err(malformed(format!(
            "version {} (expected {RENDER_FRAME_VERSION})",
            frame.version
        )));
    }
    if frame.clear.mode == ClearMode::Color && frame.clear.color_rgba.is_none() {
        return Err(malformed("color clear without a color".to_string()));
    }
    for (i, pass) in frame.passes.iter().enumerate() {
        match pass {
            RenderPassIR::Instances2D(p) => {
                let n = p.count;
                check_field(i, "position", &p.position, BufferFormat::Vec2F32, n)?;
                check_field(i, "size", &p.size, BufferFormat::F32, n)?;
                check_field(i, "opacity", &p.opacity, BufferFormat::F32, n)?;
                let c = &p.color;
                let n = n as usize;
                if c.count as usize != n
                    || c.r.len() != n
                    || c.g.len() != n
                    || c.b.len() != n
                    || c.a.len() != n
                {
                    return Err(malformed(format!("pass {i}: color channels do not match count {n}")));
                }
            }
            RenderPassIR::Paths2D(p) => check_paths(i, &p.paths)?,
            RenderPassIR::Instances3D(p) => {
                if p.instances.transforms.len() != p.instances.count as usize * 16 {
                    return Err(malformed(format!("pass {i}: instance transform length")));
                }
                let m = &p.mesh;
                if m.positions.len() != m.vertex_count as usize * 3 || m.indices.len() % 3 != 0 {
                    return Err(malformed(format!("pass {i}: mesh buffer lengths")));
                }
            }
        }
    }
    Ok(())
}

fn malformed(msg: String) -> ReelError {
    ReelError::contract(format!("malformed render frame: {msg}"))
}

fn check_field(
    pass: usize,
    name: &str,
    buf: &FieldBuffer,
    format: BufferFormat,
    count: u32,
) -> ReelResult<()> {
    if buf.format != format
        || buf.count != count
        || buf.data.len() != count as usize * format.components()
    {
        return Err(malformed(format!(
            "pass {pass}: {name} is {} x {:?} with {} values, expected {count} x {format:?}",
            buf.count,
            buf.format,
            buf.data.len()
        )));
    }
    Ok(())
}

fn check_paths(pass: usize, p: &PathBuffers) -> ReelResult<()> {
    let n = p.cmd_start.len();
    if p.cmd_len.len() != n || p.point_start.len() != n || p.point_len.len() != n {
        return Err(malformed(format!("pass {pass}: path index tables differ in length")));
    }
    if p.points.len() % 2 != 0 {
        return Err(malformed(format!("pass {pass}: odd point buffer length")));
    }
    let points = p.points.len() / 2;
    for k in 0..n {
        let (cs, cl) = (p.cmd_start[k] as usize, p.cmd_len[k] as usize);
        let (ps, pl) = (p.point_start[k] as usize, p.point_len[k] as usize);
        let Some(cmds) = p.commands.get(cs..cs + cl) else {
            return Err(malformed(format!("pass {pass}: path {k} command range out of bounds")));
        };
        if ps + pl > points {
            return Err(malformed(format!("pass {pass}: path {k} point range out of bounds")));
        }
        if cmds.iter().any(|&op| op > path_op::CLOSE) {
            return Err(malformed(format!("pass {pass}: path {k} has an unknown opcode")));
        }
        let arity: usize = cmds.iter().map(|&op| path_op::arity(op)).sum();
        if arity != pl {
            return Err(malformed(format!(
                "pass {pass}: path {k} commands consume {arity} points, table says {pl}"
            )));
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/frame/validate.rs"]
mod tests;
