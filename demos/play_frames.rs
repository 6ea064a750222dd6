use reel::{RecordingProbe, Session};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let mut session = Session::from_json(include_str!("../tests/data/pulse_grid.json"))?;
    session.runtime_mut().set_probe(Box::new(RecordingProbe::new()));

    for f in [0u32, 1, 2, 30, 59, 60, 61, 119, 120] {
        let t = f64::from(f) * 1000.0 / 60.0;
        let frame = session.render(t)?;
        let stats = session.stats();
        println!(
            "frame {f}: {} passes, {} steps, field cache {}/{}",
            frame.passes.len(),
            stats.steps_executed,
            stats.field_cache_hits,
            stats.field_cache_misses
        );
    }

    if let Some(probe) = session.runtime().probe::<RecordingProbe>() {
        for r in &probe.records {
            println!("probe {} @ {:.1}ms: {:?}", r.probe.0, r.t_model_ms, r.values);
        }
    }

    Ok(())
}
