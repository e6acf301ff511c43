use anyhow::Result;
use tricolage::dna::write_records;
use tricolage::fitness::{fitness_percent, sad_rgb_parallel};
use tricolage::render::CpuRenderer;
use tricolage::{Engine, EvolveError, RunSettings, TargetImage};

fn gradient(width: u32, height: u32) -> Result<TargetImage> {
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height {
        for x in 0..width {
            rgb.extend_from_slice(&[(x * 255 / width) as u8, (y * 255 / height) as u8, 128]);
        }
    }
    Ok(TargetImage::from_rgb8(width, height, rgb)?)
}

fn settings(triangles: usize, seed: u32) -> RunSettings {
    RunSettings { triangle_count: triangles, mutation_seed: seed, ..RunSettings::default() }
}

#[test]
fn best_score_never_increases() -> Result<()> {
    let mut engine = Engine::new(gradient(16, 12)?, settings(12, 7))?;
    let mut last = u64::MAX;
    for _ in 0..300 {
        engine.step()?;
        let best = engine.ledger().best_score;
        assert!(best <= last, "best score went from {last} to {best}");
        last = best;
    }
    Ok(())
}

#[test]
fn improvements_bounded_by_iterations() -> Result<()> {
    let mut engine = Engine::new(gradient(10, 10)?, settings(8, 3))?;
    for _ in 0..20 {
        let report = engine.run_batch(10)?;
        assert!(report.improvements <= report.iterations);
        assert!(report.accepted <= 10);
    }
    assert_eq!(engine.ledger().iterations, 200);
    Ok(())
}

#[test]
fn acceptance_follows_strict_improvement() -> Result<()> {
    let mut engine = Engine::new(gradient(9, 7)?, settings(6, 11))?;
    for _ in 0..150 {
        let before = engine.ledger();
        let best_before = engine.store().best().clone();
        let out = engine.step()?;
        let after = engine.ledger();

        assert_eq!(after.iterations, before.iterations + 1);
        if out.commit.score() < before.best_score {
            assert!(out.commit.accepted());
            assert_eq!(after.best_score, out.commit.score());
            assert_eq!(after.improvements, before.improvements + 1);
            assert_eq!(engine.store().best(), engine.store().mutant());
        } else {
            assert!(!out.commit.accepted());
            assert_eq!(after.best_score, before.best_score);
            assert_eq!(after.improvements, before.improvements);
            assert_eq!(engine.store().best(), &best_before);
        }
    }
    Ok(())
}

#[test]
fn same_seed_same_run() -> Result<()> {
    let mut a = Engine::new(gradient(12, 8)?, settings(10, 42))?;
    let mut b = Engine::new(gradient(12, 8)?, settings(10, 42))?;
    for _ in 0..300 {
        assert_eq!(a.step()?, b.step()?);
        assert_eq!(a.ledger(), b.ledger());
        assert_eq!(a.seed_state(), b.seed_state());
    }
    for _ in 0..10 {
        let ra = a.run_batch(15)?;
        let rb = b.run_batch(15)?;
        assert_eq!(ra.best_score, rb.best_score);
        assert_eq!(ra.improvements, rb.improvements);
    }
    assert_eq!(a.store().best(), b.store().best());
    assert_eq!(a.seed_state(), b.seed_state());

    let mut c = Engine::new(gradient(12, 8)?, settings(10, 43))?;
    for _ in 0..10 {
        c.run_batch(15)?;
    }
    assert_ne!(a.store().best(), c.store().best());
    Ok(())
}

#[test]
fn fitness_stays_in_bounds() -> Result<()> {
    let (w, h) = (5, 4);
    let mut engine = Engine::new(gradient(w, h)?, settings(3, 5))?;
    for _ in 0..10 {
        let report = engine.run_batch(5)?;
        assert!((0.0..=100.0).contains(&report.fitness_percent));
        assert_eq!(report.fitness_percent, fitness_percent(report.best_score, w, h));
    }
    assert_eq!(fitness_percent(0, w, h), 100.0);
    assert_eq!(fitness_percent(u64::MAX, w, h), 0.0);
    Ok(())
}

#[test]
fn first_step_on_white_matches_its_render() -> Result<()> {
    let target = TargetImage::solid(2, 2, [255, 255, 255])?;
    let mut engine = Engine::new(target, settings(1, 1))?;
    let out = engine.step()?;

    // first iteration is always admitted, so best holds the mutated triangle
    assert!(out.commit.accepted());
    let rgba = CpuRenderer::render_rgba(engine.store().best(), 2, 2)?;
    let expected: u64 = rgba
        .chunks_exact(4)
        .flat_map(|px| px[..3].iter().map(|&c| (255 - c) as u64))
        .sum();
    assert_eq!(out.commit.score(), expected);
    assert_eq!(engine.ledger().best_score, expected);
    Ok(())
}

#[test]
fn zero_triangles_rejected() {
    let target = TargetImage::solid(2, 2, [255; 3]).unwrap();
    match Engine::new(target, settings(0, 1)) {
        Err(EvolveError::InvalidConfiguration { .. }) => {}
        Err(other) => panic!("wrong error: {other}"),
        Ok(_) => panic!("zero triangles accepted"),
    }
}

#[test]
fn dump_has_one_record_per_triangle() -> Result<()> {
    let n = 17;
    let mut engine = Engine::new(gradient(8, 8)?, settings(n, 9))?;
    engine.run_batch(n as u32)?;

    let records = engine.dump_best();
    assert_eq!(records.len(), n);
    for rec in &records {
        assert!(rec.coords.iter().all(|v| (0.0..=1.0).contains(v)));
        assert!(rec.rgba.iter().all(|v| (0.0..=1.0).contains(v)));
    }

    let dir = tempfile::tempdir()?;
    let path = dir.path().join("best.txt");
    write_records(&records, std::fs::File::create(&path)?)?;
    let text = std::fs::read_to_string(&path)?;
    assert_eq!(text.lines().count(), n);
    for line in text.lines() {
        assert_eq!(line.split_whitespace().count(), 10);
    }
    Ok(())
}

#[test]
fn batch_score_matches_best_render() -> Result<()> {
    let mut engine = Engine::new(gradient(11, 6)?, settings(5, 2))?;
    let report = engine.run_batch(40)?;
    let rgba = engine.render_best_rgba()?;
    assert_eq!(sad_rgb_parallel(engine.target().rgb(), &rgba, 11), report.best_score);
    Ok(())
}
