//! Benchmark suites feeding chart output

use crate::test_utils::{init_tracing, scratch_dir};
use keypost_bench::{
    measure, renderer_for, repeated, single_pass, BenchmarkError, JsonSeries, RenderError,
    SampleRenderer, SuiteError, SvgLineChart, ALICE_MESSAGE, DEFAULT_TITLE,
};
use keypost_core::config::BenchConfig;
use keypost_crypto::{encrypt, KeyPair};

#[test]
fn test_suites_render_default_charts() {
    init_tracing();

    let dir = scratch_dir("charts");
    let bench = BenchConfig {
        output_dir: dir.clone(),
        iterations: 2,
        ..BenchConfig::default()
    };

    let single = single_pass(1024, "hello world").unwrap();
    assert_eq!(single.recovered, ALICE_MESSAGE);
    let single_path = bench.output_dir.join(&bench.single_pass_chart);
    renderer_for(&single_path)
        .render(DEFAULT_TITLE, &single.series_ms(), &single_path)
        .unwrap();

    let report = repeated(1024, bench.iterations, "hello world").unwrap();
    let repeated_path = bench.output_dir.join(&bench.repeated_chart);
    renderer_for(&repeated_path)
        .render(DEFAULT_TITLE, &report.timeline_ms(), &repeated_path)
        .unwrap();

    let svg = std::fs::read_to_string(&repeated_path).unwrap();
    assert_eq!(svg.matches("<circle").count(), 6 * bench.iterations);
    assert!(std::fs::metadata(&single_path).unwrap().len() > 0);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_render_failure_leaves_measurement_untouched() {
    let dir = scratch_dir("blocked");
    std::fs::create_dir_all(&dir).unwrap();
    let blocker = dir.join("not-a-dir");
    std::fs::write(&blocker, b"").unwrap();

    let measurement = measure("noop", 3, || Ok::<(), std::io::Error>(())).unwrap();
    let before = measurement.series_ms();

    let result = SvgLineChart::default().render(DEFAULT_TITLE, &before, &blocker.join("c.svg"));
    assert!(matches!(result, Err(RenderError::Io(_))));
    assert!(JsonSeries.render(DEFAULT_TITLE, &[], &dir.join("empty.json")).is_err());

    assert_eq!(measurement.series_ms(), before);
    assert_eq!(measurement.samples.len(), 3);

    let _ = std::fs::remove_dir_all(&dir);
}

#[test]
fn test_encryption_failure_aborts_measurement() {
    let pair = KeyPair::generate(1024).unwrap();
    let oversized = vec![0u8; 200];

    let result = measure("encrypt", 5, || encrypt(pair.public_key(), &oversized).map(drop));
    assert!(matches!(
        result,
        Err(BenchmarkError::OperationFailed { iteration: 1, .. })
    ));
}

#[test]
fn test_repeated_suite_reports_first_failure() {
    let result = repeated(2000, 1, "hello world");
    assert!(matches!(
        result,
        Err(SuiteError::Benchmark(BenchmarkError::OperationFailed { .. }))
    ));
}
