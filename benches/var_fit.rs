use std::hint::black_box;
use std::time::Duration;

use chrono::Months;
use chrono::NaiveDate;
use criterion::BenchmarkId;
use criterion::Criterion;
use criterion::criterion_group;
use criterion::criterion_main;
use macrovar::data::MultivariateSeries;
use macrovar::var::ImpulseResponse;
use macrovar::var::IrfConfig;
use macrovar::var::OrderSelectionConfig;
use macrovar::var::VarModel;
use macrovar::var::select_order;
use nalgebra::DMatrix;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand_distr::Distribution;
use rand_distr::Normal;

fn simulated(n: usize, k: usize) -> MultivariateSeries {
  let mut rng = StdRng::seed_from_u64(7);
  let dist = Normal::new(0.0, 1.0).unwrap();
  let mut values = DMatrix::zeros(n, k);
  for t in 1..n {
    for i in 0..k {
      let spill = if i > 0 { 0.1 * values[(t - 1, i - 1)] } else { 0.0 };
      values[(t, i)] = 0.5 * values[(t - 1, i)] + spill + dist.sample(&mut rng);
    }
  }
  let start = NaiveDate::from_ymd_opt(1960, 1, 1).unwrap();
  let dates = (0..n).map(|i| start + Months::new(3 * i as u32)).collect();
  let names = (0..k).map(|i| format!("x{i}")).collect();
  MultivariateSeries::new(dates, names, values).unwrap()
}

fn bench_var(c: &mut Criterion) {
  let mut group = c.benchmark_group("Var");
  group.measurement_time(Duration::from_secs(3));
  group.warm_up_time(Duration::from_millis(500));

  for &k in &[3usize, 6usize] {
    let series = simulated(240, k);

    group.bench_with_input(BenchmarkId::new("fit/lag4", k), &series, |b, s| {
      b.iter(|| black_box(VarModel::fit(s, 4).unwrap()));
    });

    for parallel in [false, true] {
      let label = if parallel { "select/parallel" } else { "select/sequential" };
      group.bench_with_input(BenchmarkId::new(label, k), &series, |b, s| {
        let cfg = OrderSelectionConfig {
          max_lag: 8,
          parallel,
          ..OrderSelectionConfig::default()
        };
        b.iter(|| black_box(select_order(s, cfg).unwrap()));
      });
    }

    group.bench_with_input(BenchmarkId::new("irf/orthogonalized", k), &series, |b, s| {
      let model = VarModel::fit(s, 4).unwrap();
      let cfg = IrfConfig {
        orthogonalized: true,
        ..IrfConfig::default()
      };
      b.iter(|| black_box(ImpulseResponse::compute(&model, cfg).unwrap()));
    });
  }

  group.finish();
}

criterion_group!(benches, bench_var);
criterion_main!(benches);
