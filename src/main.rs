//! `macrovar` command-line interface: one subcommand per analysis step.
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use anyhow::Context;
use anyhow::Result;
use clap::Parser;
use clap::Subcommand;
use macrovar::data::MultivariateSeries;
use macrovar::data::merge_on_date;
use macrovar::data::read_series;
use macrovar::data::read_value_file;
use macrovar::data::write_series;
use macrovar::report;
use macrovar::stats::correlogram::CorrelogramConfig;
use macrovar::stats::correlogram::PacfMethod;
use macrovar::stats::correlogram::residual_correlograms;
use macrovar::stats::stationarity::ADFConfig;
use macrovar::stats::stationarity::DeterministicTerm;
use macrovar::stats::stationarity::KPSSBandwidth;
use macrovar::stats::stationarity::KPSSConfig;
use macrovar::stats::stationarity::KPSSTrend;
use macrovar::stats::stationarity::check_stationarity;
use macrovar::transform::difference;
use macrovar::transform::standardize;
use macrovar::var::CovarianceNormalization;
use macrovar::var::Criterion;
use macrovar::var::ImpulseResponse;
use macrovar::var::IrfConfig;
use macrovar::var::ModelCache;
use macrovar::var::OrderSelectionConfig;
use macrovar::var::SampleAlignment;
use macrovar::var::select_order;
use macrovar::visualization::IrfGridPlotter;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[derive(Parser)]
#[command(name = "macrovar")]
#[command(about = "VAR order selection and impulse-response analysis for macro series", long_about = None)]
struct Cli {
  /// Log filter used when RUST_LOG is not set
  #[arg(long, global = true, default_value = "info")]
  log_level: String,

  #[command(subcommand)]
  command: Commands,
}

#[derive(clap::Args)]
struct SelectionArgs {
  /// Input CSV with a Date column
  #[arg(short, long)]
  input: PathBuf,

  /// Largest lag order tried
  #[arg(long, default_value = "15")]
  max_lag: usize,

  /// Use the bias-corrected residual covariance in the criteria
  #[arg(long)]
  bias_corrected: bool,

  /// Fit each lag on its longest sample instead of a common window
  #[arg(long)]
  full_sample: bool,

  /// Fit lag orders one after another
  #[arg(long)]
  sequential: bool,
}

impl SelectionArgs {
  fn config(&self) -> OrderSelectionConfig {
    OrderSelectionConfig {
      max_lag: self.max_lag,
      normalization: if self.bias_corrected {
        CovarianceNormalization::BiasCorrected
      } else {
        CovarianceNormalization::MaximumLikelihood
      },
      alignment: if self.full_sample {
        SampleAlignment::Full
      } else {
        SampleAlignment::Common
      },
      parallel: !self.sequential,
    }
  }
}

#[derive(Subcommand)]
enum Commands {
  /// Inner-join single-series files on their dates
  Merge {
    /// Files with Date and Value (or named) columns
    #[arg(short, long, num_args = 1.., required = true)]
    inputs: Vec<PathBuf>,

    #[arg(short, long)]
    output: PathBuf,
  },

  /// Difference selected variables (seasonal with --periods 4)
  Difference {
    #[arg(short, long)]
    input: PathBuf,

    #[arg(short, long)]
    output: PathBuf,

    #[arg(short, long, default_value = "1")]
    periods: usize,

    /// Variables to difference; all when omitted
    #[arg(short, long, value_delimiter = ',')]
    variables: Option<Vec<String>>,
  },

  /// Z-score every variable
  Standardize {
    #[arg(short, long)]
    input: PathBuf,

    #[arg(short, long)]
    output: PathBuf,
  },

  /// ADF and KPSS tests per variable
  Stationarity {
    #[arg(short, long)]
    input: PathBuf,

    /// Significance level of both tests
    #[arg(long, default_value = "0.05")]
    alpha: f64,

    /// Include a linear trend in both test regressions
    #[arg(long)]
    trend: bool,

    /// Fixed KPSS Newey-West lag instead of the automatic bandwidth
    #[arg(long)]
    kpss_lags: Option<usize>,
  },

  /// AIC / BIC / HQIC / FPE for lags 1..=max-lag
  SelectOrder {
    #[command(flatten)]
    selection: SelectionArgs,

    #[arg(short, long)]
    output: PathBuf,
  },

  /// Sequential likelihood-ratio tests of lag p-1 against p
  LrTest {
    #[command(flatten)]
    selection: SelectionArgs,

    #[arg(short, long)]
    output: PathBuf,

    /// Significance level for the suggested lag
    #[arg(long, default_value = "0.05")]
    alpha: f64,
  },

  /// Residual ACF / PACF for candidate lag orders
  Residuals {
    #[arg(short, long)]
    input: PathBuf,

    #[arg(short, long, num_args = 1.., required = true)]
    lags: Vec<usize>,

    #[arg(long, default_value = "20")]
    nlags: usize,

    /// Use MLE autocovariances in the Yule-Walker PACF
    #[arg(long)]
    pacf_mle: bool,

    #[arg(short, long)]
    output: PathBuf,
  },

  /// Impulse responses with confidence bands per lag order
  Irf {
    #[arg(short, long)]
    input: PathBuf,

    #[arg(short, long, num_args = 1.., required = true)]
    lags: Vec<usize>,

    #[arg(long, default_value = "20")]
    horizon: usize,

    /// Cholesky-orthogonalized shocks
    #[arg(long)]
    orthogonalized: bool,

    /// Band significance level; without it bands are ±1.96 standard errors
    #[arg(long)]
    alpha: Option<f64>,

    #[arg(short, long)]
    output_dir: PathBuf,

    /// Also write interactive HTML charts
    #[arg(long)]
    charts: bool,
  },
}

fn main() -> Result<()> {
  let cli = Cli::parse();

  let filter = EnvFilter::try_from_default_env().or_else(|_| EnvFilter::try_new(&cli.log_level))?;
  tracing_subscriber::registry()
    .with(tracing_subscriber::fmt::layer())
    .with(filter)
    .init();

  match cli.command {
    Commands::Merge { inputs, output } => merge(&inputs, &output)?,
    Commands::Difference {
      input,
      output,
      periods,
      variables,
    } => {
      let series = load(&input)?;
      let diffed = difference(&series, periods, variables.as_deref())?;
      save(&output, &diffed)?;
    }
    Commands::Standardize { input, output } => {
      let series = load(&input)?;
      save(&output, &standardize(&series)?)?;
    }
    Commands::Stationarity {
      input,
      alpha,
      trend,
      kpss_lags,
    } => {
      let series = load(&input)?;
      let adf = ADFConfig {
        alpha,
        deterministic: if trend {
          DeterministicTerm::ConstantTrend
        } else {
          DeterministicTerm::Constant
        },
        ..ADFConfig::default()
      };
      let kpss = KPSSConfig {
        alpha,
        trend: if trend { KPSSTrend::Trend } else { KPSSTrend::Level },
        bandwidth: kpss_lags.map_or(KPSSBandwidth::Auto, KPSSBandwidth::Fixed),
      };
      let reports = check_stationarity(&series, adf, kpss)?;
      report::stationarity_table(&reports).printstd();
    }
    Commands::SelectOrder { selection, output } => {
      let series = load(&selection.input)?;
      let result = select_order(&series, selection.config())?;
      report::order_selection_table(&result).printstd();
      for criterion in [Criterion::Aic, Criterion::Bic, Criterion::Hqic, Criterion::Fpe] {
        if let Some(lag) = result.selected(criterion) {
          println!("{criterion} selects lag {lag}");
        }
      }
      report::write_order_selection(&output, &result)
        .with_context(|| format!("writing {}", output.display()))?;
    }
    Commands::LrTest {
      selection,
      output,
      alpha,
    } => {
      let series = load(&selection.input)?;
      let result = select_order(&series, selection.config())?;
      report::lr_test_table(&result.lr_tests).printstd();
      println!(
        "sequential LR testing at {alpha} selects lag {}",
        result.lr_selected_lag(alpha)
      );
      report::write_lr_tests(&output, &result.lr_tests)
        .with_context(|| format!("writing {}", output.display()))?;
    }
    Commands::Residuals {
      input,
      lags,
      nlags,
      pacf_mle,
      output,
    } => {
      let series = load(&input)?;
      let cfg = CorrelogramConfig {
        nlags,
        pacf_method: if pacf_mle {
          PacfMethod::YuleWalkerMle
        } else {
          PacfMethod::YuleWalkerAdjusted
        },
        ..CorrelogramConfig::default()
      };
      let mut cache = ModelCache::new(&series, true);
      cache.ensure(&lags.iter().map(|&p| (p, p)).collect::<Vec<_>>())?;
      let mut results = Vec::new();
      for &p in &lags {
        info!(lag = p, "analyzing residuals");
        results.extend(residual_correlograms(cache.model(p, p)?, cfg)?);
      }
      report::write_correlograms(&output, &results)
        .with_context(|| format!("writing {}", output.display()))?;
    }
    Commands::Irf {
      input,
      lags,
      horizon,
      orthogonalized,
      alpha,
      output_dir,
      charts,
    } => {
      let series = load(&input)?;
      let cfg = irf_config(horizon, orthogonalized, alpha)?;
      fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating {}", output_dir.display()))?;

      let mut cache = ModelCache::new(&series, true);
      cache.ensure(&lags.iter().map(|&p| (p, p)).collect::<Vec<_>>())?;
      for &p in &lags {
        let irf = ImpulseResponse::compute(cache.model(p, p)?, cfg)?;
        let plain = output_dir.join(format!("IRF_Lag_{p}.csv"));
        let cumulative = output_dir.join(format!("Cumulative_IRF_Lag_{p}.csv"));
        report::write_irf(&plain, &irf, false)
          .with_context(|| format!("writing {}", plain.display()))?;
        report::write_irf(&cumulative, &irf, true)
          .with_context(|| format!("writing {}", cumulative.display()))?;
        if charts {
          IrfGridPlotter::new(&irf, false).write_html(output_dir.join(format!("IRF_Lag_{p}.html")));
          IrfGridPlotter::new(&irf, true)
            .write_html(output_dir.join(format!("Cumulative_IRF_Lag_{p}.html")));
        }
        println!("IRF data for lag length {p} saved to: {}", plain.display());
      }
    }
  }

  Ok(())
}

fn irf_config(horizon: usize, orthogonalized: bool, alpha: Option<f64>) -> Result<IrfConfig> {
  let cfg = IrfConfig {
    horizon,
    orthogonalized,
    ..IrfConfig::default()
  };
  match alpha {
    Some(alpha) => Ok(cfg.with_significance(alpha)?),
    None => Ok(cfg),
  }
}

fn load(path: &Path) -> Result<MultivariateSeries> {
  read_series(path).with_context(|| format!("reading {}", path.display()))
}

fn save(path: &Path, series: &MultivariateSeries) -> Result<()> {
  write_series(path, series).with_context(|| format!("writing {}", path.display()))
}

fn merge(inputs: &[PathBuf], output: &Path) -> Result<()> {
  let frames = inputs
    .iter()
    .map(|p| read_value_file(p).with_context(|| format!("reading {}", p.display())))
    .collect::<Result<Vec<_>>>()?;
  let merged = merge_on_date(&frames)?;
  println!(
    "merged {} files into {} rows x {} variables",
    frames.len(),
    merged.nobs(),
    merged.nvars()
  );
  save(output, &merged)
}
