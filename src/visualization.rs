//! # Visualization
//!
//! $$
//! \{\hat\Psi_h[i,j] \pm z\,\widehat{\mathrm{se}}_h[i,j]\}_{h=0}^{H}
//! \mapsto K\times K \text{ grid of response charts}
//! $$
//!
use std::path::Path;

use plotly::Layout;
use plotly::Plot;
use plotly::Scatter;
use plotly::common::Anchor;
use plotly::common::DashType;
use plotly::common::Font;
use plotly::common::Line;
use plotly::common::Mode;
use plotly::layout::Annotation;
use plotly::layout::GridPattern;
use plotly::layout::LayoutGrid;
use plotly::layout::Margin;
use tracing::info;

use crate::var::ImpulseResponse;

struct GridEntry {
  title: String,
  irf: Vec<f64>,
  lower: Vec<f64>,
  upper: Vec<f64>,
}

/// Grid of impulse-response panels; row = response variable, column = shock.
pub struct IrfGridPlotter {
  entries: Vec<GridEntry>,
  cols: usize,
  horizon: usize,
  line_width: f64,
  show_legend: bool,
  title: String,
  x_gap: f64,
  y_gap: f64,
}

impl IrfGridPlotter {
  pub fn new(irf: &ImpulseResponse, cumulative: bool) -> Self {
    let (value, lower, upper) = if cumulative {
      (irf.cumulative.clone(), irf.cumulative_lower(), irf.cumulative_upper())
    } else {
      (irf.responses.clone(), irf.lower(), irf.upper())
    };
    let k = irf.names.len();

    let mut entries = Vec::with_capacity(k * k);
    for (resp_idx, response) in irf.names.iter().enumerate() {
      for (shock_idx, shock) in irf.names.iter().enumerate() {
        let pick = |a: &ndarray::Array3<f64>| {
          (0..=irf.horizon)
            .map(|h| a[[h, resp_idx, shock_idx]])
            .collect::<Vec<f64>>()
        };
        entries.push(GridEntry {
          title: format!("{shock} → {response}"),
          irf: pick(&value),
          lower: pick(&lower),
          upper: pick(&upper),
        });
      }
    }

    let kind = if cumulative { "Cumulative IRFs" } else { "Impulse Response Functions" };
    Self {
      entries,
      cols: k.max(1),
      horizon: irf.horizon,
      line_width: 1.5,
      show_legend: false,
      title: format!("{kind} (Lag Length = {})", irf.lag_order),
      x_gap: 0.06,
      y_gap: 0.12,
    }
  }

  pub fn title(mut self, title: &str) -> Self {
    self.title = title.into();
    self
  }

  pub fn line_width(mut self, w: f64) -> Self {
    self.line_width = w;
    self
  }

  pub fn show_legend(mut self, show: bool) -> Self {
    self.show_legend = show;
    self
  }

  pub fn plot(self) -> Plot {
    let n = self.entries.len();
    let cols = self.cols;
    let rows = n.div_ceil(cols);
    let plot_height = (rows * 300 + 220).max(600);
    let x_gap = if cols > 1 {
      let scaled = self.x_gap / cols as f64;
      let max_gap = ((1.0 - 0.08 * cols as f64) / (cols - 1) as f64).max(0.0);
      scaled.min(max_gap)
    } else {
      0.0
    };
    let y_gap = if rows > 1 {
      let scaled = self.y_gap / rows as f64;
      let max_gap = ((1.0 - 0.02 * rows as f64) / (rows - 1) as f64).max(0.0);
      scaled.min(max_gap)
    } else {
      0.0
    };

    let axis_name = |subplot_idx: usize, axis: &str| -> String {
      if subplot_idx == 1 {
        axis.to_string()
      } else {
        format!("{axis}{subplot_idx}")
      }
    };

    let annotations = self
      .entries
      .iter()
      .enumerate()
      .map(|(idx, entry)| {
        let xa = axis_name(idx + 1, "x");
        let ya = axis_name(idx + 1, "y");
        Annotation::new()
          .text(format!("<b>{}</b>", entry.title))
          .x_ref(format!("{xa} domain"))
          .y_ref(format!("{ya} domain"))
          .x(0.5)
          .y(0.985)
          .x_anchor(Anchor::Center)
          .y_anchor(Anchor::Top)
          .font(Font::new().size(12))
          .background_color("rgba(255,255,255,0.92)")
          .border_pad(1.0)
          .show_arrow(false)
      })
      .collect::<Vec<_>>();

    let mut plot = Plot::new();
    plot.set_layout(
      Layout::new()
        .title(self.title.as_str())
        .auto_size(true)
        .height(plot_height)
        .margin(Margin::new().left(56).right(24).top(84).bottom(44))
        .annotations(annotations)
        .grid(
          LayoutGrid::new()
            .rows(rows)
            .columns(cols)
            .x_gap(x_gap)
            .y_gap(y_gap)
            .pattern(GridPattern::Independent),
        ),
    );

    let periods: Vec<usize> = (0..=self.horizon).collect();
    for (idx, entry) in self.entries.into_iter().enumerate() {
      let xa = axis_name(idx + 1, "x");
      let ya = axis_name(idx + 1, "y");
      let traces = [
        ("IRF", entry.irf, DashType::Solid, "#1f77b4"),
        ("Lower Conf", entry.lower, DashType::Dash, "#7f7f7f"),
        ("Upper Conf", entry.upper, DashType::Dash, "#7f7f7f"),
      ];
      for (label, values, dash, color) in traces {
        let trace = Scatter::new(periods.clone(), values)
          .mode(Mode::Lines)
          .line(Line::new().width(self.line_width).dash(dash).color(color))
          .name(format!("{} | {label}", entry.title).as_str())
          .show_legend(self.show_legend)
          .x_axis(xa.as_str())
          .y_axis(ya.as_str());
        plot.add_trace(trace);
      }
    }

    plot
  }

  pub fn write_html<P: AsRef<Path>>(self, path: P) {
    let path = path.as_ref();
    self.plot().write_html(path);
    info!(path = %path.display(), "wrote IRF chart");
  }
}
