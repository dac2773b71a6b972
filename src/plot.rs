use std::{
    fmt::Display,
    path::{Path, PathBuf},
};

use plotters::prelude::*;
use tracing::{debug, info};

use crate::{error::Error, ledger::Entry, ledger::ProductLedger};

/// Everything the charting backend needs to draw one scatter plot.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatterRequest {
    pub title: String,
    pub x: Vec<u32>,
    /// Drawn on a log-scaled axis, so every value must be positive.
    pub y: Vec<f64>,
    /// Destination without extension, the renderer picks the image format.
    pub output: PathBuf,
}

/// Draws scatter plots. Each call must produce a complete, independent
/// figure; nothing carries over from one request to the next.
pub trait ScatterRenderer {
    fn render(&mut self, request: &ScatterRequest) -> Result<(), Error>;
}

/// The two plots of one product: prices, then amounts, both against the
/// 1-based occurrence rank.
pub fn scatter_requests(
    product: &str,
    entries: &[Entry],
    output_dir: &Path,
) -> [ScatterRequest; 2] {
    let index: Vec<u32> = (1..=entries.len() as u32).collect();
    let prices = entries.iter().map(|e| e.price).collect();
    let amounts = entries.iter().map(|e| e.amount as f64).collect();

    [
        ScatterRequest {
            title: format!("Prices change for {} over time", product),
            x: index.clone(),
            y: prices,
            output: output_dir.join(format!("{}_prices_change", product)),
        },
        ScatterRequest {
            title: format!("Amount change for {} over time", product),
            x: index,
            y: amounts,
            output: output_dir.join(format!("{}_amount_change", product)),
        },
    ]
}

/// Render both plots of every product in ledger order.
/// Returns the number of rendered plots; the first failure stops the run.
pub fn emit_plots<R>(
    ledger: &ProductLedger,
    output_dir: &Path,
    renderer: &mut R,
) -> Result<usize, Error>
where
    R: ScatterRenderer + ?Sized,
{
    let mut rendered = 0;
    for (product, entries) in ledger.iter() {
        for request in scatter_requests(product, entries, output_dir) {
            renderer.render(&request)?;
            debug!(output = %request.output.display(), "rendered plot");
            rendered += 1;
        }
    }
    info!(plots = rendered, output_dir = %output_dir.display(), "plots written");
    Ok(rendered)
}

/// Renders scatter plots to PNG files with plotters' bitmap backend.
#[derive(Debug, Clone, Copy)]
pub struct BitmapRenderer {
    width: u32,
    height: u32,
}

impl Default for BitmapRenderer {
    fn default() -> Self {
        BitmapRenderer {
            width: 640,
            height: 480,
        }
    }
}

impl BitmapRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        BitmapRenderer { width, height }
    }

    /// `output` with `.png` appended. Not `with_extension`, product names may contain dots.
    pub fn image_path(output: &Path) -> PathBuf {
        let mut path = output.as_os_str().to_owned();
        path.push(".png");
        PathBuf::from(path)
    }

    fn check(request: &ScatterRequest) -> Result<(), Error> {
        let dir = match request.output.parent() {
            Some(dir) if !dir.as_os_str().is_empty() => dir,
            _ => Path::new("."),
        };
        if !dir.is_dir() {
            return Err(Error::OutputDirectory(dir.display().to_string()));
        }
        if let Some(bad) = request.y.iter().find(|y| !(y.is_finite() && **y > 0.0)) {
            return Err(Error::Rendering {
                title: request.title.clone(),
                reason: format!("value {} cannot be shown on a log-scaled axis", bad),
            });
        }
        Ok(())
    }
}

/// Range of the log10 axis holding every `exponents` value, padded by half
/// a decade on both sides. `None` when a bound is not finite.
pub fn log_axis_bounds(exponents: &[f64]) -> Option<(f64, f64)> {
    if exponents.is_empty() {
        return Some((-0.5, 0.5));
    }
    let low = exponents.iter().copied().fold(f64::INFINITY, f64::min) - 0.5;
    let high = exponents.iter().copied().fold(f64::NEG_INFINITY, f64::max) + 0.5;
    (low.is_finite() && high.is_finite() && low < high).then(|| (low, high))
}

fn log_tick_label(exponent: &f64) -> String {
    format!("{:.1e}", 10f64.powf(*exponent))
}

fn rendering_failure<E: Display>(title: &str) -> impl FnOnce(E) -> Error + '_ {
    move |e| Error::Rendering {
        title: title.to_string(),
        reason: e.to_string(),
    }
}

impl ScatterRenderer for BitmapRenderer {
    fn render(&mut self, request: &ScatterRequest) -> Result<(), Error> {
        Self::check(request)?;
        let path = Self::image_path(&request.output);
        let title = request.title.as_str();

        // Backend lives only for this request so the figure is flushed
        // before the next one starts.
        let root = BitMapBackend::new(&path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE).map_err(rendering_failure(title))?;

        // Values are drawn as log10 on a linear axis. Every positive finite
        // f64 maps into roughly -324..309, so the axis bounds stay finite.
        let exponents: Vec<f64> = request.y.iter().map(|y| y.log10()).collect();
        let (y_low, y_high) = log_axis_bounds(&exponents).ok_or_else(|| Error::Rendering {
            title: title.to_string(),
            reason: "values span no usable log-scaled range".to_string(),
        })?;
        let x_max = request.x.iter().copied().max().unwrap_or(0) as f64 + 1.0;

        let mut chart = ChartBuilder::on(&root)
            .caption(title, ("sans-serif", 20.0).into_font())
            .margin(10)
            .x_label_area_size(30)
            .y_label_area_size(60)
            .build_cartesian_2d(0f64..x_max, y_low..y_high)
            .map_err(rendering_failure(title))?;
        chart
            .configure_mesh()
            .y_label_formatter(&log_tick_label)
            .draw()
            .map_err(rendering_failure(title))?;
        chart
            .draw_series(
                request
                    .x
                    .iter()
                    .zip(&exponents)
                    .map(|(&x, &y)| Circle::new((x as f64, y), 2, BLUE.filled())),
            )
            .map_err(rendering_failure(title))?;

        root.present().map_err(rendering_failure(title))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};

    use crate::error::Error;
    use crate::ledger::Entry;
    use crate::plot::{
        log_axis_bounds, scatter_requests, BitmapRenderer, ScatterRenderer, ScatterRequest,
    };

    fn request(y: Vec<f64>, output: PathBuf) -> ScatterRequest {
        ScatterRequest {
            title: "t".to_string(),
            x: (1..=y.len() as u32).collect(),
            y,
            output,
        }
    }

    #[test]
    fn requests_for_product() {
        let entries = [
            Entry {
                amount: 10,
                price: 1.5,
            },
            Entry {
                amount: 20,
                price: 1.6,
            },
        ];
        let [prices, amounts] = scatter_requests("A", &entries, Path::new("plots"));

        assert_eq!(prices.title, "Prices change for A over time");
        assert_eq!(prices.x, vec![1, 2]);
        assert_eq!(prices.y, vec![1.5, 1.6]);
        assert_eq!(prices.output, PathBuf::from("plots/A_prices_change"));

        assert_eq!(amounts.title, "Amount change for A over time");
        assert_eq!(amounts.x, vec![1, 2]);
        assert_eq!(amounts.y, vec![10.0, 20.0]);
        assert_eq!(amounts.output, PathBuf::from("plots/A_amount_change"));
    }

    #[test]
    fn image_path_keeps_dots() {
        assert_eq!(
            BitmapRenderer::image_path(Path::new("plots/v1.2_prices_change")),
            PathBuf::from("plots/v1.2_prices_change.png")
        );
    }

    #[test]
    fn missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("plots");
        assert_eq!(
            BitmapRenderer::default().render(&request(vec![1.0], missing.join("A_prices_change"))),
            Err(Error::OutputDirectory(missing.display().to_string()))
        );
        assert!(!missing.exists());
    }

    macro_rules! test_rejects_on_log_axis {
        ($($name:ident: $value:expr,)*) => {
        $(
            paste::paste! {
            #[test]
            fn [<rejects_ $name>]() {
                let dir = tempfile::tempdir().unwrap();
                let output = dir.path().join("A_amount_change");
                assert!(matches!(
                    BitmapRenderer::default().render(&request(vec![1.0, $value], output.clone())),
                    Err(Error::Rendering { .. })
                ));
                assert!(!BitmapRenderer::image_path(&output).exists());
            }
        }
        )*
        }
    }

    test_rejects_on_log_axis! {
        zero: 0.0,
        negative: -1.0,
        nan: f64::NAN,
        infinity: f64::INFINITY,
    }

    #[test]
    fn log_axis_bounds_pad_half_a_decade() {
        assert_eq!(log_axis_bounds(&[0.0, 2.0]), Some((-0.5, 2.5)));
        assert_eq!(log_axis_bounds(&[1.0]), Some((0.5, 1.5)));
        assert_eq!(log_axis_bounds(&[]), Some((-0.5, 0.5)));
        assert_eq!(log_axis_bounds(&[f64::NEG_INFINITY]), None);
    }

    #[test]
    fn log_axis_bounds_cover_f64_extremes() {
        let exponents = [(f64::MIN_POSITIVE * f64::EPSILON).log10(), f64::MAX.log10()];
        let (low, high) = log_axis_bounds(&exponents).unwrap();
        assert!(low.is_finite() && high.is_finite());
        assert!(low < -323.0 && high > 308.0);
    }

    macro_rules! test_renders_on_log_axis {
        ($($name:ident: $values:expr,)*) => {
        $(
            paste::paste! {
            #[test]
            fn [<renders_ $name>]() {
                let dir = tempfile::tempdir().unwrap();
                let output = dir.path().join("A_prices_change");
                assert_eq!(
                    BitmapRenderer::default().render(&request($values, output.clone())),
                    Ok(())
                );
                let image = BitmapRenderer::image_path(&output);
                assert!(std::fs::metadata(&image).unwrap().len() > 0);
            }
        }
        )*
        }
    }

    test_renders_on_log_axis! {
        single_value: vec![1.5],
        largest_finite: vec![1e308, f64::MAX],
        smallest_subnormal: vec![f64::MIN_POSITIVE * f64::EPSILON],
        full_f64_span: vec![f64::MIN_POSITIVE * f64::EPSILON, 1.0, f64::MAX],
    }
}
