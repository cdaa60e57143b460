use plotters::prelude::*;
use std::collections::BTreeMap;
use std::path::PathBuf;

const CHART_SIZE: (u32, u32) = (640, 480);

#[derive(thiserror::Error, Debug)]
pub enum ChartError {
    #[error("chart rendering failed: {details}")]
    Render { details: String },
}

#[derive(Clone, Debug, PartialEq)]
struct Dataset {
    labels: Vec<String>,
    values: Vec<f64>,
}

/// Bar chart of the latest percentage vector, redrawn in place at a fixed
/// output path.
///
/// The handle owns its dataset for the component's lifetime: the first
/// update creates it, later updates with the same label set only overwrite
/// the values. No second chart is ever created for the same handle.
pub struct EmotionChart {
    output: PathBuf,
    dataset: Option<Dataset>,
    generation: u64,
}

impl EmotionChart {
    pub fn new(output: PathBuf) -> Self {
        Self {
            output,
            dataset: None,
            generation: 0,
        }
    }

    pub fn update(&mut self, percentages: &BTreeMap<String, f64>) -> Result<(), ChartError> {
        self.apply(percentages);
        self.render()
    }

    /// How many times a dataset has been created; stays at 1 for as long as
    /// the label set is stable.
    pub fn dataset_generation(&self) -> u64 {
        self.generation
    }

    fn apply(&mut self, percentages: &BTreeMap<String, f64>) {
        match &mut self.dataset {
            Some(dataset)
                if dataset
                    .labels
                    .iter()
                    .map(String::as_str)
                    .eq(percentages.keys().map(String::as_str)) =>
            {
                for (slot, value) in dataset.values.iter_mut().zip(percentages.values()) {
                    *slot = *value;
                }
            }
            _ => {
                self.dataset = Some(Dataset {
                    labels: percentages.keys().cloned().collect(),
                    values: percentages.values().copied().collect(),
                });
                self.generation += 1;
            }
        }
    }

    fn render(&self) -> Result<(), ChartError> {
        let Some(dataset) = &self.dataset else {
            return Ok(());
        };

        let root = BitMapBackend::new(&self.output, CHART_SIZE).into_drawing_area();
        root.fill(&WHITE).map_err(render_error)?;

        // Values are plotted as-is, no normalisation.
        let top = dataset
            .values
            .iter()
            .copied()
            .fold(0.0f64, f64::max)
            .max(1.0);
        let bars = dataset.labels.len() as i32;

        let mut chart = ChartBuilder::on(&root)
            .caption("Emotion percentages", ("sans-serif", 22))
            .margin(10)
            .x_label_area_size(36)
            .y_label_area_size(44)
            .build_cartesian_2d(0..bars, 0.0..top)
            .map_err(render_error)?;

        let labels = &dataset.labels;
        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len())
            .x_label_formatter(&|x: &i32| labels.get(*x as usize).cloned().unwrap_or_default())
            .draw()
            .map_err(render_error)?;

        chart
            .draw_series(dataset.values.iter().enumerate().map(|(i, value)| {
                Rectangle::new(
                    [(i as i32, 0.0), (i as i32 + 1, *value)],
                    BLUE.mix(0.4).filled(),
                )
            }))
            .map_err(render_error)?;

        root.present().map_err(render_error)?;
        Ok(())
    }
}

fn render_error<E: std::fmt::Display>(e: E) -> ChartError {
    ChartError::Render {
        details: e.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn percentages(pairs: &[(&str, f64)]) -> BTreeMap<String, f64> {
        pairs
            .iter()
            .map(|(label, value)| ((*label).to_owned(), *value))
            .collect()
    }

    #[test]
    fn repeated_updates_mutate_the_same_dataset() {
        let mut chart = EmotionChart::new(PathBuf::from("unused.png"));
        let pcts = percentages(&[("happy", 80.0), ("sad", 20.0)]);

        chart.apply(&pcts);
        chart.apply(&pcts);

        assert_eq!(chart.dataset_generation(), 1);
        let dataset = chart.dataset.as_ref().expect("dataset created");
        assert_eq!(dataset.values, vec![80.0, 20.0]);
    }

    #[test]
    fn new_values_overwrite_in_place() {
        let mut chart = EmotionChart::new(PathBuf::from("unused.png"));
        chart.apply(&percentages(&[("happy", 80.0), ("sad", 20.0)]));
        chart.apply(&percentages(&[("happy", 5.0), ("sad", 95.0)]));

        assert_eq!(chart.dataset_generation(), 1);
        let dataset = chart.dataset.as_ref().expect("dataset created");
        assert_eq!(dataset.labels, vec!["happy".to_owned(), "sad".to_owned()]);
        assert_eq!(dataset.values, vec![5.0, 95.0]);
    }

    #[test]
    fn changed_label_set_rebuilds_the_dataset() {
        let mut chart = EmotionChart::new(PathBuf::from("unused.png"));
        chart.apply(&percentages(&[("happy", 80.0)]));
        chart.apply(&percentages(&[("angry", 60.0), ("happy", 40.0)]));

        assert_eq!(chart.dataset_generation(), 2);
        let dataset = chart.dataset.as_ref().expect("dataset created");
        assert_eq!(dataset.labels, vec!["angry".to_owned(), "happy".to_owned()]);
    }
}
