use anyhow::Context;
use beholdercore::artifact::{write_frame_artifact, write_section_info};
use beholdercore::prelude::{Section, SectionInfo};
use beholdercore::{Config, ConfigValue, PluginDirectory, ShutdownSignal};
use log::{info, warn};
use ndarray::{s, Array2};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::f32::consts::PI;
use std::time::Duration;
use tokio::time::{self, MissedTickBehavior};

/// Shape and cadence of the synthetic training data.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProducerConfig {
    pub sections: usize,
    pub section_height: usize,
    pub width: usize,
    pub interval_ms: u64,
    pub noise: f32,
    pub seed: u64,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            sections: 3,
            section_height: 32,
            width: 128,
            interval_ms: 100,
            noise: 0.05,
            seed: 0,
        }
    }
}

impl ProducerConfig {
    fn normalized_sections(&self) -> usize {
        self.sections.max(1)
    }

    fn normalized_height(&self) -> usize {
        self.section_height.max(1)
    }

    fn normalized_width(&self) -> usize {
        self.width.max(1)
    }
}

/// How raw values are mapped onto `0..=255`, as chosen by the viewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scaling {
    Layer,
    Network,
}

impl Scaling {
    fn from_config(config: &Config) -> Self {
        match config.get("scaling") {
            Some(ConfigValue::Str(value)) if value == "network" => Scaling::Network,
            _ => Scaling::Layer,
        }
    }
}

/// Stand-in for a training process: writes an animated frame and per-section
/// statistics into the plugin directory.
pub struct SyntheticProducer {
    dir: PluginDirectory,
    config: ProducerConfig,
    rng: StdRng,
    step: u64,
}

impl SyntheticProducer {
    pub fn new(dir: PluginDirectory, config: ProducerConfig) -> Self {
        let rng = StdRng::seed_from_u64(config.seed);
        Self {
            dir,
            config,
            rng,
            step: 0,
        }
    }

    pub async fn run(mut self, mut shutdown: ShutdownSignal) {
        let mut ticker = time::interval(Duration::from_millis(self.config.interval_ms.max(1)));
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        info!(
            "synthetic producer writing to {}",
            self.dir.root().display()
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {}
                _ = shutdown.triggered() => break,
            }
            if let Err(err) = self.write_step() {
                warn!("synthetic producer step failed: {:#}", err);
            }
        }
        info!("synthetic producer stopped after {} steps", self.step);
    }

    /// Writes one frame and its section info, honouring the viewer's scaling.
    pub fn write_step(&mut self) -> anyhow::Result<()> {
        let viewer_config = self.dir.read_config().unwrap_or_default();
        let scaling = Scaling::from_config(&viewer_config);

        let sections = self.config.normalized_sections();
        let height = self.config.normalized_height();
        let raw = self.sample_values();
        let frame = scale(&raw, sections, height, scaling);

        let info: SectionInfo = (0..sections)
            .map(|index| {
                let band = raw.slice(s![index * height..(index + 1) * height, ..]);
                section_stats(index, band.iter().copied(), [height, band.ncols()])
            })
            .collect();

        write_frame_artifact(&self.dir.summary_path(), frame.view())
            .context("writing synthetic frame")?;
        write_section_info(&self.dir.section_info_path(), &info)
            .context("writing synthetic section info")?;
        self.step += 1;
        Ok(())
    }

    fn sample_values(&mut self) -> Array2<f32> {
        let sections = self.config.normalized_sections();
        let height = self.config.normalized_height();
        let width = self.config.normalized_width();
        let phase = self.step as f32 * 0.15;
        let noise = self.config.noise.abs();

        let mut values = Array2::<f32>::zeros((sections * height, width));
        for ((row, col), value) in values.indexed_iter_mut() {
            let section = row / height;
            let amplitude = (section + 1) as f32;
            let x = col as f32 / width as f32;
            let y = (row % height) as f32 / height as f32;
            let jitter = if noise > 0.0 {
                self.rng.gen_range(-noise..noise)
            } else {
                0.0
            };
            let wave = (x * 2.0 * PI * (section + 1) as f32 + phase).sin();
            *value = amplitude * wave * (y * PI).cos() + jitter;
        }
        values
    }
}

/// Maps raw values to `0..=255` per section or across the whole frame.
fn scale(raw: &Array2<f32>, sections: usize, height: usize, scaling: Scaling) -> Array2<f32> {
    let mut scaled = raw.clone();
    match scaling {
        Scaling::Network => {
            let (min, max) = bounds(raw.iter().copied());
            scaled.mapv_inplace(|v| normalize(v, min, max));
        }
        Scaling::Layer => {
            for index in 0..sections {
                let mut band = scaled.slice_mut(s![index * height..(index + 1) * height, ..]);
                let (min, max) = bounds(band.iter().copied());
                band.mapv_inplace(|v| normalize(v, min, max));
            }
        }
    }
    scaled
}

fn bounds(values: impl Iterator<Item = f32>) -> (f32, f32) {
    values.fold((f32::INFINITY, f32::NEG_INFINITY), |(min, max), v| {
        (min.min(v), max.max(v))
    })
}

fn normalize(value: f32, min: f32, max: f32) -> f32 {
    let range = max - min;
    if range <= f32::EPSILON {
        0.0
    } else {
        (value - min) / range * 255.0
    }
}

fn section_stats(index: usize, values: impl Iterator<Item = f32>, shape: [usize; 2]) -> Section {
    let (count, sum, min, max) = values.fold(
        (0usize, 0.0f64, f32::INFINITY, f32::NEG_INFINITY),
        |(count, sum, min, max), v| (count + 1, sum + f64::from(v), min.min(v), max.max(v)),
    );
    let mean = if count > 0 { sum / count as f64 } else { 0.0 };

    let mut section = Section::new();
    section.insert("name".into(), Value::String(format!("layer_{}/weights", index)));
    section.insert("shape".into(), json!(shape));
    section.insert("mean".into(), json!(mean));
    section.insert("min".into(), json!(min));
    section.insert("max".into(), json!(max));
    section
}
