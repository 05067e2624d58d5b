use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

use handsign::classifier::ClassifierKind;
use handsign::config::AppConfig;
use handsign::keymap::KeyMap;
use handsign::{camera, predict, record, trainer};

/// Hand gesture recognition pipeline: collect labeled samples, train
/// classifiers, and run live predictions.
#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Path of the JSON configuration file.
    #[arg(long, default_value = AppConfig::DEFAULT_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Capture labeled samples from the camera into the dataset.
    Collect {
        /// Capture device index.
        #[arg(long)]
        camera: Option<u32>,
        /// Dataset file to append to.
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Record every Space press under this single label instead of
        /// mapping the whole alphanumeric keyboard.
        #[arg(long)]
        label: Option<String>,
    },
    /// Train classifiers on the dataset and persist the model artifacts.
    Train {
        /// Dataset file to train on.
        #[arg(long)]
        dataset: Option<PathBuf>,
        /// Classifier kinds to train; repeat to train several.
        #[arg(long = "classifier", value_enum)]
        classifiers: Vec<ClassifierKind>,
        /// Directory to write model artifacts into.
        #[arg(long)]
        model_dir: Option<PathBuf>,
    },
    /// Run live prediction with the trained models.
    Infer {
        /// Capture device index.
        #[arg(long)]
        camera: Option<u32>,
        /// Classifier kinds to load; repeat to show several side by side.
        #[arg(long = "classifier", value_enum)]
        classifiers: Vec<ClassifierKind>,
    },
    /// List the available capture devices.
    ListCameras,
}

fn main() -> Result<()> {
    handsign::init_logger();

    let cli = Cli::parse();
    let mut config = AppConfig::load(&cli.config)?;

    match cli.command {
        Command::Collect {
            camera,
            dataset,
            label,
        } => {
            if let Some(index) = camera {
                config.camera.index = index;
            }
            if let Some(path) = dataset {
                config.dataset_path = path;
            }
            let keymap = match &label {
                Some(label) => KeyMap::single(label),
                None => KeyMap::alphanumeric(),
            };
            record::run(&config, &keymap)
        }
        Command::Train {
            dataset,
            classifiers,
            model_dir,
        } => {
            if let Some(path) = dataset {
                config.dataset_path = path;
            }
            if let Some(dir) = model_dir {
                config.model_dir = dir;
            }
            if !classifiers.is_empty() {
                config.classifiers = classifiers;
            }
            trainer::train(&config.dataset_path, &config.classifiers, &config.model_dir)?;
            Ok(())
        }
        Command::Infer {
            camera,
            classifiers,
        } => {
            if let Some(index) = camera {
                config.camera.index = index;
            }
            if !classifiers.is_empty() {
                config.classifiers = classifiers;
            }
            predict::run(&config)
        }
        Command::ListCameras => camera::list_cameras(),
    }
}
