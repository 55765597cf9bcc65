use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use log::info;

use medipredict::{
    parse_symptoms_json, FeatureSchema, InferenceService, ModelStore, PredictorConfig,
    RuntimeConfig, SymptomDataset, SymptomPresence, SymptomStatistics,
};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Directory holding model folders (defaults to $MEDIPREDICT_HOME/models)
    #[arg(long, global = true)]
    models_dir: Option<PathBuf>,

    /// Name of the model folder to load
    #[arg(long, global = true)]
    model: Option<String>,

    /// Historical dataset CSV used for related symptoms (defaults to $MEDIPREDICT_DATASET)
    #[arg(long, global = true)]
    dataset: Option<PathBuf>,

    /// Name of the disease label column in the dataset
    #[arg(long, global = true)]
    label_column: Option<String>,

    /// ONNX Runtime graph optimization level (disable, level1, level2, level3)
    #[arg(long, global = true)]
    optimization: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Predict a disease from reported symptoms
    Predict {
        /// A symptom that is present (repeatable)
        #[arg(short, long = "symptom")]
        symptoms: Vec<String>,

        /// A JSON object of symptom name to presence
        #[arg(long)]
        json: Option<String>,

        /// Number of related symptoms to report
        #[arg(long)]
        top_n: Option<usize>,
    },
    /// List known symptoms
    Symptoms,
    /// Show the most frequent symptoms for a disease
    Disease {
        name: String,

        #[arg(long)]
        top_n: Option<usize>,
    },
    /// Check that the model artifacts exist and load
    Health,
}

fn build_config(args: &Args) -> anyhow::Result<PredictorConfig> {
    let mut config = PredictorConfig::from_env();
    if let Some(dir) = &args.models_dir {
        config.models_dir = dir.clone();
    }
    if let Some(name) = &args.model {
        config.model_name = name.clone();
    }
    if let Some(path) = &args.dataset {
        config.dataset_path = Some(path.clone());
    }
    if let Some(column) = &args.label_column {
        config.label_column = column.clone();
    }
    if let Some(level) = &args.optimization {
        config.runtime.optimization_level = RuntimeConfig::parse_level(level)
            .with_context(|| format!("Unknown optimization level '{}'", level))?;
    }
    Ok(config)
}

fn load_dataset(config: &PredictorConfig) -> anyhow::Result<Option<SymptomDataset>> {
    config.dataset_path.as_ref()
        .map(|path| SymptomDataset::from_csv_path(path, &config.label_column))
        .transpose()
        .context("Failed to load dataset")
}

fn collect_symptoms(flags: &[String], json: Option<&str>) -> anyhow::Result<SymptomPresence> {
    let mut symptoms = match json {
        Some(payload) => parse_symptoms_json(payload)?,
        None => SymptomPresence::new(),
    };
    for name in flags {
        symptoms.insert(name.clone(), 1.0);
    }
    if symptoms.is_empty() {
        bail!("No symptoms provided; use --symptom or --json");
    }
    Ok(symptoms)
}

fn run(args: Args) -> anyhow::Result<ExitCode> {
    let config = build_config(&args)?;

    match args.command {
        Command::Predict { symptoms, json, top_n } => {
            let symptoms = collect_symptoms(&symptoms, json.as_deref())?;
            let dataset = load_dataset(&config)?;
            let service = InferenceService::new(config.model_store()?);

            let start_time = Instant::now();
            let diagnosis = service.diagnose(&symptoms, dataset.as_ref(), top_n.unwrap_or(config.top_n))?;
            info!("Diagnosis took {:.2?}", start_time.elapsed());

            println!("{}", serde_json::to_string_pretty(&diagnosis)?);
        }
        Command::Symptoms => {
            let symptoms: Vec<String> = match load_dataset(&config)? {
                Some(dataset) => dataset.symptom_columns().to_vec(),
                None => FeatureSchema::builtin().names().to_vec(),
            };
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "symptoms": symptoms }))?);
        }
        Command::Disease { name, top_n } => {
            let Some(dataset) = load_dataset(&config)? else {
                bail!("A dataset is required; use --dataset or set MEDIPREDICT_DATASET");
            };
            let top = SymptomStatistics::new(&dataset).top_symptoms(&name, top_n.unwrap_or(config.top_n));
            if top.is_empty() {
                eprintln!("Disease '{}' not found", name);
                return Ok(ExitCode::FAILURE);
            }
            println!("{}", serde_json::to_string_pretty(&serde_json::json!({
                "disease": name,
                "top_symptoms": top,
            }))?);
        }
        Command::Health => {
            let store: ModelStore = config.model_store()?;
            let report = store.health_check();
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.healthy {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(args) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
