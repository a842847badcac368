//! CLI entry point for dlr-rs.

use std::collections::BTreeMap;
use std::fs;

use anyhow::{Context, Result};
use ndarray::{ArrayD, IxDyn};
use serde::Deserialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use dlr_rs::cli::{Cli, Commands};
use dlr_rs::config::Config;
use dlr_rs::model::Model;
use dlr_rs::predictor::Predictor;
use dlr_rs::runtime::RuntimeId;
use dlr_rs::translate::RawTranslator;

/// JSON form of one tensor: `{"data": [...], "shape": [...]}`.
#[derive(Deserialize)]
struct TensorJson {
    data: Vec<f32>,
    shape: Vec<usize>,
}

/// Input file format: either named tensors or a single-tensor shorthand.
#[derive(Deserialize)]
#[serde(untagged)]
enum InputJson {
    Named { inputs: BTreeMap<String, TensorJson> },
    Single(TensorJson),
}

fn parse_inputs(json: &str) -> Result<Vec<(String, ArrayD<f32>)>> {
    let parsed: InputJson = serde_json::from_str(json)?;
    let named = match parsed {
        InputJson::Named { inputs } => inputs.into_iter().collect::<Vec<_>>(),
        InputJson::Single(tensor) => vec![("data".to_string(), tensor)],
    };
    named
        .into_iter()
        .map(|(name, tensor)| {
            let array = ArrayD::from_shape_vec(IxDyn(&tensor.shape), tensor.data)
                .with_context(|| format!("Input '{}' has inconsistent shape", name))?;
            Ok((name, array))
        })
        .collect()
}

/// Register the compiled-in native runtime.
#[cfg(feature = "dlr")]
fn default_runtime() -> Result<RuntimeId> {
    Ok(dlr_rs::runtime::native::DlrRuntime::register())
}

#[cfg(not(feature = "dlr"))]
fn default_runtime() -> Result<RuntimeId> {
    anyhow::bail!("This binary was built without the `dlr` feature; rebuild with --features dlr")
}

fn model_name(model_dir: &std::path::Path) -> String {
    model_dir
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "model".to_string())
}

fn main() -> Result<()> {
    // Initialize logging
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .init();

    let cli = Cli::parse_args();

    match cli.command {
        Commands::Infer {
            model_dir,
            device,
            input,
            format,
            config,
        } => {
            // Load optional config
            let config = if let Some(config_path) = config {
                Config::from_yaml_file(&config_path)
                    .with_context(|| format!("Failed to load config: {}", config_path.display()))?
            } else {
                Config::default()
            };

            // Parse device
            let device: dlr_rs::runtime::Device = device.parse()?;
            info!("Using device: {}", device);

            let runtime_id = default_runtime()?;

            // Load model
            info!("Loading model: {}", model_dir.display());
            let model = Model::new(model_name(&model_dir), &model_dir);
            let mut predictor =
                Predictor::new(runtime_id, &model, &model_dir, device, RawTranslator)?;
            info!("Model loaded successfully");

            // Apply runtime tuning from config
            if let Some(threads) = config.runtime.num_threads {
                predictor.set_num_threads(threads)?;
            }
            if config.runtime.cpu_affinity {
                predictor.use_cpu_affinity(true)?;
            }

            // Load input data
            info!("Loading input: {}", input.display());
            let json = fs::read_to_string(&input)
                .with_context(|| format!("Failed to read input: {}", input.display()))?;
            let inputs = parse_inputs(&json)?;

            // Run inference
            info!("Running inference...");
            let outputs = predictor.predict(&inputs)?;
            info!("Inference complete: {} outputs", outputs.len());

            // Format output
            let output = serde_json::json!({
                "num_outputs": outputs.len(),
                "outputs": outputs.iter().map(|(name, array)| {
                    serde_json::json!({
                        "name": name,
                        "shape": array.shape(),
                        "data": array.iter().copied().collect::<Vec<f32>>(),
                    })
                }).collect::<Vec<_>>()
            });

            if format == "pretty" {
                println!("{}", serde_json::to_string_pretty(&output)?);
            } else {
                println!("{}", serde_json::to_string(&output)?);
            }
        }

        Commands::Info { model_dir, device } => {
            let device: dlr_rs::runtime::Device = device.parse()?;
            let runtime_id = default_runtime()?;

            println!("dlr-rs v{}", env!("CARGO_PKG_VERSION"));
            println!("Model: {}", model_dir.display());
            println!("Device: {}", device);

            info!("Loading model...");
            let model = Model::new(model_name(&model_dir), &model_dir);
            let predictor = Predictor::new(runtime_id, &model, &model_dir, device, RawTranslator)?;

            let block = predictor.block();
            println!("Backend: {}", block.backend()?);
            let num_inputs = block.num_inputs()?;
            for index in 0..num_inputs {
                println!("Input {}: {}", index, block.input_name(index)?);
            }
            println!("Outputs: {}", block.num_outputs()?);
            println!("Status: OK (model loaded successfully)");
        }
    }

    Ok(())
}
