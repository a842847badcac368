//! End-to-end predictor behavior against a stub native runtime.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Result;
use approx::assert_abs_diff_eq;

use dlr_rs::error::DlrError;
use dlr_rs::model::Model;
use dlr_rs::predictor::Predictor;
use dlr_rs::runtime::{self, Device, NativeModel, NativeRuntime};
use dlr_rs::tensor::TensorBatch;
use dlr_rs::translate::{TranslateContext, Translator};

/// Stub model: doubles the input named "x" and returns it as "y"; any other
/// input is passed through under its own name.
#[derive(Default)]
struct EchoModel {
    inputs: Vec<(String, Vec<usize>, Vec<f32>)>,
    outputs: Vec<(String, Vec<usize>, Vec<f32>)>,
}

impl EchoModel {
    fn output_entry(&self, index: usize) -> dlr_rs::Result<&(String, Vec<usize>, Vec<f32>)> {
        self.outputs
            .get(index)
            .ok_or_else(|| DlrError::inference(format!("no output {}", index)))
    }
}

impl NativeModel for EchoModel {
    fn set_input(&mut self, name: &str, shape: &[i64], data: &[f32]) -> dlr_rs::Result<()> {
        let shape = shape.iter().map(|&d| d as usize).collect();
        self.inputs.push((name.to_string(), shape, data.to_vec()));
        Ok(())
    }

    fn run(&mut self) -> dlr_rs::Result<()> {
        self.outputs = self
            .inputs
            .drain(..)
            .map(|(name, shape, data)| {
                if name == "x" {
                    let doubled = data.iter().map(|v| v * 2.0).collect();
                    ("y".to_string(), shape, doubled)
                } else {
                    (name, shape, data)
                }
            })
            .collect();
        Ok(())
    }

    fn num_inputs(&self) -> dlr_rs::Result<usize> {
        Ok(1)
    }

    fn input_name(&self, _index: usize) -> dlr_rs::Result<String> {
        Ok("x".to_string())
    }

    fn num_outputs(&self) -> dlr_rs::Result<usize> {
        Ok(self.outputs.len())
    }

    fn output_shape(&self, index: usize) -> dlr_rs::Result<Vec<usize>> {
        Ok(self.output_entry(index)?.1.clone())
    }

    fn output(&self, index: usize) -> dlr_rs::Result<Vec<f32>> {
        Ok(self.output_entry(index)?.2.clone())
    }

    fn output_name(&self, index: usize) -> dlr_rs::Result<String> {
        Ok(self.output_entry(index)?.0.clone())
    }

    fn backend(&self) -> dlr_rs::Result<String> {
        Ok("stub".to_string())
    }
}

struct EchoRuntime;

impl NativeRuntime for EchoRuntime {
    fn name(&self) -> &str {
        "echo"
    }

    fn create_model(
        &self,
        _model_dir: &Path,
        _device: &Device,
    ) -> dlr_rs::Result<Box<dyn NativeModel>> {
        Ok(Box::<EchoModel>::default())
    }
}

/// Stub runtime whose model creation always fails.
struct FailingRuntime;

impl NativeRuntime for FailingRuntime {
    fn name(&self) -> &str {
        "failing"
    }

    fn create_model(
        &self,
        model_dir: &Path,
        _device: &Device,
    ) -> dlr_rs::Result<Box<dyn NativeModel>> {
        Err(DlrError::runtime_load(format!(
            "corrupt artifact in {}",
            model_dir.display()
        )))
    }
}

/// Maps a scalar onto the "x" input and reads the scalar back from "y".
struct ScalarTranslator;

impl Translator for ScalarTranslator {
    type Input = f32;
    type Output = f32;

    fn encode(
        &self,
        ctx: &TranslateContext<'_>,
        input: &Self::Input,
    ) -> dlr_rs::Result<TensorBatch> {
        let mut batch = TensorBatch::new();
        batch.insert("x", ctx.tensor_from(&[1], vec![*input])?);
        Ok(batch)
    }

    fn decode(
        &self,
        _ctx: &TranslateContext<'_>,
        outputs: TensorBatch,
    ) -> dlr_rs::Result<Self::Output> {
        let y = outputs
            .get("y")
            .ok_or_else(|| DlrError::translation("missing output 'y'"))?;
        y.data()
            .iter()
            .next()
            .copied()
            .ok_or_else(|| DlrError::translation("empty output 'y'"))
    }
}

/// An existing directory to stand in for model artifacts.
fn artifact_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
}

#[test]
fn construction_reaches_ready() -> Result<()> {
    let runtime_id = runtime::register(Arc::new(EchoRuntime));
    let model = Model::new("echo", artifact_dir());

    let predictor = Predictor::new(
        runtime_id,
        &model,
        artifact_dir(),
        Device::cpu(),
        ScalarTranslator,
    )?;
    assert!(predictor.is_open());
    assert_eq!(predictor.block().backend()?, "stub");
    Ok(())
}

#[test]
fn missing_model_dir_fails_without_leaks() {
    let runtime_id = runtime::register(Arc::new(EchoRuntime));
    let model = Model::new("echo", "/no/such/model");

    let err = Predictor::new(
        runtime_id,
        &model,
        "/no/such/model",
        Device::cpu(),
        ScalarTranslator,
    )
    .unwrap_err();
    assert!(matches!(err, DlrError::RuntimeLoad(_)));
    assert_eq!(model.manager().outstanding(), 0);
}

#[test]
fn native_load_failure_releases_scope() {
    let runtime_id = runtime::register(Arc::new(FailingRuntime));
    let model = Model::new("echo", artifact_dir());

    let err = Predictor::new(
        runtime_id,
        &model,
        artifact_dir(),
        Device::cpu(),
        ScalarTranslator,
    )
    .unwrap_err();
    assert!(matches!(err, DlrError::RuntimeLoad(_)));
    assert_eq!(model.manager().outstanding(), 0);
    // The model's own scope stays usable after the failed construction.
    assert!(model.manager().is_open());
}

#[test]
fn unknown_runtime_id_fails_construction() {
    let runtime_id = runtime::register(Arc::new(EchoRuntime));
    assert!(runtime::deregister(runtime_id));
    let model = Model::new("echo", artifact_dir());

    let err = Predictor::new(
        runtime_id,
        &model,
        artifact_dir(),
        Device::cpu(),
        ScalarTranslator,
    )
    .unwrap_err();
    assert!(matches!(err, DlrError::RuntimeLoad(_)));
    assert_eq!(model.manager().outstanding(), 0);
}

#[test]
fn predict_echoes_translated_output() -> Result<()> {
    let runtime_id = runtime::register(Arc::new(EchoRuntime));
    let model = Model::new("echo", artifact_dir());

    let mut predictor = Predictor::new(
        runtime_id,
        &model,
        artifact_dir(),
        Device::cpu(),
        ScalarTranslator,
    )?;

    let y = predictor.predict(&1.0)?;
    assert_abs_diff_eq!(y, 2.0, epsilon = 1e-6);

    // Intermediate tensors were scoped to the call and are gone.
    assert_eq!(model.manager().outstanding(), 0);

    // The predictor stays usable for further calls.
    let y = predictor.predict(&3.0)?;
    assert_abs_diff_eq!(y, 6.0, epsilon = 1e-6);
    Ok(())
}

#[test]
fn predict_after_close_fails() -> Result<()> {
    let runtime_id = runtime::register(Arc::new(EchoRuntime));
    let model = Model::new("echo", artifact_dir());

    let mut predictor = Predictor::new(
        runtime_id,
        &model,
        artifact_dir(),
        Device::cpu(),
        ScalarTranslator,
    )?;

    predictor.close();
    assert!(!predictor.is_open());

    let err = predictor.predict(&1.0).unwrap_err();
    assert!(matches!(err, DlrError::Closed(_)));
    Ok(())
}

#[test]
fn double_close_is_noop() -> Result<()> {
    let runtime_id = runtime::register(Arc::new(EchoRuntime));
    let model = Model::new("echo", artifact_dir());

    let mut predictor = Predictor::new(
        runtime_id,
        &model,
        artifact_dir(),
        Device::cpu(),
        ScalarTranslator,
    )?;

    predictor.close();
    predictor.close();
    assert!(!predictor.is_open());
    Ok(())
}

#[test]
fn sibling_predictors_do_not_share_scopes() -> Result<()> {
    let runtime_id = runtime::register(Arc::new(EchoRuntime));
    let model = Model::new("echo", artifact_dir());

    let mut first = Predictor::new(
        runtime_id,
        &model,
        artifact_dir(),
        Device::cpu(),
        ScalarTranslator,
    )?;
    let mut second = Predictor::new(
        runtime_id,
        &model,
        artifact_dir(),
        Device::cuda(0),
        ScalarTranslator,
    )?;

    first.close();
    assert!(!first.is_open());

    // Closing one predictor leaves its sibling fully functional.
    assert!(second.is_open());
    let y = second.predict(&2.0)?;
    assert_abs_diff_eq!(y, 4.0, epsilon = 1e-6);
    assert!(model.manager().is_open());
    Ok(())
}

#[test]
fn translation_errors_propagate_unchanged() -> Result<()> {
    /// Encodes under a name the stub never answers, so decode fails.
    struct MisnamedTranslator;

    impl Translator for MisnamedTranslator {
        type Input = f32;
        type Output = f32;

        fn encode(
            &self,
            ctx: &TranslateContext<'_>,
            input: &Self::Input,
        ) -> dlr_rs::Result<TensorBatch> {
            let mut batch = TensorBatch::new();
            batch.insert("z", ctx.tensor_from(&[1], vec![*input])?);
            Ok(batch)
        }

        fn decode(
            &self,
            _ctx: &TranslateContext<'_>,
            outputs: TensorBatch,
        ) -> dlr_rs::Result<Self::Output> {
            outputs
                .get("y")
                .map(|_| 0.0)
                .ok_or_else(|| DlrError::translation("missing output 'y'"))
        }
    }

    let runtime_id = runtime::register(Arc::new(EchoRuntime));
    let model = Model::new("echo", artifact_dir());

    let mut predictor = Predictor::new(
        runtime_id,
        &model,
        artifact_dir(),
        Device::cpu(),
        MisnamedTranslator,
    )?;

    let err = predictor.predict(&1.0).unwrap_err();
    assert!(matches!(err, DlrError::Translation(_)));

    // A failed call does not poison the predictor.
    assert!(predictor.is_open());
    assert_eq!(model.manager().outstanding(), 0);
    Ok(())
}
