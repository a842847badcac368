//! dlr-rs: Rust bindings for the DLR compiled-model runtime.
//!
//! This crate binds a native runtime for ahead-of-time-compiled deep-learning
//! models into a typed, translator-driven prediction interface. Model
//! loading, device placement, and tensor computation are delegated to the
//! native library; this layer owns handle lifetimes, scoped tensor memory,
//! and the conversion between application values and tensors.
//!
//! # Features
//!
//! - **dlr**: Link the prebuilt native DLR runtime library and enable the
//!   FFI-backed backend. Without it, only runtimes registered through the
//!   [`runtime`] registry (e.g. stubs in tests) are available.
//!
//! # Example
//!
//! ```ignore
//! use dlr_rs::model::Model;
//! use dlr_rs::predictor::Predictor;
//! use dlr_rs::runtime::{native::DlrRuntime, Device};
//! use dlr_rs::translate::RawTranslator;
//! use ndarray::ArrayD;
//!
//! let runtime_id = DlrRuntime::register();
//! let model = Model::new("resnet", "models/resnet");
//!
//! // Bind the model into a predictor
//! let mut predictor = Predictor::new(
//!     runtime_id,
//!     &model,
//!     "models/resnet",
//!     Device::cpu(),
//!     RawTranslator,
//! )?;
//!
//! // Run inference over named tensors
//! let input = vec![("data".to_string(), ArrayD::zeros(ndarray::IxDyn(&[1, 3, 224, 224])))];
//! let outputs = predictor.predict(&input)?;
//! println!("Got {} outputs", outputs.len());
//! ```
//!
//! # Building
//!
//! The `dlr` feature links against a prebuilt `libdlr`. Point the build at
//! your installation:
//!
//! ```bash
//! # CPU-only runtime
//! DLR_HOME=/opt/dlr cargo build --release --features dlr
//!
//! # Or give the library directory directly
//! DLR_LIB_DIR=/opt/dlr/lib cargo build --release --features dlr
//! ```

pub mod block;
pub mod cli;
pub mod config;
pub mod error;
pub mod memory;
pub mod model;
pub mod predictor;
pub mod runtime;
pub mod tensor;
pub mod translate;

// Re-export commonly used types
pub use block::SymbolBlock;
pub use error::{DlrError, Result};
pub use memory::MemoryManager;
pub use model::Model;
pub use predictor::Predictor;
pub use runtime::{Device, RuntimeId};
pub use tensor::{Tensor, TensorBatch};
pub use translate::{RawTranslator, TranslateContext, Translator};
