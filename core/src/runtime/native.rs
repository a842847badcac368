//! Safe wrappers for the native DLR runtime.

use std::ffi::{CStr, CString};
use std::path::Path;
use std::ptr;
use std::sync::Arc;

use tracing::debug;

use super::{ffi, Device, NativeModel, NativeRuntime, RuntimeId};
use crate::error::{DlrError, Result};

/// Get the last error message reported by the native library.
fn last_error() -> String {
    unsafe {
        let err_ptr = ffi::GetDLRLastError();
        if err_ptr.is_null() {
            "Unknown error".to_string()
        } else {
            CStr::from_ptr(err_ptr).to_string_lossy().into_owned()
        }
    }
}

/// Map a native status code to `Ok(())` or an error built by `make_err`.
fn check(status: i32, make_err: impl FnOnce(String) -> DlrError) -> Result<()> {
    if status == 0 {
        Ok(())
    } else {
        Err(make_err(last_error()))
    }
}

/// The statically linked DLR runtime.
///
/// Register an instance to obtain a [`RuntimeId`] that predictors can use:
///
/// ```ignore
/// let runtime_id = DlrRuntime::register();
/// let predictor = Predictor::new(runtime_id, &model, "model/", Device::cpu(), translator)?;
/// ```
pub struct DlrRuntime;

impl DlrRuntime {
    /// Register this runtime in the process-wide registry.
    pub fn register() -> RuntimeId {
        super::register(Arc::new(Self))
    }
}

impl NativeRuntime for DlrRuntime {
    fn name(&self) -> &str {
        "dlr"
    }

    fn create_model(&self, model_dir: &Path, device: &Device) -> Result<Box<dyn NativeModel>> {
        let path_cstr = CString::new(model_dir.to_string_lossy().as_ref())
            .map_err(|_| DlrError::runtime_load("Invalid path encoding"))?;

        let mut handle: ffi::DlrModelHandle = ptr::null_mut();
        let status = unsafe {
            ffi::CreateDLRModel(
                &mut handle,
                path_cstr.as_ptr(),
                device.type_code(),
                device.ordinal(),
            )
        };
        check(status, |msg| {
            DlrError::runtime_load(format!(
                "Failed to load model from {}: {}",
                model_dir.display(),
                msg
            ))
        })?;
        if handle.is_null() {
            return Err(DlrError::runtime_load(format!(
                "Native runtime returned a null handle for {}",
                model_dir.display()
            )));
        }

        debug!(model_dir = %model_dir.display(), device = %device, "loaded native model");
        Ok(Box::new(DlrNativeModel { handle }))
    }
}

/// Owned handle to one model loaded by the native DLR runtime.
struct DlrNativeModel {
    handle: ffi::DlrModelHandle,
}

// SAFETY: the native model is only ever driven through &mut, and the handle
// is not tied to the creating thread.
unsafe impl Send for DlrNativeModel {}

impl DlrNativeModel {
    fn string_from(&self, status: i32, ptr: *const std::os::raw::c_char) -> Result<String> {
        check(status, DlrError::Inference)?;
        if ptr.is_null() {
            return Err(DlrError::inference("Native runtime returned a null string"));
        }
        Ok(unsafe { CStr::from_ptr(ptr) }.to_string_lossy().into_owned())
    }

    fn output_size_dim(&self, index: usize) -> Result<(usize, usize)> {
        let mut size: i64 = 0;
        let mut dim: i32 = 0;
        let mut handle = self.handle;
        let status =
            unsafe { ffi::GetDLROutputSizeDim(&mut handle, index as i32, &mut size, &mut dim) };
        check(status, DlrError::Inference)?;
        Ok((size as usize, dim as usize))
    }
}

impl NativeModel for DlrNativeModel {
    fn set_input(&mut self, name: &str, shape: &[i64], data: &[f32]) -> Result<()> {
        let name_cstr =
            CString::new(name).map_err(|_| DlrError::tensor("Invalid input name encoding"))?;
        let status = unsafe {
            ffi::SetDLRInput(
                &mut self.handle,
                name_cstr.as_ptr(),
                shape.as_ptr(),
                data.as_ptr(),
                shape.len() as i32,
            )
        };
        check(status, |msg| {
            DlrError::inference(format!("Failed to bind input '{}': {}", name, msg))
        })
    }

    fn run(&mut self) -> Result<()> {
        let status = unsafe { ffi::RunDLRModel(&mut self.handle) };
        check(status, DlrError::Inference)
    }

    fn num_inputs(&self) -> Result<usize> {
        let mut num: i32 = 0;
        let mut handle = self.handle;
        let status = unsafe { ffi::GetDLRNumInputs(&mut handle, &mut num) };
        check(status, DlrError::Inference)?;
        Ok(num as usize)
    }

    fn input_name(&self, index: usize) -> Result<String> {
        let mut name: *const std::os::raw::c_char = ptr::null();
        let mut handle = self.handle;
        let status = unsafe { ffi::GetDLRInputName(&mut handle, index as i32, &mut name) };
        self.string_from(status, name)
    }

    fn num_outputs(&self) -> Result<usize> {
        let mut num: i32 = 0;
        let mut handle = self.handle;
        let status = unsafe { ffi::GetDLRNumOutputs(&mut handle, &mut num) };
        check(status, DlrError::Inference)?;
        Ok(num as usize)
    }

    fn output_shape(&self, index: usize) -> Result<Vec<usize>> {
        let (_, dim) = self.output_size_dim(index)?;
        let mut shape = vec![0i64; dim];
        let mut handle = self.handle;
        let status =
            unsafe { ffi::GetDLROutputShape(&mut handle, index as i32, shape.as_mut_ptr()) };
        check(status, DlrError::Inference)?;
        Ok(shape.into_iter().map(|d| d as usize).collect())
    }

    fn output(&self, index: usize) -> Result<Vec<f32>> {
        let (size, _) = self.output_size_dim(index)?;
        let mut data = vec![0f32; size];
        let mut handle = self.handle;
        let status = unsafe { ffi::GetDLROutput(&mut handle, index as i32, data.as_mut_ptr()) };
        check(status, |msg| {
            DlrError::inference(format!("Failed to fetch output {}: {}", index, msg))
        })?;
        Ok(data)
    }

    fn backend(&self) -> Result<String> {
        let mut name: *const std::os::raw::c_char = ptr::null();
        let mut handle = self.handle;
        let status = unsafe { ffi::GetDLRBackend(&mut handle, &mut name) };
        self.string_from(status, name)
    }

    fn set_num_threads(&mut self, threads: usize) -> Result<()> {
        let status = unsafe { ffi::SetDLRNumThreads(&mut self.handle, threads as i32) };
        check(status, DlrError::Inference)
    }

    fn use_cpu_affinity(&mut self, enabled: bool) -> Result<()> {
        let status = unsafe { ffi::UseDLRCPUAffinity(&mut self.handle, enabled as i32) };
        check(status, DlrError::Inference)
    }
}

impl Drop for DlrNativeModel {
    fn drop(&mut self) {
        if !self.handle.is_null() {
            let status = unsafe { ffi::DeleteDLRModel(&mut self.handle) };
            if status != 0 {
                debug!(error = %last_error(), "failed to delete native model");
            }
            self.handle = ptr::null_mut();
        }
    }
}
