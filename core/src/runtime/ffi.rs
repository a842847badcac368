//! FFI declarations for the native DLR runtime library.
//!
//! This module contains the raw C API bindings. Use the safe wrappers in the
//! `native` module instead of calling these directly. Every function except
//! `GetDLRLastError` returns a status code; non-zero means failure and the
//! error text is fetched from `GetDLRLastError`.

#![allow(non_snake_case)]

use std::ffi::c_void;
use std::os::raw::c_char;

/// Opaque handle to a loaded native model.
pub type DlrModelHandle = *mut c_void;

extern "C" {
    // Model lifecycle
    pub fn CreateDLRModel(
        handle: *mut DlrModelHandle,
        model_path: *const c_char,
        dev_type: i32,
        dev_id: i32,
    ) -> i32;
    pub fn DeleteDLRModel(handle: *mut DlrModelHandle) -> i32;
    pub fn GetDLRLastError() -> *const c_char;

    // Input binding and introspection
    pub fn GetDLRNumInputs(handle: *mut DlrModelHandle, num_inputs: *mut i32) -> i32;
    pub fn GetDLRInputName(
        handle: *mut DlrModelHandle,
        index: i32,
        input_name: *mut *const c_char,
    ) -> i32;
    pub fn SetDLRInput(
        handle: *mut DlrModelHandle,
        name: *const c_char,
        shape: *const i64,
        input: *const f32,
        dim: i32,
    ) -> i32;

    // Execution
    pub fn RunDLRModel(handle: *mut DlrModelHandle) -> i32;

    // Output retrieval
    pub fn GetDLRNumOutputs(handle: *mut DlrModelHandle, num_outputs: *mut i32) -> i32;
    pub fn GetDLROutputSizeDim(
        handle: *mut DlrModelHandle,
        index: i32,
        size: *mut i64,
        dim: *mut i32,
    ) -> i32;
    pub fn GetDLROutputShape(handle: *mut DlrModelHandle, index: i32, shape: *mut i64) -> i32;
    pub fn GetDLROutput(handle: *mut DlrModelHandle, index: i32, out: *mut f32) -> i32;

    // Runtime tuning
    pub fn GetDLRBackend(handle: *mut DlrModelHandle, name: *mut *const c_char) -> i32;
    pub fn SetDLRNumThreads(handle: *mut DlrModelHandle, threads: i32) -> i32;
    pub fn UseDLRCPUAffinity(handle: *mut DlrModelHandle, use_affinity: i32) -> i32;
}
