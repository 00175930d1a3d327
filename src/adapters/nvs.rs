//! NVS (Non-Volatile Storage) adapter.
//!
//! Implements [`FilePort`]: each named file is one blob in the
//! `sensornode` namespace, keyed by the file name.
//!
//! - Atomic writes: ESP-IDF NVS commits are atomic per `nvs_commit()`, so a
//!   failed write leaves the previous blob in place.
//! - The simulation backend keeps blobs in a `HashMap` (host tests only).

use crate::app::ports::FilePort;
use crate::error::StorageError;
use log::info;

#[cfg(not(target_os = "espidf"))]
use std::collections::HashMap;

#[cfg(target_os = "espidf")]
use esp_idf_sys::*;
#[cfg(target_os = "espidf")]
use log::warn;

const NAMESPACE: &str = "sensornode";

/// NVS keys are at most 15 bytes.
const MAX_KEY_LEN: usize = 15;

/// Largest blob accepted; the configuration record stays far below it.
const MAX_BLOB_SIZE: usize = 4000;

pub struct NvsFiles {
    #[cfg(not(target_os = "espidf"))]
    blobs: HashMap<String, Vec<u8>>,
}

impl NvsFiles {
    /// Initialise NVS flash.
    ///
    /// On first boot or after a version mismatch the partition is erased
    /// and re-initialised.
    pub fn new() -> Result<Self, StorageError> {
        #[cfg(target_os = "espidf")]
        {
            // SAFETY: called once from the main task before any NVS access.
            let ret = unsafe { nvs_flash_init() };
            if ret == ESP_ERR_NVS_NO_FREE_PAGES || ret == ESP_ERR_NVS_NEW_VERSION_FOUND {
                warn!("Store: erasing and re-initialising NVS partition");
                if unsafe { nvs_flash_erase() } != ESP_OK || unsafe { nvs_flash_init() } != ESP_OK {
                    return Err(StorageError::Io);
                }
            } else if ret != ESP_OK {
                return Err(StorageError::Io);
            }
            info!("Store: NVS initialised");
        }

        #[cfg(not(target_os = "espidf"))]
        info!("Store: simulation backend");

        Ok(Self {
            #[cfg(not(target_os = "espidf"))]
            blobs: HashMap::new(),
        })
    }

    /// NUL-terminated key buffer; over-long names are refused.
    fn key(name: &str) -> Result<[u8; MAX_KEY_LEN + 1], StorageError> {
        let bytes = name.as_bytes();
        if bytes.is_empty() || bytes.len() > MAX_KEY_LEN || bytes.contains(&0) {
            return Err(StorageError::Io);
        }
        let mut buf = [0u8; MAX_KEY_LEN + 1];
        buf[..bytes.len()].copy_from_slice(bytes);
        Ok(buf)
    }

    /// Open the namespace, run `f` with the handle, then close.
    #[cfg(target_os = "espidf")]
    fn with_nvs_handle<F, T>(write: bool, f: F) -> Result<T, i32>
    where
        F: FnOnce(nvs_handle_t) -> Result<T, i32>,
    {
        let mut ns_buf = [0u8; 16];
        let ns = NAMESPACE.as_bytes();
        ns_buf[..ns.len()].copy_from_slice(ns);

        let mut handle: nvs_handle_t = 0;
        let mode = if write {
            nvs_open_mode_t_NVS_READWRITE
        } else {
            nvs_open_mode_t_NVS_READONLY
        };

        let ret = unsafe { nvs_open(ns_buf.as_ptr() as *const _, mode, &mut handle) };
        if ret != ESP_OK {
            return Err(ret);
        }

        let result = f(handle);
        unsafe {
            nvs_close(handle);
        }
        result
    }
}

impl FilePort for NvsFiles {
    fn read(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let key = Self::key(name)?;

        #[cfg(not(target_os = "espidf"))]
        {
            let _ = key;
            self.blobs.get(name).cloned().ok_or(StorageError::NotFound)
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(false, |handle| {
                // First call sizes the blob.
                let mut size = 0usize;
                let ret = unsafe {
                    nvs_get_blob(handle, key.as_ptr() as *const _, core::ptr::null_mut(), &mut size)
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let mut buf = vec![0u8; size];
                let ret = unsafe {
                    nvs_get_blob(
                        handle,
                        key.as_ptr() as *const _,
                        buf.as_mut_ptr() as *mut _,
                        &mut size,
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                buf.truncate(size);
                Ok(buf)
            });
            match result {
                Ok(buf) => Ok(buf),
                // A missing namespace on first boot reads the same as a missing key.
                Err(e) if e == ESP_ERR_NVS_NOT_FOUND => Err(StorageError::NotFound),
                Err(_) => Err(StorageError::Io),
            }
        }
    }

    fn write(&mut self, name: &str, data: &[u8]) -> Result<(), StorageError> {
        let key = Self::key(name)?;
        if data.len() > MAX_BLOB_SIZE {
            return Err(StorageError::TooLarge);
        }

        #[cfg(not(target_os = "espidf"))]
        {
            let _ = key;
            self.blobs.insert(name.to_string(), data.to_vec());
            Ok(())
        }

        #[cfg(target_os = "espidf")]
        {
            let result = Self::with_nvs_handle(true, |handle| {
                let ret = unsafe {
                    nvs_set_blob(
                        handle,
                        key.as_ptr() as *const _,
                        data.as_ptr() as *const _,
                        data.len(),
                    )
                };
                if ret != ESP_OK {
                    return Err(ret);
                }
                let ret = unsafe { nvs_commit(handle) };
                if ret != ESP_OK {
                    return Err(ret);
                }
                Ok(())
            });
            result.map_err(|_| StorageError::Io)
        }
    }
}
