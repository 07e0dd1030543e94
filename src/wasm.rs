//! WebAssembly bindings for crdt-counter.
//!
//! Enable with the `wasm` feature:
//!
//! ```toml
//! [dependencies]
//! crdt-counter = { version = "0.1", features = ["wasm"] }
//! ```
//!
//! Both counters are exposed as JavaScript classes keyed by string replica
//! IDs. State crosses the boundary as `Uint8Array` in the binary envelope.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use wasm_bindgen::prelude::*;

use crate::Crdt;

fn to_js(err: crate::CounterError) -> JsError {
    JsError::new(&err.to_string())
}

fn counts_object<'a>(counts: impl Iterator<Item = (&'a String, u64)>) -> Result<js_sys::Object, JsValue> {
    let object = js_sys::Object::new();
    for (replica, count) in counts {
        js_sys::Reflect::set(
            &object,
            &JsValue::from_str(replica),
            &JsValue::from(js_sys::BigInt::from(count)),
        )?;
    }
    Ok(object)
}

// ── GCounter ────────────────────────────────────────────────────────

/// A grow-only counter for use from JavaScript.
#[wasm_bindgen(js_name = GCounter)]
pub struct WasmGCounter {
    inner: crate::GCounter<String>,
}

#[wasm_bindgen(js_class = GCounter)]
impl WasmGCounter {
    /// Create a new G-Counter with the given replica ID.
    #[wasm_bindgen(constructor)]
    pub fn new(replica: &str) -> Self {
        Self {
            inner: crate::GCounter::new(replica.to_string()),
        }
    }

    /// Increment this replica's count by 1.
    pub fn increment(&mut self) {
        self.inner.increment();
    }

    /// Increment this replica's count by `n`.
    #[wasm_bindgen(js_name = incrementBy)]
    pub fn increment_by(&mut self, n: u64) {
        self.inner.increment_by(n);
    }

    /// Get the total counter value across all replicas.
    pub fn value(&self) -> u64 {
        self.inner.value()
    }

    /// Merge another G-Counter's state into this one.
    pub fn merge(&mut self, other: &WasmGCounter) {
        self.inner.merge(&other.inner);
    }

    /// Per-replica counts as a plain object of `BigInt` values.
    pub fn export(&self) -> Result<js_sys::Object, JsValue> {
        counts_object(self.inner.iter())
    }

    /// Encode the state for another replica.
    #[wasm_bindgen(js_name = toBytes)]
    pub fn to_bytes(&self) -> Result<Vec<u8>, JsError> {
        self.inner.to_bytes().map_err(to_js)
    }

    /// Decode state produced by `toBytes`.
    #[wasm_bindgen(js_name = fromBytes)]
    pub fn from_bytes(data: &[u8]) -> Result<WasmGCounter, JsError> {
        let inner = crate::GCounter::from_bytes(data).map_err(to_js)?;
        Ok(Self { inner })
    }

    /// Merge encoded peer state; throws and leaves the counter unchanged if
    /// the state is invalid.
    #[wasm_bindgen(js_name = mergeBytes)]
    pub fn merge_bytes(&mut self, data: &[u8]) -> Result<(), JsError> {
        self.inner.merge_bytes(data).map_err(to_js)
    }
}

// ── PNCounter ───────────────────────────────────────────────────────

/// A positive-negative counter for use from JavaScript.
#[wasm_bindgen(js_name = PNCounter)]
pub struct WasmPNCounter {
    inner: crate::PNCounter<String>,
}

#[wasm_bindgen(js_class = PNCounter)]
impl WasmPNCounter {
    /// Create a new PN-Counter with the given replica ID.
    #[wasm_bindgen(constructor)]
    pub fn new(replica: &str) -> Self {
        Self {
            inner: crate::PNCounter::new(replica.to_string()),
        }
    }

    /// Increment the counter by 1.
    pub fn increment(&mut self) {
        self.inner.increment();
    }

    /// Decrement the counter by 1.
    pub fn decrement(&mut self) {
        self.inner.decrement();
    }

    /// Get the current counter value (increments - decrements).
    pub fn value(&self) -> i64 {
        self.inner.value()
    }

    /// Merge another PN-Counter's state into this one.
    pub fn merge(&mut self, other: &WasmPNCounter) {
        self.inner.merge(&other.inner);
    }

    /// Encode the state for another replica.
    #[wasm_bindgen(js_name = toBytes)]
    pub fn to_bytes(&self) -> Result<Vec<u8>, JsError> {
        self.inner.to_bytes().map_err(to_js)
    }

    /// Decode state produced by `toBytes`.
    #[wasm_bindgen(js_name = fromBytes)]
    pub fn from_bytes(data: &[u8]) -> Result<WasmPNCounter, JsError> {
        let inner = crate::PNCounter::from_bytes(data).map_err(to_js)?;
        Ok(Self { inner })
    }

    /// Merge encoded peer state; throws and leaves the counter unchanged if
    /// the state is invalid.
    #[wasm_bindgen(js_name = mergeBytes)]
    pub fn merge_bytes(&mut self, data: &[u8]) -> Result<(), JsError> {
        self.inner.merge_bytes(data).map_err(to_js)
    }
}
