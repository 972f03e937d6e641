// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Clamping helpers used by configuration types.
//!
//! Invalid configuration never fails construction: each offending field is
//! replaced with its default and a warning names the field.

/// Returns `value` if it is finite and strictly positive, otherwise `default`.
pub fn positive(field: &str, value: f64, default: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        log::warn!("Config: `{field}` = {value} is not positive, using {default}");
        default
    }
}

/// Returns `value` if it is finite and not negative, otherwise `default`.
pub fn non_negative(field: &str, value: f64, default: f64) -> f64 {
    if value.is_finite() && value >= 0.0 {
        value
    } else {
        log::warn!("Config: `{field}` = {value} is negative, using {default}");
        default
    }
}

/// Returns `value` if it lies in `[0, 1]`, otherwise `default`.
pub fn unit_interval(field: &str, value: f64, default: f64) -> f64 {
    if (0.0..=1.0).contains(&value) {
        value
    } else {
        log::warn!("Config: `{field}` = {value} is outside [0, 1], using {default}");
        default
    }
}

/// Returns `value` if it is non-zero, otherwise `default`.
pub fn capacity(field: &str, value: usize, default: usize) -> usize {
    if value > 0 {
        value
    } else {
        log::warn!("Config: `{field}` is zero, using {default}");
        default
    }
}
