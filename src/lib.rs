// Copyright 2025 Johann Kempter
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
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]
#![allow(clippy::too_many_arguments)]

//! # dotbridge
//!
//! Reflective bridge for .NET hosts whose objects may live in two representations: a
//! homogeneous managed object model, or a dual model where managed objects are thin
//! proxies over natively allocated objects with their own class metadata (IL2CPP-style
//! runtimes).
//!
//! The bridge answers the questions every tool running inside such a host keeps asking,
//! and never crashes the host on a wrong assumption while doing so:
//!
//! - **What types exist?** A case-insensitive, append-only [`metadata::catalog`] of every
//!   loaded type, including implementation-set queries
//! - **What is this object really?** Actual-type resolution through the foreign runtime,
//!   including obfuscated class names
//! - **Can I use it as a `T`?** Casting across representations with explicit outcomes
//! - **What does it contain?** Lazy enumeration of foreign collections whose enumerator
//!   shape is discovered once and cached
//! - **Which member was it again?** Field/property access tolerant of renames across host
//!   versions
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use dotbridge::prelude::*;
//!
//! let heap = Arc::new(NativeHeap::new());
//! let context = BridgeContext::builder()
//!     .config(BridgeConfig::dual_model())
//!     .runtime(heap)
//!     .build()?;
//!
//! let base = TypeBuilder::class("MyGame", "Weapon").abstract_type().build();
//! let sword = TypeBuilder::class("MyGame", "Sword").extends(&base).build();
//! context.initialize(&[ModuleInfo::new("Assembly-CSharp", vec![base.clone(), sword])]);
//!
//! let weapons = context.implementations(&base, ImplementationFilter::default());
//! assert_eq!(weapons.len(), 1);
//!
//! let int = context.lookup("system.int32").unwrap();
//! assert_eq!(context.try_cast(&Value::I64(7), &int).into_value(), Value::I32(7));
//! # Ok::<(), dotbridge::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`prelude`] - Convenient re-exports of commonly used types and traits
//! - [`BridgeContext`] - Session-scoped owner of all caches, the public entry point
//! - [`metadata`] - Type records, members, custom attributes and the type catalog
//! - [`interop`] - Identity resolution, casting, enumeration and member resolution
//! - [`runtime`] - The foreign runtime capability and an in-process implementation
//! - [`value`] - Host-side values and objects
//! - [`config`], [`diagnostics`], [`dispatch`] - Configuration, warnings, owner-thread hop
//! - [`Error`] and [`Result`] - Error handling
//!
//! ## Error Handling
//!
//! Expected mismatches never surface as errors: member lookups degrade to default values
//! and casts report a [`interop::CastOutcome`]. Unexpected failures of the foreign runtime
//! are contained, recorded in [`diagnostics::Diagnostics`] and replaced by a documented
//! fallback. Only precondition violations such as a duplicate registration propagate as
//! [`Error`].
//!
//! ## Threading
//!
//! Bridge state belongs to the host's main thread. All caches are safe to read while the
//! owner thread appends to them; the only cross-thread operation is
//! [`dispatch::MainThreadDispatcher::post`].

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use dotbridge::prelude::*;
///
/// let context = BridgeContext::builder().config(BridgeConfig::managed()).build()?;
/// assert!(context.lookup("System.String").is_some());
/// # Ok::<(), dotbridge::Error>(())
/// ```
pub mod prelude;

/// Bridge configuration and presets
pub mod config;

/// Warning and info records collected while the bridge runs
pub mod diagnostics;

/// Single-slot callback hop onto the owner thread
pub mod dispatch;

/// Type records, members, custom attributes, modules and the type catalog
///
/// # Key Components
///
/// - [`metadata::typesystem`] - [`metadata::typesystem::TypeRecord`] and its builder
/// - [`metadata::catalog`] - [`metadata::catalog::TypeCatalog`], the append-only index
/// - [`metadata::customattributes`] - attribute data and the obfuscated-name reader
/// - [`metadata::module`] - modules delivered by the host's load notifications
pub mod metadata;

/// Identity resolution, casting, enumeration and member resolution across both
/// object models
pub mod interop;

/// The foreign runtime capability
pub mod runtime;

/// Host-side values and objects
pub mod value;

mod context;

/// `dotbridge` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
///
/// # Examples
///
/// ```rust
/// use dotbridge::{prelude::*, Result};
///
/// fn managed_context() -> Result<BridgeContext> {
///     BridgeContext::builder().config(BridgeConfig::managed()).build()
/// }
/// # managed_context().unwrap();
/// ```
pub type Result<T> = std::result::Result<T, Error>;

/// `dotbridge` Error type
///
/// See [`error::Error`] for the error categories.
pub use error::Error;

/// Session-scoped bridge state and its builder.
pub use context::{BridgeContext, BridgeContextBuilder};
