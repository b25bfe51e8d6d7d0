// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # gep-tests
//!
//! Shared test support for the GEP register client: a scripted messenger, a
//! scripted register collection, and a manually driven clock. The
//! integration tests in `tests/` exercise the gateway engine, register
//! polling, the auto-updater, and the configuration surface against these
//! mocks.

pub mod common;
