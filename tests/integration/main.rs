// SPDX-License-Identifier: Apache-2.0
// Copyright 2024-2026 CAB Ingénierie / Christophe ABOULICAM
//! End-to-end tests against an in-process LiquidPlanner stand-in.

mod harness;
mod items;
mod server;
mod time_tracking;
