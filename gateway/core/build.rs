// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0
//! Build Script for eosgate-core
//!
//! Compiles the EOS namespace gRPC definitions (`proto/eos_rpc.proto`) into
//! client stubs. Only the client side is generated; the server lives in EOS.
//!
//! Generated code is placed in `OUT_DIR` and included via `tonic::include_proto!`
//! in `src/infrastructure/eos/proto.rs`.
//!
//! # Dependencies
//!
//! - **protoc**: Protocol buffer compiler (vendored via `protoc-bin-vendored`)
//! - **tonic-prost-build**: Code generator for Rust gRPC stubs

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Point prost at the vendored protoc so builds do not depend on the host toolchain
    std::env::set_var("PROTOC", protoc_bin_vendored::protoc_bin_path()?);

    tonic_prost_build::configure()
        .build_server(false)
        .build_client(true)
        .compile_protos(&["proto/eos_rpc.proto"], &["proto"])?;

    println!("cargo:rerun-if-changed=proto/eos_rpc.proto");

    Ok(())
}
