// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Generated protobuf code for the EOS MGM gRPC service

pub mod eos {
    pub mod rpc {
        #![allow(clippy::all)]
        tonic::include_proto!("eos.rpc");
    }
}

pub use eos::rpc::*;
