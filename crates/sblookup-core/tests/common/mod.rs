#![allow(dead_code)]

pub mod lookup_server;
pub mod mock_lookup;
