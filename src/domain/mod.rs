pub mod controls;
pub mod element;
pub mod miner;
