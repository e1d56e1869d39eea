// CLI subcommands

pub mod cpu;
pub mod latency;
pub mod verify;
