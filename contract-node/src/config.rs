//! Configuration (spec.md §6 "Configuration"): `PORT`, `REMOTE_URL`,
//! `ENV`, and a data directory, layered env-var-then-CLI like the
//! teacher's node options.

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Clone, Debug)]
#[clap(name = "contract-node")]
#[clap(about = "Multi-party contract coordination service")]
#[clap(version = option_env!("CARGO_PKG_VERSION").unwrap_or("unknown"))]
pub struct NodeOpts {
    #[arg(long, env = "PORT", default_value = "3011")]
    pub port: u16,

    #[arg(long, env = "REMOTE_URL", default_value = "https://cos.dev.internal")]
    pub remote_url: String,

    /// Controls rate-limit strictness (spec.md §6); not otherwise consulted
    /// by the core.
    #[arg(long, env = "ENV", default_value = "development")]
    #[arg(value_parser = ["development", "production"])]
    pub env: String,

    #[arg(long = "data-dir")]
    #[arg(help = "Directory holding contracts/, keys/, and users/. Defaults to ./data under the current directory.")]
    pub data_dir: Option<PathBuf>,
}

impl NodeOpts {
    pub fn data_dir(&self) -> PathBuf {
        self.data_dir
            .clone()
            .unwrap_or_else(|| std::env::current_dir().expect("cwd").join("data"))
    }

    pub fn contracts_dir(&self) -> PathBuf {
        self.data_dir().join("contracts")
    }

    pub fn keys_dir(&self) -> PathBuf {
        self.data_dir().join("keys")
    }

    pub fn users_dir(&self) -> PathBuf {
        self.data_dir().join("users")
    }
}
