//! CLI command implementations.
//!
//! Each submodule owns one `Commands` variant:
//!
//! | Module     | Commands handled        |
//! |------------|-------------------------|
//! | `serve`    | `Serve`, `InitDb`       |
//! | `generate` | `Generate`              |
//! | `config`   | `Config`                |

pub mod config;
pub mod generate;
pub mod serve;

pub use config::cmd_config;
pub use generate::cmd_generate;
pub use serve::{cmd_init_db, cmd_serve};
